use super::ast::{FacetScales, FacetSpec};
use super::lexer::{identifier, level_list, string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_opt},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

enum FacetArg {
    Row(String),
    Col(String),
    RowLevels(Vec<String>),
    ColLevels(Vec<String>),
    Scales(FacetScales),
}

fn scales_literal(input: &str) -> IResult<&str, FacetScales> {
    map_opt(string_literal, |s| match s.as_str() {
        "fixed" => Some(FacetScales::Fixed),
        "free" => Some(FacetScales::Free),
        "free_x" => Some(FacetScales::FreeX),
        "free_y" => Some(FacetScales::FreeY),
        _ => None,
    })(input)
}

/// Parse a facet command
/// Format: facet(row: col, col: col, row_levels: [..], col_levels: [..], scales: "free")
pub fn parse_facet(input: &str) -> IResult<&str, FacetSpec> {
    let (input, _) = ws(tag("facet"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("row_levels:")), ws(level_list)), FacetArg::RowLevels),
            map(preceded(ws(tag("col_levels:")), ws(level_list)), FacetArg::ColLevels),
            map(preceded(ws(tag("row:")), ws(identifier)), FacetArg::Row),
            map(preceded(ws(tag("col:")), ws(identifier)), FacetArg::Col),
            map(preceded(ws(tag("scales:")), ws(scales_literal)), FacetArg::Scales),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut facet = FacetSpec::default();
    for arg in args {
        match arg {
            FacetArg::Row(v) => facet.row = Some(v),
            FacetArg::Col(v) => facet.col = Some(v),
            FacetArg::RowLevels(v) => facet.row_levels = Some(v),
            FacetArg::ColLevels(v) => facet.col_levels = Some(v),
            FacetArg::Scales(v) => facet.scales = v,
        }
    }

    Ok((input, facet))
}
