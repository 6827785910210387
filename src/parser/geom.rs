// Chart command parser

use super::ast::{GeomSpec, Marginal};
use super::lexer::{identifier, number_literal, string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_opt},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

enum GeomArg {
    X(String),
    Y(String),
    Color(String),
    Opacity(f64),
    Size(f64),
    Bins(usize),
    Levels(usize),
    Marginal(Marginal),
}

fn count_literal(input: &str) -> IResult<&str, usize> {
    map_opt(number_literal, |n| {
        (n >= 1.0 && n.fract() == 0.0).then_some(n as usize)
    })(input)
}

fn marginal_literal(input: &str) -> IResult<&str, Marginal> {
    map_opt(string_literal, |s| match s.as_str() {
        "rug" => Some(Marginal::Rug),
        _ => None,
    })(input)
}

/// Parse the chart command
/// Format: kind(x: col, y: col, color: col, opacity: 0.5, bins: 30, levels: 8, marginal: "rug")
///
/// Any identifier is accepted as the kind; it is checked during resolution.
pub fn parse_geom(input: &str) -> IResult<&str, GeomSpec> {
    let (input, kind) = ws(identifier)(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(identifier)), GeomArg::X),
            map(preceded(ws(tag("y:")), ws(identifier)), GeomArg::Y),
            map(preceded(ws(tag("color:")), ws(identifier)), GeomArg::Color),
            map(preceded(ws(tag("opacity:")), ws(number_literal)), GeomArg::Opacity),
            map(preceded(ws(tag("alpha:")), ws(number_literal)), GeomArg::Opacity),
            map(preceded(ws(tag("size:")), ws(number_literal)), GeomArg::Size),
            map(preceded(ws(tag("bins:")), ws(count_literal)), GeomArg::Bins),
            map(preceded(ws(tag("levels:")), ws(count_literal)), GeomArg::Levels),
            map(preceded(ws(tag("marginal:")), ws(marginal_literal)), GeomArg::Marginal),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut geom = GeomSpec {
        kind,
        ..Default::default()
    };

    for arg in args {
        match arg {
            GeomArg::X(v) => geom.x = Some(v),
            GeomArg::Y(v) => geom.y = Some(v),
            GeomArg::Color(v) => geom.color = Some(v),
            GeomArg::Opacity(v) => geom.opacity = Some(v),
            GeomArg::Size(v) => geom.size = Some(v),
            GeomArg::Bins(v) => geom.bins = Some(v),
            GeomArg::Levels(v) => geom.levels = Some(v),
            GeomArg::Marginal(v) => geom.marginal = Some(v),
        }
    }

    Ok((input, geom))
}
