// Chart label parser

use super::ast::Labels;
use super::lexer::{string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

enum LabelArg {
    Title(String),
    X(String),
    Y(String),
}

/// Parse a label command
/// Format: labs(title: "...", x: "...", y: "...")
pub fn parse_labs(input: &str) -> IResult<&str, Labels> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("title:")), ws(string_literal)), LabelArg::Title),
            map(preceded(ws(tag("x:")), ws(string_literal)), LabelArg::X),
            map(preceded(ws(tag("y:")), ws(string_literal)), LabelArg::Y),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let labels = args.into_iter().fold(Labels::default(), |mut labels, arg| {
        match arg {
            LabelArg::Title(v) => labels.title = Some(v),
            LabelArg::X(v) => labels.x = Some(v),
            LabelArg::Y(v) => labels.y = Some(v),
        }
        labels
    });

    Ok((input, labels))
}
