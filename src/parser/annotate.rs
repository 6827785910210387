use super::ast::{AnnotationSpec, AnnotationText};
use super::lexer::{number_literal, string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

enum AnnotateArg {
    X(f64),
    Y(f64),
    Text(String),
    Color(String),
    Size(f64),
}

fn annotate_args(input: &str) -> IResult<&str, Vec<AnnotateArg>> {
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(number_literal)), AnnotateArg::X),
            map(preceded(ws(tag("y:")), ws(number_literal)), AnnotateArg::Y),
            map(preceded(ws(tag("text:")), ws(string_literal)), AnnotateArg::Text),
            map(preceded(ws(tag("color:")), ws(string_literal)), AnnotateArg::Color),
            map(preceded(ws(tag("size:")), ws(number_literal)), AnnotateArg::Size),
        )),
    )(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, args))
}

/// Fold parsed args into a spec. `x` and `y` are required.
fn build<'a>(
    input: &'a str,
    args: Vec<AnnotateArg>,
    mut text: AnnotationText,
) -> IResult<&'a str, AnnotationSpec> {
    let mut x = None;
    let mut y = None;
    let mut color = None;
    let mut size = None;

    for arg in args {
        match arg {
            AnnotateArg::X(v) => x = Some(v),
            AnnotateArg::Y(v) => y = Some(v),
            AnnotateArg::Text(v) => text = AnnotationText::Static(v),
            AnnotateArg::Color(v) => color = Some(v),
            AnnotateArg::Size(v) => size = Some(v),
        }
    }

    match (x, y) {
        (Some(x), Some(y)) => Ok((input, AnnotationSpec { x, y, text, color, size })),
        _ => Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    }
}

/// Parse a static annotation
/// Format: annotate(x: 50, y: 45, text: "label", color: "white", size: 12)
pub fn parse_annotate(input: &str) -> IResult<&str, AnnotationSpec> {
    let (input, _) = ws(tag("annotate"))(input)?;
    let (input, args) = annotate_args(input)?;
    build(input, args, AnnotationText::Static(String::new()))
}

/// Parse a correlation annotation, printed as `r = 0.62` for each panel
/// Format: correlation(x: 50, y: 45, color: "white", size: 12)
pub fn parse_correlation(input: &str) -> IResult<&str, AnnotationSpec> {
    let (input, _) = ws(tag("correlation"))(input)?;
    let (input, args) = annotate_args(input)?;
    if args.iter().any(|a| matches!(a, AnnotateArg::Text(_))) {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    build(input, args, AnnotationText::Correlation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotate() {
        let (_, ann) =
            parse_annotate(r#"annotate(x: 50, y: 45, text: "p=0.62", color: "white", size: 12)"#)
                .unwrap();
        assert_eq!(ann.x, 50.0);
        assert_eq!(ann.y, 45.0);
        assert_eq!(ann.text, AnnotationText::Static("p=0.62".to_string()));
        assert_eq!(ann.color.as_deref(), Some("white"));
        assert_eq!(ann.size, Some(12.0));
    }

    #[test]
    fn test_parse_correlation() {
        let (_, ann) = parse_correlation("correlation(x: 200, y: 100)").unwrap();
        assert_eq!(ann.text, AnnotationText::Correlation);
        assert_eq!(ann.color, None);
    }

    #[test]
    fn test_parse_annotate_requires_position() {
        assert!(parse_annotate(r#"annotate(text: "hi")"#).is_err());
    }

    #[test]
    fn test_parse_correlation_rejects_text() {
        assert!(parse_correlation(r#"correlation(x: 1, y: 2, text: "x")"#).is_err());
    }
}
