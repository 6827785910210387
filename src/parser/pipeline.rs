// Pipeline parser for chart requests

use super::annotate::{parse_annotate, parse_correlation};
use super::ast::{AnnotationSpec, FacetSpec, Labels, RequestSpec};
use super::facet::parse_facet;
use super::geom::parse_geom;
use super::labels::parse_labs;
use super::lexer::ws;
use crate::error::Error;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, map},
    multi::many0,
    sequence::preceded,
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Facet(FacetSpec),
    Annotation(AnnotationSpec),
    Labels(Labels),
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((
        map(parse_facet, PipelineComponent::Facet),
        map(parse_annotate, PipelineComponent::Annotation),
        map(parse_correlation, PipelineComponent::Annotation),
        map(parse_labs, PipelineComponent::Labels),
    ))(input)
}

/// Parse a complete chart request
/// Format: kind(...) | component | component ...
pub fn parse_request(input: &str) -> IResult<&str, RequestSpec> {
    let (input, geom) = parse_geom(input)?;

    let (input, components) =
        many0(preceded(ws(tag("|")), parse_pipeline_component))(input)?;

    let (input, _) = ws(eof)(input)?;

    let mut spec = RequestSpec {
        geom,
        ..Default::default()
    };

    for comp in components {
        match comp {
            PipelineComponent::Facet(f) => spec.facet = Some(f),
            PipelineComponent::Annotation(a) => spec.annotations.push(a),
            PipelineComponent::Labels(l) => spec.labels = l,
        }
    }

    Ok((input, spec))
}

/// Parse a request string, mapping syntax errors to [`Error::InvalidRequest`]
pub fn parse_request_str(input: &str) -> crate::error::Result<RequestSpec> {
    match parse_request(input) {
        Ok((_, spec)) => Ok(spec),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let near: String = e.input.chars().take(24).collect();
            Err(Error::InvalidRequest(if near.trim().is_empty() {
                format!("unexpected end of request '{}'", input.trim())
            } else {
                format!("syntax error near '{}' in '{}'", near.trim(), input.trim())
            }))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::InvalidRequest(format!(
            "incomplete request '{}'",
            input.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{AnnotationText, FacetScales};

    #[test]
    fn test_parse_geom_only() {
        let (_, spec) = parse_request("scatter(x: BMXLEG, y: BMXARML)").unwrap();
        assert_eq!(spec.geom.kind, "scatter");
        assert!(spec.facet.is_none());
        assert!(spec.annotations.is_empty());
    }

    #[test]
    fn test_parse_full_pipeline() {
        let input = r#"density_contour(x: BMXLEG, y: BMXARML)
            | facet(row: RIAGENDRx, col: RIDRETH1, scales: "free_y")
            | correlation(x: 50, y: 45, color: "white")
            | annotate(x: 30, y: 30, text: "note")
            | labs(title: "Contours")"#;
        let (_, spec) = parse_request(input).unwrap();
        let facet = spec.facet.unwrap();
        assert_eq!(facet.row.as_deref(), Some("RIAGENDRx"));
        assert_eq!(facet.scales, FacetScales::FreeY);
        assert_eq!(spec.annotations.len(), 2);
        assert_eq!(spec.annotations[0].text, AnnotationText::Correlation);
        assert_eq!(spec.labels.title.as_deref(), Some("Contours"));
    }

    #[test]
    fn test_parse_trailing_pipe() {
        assert!(parse_request("scatter(x: a, y: b) |").is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_request("").is_err());
    }

    #[test]
    fn test_parse_unknown_component() {
        assert!(parse_request("scatter(x: a, y: b) | theme_minimal()").is_err());
    }

    #[test]
    fn test_parse_request_str_error() {
        let err = parse_request_str("scatter(x: a, y: b) | bogus()").unwrap_err();
        match err {
            Error::InvalidRequest(msg) => assert!(msg.contains("bogus")),
            other => panic!("Expected InvalidRequest, got {other:?}"),
        }
    }
}
