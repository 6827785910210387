// Reports: narrative blocks interleaved with chart requests

use crate::data::RecordTable;
use crate::error::{Error, Result};
use crate::runtime::render_str;
use crate::surface::{ChartSurface, DisplayPosition, PageConfig};
use crate::RenderOptions;
use serde::Deserialize;

/// A page of narrative and charts, loadable from JSON
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub blocks: Vec<ReportBlock>,
}

/// Narrative text, a chart request string, or both (narrative first)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReportBlock {
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub chart: Option<String>,
}

impl ReportBlock {
    pub fn narrative(text: &str) -> Self {
        Self { narrative: Some(text.to_string()), chart: None }
    }

    pub fn chart(request: &str) -> Self {
        Self { narrative: None, chart: Some(request.to_string()) }
    }
}

/// What a report run produced
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportSummary {
    pub charts_requested: usize,
    pub artifacts_shown: usize,
    /// Request strings that could not be rendered
    pub failed: Vec<String>,
}

impl Report {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The NHANES multivariate walkthrough: arm and leg length, blood
    /// pressure pairs, then stratification by gender and ethnicity
    pub fn nhanes() -> Self {
        let page = PageConfig {
            title: "Analysis of multivariate data - NHANES case study".to_string(),
            subtitle: Some("NHANES 2015-2016 body measures and blood pressure".to_string()),
            hide_chrome: true,
        };

        let blocks = vec![
            ReportBlock::narrative(
                "This page explores relationships between pairs of health measures from the \
                 NHANES survey: body measures, blood pressure and demographics such as gender \
                 and ethnicity.",
            ),
            ReportBlock::narrative(
                "### Quantitative bivariate data\n\
                 Each person is measured on many traits. Here we take two at a time. Arm \
                 length (BMXARML) is on the vertical axis and leg length (BMXLEG) on the \
                 horizontal axis. Longer legs tend to go with longer arms, but the relationship \
                 is far from exact.",
            ),
            ReportBlock::chart(
                r#"scatter(x: BMXLEG, y: BMXARML, color: RIAGENDRx, opacity: 0.5)
                   | labs(title: "Correlation arm length against leg length")"#,
            ),
            ReportBlock::narrative(
                "The Pearson correlation between arm and leg length is printed on the contour \
                 plot below. Values near 1 mean a strong positive dependence; a value around \
                 0.6 is usually read as moderately strong.",
            ),
            ReportBlock::chart(
                r#"density_contour(x: BMXLEG, y: BMXARML)
                   | correlation(x: 50, y: 45, color: "white", size: 12)
                   | labs(title: "Contour correlation between arm length and leg length")"#,
            ),
            ReportBlock::narrative(
                "Systolic and diastolic blood pressure are more weakly correlated. Some people \
                 have a high systolic reading with an average diastolic one, and the other way \
                 around. Rug ticks on the margins show every observation.",
            ),
            ReportBlock::chart(
                r#"density_contour(x: BPXSY1, y: BPXDI1, marginal: "rug")
                   | correlation(x: 200, y: 100, color: "black", size: 15)
                   | labs(title: "BPXSY1 and BPXDI1 correlation")"#,
            ),
            ReportBlock::narrative(
                "Two systolic readings taken a few minutes apart on the same person agree \
                 closely, so their correlation is very high.",
            ),
            ReportBlock::chart(
                r#"histogram2d(x: BPXSY1, y: BPXSY2)
                   | correlation(x: 200, y: 200, color: "white", size: 15)
                   | labs(title: "BPXSY1 and BPXSY2 correlation")"#,
            ),
            ReportBlock::narrative(
                "### Heterogeneity and stratification\n\
                 Traits vary with gender, age, ethnicity and more. Splitting the data on such \
                 factors often shows structure that the pooled data hides. First by gender: men \
                 tend to have somewhat longer arms and legs, and the correlation looks a little \
                 weaker for women.",
            ),
            ReportBlock::chart("scatter(x: BMXLEG, y: BMXARML) | facet(row: RIAGENDRx)"),
            ReportBlock::narrative(
                "Then by gender and ethnicity together, giving up to 2 x 5 strata. Group means \
                 shift between ethnic groups while the arm and leg relationship within a gender \
                 stays broadly similar. Group 5 (multi-racial and other) shows a stronger \
                 correlation, which a more heterogeneous group can produce.",
            ),
            ReportBlock::chart(
                "density_contour(x: BMXLEG, y: BMXARML) | facet(row: RIAGENDRx, col: RIDRETH1)",
            ),
        ];

        Report { page, blocks }
    }
}

/// Render every block of the report onto the surface.
///
/// A chart request that fails is logged and replaced by a short narrative
/// note; the rest of the report still runs. Surface failures abort.
pub fn run_report(
    table: &RecordTable,
    report: &Report,
    surface: &mut dyn ChartSurface,
    options: &RenderOptions,
) -> Result<ReportSummary> {
    let mut summary = ReportSummary::default();
    surface.init(&report.page)?;

    for block in &report.blocks {
        if let Some(text) = &block.narrative {
            surface.narrate(text)?;
        }

        let Some(request) = &block.chart else {
            continue;
        };
        let group = summary.charts_requested;
        summary.charts_requested += 1;

        match render_str(table, request, options) {
            Ok(artifacts) => {
                log::debug!("Request {} produced {} artifact(s)", group, artifacts.len());
                for artifact in artifacts {
                    let position = DisplayPosition::for_artifact(&artifact, group);
                    surface.show(artifact, position)?;
                    summary.artifacts_shown += 1;
                }
            }
            Err(e @ (Error::Io(_) | Error::DataUnavailable { .. })) => return Err(e),
            Err(e) => {
                log::warn!("Skipping chart '{}': {}", compact(request), e);
                surface.narrate(&format!("Chart unavailable: {e}"))?;
                summary.failed.push(request.clone());
            }
        }
    }

    surface.finish()?;
    Ok(summary)
}

fn compact(request: &str) -> String {
    request.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_request_str;
    use crate::surface::{RecordingSurface, SurfaceEvent};
    use crate::OutputFormat;

    fn make_table() -> RecordTable {
        let csv = "BMXLEG,BMXARML,RIAGENDRx\n30,20,Male\n35,22,Female\n32,21,Male\n";
        RecordTable::from_csv_reader(csv.as_bytes(), "test").unwrap()
    }

    fn svg_options() -> RenderOptions {
        RenderOptions { width: 400, height: 300, format: OutputFormat::Svg }
    }

    #[test]
    fn test_nhanes_report_requests_parse() {
        let report = Report::nhanes();
        let charts: Vec<&String> = report.blocks.iter().filter_map(|b| b.chart.as_ref()).collect();
        assert_eq!(charts.len(), 6);
        for chart in charts {
            assert!(parse_request_str(chart).is_ok(), "failed to parse {chart}");
        }
    }

    #[test]
    fn test_report_from_json() {
        let json = r#"{
            "page": {"title": "Demo"},
            "blocks": [
                {"narrative": "hello"},
                {"chart": "scatter(x: a, y: b)"}
            ]
        }"#;
        let report = Report::from_json(json).unwrap();
        assert_eq!(report.page.title, "Demo");
        assert!(report.page.hide_chrome);
        assert_eq!(report.blocks[0], ReportBlock::narrative("hello"));
        assert_eq!(report.blocks[1], ReportBlock::chart("scatter(x: a, y: b)"));
    }

    #[test]
    fn test_run_report_continues_after_failure() {
        let table = make_table();
        let report = Report {
            page: PageConfig::default(),
            blocks: vec![
                ReportBlock::chart("scatter(x: BMXLEG, y: BPXSY1)"),
                ReportBlock {
                    narrative: Some("by gender".into()),
                    chart: Some("scatter(x: BMXLEG, y: BMXARML) | facet(col: RIAGENDRx)".into()),
                },
            ],
        };
        let mut surface = RecordingSurface::new();
        let summary = run_report(&table, &report, &mut surface, &svg_options()).unwrap();

        assert_eq!(summary.charts_requested, 2);
        assert_eq!(summary.artifacts_shown, 2);
        assert_eq!(summary.failed, vec!["scatter(x: BMXLEG, y: BPXSY1)".to_string()]);

        let narratives: Vec<&str> = surface.narratives().collect();
        assert_eq!(narratives.len(), 2);
        assert!(narratives[0].contains("BPXSY1"));
        assert_eq!(narratives[1], "by gender");

        let positions: Vec<DisplayPosition> = surface.charts().map(|(_, p)| p).collect();
        assert_eq!(
            positions,
            vec![
                DisplayPosition::Grid { group: 1, row: 0, col: 0, nrow: 1, ncol: 2 },
                DisplayPosition::Grid { group: 1, row: 0, col: 1, nrow: 1, ncol: 2 },
            ]
        );
        assert!(matches!(surface.events.first(), Some(SurfaceEvent::Init(_))));
        assert!(matches!(surface.events.last(), Some(SurfaceEvent::Finish)));
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("scatter(x: a,\n    y: b)  | labs()"), "scatter(x: a, y: b) | labs()");
    }
}
