use crate::ir::{
    ChartKind, DrawCommand, PanelData, PanelGeometry, PanelScales, PanelScene, RenderData,
    ResolvedRequest, ScaleSystem,
};
use crate::palette::{parse_color, Colormap};
use crate::parser::ast::{AnnotationSpec, AnnotationText};
use plotters::style::RGBColor;
use std::collections::HashSet;

const DEFAULT_TEXT_SIZE: f64 = 12.0;
const RUG_COLOR: RGBColor = RGBColor(90, 90, 90);
/// Rug tick length as a fraction of the axis span
const RUG_LENGTH: f64 = 0.02;

/// Compile data and scales into one scene per panel
pub fn compile_geometry(
    data: RenderData,
    scales: ScaleSystem,
    resolved: &ResolvedRequest,
) -> Vec<PanelScene> {
    let request = &resolved.request;
    let layout = data.layout;

    data.panels
        .into_iter()
        .zip(scales.panels)
        .map(|(panel, panel_scales)| {
            let mut commands = geometry_commands(&panel, request.kind);

            if request.rug {
                commands.push(rug_command(&panel.points, &panel_scales));
            }

            for annotation in &request.annotations {
                commands.push(annotation_command(annotation, &panel, &panel_scales));
            }

            PanelScene {
                row: panel.row,
                col: panel.col,
                nrow: layout.nrow,
                ncol: layout.ncol,
                title: request.labels.title.clone().unwrap_or_default(),
                panel_label: panel.label,
                x_label: request.labels.x.clone().unwrap_or_else(|| request.x.clone()),
                y_label: request.labels.y.clone().unwrap_or_else(|| request.y.clone()),
                x_scale: panel_scales.x,
                y_scale: panel_scales.y,
                row_count: panel.row_count,
                point_count: panel.points.len(),
                correlation: panel.correlation,
                commands,
            }
        })
        .collect()
}

fn geometry_commands(panel: &PanelData, kind: ChartKind) -> Vec<DrawCommand> {
    match &panel.geometry {
        PanelGeometry::Points(groups) => groups
            .iter()
            .map(|g| DrawCommand::DrawPoints {
                points: g.points.clone(),
                style: g.style,
                legend: g.key.clone(),
            })
            .collect(),
        PanelGeometry::Bands { cells, levels } => {
            let colormap = match kind {
                ChartKind::Histogram2d => Colormap::Jet,
                _ => Colormap::Viridis,
            };
            // Drawn lowest band first so legend entries come out in level order
            let mut ordered: Vec<_> = cells.iter().collect();
            ordered.sort_by_key(|c| c.level);

            let mut labelled = HashSet::new();
            ordered
                .into_iter()
                .map(|c| DrawCommand::DrawRect {
                    tl: (c.x0, c.y1),
                    br: (c.x1, c.y0),
                    color: colormap.band_color(c.level, *levels),
                    alpha: 1.0,
                    legend: labelled.insert(c.level).then(|| band_label(c.level, *levels)),
                })
                .collect()
        }
    }
}

/// Share of the panel peak covered by a band, e.g. `40-50% of peak`
fn band_label(level: usize, levels: usize) -> String {
    let levels = levels.max(1);
    let lo = level * 100 / levels;
    let hi = (level + 1) * 100 / levels;
    format!("{lo}-{hi}% of peak")
}

/// Short ticks along the bottom and left edges, one per observation
fn rug_command(points: &[(f64, f64)], scales: &PanelScales) -> DrawCommand {
    let (x_lo, x_hi) = scales.x.domain;
    let (y_lo, y_hi) = scales.y.domain;
    let x_len = (x_hi - x_lo) * RUG_LENGTH;
    let y_len = (y_hi - y_lo) * RUG_LENGTH;

    let bottom = points.iter().map(|&(x, _)| ((x, y_lo), (x, y_lo + y_len)));
    let left = points.iter().map(|&(_, y)| ((x_lo, y), (x_lo + x_len, y)));

    DrawCommand::DrawSegments {
        segments: bottom.chain(left).collect(),
        color: RUG_COLOR,
    }
}

fn annotation_command(
    annotation: &AnnotationSpec,
    panel: &PanelData,
    scales: &PanelScales,
) -> DrawCommand {
    let text = match &annotation.text {
        AnnotationText::Static(s) => s.clone(),
        AnnotationText::Correlation => correlation_text(panel.correlation),
    };

    // Positions are fixed data coordinates and are never moved
    if !scales.x.contains(annotation.x) || !scales.y.contains(annotation.y) {
        log::debug!(
            "Annotation '{}' at ({}, {}) lies outside panel {:?}",
            text,
            annotation.x,
            annotation.y,
            panel.label.as_deref().unwrap_or("(all rows)")
        );
    }

    let color = match annotation.color.as_deref() {
        None => RGBColor(0, 0, 0),
        Some(name) => parse_color(name).unwrap_or_else(|| {
            log::warn!("Unknown annotation color '{}', using black", name);
            RGBColor(0, 0, 0)
        }),
    };

    DrawCommand::DrawText {
        pos: (annotation.x, annotation.y),
        text,
        color,
        size: annotation.size.unwrap_or(DEFAULT_TEXT_SIZE),
    }
}

/// `r = 0.62`, or `r = n/a` when undefined
pub fn correlation_text(correlation: Option<f64>) -> String {
    match correlation {
        Some(r) => format!("r = {:.2}", r),
        None => "r = n/a".to_string(),
    }
}
