use crate::data::RecordTable;
use crate::ir::{
    ChartKind, FacetAxis, FacetLayout, Grouping, PanelData, PanelGeometry, PointGroup, PointStyle,
    RenderData, ResolvedRequest,
};
use crate::palette::ColorPalette;
use crate::stats;
use plotters::style::RGBColor;
use std::collections::HashMap;

const DEFAULT_POINT_SIZE: f64 = 3.0;
const DEFAULT_OPACITY: f64 = 0.8;
const DENSITY_RESOLUTION: usize = 60;
const HISTOGRAM_BINS: usize = 30;
const DEFAULT_LEVELS: usize = 10;
const MISSING_GROUP_COLOR: RGBColor = RGBColor(160, 160, 160);

/// Main entry point: split the table into facet cells and build panel geometry
pub fn apply_transformations(resolved: &ResolvedRequest, table: &RecordTable) -> RenderData {
    // 1. Partition rows (faceting)
    let partitions = partition_rows(&resolved.grouping, table);

    // 2. Layout from level counts, so empty cells keep their slot
    let (nrow, ncol) = resolved.grouping.dims();

    // 3. Colors are assigned once per request so every panel agrees
    let color_map = resolved
        .color
        .as_ref()
        .map(|axis| ColorPalette::category10().assign_colors(&axis.levels));

    let panels = partitions
        .into_iter()
        .map(|p| process_partition(p, resolved, table, color_map.as_ref()))
        .collect();

    RenderData {
        panels,
        layout: FacetLayout { nrow, ncol },
    }
}

/// Row indices belonging to one non-empty facet cell
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub row: usize,
    pub col: usize,
    pub label: Option<String>,
    pub rows: Vec<usize>,
}

/// Split table rows into the cartesian product of axis levels.
///
/// Rows missing a grouping value, or holding a value outside the axis
/// levels, are dropped. Cells without rows are omitted. Output is in
/// row-major grid order.
pub fn partition_rows(grouping: &Grouping, table: &RecordTable) -> Vec<Partition> {
    let (nrow, ncol) = grouping.dims();
    let row_positions = level_positions(grouping.row.as_ref());
    let col_positions = level_positions(grouping.col.as_ref());

    let mut cells: Vec<Vec<usize>> = vec![Vec::new(); nrow * ncol];
    for r in 0..table.len() {
        let Some(ri) = axis_position(table, r, grouping.row.as_ref(), &row_positions) else {
            continue;
        };
        let Some(ci) = axis_position(table, r, grouping.col.as_ref(), &col_positions) else {
            continue;
        };
        cells[ri * ncol + ci].push(r);
    }

    cells
        .into_iter()
        .enumerate()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(i, rows)| {
            let (row, col) = (i / ncol, i % ncol);
            Partition {
                row,
                col,
                label: panel_label(grouping, row, col),
                rows,
            }
        })
        .collect()
}

fn level_positions(axis: Option<&FacetAxis>) -> HashMap<&str, usize> {
    axis.iter()
        .flat_map(|a| a.levels.iter().enumerate().map(|(i, l)| (l.as_str(), i)))
        .collect()
}

fn axis_position(
    table: &RecordTable,
    row: usize,
    axis: Option<&FacetAxis>,
    positions: &HashMap<&str, usize>,
) -> Option<usize> {
    let Some(axis) = axis else {
        return Some(0);
    };
    let key = table.value(row, axis.index).category_key()?;
    positions.get(key.as_str()).copied()
}

fn panel_label(grouping: &Grouping, row: usize, col: usize) -> Option<String> {
    let parts: Vec<String> = [(grouping.row.as_ref(), row), (grouping.col.as_ref(), col)]
        .into_iter()
        .filter_map(|(axis, i)| axis.map(|a| format!("{} = {}", a.column, a.levels[i])))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Process a single data partition (panel)
fn process_partition(
    partition: Partition,
    resolved: &ResolvedRequest,
    table: &RecordTable,
    color_map: Option<&HashMap<String, RGBColor>>,
) -> PanelData {
    let request = &resolved.request;

    // Pairwise-complete observations only
    let point_rows: Vec<(usize, (f64, f64))> = partition
        .rows
        .iter()
        .filter_map(|&r| {
            let x = table.value(r, resolved.x_idx).as_f64()?;
            let y = table.value(r, resolved.y_idx).as_f64()?;
            Some((r, (x, y)))
        })
        .collect();
    let points: Vec<(f64, f64)> = point_rows.iter().map(|(_, p)| *p).collect();
    let correlation = stats::pearson(&points);

    let levels = request.levels.unwrap_or(DEFAULT_LEVELS).max(1);
    let geometry = match request.kind {
        ChartKind::Scatter => {
            PanelGeometry::Points(group_points(&point_rows, resolved, table, color_map))
        }
        ChartKind::DensityContour => {
            let resolution = request.bins.unwrap_or(DENSITY_RESOLUTION);
            // The lowest band stays unfilled so the panel background shows through
            let cells = stats::kde2d(&points, resolution)
                .map(|grid| {
                    grid.bands(levels)
                        .into_iter()
                        .filter(|c| levels == 1 || c.level > 0)
                        .collect()
                })
                .unwrap_or_default();
            PanelGeometry::Bands { cells, levels }
        }
        ChartKind::Histogram2d => {
            let bins = request.bins.unwrap_or(HISTOGRAM_BINS);
            let cells = stats::bin2d(&points, bins)
                .map(|grid| grid.bands(levels))
                .unwrap_or_default();
            PanelGeometry::Bands { cells, levels }
        }
    };

    PanelData {
        row: partition.row,
        col: partition.col,
        label: partition.label,
        row_count: partition.rows.len(),
        points,
        correlation,
        geometry,
    }
}

fn group_points(
    point_rows: &[(usize, (f64, f64))],
    resolved: &ResolvedRequest,
    table: &RecordTable,
    color_map: Option<&HashMap<String, RGBColor>>,
) -> Vec<PointGroup> {
    let request = &resolved.request;
    let style = |color: RGBColor| PointStyle {
        color,
        size: request.point_size.unwrap_or(DEFAULT_POINT_SIZE),
        alpha: request.opacity.unwrap_or(DEFAULT_OPACITY).clamp(0.0, 1.0),
    };

    let (Some(axis), Some(color_map)) = (resolved.color.as_ref(), color_map) else {
        return vec![PointGroup {
            key: None,
            points: point_rows.iter().map(|(_, p)| *p).collect(),
            style: style(ColorPalette::category10().color(0)),
        }];
    };

    let mut grouped: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
    let mut missing = Vec::new();
    for &(r, p) in point_rows {
        match table.value(r, axis.index).category_key() {
            Some(key) => grouped.entry(key).or_default().push(p),
            None => missing.push(p),
        }
    }

    let mut groups: Vec<PointGroup> = axis
        .levels
        .iter()
        .filter_map(|level| {
            let points = grouped.remove(level)?;
            let color = color_map.get(level).copied().unwrap_or(MISSING_GROUP_COLOR);
            Some(PointGroup {
                key: Some(level.clone()),
                points,
                style: style(color),
            })
        })
        .collect();

    if !missing.is_empty() {
        groups.push(PointGroup {
            key: None,
            points: missing,
            style: style(MISSING_GROUP_COLOR),
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ChartRequest, FacetAxis};
    use crate::resolve::resolve_request;

    fn make_data() -> RecordTable {
        let csv = "leg,arm,gender,eth\n\
                   30,20,Male,3\n\
                   35,22,Female,1\n\
                   32,21,Male,1\n\
                   31,,Male,\n";
        RecordTable::from_csv_reader(csv.as_bytes(), "test").unwrap()
    }

    fn transform(request: ChartRequest) -> RenderData {
        let table = make_data();
        let resolved = resolve_request(&request, &table).unwrap();
        apply_transformations(&resolved, &table)
    }

    #[test]
    fn test_transform_no_grouping() {
        let data = transform(ChartRequest::new(ChartKind::Scatter, "leg", "arm"));
        assert_eq!(data.panels.len(), 1);
        assert_eq!(data.layout, FacetLayout { nrow: 1, ncol: 1 });
        let panel = &data.panels[0];
        assert_eq!(panel.label, None);
        assert_eq!(panel.row_count, 4);
        // Row with missing arm is left out of the geometry
        assert_eq!(panel.points.len(), 3);
    }

    #[test]
    fn test_transform_single_axis_first_seen() {
        let data = transform(ChartRequest::new(ChartKind::Scatter, "leg", "arm").facet_row("gender"));
        assert_eq!(data.panels.len(), 2);
        assert_eq!(data.layout, FacetLayout { nrow: 2, ncol: 1 });
        assert_eq!(data.panels[0].label.as_deref(), Some("gender = Male"));
        assert_eq!(data.panels[0].row_count, 3);
        assert_eq!(data.panels[1].label.as_deref(), Some("gender = Female"));
        assert_eq!((data.panels[1].row, data.panels[1].col), (1, 0));
    }

    #[test]
    fn test_transform_column_strip() {
        let data = transform(ChartRequest::new(ChartKind::Scatter, "leg", "arm").facet_col("gender"));
        assert_eq!(data.layout, FacetLayout { nrow: 1, ncol: 2 });
        assert_eq!((data.panels[1].row, data.panels[1].col), (0, 1));
    }

    #[test]
    fn test_transform_two_axes_omits_empty_cells() {
        let data = transform(
            ChartRequest::new(ChartKind::Scatter, "leg", "arm")
                .facet_row("gender")
                .facet_col("eth"),
        );
        // Levels: gender [Male, Female], eth [3, 1]; Female/3 is empty
        assert_eq!(data.layout, FacetLayout { nrow: 2, ncol: 2 });
        let cells: Vec<(usize, usize)> = data.panels.iter().map(|p| (p.row, p.col)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(data.panels[2].label.as_deref(), Some("gender = Female | eth = 1"));
        // The Male row with missing eth belongs to no cell
        let total: usize = data.panels.iter().map(|p| p.row_count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_partition_declared_levels_exclude_others() {
        let table = make_data();
        let grouping = Grouping {
            row: None,
            col: Some(FacetAxis {
                column: "gender".into(),
                index: 2,
                levels: vec!["Female".into(), "Other".into()],
            }),
        };
        let parts = partition_rows(&grouping, &table);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].rows, vec![1]);
        assert_eq!(parts[0].col, 0);
    }

    #[test]
    fn test_transform_color_groups() {
        let data = transform(ChartRequest::new(ChartKind::Scatter, "leg", "arm").color("gender"));
        let PanelGeometry::Points(groups) = &data.panels[0].geometry else {
            panic!("Expected points");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.as_deref(), Some("Male"));
        assert_eq!(groups[0].points.len(), 2);
        assert_ne!(groups[0].style.color, groups[1].style.color);
    }

    #[test]
    fn test_transform_correlation_per_panel() {
        let data = transform(ChartRequest::new(ChartKind::Scatter, "leg", "arm").facet_row("gender"));
        // Male has two complete pairs (30,20) and (32,21)
        assert_eq!(data.panels[0].correlation, Some(1.0));
        // Female has a single pair
        assert_eq!(data.panels[1].correlation, None);
    }

    #[test]
    fn test_transform_density_bands() {
        let data = transform(ChartRequest::new(ChartKind::DensityContour, "leg", "arm"));
        let PanelGeometry::Bands { cells, levels } = &data.panels[0].geometry else {
            panic!("Expected bands");
        };
        assert_eq!(*levels, 10);
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|c| c.level > 0 && c.level < 10));
    }

    #[test]
    fn test_transform_histogram_skips_empty_bins() {
        let mut request = ChartRequest::new(ChartKind::Histogram2d, "leg", "arm");
        request.bins = Some(4);
        let data = transform(request);
        let PanelGeometry::Bands { cells, .. } = &data.panels[0].geometry else {
            panic!("Expected bands");
        };
        assert_eq!(cells.len(), 3);
    }
}
