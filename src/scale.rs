use crate::ir::{PanelData, PanelGeometry, PanelScales, RenderData, Scale, ScaleSystem};
use crate::parser::ast::FacetScales;

/// Build the scale system for the chart
pub fn build_scales(data: &RenderData, scales_mode: FacetScales) -> ScaleSystem {
    // 1. Calculate raw ranges per panel
    let panel_raw_ranges: Vec<(MinMax, MinMax)> = data.panels.iter().map(panel_extent).collect();

    // 2. Shared ranges across the request, where the mode asks for them
    let global_x = merge_ranges(panel_raw_ranges.iter().map(|(x, _)| x));
    let global_y = merge_ranges(panel_raw_ranges.iter().map(|(_, y)| y));

    // 3. Resolve final domains
    let panels = panel_raw_ranges
        .iter()
        .map(|(x_local, y_local)| {
            let x_mm = match scales_mode {
                FacetScales::Fixed | FacetScales::FreeY => global_x,
                FacetScales::FreeX | FacetScales::Free => x_local.or_empty(),
            };
            let y_mm = match scales_mode {
                FacetScales::Fixed | FacetScales::FreeX => global_y,
                FacetScales::FreeY | FacetScales::Free => y_local.or_empty(),
            };
            PanelScales {
                x: Scale { domain: pad_range(x_mm.min, x_mm.max) },
                y: Scale { domain: pad_range(y_mm.min, y_mm.max) },
            }
        })
        .collect();

    ScaleSystem { panels }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    const EMPTY: MinMax = MinMax { min: f64::INFINITY, max: f64::NEG_INFINITY };

    fn include(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn is_empty(&self) -> bool {
        self.min > self.max
    }

    fn or_empty(&self) -> MinMax {
        if self.is_empty() {
            MinMax { min: 0.0, max: 1.0 }
        } else {
            *self
        }
    }
}

/// Extent of everything drawn in a panel: points and band cells
fn panel_extent(panel: &PanelData) -> (MinMax, MinMax) {
    let mut x = MinMax::EMPTY;
    let mut y = MinMax::EMPTY;

    for &(px, py) in &panel.points {
        x.include(px);
        y.include(py);
    }
    if let PanelGeometry::Bands { cells, .. } = &panel.geometry {
        for cell in cells {
            x.include(cell.x0);
            x.include(cell.x1);
            y.include(cell.y0);
            y.include(cell.y1);
        }
    }

    (x, y)
}

fn merge_ranges<'a, I>(iter: I) -> MinMax
where
    I: Iterator<Item = &'a MinMax>,
{
    let mut global = MinMax::EMPTY;
    for local in iter.filter(|m| !m.is_empty()) {
        global.include(local.min);
        global.include(local.max);
    }
    global.or_empty()
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}
