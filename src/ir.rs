use crate::error::{Error, Result};
use crate::parser::ast::{AnnotationSpec, FacetScales, Labels, Marginal, RequestSpec};
use plotters::style::RGBColor;
use std::str::FromStr;

// =============================================================================
// Requests
// =============================================================================

/// The chart kinds a request may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
    DensityContour,
    Histogram2d,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::DensityContour => "density_contour",
            ChartKind::Histogram2d => "histogram2d",
        }
    }
}

impl FromStr for ChartKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "scatter" | "point" => Ok(ChartKind::Scatter),
            "density_contour" | "density" => Ok(ChartKind::DensityContour),
            "histogram2d" | "hist2d" | "histogram2d_contour" => Ok(ChartKind::Histogram2d),
            _ => Err(Error::UnsupportedChartKind(name.to_string())),
        }
    }
}

/// A typed chart request: which columns, which kind, how to stratify.
///
/// Independent of any table; levels and column positions are worked out
/// by [`crate::resolve::resolve_request`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    /// Axis laid out along grid rows
    pub row: Option<String>,
    /// Axis laid out along grid columns
    pub col: Option<String>,
    pub row_levels: Option<Vec<String>>,
    pub col_levels: Option<Vec<String>>,
    pub scales: FacetScales,
    pub annotations: Vec<AnnotationSpec>,
    pub labels: Labels,
    pub opacity: Option<f64>,
    pub point_size: Option<f64>,
    pub bins: Option<usize>,
    pub levels: Option<usize>,
    pub rug: bool,
}

impl ChartRequest {
    pub fn new(kind: ChartKind, x: &str, y: &str) -> Self {
        Self {
            kind,
            x: x.to_string(),
            y: y.to_string(),
            color: None,
            row: None,
            col: None,
            row_levels: None,
            col_levels: None,
            scales: FacetScales::Fixed,
            annotations: Vec::new(),
            labels: Labels::default(),
            opacity: None,
            point_size: None,
            bins: None,
            levels: None,
            rug: false,
        }
    }

    pub fn facet_row(mut self, column: &str) -> Self {
        self.row = Some(column.to_string());
        self
    }

    pub fn facet_col(mut self, column: &str) -> Self {
        self.col = Some(column.to_string());
        self
    }

    pub fn scales(mut self, scales: FacetScales) -> Self {
        self.scales = scales;
        self
    }

    pub fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.labels.title = Some(title.to_string());
        self
    }

    /// Number of grouping axes (0, 1 or 2)
    pub fn axis_count(&self) -> usize {
        usize::from(self.row.is_some()) + usize::from(self.col.is_some())
    }
}

impl TryFrom<RequestSpec> for ChartRequest {
    type Error = Error;

    fn try_from(spec: RequestSpec) -> Result<Self> {
        let kind: ChartKind = spec.geom.kind.parse()?;
        let x = spec
            .geom
            .x
            .ok_or_else(|| Error::InvalidRequest(format!("{}() needs an x column", kind.name())))?;
        let y = spec
            .geom
            .y
            .ok_or_else(|| Error::InvalidRequest(format!("{}() needs a y column", kind.name())))?;

        let mut request = ChartRequest::new(kind, &x, &y);
        request.color = spec.geom.color;
        request.opacity = spec.geom.opacity;
        request.point_size = spec.geom.size;
        request.bins = spec.geom.bins;
        request.levels = spec.geom.levels;
        request.rug = matches!(spec.geom.marginal, Some(Marginal::Rug));
        request.annotations = spec.annotations;
        request.labels = spec.labels;

        if let Some(facet) = spec.facet {
            if facet.row.is_none() && facet.col.is_none() {
                return Err(Error::InvalidRequest(
                    "facet() needs a row or col column".to_string(),
                ));
            }
            request.row = facet.row;
            request.col = facet.col;
            request.row_levels = facet.row_levels;
            request.col_levels = facet.col_levels;
            request.scales = facet.scales;
        }

        Ok(request)
    }
}

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// One stratification axis with its levels in declared (or first-seen) order
#[derive(Debug, Clone, PartialEq)]
pub struct FacetAxis {
    pub column: String,
    pub index: usize,
    pub levels: Vec<String>,
}

/// Zero, one or two axes. A lone axis is either a row strip or a column strip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grouping {
    pub row: Option<FacetAxis>,
    pub col: Option<FacetAxis>,
}

impl Grouping {
    pub fn axis_count(&self) -> usize {
        usize::from(self.row.is_some()) + usize::from(self.col.is_some())
    }

    /// Grid size: (rows, columns)
    pub fn dims(&self) -> (usize, usize) {
        let nrow = self.row.as_ref().map_or(1, |a| a.levels.len());
        let ncol = self.col.as_ref().map_or(1, |a| a.levels.len());
        (nrow, ncol)
    }
}

/// A request checked against a table
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub request: ChartRequest,
    pub x_idx: usize,
    pub y_idx: usize,
    pub color: Option<FacetAxis>,
    pub grouping: Grouping,
}

// =============================================================================
// Phase 2: Transformation
// =============================================================================

/// The per-panel data ready for scaling. Only non-empty facet cells appear.
#[derive(Debug, Clone)]
pub struct RenderData {
    pub panels: Vec<PanelData>,
    pub layout: FacetLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetLayout {
    pub nrow: usize,
    pub ncol: usize,
}

/// Data for a single facet cell
#[derive(Debug, Clone)]
pub struct PanelData {
    pub row: usize,
    pub col: usize,
    /// `RIAGENDRx = Male | RIDRETH1 = 3`; `None` without grouping
    pub label: Option<String>,
    /// Rows that fell into this cell
    pub row_count: usize,
    /// Rows of the cell where both x and y are numbers
    pub points: Vec<(f64, f64)>,
    pub correlation: Option<f64>,
    pub geometry: PanelGeometry,
}

#[derive(Debug, Clone)]
pub enum PanelGeometry {
    Points(Vec<PointGroup>),
    Bands { cells: Vec<BandCell>, levels: usize },
}

/// Points sharing one color
#[derive(Debug, Clone)]
pub struct PointGroup {
    /// Legend key; `None` when the request has no color column
    pub key: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub style: PointStyle,
}

/// A filled rectangle of a contour band or 2D histogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandCell {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub level: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub color: RGBColor,
    pub size: f64,
    pub alpha: f64,
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

/// One scale pair per panel, index-aligned with `RenderData::panels`
#[derive(Debug, Clone)]
pub struct ScaleSystem {
    pub panels: Vec<PanelScales>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelScales {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    /// Padded data min/max
    pub domain: (f64, f64),
}

impl Scale {
    pub fn contains(&self, v: f64) -> bool {
        v >= self.domain.0 && v <= self.domain.1
    }
}

// =============================================================================
// Phase 4: Compilation (Scene Graph)
// =============================================================================

/// Primitive drawing commands for one panel.
/// The backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub nrow: usize,
    pub ncol: usize,
    pub title: String,
    pub panel_label: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub row_count: usize,
    pub point_count: usize,
    pub correlation: Option<f64>,
    pub commands: Vec<DrawCommand>,
}

impl PanelScene {
    /// Chart title followed by the facet label, as drawn in the caption
    pub fn caption(&self) -> String {
        match (&self.panel_label, self.title.is_empty()) {
            (Some(label), true) => label.clone(),
            (Some(label), false) => format!("{} ({})", self.title, label),
            (None, _) => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawPoints {
        points: Vec<(f64, f64)>,
        style: PointStyle,
        legend: Option<String>,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        color: RGBColor,
        alpha: f64,
        legend: Option<String>,
    },
    DrawSegments {
        segments: Vec<((f64, f64), (f64, f64))>,
        color: RGBColor,
    },
    DrawText {
        pos: (f64, f64),
        text: String,
        color: RGBColor,
        size: f64,
    },
}
