// Abstract Syntax Tree for chart request strings

/// A complete chart request as written, before column checks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestSpec {
    pub geom: GeomSpec,
    pub facet: Option<FacetSpec>,
    pub annotations: Vec<AnnotationSpec>,
    pub labels: Labels,
}

/// The chart command: `scatter(x: BMXLEG, y: BMXARML, color: RIAGENDRx, opacity: 0.5)`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomSpec {
    /// Chart kind name as written. Checked later against the supported kinds.
    pub kind: String,
    pub x: Option<String>,
    pub y: Option<String>,
    /// Column splitting points into colored groups (scatter only)
    pub color: Option<String>,
    pub opacity: Option<f64>,
    pub size: Option<f64>,
    /// Bins per axis (2D histogram) or grid resolution (density contour)
    pub bins: Option<usize>,
    /// Number of filled contour bands
    pub levels: Option<usize>,
    pub marginal: Option<Marginal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marginal {
    Rug,
}

/// `facet(row: RIAGENDRx, col: RIDRETH1, scales: "free")`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacetSpec {
    pub row: Option<String>,
    pub col: Option<String>,
    /// Declared level order for the row axis
    pub row_levels: Option<Vec<String>>,
    /// Declared level order for the column axis
    pub col_levels: Option<Vec<String>>,
    pub scales: FacetScales,
}

/// Axis sharing across the panels of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacetScales {
    /// Every panel uses the extent of the whole request
    #[default]
    Fixed,
    FreeX,
    FreeY,
    /// Every panel uses its own extent
    Free,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationText {
    Static(String),
    /// Replaced per panel by `r = <pearson>`
    Correlation,
}

/// Text at a fixed data-space coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub x: f64,
    pub y: f64,
    pub text: AnnotationText,
    pub color: Option<String>,
    pub size: Option<f64>,
}

/// Chart labels (title, axes)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    pub title: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}
