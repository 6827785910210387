use crate::ir::PanelScene;
use crate::OutputFormat;

/// Where a panel sits in its request's facet grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
    pub nrow: usize,
    pub ncol: usize,
}

/// One rendered chart: encoded image bytes plus what was drawn.
///
/// The bytes are opaque to everything except a display surface.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    bytes: Vec<u8>,
    format: OutputFormat,
    position: GridPosition,
    caption: String,
    panel_label: Option<String>,
    row_count: usize,
    point_count: usize,
    correlation: Option<f64>,
}

impl ChartArtifact {
    pub(crate) fn from_scene(scene: &PanelScene, format: OutputFormat, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format,
            position: GridPosition {
                row: scene.row,
                col: scene.col,
                nrow: scene.nrow,
                ncol: scene.ncol,
            },
            caption: scene.caption(),
            panel_label: scene.panel_label.clone(),
            row_count: scene.row_count,
            point_count: scene.point_count,
            correlation: scene.correlation,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn panel_label(&self) -> Option<&str> {
        self.panel_label.as_deref()
    }

    /// Rows of the partition behind this panel
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows with both x and y present
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn correlation(&self) -> Option<f64> {
        self.correlation
    }

    /// True when the request produced a grid of more than one cell
    pub fn is_faceted(&self) -> bool {
        self.position.nrow * self.position.ncol > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Scale;

    #[test]
    fn test_from_scene() {
        let scene = PanelScene {
            row: 1,
            col: 0,
            nrow: 2,
            ncol: 1,
            title: String::new(),
            panel_label: Some("gender = Female".into()),
            x_label: "leg".into(),
            y_label: "arm".into(),
            x_scale: Scale { domain: (0.0, 1.0) },
            y_scale: Scale { domain: (0.0, 1.0) },
            row_count: 3,
            point_count: 2,
            correlation: Some(0.5),
            commands: vec![],
        };
        let artifact = ChartArtifact::from_scene(&scene, OutputFormat::Svg, b"<svg/>".to_vec());
        assert_eq!(artifact.position(), GridPosition { row: 1, col: 0, nrow: 2, ncol: 1 });
        assert_eq!(artifact.caption(), "gender = Female");
        assert_eq!(artifact.row_count(), 3);
        assert_eq!(artifact.point_count(), 2);
        assert!(artifact.is_faceted());
        assert_eq!(artifact.format().extension(), "svg");
        assert_eq!(artifact.into_bytes(), b"<svg/>".to_vec());
    }
}
