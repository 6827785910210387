//! Error types for loading tables and rendering chart requests.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the loader, the request pipeline and the display surfaces.
#[derive(Error, Debug)]
pub enum Error {
    /// The dataset could not be fetched or parsed. No partial table is kept.
    #[error("Data unavailable from '{source_id}': {reason}")]
    DataUnavailable { source_id: String, reason: String },

    /// A request referenced a column the table does not have.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// A request named a chart kind outside scatter / density contour / 2D histogram.
    #[error("Unsupported chart kind '{0}'")]
    UnsupportedChartKind(String),

    /// A request string did not parse.
    #[error("Invalid chart request: {0}")]
    InvalidRequest(String),

    /// The plotting backend or the image encoder failed.
    #[error("Rendering error: {0}")]
    Render(String),

    /// A display surface failed to write its output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unavailable(source_id: &str, reason: impl ToString) -> Self {
        Error::DataUnavailable {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unavailable("nhanes.csv", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("nhanes.csv"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_column_not_found_display() {
        let err = Error::ColumnNotFound("BMXLEG".to_string());
        assert_eq!(err.to_string(), "Column 'BMXLEG' not found");
    }
}
