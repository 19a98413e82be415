//! Error types for the report renderer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, for callers that only need to know
/// which side of the pipeline broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The document could not be generated (data or engine problem)
    Render,
    /// The document was generated but could not be saved or delivered
    Persist,
    /// The input record or configuration was rejected before rendering
    Input,
}

/// Errors that can occur while rendering or storing a report
#[derive(Error, Debug)]
pub enum Error {
    /// The drawing surface or the PDF encoder failed
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Writing the finished document failed
    #[error("Failed to persist report to {}: {source}", path.display())]
    PersistError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record carries more rows than fit on a single page
    #[error("Too many {what}: {count} (maximum is {max})")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// The record could not be decoded at the system boundary
    #[error("Invalid report record: {0}")]
    InvalidRecord(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::RenderError(_) => FailureKind::Render,
            Error::PersistError { .. } | Error::Timeout(_) => FailureKind::Persist,
            Error::CapacityExceeded { .. } | Error::InvalidRecord(_) | Error::ConfigError(_) => {
                FailureKind::Input
            }
        }
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::PersistError {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidRecord(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_separate_render_from_persist() {
        assert_eq!(Error::RenderError("boom".into()).kind(), FailureKind::Render);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e = Error::persist("/tmp/x.pdf", io);
        assert_eq!(e.kind(), FailureKind::Persist);
        assert!(e.to_string().contains("/tmp/x.pdf"));
        assert_eq!(Error::Timeout(50).kind(), FailureKind::Persist);
        let cap = Error::CapacityExceeded { what: "recommendations", count: 20, max: 12 };
        assert_eq!(cap.kind(), FailureKind::Input);
        assert_eq!(cap.to_string(), "Too many recommendations: 20 (maximum is 12)");
    }
}
