//! Error types for the lineage engine.
//!
//! # Error Handling Strategy
//!
//! Two complementary patterns are used:
//!
//! - [`EngineError`]: terminal failures for a request — the target table or
//!   column does not exist, the request is malformed, or a refresh could not
//!   pull a complete catalog. Returned as `Result<T, EngineError>`.
//!
//! - [`crate::types::ResultFlag`]: advisory conditions collected during
//!   resolution (dynamic-SQL suspicion, fallback scans, caps). These ride on
//!   successful results so partial lineage is still returned, explicitly
//!   marked, never silently absorbed.
//!
//! Ambiguity is deliberately in neither bucket: several equally-ranked
//! candidate tables produce a structured result with the alternatives
//! populated and the ambiguity flag set.

use thiserror::Error;

/// Terminal failure for an engine request.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("table '{0}' not found in the active catalog snapshot")]
    TableNotFound(String),

    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("column '{0}' not found in any base table")]
    NoTableWithColumn(String),

    /// Refresh failed before the swap; the previous snapshot stays active.
    #[error("catalog refresh failed: {0}")]
    Refresh(#[from] SourceError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure reported by a [`crate::snapshot::CatalogSource`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_wraps_source_error() {
        let err: EngineError = SourceError::new("connection reset").into();
        assert_eq!(
            err.to_string(),
            "catalog refresh failed: connection reset"
        );
    }

    #[test]
    fn test_source_error_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = SourceError::with_cause("catalog pull failed", io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_trait() {
        let err = EngineError::TableNotFound("dbo.Missing".into());
        let _: &dyn std::error::Error = &err;
    }
}
