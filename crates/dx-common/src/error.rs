//! Error types for the dx client crates.

use thiserror::Error;

/// Result type alias using DxError.
pub type DxResult<T> = Result<T, DxError>;

/// Primary error type for data-exchange operations.
///
/// Input errors are raised before any request leaves the process; server and
/// transport errors carry what the remote side (or the connection) reported.
/// Absence of an object is not an error: reads and executions return `None`.
#[derive(Debug, Error)]
pub enum DxError {
    // === Input Errors ===
    #[error("Dimension mismatch: {left} vs {right} dimensions")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Empty extent in dimension {dim}: {detail}")]
    EmptyExtent { dim: usize, detail: String },

    #[error("Extent in dimension {dim} overflows the index range: {detail}")]
    ExtentOverflow { dim: usize, detail: String },

    #[error("Coordinate out of range: {0}")]
    CoordinateOutOfRange(String),

    #[error("Invalid geographic bounds: {0}")]
    InvalidGeoBounds(String),

    #[error("Inverted date range: {start} is after {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Version field out of range: {0}")]
    VersionOutOfRange(String),

    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid executable unit: {0}")]
    InvalidExecUnit(String),

    // === Encoding Errors ===
    #[error("Malformed array: {0}")]
    MalformedArray(String),

    #[error("Unknown element type tag: {0}")]
    UnknownElementType(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // === Remote Errors ===
    #[error("Request to server failed with {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl DxError {
    /// Create a ServerError.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Create a MalformedArray error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedArray(msg.into())
    }

    /// True for errors detected locally, before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DxError::DimensionMismatch { .. }
                | DxError::EmptyExtent { .. }
                | DxError::ExtentOverflow { .. }
                | DxError::CoordinateOutOfRange(_)
                | DxError::InvalidGeoBounds(_)
                | DxError::InvertedDateRange { .. }
                | DxError::InvalidDate(_)
                | DxError::VersionOutOfRange(_)
                | DxError::UnknownSource(_)
                | DxError::Config(_)
                | DxError::InvalidExecUnit(_)
        )
    }

    /// HTTP status reported by the server, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DxError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DxError {
    fn from(err: serde_json::Error) -> Self {
        DxError::Serialization(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_classification() {
        assert!(DxError::DimensionMismatch { left: 2, right: 3 }.is_local());
        assert!(DxError::UnknownSource("s3".into()).is_local());
        assert!(!DxError::server(500, "boom").is_local());
        assert!(!DxError::Transport("refused".into()).is_local());
        assert!(!DxError::malformed("short").is_local());
    }

    #[test]
    fn test_server_status() {
        let err = DxError::server(503, "unavailable");
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "Request to server failed with 503: unavailable"
        );
        assert_eq!(DxError::Config("x".into()).status(), None);
    }
}
