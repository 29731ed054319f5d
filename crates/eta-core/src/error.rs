//! Error types for the eta-core library.

use thiserror::Error;

/// Main error type for the scraper engine.
///
/// Most variants are non-fatal inside the engine: they are logged at the
/// smallest enclosing operation and only surface to callers as a
/// `{success: false}` response at the command boundary.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// An expected element or selector was not found.
    #[error("structural miss: {0}")]
    StructuralMiss(String),

    /// No control could be found to change page.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A poll wait exceeded its budget.
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    /// The detail endpoint or secondary document failed.
    #[error("remote failure: {0}")]
    Remote(#[from] RemoteError),

    /// The render surface was torn down while an operation was running.
    #[error("render surface detached")]
    SurfaceDetached,

    /// Inbound command with an unknown action.
    #[error("Unknown action")]
    UnknownCommand(String),

    /// Known action with an unusable payload.
    #[error("malformed {action} request: {reason}")]
    MalformedCommand { action: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures of the remote line-item sources.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The secondary document did not load in time.
    #[error("load timed out after {0}ms")]
    Timeout(u64),

    /// The secondary document could not be created or read.
    #[error("document load failed: {0}")]
    Load(String),
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Parse(err.to_string())
    }
}

/// Errors loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the eta-core library.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_message() {
        let err = ScrapeError::UnknownCommand("explode".to_string());
        assert_eq!(err.to_string(), "Unknown action");
    }

    #[test]
    fn test_remote_wraps_into_scrape_error() {
        let err: ScrapeError = RemoteError::Status(503).into();
        assert_eq!(err.to_string(), "remote failure: HTTP status 503");
    }

    #[test]
    fn test_json_error_becomes_parse() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RemoteError::from(json_err);
        assert!(matches!(err, RemoteError::Parse(_)));
    }
}
