//! Error types for whois-mcp gateway operations.
//!
//! Subprocess failures are not errors here: they are recovered into
//! `QueryOutcome::Failed` so tools can still return best-effort text.

use thiserror::Error;

/// Main error type for whois-mcp operations
#[derive(Error, Debug)]
pub enum WhoisError {
    /// A config field holds an unusable value
    #[error("invalid config for '{0}': {1}")]
    InvalidConfig(String, String),

    /// Config file could not be read
    #[error("failed to read config file '{0}': {1}")]
    ConfigRead(String, String),

    /// Config file is not valid TOML for the expected shape
    #[error("failed to parse config file '{0}': {1}")]
    ConfigParse(String, String),

    /// Query target or server override rejected before invocation
    #[error("invalid query '{0}': {1}")]
    InvalidQuery(String, String),

    /// Tool name is not one of the registered tools
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not match the declared input schema
    #[error("invalid arguments for tool '{0}': {1}")]
    InvalidArguments(String, String),

    /// Tool result could not be rendered as JSON
    #[error("failed to serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WhoisError {
    /// True when the error was caused by caller input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WhoisError::InvalidQuery(..)
                | WhoisError::UnknownTool(_)
                | WhoisError::InvalidArguments(..)
        )
    }
}

/// Result type alias for whois-mcp operations
pub type Result<T> = std::result::Result<T, WhoisError>;
