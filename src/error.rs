//! Error types for the SCN detector.
//!
//! Errors fall into two groups. Configuration and I/O failures abort a run
//! before any change is classified. AI provider failures are local to a
//! single change and are converted into a manual-review classification by the
//! dispatcher, so they never escape a classification call.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the SCN detector.
#[derive(Debug, Error)]
pub enum ScnError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Diff retrieval and analysis errors.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// AI provider errors.
    #[error("AI provider error: {0}")]
    Ai(#[from] AiError),

    /// JSON (de)serialization errors for reports.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A rule criterion is not a valid regular expression.
    #[error("Invalid regex in {field}: {message}")]
    InvalidRegex {
        /// Path of the offending rule criterion.
        field: String,
        /// Regex compiler message.
        message: String,
    },

}

/// Diff retrieval and analysis errors.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The version-control command failed.
    #[error("git {command} failed: {message}")]
    GitFailed {
        /// Subcommand that was run.
        command: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// The analysis input could not be read.
    #[error("Invalid analysis input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}

/// AI provider errors.
#[derive(Debug, Error)]
pub enum AiError {
    /// A required AI setting is absent.
    #[error("no {setting} configured")]
    NotConfigured {
        /// Name of the missing setting.
        setting: &'static str,
    },

    /// No API key was given and the provider's variable is unset.
    #[error("no API key, set {env_var}")]
    MissingApiKey {
        /// Environment variable consulted.
        env_var: &'static str,
    },

    /// The configured provider name is not registered.
    #[error("unknown provider '{name}', supported: {supported}")]
    UnknownProvider {
        /// Requested provider name.
        name: String,
        /// Comma separated list of registered providers.
        supported: String,
    },

    /// Authentication failed.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },

    /// Network error.
    #[error("network error: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// The request did not complete before the client timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Invalid response from API.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Result type alias for SCN detector operations.
pub type Result<T> = std::result::Result<T, ScnError>;

impl ScnError {
    /// Returns true if this error only affects a single change and should be
    /// degraded to manual review instead of aborting the run.
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        matches!(self, Self::Ai(_))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a parse error with an optional location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}

impl AiError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
