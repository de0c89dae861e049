//! Error handling for handle checking operations.
//!
//! This module defines the error type shared by the generator, the oracle,
//! the worker pool and the configuration loader.

use std::fmt;
use std::time::Duration;

/// Main error type for handle checking operations.
///
/// Variants fall into three groups: input problems reported before any
/// worker starts (`InvalidSeed`, `ConfigError`, `FileError`), oracle
/// transport failures (`NetworkError`, `Timeout`) and run-level conditions
/// (`ConduitClosed`, `Cancelled`, `Internal`).
#[derive(Debug, Clone)]
pub enum HandleCheckError {
    /// The seed name cannot be expanded into candidates
    InvalidSeed { seed: String, reason: String },

    /// Network-related errors (connection refused, DNS, TLS, etc.)
    NetworkError {
        name: String,
        message: String,
        source: Option<String>,
    },

    /// The oracle did not answer within the configured request timeout
    Timeout { name: String, duration: Duration },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// Configuration file could not be read
    FileError { path: String, message: String },

    /// The result conduit closed before every expected result arrived
    ConduitClosed { received: usize, expected: usize },

    /// The run was cancelled cooperatively
    Cancelled { received: usize, expected: usize },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl HandleCheckError {
    /// Create a new invalid seed error.
    pub fn invalid_seed<S: Into<String>, R: Into<String>>(seed: S, reason: R) -> Self {
        Self::InvalidSeed {
            seed: seed.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error for a candidate name.
    pub fn network<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::NetworkError {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<N: Into<String>, M: Into<String>, S: Into<String>>(
        name: N,
        message: M,
        source: S,
    ) -> Self {
        Self::NetworkError {
            name: name.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<N: Into<String>>(name: N, duration: Duration) -> Self {
        Self::Timeout {
            name: name.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach the candidate name to an oracle error raised without one.
    pub(crate) fn for_name(self, candidate: &str) -> Self {
        match self {
            Self::NetworkError {
                name,
                message,
                source,
            } if name.is_empty() => Self::NetworkError {
                name: candidate.to_string(),
                message,
                source,
            },
            Self::Timeout { name, duration } if name.is_empty() => Self::Timeout {
                name: candidate.to_string(),
                duration,
            },
            other => other,
        }
    }

    /// Whether this error came from the availability oracle's transport.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }

    /// Whether this error is a usage-level problem caught before any work starts.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSeed { .. } | Self::ConfigError { .. } | Self::FileError { .. }
        )
    }
}

impl fmt::Display for HandleCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSeed { seed, reason } => {
                write!(f, "Invalid seed '{}': {}", seed, reason)
            }
            Self::NetworkError {
                name,
                message,
                source,
            } => {
                if let Some(source) = source {
                    write!(
                        f,
                        "Network error while checking '{}': {} (source: {})",
                        name, message, source
                    )
                } else {
                    write!(f, "Network error while checking '{}': {}", name, message)
                }
            }
            Self::Timeout { name, duration } => {
                write!(f, "Timeout after {:?} while checking '{}'", duration, name)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ConduitClosed { received, expected } => {
                write!(
                    f,
                    "Result channel closed after {} of {} results",
                    received, expected
                )
            }
            Self::Cancelled { received, expected } => {
                write!(f, "Cancelled after {} of {} results", received, expected)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for HandleCheckError {}

// reqwest errors carry no candidate name; the oracle fills it in via `for_name`.
impl From<reqwest::Error> for HandleCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("", Duration::ZERO)
        } else if err.is_connect() {
            Self::network_with_source("", "Connection failed", err.to_string())
        } else {
            Self::network_with_source("", "HTTP request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for HandleCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
