//! Single-name availability checking.
//!
//! This module provides the `HandleChecker` struct that applies the
//! short-name rule and the error policy around one oracle lookup.

use crate::error::HandleCheckError;
use crate::protocols::{AvailabilityOracle, HttpOracle};
use crate::types::{CheckConfig, ErrorPolicy};
use crate::utils::is_too_short;

/// Checks individual names against an availability oracle.
///
/// # Example
///
/// ```rust,no_run
/// use handle_check_lib::{CheckConfig, HandleChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = HandleChecker::with_config(CheckConfig::default())?;
///     let available = checker.check_name("rustacean").await?;
///     println!("rustacean available: {}", available);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct HandleChecker<O = HttpOracle> {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Oracle answering existence lookups
    oracle: O,
}

impl HandleChecker<HttpOracle> {
    /// Create a checker backed by the HTTP profile oracle.
    pub fn with_config(config: CheckConfig) -> Result<Self, HandleCheckError> {
        let oracle = HttpOracle::from_config(&config)?;
        Ok(Self { config, oracle })
    }
}

impl<O: AvailabilityOracle> HandleChecker<O> {
    /// Create a checker around any oracle implementation.
    pub fn with_oracle(config: CheckConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    /// Check whether one name is available.
    ///
    /// The checking process:
    /// 1. Names shorter than `MIN_NAME_LENGTH` characters are unavailable
    ///    and never reach the oracle
    /// 2. Otherwise the oracle is asked; only "not found" means available
    /// 3. Transport failures follow the configured `ErrorPolicy`
    ///
    /// # Errors
    ///
    /// Returns the oracle's error under `ErrorPolicy::Abort`.
    pub async fn check_name(&self, name: &str) -> Result<bool, HandleCheckError> {
        if is_too_short(name) {
            return Ok(false);
        }

        match self.oracle.lookup(name).await {
            Ok(outcome) => Ok(outcome.is_available()),
            Err(e) => match self.config.error_policy {
                ErrorPolicy::Abort => Err(e),
                ErrorPolicy::TreatAsTaken => {
                    tracing::warn!(
                        handle = name,
                        error = %e,
                        "lookup failed, reporting as unavailable"
                    );
                    Ok(false)
                }
            },
        }
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Get the oracle this checker consults.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
