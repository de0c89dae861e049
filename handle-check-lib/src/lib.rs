//! # Handle Check Library
//!
//! Finds unclaimed handles among the character combinations of a seed name.
//!
//! The seed is expanded into its powerset, the candidates are split into
//! one contiguous partition per worker, and each worker probes an
//! availability oracle with a fixed delay between requests. Results stream
//! back over a single channel to one collector as they arrive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handle_check_lib::{
//!     generate_powerset, CheckConfig, ConcurrentProcessor, LineReporter, OutputFormat,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CheckConfig::default()
//!         .with_workers(4)
//!         .with_delay(Duration::from_millis(500));
//!     let processor = ConcurrentProcessor::new(config)?;
//!
//!     let candidates = generate_powerset("hello")?;
//!     let mut reporter = LineReporter::stdout(false, OutputFormat::Text);
//!     processor.run(&candidates, &mut reporter).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing against a fake oracle
//!
//! Anything implementing [`AvailabilityOracle`] can stand in for the HTTP
//! lookup via [`HandleChecker::with_oracle`] and
//! [`ConcurrentProcessor::with_checker`].

// Re-export main public API types and functions
pub use checker::HandleChecker;
pub use collector::{collect_results, format_line, LineReporter, ResultSink};
pub use concurrent::{CancelFlag, ConcurrentProcessor, WorkerMessage};
pub use config::{
    load_env_config, parse_timeout_string, validate_endpoint, validate_workers, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::HandleCheckError;
pub use partition::split_into_partitions;
pub use protocols::{AvailabilityOracle, HttpOracle, LookupOutcome};
pub use types::{
    CheckConfig, ErrorPolicy, HandleResult, OutputFormat, Partition, RunSummary, DEFAULT_DELAY,
    DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKERS, MAX_WORKERS,
};
pub use utils::{is_too_short, validate_seed, MIN_NAME_LENGTH};
pub use worker::run_worker;

// Public modules
pub mod generate;

// Re-export generation functions for convenience
pub use generate::{generate_powerset, powerset_size, MAX_SEED_LENGTH};

// Internal modules
mod checker;
mod collector;
mod concurrent;
mod config;
mod error;
mod partition;
mod protocols;
mod types;
mod utils;
mod worker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HandleCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
