//! Core data types for handle availability checking.
//!
//! This module defines the result record that flows from workers to the
//! collector, the partition each worker owns, and the run configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound accepted for the worker count.
pub const MAX_WORKERS: usize = 256;

/// Default delay between two consecutive lookups of one worker.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Default timeout for a single oracle request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default profile endpoint; the candidate name is appended to it.
pub const DEFAULT_ENDPOINT: &str = "https://twitter.com/";

/// Outcome of checking one candidate name.
///
/// Produced exactly once per candidate and moved by value from the worker
/// that checked it to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleResult {
    /// The candidate that was checked
    pub name: String,

    /// Whether the name appears to be unclaimed
    pub available: bool,

    /// Index of the worker that produced this result, used for labeling only
    #[serde(rename = "worker")]
    pub worker_id: usize,
}

impl HandleResult {
    /// Human-readable status word.
    pub fn status(&self) -> &'static str {
        if self.available {
            "available"
        } else {
            "unavailable"
        }
    }
}

/// A contiguous slice of the candidate list owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Worker index in `[0, workers)`
    pub worker_id: usize,

    /// Candidates in generation order
    pub names: Vec<String>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What a worker does when the oracle fails to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole run with the oracle error
    #[default]
    Abort,

    /// Log a warning and report the name as unavailable
    TreatAsTaken,
}

/// How the collector renders each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text lines
    #[default]
    Text,

    /// One JSON object per line
    JsonLines,
}

/// Configuration options for a checking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Number of partitions / concurrent workers
    /// Default: 4, Range: 1-256
    pub workers: usize,

    /// Delay a worker waits between two consecutive candidates
    /// Default: 500ms
    #[serde(skip)]
    pub delay: Duration,

    /// Timeout for each oracle request
    /// Default: 10 seconds
    #[serde(skip)]
    pub request_timeout: Duration,

    /// Profile endpoint the candidate name is appended to
    pub endpoint: String,

    /// Report every result instead of only available names
    pub verbose: bool,

    /// Process longer candidates first within each partition
    pub sort_by_length: bool,

    /// Behaviour on oracle transport failure
    pub error_policy: ErrorPolicy,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            delay: DEFAULT_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            verbose: false,
            sort_by_length: true,
            error_policy: ErrorPolicy::Abort,
        }
    }
}

impl CheckConfig {
    /// Set the worker count, clamped to `1..=MAX_WORKERS`.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Set the inter-request delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the profile endpoint.
    pub fn with_endpoint<E: Into<String>>(mut self, endpoint: E) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_sort_by_length(mut self, enabled: bool) -> Self {
        self.sort_by_length = enabled;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

/// Totals reported by the collector once every result has been drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub checked: usize,
    pub available: usize,
    pub unavailable: usize,
}

impl RunSummary {
    pub(crate) fn record(&mut self, result: &HandleResult) {
        self.checked += 1;
        if result.available {
            self.available += 1;
        } else {
            self.unavailable += 1;
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Abort => write!(f, "abort"),
            ErrorPolicy::TreatAsTaken => write!(f, "treat-as-taken"),
        }
    }
}
