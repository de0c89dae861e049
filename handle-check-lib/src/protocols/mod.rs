//! Availability oracle implementations.
//!
//! The oracle is the only component that talks to the outside world. The
//! worker pool is generic over [`AvailabilityOracle`] so tests can swap in a
//! scripted implementation.

/// HTTP profile lookup
pub mod profile;

pub use profile::HttpOracle;

use crate::error::HandleCheckError;
use std::future::Future;

/// Definitive answer from the oracle for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The service has no profile under this name
    NotFound,

    /// Any other definitive answer (profile exists, suspended, redirect...)
    Exists { status: u16 },
}

impl LookupOutcome {
    /// Only a "not found" answer counts as available.
    pub fn is_available(&self) -> bool {
        matches!(self, LookupOutcome::NotFound)
    }
}

/// An external existence check keyed by name.
///
/// Implementations hold no per-name state. A transport-level failure is
/// returned as an error; anything the service actually answered is a
/// [`LookupOutcome`].
pub trait AvailabilityOracle: Send + Sync + 'static {
    fn lookup(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<LookupOutcome, HandleCheckError>> + Send;
}
