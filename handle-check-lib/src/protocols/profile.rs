//! Profile page lookup over HTTP.
//!
//! A name is looked up by requesting `<endpoint><name>`. A 404 means nobody
//! holds the name; every other status is treated as taken, so unexpected
//! pages never abort a run.

use super::{AvailabilityOracle, LookupOutcome};
use crate::error::HandleCheckError;
use crate::types::{CheckConfig, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("handle-check/", env!("CARGO_PKG_VERSION"));

/// HTTP oracle for checking whether a profile exists.
#[derive(Clone, Debug)]
pub struct HttpOracle {
    /// HTTP client reused across all lookups
    http_client: reqwest::Client,
    /// Base URL the name is appended to
    endpoint: String,
    /// Timeout for one request
    timeout: Duration,
}

impl HttpOracle {
    /// Create an oracle against the default endpoint.
    pub fn new() -> Result<Self, HandleCheckError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create an oracle from a run configuration.
    pub fn from_config(config: &CheckConfig) -> Result<Self, HandleCheckError> {
        Self::with_endpoint(&config.endpoint, config.request_timeout)
    }

    /// Create an oracle against a custom endpoint.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, HandleCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                HandleCheckError::config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint: normalize_endpoint(endpoint),
            timeout,
        })
    }

    /// The URL that will be requested for `name`.
    pub fn profile_url(&self, name: &str) -> String {
        format!("{}{}", self.endpoint, name)
    }

    async fn fetch_status(&self, name: &str) -> Result<StatusCode, HandleCheckError> {
        let url = self.profile_url(name);
        let start_time = Instant::now();

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::debug!(%url, error = %e, "profile request failed");
            if e.is_timeout() {
                HandleCheckError::timeout(name, self.timeout)
            } else {
                HandleCheckError::from(e).for_name(name)
            }
        })?;

        tracing::trace!(
            %url,
            status = response.status().as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "profile response"
        );

        Ok(response.status())
    }
}

impl AvailabilityOracle for HttpOracle {
    async fn lookup(&self, name: &str) -> Result<LookupOutcome, HandleCheckError> {
        let status = self.fetch_status(name).await?;
        Ok(classify_status(status))
    }
}

/// Map an HTTP status to a lookup outcome.
pub fn classify_status(status: StatusCode) -> LookupOutcome {
    if status == StatusCode::NOT_FOUND {
        LookupOutcome::NotFound
    } else {
        LookupOutcome::Exists {
            status: status.as_u16(),
        }
    }
}

/// Strip surrounding whitespace. The name is appended verbatim, so the
/// endpoint carries its own separator (`.../`, `...?user=`).
fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::NOT_FOUND), LookupOutcome::NotFound);
        assert_eq!(
            classify_status(StatusCode::OK),
            LookupOutcome::Exists { status: 200 }
        );
        // Rate limiting and server errors are answers, not transport failures
        assert!(!classify_status(StatusCode::TOO_MANY_REQUESTS).is_available());
        assert!(!classify_status(StatusCode::INTERNAL_SERVER_ERROR).is_available());
        assert!(!classify_status(StatusCode::FOUND).is_available());
    }

    #[test]
    fn test_profile_url() {
        let oracle =
            HttpOracle::with_endpoint(" https://example.test/users/ ", Duration::from_secs(1))
                .unwrap();
        assert_eq!(oracle.profile_url("abcd"), "https://example.test/users/abcd");

        let oracle =
            HttpOracle::with_endpoint("https://example.test/lookup?user=", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            oracle.profile_url("abcd"),
            "https://example.test/lookup?user=abcd"
        );

        let oracle = HttpOracle::new().unwrap();
        assert_eq!(oracle.profile_url("abcd"), "https://twitter.com/abcd");
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Port 9 on localhost is reserved (discard) and normally closed
        let oracle =
            HttpOracle::with_endpoint("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        let err = oracle.lookup("abcd").await.unwrap_err();
        assert!(err.is_oracle_failure(), "unexpected error: {err}");
        assert!(err.to_string().contains("abcd"));
    }
}
