// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Runtime introspection client.
//!
//! A function host that is still booting serves its manifest at
//! `GET http://localhost:{port}/backend.yaml` once it is up. Until then the
//! port refuses connections, so the client retries refusals (and only
//! refusals) at a fixed interval. The whole loop runs under an overall
//! timeout so a wedged host cannot hang discovery.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{DiscoveryError, DiscoveryResult, FetchError, ProbeError};
use crate::manifest::ManifestDocument;
use crate::types::Port;

/// Path of the manifest on an introspection endpoint.
pub const INTROSPECTION_PATH: &str = "/backend.yaml";

/// Host the function runtime listens on.
pub const DEFAULT_HOST: &str = "localhost";

/// How long and how often to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed delay after each refused connection.
    pub retry_interval: Duration,
    /// Attempts before giving up, the first one included.
    pub max_attempts: u32,
    /// Upper bound on the whole probe, sleeps included.
    pub timeout: Duration,
    /// Upper bound on a single HTTP request.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(100),
            max_attempts: 300,
            timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Capability to fetch the raw manifest from a local port once.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, port: Port) -> Result<String, FetchError>;
}

/// Only a refused connection means "not ready yet". Everything else is final.
pub fn is_transient(err: &FetchError) -> bool {
    matches!(err, FetchError::ConnectionRefused { .. })
}

/// Build the introspection URL for a host and port.
pub fn introspection_url(host: &str, port: Port) -> String {
    format!("http://{}:{}{}", host, port, INTROSPECTION_PATH)
}

/// [`ManifestFetcher`] over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    host: String,
}

impl HttpFetcher {
    /// Fetcher against [`DEFAULT_HOST`].
    pub fn new(request_timeout: Duration) -> DiscoveryResult<Self> {
        Self::with_host(DEFAULT_HOST, request_timeout)
    }

    pub fn with_host(host: impl Into<String>, request_timeout: Duration) -> DiscoveryResult<Self> {
        // Proxies configured for the outside world must not intercept localhost.
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .no_proxy()
            .build()
            .map_err(|e| DiscoveryError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            host: host.into(),
        })
    }
}

#[async_trait]
impl ManifestFetcher for HttpFetcher {
    async fn fetch(&self, port: Port) -> Result<String, FetchError> {
        let url = introspection_url(&self.host, port);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_send_error(port, &url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url,
            reason: e.to_string(),
        })
    }
}

fn classify_send_error(port: Port, url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_connect() && io_error_kind(err) == Some(io::ErrorKind::ConnectionRefused) {
        return FetchError::ConnectionRefused {
            port,
            reason: err.to_string(),
        };
    }

    FetchError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// First `io::Error` kind found walking the source chain.
fn io_error_kind(err: &(dyn std::error::Error + 'static)) -> Option<io::ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        current = e.source();
    }
    None
}

/// States of one probe loop.
#[derive(Debug)]
enum ProbeState {
    Probing { attempt: u32 },
    RefusedRetry { attempt: u32, last: FetchError },
    Responded(String),
    Exhausted { attempts: u32, last: FetchError },
    Failed(FetchError),
}

/// Polls an introspection endpoint until it serves a manifest.
#[derive(Debug, Clone)]
pub struct IntrospectionClient<F = HttpFetcher> {
    fetcher: F,
    policy: RetryPolicy,
}

impl IntrospectionClient<HttpFetcher> {
    /// Client over HTTP to `localhost`.
    pub fn http(policy: RetryPolicy) -> DiscoveryResult<Self> {
        Ok(Self::new(HttpFetcher::new(policy.request_timeout)?, policy))
    }
}

impl<F: ManifestFetcher> IntrospectionClient<F> {
    pub fn new(fetcher: F, policy: RetryPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and parse the manifest served on `port`.
    pub async fn probe(&self, port: Port) -> DiscoveryResult<ManifestDocument> {
        let body = match tokio::time::timeout(self.policy.timeout, self.poll(port)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    port = %port,
                    timeout_ms = self.policy.timeout.as_millis() as u64,
                    "Introspection probe timed out"
                );
                return Err(ProbeError::Timeout {
                    timeout_ms: self.policy.timeout.as_millis() as u64,
                }
                .into());
            }
        };

        ManifestDocument::parse(&body)
    }

    async fn poll(&self, port: Port) -> Result<String, ProbeError> {
        let mut state = ProbeState::Probing { attempt: 1 };

        loop {
            state = match state {
                ProbeState::Probing { attempt } => match self.fetcher.fetch(port).await {
                    Ok(body) => ProbeState::Responded(body),
                    Err(e) if is_transient(&e) && attempt >= self.policy.max_attempts => {
                        ProbeState::Exhausted {
                            attempts: attempt,
                            last: e,
                        }
                    }
                    Err(e) if is_transient(&e) => ProbeState::RefusedRetry { attempt, last: e },
                    Err(e) => ProbeState::Failed(e),
                },
                ProbeState::RefusedRetry { attempt, last } => {
                    tracing::debug!(
                        port = %port,
                        attempt = attempt,
                        error = %last,
                        "Introspection endpoint not ready, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_interval).await;
                    ProbeState::Probing {
                        attempt: attempt + 1,
                    }
                }
                ProbeState::Responded(body) => {
                    tracing::debug!(
                        port = %port,
                        bytes = body.len(),
                        "Introspection endpoint responded"
                    );
                    return Ok(body);
                }
                ProbeState::Exhausted { attempts, last } => {
                    tracing::warn!(
                        port = %port,
                        attempts = attempts,
                        error = %last,
                        "Introspection endpoint never became ready"
                    );
                    return Err(ProbeError::RetriesExhausted { attempts, last });
                }
                ProbeState::Failed(e) => return Err(ProbeError::Fetch(e)),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const MANIFEST: &str = "specVersion: v1alpha1\ncloudFunctions: []\n";

    /// Refuses `refusals` times, then returns `then`.
    struct FakeFetcher {
        refusals: u32,
        then: Result<String, FetchError>,
        calls: AtomicU32,
    }

    impl FakeFetcher {
        fn new(refusals: u32, then: Result<String, FetchError>) -> Self {
            Self {
                refusals,
                then,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ManifestFetcher for FakeFetcher {
        async fn fetch(&self, port: Port) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.refusals {
                return Err(FetchError::ConnectionRefused {
                    port,
                    reason: "Still booting".to_string(),
                });
            }
            self.then.clone()
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            retry_interval: Duration::from_millis(1),
            max_attempts,
            timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(1),
        }
    }

    fn port() -> Port {
        Port::new(8080).unwrap()
    }

    #[test]
    fn test_is_transient() {
        assert!(is_transient(&FetchError::ConnectionRefused {
            port: port(),
            reason: "refused".to_string(),
        }));
        assert!(!is_transient(&FetchError::HttpStatus {
            url: "http://localhost:8080/backend.yaml".to_string(),
            status: 503,
        }));
        assert!(!is_transient(&FetchError::Transport {
            url: "http://localhost:8080/backend.yaml".to_string(),
            reason: "reset".to_string(),
        }));
    }

    #[test]
    fn test_introspection_url() {
        assert_eq!(
            introspection_url(DEFAULT_HOST, port()),
            "http://localhost:8080/backend.yaml"
        );
    }

    #[tokio::test]
    async fn test_succeeds_after_refusals() {
        let client = IntrospectionClient::new(
            FakeFetcher::new(20, Ok(MANIFEST.to_string())),
            fast_policy(30),
        );
        let doc = client.probe(port()).await.unwrap();
        assert_eq!(doc.spec_version().unwrap(), "v1alpha1");
        assert_eq!(client.fetcher.calls.load(Ordering::SeqCst), 21);
    }

    #[tokio::test]
    async fn test_exhausts_retry_budget() {
        let client = IntrospectionClient::new(
            FakeFetcher::new(20, Ok(MANIFEST.to_string())),
            fast_policy(5),
        );
        let err = client.probe(port()).await.unwrap_err();
        match err {
            DiscoveryError::Probe(ProbeError::RetriesExhausted { attempts, .. }) => {
                assert_eq!(attempts, 5)
            }
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        assert_eq!(client.fetcher.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_http_error_not_retried() {
        let failure = FetchError::HttpStatus {
            url: "http://localhost:8080/backend.yaml".to_string(),
            status: 500,
        };
        let client = IntrospectionClient::new(FakeFetcher::new(0, Err(failure)), fast_policy(30));
        let err = client.probe(port()).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Probe(ProbeError::Fetch(FetchError::HttpStatus { status: 500, .. }))
        ));
        assert_eq!(client.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overall_timeout() {
        let policy = RetryPolicy {
            retry_interval: Duration::from_millis(5),
            max_attempts: u32::MAX,
            timeout: Duration::from_millis(100),
            request_timeout: Duration::from_secs(1),
        };
        let client =
            IntrospectionClient::new(FakeFetcher::new(u32::MAX, Ok(String::new())), policy);
        let err = client.probe(port()).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Probe(ProbeError::Timeout { timeout_ms: 100 })
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let client = IntrospectionClient::new(
            FakeFetcher::new(0, Ok("{not: [yaml".to_string())),
            fast_policy(3),
        );
        let err = client.probe(port()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::ManifestParse { .. }));
    }

    #[test]
    fn test_default_policy_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts > 20);
        assert!(policy.timeout >= policy.retry_interval);
    }
}
