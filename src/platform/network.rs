//! Network connectivity interface.
//!
//! Probes the configured mirror endpoints over HTTP to decide whether the
//! installer will be able to download packages.
//!
//! # Graceful Degradation
//!
//! This module handles errors gracefully:
//! - DNS failures: Endpoint marked unreachable with the resolver error
//! - Connection timeout: Endpoint marked unreachable after the probe timeout
//! - Connection refused: Endpoint marked unreachable with the socket error
//! - TLS failures: Endpoint marked unreachable with the handshake error
//! - Malformed endpoint URL: Endpoint marked unreachable with the parse error
//!
//! Individual endpoint failures never fail the whole check; only an empty
//! endpoint list or cancellation produces a DetectError.

use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::{cancellable, ConnectivityChecker, ConnectivityReport, DetectError, DetectResult, EndpointCheck};

/// Default mirrors probed when no endpoints are configured.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "http://deb.debian.org/debian/",
    "http://security.debian.org/debian-security/",
    "http://ftp.debian.org/debian/",
];

fn parse_endpoint(endpoint: &str) -> DetectResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| DetectError::parse("endpoint", format!("{}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DetectError::parse(
            "endpoint",
            format!("unsupported URL scheme '{}': {}", url.scheme(), endpoint),
        ));
    }
    if url.host().is_none() {
        return Err(DetectError::parse("endpoint", format!("missing host in URL: {}", endpoint)));
    }

    Ok(url)
}

/// Client settings shared by every endpoint check. Redirects are not followed: any
/// answer from the mirror counts as reachable.
fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none())
        .user_agent(concat!("debian-preflight/", env!("CARGO_PKG_VERSION")))
}

fn describe(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        return DetectError::Timeout(timeout).to_string();
    }

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

async fn send_head(client: &Client, url: Url, timeout: Duration) -> Result<(), String> {
    let response = client
        .head(url)
        .send()
        .await
        .map_err(|e| describe(&e, timeout))?;

    let status = response.status();
    if status.is_server_error() {
        Err(format!("server error: HTTP {}", status.as_u16()))
    } else {
        Ok(())
    }
}

/// Probe one endpoint with `client`.
pub async fn check_endpoint(client: &Client, endpoint: &str, timeout: Duration) -> EndpointCheck {
    let start = Instant::now();

    let outcome = match parse_endpoint(endpoint) {
        Ok(url) => send_head(client, url, timeout).await,
        Err(e) => Err(e.to_string()),
    };
    let latency = start.elapsed();

    debug!(endpoint, ?latency, ok = outcome.is_ok(), "Probed endpoint");

    match outcome {
        Ok(()) => EndpointCheck {
            endpoint: endpoint.to_string(),
            success: true,
            latency,
            error_message: String::new(),
        },
        Err(message) => EndpointCheck {
            endpoint: endpoint.to_string(),
            success: false,
            latency,
            error_message: message,
        },
    }
}

async fn check_all(client: &Client, endpoints: &[String], timeout: Duration) -> Vec<EndpointCheck> {
    join_all(endpoints.iter().map(|e| check_endpoint(client, e, timeout))).await
}

/// Probes every configured endpoint concurrently.
#[derive(Debug, Clone)]
pub struct HttpConnectivityChecker {
    endpoints: Vec<String>,
    timeout: Duration,
}

impl HttpConnectivityChecker {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Self {
        HttpConnectivityChecker { endpoints, timeout }
    }
}

#[async_trait]
impl ConnectivityChecker for HttpConnectivityChecker {
    async fn check_internet_connectivity(
        &self,
        ctx: &CancellationToken,
    ) -> DetectResult<ConnectivityReport> {
        if self.endpoints.is_empty() {
            return Err(DetectError::NotFound(
                "no connectivity endpoints configured".to_string(),
            ));
        }

        let client = client_builder(self.timeout)
            .build()
            .map_err(|e| DetectError::Io {
                context: "http client".to_string(),
                message: e.to_string(),
            })?;
        let checks = cancellable(ctx, async {
            Ok::<_, DetectError>(check_all(&client, &self.endpoints, self.timeout).await)
        })
        .await?;

        Ok(ConnectivityReport::from_checks(checks))
    }
}
