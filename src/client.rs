//! HTTP client implementation and request timing


use crate::{
    error::{AppError, Result},
    models::ProbeTarget,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client,
};
use std::time::{Duration, Instant};

/// HTTP client trait for abstraction and testing
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform a full GET of the target, reading the whole body
    async fn fetch(&self, target: &ProbeTarget) -> Result<HttpOutcome>;
}

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOutcome {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
    /// Wall-clock time the request was started
    pub started_at: DateTime<Utc>,
    /// Time from sending the request to reading the last body byte
    pub elapsed: Duration,
}

impl HttpOutcome {
    /// Total request time in milliseconds
    pub fn total_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Request start as fractional seconds since the Unix epoch
    pub fn start_epoch(&self) -> f64 {
        epoch_seconds(self.started_at)
    }

    /// Request end as fractional seconds since the Unix epoch
    pub fn end_epoch(&self) -> f64 {
        self.start_epoch() + self.elapsed.as_secs_f64()
    }
}

/// Fractional seconds since the Unix epoch
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1_000_000_000.0
}

/// Build a header map from name/value pairs
pub fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("Invalid value for header '{}': {}", name, e)))?;
        map.append(name, value);
    }
    Ok(map)
}

/// reqwest-backed fetcher; every request opens a fresh connection
pub struct NetworkClient {
    client: Client,
    default_timeout: Duration,
}

impl NetworkClient {
    /// Create a new network client
    pub fn new() -> Result<Self> {
        Self::with_timeout(crate::defaults::DEFAULT_TIMEOUT)
    }

    /// Create a new network client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| AppError::http_request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

#[async_trait]
impl HttpFetcher for NetworkClient {
    async fn fetch(&self, target: &ProbeTarget) -> Result<HttpOutcome> {
        let headers = build_header_map(target.headers())?;
        let request = self.client.get(target.url()).headers(headers);

        let started_at = Utc::now();
        let start = Instant::now();

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::http_request(format!("Failed to read response body: {}", e)))?;
        let elapsed = start.elapsed();

        Ok(HttpOutcome {
            status_code,
            content_type,
            body_len: body.len(),
            started_at,
            elapsed,
        })
    }
}
