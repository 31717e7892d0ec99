//! Stopwatch measurements of single network phases
//!
//! Each primitive times exactly one blocking network operation against a host
//! and reports the elapsed wall-clock time in milliseconds.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

/// Milliseconds elapsed since `start`
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Extract the host from an absolute URL.
///
/// Takes the third `/`-separated field (the authority of `scheme://host/...`)
/// and drops a trailing `:port`. No further parsing is attempted.
pub fn extract_domain(url: &str) -> Result<&str> {
    let authority = url
        .split('/')
        .nth(2)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::parse(format!("Cannot extract domain from URL '{}'", url)))?;

    if let Some(rest) = authority.strip_prefix('[') {
        // [v6addr]:port
        return rest
            .split(']')
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::parse(format!("Cannot extract domain from URL '{}'", url)));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => Ok(host),
        _ => Ok(authority),
    }
}

/// Time a connection attempt, then close it.
///
/// Only the connect is timed. A failed close invalidates the measurement: the
/// caller gets a `TcpConnect` error instead of the duration recorded before it.
pub async fn time_connect_then_close<S, C, CF, K, KF>(target: &str, connect: C, close: K) -> Result<f64>
where
    C: FnOnce() -> CF,
    CF: Future<Output = io::Result<S>>,
    K: FnOnce(S) -> KF,
    KF: Future<Output = io::Result<()>>,
{
    let start = Instant::now();
    let stream = connect()
        .await
        .map_err(|e| AppError::tcp_connect(format!("connect to {} failed: {}", target, e)))?;
    let connect_ms = elapsed_ms(start);

    close(stream)
        .await
        .map_err(|e| AppError::tcp_connect(format!("close of connection to {} failed: {}", target, e)))?;

    Ok(connect_ms)
}

/// Phase timing abstraction used by the prober
#[async_trait]
pub trait PhaseTimer: Send + Sync {
    /// Resolve `domain` and return the resolution time in milliseconds
    async fn measure_dns(&self, domain: &str) -> Result<f64>;

    /// Connect to `(domain, port)`, close, and return the connect time in milliseconds
    async fn measure_tcp_connect(&self, domain: &str, port: u16) -> Result<f64>;
}

/// Phase timer backed by the operating system resolver and TCP stack
#[derive(Debug, Clone)]
pub struct SystemPhaseTimer {
    timeout: Duration,
}

impl SystemPhaseTimer {
    /// Create a timer whose phases give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemPhaseTimer {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl PhaseTimer for SystemPhaseTimer {
    async fn measure_dns(&self, domain: &str) -> Result<f64> {
        let start = Instant::now();

        let addrs = timeout(self.timeout, lookup_host((domain, 0u16)))
            .await
            .map_err(|_| AppError::timeout(format!("DNS lookup for {} timed out after {}s", domain, self.timeout.as_secs())))?
            .map_err(|e| AppError::dns_resolution(format!("{}: {}", domain, e)))?;

        let resolution_ms = elapsed_ms(start);

        if addrs.count() == 0 {
            return Err(AppError::dns_resolution(format!("{}: no addresses returned", domain)));
        }

        Ok(resolution_ms)
    }

    async fn measure_tcp_connect(&self, domain: &str, port: u16) -> Result<f64> {
        let target = format!("{}:{}", domain, port);
        let limit = self.timeout;

        time_connect_then_close(
            &target,
            || async move {
                timeout(limit, TcpStream::connect((domain, port)))
                    .await
                    .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("timed out after {}s", limit.as_secs())))?
            },
            |mut stream: TcpStream| async move { stream.shutdown().await },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://example.com/index.html").unwrap(), "example.com");
        assert_eq!(extract_domain("https://cttools.co.uk/shape_sed.html").unwrap(), "cttools.co.uk");
        assert_eq!(extract_domain("http://api.example.com").unwrap(), "api.example.com");
        assert_eq!(extract_domain("http://127.0.0.1:8080/path").unwrap(), "127.0.0.1");
        assert_eq!(extract_domain("http://[::1]:8080/path").unwrap(), "::1");
    }

    #[test]
    fn test_extract_domain_rejects_relative() {
        assert!(extract_domain("example.com").is_err());
        assert!(extract_domain("https:///path").is_err());
        assert!(extract_domain("").is_err());
    }

    #[tokio::test]
    async fn test_connect_then_close_success() {
        let result = time_connect_then_close(
            "fake:443",
            || async { Ok::<_, io::Error>(()) },
            |_| async { Ok(()) },
        )
        .await;

        let duration = result.unwrap();
        assert!(duration >= 0.0);
    }

    #[tokio::test]
    async fn test_close_failure_invalidates_measurement() {
        let result = time_connect_then_close(
            "fake:443",
            || async { Ok::<_, io::Error>(()) },
            |_| async { Err(io::Error::new(io::ErrorKind::BrokenPipe, "close failed")) },
        )
        .await;

        let error = result.unwrap_err();
        assert!(matches!(error, AppError::TcpConnect(_)));
        assert!(error.to_string().contains("close of connection"));
    }

    #[tokio::test]
    async fn test_connect_failure_skips_close() {
        let mut closed = false;
        let result = time_connect_then_close(
            "fake:443",
            || async { Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")) },
            |_| {
                closed = true;
                async { Ok(()) }
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::TcpConnect(_))));
        assert!(!closed);
    }

    #[tokio::test]
    async fn test_system_dns_resolves_ip_literal() {
        let timer = SystemPhaseTimer::new(Duration::from_secs(5));
        let duration = timer.measure_dns("127.0.0.1").await.unwrap();
        assert!(duration >= 0.0);
    }

    #[tokio::test]
    async fn test_system_dns_failure() {
        let timer = SystemPhaseTimer::new(Duration::from_secs(5));
        let result = timer.measure_dns("does-not-exist.invalid").await;
        assert!(matches!(result, Err(AppError::DnsResolution(_)) | Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_system_tcp_connect_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let timer = SystemPhaseTimer::new(Duration::from_secs(5));
        let duration = timer.measure_tcp_connect("127.0.0.1", port).await.unwrap();
        assert!(duration >= 0.0);
    }

    #[tokio::test]
    async fn test_system_tcp_connect_refused() {
        // Bind then drop to get a port with nothing listening
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let timer = SystemPhaseTimer::new(Duration::from_secs(5));
        let result = timer.measure_tcp_connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(AppError::TcpConnect(_))));
    }
}
