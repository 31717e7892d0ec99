//! Staged prober: DNS, then TCP, then a full HTTP GET
//!
//! One probe produces one status line and, when every phase succeeded and the
//! response passed validation, one sample. The HTTP latency of a sample is the
//! total request time minus the separately measured DNS and TCP times. Those
//! are three independent round trips, so the value is an approximation and can
//! come out negative.

use crate::{
    client::{HttpFetcher, HttpOutcome},
    error::{AppError, Result},
    logging::ProbeLogger,
    models::{ProbeTarget, Sample},
    timing::{extract_domain, PhaseTimer},
    types::{IterationStatus, Phase},
};
use async_trait::async_trait;

/// Content types a response must carry to be accepted
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["application/javascript", "text/html"];

/// Result of probing the target once
#[derive(Debug)]
pub struct ProbeOutcome {
    pub sequence_number: u64,
    pub status: IterationStatus,
    /// Human-readable line appended to the status log
    pub status_line: String,
    /// Present only for accepted iterations
    pub sample: Option<Sample>,
    /// Phase error or validation failure, if any
    pub error: Option<AppError>,
}

impl ProbeOutcome {
    fn accepted(sequence_number: u64, status_line: String, sample: Sample) -> Self {
        Self {
            sequence_number,
            status: IterationStatus::Accepted,
            status_line,
            sample: Some(sample),
            error: None,
        }
    }

    fn rejected(sequence_number: u64, status_line: String, error: AppError) -> Self {
        Self {
            sequence_number,
            status: IterationStatus::Rejected,
            status_line,
            sample: None,
            error: Some(error),
        }
    }

    fn failed(sequence_number: u64, status_line: String, error: AppError) -> Self {
        Self {
            sequence_number,
            status: IterationStatus::Failed,
            status_line,
            sample: None,
            error: Some(error),
        }
    }
}

/// Anything that can be probed once per sampling iteration
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe the target; never fails, errors are folded into the outcome
    async fn probe(&self, sequence_number: u64) -> ProbeOutcome;

    /// The target being probed
    fn target(&self) -> &ProbeTarget;
}

/// Check a response against the acceptance policy:
/// status 200, an HTML or JavaScript content type, and a non-empty body.
pub fn validate_response(outcome: &HttpOutcome) -> Result<()> {
    if outcome.status_code != 200 {
        return Err(AppError::response_validation(format!("unexpected status {}", outcome.status_code)));
    }

    match outcome.content_type.as_deref() {
        None => return Err(AppError::response_validation("missing content type")),
        Some(content_type) if !ACCEPTED_CONTENT_TYPES.iter().any(|t| content_type.contains(t)) => {
            return Err(AppError::response_validation(format!(
                "unexpected content type '{}'",
                content_type
            )));
        }
        Some(_) => {}
    }

    if outcome.body_len == 0 {
        return Err(AppError::response_validation("empty body"));
    }

    Ok(())
}

/// Status line for an iteration that got a response, accepted or not.
///
/// Floats keep their fractional part, so whole values print as `7.0`.
pub fn format_status_line(url: &str, outcome: &HttpOutcome, sample: &Sample) -> String {
    format!(
        "REQ_URL: {}, RSP_CODE: {}, REQ_START: {:?}, REQ_END: {:?}, HTTP_RESP_TIME: {:?}, DNS_RESP_TIME: {:?}, TCP_CONN_TIME: {:?}",
        url,
        outcome.status_code,
        outcome.start_epoch(),
        outcome.end_epoch(),
        sample.http_latency_ms,
        sample.dns_latency_ms,
        sample.tcp_latency_ms,
    )
}

/// Prober composing the three phases against one target
pub struct StagedProber<T, F> {
    target: ProbeTarget,
    timer: T,
    fetcher: F,
    tcp_port: u16,
    logger: ProbeLogger,
}

impl<T: PhaseTimer, F: HttpFetcher> StagedProber<T, F> {
    /// Create a prober connecting to port 443 in the TCP phase
    pub fn new(target: ProbeTarget, timer: T, fetcher: F) -> Self {
        Self {
            target,
            timer,
            fetcher,
            tcp_port: crate::defaults::DEFAULT_TCP_PORT,
            logger: ProbeLogger::quiet(),
        }
    }

    pub fn with_tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = port;
        self
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }
}

#[async_trait]
impl<T: PhaseTimer, F: HttpFetcher> Probe for StagedProber<T, F> {
    async fn probe(&self, sequence_number: u64) -> ProbeOutcome {
        let url = self.target.url();

        let domain = match extract_domain(url) {
            Ok(domain) => domain,
            Err(e) => {
                let line = format!("DNS Resolution Error for {}: {}", url, e);
                return ProbeOutcome::failed(sequence_number, line, e);
            }
        };

        let dns_ms = match self.timer.measure_dns(domain).await {
            Ok(ms) => {
                self.logger.log_phase(Phase::Dns, sequence_number, domain, Some(ms), None).await;
                ms
            }
            Err(e) => {
                self.logger.log_phase(Phase::Dns, sequence_number, domain, None, Some(&e)).await;
                let line = format!("DNS Resolution Error for {}: {}", url, e);
                return ProbeOutcome::failed(sequence_number, line, e);
            }
        };

        let tcp_ms = match self.timer.measure_tcp_connect(domain, self.tcp_port).await {
            Ok(ms) => {
                self.logger.log_phase(Phase::Tcp, sequence_number, domain, Some(ms), None).await;
                ms
            }
            Err(e) => {
                self.logger.log_phase(Phase::Tcp, sequence_number, domain, None, Some(&e)).await;
                let line = format!("TCP Connection Error for {}: {}", url, e);
                return ProbeOutcome::failed(sequence_number, line, e);
            }
        };

        let outcome = match self.fetcher.fetch(&self.target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.log_phase(Phase::Http, sequence_number, url, None, Some(&e)).await;
                let line = format!("Request for {} error: {}", url, e);
                return ProbeOutcome::failed(sequence_number, line, e);
            }
        };
        self.logger.log_phase(Phase::Http, sequence_number, url, Some(outcome.total_ms()), None).await;

        let sample = Sample::from_total(sequence_number, outcome.total_ms(), dns_ms, tcp_ms);
        let line = format_status_line(url, &outcome, &sample);

        match validate_response(&outcome) {
            Ok(()) => {
                self.logger.log_sample(&sample).await;
                ProbeOutcome::accepted(sequence_number, line, sample)
            }
            Err(e) => {
                self.logger.log_rejection(sequence_number, outcome.status_code, &e.to_string()).await;
                ProbeOutcome::rejected(sequence_number, line, e)
            }
        }
    }

    fn target(&self) -> &ProbeTarget {
        &self.target
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Phase timer returning fixed results
    pub struct FakeTimer {
        pub dns: std::result::Result<f64, String>,
        pub tcp: std::result::Result<f64, String>,
        pub tcp_calls: AtomicUsize,
        pub ports: Mutex<Vec<u16>>,
    }

    impl FakeTimer {
        pub fn ok(dns_ms: f64, tcp_ms: f64) -> Self {
            Self {
                dns: Ok(dns_ms),
                tcp: Ok(tcp_ms),
                tcp_calls: AtomicUsize::new(0),
                ports: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PhaseTimer for FakeTimer {
        async fn measure_dns(&self, _domain: &str) -> Result<f64> {
            self.dns.clone().map_err(AppError::dns_resolution)
        }

        async fn measure_tcp_connect(&self, _domain: &str, port: u16) -> Result<f64> {
            self.tcp_calls.fetch_add(1, Ordering::SeqCst);
            self.ports.lock().unwrap().push(port);
            self.tcp.clone().map_err(AppError::tcp_connect)
        }
    }

    /// Fetcher returning a canned response
    pub struct FakeFetcher {
        pub response: std::result::Result<HttpOutcome, String>,
        pub calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn respond(status_code: u16, content_type: Option<&str>, body_len: usize, elapsed_ms: u64) -> Self {
            Self {
                response: Ok(HttpOutcome {
                    status_code,
                    content_type: content_type.map(str::to_string),
                    body_len,
                    started_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                    elapsed: Duration::from_millis(elapsed_ms),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn fail(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpFetcher for FakeFetcher {
        async fn fetch(&self, _target: &ProbeTarget) -> Result<HttpOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(AppError::http_request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{FakeFetcher, FakeTimer};
    use super::*;
    use std::sync::atomic::Ordering;

    const URL: &str = "https://example.com/index.html";

    fn prober(timer: FakeTimer, fetcher: FakeFetcher) -> StagedProber<FakeTimer, FakeFetcher> {
        StagedProber::new(ProbeTarget::new(URL), timer, fetcher)
    }

    #[tokio::test]
    async fn test_accepted_sample_subtracts_lower_phases() {
        let prober = prober(FakeTimer::ok(5.0, 8.0), FakeFetcher::respond(200, Some("text/html"), 512, 20));

        let outcome = prober.probe(1).await;

        assert_eq!(outcome.status, IterationStatus::Accepted);
        assert_eq!(outcome.sample.unwrap().as_tuple(), (1, 7.0, 5.0, 8.0));
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.status_line,
            "REQ_URL: https://example.com/index.html, RSP_CODE: 200, REQ_START: 1700000000.0, REQ_END: 1700000000.02, HTTP_RESP_TIME: 7.0, DNS_RESP_TIME: 5.0, TCP_CONN_TIME: 8.0"
        );
    }

    #[tokio::test]
    async fn test_negative_http_latency_is_preserved() {
        let prober = prober(FakeTimer::ok(15.0, 12.0), FakeFetcher::respond(200, Some("text/html"), 10, 20));

        let sample = prober.probe(2).await.sample.unwrap();
        assert_eq!(sample.http_latency_ms, -7.0);
    }

    #[tokio::test]
    async fn test_javascript_content_type_accepted() {
        let prober = prober(
            FakeTimer::ok(1.0, 1.0),
            FakeFetcher::respond(200, Some("application/javascript; charset=utf-8"), 10, 5),
        );
        assert_eq!(prober.probe(1).await.status, IterationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_not_found_rejected_with_status_line() {
        let prober = prober(FakeTimer::ok(5.0, 8.0), FakeFetcher::respond(404, Some("text/html"), 100, 20));

        let outcome = prober.probe(3).await;

        assert_eq!(outcome.status, IterationStatus::Rejected);
        assert!(outcome.sample.is_none());
        assert!(outcome.status_line.starts_with("REQ_URL: https://example.com/index.html, RSP_CODE: 404"));
        assert!(matches!(outcome.error, Some(AppError::ResponseValidation(_))));
    }

    #[tokio::test]
    async fn test_json_content_type_rejected() {
        let prober = prober(FakeTimer::ok(5.0, 8.0), FakeFetcher::respond(200, Some("application/json"), 100, 20));

        let outcome = prober.probe(1).await;

        assert_eq!(outcome.status, IterationStatus::Rejected);
        assert!(outcome.sample.is_none());
        assert!(outcome.status_line.contains("RSP_CODE: 200"));
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let prober = prober(FakeTimer::ok(5.0, 8.0), FakeFetcher::respond(200, Some("text/html"), 0, 20));

        let outcome = prober.probe(1).await;

        assert_eq!(outcome.status, IterationStatus::Rejected);
        assert!(outcome.sample.is_none());
        assert!(!outcome.status_line.is_empty());
    }

    #[tokio::test]
    async fn test_dns_failure_skips_later_phases() {
        let mut timer = FakeTimer::ok(0.0, 8.0);
        timer.dns = Err("no such host".to_string());
        let prober = prober(timer, FakeFetcher::respond(200, Some("text/html"), 10, 20));

        let outcome = prober.probe(1).await;

        assert_eq!(outcome.status, IterationStatus::Failed);
        assert!(outcome.status_line.starts_with("DNS Resolution Error for https://example.com/index.html"));
        assert!(matches!(outcome.error, Some(AppError::DnsResolution(_))));
        assert_eq!(prober.timer.tcp_calls.load(Ordering::SeqCst), 0);
        assert_eq!(prober.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tcp_failure_skips_http() {
        let mut timer = FakeTimer::ok(5.0, 0.0);
        timer.tcp = Err("close failed".to_string());
        let prober = prober(timer, FakeFetcher::respond(200, Some("text/html"), 10, 20));

        let outcome = prober.probe(1).await;

        assert_eq!(outcome.status, IterationStatus::Failed);
        assert!(outcome.status_line.starts_with("TCP Connection Error for"));
        assert!(outcome.sample.is_none());
        assert_eq!(prober.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_http_failure_generic_status_line() {
        let prober = prober(FakeTimer::ok(5.0, 8.0), FakeFetcher::fail("connection reset"));

        let outcome = prober.probe(4).await;

        assert_eq!(outcome.status, IterationStatus::Failed);
        assert_eq!(
            outcome.status_line,
            "Request for https://example.com/index.html error: HTTP request error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_tcp_port_defaults_to_443() {
        let prober = prober(FakeTimer::ok(1.0, 1.0), FakeFetcher::respond(200, Some("text/html"), 1, 5));
        prober.probe(1).await;
        assert_eq!(*prober.timer.ports.lock().unwrap(), vec![443]);

        let prober = StagedProber::new(
            ProbeTarget::new(URL),
            FakeTimer::ok(1.0, 1.0),
            FakeFetcher::respond(200, Some("text/html"), 1, 5),
        )
        .with_tcp_port(8443);
        prober.probe(1).await;
        assert_eq!(*prober.timer.ports.lock().unwrap(), vec![8443]);
    }

    #[test]
    fn test_validate_response_missing_content_type() {
        let outcome = HttpOutcome {
            status_code: 200,
            content_type: None,
            body_len: 10,
            started_at: chrono::Utc::now(),
            elapsed: std::time::Duration::from_millis(1),
        };
        let error = validate_response(&outcome).unwrap_err();
        assert!(error.to_string().contains("missing content type"));
    }
}
