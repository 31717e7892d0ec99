//! Error handling for the latency sampler
//!
//! Probe phase errors (DNS, TCP, HTTP, validation, timeout) are local to a
//! single iteration. Anything else that escapes the sampling loop ends the run.

use thiserror::Error;

/// Custom error types for the latency sampler
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// DNS resolution errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// TCP connect or close errors
    #[error("TCP connection error: {0}")]
    TcpConnect(String),

    /// HTTP transport errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Response rejected by the acceptance policy
    #[error("Response validation error: {0}")]
    ResponseValidation(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, raw dumps, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Report generation errors
    #[error("Report error: {0}")]
    Report(String),

    /// Errors that terminate a sampling run
    #[error("Fatal error: {0}")]
    Fatal(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new TCP connection error
    pub fn tcp_connect<S: Into<String>>(message: S) -> Self {
        Self::TcpConnect(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new response validation error
    pub fn response_validation<S: Into<String>>(message: S) -> Self {
        Self::ResponseValidation(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new report error
    pub fn report<S: Into<String>>(message: S) -> Self {
        Self::Report(message.into())
    }

    /// Create a new fatal error
    pub fn fatal<S: Into<String>>(message: S) -> Self {
        Self::Fatal(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::DnsResolution(_) => "DNS",
            Self::TcpConnect(_) => "TCP",
            Self::HttpRequest(_) => "HTTP",
            Self::ResponseValidation(_) => "VALIDATION",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Report(_) => "REPORT",
            Self::Fatal(_) => "FATAL",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error stays inside a single probe iteration
    pub fn is_iteration_local(&self) -> bool {
        match self {
            Self::DnsResolution(_)
            | Self::TcpConnect(_)
            | Self::HttpRequest(_)
            | Self::ResponseValidation(_)
            | Self::Timeout(_) => true,
            Self::Config(_) | Self::Io(_) | Self::Parse(_) | Self::Report(_) => false,
            Self::Fatal(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::DnsResolution(msg) => {
                format!("DNS resolution failed: {}\n\nSuggestion: Check that the target domain exists and that the system resolver is reachable.", msg)
            }
            Self::TcpConnect(msg) => {
                format!("TCP connection failed: {}\n\nSuggestion: Check that the target port is reachable and not blocked by a firewall.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The target server may be down or blocking requests.", msg)
            }
            Self::ResponseValidation(msg) => {
                format!("Unexpected response: {}\n\nSuggestion: The target must answer 200 with an HTML or JavaScript body.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout value using --timeout or check your network connection.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check that the raw results file was written by this tool and not edited.", msg)
            }
            Self::Report(msg) => {
                format!("Report generation failed: {}\n\nSuggestion: The samples are kept in the raw results file; rerun with --report-from once the problem is fixed.", msg)
            }
            Self::Fatal(msg) => {
                format!("Sampling run aborted: {}\n\nNo report was generated for this run.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::DnsResolution(_) | Self::TcpConnect(_) | Self::HttpRequest(_) => 2,
            Self::ResponseValidation(_) => 2,
            Self::Timeout(_) => 3,
            Self::Fatal(_) => 4,
            Self::Io(_) => 5,
            Self::Report(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::DnsResolution(_)
                | Self::TcpConnect(_)
                | Self::HttpRequest(_)
                | Self::ResponseValidation(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::Report(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Fatal(_) | Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
