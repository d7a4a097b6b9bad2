//! Error handling for expiry lookups.
//!
//! Individual upstream failures are absorbed inside each client and only
//! surface as [`SourceOutcome::Failed`](crate::SourceOutcome). The one error
//! that reaches callers of [`ExpiryChecker`](crate::ExpiryChecker) in normal
//! operation is [`ExpiryCheckError::NoPublicData`], plus
//! [`ExpiryCheckError::InvalidDomain`] for input that normalizes to nothing.

use std::fmt;
use std::time::Duration;

/// Message shown when no source yields a domain or certificate expiry.
pub const NO_PUBLIC_DATA_MESSAGE: &str =
    "The domain registrar or registry does not provide this information publicly.";

/// Upstream service a lookup talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Registration data (RDAP)
    Registration,
    /// Live certificate inspection service
    CertificateInspection,
    /// Certificate-transparency log search
    CertificateTransparency,
}

impl fmt::Display for LookupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupSource::Registration => write!(f, "RDAP"),
            LookupSource::CertificateInspection => write!(f, "certificate inspection"),
            LookupSource::CertificateTransparency => write!(f, "CT log"),
        }
    }
}

/// Main error type for expiry lookups.
#[derive(Debug, Clone)]
pub enum ExpiryCheckError {
    /// Input that does not normalize to a usable hostname
    InvalidDomain { domain: String, reason: String },

    /// Network-related errors (connection refused, DNS, TLS handshake)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// An upstream service answered, but not with usable data
    SourceError {
        source: LookupSource,
        message: String,
        status_code: Option<u16>,
    },

    /// Response bodies or dates that could not be parsed
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// A source did not answer within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Invalid settings in a config file or the environment
    ConfigError { message: String },

    /// Config file I/O errors
    FileError { path: String, message: String },

    /// Every source for both the domain and the certificate came back empty
    NoPublicData { domain: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ExpiryCheckError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new upstream source error.
    pub fn source_error<M: Into<String>>(source: LookupSource, message: M) -> Self {
        Self::SourceError {
            source,
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new upstream source error carrying the HTTP status.
    pub fn source_error_with_status<M: Into<String>>(
        source: LookupSource,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::SourceError {
            source,
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create the aggregate "nothing found anywhere" error.
    pub fn no_public_data<D: Into<String>>(domain: D) -> Self {
        Self::NoPublicData {
            domain: domain.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the aggregate error that should prompt a manual lookup.
    pub fn is_no_public_data(&self) -> bool {
        matches!(self, Self::NoPublicData { .. })
    }
}

impl fmt::Display for ExpiryCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::SourceError {
                source,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "{} lookup failed (HTTP {}): {}", source, code, message)
                } else {
                    write!(f, "{} lookup failed: {}", source, message)
                }
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::NoPublicData { .. } => write!(f, "{}", NO_PUBLIC_DATA_MESSAGE),
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpiryCheckError {}

impl From<reqwest::Error> for ExpiryCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", Duration::from_secs(10))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Response body could not be decoded: {}", err))
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExpiryCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for ExpiryCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
