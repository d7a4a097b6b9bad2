//! Core data types for expiry lookups.
//!
//! Everything here is a value object created and consumed within a single
//! [`ExpiryChecker::check_domain`](crate::ExpiryChecker::check_domain) call.

use crate::error::ExpiryCheckError;
use crate::severity::{ExpiryStatus, Severity};
use crate::utils::{normalize_domain, validate_hostname};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A normalized, lowercase hostname with no scheme, `www.` or path.
///
/// Only constructed through [`Hostname::parse`], so it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Normalize raw user input and reject anything that is not a hostname.
    pub fn parse(raw: &str) -> Result<Self, ExpiryCheckError> {
        let normalized = normalize_domain(raw);
        validate_hostname(&normalized).map_err(|reason| {
            ExpiryCheckError::invalid_domain(raw.trim(), reason)
        })?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which SSL strategy produced a certificate expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertSource {
    /// The live certificate, as reported by the inspection service
    #[serde(rename = "certificate_inspection")]
    CertificateInspection,

    /// Latest matching certificate found in a CT log
    #[serde(rename = "certificate_transparency")]
    CertificateTransparency,
}

impl fmt::Display for CertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertSource::CertificateInspection => write!(f, "certificate inspection"),
            CertSource::CertificateTransparency => write!(f, "certificate transparency"),
        }
    }
}

/// Where an expiry record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirySource {
    Registration,
    Certificate(CertSource),
}

/// One lookup attempt's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryRecord {
    pub source: ExpirySource,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A certificate logged in a CT log, reduced to what matching needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateCandidate {
    /// SAN entries in log order, or the single common name
    pub subject_names: Vec<String>,
    pub not_after: DateTime<Utc>,
}

/// Outcome of querying a single upstream source.
///
/// `Failed` keeps the reason for logging; callers treat it like `Absent`.
#[derive(Debug, Clone)]
pub enum SourceOutcome<T> {
    Found(T),
    Absent,
    Failed(ExpiryCheckError),
}

impl<T> SourceOutcome<T> {
    /// Collapse a failure into absence.
    pub fn into_option(self) -> Option<T> {
        match self {
            SourceOutcome::Found(value) => Some(value),
            SourceOutcome::Absent | SourceOutcome::Failed(_) => None,
        }
    }
}

impl<T> From<Result<Option<T>, ExpiryCheckError>> for SourceOutcome<T> {
    fn from(result: Result<Option<T>, ExpiryCheckError>) -> Self {
        match result {
            Ok(Some(value)) => SourceOutcome::Found(value),
            Ok(None) => SourceOutcome::Absent,
            Err(e) => SourceOutcome::Failed(e),
        }
    }
}

/// Reconciled result of a domain check.
///
/// At least one of `domain_expiry` and `ssl_expiry` is present; when both
/// are absent the checker returns [`ExpiryCheckError::NoPublicData`] instead.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    /// The hostname that was checked
    pub domain: Hostname,

    /// When the registration expires
    pub domain_expiry: Option<DateTime<Utc>>,

    /// When the current TLS certificate expires
    pub ssl_expiry: Option<DateTime<Utc>>,

    /// Which strategy produced `ssl_expiry`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_source: Option<CertSource>,

    /// How long the whole check took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<Duration>,
}

impl LookupResult {
    /// Registration expiry status relative to `now`.
    pub fn domain_status(&self, now: DateTime<Utc>) -> Option<ExpiryStatus> {
        self.domain_expiry
            .map(|expires_at| ExpiryStatus::new(expires_at, now))
    }

    /// Certificate expiry status relative to `now`.
    pub fn ssl_status(&self, now: DateTime<Utc>) -> Option<ExpiryStatus> {
        self.ssl_expiry
            .map(|expires_at| ExpiryStatus::new(expires_at, now))
    }

    /// Headline tier, driven by the registration expiry.
    ///
    /// Unknown registration expiry reads as `Warning`.
    pub fn severity(&self, now: DateTime<Utc>) -> Severity {
        self.domain_status(now)
            .map(|status| status.severity)
            .unwrap_or(Severity::Warning)
    }
}

/// Configuration options for expiry lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Timeout for each individual source.
    /// Default: 10 seconds
    #[serde(skip)]
    pub timeout: Duration,

    /// Whether to query the CT log when the inspection service has no answer.
    /// Default: true
    pub enable_ct_fallback: bool,

    /// Base URL of the RDAP service (`<base>/domain/<host>`)
    pub rdap_url: String,

    /// Base URL of the certificate inspection service
    /// (`<base>/api/security/certificate/<host>`)
    pub certificate_url: String,

    /// Base URL of the CT log search (`<base>/?q=<host>&output=json`)
    pub transparency_url: String,

    /// User-Agent sent with every request
    pub user_agent: String,
}

pub const DEFAULT_RDAP_URL: &str = "https://rdap.org";
pub const DEFAULT_CERTIFICATE_URL: &str = "https://networkcalc.com";
pub const DEFAULT_TRANSPARENCY_URL: &str = "https://crt.sh";

/// Longest per-source timeout accepted by [`CheckConfig::with_timeout`].
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60);

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            enable_ct_fallback: true,
            rdap_url: DEFAULT_RDAP_URL.to_string(),
            certificate_url: DEFAULT_CERTIFICATE_URL.to_string(),
            transparency_url: DEFAULT_TRANSPARENCY_URL.to_string(),
            user_agent: format!("expiry-check/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CheckConfig {
    /// Set the per-source timeout, clamped to between one second and
    /// [`MAX_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.clamp(Duration::from_secs(1), MAX_TIMEOUT);
        self
    }

    /// Enable or disable the CT log fallback.
    pub fn with_ct_fallback(mut self, enabled: bool) -> Self {
        self.enable_ct_fallback = enabled;
        self
    }

    pub fn with_rdap_url<S: Into<String>>(mut self, url: S) -> Self {
        self.rdap_url = url.into();
        self
    }

    pub fn with_certificate_url<S: Into<String>>(mut self, url: S) -> Self {
        self.certificate_url = url.into();
        self
    }

    pub fn with_transparency_url<S: Into<String>>(mut self, url: S) -> Self {
        self.transparency_url = url.into();
        self
    }
}
