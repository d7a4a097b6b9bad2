//! Main expiry checker implementation.
//!
//! `ExpiryChecker` runs the registration and live-certificate lookups side by
//! side, falls back to the CT log when the live certificate is unknown, and
//! reconciles the answers into one [`LookupResult`].

use crate::error::{ExpiryCheckError, LookupSource};
use crate::protocols::{CertificateClient, RdapClient, TransparencyClient};
use crate::types::{
    CertSource, CheckConfig, ExpiryRecord, ExpirySource, Hostname, LookupResult, SourceOutcome,
};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::debug;

/// Coordinates the lookups for a single domain.
///
/// # Example
///
/// ```rust,no_run
/// use expiry_check_lib::ExpiryChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = ExpiryChecker::new()?;
///     let result = checker.check_domain("example.com").await?;
///     println!("Domain expires: {:?}", result.domain_expiry);
///     println!("SSL expires: {:?}", result.ssl_expiry);
///     Ok(())
/// }
/// ```
pub struct ExpiryChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Registration expiry source
    rdap_client: RdapClient,
    /// Primary SSL expiry source
    certificate_client: CertificateClient,
    /// Fallback SSL expiry source
    transparency_client: TransparencyClient,
}

impl ExpiryChecker {
    /// Create a checker against the public services with a 10 second
    /// per-source timeout.
    pub fn new() -> Result<Self, ExpiryCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom endpoints, timeout or fallback setting.
    ///
    /// # Example
    ///
    /// ```rust
    /// use expiry_check_lib::{CheckConfig, ExpiryChecker};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_timeout(Duration::from_secs(5))
    ///     .with_ct_fallback(false);
    ///
    /// let checker = ExpiryChecker::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: CheckConfig) -> Result<Self, ExpiryCheckError> {
        let rdap_client = RdapClient::new(&config.rdap_url, config.timeout, &config.user_agent)?;
        let certificate_client =
            CertificateClient::new(&config.certificate_url, config.timeout, &config.user_agent)?;
        let transparency_client = TransparencyClient::new(
            &config.transparency_url,
            config.timeout,
            &config.user_agent,
        )?;

        Ok(Self {
            config,
            rdap_client,
            certificate_client,
            transparency_client,
        })
    }

    /// Normalize raw input and check it.
    ///
    /// # Errors
    ///
    /// - [`ExpiryCheckError::InvalidDomain`] if the input normalizes to
    ///   nothing usable. No request is made in that case.
    /// - [`ExpiryCheckError::NoPublicData`] if no source knows either expiry.
    pub async fn check_domain(&self, domain: &str) -> Result<LookupResult, ExpiryCheckError> {
        let hostname = Hostname::parse(domain)?;
        self.check_hostname(&hostname).await
    }

    /// Check an already-normalized hostname.
    ///
    /// The checking process:
    /// 1. RDAP and certificate inspection run concurrently; both are awaited
    /// 2. If inspection has no answer, the CT log is queried (when enabled)
    /// 3. The two expiries are reconciled into a result or `NoPublicData`
    pub async fn check_hostname(
        &self,
        hostname: &Hostname,
    ) -> Result<LookupResult, ExpiryCheckError> {
        let start_time = Instant::now();

        let (registration, inspection) = tokio::join!(
            self.rdap_client.lookup_expiration(hostname),
            self.certificate_client.lookup_valid_to(hostname),
        );

        let domain_record = ExpiryRecord {
            source: ExpirySource::Registration,
            expires_at: settle(hostname, LookupSource::Registration, registration),
        };

        let mut ssl_record = ExpiryRecord {
            source: ExpirySource::Certificate(CertSource::CertificateInspection),
            expires_at: settle(hostname, LookupSource::CertificateInspection, inspection),
        };

        if ssl_record.expires_at.is_none() && self.config.enable_ct_fallback {
            debug!(domain = %hostname, "no live certificate data, trying CT log");
            let fallback = self.transparency_client.lookup_latest_expiry(hostname).await;
            ssl_record = ExpiryRecord {
                source: ExpirySource::Certificate(CertSource::CertificateTransparency),
                expires_at: settle(hostname, LookupSource::CertificateTransparency, fallback),
            };
        }

        reconcile(hostname, domain_record, ssl_record, Some(start_time.elapsed()))
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Per-source timeout in effect.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

/// Collapse a source outcome to an optional date, logging why it is absent.
fn settle(
    hostname: &Hostname,
    source: LookupSource,
    outcome: SourceOutcome<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match &outcome {
        SourceOutcome::Found(date) => {
            debug!(domain = %hostname, %source, expires = %date, "source answered")
        }
        SourceOutcome::Absent => debug!(domain = %hostname, %source, "source has no record"),
        SourceOutcome::Failed(e) => {
            debug!(domain = %hostname, %source, error = %e, "source failed, treating as absent")
        }
    }
    outcome.into_option()
}

/// Merge the registration and SSL records into a result.
///
/// Fails with `NoPublicData` when neither record has a date.
pub(crate) fn reconcile(
    hostname: &Hostname,
    domain_record: ExpiryRecord,
    ssl_record: ExpiryRecord,
    check_duration: Option<Duration>,
) -> Result<LookupResult, ExpiryCheckError> {
    if domain_record.expires_at.is_none() && ssl_record.expires_at.is_none() {
        return Err(ExpiryCheckError::no_public_data(hostname.as_str()));
    }

    let ssl_source = match (ssl_record.expires_at, ssl_record.source) {
        (Some(_), ExpirySource::Certificate(source)) => Some(source),
        _ => None,
    };

    Ok(LookupResult {
        domain: hostname.clone(),
        domain_expiry: domain_record.expires_at,
        ssl_expiry: ssl_record.expires_at,
        ssl_source,
        check_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(source: ExpirySource, expires_at: Option<DateTime<Utc>>) -> ExpiryRecord {
        ExpiryRecord { source, expires_at }
    }

    #[test]
    fn test_reconcile_requires_some_data() {
        let host = Hostname::parse("example.com").unwrap();
        let result = reconcile(
            &host,
            record(ExpirySource::Registration, None),
            record(
                ExpirySource::Certificate(CertSource::CertificateTransparency),
                None,
            ),
            None,
        );
        assert!(matches!(result, Err(ExpiryCheckError::NoPublicData { .. })));
    }

    #[test]
    fn test_reconcile_keeps_partial_data() {
        let host = Hostname::parse("example.com").unwrap();
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        let result = reconcile(
            &host,
            record(ExpirySource::Registration, Some(date)),
            record(
                ExpirySource::Certificate(CertSource::CertificateInspection),
                None,
            ),
            None,
        )
        .unwrap();
        assert_eq!(result.domain_expiry, Some(date));
        assert_eq!(result.ssl_expiry, None);
        assert_eq!(result.ssl_source, None);

        let result = reconcile(
            &host,
            record(ExpirySource::Registration, None),
            record(
                ExpirySource::Certificate(CertSource::CertificateTransparency),
                Some(date),
            ),
            None,
        )
        .unwrap();
        assert_eq!(result.ssl_source, Some(CertSource::CertificateTransparency));
    }

    #[test]
    fn test_oversized_timeout_builds_clients() {
        let config = CheckConfig {
            timeout: Duration::from_secs(u64::MAX),
            ..CheckConfig::default()
        };
        assert!(ExpiryChecker::with_config(config).is_ok());
    }

    #[tokio::test]
    async fn test_check_domain_rejects_empty_input_before_any_request() {
        // Unroutable endpoints: reaching the network would fail differently.
        let config = CheckConfig::default()
            .with_rdap_url("http://127.0.0.1:9")
            .with_certificate_url("http://127.0.0.1:9")
            .with_transparency_url("http://127.0.0.1:9");
        let checker = ExpiryChecker::with_config(config).unwrap();

        for input in ["", "   ", "https://www./", "http://"] {
            let err = checker.check_domain(input).await.unwrap_err();
            assert!(
                matches!(err, ExpiryCheckError::InvalidDomain { .. }),
                "input {:?} gave {:?}",
                input,
                err
            );
        }
    }
}
