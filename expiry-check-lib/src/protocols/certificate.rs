//! Live certificate expiry via a certificate inspection service.
//!
//! This is the first of two SSL strategies, so every problem here is
//! swallowed into an absent result and left for the CT log fallback.

use crate::error::{ExpiryCheckError, LookupSource};
use crate::types::{Hostname, SourceOutcome};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Response from `<base>/api/security/certificate/<host>`
#[derive(Debug, Deserialize)]
struct InspectionResponse {
    certificate: Option<InspectedCertificate>,
}

#[derive(Debug, Deserialize)]
struct InspectedCertificate {
    valid_to: Option<String>,
}

/// Client for the certificate inspection service.
#[derive(Clone)]
pub struct CertificateClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CertificateClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ExpiryCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout.saturating_add(Duration::from_secs(2)))
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ExpiryCheckError::network_with_source(
                    "Failed to create certificate HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Look up the `valid_to` date of the certificate the host currently serves.
    pub async fn lookup_valid_to(&self, hostname: &Hostname) -> SourceOutcome<DateTime<Utc>> {
        let url = format!("{}/api/security/certificate/{}", self.base_url, hostname);
        debug!(url = %url, "requesting live certificate");

        match tokio::time::timeout(self.timeout, self.fetch_valid_to(&url)).await {
            Ok(result) => result.into(),
            Err(_) => SourceOutcome::Failed(ExpiryCheckError::timeout(
                "certificate inspection request",
                self.timeout,
            )),
        }
    }

    async fn fetch_valid_to(&self, url: &str) -> Result<Option<DateTime<Utc>>, ExpiryCheckError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpiryCheckError::source_error_with_status(
                LookupSource::CertificateInspection,
                format!("Inspection service returned {}", status),
                status.as_u16(),
            ));
        }

        let body = response.text().await?;
        extract_valid_to(&body)
    }
}

/// Pull `certificate.valid_to` out of an inspection response body.
///
/// A body without the field is `Ok(None)`; an unparseable body or date is
/// an error.
fn extract_valid_to(body: &str) -> Result<Option<DateTime<Utc>>, ExpiryCheckError> {
    let parsed: InspectionResponse = serde_json::from_str(body)?;

    let Some(valid_to) = parsed.certificate.and_then(|c| c.valid_to) else {
        return Ok(None);
    };

    parse_timestamp(&valid_to).map(Some).ok_or_else(|| {
        ExpiryCheckError::ParseError {
            message: "Unrecognized certificate valid_to date".to_string(),
            content: Some(valid_to),
        }
    })
}
