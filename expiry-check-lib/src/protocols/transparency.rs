//! Certificate Transparency log fallback.
//!
//! The CT search matches names loosely, so its answer is a superset: every
//! entry is reduced to a [`CertificateCandidate`], filtered through the name
//! matcher, and the latest `not_after` among the survivors wins.

use crate::error::{ExpiryCheckError, LookupSource};
use crate::types::{CertificateCandidate, Hostname, SourceOutcome};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One entry of the CT search JSON array.
#[derive(Debug, Deserialize)]
struct CtLogEntry {
    common_name: Option<String>,
    name_value: Option<String>,
    not_after: Option<String>,
}

impl CtLogEntry {
    /// SAN list (one name per line) when present, else the common name.
    ///
    /// Entries without names or without a parseable `not_after` yield `None`.
    fn into_candidate(self) -> Option<CertificateCandidate> {
        let not_after = self.not_after.as_deref().and_then(parse_timestamp)?;

        let sans: Vec<String> = self
            .name_value
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        let subject_names = if !sans.is_empty() {
            sans
        } else {
            let common_name = self.common_name?;
            let common_name = common_name.trim();
            if common_name.is_empty() {
                return None;
            }
            vec![common_name.to_string()]
        };

        Some(CertificateCandidate {
            subject_names,
            not_after,
        })
    }
}

/// Client for a crt.sh-style CT log search.
#[derive(Clone)]
pub struct TransparencyClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl TransparencyClient {
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
                    "Failed to create CT log HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Latest expiry among logged certificates that really cover `hostname`.
    pub async fn lookup_latest_expiry(
        &self,
        hostname: &Hostname,
    ) -> SourceOutcome<DateTime<Utc>> {
        match tokio::time::timeout(self.timeout, self.fetch_candidates(hostname)).await {
            Ok(Ok(candidates)) => {
                debug!(
                    domain = %hostname,
                    candidates = candidates.len(),
                    "CT log search returned candidates"
                );
                latest_matching_expiry(&candidates, hostname)
                    .map(SourceOutcome::Found)
                    .unwrap_or(SourceOutcome::Absent)
            }
            Ok(Err(e)) => SourceOutcome::Failed(e),
            Err(_) => SourceOutcome::Failed(ExpiryCheckError::timeout(
                "CT log request",
                self.timeout,
            )),
        }
    }

    async fn fetch_candidates(
        &self,
        hostname: &Hostname,
    ) -> Result<Vec<CertificateCandidate>, ExpiryCheckError> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, domain = %hostname, "querying CT log");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", hostname.as_str()), ("output", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpiryCheckError::source_error_with_status(
                LookupSource::CertificateTransparency,
                format!("CT log query failed with status: {}", status),
                status.as_u16(),
            ));
        }

        let text = response.text().await?;
        parse_candidates(&text)
    }
}

/// Parse a CT search response body into candidates.
///
/// Entries that carry no usable name or date are dropped rather than
/// failing the whole response.
fn parse_candidates(body: &str) -> Result<Vec<CertificateCandidate>, ExpiryCheckError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<CtLogEntry> = serde_json::from_str(body).map_err(|e| {
        ExpiryCheckError::parse(format!("Failed to parse CT log response: {}", e))
    })?;

    Ok(entries
        .into_iter()
        .filter_map(CtLogEntry::into_candidate)
        .collect())
}

/// Maximum `not_after` among candidates that apply to `hostname`.
pub fn latest_matching_expiry(
    candidates: &[CertificateCandidate],
    hostname: &Hostname,
) -> Option<DateTime<Utc>> {
    candidates
        .iter()
        .filter(|candidate| candidate.applies_to(hostname))
        .map(|candidate| candidate.not_after)
        .max()
}
