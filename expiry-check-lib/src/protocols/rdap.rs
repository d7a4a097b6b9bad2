//! RDAP (Registration Data Access Protocol) registration expiry lookup.
//!
//! Queries `<base>/domain/<hostname>` and pulls the expiration event out of
//! the standard `events` array.

use crate::error::{ExpiryCheckError, LookupSource};
use crate::types::{Hostname, SourceOutcome};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Event actions that carry the registration expiry date.
const EXPIRATION_ACTIONS: &[&str] = &["expiration", "registration expiration"];

/// RDAP client for registration expiry lookups.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// Service base URL, without trailing slash
    base_url: String,
    /// Timeout for the whole lookup
    timeout: Duration,
}

impl RdapClient {
    /// Create a new RDAP client against `base_url`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ExpiryCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout.saturating_add(Duration::from_secs(2))) // Add buffer for HTTP timeout
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ExpiryCheckError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Look up when the domain's registration expires.
    ///
    /// Never returns an error: transport failures, non-success statuses and
    /// malformed bodies come back as [`SourceOutcome::Failed`], a response
    /// without an expiration event as [`SourceOutcome::Absent`].
    pub async fn lookup_expiration(&self, hostname: &Hostname) -> SourceOutcome<DateTime<Utc>> {
        let rdap_url = format!("{}/domain/{}", self.base_url, hostname);
        debug!(url = %rdap_url, "requesting RDAP record");

        match tokio::time::timeout(self.timeout, self.fetch_expiration(&rdap_url)).await {
            Ok(result) => result.into(),
            Err(_) => SourceOutcome::Failed(ExpiryCheckError::timeout(
                "RDAP request",
                self.timeout,
            )),
        }
    }

    async fn fetch_expiration(
        &self,
        rdap_url: &str,
    ) -> Result<Option<DateTime<Utc>>, ExpiryCheckError> {
        let response = self.http_client.get(rdap_url).send().await.map_err(|e| {
            ExpiryCheckError::source_error(
                LookupSource::Registration,
                format!("Request failed: {}", e),
            )
        })?;

        let status = response.status();
        debug!(url = %rdap_url, %status, "RDAP response");

        if !status.is_success() {
            return Err(ExpiryCheckError::source_error_with_status(
                LookupSource::Registration,
                format!("RDAP server returned {}", status),
                status.as_u16(),
            ));
        }

        let json = response.json::<serde_json::Value>().await.map_err(|e| {
            ExpiryCheckError::parse(format!("Failed to parse RDAP JSON: {}", e))
        })?;
        Ok(extract_expiration_date(&json))
    }
}

/// Find the registration expiry in an RDAP domain response.
///
/// Takes the first `expiration` (or `registration expiration`) event. Returns
/// `None` when `events` is missing or has no such event, or when that
/// event's date does not parse.
pub fn extract_expiration_date(json: &serde_json::Value) -> Option<DateTime<Utc>> {
    let events = json.get("events").and_then(|e| e.as_array())?;

    events
        .iter()
        .find(|event| {
            event
                .get("eventAction")
                .and_then(|a| a.as_str())
                .is_some_and(|action| EXPIRATION_ACTIONS.contains(&action))
        })
        .and_then(|event| event.get("eventDate"))
        .and_then(|d| d.as_str())
        .and_then(parse_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rdap_client_creation() {
        let client = RdapClient::new("https://rdap.org/", Duration::from_secs(3), "test");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://rdap.org");
    }

    #[test]
    fn test_extract_expiration_date() {
        let json = serde_json::json!({
            "events": [
                {
                    "eventAction": "registration",
                    "eventDate": "1995-08-14T04:00:00Z"
                },
                {
                    "eventAction": "expiration",
                    "eventDate": "2030-01-01T00:00:00Z"
                }
            ]
        });

        assert_eq!(
            extract_expiration_date(&json),
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_registration_expiration_action() {
        let json = serde_json::json!({
            "events": [
                {
                    "eventAction": "registration expiration",
                    "eventDate": "2027-03-04T05:06:07Z"
                }
            ]
        });

        assert_eq!(
            extract_expiration_date(&json),
            Some(Utc.with_ymd_and_hms(2027, 3, 4, 5, 6, 7).unwrap())
        );
    }

    #[test]
    fn test_extract_expiration_missing() {
        assert_eq!(extract_expiration_date(&serde_json::json!({})), None);
        assert_eq!(
            extract_expiration_date(&serde_json::json!({ "events": [] })),
            None
        );
        assert_eq!(
            extract_expiration_date(&serde_json::json!({
                "events": [{ "eventAction": "last changed", "eventDate": "2024-01-01T00:00:00Z" }]
            })),
            None
        );
        assert_eq!(
            extract_expiration_date(&serde_json::json!({ "events": "expiration" })),
            None
        );
    }

    #[test]
    fn test_extract_uses_first_expiration_event_only() {
        let json = serde_json::json!({
            "events": [
                { "eventAction": "expiration", "eventDate": "not a date" },
                { "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }
            ]
        });
        assert_eq!(extract_expiration_date(&json), None);
    }
}
