// expiry-check-lib/tests/integration.rs

//! End-to-end checks of the orchestrator against mocked upstream services.

use chrono::{TimeZone, Utc};
use expiry_check_lib::{
    CertSource, CheckConfig, ExpiryCheckError, ExpiryChecker, NO_PUBLIC_DATA_MESSAGE,
};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

/// Point all three sources at one mock server.
fn checker_for(server: &MockServer) -> ExpiryChecker {
    checker_with(server, CheckConfig::default())
}

fn checker_with(server: &MockServer, config: CheckConfig) -> ExpiryChecker {
    let config = config
        .with_rdap_url(server.base_url())
        .with_certificate_url(server.base_url())
        .with_transparency_url(server.base_url());
    ExpiryChecker::with_config(config).unwrap()
}

#[tokio::test]
async fn test_both_primary_sources_answer_without_fallback() {
    let server = MockServer::start_async().await;

    let rdap = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.com");
            then.status(200).json_body(json!({
                "objectClassName": "domain",
                "ldhName": "EXAMPLE.COM",
                "events": [
                    { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" },
                    { "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }
                ]
            }));
        })
        .await;

    let inspection = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/security/certificate/example.com");
            then.status(200).json_body(json!({
                "status": "OK",
                "certificate": { "valid_to": "2025-06-01T00:00:00Z" }
            }));
        })
        .await;

    let ct = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("output", "json");
            then.status(200).json_body(json!([]));
        })
        .await;

    let result = checker_for(&server)
        .check_domain("example.com")
        .await
        .unwrap();

    assert_eq!(
        result.domain_expiry,
        Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        result.ssl_expiry,
        Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(result.ssl_source, Some(CertSource::CertificateInspection));

    rdap.assert_async().await;
    inspection.assert_async().await;
    ct.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_non_matching_ct_record_yields_no_public_data() {
    let server = MockServer::start_async().await;

    let rdap = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/a.shop.example.com");
            then.status(404);
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/security/certificate/a.shop.example.com");
            then.status(200).json_body(json!({ "status": "NO_CERTIFICATE" }));
        })
        .await;

    let ct = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .query_param("q", "a.shop.example.com")
                .query_param("output", "json");
            then.status(200).json_body(json!([
                {
                    "common_name": "example.com",
                    "name_value": "*.example.com\nexample.com",
                    "not_after": "2026-01-01T00:00:00"
                }
            ]));
        })
        .await;

    let err = checker_for(&server)
        .check_domain("a.shop.example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, ExpiryCheckError::NoPublicData { .. }));
    assert_eq!(err.to_string(), NO_PUBLIC_DATA_MESSAGE);
    rdap.assert_async().await;
    ct.assert_async().await;
}

#[tokio::test]
async fn test_matching_ct_record_supplies_ssl_expiry() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/api.example.com");
            then.status(404);
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/security/certificate/api.example.com");
            then.status(200).json_body(json!({}));
        })
        .await;

    let ct = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .query_param("q", "api.example.com")
                .query_param("output", "json");
            then.status(200).json_body(json!([
                {
                    "common_name": "*.example.com",
                    "name_value": "*.example.com\nexample.com",
                    "not_after": "2026-01-01T00:00:00"
                },
                {
                    "common_name": "api.example.com",
                    "name_value": "api.example.com",
                    "not_after": "2025-04-01T12:00:00"
                },
                {
                    "common_name": "v2.api.example.com",
                    "name_value": "v2.api.example.com",
                    "not_after": "2027-01-01T00:00:00"
                }
            ]));
        })
        .await;

    let result = checker_for(&server)
        .check_domain("api.example.com")
        .await
        .unwrap();

    assert_eq!(result.domain_expiry, None);
    assert_eq!(
        result.ssl_expiry,
        Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(result.ssl_source, Some(CertSource::CertificateTransparency));
    ct.assert_async().await;
}

#[tokio::test]
async fn test_every_source_failing_is_no_public_data() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.com");
            then.status(503);
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/security/certificate/example.com");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let ct = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("q", "example.com");
            then.status(502);
        })
        .await;

    let err = checker_for(&server)
        .check_domain("example.com")
        .await
        .unwrap_err();

    assert!(err.is_no_public_data());
    ct.assert_async().await;
}

#[tokio::test]
async fn test_registration_alone_is_enough() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.org");
            then.status(200).json_body(json!({
                "events": [
                    { "eventAction": "registration expiration", "eventDate": "2029-05-05T00:00:00Z" }
                ]
            }));
        })
        .await;

    // Inspection and CT log both unmatched: httpmock answers 404.
    let result = checker_for(&server)
        .check_domain("example.org")
        .await
        .unwrap();

    assert_eq!(
        result.domain_expiry,
        Some(Utc.with_ymd_and_hms(2029, 5, 5, 0, 0, 0).unwrap())
    );
    assert_eq!(result.ssl_expiry, None);
    assert_eq!(result.ssl_source, None);
}

#[tokio::test]
async fn test_fallback_toggle_off_skips_ct_log() {
    let server = MockServer::start_async().await;

    let ct = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("q", "example.com");
            then.status(200).json_body(json!([
                { "name_value": "example.com", "not_after": "2026-01-01T00:00:00" }
            ]));
        })
        .await;

    let checker = checker_with(&server, CheckConfig::default().with_ct_fallback(false));
    let err = checker.check_domain("example.com").await.unwrap_err();

    assert!(err.is_no_public_data());
    ct.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_input_is_normalized_before_querying() {
    let server = MockServer::start_async().await;

    let rdap = server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.com");
            then.status(200).json_body(json!({
                "events": [{ "eventAction": "expiration", "eventDate": "2031-01-01T00:00:00Z" }]
            }));
        })
        .await;

    let result = checker_for(&server)
        .check_domain("HTTPS://www.Example.com/some/page")
        .await
        .unwrap();

    assert_eq!(result.domain.as_str(), "example.com");
    rdap.assert_async().await;
}

#[tokio::test]
async fn test_slow_source_times_out_without_starving_the_other() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.net");
            then.status(200)
                .delay(Duration::from_secs(4))
                .json_body(json!({
                    "events": [{ "eventAction": "expiration", "eventDate": "2031-01-01T00:00:00Z" }]
                }));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/security/certificate/example.net");
            then.status(200).json_body(json!({
                "certificate": { "valid_to": "2025-12-24T00:00:00Z" }
            }));
        })
        .await;

    let checker = checker_with(
        &server,
        CheckConfig::default().with_timeout(Duration::from_secs(1)),
    );
    let result = checker.check_domain("example.net").await.unwrap();

    assert_eq!(result.domain_expiry, None);
    assert_eq!(
        result.ssl_expiry,
        Some(Utc.with_ymd_and_hms(2025, 12, 24, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_registration_accepts_any_success_status() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/domain/example.com");
            then.status(203).json_body(json!({
                "events": [{ "eventAction": "expiration", "eventDate": "2032-02-02T00:00:00Z" }]
            }));
        })
        .await;

    let result = checker_for(&server)
        .check_domain("example.com")
        .await
        .unwrap();

    assert_eq!(
        result.domain_expiry,
        Some(Utc.with_ymd_and_hms(2032, 2, 2, 0, 0, 0).unwrap())
    );
}
