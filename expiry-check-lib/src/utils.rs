//! Utility functions for input normalization and date parsing.
//!
//! These helpers are shared by the protocol clients and by [`Hostname`].

use crate::types::Hostname;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Optional scheme followed by any number of `www.` labels.
    static ref LEADING_NOISE: Regex = Regex::new(r"^(?:https?://)?(?:www\.)*").unwrap();
}

/// Strip scheme, leading `www.` and any path from raw user input.
///
/// Never fails: arbitrary input produces *some* string, possibly empty.
/// The result is lowercase and trimmed, and normalizing it again is a no-op.
///
/// # Example
///
/// ```rust
/// use expiry_check_lib::normalize_domain;
///
/// assert_eq!(normalize_domain("https://www.example.com/login"), "example.com");
/// assert_eq!(normalize_domain("shop.example.com"), "shop.example.com");
/// ```
pub fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = LEADING_NOISE.replace(&lowered, "");
    let host = stripped.split('/').next().unwrap_or_default();

    // Cutting at '/' can expose a fresh "www." prefix (e.g. "https://www./").
    let mut host = host.trim();
    while let Some(rest) = host.strip_prefix("www.") {
        host = rest;
    }
    host.to_string()
}

/// Check that a normalized string is usable as a hostname.
///
/// This is the MalformedInput gate: nothing reaches the network unless it
/// passes.
pub fn validate_hostname(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("Domain name cannot be empty");
    }

    if host.len() > 253 {
        return Err("Domain name is longer than 253 characters");
    }

    if host.starts_with('.') || host.ends_with('.') {
        return Err("Domain name cannot start or end with a dot");
    }

    for label in host.split('.') {
        if label.is_empty() {
            return Err("Domain name contains an empty label");
        }
        if label.len() > 63 {
            return Err("Domain label is longer than 63 characters");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("Domain label cannot start or end with a hyphen");
        }
        if !label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err("Domain name contains invalid characters");
        }
    }

    Ok(())
}

/// Extract the hostname from a full page URL, as a browser tab would report it.
///
/// Only `http` and `https` URLs yield a hostname; other schemes
/// (`chrome://`, `file://`, `about:`) and unparseable input yield `None`.
pub fn hostname_from_url(page_url: &str) -> Option<Hostname> {
    let parsed = url::Url::parse(page_url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    Hostname::parse(host).ok()
}

/// Parse a timestamp as returned by the upstream services.
///
/// Accepts RFC 3339, naive date-times (taken as UTC), bare dates and the
/// OpenSSL `notAfter` form.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%b %e %H:%M:%S %Y GMT",
        "%b %d %H:%M:%S %Y GMT",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}
