//! Expiry Check CLI Application
//!
//! Shows how many days remain until a domain's registration and its TLS
//! certificate expire. All lookups happen in expiry-check-lib; this binary
//! only gathers input, resolves configuration and renders the outcome.

mod ui;

use chrono::{DateTime, Utc};
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use expiry_check_lib::{
    hostname_from_url, load_env_config, parse_timeout_string, CheckConfig, ConfigManager,
    EnvConfig, ExpiryCheckError, ExpiryChecker, ExpiryStatus, FileConfig, Hostname, LookupResult,
};
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Where to send people when no source has public data.
const MANUAL_LOOKUP_URL: &str = "https://who.is/whois/";

/// CLI arguments for expiry-check
#[derive(Parser, Debug)]
#[command(name = "expiry-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Show days left until a domain's registration and TLS certificate expire")]
#[command(
    long_about = "Show days left until a domain's registration and TLS certificate expire.\n\nRegistration data comes from RDAP; the certificate from a live inspection service with a certificate-transparency log fallback."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain to check (scheme, leading www. and path are stripped)
    #[arg(value_name = "DOMAIN", help_heading = "Input")]
    pub domain: Option<String>,

    /// Take the domain from a page URL instead (http/https only)
    #[arg(long = "url", value_name = "URL", help_heading = "Input")]
    pub url: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Coloured output with a progress spinner
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Per-source timeout, e.g. "10s" or "1m"
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Lookup")]
    pub timeout: Option<String>,

    /// Do not search the CT log when the live certificate is unknown
    #[arg(long = "no-ct-fallback", help_heading = "Lookup")]
    pub no_ct_fallback: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// How results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Plain,
    Pretty,
    Json,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "expiry_check_lib=debug,expiry_check=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    match (&args.domain, &args.url) {
        (None, None) => {
            return Err("You must specify a domain or a page URL with --url".to_string());
        }
        (Some(_), Some(_)) => {
            return Err("Cannot specify both a domain and --url".to_string());
        }
        _ => {}
    }

    if args.json && args.pretty {
        return Err("Cannot specify both --json and --pretty".to_string());
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    Ok(())
}

/// Main lookup logic
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_config = load_env_config(args.verbose);
    let manager = ConfigManager::new(args.verbose);
    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let config = resolve_config(&args, &env_config, &file_config);
    let format = resolve_format(&args, &env_config, &file_config);
    let hostname = resolve_hostname(&args)?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        domain = %hostname,
        timeout = ?config.timeout,
        ct_fallback = config.enable_ct_fallback,
        "starting lookup"
    );

    let checker = ExpiryChecker::with_config(config)?;

    let spinner = (format == OutputFormat::Pretty)
        .then(|| ui::Spinner::start(format!("Checking {}...", hostname)));
    let outcome = checker.check_hostname(&hostname).await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    let now = Utc::now();
    match outcome {
        Ok(result) => {
            match format {
                OutputFormat::Json => println!("{}", format_json(&result, now)?),
                OutputFormat::Pretty => ui::print_result(&result, now),
                OutputFormat::Plain => print!("{}", format_plain(&result, now)),
            }
            Ok(())
        }
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", format_json_error(&hostname, &e)?);
            } else if e.is_no_public_data() {
                eprintln!(
                    "Try a manual lookup: {}{}",
                    MANUAL_LOOKUP_URL,
                    hostname.as_str()
                );
            }
            Err(e.into())
        }
    }
}

/// Defaults < config file < environment < flags.
fn resolve_config(args: &Args, env_config: &EnvConfig, file_config: &FileConfig) -> CheckConfig {
    let mut config = env_config.apply_to(file_config.apply_to(CheckConfig::default()));

    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if args.no_ct_fallback {
        config = config.with_ct_fallback(false);
    }

    config
}

fn resolve_format(args: &Args, env_config: &EnvConfig, file_config: &FileConfig) -> OutputFormat {
    if args.json {
        return OutputFormat::Json;
    }
    if args.pretty {
        return OutputFormat::Pretty;
    }

    let defaults = file_config.defaults.clone().unwrap_or_default();
    if env_config.json.or(defaults.json).unwrap_or(false) {
        OutputFormat::Json
    } else if env_config.pretty.or(defaults.pretty).unwrap_or(false) {
        OutputFormat::Pretty
    } else {
        OutputFormat::Plain
    }
}

fn resolve_hostname(args: &Args) -> Result<Hostname, ExpiryCheckError> {
    match (&args.url, &args.domain) {
        (Some(url), _) => hostname_from_url(url).ok_or_else(|| {
            ExpiryCheckError::invalid_domain(
                url.as_str(),
                "only http and https page URLs are supported",
            )
        }),
        (None, Some(domain)) => Hostname::parse(domain),
        (None, None) => Err(ExpiryCheckError::invalid_domain("", "no domain given")),
    }
}

/// "N days left" text, or the placeholder when unknown.
pub(crate) fn describe_status(status: Option<&ExpiryStatus>, now: DateTime<Utc>) -> String {
    match status {
        Some(status) if status.is_expired(now) => {
            format!("{} (expired)", status.expires_at.format("%Y-%m-%d"))
        }
        Some(status) => format!(
            "{} ({} day{} left)",
            status.expires_at.format("%Y-%m-%d"),
            status.days_remaining,
            if status.days_remaining == 1 { "" } else { "s" }
        ),
        None => "N/A (Not Found)".to_string(),
    }
}

fn format_plain(result: &LookupResult, now: DateTime<Utc>) -> String {
    let domain_status = result.domain_status(now);
    let ssl_status = result.ssl_status(now);

    let mut out = format!("{}  [{}]\n", result.domain, result.severity(now));
    out.push_str(&format!(
        "  Registration expires: {}\n",
        describe_status(domain_status.as_ref(), now)
    ));

    let via = result
        .ssl_source
        .map(|source| format!("  via {}", source))
        .unwrap_or_default();
    out.push_str(&format!(
        "  SSL certificate expires: {}{}\n",
        describe_status(ssl_status.as_ref(), now),
        via
    ));
    out
}

fn format_json(result: &LookupResult, now: DateTime<Utc>) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "domain": result.domain,
        "severity": result.severity(now),
        "domain_expiry": result.domain_status(now),
        "ssl_expiry": result.ssl_status(now),
        "ssl_source": result.ssl_source,
        "checked_at": now,
    });
    serde_json::to_string_pretty(&value)
}

fn format_json_error(
    hostname: &Hostname,
    error: &ExpiryCheckError,
) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "domain": hostname,
        "error": error.to_string(),
    });
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use expiry_check_lib::CertSource;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["expiry-check"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    fn sample_result(now: DateTime<Utc>) -> LookupResult {
        LookupResult {
            domain: Hostname::parse("example.com").unwrap(),
            domain_expiry: Some(now + chrono::Duration::days(90)),
            ssl_expiry: None,
            ssl_source: None,
            check_duration: None,
        }
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&args(&["example.com"])).is_ok());
        assert!(validate_args(&args(&["--url", "https://example.com/"])).is_ok());
        assert!(validate_args(&args(&[])).is_err());
        assert!(validate_args(&args(&["example.com", "--url", "https://x.com"])).is_err());
        assert!(validate_args(&args(&["example.com", "--json", "--pretty"])).is_err());
        assert!(validate_args(&args(&["example.com", "--timeout", "later"])).is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        let env_config = EnvConfig {
            timeout: Some(3),
            rdap_url: Some("http://127.0.0.1:1".to_string()),
            json: Some(true),
            ..Default::default()
        };
        let parsed = args(&["example.com", "--timeout", "20s", "--no-ct-fallback", "--pretty"]);
        let config = resolve_config(&parsed, &env_config, &FileConfig::default());

        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(!config.enable_ct_fallback);
        assert_eq!(config.rdap_url, "http://127.0.0.1:1");
        assert_eq!(
            resolve_format(&parsed, &env_config, &FileConfig::default()),
            OutputFormat::Pretty
        );
        assert_eq!(
            resolve_format(&args(&["example.com"]), &env_config, &FileConfig::default()),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_resolve_hostname_from_url() {
        let host = resolve_hostname(&args(&["--url", "https://www.example.com/a?b"])).unwrap();
        assert_eq!(host.as_str(), "example.com");
        assert!(resolve_hostname(&args(&["--url", "chrome://newtab"])).is_err());
        assert!(resolve_hostname(&args(&["https://www./"])).is_err());
    }

    #[test]
    fn test_format_plain() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let text = format_plain(&sample_result(now), now);
        assert!(text.starts_with("example.com  [safe]"));
        assert!(text.contains("Registration expires: 2025-04-01 (90 days left)"));
        assert!(text.contains("SSL certificate expires: N/A (Not Found)"));
    }

    #[test]
    fn test_describe_status_marks_expired() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let past = ExpiryStatus::new(now - chrono::Duration::days(3), now);
        assert_eq!(describe_status(Some(&past), now), "2024-12-29 (expired)");

        let soon = ExpiryStatus::new(now + chrono::Duration::days(1), now);
        assert_eq!(describe_status(Some(&soon), now), "2025-01-02 (1 day left)");
    }

    #[test]
    fn test_format_json() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut result = sample_result(now);
        result.ssl_expiry = Some(now + chrono::Duration::days(10));
        result.ssl_source = Some(CertSource::CertificateTransparency);

        let json: serde_json::Value =
            serde_json::from_str(&format_json(&result, now).unwrap()).unwrap();
        assert_eq!(json["domain"], "example.com");
        assert_eq!(json["severity"], "safe");
        assert_eq!(json["domain_expiry"]["days_remaining"], 90);
        assert_eq!(json["ssl_expiry"]["severity"], "urgent");
        assert_eq!(json["ssl_source"], "certificate_transparency");
    }
}
