//! Configuration file parsing and management.
//!
//! Settings come from TOML files and `EC_*` environment variables. Files are
//! merged field by field with local files overriding global ones; the CLI
//! layers environment variables and flags on top.

use crate::error::ExpiryCheckError;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Upstream service base URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Per-source timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Query the CT log when the live certificate is unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct_fallback: Option<bool>,

    /// JSON output by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    /// Coloured output by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Base URLs of the three upstream services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
}

impl FileConfig {
    /// Overlay the file settings onto a check configuration.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(enabled) = defaults.ct_fallback {
                config = config.with_ct_fallback(enabled);
            }
        }
        if let Some(endpoints) = &self.endpoints {
            if let Some(url) = &endpoints.rdap {
                config = config.with_rdap_url(url.clone());
            }
            if let Some(url) = &endpoints.certificate {
                config = config.with_certificate_url(url.clone());
            }
            if let Some(url) = &endpoints.transparency {
                config = config.with_transparency_url(url.clone());
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ExpiryCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExpiryCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ExpiryCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ExpiryCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config < home directory config < current directory config.
    pub fn discover_and_load(&self) -> Result<FileConfig, ExpiryCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    if self.verbose {
                        eprintln!("⚠️  Skipping {}: {}", path.display(), e);
                    }
                }
            }
        }

        if self.verbose {
            for path in &loaded_files {
                eprintln!("🔧 Loaded config from {}", path.display());
            }
        }

        Ok(merged_config)
    }

    /// Look for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./expiry-check.toml", "./.expiry-check.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".expiry-check.toml", "expiry-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("expiry-check").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    ct_fallback: higher_defaults.ct_fallback.or(lower_defaults.ct_fallback),
                    json: higher_defaults.json.or(lower_defaults.json),
                    pretty: higher_defaults.pretty.or(lower_defaults.pretty),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            endpoints: match (lower.endpoints, higher.endpoints) {
                (Some(lower_endpoints), Some(higher_endpoints)) => Some(EndpointsConfig {
                    rdap: higher_endpoints.rdap.or(lower_endpoints.rdap),
                    certificate: higher_endpoints.certificate.or(lower_endpoints.certificate),
                    transparency: higher_endpoints
                        .transparency
                        .or(lower_endpoints.transparency),
                }),
                (lower_endpoints, higher_endpoints) => higher_endpoints.or(lower_endpoints),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ExpiryCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ExpiryCheckError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(endpoints) = &config.endpoints {
            let named = [
                ("rdap", &endpoints.rdap),
                ("certificate", &endpoints.certificate),
                ("transparency", &endpoints.transparency),
            ];
            for (name, value) in named {
                if let Some(value) = value {
                    validate_endpoint_url(value).map_err(|reason| {
                        ExpiryCheckError::config(format!(
                            "Invalid {} endpoint '{}': {}",
                            name, value, reason
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via EC_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub timeout: Option<u64>,
    pub ct_fallback: Option<bool>,
    pub json: Option<bool>,
    pub pretty: Option<bool>,
    pub rdap_url: Option<String>,
    pub certificate_url: Option<String>,
    pub transparency_url: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the environment settings onto a check configuration.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(enabled) = self.ct_fallback {
            config = config.with_ct_fallback(enabled);
        }
        if let Some(url) = &self.rdap_url {
            config = config.with_rdap_url(url.clone());
        }
        if let Some(url) = &self.certificate_url {
            config = config.with_certificate_url(url.clone());
        }
        if let Some(url) = &self.transparency_url {
            config = config.with_transparency_url(url.clone());
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Invalid values are ignored, with a warning when `verbose` is set.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

fn load_env_config_from<F>(verbose: bool, lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("EC_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) => env_config.timeout = Some(secs),
            None => warn_invalid(verbose, "EC_TIMEOUT", &val, "use a value like 5s or 2m"),
        }
    }

    let flags: [(&str, &mut Option<bool>); 3] = [
        ("EC_CT_FALLBACK", &mut env_config.ct_fallback),
        ("EC_JSON", &mut env_config.json),
        ("EC_PRETTY", &mut env_config.pretty),
    ];
    for (key, slot) in flags {
        if let Some(val) = lookup(key) {
            match parse_bool(&val) {
                Some(flag) => *slot = Some(flag),
                None => warn_invalid(verbose, key, &val, "use true/false"),
            }
        }
    }

    let urls: [(&str, &mut Option<String>); 3] = [
        ("EC_RDAP_URL", &mut env_config.rdap_url),
        ("EC_CERT_URL", &mut env_config.certificate_url),
        ("EC_CT_URL", &mut env_config.transparency_url),
    ];
    for (key, slot) in urls {
        if let Some(val) = lookup(key) {
            match validate_endpoint_url(&val) {
                Ok(()) => *slot = Some(val.trim().to_string()),
                Err(reason) => warn_invalid(verbose, key, &val, reason),
            }
        }
    }

    if let Some(path) = lookup("EC_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

fn warn_invalid(verbose: bool, key: &str, value: &str, hint: &str) {
    if verbose {
        eprintln!("⚠️ Invalid {}='{}', {}", key, value, hint);
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Endpoints must be absolute http(s) URLs.
fn validate_endpoint_url(value: &str) -> Result<(), &'static str> {
    let parsed = url::Url::parse(value.trim()).map_err(|_| "not a valid URL")?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("only http and https endpoints are supported");
    }
    if parsed.host_str().is_none() {
        return Err("URL has no host");
    }
    Ok(())
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}
