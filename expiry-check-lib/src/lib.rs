//! # Expiry Check Library
//!
//! Finds out how many days remain until a domain's registration and its
//! current TLS certificate expire.
//!
//! Registration data comes from RDAP. The live certificate comes from a
//! certificate inspection service, with a certificate-transparency log
//! search as fallback. Each source degrades to "absent" on failure; only
//! when nothing at all is known does a check fail.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use expiry_check_lib::ExpiryChecker;
//! use chrono::Utc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = ExpiryChecker::new()?;
//!     let result = checker.check_domain("https://www.example.com/").await?;
//!
//!     if let Some(status) = result.domain_status(Utc::now()) {
//!         println!("{}: {} days ({})", result.domain, status.days_remaining, status.severity);
//!     }
//!     Ok(())
//! }
//! ```

pub use checker::ExpiryChecker;
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EndpointsConfig,
    EnvConfig, FileConfig,
};
pub use error::{ExpiryCheckError, LookupSource, NO_PUBLIC_DATA_MESSAGE};
pub use matcher::certificate_name_matches;
pub use protocols::{extract_expiration_date, latest_matching_expiry};
pub use protocols::{CertificateClient, RdapClient, TransparencyClient};
pub use severity::{days_remaining, ExpiryStatus, Severity};
pub use types::{
    CertSource, CertificateCandidate, CheckConfig, ExpiryRecord, ExpirySource, Hostname,
    LookupResult, SourceOutcome, DEFAULT_CERTIFICATE_URL, DEFAULT_RDAP_URL,
    DEFAULT_TRANSPARENCY_URL, MAX_TIMEOUT,
};
pub use utils::{hostname_from_url, normalize_domain, parse_timestamp};

// Internal modules - these are not part of the public API
mod checker;
mod config;
mod error;
mod matcher;
mod protocols;
mod severity;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ExpiryCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
