//! Clients for the upstream data sources.
//!
//! Each client absorbs its own failures and reports a
//! [`SourceOutcome`](crate::SourceOutcome).

/// Registration expiry via RDAP
pub mod rdap;

/// Live certificate expiry via an inspection service
pub mod certificate;

/// Certificate-transparency log fallback
pub mod transparency;

pub use certificate::CertificateClient;
pub use rdap::{extract_expiration_date, RdapClient};
pub use transparency::{latest_matching_expiry, TransparencyClient};
