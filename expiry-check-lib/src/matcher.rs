//! Certificate name matching.
//!
//! CT log searches match names loosely, so every returned certificate has to
//! be checked against the hostname we actually asked about.

use crate::types::{CertificateCandidate, Hostname};

/// Does `candidate_name` (a SAN entry or common name) cover `target`?
///
/// Comparison is case-insensitive and ignores surrounding whitespace. A
/// wildcard `*.root` covers exactly one extra leftmost label: `*.example.com`
/// matches `www.example.com` but neither `a.b.example.com`, `example.com`
/// nor `evil-example.com`.
///
/// # Example
///
/// ```rust
/// use expiry_check_lib::certificate_name_matches;
///
/// assert!(certificate_name_matches("*.example.com", "www.example.com"));
/// assert!(!certificate_name_matches("*.example.com", "a.b.example.com"));
/// ```
pub fn certificate_name_matches(candidate_name: &str, target: &str) -> bool {
    let candidate = candidate_name.trim().to_lowercase();
    let target = target.trim().to_lowercase();

    if candidate.is_empty() || target.is_empty() {
        return false;
    }

    if candidate == target {
        return true;
    }

    if let Some(root) = candidate.strip_prefix("*.") {
        if root.is_empty() {
            return false;
        }
        // Stricter than a bare suffix test: `*.example.com` must not cover `a.badexample.com`.
        let Some(prefix) = target.strip_suffix(root) else {
            return false;
        };
        // What the wildcard stands for: one non-empty label plus its dot.
        return match prefix.strip_suffix('.') {
            Some(label) => !label.is_empty() && !label.contains('.'),
            None => false,
        };
    }

    false
}

impl CertificateCandidate {
    /// True when any of the certificate's names covers `target`.
    pub fn applies_to(&self, target: &Hostname) -> bool {
        self.subject_names
            .iter()
            .any(|name| certificate_name_matches(name, target.as_str()))
    }
}
