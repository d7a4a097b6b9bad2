//! Pretty-mode display logic for expiry-check CLI.
//!
//! Handles `--pretty` output: a spinner while the lookup runs, then the
//! result coloured by severity. Uses only the `console` crate.

use chrono::{DateTime, Utc};
use console::{style, StyledObject, Term};
use expiry_check_lib::{ExpiryStatus, LookupResult, Severity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::describe_status;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message (e.g. "Checking example.com...").
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            if !term.is_term() {
                return;
            }
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Result ───────────────────────────────────────────────────────────────────

fn paint<D>(severity: Severity, value: D) -> StyledObject<D> {
    match severity {
        Severity::Safe => style(value).green(),
        Severity::Warning => style(value).yellow(),
        Severity::Urgent => style(value).red().bold(),
    }
}

fn status_line(label: &str, status: Option<&ExpiryStatus>, now: DateTime<Utc>) -> String {
    let text = describe_status(status, now);
    let painted = match status {
        Some(status) => paint(status.severity, text).to_string(),
        None => style(text).dim().to_string(),
    };
    format!("  {:<14} {}", label, painted)
}

/// Print a checked domain with a severity badge and both countdowns.
pub fn print_result(result: &LookupResult, now: DateTime<Utc>) {
    let severity = result.severity(now);
    let badge = paint(severity, format!(" {} ", severity.to_string().to_uppercase())).reverse();

    println!(
        "{} {}",
        style(result.domain.as_str()).bold(),
        badge
    );
    println!(
        "{}",
        status_line("Registration", result.domain_status(now).as_ref(), now)
    );
    println!("{}", status_line("SSL", result.ssl_status(now).as_ref(), now));

    let mut meta_parts: Vec<String> = Vec::new();
    if let Some(source) = result.ssl_source {
        meta_parts.push(format!("SSL via {}", source));
    }
    if let Some(duration) = result.check_duration {
        meta_parts.push(format!("checked in {:.1}s", duration.as_secs_f64()));
    }
    if !meta_parts.is_empty() {
        println!("{}", style(meta_parts.join(" | ")).dim());
    }
}
