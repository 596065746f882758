//! # Slashing Protection Metrics
//!
//! Prometheus metrics for signing decisions.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-19-slashing-protection = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `slashing_protection_signings_allowed_total` - Counter of allowed signings (by message)
//! - `slashing_protection_refusals_total` - Counter of refused signings (by kind)
//! - `slashing_protection_remote_retries_total` - Counter of remote protector retries
//! - `slashing_protection_remote_failures_total` - Counter of failed remote calls (by reason)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Allowed signings, labeled by message ("attestation", "block")
    pub static ref SIGNINGS_ALLOWED: IntCounterVec = register_int_counter_vec!(
        "slashing_protection_signings_allowed_total",
        "Total number of signing requests allowed",
        &["message"]
    )
    .expect("Failed to create SIGNINGS_ALLOWED metric");

    /// Refused signings, labeled by slashing kind
    pub static ref REFUSALS: IntCounterVec = register_int_counter_vec!(
        "slashing_protection_refusals_total",
        "Total number of signing requests refused as slashable",
        &["kind"]
    )
    .expect("Failed to create REFUSALS metric");

    /// Remote protector retries after an unavailable answer
    pub static ref REMOTE_RETRIES: IntCounter = register_int_counter!(
        "slashing_protection_remote_retries_total",
        "Total number of remote protector retries"
    )
    .expect("Failed to create REMOTE_RETRIES metric");

    /// Remote protector calls that failed
    pub static ref REMOTE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "slashing_protection_remote_failures_total",
        "Total number of failed remote protector calls",
        &["reason"]
    )
    .expect("Failed to create REMOTE_FAILURES metric");
}

#[cfg(feature = "metrics")]
pub fn record_signing_allowed(message: &str) {
    SIGNINGS_ALLOWED.with_label_values(&[message]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_refusal(kind: &str) {
    REFUSALS.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_remote_retry() {
    REMOTE_RETRIES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_remote_failure(reason: &str) {
    REMOTE_FAILURES.with_label_values(&[reason]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_signing_allowed(_message: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_refusal(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_remote_retry() {}

#[cfg(not(feature = "metrics"))]
pub fn record_remote_failure(_reason: &str) {}
