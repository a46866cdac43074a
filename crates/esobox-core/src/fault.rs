//! Fault reporting sink.
//!
//! Internal faults are forwarded here after the session has been updated.
//! Reporting is fire-and-forget: implementations must not block the caller
//! and must swallow their own failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An internal fault as delivered to a reporting sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Session the fault happened in
    pub session_id: String,
    /// Language that was active
    pub language: String,
    /// One-line summary
    pub message: String,
    /// Full description, as written to the Debug field
    pub detail: String,
    /// When the fault was observed
    pub occurred_at: DateTime<Utc>,
}

/// Receives internal faults.
pub trait FaultReporter: Send + Sync {
    fn report(&self, fault: &Fault);
}

/// Reporter used in local/offline mode. Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFaultReporter;

impl FaultReporter for NoopFaultReporter {
    fn report(&self, _fault: &Fault) {}
}
