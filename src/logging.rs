//! Warning sinks for plan construction and enrichment.
//!
//! The policy and the execution plan never reach for a global logger. They
//! receive a [`PlanLog`] and report warnings through it:
//! - `TracingLog`: forwards to `tracing` with a `component` field
//! - `WarningTrail`: records messages in memory, for tests and diagnostics

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A sink accepting warning-level messages.
///
/// Implementations must be shareable across enrichment passes running on
/// different threads.
///
/// Never format credential or key material into a warning. Values wrapped in
/// [`Secret`](crate::Secret) redact themselves if they slip through.
pub trait PlanLog: Send + Sync {
    /// Reports a warning.
    fn warn(&self, args: fmt::Arguments<'_>);
}

/// A [`PlanLog`] backed by `tracing`.
///
/// # Examples
///
/// ```
/// use authn_metadata::{PlanLog, TracingLog};
///
/// let log = TracingLog::new("clearpass");
/// log.warn(format_args!("credentials will be cached without protection"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingLog {
    component: &'static str,
}

impl TracingLog {
    /// Creates a log tagging every event with `component`.
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Returns the component tag.
    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingLog {
    fn default() -> Self {
        Self::new("authn_metadata")
    }
}

impl PlanLog for TracingLog {
    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(component = %self.component, "{}", args);
    }
}

/// In-memory recorder for warnings.
///
/// Messages are stored in the order they were reported.
///
/// # Example
///
/// ```
/// use authn_metadata::{PlanLog, WarningTrail};
///
/// let trail = WarningTrail::new();
/// trail.warn(format_args!("crypto is disabled"));
///
/// assert_eq!(trail.len(), 1);
/// assert_eq!(trail.messages()[0], "crypto is disabled");
/// ```
#[derive(Debug, Default)]
pub struct WarningTrail {
    messages: Mutex<Vec<String>>,
}

impl WarningTrail {
    /// Creates a new empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A panicking writer cannot leave a half-pushed String behind.
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of all recorded messages.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Returns the number of recorded messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|m| m.contains(needle))
    }

    /// Clears all recorded messages.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl PlanLog for WarningTrail {
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.lock().push(args.to_string());
    }
}
