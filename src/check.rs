//! Check results handed to the notifier by the uptime-check pipeline.
//!
//! The notifier only consumes these values. They mirror the JSON the checker
//! emits, so a batch can be decoded straight from a line of stdin.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse health label derived from a [`CheckResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusText {
    /// Endpoint responded within thresholds.
    Healthy,
    /// Endpoint responded, but slowly or partially.
    Degraded,
    /// Endpoint did not respond or failed its checks.
    Down,
    /// None of the health flags were set.
    Unknown,
}

impl StatusText {
    /// Lowercase label, e.g. `"healthy"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one endpoint once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Human-readable endpoint name; the tracking key.
    pub title: String,
    /// URL or address that was checked.
    pub endpoint: String,
    /// When the check ran (Unix nanoseconds).
    pub timestamp: i64,
    /// Endpoint passed every threshold.
    #[serde(default)]
    pub healthy: bool,
    /// Endpoint answered but breached a latency threshold.
    #[serde(default)]
    pub degraded: bool,
    /// Endpoint failed the check.
    #[serde(default)]
    pub down: bool,
}

impl CheckResult {
    /// Derive the status label. Flags are evaluated healthy, degraded, down.
    pub fn status(&self) -> StatusText {
        if self.healthy {
            StatusText::Healthy
        } else if self.degraded {
            StatusText::Degraded
        } else if self.down {
            StatusText::Down
        } else {
            StatusText::Unknown
        }
    }
}

/// Decode one stdin line: a JSON array of [`CheckResult`].
///
/// Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns the JSON error when the line is not a valid batch.
pub fn parse_batch(line: &str) -> Result<Option<Vec<CheckResult>>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
