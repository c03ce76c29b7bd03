//! Last-known status per monitored endpoint.
//!
//! Alerts are edge-triggered: only a transition into `down` from `healthy`
//! (or a first sighting that is already down) asks for an alert. An endpoint
//! that stays down across many check cycles is reported once.

use std::collections::HashMap;

use crate::check::{CheckResult, StatusText};

/// Recorded state of one endpoint after its most recent check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointState {
    /// Endpoint title.
    pub name: String,
    /// Endpoint URL.
    pub url: String,
    /// Timestamp of the most recent check.
    pub last_checked: i64,
    /// Status reported by the most recent check.
    pub last_status: StatusText,
}

impl EndpointState {
    fn from_result(result: &CheckResult) -> Self {
        Self {
            name: result.title.clone(),
            url: result.endpoint.clone(),
            last_checked: result.timestamp,
            last_status: result.status(),
        }
    }
}

/// Keyed by endpoint title; at most one entry per title.
#[derive(Debug, Default)]
pub struct StateTracker {
    states: HashMap<String, EndpointState>,
}

impl StateTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `result` and report whether it is a new down-transition.
    ///
    /// The state is overwritten whatever the outcome, so the next call sees
    /// this result as its prior.
    pub fn update(&mut self, result: &CheckResult) -> bool {
        let should_alert = match self.states.get(&result.title) {
            None => result.down,
            Some(prior) => result.down && prior.last_status == StatusText::Healthy,
        };

        self.states
            .insert(result.title.clone(), EndpointState::from_result(result));

        should_alert
    }

    /// State recorded for `title`, if any.
    pub fn get(&self, title: &str) -> Option<&EndpointState> {
        self.states.get(title)
    }

    /// Number of tracked endpoints.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no endpoint has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over all tracked endpoints in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointState> {
        self.states.values()
    }
}
