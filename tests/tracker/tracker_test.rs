//! Tests for `tracker::StateTracker`.

use checkup_bot::check::{CheckResult, StatusText};
use checkup_bot::tracker::StateTracker;

fn healthy(title: &str, timestamp: i64) -> CheckResult {
    CheckResult {
        title: title.to_owned(),
        endpoint: format!("https://{title}.example.com"),
        timestamp,
        healthy: true,
        degraded: false,
        down: false,
    }
}

fn down(title: &str, timestamp: i64) -> CheckResult {
    CheckResult {
        healthy: false,
        down: true,
        ..healthy(title, timestamp)
    }
}

fn degraded(title: &str, timestamp: i64) -> CheckResult {
    CheckResult {
        healthy: false,
        degraded: true,
        ..healthy(title, timestamp)
    }
}

#[test]
fn first_sighting_down_alerts() {
    let mut tracker = StateTracker::new();
    assert!(tracker.update(&down("api", 1)));
    let state = tracker.get("api").expect("state should be recorded");
    assert_eq!(state.last_status, StatusText::Down);
}

#[test]
fn first_sighting_healthy_records_without_alert() {
    let mut tracker = StateTracker::new();
    assert!(!tracker.update(&healthy("api", 1)));
    let state = tracker.get("api").expect("state should be recorded");
    assert_eq!(state.last_status, StatusText::Healthy);
    assert_eq!(state.name, "api");
    assert_eq!(state.url, "https://api.example.com");
    assert_eq!(state.last_checked, 1);
}

#[test]
fn repeated_down_alerts_once() {
    let mut tracker = StateTracker::new();
    let alerts: Vec<bool> = [healthy("api", 1), down("api", 2), down("api", 3), down("api", 4)]
        .iter()
        .map(|r| tracker.update(r))
        .collect();
    assert_eq!(alerts, vec![false, true, false, false]);
}

#[test]
fn recovery_rearms_the_alert() {
    let mut tracker = StateTracker::new();
    let alerts: Vec<bool> = [healthy("api", 1), down("api", 2), healthy("api", 3), down("api", 4)]
        .iter()
        .map(|r| tracker.update(r))
        .collect();
    assert_eq!(alerts.iter().filter(|a| **a).count(), 2);
}

#[test]
fn degraded_to_down_does_not_alert() {
    let mut tracker = StateTracker::new();
    assert!(!tracker.update(&degraded("api", 1)));
    assert!(!tracker.update(&down("api", 2)));
}

#[test]
fn state_is_overwritten_not_appended() {
    let mut tracker = StateTracker::new();
    tracker.update(&healthy("api", 1));
    tracker.update(&down("api", 2));
    tracker.update(&healthy("api", 3));
    assert_eq!(tracker.len(), 1);
    let state = tracker.get("api").expect("state should be recorded");
    assert_eq!(state.last_checked, 3);
    assert_eq!(state.last_status, StatusText::Healthy);
}

#[test]
fn endpoints_are_tracked_independently() {
    let mut tracker = StateTracker::new();
    assert!(tracker.is_empty());
    assert!(!tracker.update(&healthy("api", 1)));
    assert!(!tracker.update(&healthy("db", 1)));
    assert!(tracker.update(&down("db", 2)));
    assert!(!tracker.update(&healthy("api", 2)));
    assert!(tracker.update(&down("api", 3)));
    assert_eq!(tracker.len(), 2);

    let mut names: Vec<&str> = tracker.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["api", "db"]);
}
