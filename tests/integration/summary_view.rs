//! Dashboard summary read model.

use crate::integration::test_utils::{fixture, payload};
use gatehouse::clock::Clock;
use gatehouse::config::QueueConfig;
use gatehouse::queue::QueueSummary;
use gatehouse::types::{Priority, RequestKind};

#[test]
fn summary_counts_every_priority_and_lists_countdowns() {
    let (clock, mut store) = fixture();
    let config = QueueConfig::default();
    let first = store.submit(RequestKind::NormalEntry, Priority::Normal, payload("Ana"), None);
    clock.advance_secs(20);
    let second = store.submit(RequestKind::NormalExit, Priority::Normal, payload("Bia"), None);
    store.submit(RequestKind::BlockListOverride, Priority::Urgent, payload("Caio"), None);
    clock.advance_secs(5);

    let summary = QueueSummary::capture(&store, &config);
    assert_eq!(summary.total_pending, 3);
    assert_eq!(summary.pending_for(Priority::Normal), 2);
    assert_eq!(summary.pending_for(Priority::High), 0);
    assert_eq!(summary.pending_for(Priority::Urgent), 1);
    assert_eq!(summary.by_priority.len(), 3);

    assert_eq!(summary.countdowns.len(), 2);
    assert_eq!(summary.countdowns[0].id, first);
    assert_eq!(summary.countdowns[0].remaining_seconds, 35);
    assert_eq!(summary.countdowns[0].person_name.as_deref(), Some("Ana"));
    assert_eq!(summary.countdowns[1].id, second);
    assert_eq!(summary.countdowns[1].remaining_seconds, 55);
    assert_eq!(summary.countdowns[1].kind, RequestKind::NormalExit);
}

#[test]
fn countdowns_stay_within_the_grace_interval() {
    let (clock, mut store) = fixture();
    let config = QueueConfig::default();
    for i in 0..8 {
        store.submit(
            RequestKind::NormalEntry,
            Priority::Normal,
            payload(&format!("P{i}")),
            None,
        );
        clock.advance_secs(7);
    }
    for _ in 0..10 {
        let summary = QueueSummary::capture(&store, &config);
        for c in &summary.countdowns {
            assert!(c.remaining_seconds <= config.auto_approve_seconds);
            assert!(c.progress >= 0.0 && c.progress < 1.0);
        }
        clock.advance_secs(9);
    }
}

#[test]
fn overdue_requests_have_no_countdown_but_stay_pending() {
    let (clock, mut store) = fixture();
    let config = QueueConfig::default();
    store.submit(RequestKind::NormalEntry, Priority::Normal, payload("Late"), None);
    clock.advance_secs(75);
    let summary = QueueSummary::capture_at(&store, &config, clock.now());
    assert_eq!(summary.total_pending, 1);
    assert!(summary.countdowns.is_empty());
}

#[test]
fn summary_serializes_for_dashboards() {
    let (clock, mut store) = fixture();
    store.submit(RequestKind::MaterialRemoval, Priority::Normal, payload("Ana"), None);
    clock.advance_secs(10);
    let summary = QueueSummary::capture(&store, &QueueConfig::default());
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total_pending"], 1);
    assert_eq!(json["by_priority"]["normal"], 1);
    assert_eq!(json["countdowns"][0]["remaining_seconds"], 50);
    assert_eq!(json["countdowns"][0]["payload"]["person_name"], "Ana");
}
