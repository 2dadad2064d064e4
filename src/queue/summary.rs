//! Dashboard read model: pending counts and auto-approval countdowns.

use crate::clock::CivilTime;
use crate::config::QueueConfig;
use crate::queue::store::QueueStore;
use crate::types::{Payload, Priority, RequestId, RequestKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// A pending Normal request still inside its grace interval.
#[derive(Debug, Clone, Serialize)]
pub struct Countdown {
    pub id: RequestId,
    pub kind: RequestKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(skip)]
    pub remaining: Duration,
    /// Whole seconds left, rounded up
    pub remaining_seconds: u64,
    /// Elapsed share of the grace interval, in `[0, 1)`
    pub progress: f64,
    pub payload: Payload,
}

/// Snapshot of one session's queue. Re-capture on every refresh.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSummary {
    pub generated_at: CivilTime,
    pub total_pending: usize,
    pub by_priority: BTreeMap<Priority, usize>,
    pub auto_approve_enabled: bool,
    pub countdowns: Vec<Countdown>,
}

impl QueueSummary {
    /// Capture the summary at the store clock's current time.
    pub fn capture(store: &QueueStore, config: &QueueConfig) -> Self {
        Self::capture_at(store, config, store.clock().now())
    }

    pub fn capture_at(store: &QueueStore, config: &QueueConfig, now: CivilTime) -> Self {
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.into_iter().map(|p| (p, 0)).collect();
        let pending = store.list_pending(None);
        for record in &pending {
            *by_priority.entry(record.priority).or_insert(0) += 1;
        }

        let grace = config.auto_approve_after();
        let countdowns = if config.auto_approve_enabled {
            pending
                .iter()
                .filter(|record| record.priority == Priority::Normal)
                .filter_map(|record| {
                    let remaining = grace.saturating_sub(record.age(now));
                    if remaining.is_zero() {
                        return None;
                    }
                    Some(Countdown {
                        id: record.id.clone(),
                        kind: record.kind,
                        person_name: record.person_name().map(str::to_string),
                        remaining,
                        remaining_seconds: ceil_secs(remaining),
                        progress: progress(grace, remaining),
                        payload: record.payload.clone(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            generated_at: now,
            total_pending: pending.len(),
            by_priority,
            auto_approve_enabled: config.auto_approve_enabled,
            countdowns,
        }
    }

    pub fn pending_for(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}

fn progress(grace: Duration, remaining: Duration) -> f64 {
    if grace.is_zero() {
        return 1.0;
    }
    1.0 - remaining.as_secs_f64() / grace.as_secs_f64()
}
