//! Scheduler: the periodic sweep piggy-backed on dashboard refreshes.
//!
//! There is no background worker. The dashboard calls [`Scheduler::tick`] on
//! every refresh; the tick throttles itself to `batch_check_interval`, then
//! auto-approves due Normal requests and collects old terminal records.

use crate::clock::{elapsed_between, CivilTime};
use crate::config::QueueConfig;
use crate::queue::store::{ApprovalOutcome, QueueStore};
use crate::types::{Priority, RequestId};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Approver name recorded on auto-approved requests.
pub const AUTO_APPROVER: &str = "System (Auto)";

/// Result of one auto-approval sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Normal requests whose grace interval had elapsed
    pub due: usize,
    pub approved: usize,
    pub failed: usize,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// True when the tick came too soon after the previous one and did nothing
    pub skipped: bool,
    pub approved: usize,
    pub failed: usize,
    pub collected: usize,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    config: QueueConfig,
    last_tick: Option<CivilTime>,
}

impl Scheduler {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            last_tick: None,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn last_tick(&self) -> Option<CivilTime> {
        self.last_tick
    }

    /// Master switch for auto-approval. High and Urgent are unaffected either way.
    pub fn set_auto_approve_enabled(&mut self, enabled: bool) {
        if self.config.auto_approve_enabled != enabled {
            info!(enabled, "Auto-approval switched");
        }
        self.config.auto_approve_enabled = enabled;
    }

    /// Periodic pass. Never fails; failures are recorded on the records.
    pub fn tick(&mut self, store: &mut QueueStore) -> TickReport {
        let now = store.clock().now();
        if let Some(last) = self.last_tick {
            if elapsed_between(last, now) < self.config.batch_check_interval() {
                return TickReport {
                    skipped: true,
                    ..TickReport::default()
                };
            }
        }

        let sweep = self.sweep(store);
        let collected = store.gc(self.config.terminal_retention());
        self.last_tick = Some(now);

        let report = TickReport {
            skipped: false,
            approved: sweep.approved,
            failed: sweep.failed,
            collected,
        };
        if report.approved + report.failed + report.collected > 0 {
            info!(
                approved = report.approved,
                failed = report.failed,
                collected = report.collected,
                pending = store.pending_count(None),
                "Scheduler tick"
            );
        } else {
            debug!(pending = store.pending_count(None), "Scheduler tick: nothing to do");
        }
        report
    }

    /// Approve every due Normal request now; returns how many were approved.
    pub fn auto_approve_batch(&self, store: &mut QueueStore) -> usize {
        self.sweep(store).approved
    }

    /// Auto-approval sweep in submission order.
    pub fn sweep(&self, store: &mut QueueStore) -> SweepReport {
        if !self.config.auto_approve_enabled {
            return SweepReport::default();
        }

        let now = store.clock().now();
        let grace = self.config.auto_approve_after();
        let due: Vec<RequestId> = store
            .list_pending(Some(Priority::Normal))
            .into_iter()
            .filter(|record| record.age(now) >= grace)
            .map(|record| record.id.clone())
            .collect();

        let mut report = SweepReport {
            due: due.len(),
            ..SweepReport::default()
        };
        for id in due {
            match store.approve_detailed(&id, AUTO_APPROVER) {
                outcome if outcome.is_approved() => report.approved += 1,
                ApprovalOutcome::Failed(failure) => {
                    warn!(
                        request_id = %id,
                        error = %failure.message(),
                        "Auto-approval commit failed; continuing sweep"
                    );
                    report.failed += 1;
                }
                _ => {}
            }
        }
        report
    }
}
