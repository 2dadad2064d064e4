//! Queue store: the session's ordered collection of request records.

use crate::clock::{elapsed_between, Clock};
use crate::error::GatehouseError;
use crate::queue::commit::{CommitExecutor, CommitFailure, CommitOutcome, RetryPolicy};
use crate::queue::record::{CommitCallback, RequestRecord};
use crate::types::{Payload, Priority, RequestId, RequestKind, RequestStatus, Requester};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What happened to an approval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Unknown id or already terminal; nothing changed.
    NotPending,
    /// Approved and no callback was attached.
    Approved,
    /// Approved and the callback committed.
    Committed { attempts: u32 },
    /// Callback exhausted its attempts; record is now in error.
    Failed(CommitFailure),
}

impl ApprovalOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            ApprovalOutcome::Approved | ApprovalOutcome::Committed { .. }
        )
    }
}

/// Pending and terminal request records of one operator session.
///
/// Records are kept in submission order; lookups by id are O(1).
#[derive(Debug)]
pub struct QueueStore {
    records: HashMap<RequestId, RequestRecord>,
    order: Vec<RequestId>,
    requester: Requester,
    clock: Arc<dyn Clock>,
    executor: CommitExecutor,
    next_seq: u64,
}

impl QueueStore {
    pub fn new(requester: Requester, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        let executor = CommitExecutor::new(retry, Arc::clone(&clock));
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            requester,
            clock,
            executor,
            next_seq: 1,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.executor.policy()
    }

    /// Append a new pending record and return its id.
    pub fn submit(
        &mut self,
        kind: RequestKind,
        priority: Priority,
        payload: Payload,
        callback: Option<CommitCallback>,
    ) -> RequestId {
        let created_at = self.clock.now();
        let id = self.next_id(created_at);
        let record = RequestRecord::new(
            id.clone(),
            kind,
            priority,
            payload,
            self.requester.clone(),
            created_at,
            callback,
        );
        self.records.insert(id.clone(), record);
        self.order.push(id.clone());

        info!(
            request_id = %id,
            kind = %kind,
            priority = %priority,
            requested_by = %self.requester.name,
            queue_size = self.order.len(),
            "Submitted request"
        );
        id
    }

    /// Submit with a plain closure as the commit callback.
    pub fn submit_with<F>(
        &mut self,
        kind: RequestKind,
        priority: Priority,
        payload: Payload,
        callback: F,
    ) -> RequestId
    where
        F: FnMut(&Payload) -> anyhow::Result<bool> + Send + 'static,
    {
        self.submit(kind, priority, payload, Some(Box::new(callback)))
    }

    /// Submit from textual kind and priority, as they arrive from a form.
    pub fn submit_raw(
        &mut self,
        kind: &str,
        priority: &str,
        payload: Payload,
        callback: Option<CommitCallback>,
    ) -> Result<RequestId, GatehouseError> {
        let kind: RequestKind = kind.parse()?;
        let priority: Priority = priority.parse()?;
        Ok(self.submit(kind, priority, payload, callback))
    }

    /// Pending records, optionally of one priority, in submission order.
    pub fn list_pending(&self, priority: Option<Priority>) -> Vec<&RequestRecord> {
        self.records()
            .filter(|r| r.is_pending())
            .filter(|r| priority.map_or(true, |p| r.priority == p))
            .collect()
    }

    pub fn pending_count(&self, priority: Option<Priority>) -> usize {
        self.records()
            .filter(|r| r.is_pending())
            .filter(|r| priority.map_or(true, |p| r.priority == p))
            .count()
    }

    pub fn find(&self, id: &RequestId) -> Option<&RequestRecord> {
        self.records.get(id)
    }

    /// All records, pending and terminal, in submission order.
    pub fn records(&self) -> impl Iterator<Item = &RequestRecord> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Approve a pending record and run its commit callback.
    ///
    /// Returns `true` when the record ends up approved.
    pub fn approve(&mut self, id: &RequestId, approver: &str) -> bool {
        self.approve_detailed(id, approver).is_approved()
    }

    /// Approve and report exactly how the commit went.
    ///
    /// The record is marked approved before the callback runs, so a second
    /// approval of the same id always observes a terminal status.
    pub fn approve_detailed(&mut self, id: &RequestId, approver: &str) -> ApprovalOutcome {
        let approved_at = self.clock.now();
        let Some(record) = self.records.get_mut(id) else {
            debug!(request_id = %id, "Approval ignored: unknown request");
            return ApprovalOutcome::NotPending;
        };
        if !record.mark_approved(approver, approved_at) {
            debug!(request_id = %id, status = %record.status, "Approval ignored: not pending");
            return ApprovalOutcome::NotPending;
        }

        // The callback is dropped after its run, releasing whatever it captured.
        let Some(mut callback) = record.callback.take() else {
            info!(request_id = %id, approved_by = %approver, "Approved request without commit");
            return ApprovalOutcome::Approved;
        };

        match self.executor.run(&record.id, &mut callback, &record.payload) {
            CommitOutcome::Committed { attempts } => {
                info!(
                    request_id = %id,
                    approved_by = %approver,
                    attempts,
                    "Approved and committed request"
                );
                ApprovalOutcome::Committed { attempts }
            }
            CommitOutcome::Failed(failure) => {
                let message = failure.message();
                record.mark_error(&message, self.clock.now());
                warn!(
                    request_id = %id,
                    approved_by = %approver,
                    attempts = failure.attempts(),
                    error = %message,
                    "Commit failed, request moved to error"
                );
                ApprovalOutcome::Failed(failure)
            }
        }
    }

    /// Reject a pending record. Never runs the callback.
    pub fn reject(&mut self, id: &RequestId, reason: &str) -> bool {
        let rejected_at = self.clock.now();
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if !record.mark_rejected(reason, rejected_at) {
            debug!(request_id = %id, status = %record.status, "Rejection ignored: not pending");
            return false;
        }
        record.callback = None;
        info!(request_id = %id, reason = %reason, "Rejected request");
        true
    }

    /// Drop terminal records that reached their terminal state more than `max_age` ago.
    ///
    /// Pending records are never collected.
    pub fn gc(&mut self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, record| match record.terminal_at() {
            Some(at) => elapsed_between(at, now) <= max_age,
            None => true,
        });
        let records = &self.records;
        self.order.retain(|id| records.contains_key(id));

        let collected = before - self.records.len();
        if collected > 0 {
            debug!(collected, remaining = self.records.len(), "Collected terminal requests");
        }
        collected
    }

    /// Count of records per status, for diagnostics.
    pub fn status_counts(&self) -> HashMap<RequestStatus, usize> {
        let mut counts = HashMap::new();
        for record in self.records.values() {
            *counts.entry(record.status).or_insert(0) += 1;
        }
        counts
    }

    fn next_id(&mut self, created_at: crate::clock::CivilTime) -> RequestId {
        let seq = self.next_seq;
        self.next_seq += 1;
        RequestId::new(format!(
            "req-{}-{seq:04}",
            created_at.format("%Y%m%d%H%M%S%6f")
        ))
    }
}
