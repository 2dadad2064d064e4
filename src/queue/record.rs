//! Request record and its one-shot status transitions.

use crate::clock::{elapsed_between, CivilTime};
use crate::types::{person_name, Payload, Priority, RequestId, RequestKind, RequestStatus, Requester};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Side-effecting commit attached to a request.
///
/// `Ok(true)` means the effect is durable, `Ok(false)` is a recoverable decline,
/// `Err(_)` an unexpected failure. Both failures are retried up to the cap.
pub type CommitCallback = Box<dyn FnMut(&Payload) -> anyhow::Result<bool> + Send>;

/// A request tracked by the queue.
///
/// Records are owned by the [`QueueStore`](super::QueueStore); callers only ever
/// see shared references, so status changes go through the store.
pub struct RequestRecord {
    pub id: RequestId,
    pub kind: RequestKind,
    pub priority: Priority,
    pub payload: Payload,
    pub status: RequestStatus,
    pub created_at: CivilTime,
    pub requester: Requester,
    pub approved_at: Option<CivilTime>,
    pub approved_by: Option<String>,
    pub rejected_at: Option<CivilTime>,
    pub rejection_reason: Option<String>,
    pub errored_at: Option<CivilTime>,
    pub error_message: Option<String>,
    pub(crate) callback: Option<CommitCallback>,
}

impl RequestRecord {
    pub(crate) fn new(
        id: RequestId,
        kind: RequestKind,
        priority: Priority,
        payload: Payload,
        requester: Requester,
        created_at: CivilTime,
        callback: Option<CommitCallback>,
    ) -> Self {
        Self {
            id,
            kind,
            priority,
            payload,
            status: RequestStatus::Pending,
            created_at,
            requester,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejection_reason: None,
            errored_at: None,
            error_message: None,
            callback,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub fn person_name(&self) -> Option<&str> {
        person_name(&self.payload)
    }

    /// Time since submission.
    pub fn age(&self, now: CivilTime) -> Duration {
        elapsed_between(self.created_at, now)
    }

    /// Moment the record reached its current terminal status.
    pub fn terminal_at(&self) -> Option<CivilTime> {
        match self.status {
            RequestStatus::Pending => None,
            RequestStatus::Approved => self.approved_at,
            RequestStatus::Rejected => self.rejected_at,
            RequestStatus::Error => self.errored_at,
        }
    }

    pub(crate) fn mark_approved(&mut self, approver: &str, at: CivilTime) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.approved_at = Some(at);
        self.approved_by = Some(approver.to_string());
        self.status = RequestStatus::Approved;
        true
    }

    pub(crate) fn mark_rejected(&mut self, reason: &str, at: CivilTime) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.rejected_at = Some(at);
        self.rejection_reason = Some(reason.to_string());
        self.status = RequestStatus::Rejected;
        true
    }

    /// Only the approval whose commit just failed may move a record to error.
    pub(crate) fn mark_error(&mut self, message: &str, at: CivilTime) -> bool {
        if !matches!(self.status, RequestStatus::Pending | RequestStatus::Approved) {
            return false;
        }
        let message = if message.trim().is_empty() {
            "commit failed"
        } else {
            message
        };
        self.errored_at = Some(at);
        self.error_message = Some(message.to_string());
        self.status = RequestStatus::Error;
        true
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            priority: self.priority,
            status: self.status,
            person_name: self.person_name().map(str::to_string),
            requested_by: self.requester.name.clone(),
            requester_email: self.requester.email.clone(),
            created_at: self.created_at,
            approved_at: self.approved_at,
            approved_by: self.approved_by.clone(),
            rejected_at: self.rejected_at,
            rejection_reason: self.rejection_reason.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

impl fmt::Debug for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRecord")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("approved_by", &self.approved_by)
            .field("error_message", &self.error_message)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Serializable, callback-free copy of a record for output.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSnapshot {
    pub id: RequestId,
    pub kind: RequestKind,
    pub priority: Priority,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    pub requested_by: String,
    pub requester_email: String,
    pub created_at: CivilTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<CivilTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<CivilTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
