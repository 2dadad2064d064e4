//! Core value types shared across the queue.

use crate::error::GatehouseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Free-form request payload, filled in by the producer.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Reserved payload key read by dashboards for display.
pub const PERSON_NAME_KEY: &str = "person_name";

/// Display name stored under [`PERSON_NAME_KEY`], if any.
pub fn person_name(payload: &Payload) -> Option<&str> {
    payload.get(PERSON_NAME_KEY).and_then(|v| v.as_str())
}

/// Opaque request identifier, unique within one operator session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    pub(crate) fn new(raw: String) -> Self {
        RequestId(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Priority class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal = 1, // Auto-approved after the grace interval
    High = 2,   // Waits for an administrator
    Urgent = 3, // Waits for an administrator, shown first
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Normal, Priority::High, Priority::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Only Normal requests are eligible for auto-approval.
    pub fn auto_approvable(self) -> bool {
        matches!(self, Priority::Normal)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(GatehouseError::InvalidPriority(s.to_string())),
        }
    }
}

/// Kind of operation a request commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    NormalEntry,
    NormalExit,
    MaterialRemoval,
    AdminException,
    BlockListOverride,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        RequestKind::NormalEntry,
        RequestKind::NormalExit,
        RequestKind::MaterialRemoval,
        RequestKind::AdminException,
        RequestKind::BlockListOverride,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::NormalEntry => "normal_entry",
            RequestKind::NormalExit => "normal_exit",
            RequestKind::MaterialRemoval => "material_removal",
            RequestKind::AdminException => "admin_exception",
            RequestKind::BlockListOverride => "block_list_override",
        }
    }

    /// Human-readable label for dashboards.
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::NormalEntry => "Entry",
            RequestKind::NormalExit => "Exit",
            RequestKind::MaterialRemoval => "Material removal",
            RequestKind::AdminException => "Administrative exception",
            RequestKind::BlockListOverride => "Block-list override",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RequestKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| GatehouseError::InvalidKind(s.to_string()))
    }
}

/// Lifecycle status of a request record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Error,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator identity snapshotted onto each submitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
}

impl Requester {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}
