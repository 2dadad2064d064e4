//! Commit Intents
//!
//! Typed descriptions of the durable effect each request kind performs once
//! approved. An intent travels inside the request payload (tagged with
//! `intent`) and is decoded again by the commit callback, which dispatches it
//! against a freshly opened sheet connection.

use crate::backend::{
    Row, SheetBackend, SheetConnection, SHEET_BLOCKLIST, SHEET_ENTRIES, SHEET_EXCEPTIONS,
    SHEET_EXITS, SHEET_MATERIALS,
};
use crate::clock::{CivilTime, Clock};
use crate::error::GatehouseError;
use crate::queue::CommitCallback;
use crate::types::{Payload, Priority, RequestKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Column of the document number on the `blocklist` sheet.
const BLOCKLIST_DOCUMENT_COLUMN: usize = 1;

const ROW_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum CommitIntent {
    RegisterEntry {
        person_name: String,
        document: String,
        destination: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vehicle_plate: Option<String>,
    },
    RegisterExit {
        person_name: String,
        document: String,
    },
    MaterialRemoval {
        person_name: String,
        material: String,
        quantity: u32,
        destination: String,
    },
    AdminException {
        person_name: String,
        justification: String,
    },
    BlockListOverride {
        person_name: String,
        document: String,
        reason: String,
    },
}

impl CommitIntent {
    pub fn kind(&self) -> RequestKind {
        match self {
            CommitIntent::RegisterEntry { .. } => RequestKind::NormalEntry,
            CommitIntent::RegisterExit { .. } => RequestKind::NormalExit,
            CommitIntent::MaterialRemoval { .. } => RequestKind::MaterialRemoval,
            CommitIntent::AdminException { .. } => RequestKind::AdminException,
            CommitIntent::BlockListOverride { .. } => RequestKind::BlockListOverride,
        }
    }

    /// Priority the front desk files this intent under by default.
    pub fn default_priority(&self) -> Priority {
        match self {
            CommitIntent::RegisterEntry { .. }
            | CommitIntent::RegisterExit { .. }
            | CommitIntent::MaterialRemoval { .. } => Priority::Normal,
            CommitIntent::AdminException { .. } => Priority::High,
            CommitIntent::BlockListOverride { .. } => Priority::Urgent,
        }
    }

    pub fn person_name(&self) -> &str {
        match self {
            CommitIntent::RegisterEntry { person_name, .. }
            | CommitIntent::RegisterExit { person_name, .. }
            | CommitIntent::MaterialRemoval { person_name, .. }
            | CommitIntent::AdminException { person_name, .. }
            | CommitIntent::BlockListOverride { person_name, .. } => person_name,
        }
    }

    /// Flat payload tagged with `intent`; always carries `person_name`.
    pub fn into_payload(self) -> Result<Payload, GatehouseError> {
        match serde_json::to_value(&self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(GatehouseError::InvalidPayload(format!(
                "intent serialized to a non-object: {}",
                other
            ))),
            Err(e) => Err(GatehouseError::InvalidPayload(e.to_string())),
        }
    }

    /// Decode an intent from a request payload. Unrelated keys are ignored.
    pub fn from_payload(payload: &Payload) -> Result<Self, GatehouseError> {
        serde_json::from_value(serde_json::Value::Object(payload.clone()))
            .map_err(|e| GatehouseError::InvalidPayload(e.to_string()))
    }

    /// Commit callback that decodes the record's payload and applies it.
    ///
    /// Each invocation opens its own connection; it is released when the
    /// invocation returns, whatever the outcome.
    pub fn commit_callback(backend: Arc<dyn SheetBackend>, clock: Arc<dyn Clock>) -> CommitCallback {
        Box::new(move |payload: &Payload| {
            let intent = CommitIntent::from_payload(payload)?;
            let mut connection = backend.open().context("opening workbook connection")?;
            intent.apply(connection.as_mut(), clock.now())
        })
    }

    /// Perform the durable effect.
    ///
    /// `Ok(false)` declines without writing anything.
    pub fn apply(&self, connection: &mut dyn SheetConnection, now: CivilTime) -> anyhow::Result<bool> {
        let stamp = now.format(ROW_TIMESTAMP_FORMAT).to_string();
        match self {
            CommitIntent::RegisterEntry {
                person_name,
                document,
                destination,
                vehicle_plate,
            } => {
                let row = vec![
                    stamp,
                    person_name.clone(),
                    document.clone(),
                    destination.clone(),
                    vehicle_plate.clone().unwrap_or_default(),
                ];
                append(connection, SHEET_ENTRIES, row)
            }
            CommitIntent::RegisterExit {
                person_name,
                document,
            } => append(
                connection,
                SHEET_EXITS,
                vec![stamp, person_name.clone(), document.clone()],
            ),
            CommitIntent::MaterialRemoval {
                person_name,
                material,
                quantity,
                destination,
            } => append(
                connection,
                SHEET_MATERIALS,
                vec![
                    stamp,
                    person_name.clone(),
                    material.clone(),
                    quantity.to_string(),
                    destination.clone(),
                ],
            ),
            CommitIntent::AdminException {
                person_name,
                justification,
            } => append(
                connection,
                SHEET_EXCEPTIONS,
                vec![stamp, person_name.clone(), justification.clone()],
            ),
            CommitIntent::BlockListOverride {
                person_name,
                document,
                reason,
            } => {
                let Some(index) =
                    connection.find_row(SHEET_BLOCKLIST, BLOCKLIST_DOCUMENT_COLUMN, document)?
                else {
                    debug!(document = %document, "Block-list override declined: not listed");
                    return Ok(false);
                };
                // The person stays listed until the override row is written.
                append(
                    connection,
                    SHEET_EXCEPTIONS,
                    vec![
                        stamp,
                        person_name.clone(),
                        format!("block-list override: {}", reason),
                    ],
                )?;
                connection
                    .delete_row(SHEET_BLOCKLIST, index)
                    .with_context(|| format!("removing {} from the block list", person_name))?;
                info!(person = %person_name, "Removed from block list");
                Ok(true)
            }
        }
    }
}

fn append(connection: &mut dyn SheetConnection, sheet: &str, row: Row) -> anyhow::Result<bool> {
    connection
        .append_row(sheet, row)
        .with_context(|| format!("appending to {}", sheet))?;
    Ok(true)
}
