//! Deterministic queue simulation.
//!
//! Drives one operator session on a manual clock against an in-memory
//! workbook: submits a mix of requests, then ticks the scheduler at a fixed
//! cadence the way a refreshing dashboard would.

use crate::backend::{InMemorySheets, SHEET_BLOCKLIST, STANDARD_SHEETS};
use crate::clock::{Clock, ManualClock};
use crate::config::QueueConfig;
use crate::error::GatehouseError;
use crate::intent::CommitIntent;
use crate::queue::{QueueSummary, RecordSnapshot};
use crate::session::OperatorSession;
use crate::types::{Priority, Requester};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shape of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationPlan {
    pub normal: usize,
    pub high: usize,
    pub urgent: usize,
    pub duration_secs: u64,
    pub tick_secs: u64,
    /// Every k-th Normal request carries a commit the workbook declines.
    pub fail_every: Option<usize>,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            normal: 5,
            high: 1,
            urgent: 1,
            duration_secs: 120,
            tick_secs: 5,
            fail_every: None,
        }
    }
}

impl SimulationPlan {
    pub fn validate(&self) -> Result<(), GatehouseError> {
        if self.tick_secs == 0 {
            return Err(GatehouseError::ConfigError(
                "tick interval must be at least one second".to_string(),
            ));
        }
        if self.fail_every == Some(0) {
            return Err(GatehouseError::ConfigError(
                "--fail-every must be at least 1".to_string(),
            ));
        }
        self.span()?;
        Ok(())
    }

    /// Simulated run length as a clock delta.
    pub fn span(&self) -> Result<chrono::Duration, GatehouseError> {
        i64::try_from(self.duration_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                GatehouseError::ConfigError(format!(
                    "duration of {} seconds is out of range",
                    self.duration_secs
                ))
            })
    }
}

/// Totals over every tick of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationTotals {
    pub ticks: usize,
    pub skipped_ticks: usize,
    pub approved: usize,
    pub failed: usize,
    pub collected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub totals: SimulationTotals,
    pub summary: QueueSummary,
    pub records: Vec<RecordSnapshot>,
    pub rows_written: usize,
    pub open_connections: usize,
}

/// Run a plan to completion.
pub fn run_simulation(
    plan: &SimulationPlan,
    config: &QueueConfig,
) -> Result<SimulationReport, GatehouseError> {
    plan.validate()?;

    let clock = ManualClock::at_opening();
    let sheets = InMemorySheets::new();
    let operator = Requester::new("Simulated Front Desk", "front-desk@gatehouse.local");
    let mut session = OperatorSession::new(operator, config.clone(), Arc::new(clock.clone()))
        .with_backend(Arc::new(sheets.clone()));

    for i in 1..=plan.normal {
        let declines = plan.fail_every.map_or(false, |k| i % k == 0);
        let intent = if declines {
            // Not on the block list, so the override declines.
            CommitIntent::BlockListOverride {
                person_name: format!("Visitor {i}"),
                document: format!("UNLISTED-{i:03}"),
                reason: "simulated decline".to_string(),
            }
        } else {
            CommitIntent::RegisterEntry {
                person_name: format!("Visitor {i}"),
                document: format!("DOC-{i:03}"),
                destination: "Reception".to_string(),
                vehicle_plate: None,
            }
        };
        session.submit_intent(intent, Some(Priority::Normal))?;
    }
    for i in 1..=plan.high {
        session.submit_intent(
            CommitIntent::AdminException {
                person_name: format!("Contractor {i}"),
                justification: "after-hours maintenance".to_string(),
            },
            Some(Priority::High),
        )?;
    }
    for i in 1..=plan.urgent {
        let document = format!("BLK-{i:03}");
        sheets.seed_row(SHEET_BLOCKLIST, vec![format!("Flagged {i}"), document.clone()])?;
        session.submit_intent(
            CommitIntent::BlockListOverride {
                person_name: format!("Flagged {i}"),
                document,
                reason: "cleared by security".to_string(),
            },
            Some(Priority::Urgent),
        )?;
    }

    let start = clock.now();
    let end = start.checked_add_signed(plan.span()?).ok_or_else(|| {
        GatehouseError::ConfigError(format!(
            "duration of {} seconds is out of range",
            plan.duration_secs
        ))
    })?;
    let mut totals = SimulationTotals::default();
    loop {
        let report = session.tick();
        totals.ticks += 1;
        if report.skipped {
            totals.skipped_ticks += 1;
        }
        totals.approved += report.approved;
        totals.failed += report.failed;
        totals.collected += report.collected;

        if clock.now() >= end {
            break;
        }
        clock.advance_secs(plan.tick_secs);
    }

    let rows_written = STANDARD_SHEETS
        .iter()
        .filter(|sheet| **sheet != SHEET_BLOCKLIST)
        .map(|sheet| sheets.rows(sheet).len())
        .sum::<usize>();

    info!(
        ticks = totals.ticks,
        approved = totals.approved,
        failed = totals.failed,
        pending = session.store().pending_count(None),
        "Simulation finished"
    );

    Ok(SimulationReport {
        totals,
        summary: session.summary(),
        records: session.store().records().map(|r| r.snapshot()).collect(),
        rows_written,
        open_connections: sheets.open_connections(),
    })
}
