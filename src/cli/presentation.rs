//! CLI presentation: text and json formatters per command.

use crate::config::{GatehouseConfig, ValidationError};
use crate::error::GatehouseError;
use crate::simulation::SimulationReport;
use crate::types::{Priority, RequestStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

const TIME_FORMAT: &str = "%H:%M:%S";

fn section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn colored_status(status: RequestStatus) -> String {
    match status {
        RequestStatus::Pending => status.as_str().yellow().to_string(),
        RequestStatus::Approved => status.as_str().green().to_string(),
        RequestStatus::Rejected => status.as_str().dimmed().to_string(),
        RequestStatus::Error => status.as_str().red().to_string(),
    }
}

pub fn format_config_toml(config: &GatehouseConfig) -> Result<String, GatehouseError> {
    toml::to_string_pretty(config)
        .map_err(|e| GatehouseError::ConfigError(format!("Failed to render config: {}", e)))
}

pub fn format_validation_result(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => format!("{}", "Configuration is valid".green()),
        Err(errors) => {
            let mut lines = vec![format!(
                "{} ({}):",
                "Configuration has errors".red(),
                errors.len()
            )];
            lines.extend(errors.iter().map(|e| format!("  - {}", e)));
            lines.join("\n")
        }
    }
}

pub fn format_simulation_json(report: &SimulationReport) -> Result<String, GatehouseError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| GatehouseError::InvalidPayload(format!("Failed to render report: {}", e)))
}

pub fn format_simulation_text(report: &SimulationReport) -> String {
    let mut out = Vec::new();
    let totals = &report.totals;

    out.push(section_heading("Simulation"));
    out.push(format!(
        "  Ticks: {} ({} throttled)\n  Auto-approved: {}\n  Failed commits: {}\n  Collected: {}\n  Rows written: {}",
        totals.ticks,
        totals.skipped_ticks,
        totals.approved,
        totals.failed,
        totals.collected,
        report.rows_written
    ));

    let summary = &report.summary;
    out.push(String::new());
    out.push(section_heading("Pending"));
    let mut pending = Table::new();
    pending.load_preset(UTF8_BORDERS_ONLY);
    pending.set_header(vec!["Priority", "Pending"]);
    for priority in Priority::ALL {
        pending.add_row(vec![
            priority.as_str().to_string(),
            summary.pending_for(priority).to_string(),
        ]);
    }
    pending.add_row(vec!["total".to_string(), summary.total_pending.to_string()]);
    out.push(pending.to_string());

    if !summary.countdowns.is_empty() {
        out.push(String::new());
        out.push(section_heading("Auto-approval countdowns"));
        let mut countdowns = Table::new();
        countdowns.load_preset(UTF8_BORDERS_ONLY);
        countdowns.set_header(vec!["Request", "Kind", "Person", "Remaining"]);
        for c in &summary.countdowns {
            countdowns.add_row(vec![
                c.id.to_string(),
                c.kind.label().to_string(),
                c.person_name.clone().unwrap_or_else(|| "-".to_string()),
                format!("{}s", c.remaining_seconds),
            ]);
        }
        out.push(countdowns.to_string());
    } else if !summary.auto_approve_enabled {
        out.push(format!("{}", "Auto-approval is disabled".yellow()));
    }

    out.push(String::new());
    out.push(section_heading("Requests"));
    let mut records = Table::new();
    records.load_preset(UTF8_BORDERS_ONLY);
    records.set_header(vec![
        "Request", "Kind", "Priority", "Person", "Status", "Decided", "Note",
    ]);
    for r in &report.records {
        let decided = r
            .approved_at
            .or(r.rejected_at)
            .map(|t| t.format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        let note = r
            .error_message
            .clone()
            .or_else(|| r.approved_by.clone())
            .or_else(|| r.rejection_reason.clone())
            .unwrap_or_default();
        records.add_row(vec![
            r.id.to_string(),
            r.kind.label().to_string(),
            r.priority.as_str().to_string(),
            r.person_name.clone().unwrap_or_else(|| "-".to_string()),
            colored_status(r.status),
            decided,
            note,
        ]);
    }
    out.push(records.to_string());

    out.join("\n")
}
