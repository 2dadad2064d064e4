//! Sheet Backend
//!
//! The spreadsheet persistence collaborator that commit callbacks write to.
//! A connection is acquired per callback invocation and released when it is
//! dropped, so it never outlives the attempt that opened it.

use crate::error::BackendError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One spreadsheet row, as plain cell strings.
pub type Row = Vec<String>;

pub const SHEET_ENTRIES: &str = "entries";
pub const SHEET_EXITS: &str = "exits";
pub const SHEET_MATERIALS: &str = "materials";
pub const SHEET_EXCEPTIONS: &str = "exceptions";
pub const SHEET_BLOCKLIST: &str = "blocklist";

/// Sheets every access-control workbook carries.
pub const STANDARD_SHEETS: [&str; 5] = [
    SHEET_ENTRIES,
    SHEET_EXITS,
    SHEET_MATERIALS,
    SHEET_EXCEPTIONS,
    SHEET_BLOCKLIST,
];

/// An open connection to the workbook.
pub trait SheetConnection {
    /// Append a row and return its index.
    fn append_row(&mut self, sheet: &str, row: Row) -> Result<usize, BackendError>;

    /// Index of the first row whose `column` equals `value`.
    fn find_row(&self, sheet: &str, column: usize, value: &str) -> Result<Option<usize>, BackendError>;

    /// Remove a row and return it.
    fn delete_row(&mut self, sheet: &str, index: usize) -> Result<Row, BackendError>;
}

/// Source of workbook connections.
pub trait SheetBackend: Send + Sync + fmt::Debug {
    fn open(&self) -> Result<Box<dyn SheetConnection>, BackendError>;
}

#[derive(Debug, Default)]
struct WorkbookState {
    sheets: BTreeMap<String, Vec<Row>>,
    open_connections: usize,
    opened_total: usize,
    failing_opens: usize,
    failing_writes: usize,
}

/// In-process workbook used by tests and the simulator.
///
/// Clones share the same workbook.
#[derive(Debug, Clone, Default)]
pub struct InMemorySheets {
    state: Arc<Mutex<WorkbookState>>,
}

impl InMemorySheets {
    /// Workbook with the standard sheets, all empty.
    pub fn new() -> Self {
        Self::with_sheets(&STANDARD_SHEETS)
    }

    pub fn with_sheets(names: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock();
            for name in names {
                state.sheets.insert((*name).to_string(), Vec::new());
            }
        }
        backend
    }

    /// Write a row directly, bypassing connections and injected failures.
    pub fn seed_row(&self, sheet: &str, row: Row) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        let rows = state
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))?;
        rows.push(row);
        Ok(())
    }

    /// Snapshot of a sheet's rows; empty for unknown sheets.
    pub fn rows(&self, sheet: &str) -> Vec<Row> {
        self.state.lock().sheets.get(sheet).cloned().unwrap_or_default()
    }

    /// Connections currently held.
    pub fn open_connections(&self) -> usize {
        self.state.lock().open_connections
    }

    /// Connections ever opened.
    pub fn connections_opened(&self) -> usize {
        self.state.lock().opened_total
    }

    /// Make the next `count` calls to `open` fail.
    pub fn fail_next_opens(&self, count: usize) {
        self.state.lock().failing_opens = count;
    }

    /// Make the next `count` row writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().failing_writes = count;
    }
}

impl SheetBackend for InMemorySheets {
    fn open(&self) -> Result<Box<dyn SheetConnection>, BackendError> {
        let mut state = self.state.lock();
        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(BackendError::Unavailable(
                "workbook connection refused".to_string(),
            ));
        }
        state.open_connections += 1;
        state.opened_total += 1;
        debug!(open = state.open_connections, "Opened sheet connection");
        Ok(Box::new(InMemoryConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemoryConnection {
    state: Arc<Mutex<WorkbookState>>,
}

impl InMemoryConnection {
    fn take_write_failure(state: &mut WorkbookState, sheet: &str) -> Result<(), BackendError> {
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(BackendError::WriteRejected(format!(
                "write to {} rejected",
                sheet
            )));
        }
        Ok(())
    }
}

impl SheetConnection for InMemoryConnection {
    fn append_row(&mut self, sheet: &str, row: Row) -> Result<usize, BackendError> {
        let mut state = self.state.lock();
        Self::take_write_failure(&mut state, sheet)?;
        let rows = state
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))?;
        rows.push(row);
        Ok(rows.len() - 1)
    }

    fn find_row(&self, sheet: &str, column: usize, value: &str) -> Result<Option<usize>, BackendError> {
        let state = self.state.lock();
        let rows = state
            .sheets
            .get(sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))?;
        Ok(rows
            .iter()
            .position(|row| row.get(column).map(String::as_str) == Some(value)))
    }

    fn delete_row(&mut self, sheet: &str, index: usize) -> Result<Row, BackendError> {
        let mut state = self.state.lock();
        Self::take_write_failure(&mut state, sheet)?;
        let rows = state
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))?;
        if index >= rows.len() {
            return Err(BackendError::RowOutOfRange {
                sheet: sheet.to_string(),
                index,
            });
        }
        Ok(rows.remove(index))
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_connections = state.open_connections.saturating_sub(1);
    }
}
