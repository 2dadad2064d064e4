//! Gatehouse: front-desk request queue with deferred auto-approval
//!
//! Access-control operators file requests (entries, exits, material removals,
//! exceptions, block-list overrides). Normal requests are auto-approved after a
//! grace interval; High and Urgent requests wait for an administrator. Approval
//! runs the request's commit callback against the spreadsheet backend with
//! bounded retry.

pub mod backend;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod intent;
pub mod logging;
pub mod queue;
pub mod session;
pub mod simulation;
pub mod types;
