//! Merge rules: defaults, override order, conflict handling.

use crate::config::{
    AUTO_APPROVE_ENABLED, AUTO_APPROVE_SECONDS, BATCH_CHECK_INTERVAL_SECS, RETRY_ATTEMPTS,
    RETRY_BACKOFF_MS, TERMINAL_RETENTION_SECS,
};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the queue defaults applied.
///
/// Later sources override these key by key, so a file that sets only
/// `queue.auto_approve_seconds` keeps every other default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("queue.auto_approve_seconds", AUTO_APPROVE_SECONDS as i64)?
        .set_default(
            "queue.batch_check_interval_secs",
            BATCH_CHECK_INTERVAL_SECS as i64,
        )?
        .set_default("queue.retry_attempts", RETRY_ATTEMPTS as i64)?
        .set_default("queue.retry_backoff_ms", RETRY_BACKOFF_MS as i64)?
        .set_default("queue.terminal_retention_secs", TERMINAL_RETENTION_SECS as i64)?
        .set_default("queue.auto_approve_enabled", AUTO_APPROVE_ENABLED)
}
