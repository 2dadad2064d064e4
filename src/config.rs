//! Configuration System
//!
//! Layered configuration for the queue tunables and logging. Sources, lowest
//! precedence first: built-in defaults, the global user file, workspace files,
//! then `GATEHOUSE__SECTION__KEY` environment variables.

use crate::logging::LoggingConfig;
use crate::queue::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Grace period before a Normal request is auto-approved.
pub const AUTO_APPROVE_SECONDS: u64 = 60;
/// Minimum gap between two working scheduler ticks.
pub const BATCH_CHECK_INTERVAL_SECS: u64 = 10;
/// Commit callback attempts, including the first.
pub const RETRY_ATTEMPTS: u32 = 3;
/// Pause between commit attempts.
pub const RETRY_BACKOFF_MS: u64 = 1000;
/// Age after which terminal records are garbage-collected.
pub const TERMINAL_RETENTION_SECS: u64 = 60 * 60;
/// Master switch for auto-approval.
pub const AUTO_APPROVE_ENABLED: bool = true;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatehouseConfig {
    /// Request queue tunables
    #[serde(default)]
    pub queue: QueueConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Queue tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_auto_approve_seconds")]
    pub auto_approve_seconds: u64,

    #[serde(default = "default_batch_check_interval_secs")]
    pub batch_check_interval_secs: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_terminal_retention_secs")]
    pub terminal_retention_secs: u64,

    #[serde(default = "default_auto_approve_enabled")]
    pub auto_approve_enabled: bool,
}

fn default_auto_approve_seconds() -> u64 {
    AUTO_APPROVE_SECONDS
}

fn default_batch_check_interval_secs() -> u64 {
    BATCH_CHECK_INTERVAL_SECS
}

fn default_retry_attempts() -> u32 {
    RETRY_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    RETRY_BACKOFF_MS
}

fn default_terminal_retention_secs() -> u64 {
    TERMINAL_RETENTION_SECS
}

fn default_auto_approve_enabled() -> bool {
    AUTO_APPROVE_ENABLED
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            auto_approve_seconds: AUTO_APPROVE_SECONDS,
            batch_check_interval_secs: BATCH_CHECK_INTERVAL_SECS,
            retry_attempts: RETRY_ATTEMPTS,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            terminal_retention_secs: TERMINAL_RETENTION_SECS,
            auto_approve_enabled: AUTO_APPROVE_ENABLED,
        }
    }
}

impl QueueConfig {
    pub fn auto_approve_after(&self) -> Duration {
        Duration::from_secs(self.auto_approve_seconds)
    }

    pub fn batch_check_interval(&self) -> Duration {
        Duration::from_secs(self.batch_check_interval_secs)
    }

    pub fn terminal_retention(&self) -> Duration {
        Duration::from_secs(self.terminal_retention_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Validate queue tunables
    pub fn validate(&self) -> Result<(), String> {
        if self.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        if self.terminal_retention_secs == 0 {
            return Err("terminal_retention_secs must be positive".to_string());
        }
        if self.retry_backoff_ms > 60_000 {
            return Err(format!(
                "retry_backoff_ms {} blocks the operator for over a minute per attempt",
                self.retry_backoff_ms
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Queue(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Queue(msg) => write!(f, "Queue: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl GatehouseConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.queue.validate() {
            errors.push(ValidationError::Queue(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
