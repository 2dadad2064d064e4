//! Commit executor: runs a record's callback with bounded retry.

use crate::clock::Clock;
use crate::queue::record::CommitCallback;
use crate::types::{Payload, RequestId};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Message stored on a record whose callback kept returning `false`.
pub const CALLBACK_DECLINED: &str = "callback declined";

/// Retry policy for commit callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Pause between consecutive attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Why a commit gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFailure {
    /// Every attempt returned `false`.
    Declined { attempts: u32 },
    /// The last attempt returned an error or panicked.
    Raised { attempts: u32, message: String },
}

impl CommitFailure {
    pub fn attempts(&self) -> u32 {
        match self {
            CommitFailure::Declined { attempts } | CommitFailure::Raised { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Text stored in the record's `error_message`.
    pub fn message(&self) -> String {
        match self {
            CommitFailure::Declined { .. } => CALLBACK_DECLINED.to_string(),
            CommitFailure::Raised { message, .. } => message.clone(),
        }
    }
}

/// Result of running one callback through the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { attempts: u32 },
    Failed(CommitFailure),
}

enum Attempt {
    Committed,
    Declined,
    Raised(String),
}

/// Runs commit callbacks. Pauses go through the clock so tests never sleep.
#[derive(Debug, Clone)]
pub struct CommitExecutor {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl CommitExecutor {
    pub fn new(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invoke `callback` until it succeeds or the attempt budget is spent.
    pub fn run(
        &self,
        request_id: &RequestId,
        callback: &mut CommitCallback,
        payload: &Payload,
    ) -> CommitOutcome {
        let max_attempts = self.policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match Self::attempt(callback, payload) {
                Attempt::Committed => {
                    debug!(request_id = %request_id, attempt, "Commit callback succeeded");
                    return CommitOutcome::Committed { attempts: attempt };
                }
                Attempt::Declined => {
                    warn!(request_id = %request_id, attempt, max_attempts, "Commit callback declined");
                    last_error = None;
                }
                Attempt::Raised(message) => {
                    warn!(
                        request_id = %request_id,
                        attempt,
                        max_attempts,
                        error = %message,
                        "Commit callback raised"
                    );
                    last_error = Some(message);
                }
            }
            if attempt < max_attempts {
                self.clock.sleep(self.policy.backoff);
            }
        }

        let failure = match last_error {
            Some(message) => CommitFailure::Raised {
                attempts: max_attempts,
                message,
            },
            None => CommitFailure::Declined {
                attempts: max_attempts,
            },
        };
        CommitOutcome::Failed(failure)
    }

    fn attempt(callback: &mut CommitCallback, payload: &Payload) -> Attempt {
        match catch_unwind(AssertUnwindSafe(|| callback(payload))) {
            Ok(Ok(true)) => Attempt::Committed,
            Ok(Ok(false)) => Attempt::Declined,
            Ok(Err(err)) => Attempt::Raised(format!("{err:#}")),
            Err(panic) => Attempt::Raised(format!("callback panicked: {}", panic_message(&panic))),
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
