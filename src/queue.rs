//! Request queue domain: records, store, commit executor, scheduler, and read model.
//!
//! One queue per operator session. Producers submit, the scheduler sweeps on
//! every dashboard tick, administrators approve or reject by id.

pub mod commit;
pub mod record;
pub mod scheduler;
pub mod store;
pub mod summary;

pub use commit::{CommitExecutor, CommitFailure, CommitOutcome, RetryPolicy, CALLBACK_DECLINED};
pub use record::{CommitCallback, RecordSnapshot, RequestRecord};
pub use scheduler::{Scheduler, SweepReport, TickReport, AUTO_APPROVER};
pub use store::{ApprovalOutcome, QueueStore};
pub use summary::{Countdown, QueueSummary};
