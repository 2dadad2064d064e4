//! Property-based tests for queue lifecycle guarantees

use gatehouse::clock::{elapsed_between, Clock, ManualClock};
use gatehouse::config::QueueConfig;
use gatehouse::queue::{QueueStore, QueueSummary, RetryPolicy, Scheduler};
use gatehouse::types::{Payload, Priority, RequestId, RequestKind, RequestStatus, Requester};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Commits,
    Declines,
    Raises,
}

#[derive(Debug, Clone)]
enum Op {
    Submit(Priority, Behavior),
    Advance(u64),
    Tick,
    Approve(usize),
    Reject(usize),
    Gc(u64),
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        3 => Just(Priority::Normal),
        1 => Just(Priority::High),
        1 => Just(Priority::Urgent),
    ]
}

fn behavior() -> impl Strategy<Value = Behavior> {
    prop_oneof![
        4 => Just(Behavior::Commits),
        1 => Just(Behavior::Declines),
        1 => Just(Behavior::Raises),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (priority(), behavior()).prop_map(|(p, b)| Op::Submit(p, b)),
        3 => (1u64..40).prop_map(Op::Advance),
        3 => Just(Op::Tick),
        1 => any::<usize>().prop_map(Op::Approve),
        1 => any::<usize>().prop_map(Op::Reject),
        1 => (60u64..7200).prop_map(Op::Gc),
    ]
}

fn callback(behavior: Behavior, calls: Arc<AtomicUsize>) -> gatehouse::queue::CommitCallback {
    Box::new(move |_: &Payload| -> anyhow::Result<bool> {
        calls.fetch_add(1, Ordering::SeqCst);
        match behavior {
            Behavior::Commits => Ok(true),
            Behavior::Declines => Ok(false),
            Behavior::Raises => Err(anyhow::anyhow!("backend offline")),
        }
    })
}

struct Harness {
    clock: ManualClock,
    store: QueueStore,
    scheduler: Scheduler,
    config: QueueConfig,
    ids: Vec<RequestId>,
    calls: HashMap<RequestId, Arc<AtomicUsize>>,
    terminal: HashMap<RequestId, RequestStatus>,
}

impl Harness {
    fn new() -> Self {
        let clock = ManualClock::at_opening();
        let config = QueueConfig::default();
        let store = QueueStore::new(
            Requester::new("Front Desk", "desk@example.org"),
            Arc::new(clock.clone()),
            RetryPolicy::default(),
        );
        Self {
            clock,
            store,
            scheduler: Scheduler::new(config.clone()),
            config,
            ids: Vec::new(),
            calls: HashMap::new(),
            terminal: HashMap::new(),
        }
    }

    fn pick(&self, index: usize) -> Option<RequestId> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids[index % self.ids.len()].clone())
        }
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match op {
            Op::Submit(priority, behavior) => {
                let calls = Arc::new(AtomicUsize::new(0));
                let id = self.store.submit(
                    RequestKind::NormalEntry,
                    *priority,
                    Payload::new(),
                    Some(callback(behavior.clone(), Arc::clone(&calls))),
                );
                self.calls.insert(id.clone(), calls);
                self.ids.push(id);
            }
            Op::Advance(secs) => self.clock.advance_secs(*secs),
            Op::Tick => {
                let pending_before = self.store.pending_count(None);
                let high_before = self.store.pending_count(Some(Priority::High));
                let urgent_before = self.store.pending_count(Some(Priority::Urgent));
                self.scheduler.tick(&mut self.store);
                prop_assert!(self.store.pending_count(None) <= pending_before);
                prop_assert_eq!(self.store.pending_count(Some(Priority::High)), high_before);
                prop_assert_eq!(self.store.pending_count(Some(Priority::Urgent)), urgent_before);
            }
            Op::Approve(index) => {
                if let Some(id) = self.pick(*index) {
                    let was_pending = self.store.find(&id).map_or(false, |r| r.is_pending());
                    let approved = self.store.approve(&id, "admin");
                    if !was_pending {
                        prop_assert!(!approved);
                    }
                }
            }
            Op::Reject(index) => {
                if let Some(id) = self.pick(*index) {
                    let was_pending = self.store.find(&id).map_or(false, |r| r.is_pending());
                    prop_assert_eq!(self.store.reject(&id, "denied"), was_pending);
                }
            }
            Op::Gc(secs) => {
                let max_age = Duration::from_secs(*secs);
                let pending: Vec<RequestId> =
                    self.store.list_pending(None).iter().map(|r| r.id.clone()).collect();
                self.store.gc(max_age);
                let now = self.clock.now();
                for record in self.store.records() {
                    if let Some(at) = record.terminal_at() {
                        prop_assert!(elapsed_between(at, now) <= max_age);
                    }
                }
                for id in pending {
                    prop_assert!(self.store.find(&id).is_some());
                }
            }
        }
        self.check_records()
    }

    fn check_records(&mut self) -> Result<(), TestCaseError> {
        for record in self.store.records() {
            if let Some(at) = record.approved_at {
                prop_assert!(record.created_at <= at);
            }
            if let Some(at) = record.rejected_at {
                prop_assert!(record.created_at <= at);
            }
            if record.status.is_terminal() {
                let first = *self.terminal.entry(record.id.clone()).or_insert(record.status);
                prop_assert_eq!(first, record.status);
            }
            let calls = self.calls[&record.id].load(Ordering::SeqCst);
            prop_assert!(calls <= RetryPolicy::default().attempts as usize);
            if record.status == RequestStatus::Error {
                prop_assert_eq!(calls, RetryPolicy::default().attempts as usize);
            }
        }

        let summary = QueueSummary::capture(&self.store, &self.config);
        for countdown in &summary.countdowns {
            prop_assert!(countdown.remaining_seconds <= self.config.auto_approve_seconds);
        }
        Ok(())
    }
}

/// Random traces never break the lifecycle invariants
#[test]
fn test_queue_trace_invariants() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(op(), 1..60), |ops| {
            let mut harness = Harness::new();
            for op in &ops {
                harness.apply(op)?;
            }
            Ok(())
        })
        .unwrap();
}

/// Approving twice equals approving once
#[test]
fn test_approve_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(priority(), behavior(), 0u64..120), |(priority, behavior, delay)| {
            let mut harness = Harness::new();
            harness.apply(&Op::Submit(priority, behavior))?;
            let id = harness.ids[0].clone();
            harness.clock.advance_secs(delay);

            harness.store.approve(&id, "first");
            let status = harness.store.find(&id).unwrap().status;
            let approved_at = harness.store.find(&id).unwrap().approved_at;
            let calls = harness.calls[&id].load(Ordering::SeqCst);

            harness.clock.advance_secs(5);
            prop_assert!(!harness.store.approve(&id, "second"));
            let record = harness.store.find(&id).unwrap();
            prop_assert_eq!(record.status, status);
            prop_assert_eq!(record.approved_at, approved_at);
            prop_assert_eq!(record.approved_by.as_deref(), Some("first"));
            prop_assert_eq!(harness.calls[&id].load(Ordering::SeqCst), calls);
            Ok(())
        })
        .unwrap();
}
