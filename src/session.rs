//! Operator sessions.
//!
//! Each logged-in operator owns one queue. A session bundles the store, the
//! scheduler, the clock, the effective queue configuration and the operator's
//! identity; the registry opens and tears sessions down.

use crate::backend::SheetBackend;
use crate::clock::Clock;
use crate::config::QueueConfig;
use crate::error::{BackendError, GatehouseError};
use crate::intent::CommitIntent;
use crate::queue::{
    ApprovalOutcome, CommitCallback, QueueStore, QueueSummary, RequestRecord, Scheduler, TickReport,
};
use crate::types::{Payload, Priority, RequestId, RequestKind, Requester};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

fn new_session_id(clock: &dyn Clock) -> String {
    let ts = clock.now().timestamp_millis();
    let pid = std::process::id();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sess-{ts}-{pid}-{seq}")
}

/// Per-operator queue state.
#[derive(Debug)]
pub struct OperatorSession {
    operator: Requester,
    store: QueueStore,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    backend: Option<Arc<dyn SheetBackend>>,
}

impl OperatorSession {
    pub fn new(operator: Requester, config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        let store = QueueStore::new(operator.clone(), Arc::clone(&clock), config.retry_policy());
        Self {
            operator,
            store,
            scheduler: Scheduler::new(config),
            clock,
            backend: None,
        }
    }

    /// Sheet backend used by callbacks built in [`submit_intent`](Self::submit_intent).
    pub fn with_backend(mut self, backend: Arc<dyn SheetBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn operator(&self) -> &Requester {
        &self.operator
    }

    pub fn config(&self) -> &QueueConfig {
        self.scheduler.config()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn submit(
        &mut self,
        kind: RequestKind,
        priority: Priority,
        payload: Payload,
        callback: Option<CommitCallback>,
    ) -> RequestId {
        self.store.submit(kind, priority, payload, callback)
    }

    /// Submit an intent; its commit writes to the session's sheet backend.
    ///
    /// `priority` falls back to the intent's default.
    pub fn submit_intent(
        &mut self,
        intent: CommitIntent,
        priority: Option<Priority>,
    ) -> Result<RequestId, GatehouseError> {
        let backend = self.backend.clone().ok_or_else(|| {
            BackendError::Unavailable("no sheet backend attached to session".to_string())
        })?;
        let kind = intent.kind();
        let priority = priority.unwrap_or_else(|| intent.default_priority());
        let payload = intent.into_payload()?;
        let callback = CommitIntent::commit_callback(backend, Arc::clone(&self.clock));
        Ok(self.store.submit(kind, priority, payload, Some(callback)))
    }

    pub fn approve(&mut self, id: &RequestId, approver: &str) -> bool {
        self.store.approve(id, approver)
    }

    pub fn approve_detailed(&mut self, id: &RequestId, approver: &str) -> ApprovalOutcome {
        self.store.approve_detailed(id, approver)
    }

    pub fn reject(&mut self, id: &RequestId, reason: &str) -> bool {
        self.store.reject(id, reason)
    }

    pub fn tick(&mut self) -> TickReport {
        self.scheduler.tick(&mut self.store)
    }

    pub fn auto_approve_batch(&mut self) -> usize {
        self.scheduler.auto_approve_batch(&mut self.store)
    }

    pub fn summary(&self) -> QueueSummary {
        QueueSummary::capture(&self.store, self.scheduler.config())
    }

    pub fn list_pending(&self, priority: Option<Priority>) -> Vec<&RequestRecord> {
        self.store.list_pending(priority)
    }

    pub fn find(&self, id: &RequestId) -> Option<&RequestRecord> {
        self.store.find(id)
    }
}

/// Open operator sessions, keyed by session id.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<OperatorSession>>>>,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    backend: Option<Arc<dyn SheetBackend>>,
}

impl SessionRegistry {
    pub fn new(config: QueueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            clock,
            backend: None,
        }
    }

    /// Backend handed to every session opened afterwards.
    pub fn with_backend(mut self, backend: Arc<dyn SheetBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Start a session for an operator with an empty queue.
    pub fn open(&self, operator: Requester) -> String {
        let id = new_session_id(self.clock.as_ref());
        let mut session = OperatorSession::new(operator, self.config.clone(), Arc::clone(&self.clock));
        if let Some(backend) = &self.backend {
            session = session.with_backend(Arc::clone(backend));
        }
        info!(session_id = %id, operator = %session.operator().email, "Opened operator session");
        self.sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    /// Run `f` with exclusive access to one session.
    pub fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut OperatorSession) -> R,
    ) -> Result<R, GatehouseError> {
        let session = self
            .sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| GatehouseError::SessionNotFound(id.to_string()))?;
        let mut guard = session.lock();
        Ok(f(&mut guard))
    }

    /// Tear a session down. Its queue, pending requests included, is discarded.
    pub fn close(&self, id: &str) -> Result<(), GatehouseError> {
        let session = self
            .sessions
            .write()
            .remove(id)
            .ok_or_else(|| GatehouseError::SessionNotFound(id.to_string()))?;
        let lost = session.lock().store().pending_count(None);
        if lost > 0 {
            warn!(session_id = %id, lost_pending = lost, "Closed session with pending requests");
        } else {
            info!(session_id = %id, "Closed operator session");
        }
        Ok(())
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
