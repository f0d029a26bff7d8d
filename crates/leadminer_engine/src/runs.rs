//! Per-run progress contexts.
//!
//! Every run gets its own [`RunContext`], looked up by [`RunId`], so two runs in
//! flight never overwrite each other's progress. The pipeline writes through
//! [`ProgressSink`]; the progress stream reads [`RunContext::snapshot`].

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use leadminer_core::{update, ProgressMsg, ProgressState};
use miner_logging::miner_debug;
use uuid::Uuid;

pub const DEFAULT_MAX_RUNS: usize = 64;

/// Receives progress messages from the pipeline.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, msg: ProgressMsg);
}

/// Sink for callers that do not observe progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _msg: ProgressMsg) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct RunContext {
    id: RunId,
    state: Mutex<ProgressState>,
    report_path: Mutex<Option<PathBuf>>,
}

impl RunContext {
    pub fn new(id: RunId) -> Self {
        Self {
            id,
            state: Mutex::new(ProgressState::new()),
            report_path: Mutex::new(None),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    /// Copy of the current progress; never waits on the pipeline for longer than one update.
    pub fn snapshot(&self) -> ProgressState {
        lock(&self.state).clone()
    }

    pub fn apply(&self, msg: ProgressMsg) {
        let mut guard = lock(&self.state);
        let current = std::mem::take(&mut *guard);
        *guard = update(current, msg);
    }

    pub fn set_report_path(&self, path: PathBuf) {
        *lock(&self.report_path) = Some(path);
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        lock(&self.report_path).clone()
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }
}

impl ProgressSink for RunContext {
    fn emit(&self, msg: ProgressMsg) {
        self.apply(msg);
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    runs: HashMap<RunId, Arc<RunContext>>,
    order: VecDeque<RunId>,
    last_report: Option<PathBuf>,
}

/// Lookup of run contexts by id, bounded to the most recent runs.
#[derive(Debug)]
pub struct RunRegistry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_RUNS)
    }
}

impl RunRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Context for `id`, created on first use by either the pipeline or the stream.
    pub fn context(&self, id: RunId) -> Arc<RunContext> {
        let mut inner = lock(&self.inner);
        if let Some(existing) = inner.runs.get(&id) {
            return existing.clone();
        }
        let context = Arc::new(RunContext::new(id));
        inner.runs.insert(id, context.clone());
        inner.order.push_back(id);
        self.evict(&mut inner);
        context
    }

    pub fn get(&self, id: RunId) -> Option<Arc<RunContext>> {
        lock(&self.inner).runs.get(&id).cloned()
    }

    pub fn snapshot(&self, id: RunId) -> Option<ProgressState> {
        self.get(id).map(|context| context.snapshot())
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the report written by a run; it becomes the process-wide latest.
    pub fn record_report(&self, id: RunId, path: PathBuf) {
        if let Some(context) = self.get(id) {
            context.set_report_path(path.clone());
        }
        lock(&self.inner).last_report = Some(path);
    }

    pub fn last_report(&self) -> Option<PathBuf> {
        lock(&self.inner).last_report.clone()
    }

    fn evict(&self, inner: &mut RegistryInner) {
        while inner.runs.len() > self.capacity {
            // Oldest run that is not currently executing; the newest is never evicted.
            let candidates = inner.order.len().saturating_sub(1);
            let Some(pos) = inner
                .order
                .iter()
                .take(candidates)
                .position(|id| inner.runs.get(id).is_some_and(|run| !run.is_active()))
            else {
                return;
            };
            if let Some(id) = inner.order.remove(pos) {
                inner.runs.remove(&id);
                miner_debug!("evicted run {}", id);
            }
        }
    }
}
