//! Execution fences: scoped gates that stop new work from being admitted.
//!
//! A fence brackets exactly one begin/end pair on a shared [`ExecutionGate`].
//! Fences hold no counter of their own; the gate reference-counts them so any
//! number of fences of the same class can be up at once. Fences only affect
//! future admission. Work that already left the queue keeps running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{SchedulerError, SortKey};

/// Scheduler-wide admission gate driven by execution fences.
///
/// Implementations must tolerate concurrent calls from any thread.
pub trait ExecutionGate: Send + Sync {
    /// A fence stopping all new work went up.
    fn begin_fence(&self);
    /// A fence stopping all new work came down.
    fn end_fence(&self);
    /// A fence stopping new best-effort work went up.
    fn begin_best_effort_fence(&self);
    /// A fence stopping new best-effort work came down.
    fn end_best_effort_fence(&self);
}

/// Reference-counted [`ExecutionGate`] that answers admission queries.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    fences: AtomicUsize,
    best_effort_fences: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate with no fences up.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fences: AtomicUsize::new(0),
            best_effort_fences: AtomicUsize::new(0),
        }
    }

    /// Whether a fence stopping all work is up.
    #[must_use]
    pub fn is_fenced(&self) -> bool {
        self.fences.load(Ordering::Acquire) > 0
    }

    /// Whether a fence stopping best-effort work is up.
    #[must_use]
    pub fn is_best_effort_fenced(&self) -> bool {
        self.best_effort_fences.load(Ordering::Acquire) > 0
    }

    /// Number of live fences stopping all work.
    #[must_use]
    pub fn fence_count(&self) -> usize {
        self.fences.load(Ordering::Acquire)
    }

    /// Number of live fences stopping best-effort work.
    #[must_use]
    pub fn best_effort_fence_count(&self) -> usize {
        self.best_effort_fences.load(Ordering::Acquire)
    }

    /// Whether work keyed by `sort_key` may be admitted right now.
    #[must_use]
    pub fn admits(&self, sort_key: &SortKey) -> bool {
        if self.is_fenced() {
            return false;
        }
        !(sort_key.priority().is_best_effort() && self.is_best_effort_fenced())
    }

    fn release(counter: &AtomicUsize, class: &str) {
        let previous = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            count.checked_sub(1)
        });
        assert!(previous.is_ok(), "ended a {class} fence that was never begun");
    }
}

impl ExecutionGate for AdmissionGate {
    fn begin_fence(&self) {
        let count = self.fences.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(count, "execution fence up");
    }

    fn end_fence(&self) {
        Self::release(&self.fences, "thread pool");
        tracing::debug!(count = self.fence_count(), "execution fence down");
    }

    fn begin_best_effort_fence(&self) {
        let count = self.best_effort_fences.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(count, "best-effort execution fence up");
    }

    fn end_best_effort_fence(&self) {
        Self::release(&self.best_effort_fences, "best-effort");
        tracing::debug!(
            count = self.best_effort_fence_count(),
            "best-effort execution fence down"
        );
    }
}

static CURRENT_GATE: RwLock<Option<Arc<dyn ExecutionGate>>> = RwLock::new(None);

/// Install `gate` as the process-wide gate used by fences built without an
/// explicit gate. Returns the previously installed gate.
///
/// Install before the first such fence and uninstall only after the last one
/// is gone; fences already up keep ending on the gate they began on.
pub fn install_gate(gate: Arc<dyn ExecutionGate>) -> Option<Arc<dyn ExecutionGate>> {
    CURRENT_GATE.write().replace(gate)
}

/// Remove the process-wide gate, returning it.
pub fn uninstall_gate() -> Option<Arc<dyn ExecutionGate>> {
    CURRENT_GATE.write().take()
}

/// The process-wide gate, if one is installed.
#[must_use]
pub fn current_gate() -> Option<Arc<dyn ExecutionGate>> {
    CURRENT_GATE.read().clone()
}

fn require_gate() -> Result<Arc<dyn ExecutionGate>, SchedulerError> {
    current_gate().ok_or(SchedulerError::GateNotInstalled)
}

fn expect_gate() -> Arc<dyn ExecutionGate> {
    match require_gate() {
        Ok(gate) => gate,
        Err(err) => panic!("cannot raise an execution fence: {err}"),
    }
}

/// Stops all new work from being admitted while alive.
#[must_use = "the fence comes down as soon as it is dropped"]
pub struct ThreadPoolExecutionFence {
    gate: Arc<dyn ExecutionGate>,
}

impl ThreadPoolExecutionFence {
    /// Raise a fence on the process-wide gate.
    ///
    /// # Panics
    ///
    /// Panics if no gate is installed.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_gate(expect_gate())
    }

    /// Raise a fence on the process-wide gate.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::GateNotInstalled`] if no gate is installed.
    pub fn try_new() -> Result<Self, SchedulerError> {
        require_gate().map(Self::with_gate)
    }

    /// Raise a fence on `gate`.
    pub fn with_gate(gate: Arc<dyn ExecutionGate>) -> Self {
        gate.begin_fence();
        Self { gate }
    }
}

impl Drop for ThreadPoolExecutionFence {
    fn drop(&mut self) {
        self.gate.end_fence();
    }
}

/// Stops new best-effort work from being admitted while alive.
#[must_use = "the fence comes down as soon as it is dropped"]
pub struct BestEffortExecutionFence {
    gate: Arc<dyn ExecutionGate>,
}

impl BestEffortExecutionFence {
    /// Raise a fence on the process-wide gate.
    ///
    /// # Panics
    ///
    /// Panics if no gate is installed.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_gate(expect_gate())
    }

    /// Raise a fence on the process-wide gate.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::GateNotInstalled`] if no gate is installed.
    pub fn try_new() -> Result<Self, SchedulerError> {
        require_gate().map(Self::with_gate)
    }

    /// Raise a fence on `gate`.
    pub fn with_gate(gate: Arc<dyn ExecutionGate>) -> Self {
        gate.begin_best_effort_fence();
        Self { gate }
    }
}

impl Drop for BestEffortExecutionFence {
    fn drop(&mut self) {
        self.gate.end_best_effort_fence();
    }
}
