//! Dispatcher: a [`PriorityQueue`] behind the scheduler's lock, gated by an
//! [`AdmissionGate`].
//!
//! Uses `parking_lot::Mutex` as the single transactional lock every queue
//! operation runs under. Waking idle workers and running work stay with the
//! caller; the dispatcher only decides what may leave the queue.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{
    AdmissionGate, Priority, PriorityQueue, PriorityTaxonomy, RegisteredTaskSource,
    SchedulerError, SortKey, SortKeyFactory, TaskSource,
};

/// Priority queue shared between producers and workers.
pub struct Dispatcher<S: TaskSource> {
    keys: SortKeyFactory,
    queue: Mutex<PriorityQueue<S>>,
    gate: Arc<AdmissionGate>,
}

impl<S: TaskSource> Dispatcher<S> {
    /// Create a dispatcher over `taxonomy` with a fresh gate.
    #[must_use]
    pub fn new(taxonomy: Arc<PriorityTaxonomy>) -> Self {
        Self::with_queue(taxonomy, PriorityQueue::new())
    }

    /// Create a dispatcher that adopts `queue` (e.g. one with flush on
    /// destroy enabled).
    #[must_use]
    pub fn with_queue(taxonomy: Arc<PriorityTaxonomy>, queue: PriorityQueue<S>) -> Self {
        Self {
            keys: SortKeyFactory::new(taxonomy),
            queue: Mutex::new(queue),
            gate: Arc::new(AdmissionGate::new()),
        }
    }

    /// Taxonomy keys are built from.
    #[must_use]
    pub const fn taxonomy(&self) -> &Arc<PriorityTaxonomy> {
        self.keys.taxonomy()
    }

    /// Gate fences should be raised on to affect this dispatcher.
    #[must_use]
    pub const fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Queue `task_source` at `priority` and return the key it got.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PriorityOutOfRange`] if `priority` is not a
    /// configured level.
    pub fn push(&self, task_source: Arc<S>, priority: Priority) -> Result<SortKey, SchedulerError> {
        let sort_key = self.keys.try_make(priority)?;
        self.queue
            .lock()
            .push(RegisteredTaskSource::new(task_source), sort_key);
        Ok(sort_key)
    }

    /// Queue `task_source` at the taxonomy's default priority.
    pub fn push_default(&self, task_source: Arc<S>) -> SortKey {
        let sort_key = self.keys.make_default();
        self.queue
            .lock()
            .push(RegisteredTaskSource::new(task_source), sort_key);
        sort_key
    }

    /// Pop the highest-priority source if the gate admits it.
    ///
    /// Best-effort is the lowest class, so when the top is refused nothing
    /// below it would be admitted either.
    pub fn next_admitted(&self) -> Option<RegisteredTaskSource<S>> {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            return None;
        }
        let sort_key = *queue.peek_key();
        if !self.gate.admits(&sort_key) {
            tracing::trace!(
                priority = sort_key.priority().level(),
                "top task source held back by an execution fence"
            );
            return None;
        }
        let task_source = queue.pop();
        drop(queue);
        tracing::trace!(
            priority = ?self.taxonomy().trace_priority(sort_key.priority()),
            sequence = sort_key.sequence(),
            "task source admitted"
        );
        Some(task_source)
    }

    /// Withdraw `task_source`. `None` if a worker already took it.
    pub fn cancel(&self, task_source: &S) -> Option<RegisteredTaskSource<S>> {
        self.queue.lock().remove(task_source)
    }

    /// Move `task_source` to `priority`. It queues behind sources of that
    /// priority that were keyed earlier. Returns `Ok(false)` if it is no
    /// longer queued.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PriorityOutOfRange`] if `priority` is not a
    /// configured level.
    pub fn reprioritize(
        &self,
        task_source: &S,
        priority: Priority,
    ) -> Result<bool, SchedulerError> {
        let sort_key = self.keys.try_make(priority)?;
        Ok(self.queue.lock().update_key(task_source, sort_key))
    }

    /// Number of queued sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Queued sources in foreground classes.
    #[must_use]
    pub fn num_foreground(&self) -> usize {
        self.queue.lock().num_foreground()
    }

    /// Queued background sources.
    #[must_use]
    pub fn num_background(&self) -> usize {
        self.queue.lock().num_background()
    }

    /// Exchange the queued contents with `other` under the lock, e.g. to hand a
    /// batch to another thread in one step. Both queues keep their own
    /// flush-on-destroy mode.
    pub fn swap_queue(&self, other: &mut PriorityQueue<S>) {
        self.queue.lock().swap_contents(other);
    }
}

impl<S: TaskSource> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queue", &*self.queue.lock())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
