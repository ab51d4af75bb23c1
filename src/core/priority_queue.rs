//! Intrusive priority queue of task sources.
//!
//! The queue has no lock of its own. The owning scheduler serializes every
//! call (see [`Dispatcher`](crate::core::Dispatcher)), so from the queue's
//! point of view all operations are sequential and none of them block.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::core::{
    HeapHandle, IntrusiveHeap, RegisteredTaskSource, SortKey, TaskSource, ThreadClass,
};

/// A queued task source and the key that positions it. Neither is reachable
/// mutably from outside the queue, so callers cannot disturb heap order or
/// detach a queued source.
struct TaskSourceAndSortKey<S: TaskSource> {
    task_source: RegisteredTaskSource<S>,
    sort_key: SortKey,
}

impl<S: TaskSource> TaskSourceAndSortKey<S> {
    fn set_heap_handle(&self, handle: HeapHandle) {
        if let Some(task_source) = self.task_source.get() {
            task_source.set_heap_handle(handle);
        }
    }

    fn owns(&self, task_source: &S) -> bool {
        self.task_source.is(task_source)
    }

    /// Hand the source back to the caller with its back-reference cleared.
    fn into_task_source(self) -> RegisteredTaskSource<S> {
        if let Some(task_source) = self.task_source.get() {
            task_source.clear_heap_handle();
        }
        self.task_source
    }
}

impl<S: TaskSource> PartialEq for TaskSourceAndSortKey<S> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key == other.sort_key
    }
}

impl<S: TaskSource> Eq for TaskSourceAndSortKey<S> {}

impl<S: TaskSource> PartialOrd for TaskSourceAndSortKey<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: TaskSource> Ord for TaskSourceAndSortKey<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key.cmp(&other.sort_key)
    }
}

/// Max-heap of task sources keyed by [`SortKey`], with O(log n) removal and
/// re-keying by identity and per-[`ThreadClass`] counts of queued sources.
pub struct PriorityQueue<S: TaskSource> {
    container: IntrusiveHeap<TaskSourceAndSortKey<S>>,
    num_task_sources: [usize; ThreadClass::COUNT],
    flush_on_destroy: bool,
}

impl<S: TaskSource> Default for PriorityQueue<S> {
    fn default() -> Self {
        Self {
            container: IntrusiveHeap::new(),
            num_task_sources: [0; ThreadClass::COUNT],
            flush_on_destroy: false,
        }
    }
}

impl<S: TaskSource> PriorityQueue<S> {
    /// Create an empty queue that discards leftovers on drop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `task_source` positioned by `sort_key`.
    ///
    /// The source must not be queued anywhere else.
    pub fn push(&mut self, task_source: RegisteredTaskSource<S>, sort_key: SortKey) {
        assert!(task_source.is_valid(), "pushed an already-taken task source");
        debug_assert!(
            task_source
                .get()
                .is_some_and(|source| !source.heap_handle().is_valid()),
            "pushed task source is already queued"
        );
        let handle = self.container.insert(TaskSourceAndSortKey {
            task_source,
            sort_key,
        });
        if let Some(entry) = self.container.get(handle) {
            entry.set_heap_handle(handle);
        }
        self.increment(sort_key.thread_class());
        tracing::trace!(
            priority = sort_key.priority().level(),
            sequence = sort_key.sequence(),
            len = self.len(),
            "task source pushed"
        );
    }

    /// Key of the next source to pop.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    #[must_use]
    pub fn peek_key(&self) -> &SortKey {
        match self.container.top() {
            Some(entry) => &entry.sort_key,
            None => panic!("PriorityQueue::peek_key called on an empty queue"),
        }
    }

    /// Next source to pop.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    #[must_use]
    pub fn peek_task_source(&self) -> &RegisteredTaskSource<S> {
        match self.container.top() {
            Some(entry) => &entry.task_source,
            None => panic!("PriorityQueue::peek_task_source called on an empty queue"),
        }
    }

    /// Next source to pop, shared. Work is taken from it through
    /// [`TaskSource`]; the ownership handle itself never leaves the queue
    /// until [`pop`](Self::pop) or [`remove`](Self::remove).
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    #[must_use]
    pub fn peek_source(&self) -> &Arc<S> {
        match self.container.top().and_then(|entry| entry.task_source.get()) {
            Some(task_source) => task_source,
            None => panic!("PriorityQueue::peek_source called on an empty queue"),
        }
    }

    /// Remove and return the source with the greatest key.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn pop(&mut self) -> RegisteredTaskSource<S> {
        let Some(entry) = self.container.pop() else {
            panic!("PriorityQueue::pop called on an empty queue");
        };
        self.decrement(entry.sort_key.thread_class());
        tracing::trace!(
            priority = entry.sort_key.priority().level(),
            len = self.len(),
            "task source popped"
        );
        entry.into_task_source()
    }

    /// Remove `task_source` if it is queued here.
    ///
    /// Returns `None` when the source has already been popped or removed, or
    /// was never queued here; callers racing a worker may see either outcome.
    pub fn remove(&mut self, task_source: &S) -> Option<RegisteredTaskSource<S>> {
        let handle = self.locate(task_source)?;
        let entry = self.container.remove(handle)?;
        self.decrement(entry.sort_key.thread_class());
        tracing::trace!(len = self.len(), "task source removed");
        Some(entry.into_task_source())
    }

    /// Re-key `task_source` in place. Does nothing and returns `false` if the
    /// source is not queued here.
    pub fn update_key(&mut self, task_source: &S, sort_key: SortKey) -> bool {
        let Some(handle) = self.locate(task_source) else {
            return false;
        };
        let Some(old_key) = self
            .container
            .update(handle, |entry| std::mem::replace(&mut entry.sort_key, sort_key))
        else {
            return false;
        };
        self.decrement(old_key.thread_class());
        self.increment(sort_key.thread_class());
        tracing::trace!(
            from = old_key.priority().level(),
            to = sort_key.priority().level(),
            "task source re-keyed"
        );
        true
    }

    /// Whether no source is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Number of queued sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.container.len()
    }

    /// Number of queued sources whose key maps to `thread_class`.
    #[must_use]
    pub const fn num_task_sources(&self, thread_class: ThreadClass) -> usize {
        self.num_task_sources[thread_class.index()]
    }

    /// Number of queued sources in any non-background class.
    #[must_use]
    pub fn num_foreground(&self) -> usize {
        ThreadClass::ALL
            .iter()
            .filter(|class| !class.is_background())
            .map(|class| self.num_task_sources(*class))
            .sum()
    }

    /// Number of queued background sources.
    #[must_use]
    pub const fn num_background(&self) -> usize {
        self.num_task_sources(ThreadClass::Background)
    }

    /// Run whatever is left in the queue when it is dropped instead of
    /// discarding it.
    ///
    /// # Panics
    ///
    /// Panics if already enabled.
    pub fn enable_flush_on_destroy(&mut self) {
        assert!(!self.flush_on_destroy, "flush on destroy is already enabled");
        self.flush_on_destroy = true;
    }

    /// Whether leftovers run on drop.
    #[must_use]
    pub const fn is_flush_on_destroy_enabled(&self) -> bool {
        self.flush_on_destroy
    }

    /// Exchange contents, counters and teardown mode with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        self.swap_contents(other);
        std::mem::swap(&mut self.flush_on_destroy, &mut other.flush_on_destroy);
    }

    /// Exchange contents and counters with `other`; each queue keeps its own
    /// teardown mode.
    pub(crate) fn swap_contents(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.container, &mut other.container);
        std::mem::swap(&mut self.num_task_sources, &mut other.num_task_sources);
    }

    /// Handle for `task_source` if it is queued here.
    fn locate(&self, task_source: &S) -> Option<HeapHandle> {
        let handle = task_source.heap_handle();
        if !handle.is_valid() {
            return None;
        }
        let entry = self.container.get(handle)?;
        if entry.owns(task_source) {
            Some(handle)
        } else {
            tracing::trace!(
                index = handle.index(),
                "heap handle resolves to a different task source; treating as not queued"
            );
            None
        }
    }

    fn increment(&mut self, thread_class: ThreadClass) {
        self.num_task_sources[thread_class.index()] += 1;
    }

    fn decrement(&mut self, thread_class: ThreadClass) {
        let count = &mut self.num_task_sources[thread_class.index()];
        assert!(
            *count > 0,
            "{thread_class:?} counter out of sync with the queue contents"
        );
        *count -= 1;
    }

    fn flush(&mut self) {
        let mut flushed = 0_usize;
        while !self.is_empty() {
            let source = self.pop().take();
            while let Some(runnable) = source.take_next_runnable() {
                runnable();
            }
            flushed += 1;
        }
        tracing::debug!(flushed, "flushed task sources on queue teardown");
    }
}

impl<S: TaskSource> Drop for PriorityQueue<S> {
    fn drop(&mut self) {
        if self.flush_on_destroy {
            self.flush();
            return;
        }
        let discarded = self.container.len();
        for entry in self.container.drain_unordered() {
            drop(entry.into_task_source());
        }
        if discarded > 0 {
            tracing::debug!(discarded, "discarded task sources on queue teardown");
        }
    }
}

impl<S: TaskSource> fmt::Debug for PriorityQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.len())
            .field("num_task_sources", &self.num_task_sources)
            .field("flush_on_destroy", &self.flush_on_destroy)
            .finish_non_exhaustive()
    }
}
