//! Task sources and the ownership handle that moves them in and out of queues.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{HeapHandle, HeapHandleCell};

/// A unit of work ready to run.
pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// Opaque unit of schedulable work held by a [`PriorityQueue`](crate::core::PriorityQueue).
///
/// Besides handing out work, a task source stores one back-reference written
/// by the queue. It is valid exactly while the source sits in a queue; the
/// source treats it as an opaque lookup key and never interprets it.
pub trait TaskSource: Send + Sync {
    /// Extract the next piece of work, `None` once drained.
    fn take_next_runnable(&self) -> Option<Runnable>;

    /// Stored back-reference, [`HeapHandle::INVALID`] when not queued.
    fn heap_handle(&self) -> HeapHandle;

    /// Store the back-reference issued on push.
    fn set_heap_handle(&self, handle: HeapHandle);

    /// Forget the back-reference.
    fn clear_heap_handle(&self);
}

/// FIFO task source: runnables are handed out in the order they were added.
#[derive(Default)]
pub struct Sequence {
    tasks: Mutex<VecDeque<Runnable>>,
    heap_handle: HeapHandleCell,
}

impl Sequence {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a runnable.
    pub fn push_task(&self, task: impl FnOnce() + Send + 'static) {
        self.tasks.lock().push_back(Box::new(task));
    }

    /// Number of runnables not yet handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether every runnable has been handed out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("pending", &self.len())
            .field("heap_handle", &self.heap_handle.get())
            .finish()
    }
}

impl TaskSource for Sequence {
    fn take_next_runnable(&self) -> Option<Runnable> {
        self.tasks.lock().pop_front()
    }

    fn heap_handle(&self) -> HeapHandle {
        self.heap_handle.get()
    }

    fn set_heap_handle(&self, handle: HeapHandle) {
        self.heap_handle.set(handle);
    }

    fn clear_heap_handle(&self) {
        self.heap_handle.clear();
    }
}

/// Exclusive, single-use ownership of a task source.
///
/// Whoever holds this value owns the source: the queue while it is queued,
/// the caller after a pop or remove. [`take`](Self::take) hands the source out
/// once; taking twice signals a double-ownership bug and panics.
pub struct RegisteredTaskSource<S> {
    task_source: Option<Arc<S>>,
}

impl<S> RegisteredTaskSource<S> {
    /// Take ownership of `task_source`.
    #[must_use]
    pub const fn new(task_source: Arc<S>) -> Self {
        Self {
            task_source: Some(task_source),
        }
    }

    /// Whether the source has not been taken yet.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.task_source.is_some()
    }

    /// Borrow the source if it has not been taken.
    #[must_use]
    pub const fn get(&self) -> Option<&Arc<S>> {
        self.task_source.as_ref()
    }

    /// Whether this handle owns exactly `task_source`.
    #[must_use]
    pub fn is(&self, task_source: &S) -> bool {
        self.task_source
            .as_ref()
            .is_some_and(|owned| std::ptr::eq(Arc::as_ptr(owned), task_source))
    }

    /// Extract the source, invalidating the handle.
    ///
    /// # Panics
    ///
    /// Panics if the source was already taken.
    pub fn take(&mut self) -> Arc<S> {
        match self.task_source.take() {
            Some(task_source) => task_source,
            None => panic!("RegisteredTaskSource::take called on an already-taken handle"),
        }
    }
}

impl<S> fmt::Debug for RegisteredTaskSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTaskSource")
            .field("task_source", &self.task_source.as_ref().map(Arc::as_ptr))
            .finish()
    }
}

impl<S> From<Arc<S>> for RegisteredTaskSource<S> {
    fn from(task_source: Arc<S>) -> Self {
        Self::new(task_source)
    }
}
