//! Sort keys that position task sources in a [`PriorityQueue`](crate::core::PriorityQueue).

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde::Serialize;

use crate::core::{Priority, PriorityTaxonomy, SchedulerError, ThreadClass};

/// Immutable, totally ordered key attached to a queued task source.
///
/// Greater keys are dequeued first: a higher priority wins, and among equal
/// priorities the key with the smaller `sequence` (created earlier) wins. The
/// thread class is derived from the priority and only breaks ties between keys
/// that are otherwise identical.
///
/// Keys are only built by a [`PriorityTaxonomy`] or a [`SortKeyFactory`], so
/// every key names a configured level and that level's thread class. They
/// serialize for trace payloads but cannot be deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortKey {
    priority: Priority,
    thread_class: ThreadClass,
    sequence: u64,
}

impl SortKey {
    pub(crate) const fn from_parts(
        priority: Priority,
        thread_class: ThreadClass,
        sequence: u64,
    ) -> Self {
        Self {
            priority,
            thread_class,
            sequence,
        }
    }

    /// Priority level.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Thread class the priority maps to.
    #[must_use]
    pub const fn thread_class(&self) -> ThreadClass {
        self.thread_class
    }

    /// Creation sequence used as the tie-break between equal priorities.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| self.thread_class.cmp(&other.thread_class))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PriorityTaxonomy {
    /// Build a key for `priority` stamped with `sequence`.
    ///
    /// # Panics
    ///
    /// Panics if `priority` is out of range for this taxonomy.
    #[must_use]
    pub fn sort_key(&self, priority: Priority, sequence: u64) -> SortKey {
        SortKey::from_parts(priority, self.thread_class(priority), sequence)
    }

    /// Build a key for `priority`, reporting an out-of-range priority.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PriorityOutOfRange`] if `priority` is not a
    /// configured level.
    pub fn try_sort_key(
        &self,
        priority: Priority,
        sequence: u64,
    ) -> Result<SortKey, SchedulerError> {
        self.check(priority)?;
        Ok(self.sort_key(priority, sequence))
    }
}

/// Stamps sort keys with a monotonically increasing sequence so equal
/// priorities dequeue in creation order.
#[derive(Debug)]
pub struct SortKeyFactory {
    taxonomy: Arc<PriorityTaxonomy>,
    next_sequence: AtomicU64,
}

impl SortKeyFactory {
    /// Create a factory for keys of `taxonomy`.
    #[must_use]
    pub const fn new(taxonomy: Arc<PriorityTaxonomy>) -> Self {
        Self {
            taxonomy,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Taxonomy the keys are validated against.
    #[must_use]
    pub const fn taxonomy(&self) -> &Arc<PriorityTaxonomy> {
        &self.taxonomy
    }

    /// Next key for `priority`.
    ///
    /// # Panics
    ///
    /// Panics if `priority` is out of range for the taxonomy.
    #[must_use]
    pub fn make(&self, priority: Priority) -> SortKey {
        self.taxonomy.sort_key(priority, self.next_sequence())
    }

    /// Next key for `priority`, reporting an out-of-range priority.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PriorityOutOfRange`]; no sequence number is
    /// consumed in that case.
    pub fn try_make(&self, priority: Priority) -> Result<SortKey, SchedulerError> {
        self.taxonomy.check(priority)?;
        Ok(self.make(priority))
    }

    /// Next key at the taxonomy's default priority.
    #[must_use]
    pub fn make_default(&self) -> SortKey {
        self.make(self.taxonomy.default_priority())
    }

    fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, AtomicOrdering::Relaxed)
    }
}
