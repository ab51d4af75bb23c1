//! Arena-indexed max-heap with stable handles.
//!
//! Entries live in arena slots that never move while occupied; the heap array
//! only stores slot indices. A [`HeapHandle`] names a slot together with the
//! slot's generation, so it stays valid across sifts and goes stale the moment
//! its entry leaves the heap. This gives O(log n) removal and re-keying of an
//! arbitrary entry without a search.

use std::sync::atomic::{AtomicU64, Ordering};

/// Locator for an entry of an [`IntrusiveHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapHandle {
    index: u32,
    generation: u32,
}

impl HeapHandle {
    /// Sentinel stored by task sources that are not queued.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
    };

    const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Whether this is not the sentinel. A valid handle may still be stale.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    /// Arena slot this handle points at.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    const fn to_bits(self) -> u64 {
        ((self.index as u64) << 32) | self.generation as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn from_bits(bits: u64) -> Self {
        Self {
            index: (bits >> 32) as u32,
            generation: bits as u32,
        }
    }
}

impl Default for HeapHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Back-reference storage a task source embeds.
///
/// The queue writes it on push and clears it when the source leaves. Reads and
/// writes are atomic so a source can be shared between threads; the queue only
/// touches it under the scheduler's lock.
#[derive(Debug)]
pub struct HeapHandleCell(AtomicU64);

impl HeapHandleCell {
    /// Create an empty cell.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(HeapHandle::INVALID.to_bits()))
    }

    /// Stored handle, [`HeapHandle::INVALID`] when not queued.
    #[must_use]
    pub fn get(&self) -> HeapHandle {
        HeapHandle::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Store `handle`.
    pub fn set(&self, handle: HeapHandle) {
        self.0.store(handle.to_bits(), Ordering::Release);
    }

    /// Reset to [`HeapHandle::INVALID`].
    pub fn clear(&self) {
        self.set(HeapHandle::INVALID);
    }
}

impl Default for HeapHandleCell {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    position: usize,
    value: Option<T>,
}

/// Max-heap over `T: Ord` whose entries can be addressed by [`HeapHandle`].
#[derive(Debug)]
pub struct IntrusiveHeap<T> {
    slots: Vec<Slot<T>>,
    order: Vec<u32>,
    free: Vec<u32>,
}

impl<T> Default for IntrusiveHeap<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T: Ord> IntrusiveHeap<T> {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the heap holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert `value` and return the handle that locates it until it leaves.
    ///
    /// # Panics
    ///
    /// Panics if the arena would need more than `u32::MAX - 1` slots.
    pub fn insert(&mut self, value: T) -> HeapHandle {
        let index = if let Some(index) = self.free.pop() {
            self.slots[index as usize].value = Some(value);
            index
        } else {
            let index = u32::try_from(self.slots.len())
                .ok()
                .filter(|index| *index != u32::MAX)
                .unwrap_or_else(|| panic!("IntrusiveHeap arena exhausted"));
            self.slots.push(Slot {
                generation: 0,
                position: 0,
                value: Some(value),
            });
            index
        };

        let position = self.order.len();
        self.order.push(index);
        self.slots[index as usize].position = position;
        self.sift_up(position);

        HeapHandle::new(index, self.slots[index as usize].generation)
    }

    /// Greatest entry.
    #[must_use]
    pub fn top(&self) -> Option<&T> {
        let index = *self.order.first()?;
        self.slots[index as usize].value.as_ref()
    }

    /// Remove and return the greatest entry.
    pub fn pop(&mut self) -> Option<T> {
        if self.order.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    /// Whether `handle` currently locates an entry.
    #[must_use]
    pub fn contains(&self, handle: HeapHandle) -> bool {
        self.slot_index(handle).is_some()
    }

    /// Entry located by `handle`, `None` if the handle is stale or invalid.
    #[must_use]
    pub fn get(&self, handle: HeapHandle) -> Option<&T> {
        let index = self.slot_index(handle)?;
        self.slots[index].value.as_ref()
    }

    /// Remove the entry located by `handle`.
    pub fn remove(&mut self, handle: HeapHandle) -> Option<T> {
        let index = self.slot_index(handle)?;
        let position = self.slots[index].position;
        Some(self.remove_at(position))
    }

    /// Apply `f` to the entry located by `handle`, then restore heap order.
    /// The handle stays valid.
    pub fn update<R>(&mut self, handle: HeapHandle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let index = self.slot_index(handle)?;
        let result = f(self.slots[index].value.as_mut()?);
        let position = self.slots[index].position;
        let position = self.sift_up(position);
        self.sift_down(position);
        Some(result)
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order
            .iter()
            .filter_map(|index| self.slots[*index as usize].value.as_ref())
    }

    /// Remove every entry in unspecified order, invalidating all handles.
    pub fn drain_unordered(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.order.len());
        for index in std::mem::take(&mut self.order) {
            values.extend(self.release_slot(index));
        }
        values
    }

    fn slot_index(&self, handle: HeapHandle) -> Option<usize> {
        if !handle.is_valid() {
            return None;
        }
        let index = handle.index as usize;
        let slot = self.slots.get(index)?;
        (slot.generation == handle.generation && slot.value.is_some()).then_some(index)
    }

    fn remove_at(&mut self, position: usize) -> T {
        let last = self.order.len() - 1;
        self.swap_positions(position, last);
        let index = self.order.pop().unwrap_or(u32::MAX);
        let value = self
            .release_slot(index)
            .unwrap_or_else(|| unreachable!("heap position {position} referenced a vacant slot"));
        if position < self.order.len() {
            let position = self.sift_up(position);
            self.sift_down(position);
        }
        value
    }

    fn release_slot(&mut self, index: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        value
    }

    fn value_at(&self, position: usize) -> Option<&T> {
        self.slots[self.order[position] as usize].value.as_ref()
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        self.slots[self.order[a] as usize].position = a;
        self.slots[self.order[b] as usize].position = b;
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.value_at(position) <= self.value_at(parent) {
                break;
            }
            self.swap_positions(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.order.len();
        loop {
            let left = 2 * position + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let largest = if right < len && self.value_at(right) > self.value_at(left) {
                right
            } else {
                left
            };
            if self.value_at(largest) <= self.value_at(position) {
                break;
            }
            self.swap_positions(position, largest);
            position = largest;
        }
    }
}
