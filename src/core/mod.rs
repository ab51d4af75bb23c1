//! Core scheduling primitives: priorities, sort keys, the intrusive priority
//! queue and execution fences.

pub mod error;
pub mod priority;
pub mod sort_key;
pub mod heap;
pub mod task_source;
pub mod priority_queue;
pub mod fence;
pub mod dispatcher;

pub use error::{AppResult, SchedulerError};
pub use priority::{
    default_thread_class, default_trace_priority, Priority, PrioritySettings, PriorityTaxonomy,
    ThreadClass, ThreadClassMapping, TracePriority, TracePriorityMapping,
};
pub use sort_key::{SortKey, SortKeyFactory};
pub use heap::{HeapHandle, HeapHandleCell, IntrusiveHeap};
pub use task_source::{RegisteredTaskSource, Runnable, Sequence, TaskSource};
pub use priority_queue::PriorityQueue;
pub use fence::{
    current_gate, install_gate, uninstall_gate, AdmissionGate, BestEffortExecutionFence,
    ExecutionGate, ThreadPoolExecutionFence,
};
pub use dispatcher::Dispatcher;
