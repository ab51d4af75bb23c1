//! # Prometheus Task Scheduler
//!
//! The in-process priority scheduling core of the Prometheus AI Platform.
//!
//! A pool of pending units of work ("task sources") is kept in an intrusive
//! max-heap keyed by a priority-derived [`SortKey`](core::SortKey). Worker
//! threads repeatedly extract the most urgent source in O(log n), while
//! producers may re-prioritize or cancel any queued source by identity, also in
//! O(log n). Above the queue, execution fences temporarily stop new work of a
//! given class from being admitted.
//!
//! ## Components
//!
//! - **Priority taxonomy**: how many levels exist, the default level, and the
//!   injected priority to thread-class and priority to tracing-code mappings
//! - **Sort keys**: immutable, totally ordered; equal priorities dequeue in
//!   creation order
//! - **Priority queue**: arena-indexed heap whose entries write a
//!   generation-checked back-reference into their task source
//! - **Execution fences**: RAII guards that reference-count a shared
//!   admission gate
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use prometheus_task_scheduler::core::{
//!     BestEffortExecutionFence, Dispatcher, Priority, PriorityTaxonomy, Sequence, TaskSource,
//! };
//!
//! let dispatcher = Dispatcher::new(Arc::new(PriorityTaxonomy::default()));
//!
//! let background = Arc::new(Sequence::new());
//! background.push_task(|| println!("cleanup"));
//! dispatcher.push(Arc::clone(&background), Priority::BEST_EFFORT)?;
//!
//! {
//!     let _fence = BestEffortExecutionFence::with_gate(dispatcher.gate().clone());
//!     assert!(dispatcher.next_admitted().is_none());
//! }
//!
//! let mut admitted = dispatcher.next_admitted().expect("fence is down");
//! let source = admitted.take();
//! while let Some(task) = source.take_next_runnable() {
//!     task();
//! }
//! # Ok::<(), prometheus_task_scheduler::core::SchedulerError>(())
//! ```
//!
//! The queue itself has no lock: [`Dispatcher`](core::Dispatcher) shows the
//! intended discipline, with every queue operation under one
//! `parking_lot::Mutex`. Waking idle workers, delayed tasks and trace
//! serialization belong to the embedding scheduler.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling primitives.
pub mod core;
/// Configuration models for the taxonomy and queue.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
