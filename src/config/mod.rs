//! Configuration models for the priority taxonomy and queue behavior.

pub mod scheduler;

pub use scheduler::{QueueConfig, SchedulerConfig, TaxonomyConfig};
