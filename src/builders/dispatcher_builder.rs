//! Builders turning a [`SchedulerConfig`] into a taxonomy, queue and dispatcher.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{
    Dispatcher, PrioritySettings, PriorityQueue, PriorityTaxonomy, SchedulerError, TaskSource,
    ThreadClassMapping, TracePriorityMapping,
};

/// Build the taxonomy described by `cfg`, using the supplied mappings in place
/// of the defaults when given.
///
/// # Errors
///
/// Returns the validation error for out-of-range bounds.
pub fn build_taxonomy(
    cfg: &SchedulerConfig,
    thread_class_mapping: Option<ThreadClassMapping>,
    trace_mapping: Option<TracePriorityMapping>,
) -> Result<PriorityTaxonomy, SchedulerError> {
    let defaults = cfg.taxonomy.to_settings();
    PriorityTaxonomy::try_new(PrioritySettings {
        thread_class_mapping: thread_class_mapping.unwrap_or(defaults.thread_class_mapping),
        trace_mapping: trace_mapping.unwrap_or(defaults.trace_mapping),
        ..defaults
    })
}

/// Build an empty queue with the teardown mode `cfg` asks for.
#[must_use]
pub fn build_queue<S: TaskSource>(cfg: &SchedulerConfig) -> PriorityQueue<S> {
    let mut queue = PriorityQueue::new();
    if cfg.queue.flush_on_destroy {
        queue.enable_flush_on_destroy();
    }
    queue
}

/// Validate `cfg` and build a dispatcher from it with the default mappings.
///
/// # Errors
///
/// Returns the validation error for out-of-range bounds.
pub fn build_dispatcher<S: TaskSource>(
    cfg: &SchedulerConfig,
) -> Result<Dispatcher<S>, SchedulerError> {
    let taxonomy = Arc::new(build_taxonomy(cfg, None, None)?);
    tracing::info!(
        priority_count = taxonomy.priority_count(),
        flush_on_destroy = cfg.queue.flush_on_destroy,
        "dispatcher built from configuration"
    );
    Ok(Dispatcher::with_queue(taxonomy, build_queue(cfg)))
}
