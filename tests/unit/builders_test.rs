//! Tests for builder modules

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use prometheus_task_scheduler::builders::{build_dispatcher, build_queue, build_taxonomy};
use prometheus_task_scheduler::config::{QueueConfig, SchedulerConfig, TaxonomyConfig};
use prometheus_task_scheduler::core::{
    Dispatcher, Priority, PriorityQueue, Sequence, ThreadClass, TracePriority,
};

fn always_presentation(_: Priority) -> ThreadClass {
    ThreadClass::Presentation
}

fn always_unknown(_: Priority) -> TracePriority {
    TracePriority::Unknown
}

#[test]
fn test_build_taxonomy_defaults() {
    let taxonomy = build_taxonomy(&SchedulerConfig::default(), None, None).unwrap();
    assert_eq!(taxonomy.priority_count(), 3);
    assert_eq!(taxonomy.thread_class(Priority::BEST_EFFORT), ThreadClass::Background);
}

#[test]
fn test_build_taxonomy_injected_mappings() {
    let taxonomy = build_taxonomy(
        &SchedulerConfig::default(),
        Some(always_presentation),
        Some(always_unknown),
    )
    .unwrap();
    assert_eq!(taxonomy.thread_class(Priority::BEST_EFFORT), ThreadClass::Presentation);
    assert_eq!(taxonomy.trace_priority(Priority::USER_BLOCKING), TracePriority::Unknown);
}

#[test]
fn test_build_taxonomy_rejects_bounds() {
    let cfg = SchedulerConfig {
        taxonomy: TaxonomyConfig {
            priority_count: 0,
            default_priority: 0,
        },
        queue: QueueConfig::default(),
    };
    assert!(build_taxonomy(&cfg, None, None).is_err());
    assert!(build_dispatcher::<Sequence>(&cfg).is_err());
}

#[test]
fn test_build_queue_flush_mode() {
    let cfg = SchedulerConfig {
        queue: QueueConfig {
            flush_on_destroy: true,
        },
        ..SchedulerConfig::default()
    };
    let queue: PriorityQueue<Sequence> = build_queue(&cfg);
    assert!(queue.is_flush_on_destroy_enabled());

    let queue: PriorityQueue<Sequence> = build_queue(&SchedulerConfig::default());
    assert!(!queue.is_flush_on_destroy_enabled());
}

#[test]
fn test_build_dispatcher_flushes_on_drop() {
    let cfg = SchedulerConfig {
        queue: QueueConfig {
            flush_on_destroy: true,
        },
        ..SchedulerConfig::default()
    };
    let dispatcher: Dispatcher<Sequence> = build_dispatcher(&cfg).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(Sequence::new());
    let counter = Arc::clone(&ran);
    source.push_task(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    dispatcher.push(source, Priority::USER_VISIBLE).unwrap();

    drop(dispatcher);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
