//! Tests for priority types and utility functions

use prometheus_task_scheduler::core::{
    default_thread_class, default_trace_priority, Priority, ThreadClass, TracePriority,
};
use prometheus_task_scheduler::util::init_tracing;

#[test]
fn test_priority_ordering() {
    assert!(Priority::USER_BLOCKING > Priority::USER_VISIBLE);
    assert!(Priority::USER_VISIBLE > Priority::BEST_EFFORT);
    assert!(Priority::BEST_EFFORT.is_best_effort());
    assert!(!Priority::USER_VISIBLE.is_best_effort());
}

#[test]
fn test_priority_display() {
    assert_eq!(Priority::new(4).to_string(), "P4");
}

#[test]
fn test_priority_serializes_as_level() {
    assert_eq!(serde_json::to_string(&Priority::USER_BLOCKING).unwrap(), "2");
    let parsed: Priority = serde_json::from_str("1").unwrap();
    assert_eq!(parsed, Priority::USER_VISIBLE);
}

#[test]
fn test_default_mappings_are_total() {
    for level in 0..=u8::MAX {
        let priority = Priority::new(level);
        let _ = default_thread_class(priority);
        let _ = default_trace_priority(priority);
    }
    assert_eq!(default_thread_class(Priority::new(200)), ThreadClass::Default);
    assert_eq!(default_trace_priority(Priority::new(200)), TracePriority::Control);
}

#[test]
fn test_trace_priority_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&TracePriority::BestEffort).unwrap(),
        "\"best_effort\""
    );
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
