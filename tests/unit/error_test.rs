//! Tests for error types

use prometheus_task_scheduler::core::SchedulerError;

#[test]
fn test_too_many_priorities_error() {
    let err = SchedulerError::TooManyPriorities { count: 9, max: 8 };
    assert_eq!(format!("{}", err), "priority count 9 exceeds the maximum of 8");
}

#[test]
fn test_default_priority_out_of_range_error() {
    let err = SchedulerError::DefaultPriorityOutOfRange { default: 3, count: 3 };
    assert_eq!(format!("{}", err), "default priority 3 is outside the range [0, 3)");
}

#[test]
fn test_priority_out_of_range_error() {
    let err = SchedulerError::PriorityOutOfRange { priority: 5, count: 2 };
    assert_eq!(format!("{}", err), "priority 5 is outside the range [0, 2)");
}

#[test]
fn test_gate_not_installed_error() {
    let err = SchedulerError::GateNotInstalled;
    assert_eq!(format!("{}", err), "no execution gate is installed");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("bad json".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: bad json");
}
