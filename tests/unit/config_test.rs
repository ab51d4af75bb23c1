//! Tests for configuration validation

use prometheus_task_scheduler::config::{QueueConfig, SchedulerConfig, TaxonomyConfig};
use prometheus_task_scheduler::core::{Priority, SchedulerError};

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig {
        taxonomy: TaxonomyConfig {
            priority_count: 8,
            default_priority: 7,
        },
        queue: QueueConfig::default(),
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_too_many_priorities() {
    let invalid = SchedulerConfig {
        taxonomy: TaxonomyConfig {
            priority_count: 9,
            default_priority: 0,
        },
        queue: QueueConfig::default(),
    };
    assert_eq!(
        invalid.validate(),
        Err(SchedulerError::TooManyPriorities { count: 9, max: 8 })
    );
}

#[test]
fn test_scheduler_config_default_out_of_range() {
    let invalid = SchedulerConfig {
        taxonomy: TaxonomyConfig {
            priority_count: 2,
            default_priority: 2,
        },
        queue: QueueConfig::default(),
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "taxonomy": {
            "priority_count": 4,
            "default_priority": 2
        },
        "queue": {
            "flush_on_destroy": true
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.taxonomy.priority_count, 4);
    assert!(config.queue.flush_on_destroy);

    let taxonomy = config.taxonomy().unwrap();
    assert_eq!(taxonomy.default_priority(), Priority::new(2));
}

#[test]
fn test_scheduler_config_from_partial_json() {
    let config = SchedulerConfig::from_json_str(r#"{ "queue": {} }"#).unwrap();
    assert_eq!(config, SchedulerConfig::default());
}

#[test]
fn test_scheduler_config_from_bad_json() {
    let result = SchedulerConfig::from_json_str("{ not json");
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_scheduler_config_json_rejects_invalid_bounds() {
    let json = r#"{ "taxonomy": { "priority_count": 1, "default_priority": 1 } }"#;
    assert!(SchedulerConfig::from_json_str(json).is_err());
}

#[test]
fn test_scheduler_config_round_trips_through_json() {
    let config = SchedulerConfig {
        taxonomy: TaxonomyConfig {
            priority_count: 6,
            default_priority: 3,
        },
        queue: QueueConfig {
            flush_on_destroy: true,
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(SchedulerConfig::from_json_str(&json).unwrap(), config);
}
