//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Most of these mirror a fatal precondition: the panicking constructors report
/// the same condition through a panic, the `try_*` constructors return it here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The taxonomy asks for more priority levels than the hard ceiling.
    #[error("priority count {count} exceeds the maximum of {max}")]
    TooManyPriorities {
        /// Requested number of priority levels.
        count: u8,
        /// Hard ceiling on priority levels.
        max: u8,
    },
    /// The default priority does not name a configured level.
    #[error("default priority {default} is outside the range [0, {count})")]
    DefaultPriorityOutOfRange {
        /// Requested default priority.
        default: u8,
        /// Configured number of priority levels.
        count: u8,
    },
    /// A priority does not name a configured level.
    #[error("priority {priority} is outside the range [0, {count})")]
    PriorityOutOfRange {
        /// Offending priority.
        priority: u8,
        /// Configured number of priority levels.
        count: u8,
    },
    /// A fence was requested before any execution gate was installed.
    #[error("no execution gate is installed")]
    GateNotInstalled,
    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
