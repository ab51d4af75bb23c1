//! Priority levels, thread classes and the taxonomy that maps between them.
//!
//! The embedding scheduler decides how many priority levels exist and how each
//! level is accounted for. A [`PriorityTaxonomy`] is built once from a
//! [`PrioritySettings`] value, validated at construction, and shared by
//! reference afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// A priority level. Numerically larger levels are more urgent; level 0 is
/// always the lowest ("best-effort") class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Work that can wait indefinitely.
    pub const BEST_EFFORT: Self = Self(0);
    /// Work whose result the user may notice but is not waiting on.
    pub const USER_VISIBLE: Self = Self(1);
    /// Work the user is actively waiting on.
    pub const USER_BLOCKING: Self = Self(2);

    /// Create a priority from its raw level.
    #[must_use]
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Raw level.
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Whether this is the lowest level, the one best-effort fences stop.
    #[must_use]
    pub const fn is_best_effort(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Admission-accounting class of the thread a priority runs on, in increasing
/// order of importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadClass {
    /// Least urgent; may be delayed by every other class.
    Background,
    /// Less important than the default class.
    Utility,
    /// Platform default.
    Default,
    /// User-visible presentation work.
    Presentation,
    /// Audio processing outside the realtime path.
    AudioProcessing,
    /// Low-latency, glitch-resistant audio.
    RealtimeAudio,
}

impl ThreadClass {
    /// Number of classes.
    pub const COUNT: usize = 6;

    /// All classes in increasing order of importance.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Background,
        Self::Utility,
        Self::Default,
        Self::Presentation,
        Self::AudioProcessing,
        Self::RealtimeAudio,
    ];

    /// Dense index usable for per-class counters.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether work of this class is accounted as background work.
    #[must_use]
    pub const fn is_background(self) -> bool {
        matches!(self, Self::Background)
    }
}

/// Priority code reported to tracing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracePriority {
    /// No mapping known.
    Unknown,
    /// Scheduler control work.
    Control,
    /// Highest regular priority.
    Highest,
    /// Very high priority.
    VeryHigh,
    /// High priority.
    High,
    /// Normal priority.
    Normal,
    /// Low priority.
    Low,
    /// Best-effort priority.
    BestEffort,
}

/// Maps a priority to the thread class used for admission accounting.
pub type ThreadClassMapping = fn(Priority) -> ThreadClass;

/// Maps a priority to the code reported to tracing.
pub type TracePriorityMapping = fn(Priority) -> TracePriority;

/// Thread class of the default taxonomy: best-effort work runs in the
/// background, user-visible work at utility class, everything above at the
/// platform default.
#[must_use]
pub const fn default_thread_class(priority: Priority) -> ThreadClass {
    match priority.level() {
        0 => ThreadClass::Background,
        1 => ThreadClass::Utility,
        _ => ThreadClass::Default,
    }
}

/// Reporting code of the default taxonomy.
#[must_use]
pub const fn default_trace_priority(priority: Priority) -> TracePriority {
    match priority.level() {
        0 => TracePriority::BestEffort,
        1 => TracePriority::Normal,
        2 => TracePriority::High,
        3 => TracePriority::VeryHigh,
        4 => TracePriority::Highest,
        _ => TracePriority::Control,
    }
}

/// Plain configuration value a [`PriorityTaxonomy`] is built from.
///
/// Every field has a default; override the ones that matter with struct update
/// syntax:
///
/// ```
/// use prometheus_task_scheduler::core::{Priority, PrioritySettings, PriorityTaxonomy};
///
/// let taxonomy = PriorityTaxonomy::new(PrioritySettings {
///     priority_count: 5,
///     default_priority: Priority::new(2),
///     ..PrioritySettings::default()
/// });
/// assert_eq!(taxonomy.priority_count(), 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PrioritySettings {
    /// Number of distinct priority levels.
    pub priority_count: u8,
    /// Level used when the caller does not pick one.
    pub default_priority: Priority,
    /// Priority to thread class.
    pub thread_class_mapping: ThreadClassMapping,
    /// Priority to tracing code.
    pub trace_mapping: TracePriorityMapping,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self {
            priority_count: 3,
            default_priority: Priority::USER_VISIBLE,
            thread_class_mapping: default_thread_class,
            trace_mapping: default_trace_priority,
        }
    }
}

impl PrioritySettings {
    /// Check the bounds the taxonomy relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::TooManyPriorities`] when `priority_count`
    /// exceeds [`PriorityTaxonomy::MAX_PRIORITIES`] and
    /// [`SchedulerError::DefaultPriorityOutOfRange`] when the default level is
    /// not below `priority_count`.
    pub const fn validate(&self) -> Result<(), SchedulerError> {
        if self.priority_count > PriorityTaxonomy::MAX_PRIORITIES {
            return Err(SchedulerError::TooManyPriorities {
                count: self.priority_count,
                max: PriorityTaxonomy::MAX_PRIORITIES,
            });
        }
        if self.default_priority.level() >= self.priority_count {
            return Err(SchedulerError::DefaultPriorityOutOfRange {
                default: self.default_priority.level(),
                count: self.priority_count,
            });
        }
        Ok(())
    }
}

/// Validated, immutable priority configuration shared by every producer.
#[derive(Debug, Clone)]
pub struct PriorityTaxonomy {
    settings: PrioritySettings,
}

impl Default for PriorityTaxonomy {
    fn default() -> Self {
        Self {
            settings: PrioritySettings::default(),
        }
    }
}

impl PriorityTaxonomy {
    /// Hard ceiling on the number of priority levels.
    pub const MAX_PRIORITIES: u8 = 8;

    /// Build a taxonomy, treating invalid bounds as a programming error.
    ///
    /// # Panics
    ///
    /// Panics if `settings` fails [`PrioritySettings::validate`].
    #[must_use]
    pub fn new(settings: PrioritySettings) -> Self {
        match Self::try_new(settings) {
            Ok(taxonomy) => taxonomy,
            Err(err) => panic!("invalid priority taxonomy: {err}"),
        }
    }

    /// Build a taxonomy, reporting invalid bounds as an error.
    ///
    /// # Errors
    ///
    /// See [`PrioritySettings::validate`].
    pub fn try_new(settings: PrioritySettings) -> Result<Self, SchedulerError> {
        settings.validate()?;
        tracing::debug!(
            priority_count = settings.priority_count,
            default_priority = settings.default_priority.level(),
            "priority taxonomy configured"
        );
        Ok(Self { settings })
    }

    /// Number of priority levels.
    #[must_use]
    pub const fn priority_count(&self) -> u8 {
        self.settings.priority_count
    }

    /// Level used absent an explicit choice.
    #[must_use]
    pub const fn default_priority(&self) -> Priority {
        self.settings.default_priority
    }

    /// Most urgent configured level.
    #[must_use]
    pub const fn highest_priority(&self) -> Priority {
        Priority::new(self.settings.priority_count.saturating_sub(1))
    }

    /// Whether `priority` names a configured level.
    #[must_use]
    pub const fn contains(&self, priority: Priority) -> bool {
        priority.level() < self.settings.priority_count
    }

    /// Check that `priority` names a configured level.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PriorityOutOfRange`] otherwise.
    pub const fn check(&self, priority: Priority) -> Result<(), SchedulerError> {
        if self.contains(priority) {
            Ok(())
        } else {
            Err(SchedulerError::PriorityOutOfRange {
                priority: priority.level(),
                count: self.settings.priority_count,
            })
        }
    }

    /// Thread class `priority` is accounted under.
    ///
    /// # Panics
    ///
    /// Panics if `priority` is out of range.
    #[must_use]
    pub fn thread_class(&self, priority: Priority) -> ThreadClass {
        self.assert_contains(priority);
        (self.settings.thread_class_mapping)(priority)
    }

    /// Tracing code reported for `priority`.
    ///
    /// # Panics
    ///
    /// Panics if `priority` is out of range.
    #[must_use]
    pub fn trace_priority(&self, priority: Priority) -> TracePriority {
        self.assert_contains(priority);
        (self.settings.trace_mapping)(priority)
    }

    /// Every configured level, lowest first.
    pub fn priorities(&self) -> impl DoubleEndedIterator<Item = Priority> {
        (0..self.settings.priority_count).map(Priority::new)
    }

    fn assert_contains(&self, priority: Priority) {
        if let Err(err) = self.check(priority) {
            panic!("{err}");
        }
    }
}
