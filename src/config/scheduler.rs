//! Scheduler configuration structures.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, Priority, PrioritySettings, PriorityTaxonomy, SchedulerError};

/// Environment variable overriding [`TaxonomyConfig::priority_count`].
pub const ENV_PRIORITY_COUNT: &str = "PROMETHEUS_PRIORITY_COUNT";
/// Environment variable overriding [`TaxonomyConfig::default_priority`].
pub const ENV_DEFAULT_PRIORITY: &str = "PROMETHEUS_DEFAULT_PRIORITY";
/// Environment variable overriding [`QueueConfig::flush_on_destroy`].
pub const ENV_FLUSH_ON_DESTROY: &str = "PROMETHEUS_FLUSH_ON_DESTROY";

/// Priority level layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Number of distinct priority levels.
    pub priority_count: u8,
    /// Level used when none is given.
    pub default_priority: u8,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        let settings = PrioritySettings::default();
        Self {
            priority_count: settings.priority_count,
            default_priority: settings.default_priority.level(),
        }
    }
}

impl TaxonomyConfig {
    /// Settings with the default mappings and these bounds.
    #[must_use]
    pub fn to_settings(&self) -> PrioritySettings {
        PrioritySettings {
            priority_count: self.priority_count,
            default_priority: Priority::new(self.default_priority),
            ..PrioritySettings::default()
        }
    }
}

/// Queue behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Run leftover work when the queue is dropped instead of discarding it.
    pub flush_on_destroy: bool,
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Priority level layout.
    pub taxonomy: TaxonomyConfig,
    /// Queue behavior.
    pub queue: QueueConfig,
}

impl SchedulerConfig {
    /// Validate taxonomy bounds.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy error describing the first violated bound.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        self.taxonomy.to_settings().validate()
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] on malformed JSON, or the
    /// validation error.
    pub fn from_json_str(input: &str) -> Result<Self, SchedulerError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| SchedulerError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not hold a valid configuration.
    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("reading scheduler config {}", path.display()))?;
        Self::from_json_str(&input)
            .with_context(|| format!("loading scheduler config {}", path.display()))
    }

    /// Build configuration from the process environment, after loading a
    /// `.env` file if one is present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, SchedulerError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!("ignoring unreadable .env file: {err}");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from `lookup`, which returns the value of a named
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for values that do not parse,
    /// or the validation error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SchedulerError> {
        let mut cfg = Self::default();
        if let Some(value) = lookup(ENV_PRIORITY_COUNT) {
            cfg.taxonomy.priority_count = parse_var(ENV_PRIORITY_COUNT, &value)?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_PRIORITY) {
            cfg.taxonomy.default_priority = parse_var(ENV_DEFAULT_PRIORITY, &value)?;
        }
        if let Some(value) = lookup(ENV_FLUSH_ON_DESTROY) {
            cfg.queue.flush_on_destroy = parse_var(ENV_FLUSH_ON_DESTROY, &value)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build the taxonomy these bounds describe, with the default mappings.
    ///
    /// # Errors
    ///
    /// Returns the validation error.
    pub fn taxonomy(&self) -> Result<PriorityTaxonomy, SchedulerError> {
        PriorityTaxonomy::try_new(self.taxonomy.to_settings())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SchedulerError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SchedulerError::InvalidConfig(format!("{name}={value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = SchedulerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.taxonomy.priority_count, 3);
        assert_eq!(cfg.taxonomy.default_priority, 1);
        assert!(!cfg.queue.flush_on_destroy);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let cfg = SchedulerConfig::from_lookup(lookup(&[
            (ENV_PRIORITY_COUNT, "5"),
            (ENV_DEFAULT_PRIORITY, " 4 "),
            (ENV_FLUSH_ON_DESTROY, "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.taxonomy.priority_count, 5);
        assert_eq!(cfg.taxonomy.default_priority, 4);
        assert!(cfg.queue.flush_on_destroy);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err =
            SchedulerConfig::from_lookup(lookup(&[(ENV_PRIORITY_COUNT, "lots")])).unwrap_err();
        assert!(
            matches!(err, SchedulerError::InvalidConfig(msg) if msg.contains(ENV_PRIORITY_COUNT))
        );
    }

    #[test]
    fn test_from_lookup_validates_bounds() {
        let err = SchedulerConfig::from_lookup(lookup(&[(ENV_DEFAULT_PRIORITY, "3")])).unwrap_err();
        assert_eq!(err, SchedulerError::DefaultPriorityOutOfRange { default: 3, count: 3 });
    }

    #[test]
    fn test_load_from_missing_path() {
        let err = SchedulerConfig::load_from_path("/nonexistent/scheduler.json").unwrap_err();
        assert!(err.to_string().contains("reading scheduler config"));
    }
}
