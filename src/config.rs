//! Runtime and compiler configuration, with environment presets.
//!
//! Follows this codebase's existing router-config idiom: a struct of
//! plain settings, named presets (`development`, `production`, `testing`),
//! a `validate` pass, and a builder for ad hoc overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MaxEmptyCycles, QueueCapacity};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting was outside its accepted range.
    #[error("invalid configuration: {field} - {reason}")]
    Validation {
        /// The offending field name.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Configuration for a running `Network`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Default capacity for agent input queues that don't specify one.
    pub default_queue_capacity: QueueCapacity,
    /// Consecutive empty cycles before `run()` exits.
    pub max_empty_cycles: MaxEmptyCycles,
    /// Initial arena bump-region size, in bytes.
    pub arena_page_bytes: usize,
    /// Maximum number of agents the registry can hold.
    pub max_agents: usize,
    /// Maximum number of distinct `(source, frequency)` routing entries.
    pub max_routing_entries: usize,
    /// Emit `tracing` events at `debug` level for every dispatch, not
    /// just cycle boundaries. Expensive; off by default.
    pub enable_detailed_logs: bool,
}

impl NetworkConfig {
    /// Settings tuned for local development: small tables, verbose logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            default_queue_capacity: QueueCapacity::round_up(64),
            max_empty_cycles: MaxEmptyCycles::try_new(10).unwrap_or_default(),
            arena_page_bytes: 1 << 16,
            max_agents: 256,
            max_routing_entries: 1024,
            enable_detailed_logs: true,
        }
    }

    /// Settings tuned for production workloads: larger tables, quieter
    /// logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            default_queue_capacity: QueueCapacity::round_up(1024),
            max_empty_cycles: MaxEmptyCycles::try_new(10).unwrap_or_default(),
            arena_page_bytes: 1 << 20,
            max_agents: 4096,
            max_routing_entries: 65536,
            enable_detailed_logs: false,
        }
    }

    /// Minimal settings for fast, deterministic unit and integration
    /// tests.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            default_queue_capacity: QueueCapacity::round_up(8),
            max_empty_cycles: MaxEmptyCycles::try_new(3).unwrap_or_default(),
            arena_page_bytes: 1 << 12,
            max_agents: 16,
            max_routing_entries: 64,
            enable_detailed_logs: false,
        }
    }

    /// Starts a builder seeded with development defaults.
    #[must_use]
    pub fn builder() -> NetworkConfigBuilder {
        NetworkConfigBuilder::new()
    }

    /// Checks internal consistency. Presets always pass; this guards
    /// configurations assembled via the builder or loaded from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any setting is out of
    /// range for the others.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_agents == 0 {
            return Err(ConfigError::Validation {
                field: "max_agents".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_routing_entries == 0 {
            return Err(ConfigError::Validation {
                field: "max_routing_entries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.arena_page_bytes < 64 {
            return Err(ConfigError::Validation {
                field: "arena_page_bytes".to_string(),
                reason: "must be at least 64 bytes".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Builder for custom [`NetworkConfig`] values.
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Starts from development defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: NetworkConfig::development(),
        }
    }

    /// Overrides the default queue capacity.
    #[must_use]
    pub fn default_queue_capacity(mut self, capacity: QueueCapacity) -> Self {
        self.config.default_queue_capacity = capacity;
        self
    }

    /// Overrides the empty-cycle shutdown threshold.
    #[must_use]
    pub fn max_empty_cycles(mut self, cycles: MaxEmptyCycles) -> Self {
        self.config.max_empty_cycles = cycles;
        self
    }

    /// Overrides the registry's agent capacity.
    #[must_use]
    pub fn max_agents(mut self, max: usize) -> Self {
        self.config.max_agents = max;
        self
    }

    /// Overrides the routing table's entry capacity.
    #[must_use]
    pub fn max_routing_entries(mut self, max: usize) -> Self {
        self.config.max_routing_entries = max;
        self
    }

    /// Enables or disables per-dispatch debug logging.
    #[must_use]
    pub fn enable_detailed_logs(mut self, enable: bool) -> Self {
        self.config.enable_detailed_logs = enable;
        self
    }

    /// Validates and returns the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the assembled configuration
    /// is inconsistent.
    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for NetworkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
