//! Which links of the fallback chain are enabled.

use crate::config::{Config, MockMode};

/// Derived from `UPSTREAM_ENABLED`, `MOCK_DATA` and `MOCK_NODE_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub upstream_enabled: bool,
    pub mock_mode: MockMode,
    /// Population size on first use of the generator
    pub mock_node_count: usize,
}

impl FallbackPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upstream_enabled: config.upstream_enabled,
            mock_mode: config.mock_mode,
            mock_node_count: config.mock_node_count,
        }
    }

    pub fn calls_upstream(&self) -> bool {
        self.upstream_enabled && self.mock_mode != MockMode::Always
    }

    pub fn reads_store(&self) -> bool {
        self.mock_mode != MockMode::Always
    }

    pub fn allows_mock(&self) -> bool {
        self.mock_mode != MockMode::Off
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
