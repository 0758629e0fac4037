//! Rate settings loaded from TOML.
//!
//! ```toml
//! [rates.search]
//! delay_ms = 300
//!
//! [rates.redraw]
//! delay_ms = 16
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no rate named '{0}'")]
    UnknownRate(String),
}

/// Delay of one debounce or throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateConfig {
    pub delay_ms: i64,
}

impl RateConfig {
    #[must_use]
    pub const fn new(delay_ms: i64) -> Self {
        Self { delay_ms }
    }

    /// Quick config for search input debouncing
    #[must_use]
    pub const fn search_input() -> Self {
        Self::new(300)
    }

    /// Quick config for UI redraw throttling
    #[must_use]
    pub const fn redraw() -> Self {
        Self::new(16)
    }

    /// Quick config for file system watching
    #[must_use]
    pub const fn fs_watch() -> Self {
        Self::new(500)
    }

    /// The delay as a `Duration`; negative values become zero.
    pub fn delay(&self) -> Duration {
        delay_from_millis(self.delay_ms)
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self::search_input()
    }
}

/// Convert a signed millisecond count, clamping negatives to zero.
pub fn delay_from_millis(delay_ms: i64) -> Duration {
    match u64::try_from(delay_ms) {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            warn!(delay_ms, "negative delay clamped to zero");
            Duration::ZERO
        }
    }
}

/// Named rates, keyed by the table name under `[rates]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    #[serde(default)]
    pub rates: BTreeMap<String, RateConfig>,
}

impl TimingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn rate(&self, name: &str) -> Result<&RateConfig, ConfigError> {
        self.rates
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRate(name.to_string()))
    }
}
