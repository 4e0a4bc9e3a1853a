/*!
 * Collector Configuration
 *
 * Startup settings applied once by the bootstrap. Values can be built in
 * code or read from the environment:
 *
 * - `GC_ALLOC_INCREMENTAL`: enable incremental collection (default: false)
 * - `GC_ALLOC_WARNINGS`: `discard` or `log` (default: discard)
 * - `GC_ALLOC_INITIAL_HEAP`: bytes to pre-expand the heap by (K/M/G suffix ok)
 * - `GC_ALLOC_MAX_HEAP`: cap on heap growth (K/M/G suffix ok)
 */

use super::warnings::WarningMode;
use crate::core::errors::ConfigError;
use crate::core::limits::{ENV_INCREMENTAL, ENV_INITIAL_HEAP, ENV_MAX_HEAP, ENV_WARNINGS};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Collector startup configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GcConfig {
    /// Spread collection work over many small increments
    pub incremental: bool,

    /// Routing for collector warnings
    pub warnings: WarningMode,

    /// Bytes to pre-expand the heap by at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_heap: Option<Size>,

    /// Upper bound on heap growth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heap: Option<Size>,
}

impl GcConfig {
    /// Stop-the-world collection, warnings discarded, heap unbounded
    pub const fn new() -> Self {
        Self {
            incremental: false,
            warnings: WarningMode::Discard,
            initial_heap: None,
            max_heap: None,
        }
    }

    /// Incremental collection, otherwise defaults
    pub const fn incremental() -> Self {
        Self {
            incremental: true,
            ..Self::new()
        }
    }

    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_warnings(mut self, warnings: WarningMode) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_initial_heap(mut self, bytes: Size) -> Self {
        self.initial_heap = Some(bytes);
        self
    }

    pub fn with_max_heap(mut self, bytes: Size) -> Self {
        self.max_heap = Some(bytes);
        self
    }

    /// Read configuration from the process environment
    ///
    /// Unset variables keep their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(value) = lookup(ENV_INCREMENTAL) {
            config.incremental = parse_bool(ENV_INCREMENTAL, &value)?;
        }
        if let Some(value) = lookup(ENV_WARNINGS) {
            config.warnings = WarningMode::parse(ENV_WARNINGS, &value)?;
        }
        if let Some(value) = lookup(ENV_INITIAL_HEAP) {
            config.initial_heap = Some(parse_size(ENV_INITIAL_HEAP, &value)?);
        }
        if let Some(value) = lookup(ENV_MAX_HEAP) {
            config.max_heap = Some(parse_size(ENV_MAX_HEAP, &value)?);
        }

        debug!(?config, "collector configuration resolved");
        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_size(var: &'static str, value: &str) -> Result<Size, ConfigError> {
    let invalid = || ConfigError::InvalidSize {
        var,
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (digits, multiplier) = match trimmed.char_indices().last() {
        Some((at, 'k' | 'K')) => (&trimmed[..at], 1024),
        Some((at, 'm' | 'M')) => (&trimmed[..at], 1024 * 1024),
        Some((at, 'g' | 'G')) => (&trimmed[..at], 1024 * 1024 * 1024),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };

    digits
        .trim()
        .parse::<Size>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}
