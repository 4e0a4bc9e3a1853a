/*!
 * Collector Warnings
 *
 * The collector reports internal anomalies (repeated large allocations,
 * heap growth failures, ...) through one process-wide callback. By default
 * those messages are discarded so the embedding application owns its
 * diagnostics channel; `WarningMode::Log` routes them into `tracing` instead.
 */

use crate::core::errors::ConfigError;
use crate::memory::native::{NativeCollector, WarnProc};
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, CStr};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Target used for forwarded collector warnings
pub const WARNING_TARGET: &str = "gc_alloc::collector";

/// Set once `GlobalGc` serves an allocation
static GLOBAL_ALLOCATOR_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Record that the collector backs the Rust global allocator
///
/// From then on `log_warning` drops messages: the callback can run under the
/// collector's allocation lock, and a subscriber that allocates would re-enter
/// the collector through the global allocator.
#[cfg_attr(not(feature = "bdwgc"), allow(dead_code))]
pub(crate) fn mark_global_allocator_active() {
    if !GLOBAL_ALLOCATOR_ACTIVE.load(Ordering::Relaxed) {
        GLOBAL_ALLOCATOR_ACTIVE.store(true, Ordering::Relaxed);
    }
}

/// Whether `log_warning` currently forwards messages to `tracing`
pub fn forwards_warnings() -> bool {
    !GLOBAL_ALLOCATOR_ACTIVE.load(Ordering::Relaxed)
}

/// What happens to collector warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningMode {
    /// Drop every message
    #[default]
    Discard,
    /// Forward messages to `tracing::warn!`
    ///
    /// Has no effect once `GlobalGc` is serving allocations.
    Log,
}

impl WarningMode {
    /// Native callback implementing this mode
    pub fn handler(self) -> WarnProc {
        match self {
            WarningMode::Discard => discard_warning,
            WarningMode::Log => log_warning,
        }
    }

    pub(crate) fn parse(var: &'static str, value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discard" | "quiet" | "off" => Ok(WarningMode::Discard),
            "log" | "tracing" | "on" => Ok(WarningMode::Log),
            _ => Err(ConfigError::InvalidWarningMode {
                var,
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for WarningMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WarningMode::Discard => write!(f, "discard"),
            WarningMode::Log => write!(f, "log"),
        }
    }
}

/// Install the handler for `mode`, returning whatever was installed before
pub fn install_warning_handler<C: NativeCollector>(
    collector: &C,
    mode: WarningMode,
) -> Option<WarnProc> {
    if mode == WarningMode::Log && !forwards_warnings() {
        warn!("collector warnings are dropped while GlobalGc is the global allocator");
    }
    collector.set_warning_handler(mode.handler())
}

/// Swallows collector warnings
pub unsafe extern "C" fn discard_warning(_msg: *mut c_char, _arg: usize) {}

/// Forwards collector warnings to `tracing`
///
/// Drops the message once `GlobalGc` is in use (see [`forwards_warnings`]).
pub unsafe extern "C" fn log_warning(msg: *mut c_char, arg: usize) {
    if msg.is_null() || !forwards_warnings() {
        return;
    }
    let template = CStr::from_ptr(msg).to_string_lossy();
    let message = format_warning(&template, arg);
    warn!(target: WARNING_TARGET, arg, "{}", message);
}

/// Substitute the collector's single word argument into its printf template
pub(crate) fn format_warning(template: &str, arg: usize) -> String {
    const SPECIFIERS: [&str; 4] = ["%ld", "%lu", "%zu", "%p"];

    let mut message = template.trim_end().to_string();
    let first = SPECIFIERS
        .iter()
        .filter_map(|specifier| message.find(specifier).map(|at| (at, specifier.len())))
        .min_by_key(|(at, _)| *at);

    if let Some((at, len)) = first {
        let value = if &message[at..at + len] == "%p" {
            format!("{:#x}", arg)
        } else {
            arg.to_string()
        };
        message.replace_range(at..at + len, &value);
    }
    message
}
