/*!
 * Lifecycle Module
 * Collector startup, configuration and the execution context
 */

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod warnings;

// Re-export for convenience
pub use bootstrap::bootstrap;
#[cfg(feature = "bdwgc")]
pub use bootstrap::{initialize, initialize_from_env};
pub use config::GcConfig;
pub use context::{current_override, ExecutionContext, PolicyScope};
pub use warnings::{
    discard_warning, forwards_warnings, install_warning_handler, log_warning, WarningMode,
};
