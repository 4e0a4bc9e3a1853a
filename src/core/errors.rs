/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

// Re-export MemoryError from memory module
pub use crate::memory::MemoryError;

/// Configuration errors raised while reading the environment
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid boolean for {var}: {value:?}")]
    #[diagnostic(
        code(config::invalid_bool),
        help("Use one of: 1, 0, true, false, yes, no, on, off.")
    )]
    InvalidBool { var: &'static str, value: String },

    #[error("Invalid byte size for {var}: {value:?}")]
    #[diagnostic(
        code(config::invalid_size),
        help("Use a plain byte count or a K/M/G suffix, e.g. 64M.")
    )]
    InvalidSize { var: &'static str, value: String },

    #[error("Invalid warning mode for {var}: {value:?}")]
    #[diagnostic(
        code(config::invalid_warning_mode),
        help("Use either `discard` or `log`.")
    )]
    InvalidWarningMode { var: &'static str, value: String },
}

/// Unified crate error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum GcError {
    #[error("Memory error: {0}")]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
