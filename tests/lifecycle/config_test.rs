/*!
 * Configuration Tests
 * Reading collector settings from the process environment
 */

use gc_alloc::core::limits::{ENV_INCREMENTAL, ENV_INITIAL_HEAP, ENV_MAX_HEAP, ENV_WARNINGS};
use gc_alloc::{ConfigError, GcConfig, GcError, WarningMode};
use miette::Diagnostic;
use pretty_assertions::assert_eq;
use serial_test::serial;

const ALL_VARS: [&str; 4] = [ENV_INCREMENTAL, ENV_WARNINGS, ENV_INITIAL_HEAP, ENV_MAX_HEAP];

fn clear_env() {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(GcConfig::from_env().unwrap(), GcConfig::new());
}

#[test]
#[serial]
fn test_from_env_reads_variables() {
    clear_env();
    std::env::set_var(ENV_INCREMENTAL, "yes");
    std::env::set_var(ENV_WARNINGS, "log");
    std::env::set_var(ENV_MAX_HEAP, "512M");

    let config = GcConfig::from_env().unwrap();
    clear_env();

    assert!(config.incremental);
    assert_eq!(config.warnings, WarningMode::Log);
    assert_eq!(config.initial_heap, None);
    assert_eq!(config.max_heap, Some(512 * 1024 * 1024));
}

#[test]
#[serial]
fn test_from_env_reports_bad_value() {
    clear_env();
    std::env::set_var(ENV_WARNINGS, "shout");

    let err = GcConfig::from_env().unwrap_err();
    clear_env();

    assert!(matches!(err, ConfigError::InvalidWarningMode { .. }));
    assert!(err.to_string().contains(ENV_WARNINGS));
    assert!(err.code().is_some());

    let wrapped: GcError = err.into();
    assert!(matches!(wrapped, GcError::Config(_)));
}
