//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with
//! --test-threads=1 to avoid interference between tests.

use meridian::config::{load_config, Environment};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("MERIDIAN_APPLICATION_LOG_LEVEL");
    std::env::remove_var("MERIDIAN_INTEGRATOR_BASE_URL");
    std::env::remove_var("MERIDIAN_INTEGRATOR_PASSWORD");
    std::env::remove_var("MERIDIAN_CACHE_TTL_SECONDS");
    std::env::remove_var("MERIDIAN_FALLBACK_ENABLED");
    std::env::remove_var("TEST_INTEGRATOR_PASSWORD");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "staging"

[application]
log_level = "debug"

[integrator]
enabled = true
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"
integrated_referrals_enabled = true
timeout_seconds = 45
connect_timeout_seconds = 5
tls_verify = true

[cache]
capacity = 200
shards = 8
ttl_seconds = 1800

[fallback]
enabled = true

[fallback.postgresql]
connection_string = "postgresql://meridian:pw@localhost:5432/meridian"
max_connections = 5
connection_timeout_seconds = 15

[logging]
file_enabled = true
file_path = "/tmp/meridian-logs"
file_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.environment, Environment::Staging);
    assert_eq!(config.integrator.base_url, "https://integrator.example.org/ws");
    assert!(config.integrator.integrated_referrals_enabled);
    assert_eq!(config.integrator.timeout_seconds, 45);
    assert_eq!(config.cache.capacity, 200);
    assert_eq!(config.cache.shards, 8);
    assert_eq!(config.cache.ttl_seconds, 1800);
    assert!(config.fallback.enabled);
    assert_eq!(config.fallback.postgresql.unwrap().max_connections, 5);
    assert!(config.logging.file_enabled);
    assert_eq!(config.logging.file_rotation, "hourly");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.environment, Environment::Development);
    assert!(config.integrator.enabled);
    assert_eq!(config.cache.capacity, 100);
    assert_eq!(config.cache.shards, 4);
    assert_eq!(config.cache.ttl_seconds, 3600);
    assert!(!config.fallback.enabled);
    assert!(!config.logging.file_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_INTEGRATOR_PASSWORD", "from-env");

    let file = write_config(
        r#"
[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "${TEST_INTEGRATOR_PASSWORD}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config.integrator.password.expose_secret().as_ref(),
        "from-env"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_fails_loudly() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "${TEST_INTEGRATOR_PASSWORD}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_INTEGRATOR_PASSWORD"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("MERIDIAN_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("MERIDIAN_CACHE_TTL_SECONDS", "60");

    let file = write_config(
        r#"
[application]
log_level = "info"

[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"

[cache]
ttl_seconds = 3600
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.cache.ttl_seconds, 60);

    cleanup_env_vars();
}

#[test]
fn test_production_requires_tls_verification() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "production"

[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"
tls_verify = false
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("tls_verify"));
}

#[test]
fn test_enabled_fallback_requires_postgresql_section() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"

[fallback]
enabled = true
"#,
    );

    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_invalid_log_level_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "verbose"

[integrator]
base_url = "https://integrator.example.org/ws"
username = "facility-3"
password = "secret"
"#,
    );

    assert!(load_config(file.path()).is_err());
}
