//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::MeridianConfig;
use crate::config::secret_string;
use crate::domain::errors::MeridianError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into MeridianConfig
/// 4. Applies environment variable overrides (MERIDIAN_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use meridian::config::loader::load_config;
///
/// let config = load_config("meridian.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MeridianConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MeridianError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MeridianError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: MeridianConfig = toml::from_str(&contents)
        .map_err(|e| MeridianError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config.validate().map_err(|e| {
        MeridianError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MeridianError::Configuration(format!("Invalid substitution regex: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(MeridianError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using MERIDIAN_* prefix
///
/// Environment variables follow the pattern: MERIDIAN_<SECTION>_<KEY>
/// For example: MERIDIAN_INTEGRATOR_BASE_URL, MERIDIAN_CACHE_TTL_SECONDS
fn apply_env_overrides(config: &mut MeridianConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("MERIDIAN_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Integrator overrides
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_ENABLED") {
        config.integrator.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_BASE_URL") {
        config.integrator.base_url = val;
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_USERNAME") {
        config.integrator.username = val;
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_PASSWORD") {
        config.integrator.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_REFERRALS_ENABLED") {
        config.integrator.integrated_referrals_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_TIMEOUT_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.integrator.timeout_seconds = seconds;
        }
    }
    if let Ok(val) = std::env::var("MERIDIAN_INTEGRATOR_TLS_VERIFY") {
        config.integrator.tls_verify = val.parse().unwrap_or(true);
    }

    // Cache overrides
    if let Ok(val) = std::env::var("MERIDIAN_CACHE_CAPACITY") {
        if let Ok(capacity) = val.parse() {
            config.cache.capacity = capacity;
        }
    }
    if let Ok(val) = std::env::var("MERIDIAN_CACHE_SHARDS") {
        if let Ok(shards) = val.parse() {
            config.cache.shards = shards;
        }
    }
    if let Ok(val) = std::env::var("MERIDIAN_CACHE_TTL_SECONDS") {
        if let Ok(ttl) = val.parse() {
            config.cache.ttl_seconds = ttl;
        }
    }

    // Fallback overrides
    if let Ok(val) = std::env::var("MERIDIAN_FALLBACK_ENABLED") {
        config.fallback.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("MERIDIAN_FALLBACK_POSTGRESQL_CONNECTION_STRING") {
        if let Some(ref mut pg) = config.fallback.postgresql {
            pg.connection_string = secret_string(val);
        } else {
            config.fallback.postgresql = Some(super::schema::PostgreSQLConfig {
                connection_string: secret_string(val),
                max_connections: 10,
                connection_timeout_seconds: 30,
            });
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("MERIDIAN_LOGGING_FILE_ENABLED") {
        config.logging.file_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("MERIDIAN_LOGGING_FILE_PATH") {
        config.logging.file_path = val;
    }
}
