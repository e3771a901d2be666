//! Configuration parser with environment variable substitution

use crate::{Config, ConfigError, LOG_LEVELS, Result};
use regex::Regex;
use std::path::Path;

/// Configuration used when no file is present
pub const DEFAULT_CONFIG: &str = r#"
version: "1.0"
platform:
  base_url: "${PLATFORM_API_URL:-http://localhost:8080}"
  token: "${PLATFORM_API_TOKEN:-}"
settings:
  log_level: "${TOPOLOGY_LOG_LEVEL:-info}"
"#;

const ENV_VAR_PATTERN: &str = r"\$\{([^}]+)\}";

/// Parse a YAML configuration file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse YAML configuration from a string
///
/// Environment variables are substituted before validation, so validation
/// sees the values that will actually be used.
pub fn parse_str(content: &str) -> Result<Config> {
    let mut config: Config = serde_yaml::from_str(content)?;
    substitute_config(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

/// The configuration built from [`DEFAULT_CONFIG`]
pub fn default_config() -> Result<Config> {
    parse_str(DEFAULT_CONFIG)
}

/// Names of `${VAR}` references in `input` that have no default and are not
/// set in the environment
pub fn missing_env_vars(input: &str) -> Result<Vec<String>> {
    let re = env_var_regex()?;
    let mut missing = Vec::new();
    for cap in re.captures_iter(input) {
        let (name, default) = split_default(&cap[1]);
        if default.is_none() && std::env::var(name).is_err() && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    Ok(missing)
}

/// Substitute environment variables in a string
///
/// `${VAR}` must be set; `${VAR:-default}` falls back to `default`. All
/// missing variables are reported together.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_regex()?;
    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let Some(full) = cap.get(0) else { continue };
        let (name, default) = split_default(&cap[1]);
        result.push_str(&input[last..full.start()]);

        match (std::env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => errors.push(name.to_string()),
        }
        last = full.end();
    }
    result.push_str(&input[last..]);

    if !errors.is_empty() {
        return Err(ConfigError::EnvVarNotFound(errors.join(", ")));
    }

    Ok(result)
}

fn env_var_regex() -> Result<Regex> {
    Regex::new(ENV_VAR_PATTERN)
        .map_err(|e| ConfigError::ValidationError(format!("bad substitution pattern: {}", e)))
}

fn split_default(expr: &str) -> (&str, Option<&str>) {
    match expr.find(":-") {
        Some(pos) => (&expr[..pos], Some(&expr[pos + 2..])),
        None => (expr, None),
    }
}

fn substitute_config(config: &mut Config) -> Result<()> {
    config.platform.base_url = substitute_env_vars(&config.platform.base_url)?;

    let optional = [
        &mut config.platform.token,
        &mut config.defaults.organization,
        &mut config.defaults.project,
        &mut config.settings.log_level,
    ];
    for value in optional {
        if let Some(raw) = value.as_mut() {
            *raw = substitute_env_vars(raw)?;
        }
    }

    if let Some(names) = config.ordering.preferred_environments.as_mut() {
        for name in names.iter_mut() {
            *name = substitute_env_vars(name)?;
        }
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.version != "1.0" {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected 1.0",
            config.version
        )));
    }

    let base_url = config.platform.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "platform.base_url must start with http:// or https://, got '{}'",
            base_url
        )));
    }

    if config.platform.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "platform.timeout_secs must be greater than 0".to_string(),
        ));
    }
    if config.platform.connect_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "platform.connect_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if let Some(level) = &config.settings.log_level
        && !LOG_LEVELS.contains(&level.to_lowercase().as_str())
    {
        return Err(ConfigError::ValidationError(format!(
            "Unknown log level '{}', expected one of {}",
            level,
            LOG_LEVELS.join(", ")
        )));
    }

    for (field, value) in [
        ("defaults.organization", &config.defaults.organization),
        ("defaults.project", &config.defaults.project),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
    }

    if let Some(names) = &config.ordering.preferred_environments {
        if let Some(pos) = names.iter().position(|n| n.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "ordering.preferred_environments[{}] cannot be empty",
                pos
            )));
        }
    }

    Ok(())
}
