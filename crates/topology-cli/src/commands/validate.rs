use anyhow::{Context, Result, bail};
use std::path::Path;
use topology_config::parser;

pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    println!("Validating {}...", config_path.display());

    let raw = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let missing = parser::missing_env_vars(&raw)?;
    if !missing.is_empty() {
        let message = format!("references unset environment variables: {}", missing.join(", "));
        if strict {
            bail!("Configuration {}", message);
        }
        println!("  ⚠ Configuration {}", message);
        println!("✗ Configuration cannot be loaded until they are set");
        return Ok(());
    }

    let config = parser::parse_str(&raw).context("Failed to parse configuration")?;

    println!("✓ Configuration valid");
    println!("  Version: {}", config.version);
    println!("  Platform: {}", config.platform.base_url);
    println!(
        "  Token: {}",
        if config.platform.token().is_some() { "set" } else { "none" }
    );
    if let Some(org) = &config.defaults.organization {
        println!("  Default organization: {}", org);
    }
    if let Some(project) = &config.defaults.project {
        println!("  Default project: {}", project);
    }
    if let Some(names) = &config.ordering.preferred_environments {
        println!("  Preferred order: {}", names.join(" → "));
    }

    Ok(())
}
