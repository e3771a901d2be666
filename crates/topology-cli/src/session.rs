//! Everything a command needs to talk to the platform

use anyhow::{Context, Result, anyhow};
use platform_client::{HttpGateway, HttpGatewayOptions};
use std::path::Path;
use std::time::Duration;
use topology_config::{Config, parser};
use topology_core::{ComponentScope, EnvironmentPreference, RequestContext, TopologyResolver};
use tracing::debug;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "topology.yaml";

/// Load the configuration file
///
/// A missing file at the default path falls back to the built-in
/// configuration; a missing file anywhere else is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        debug!("{} not found, using built-in configuration", path.display());
        return parser::default_config().context("Failed to build default configuration");
    }

    parser::parse_file(path)
        .with_context(|| format!("Failed to parse configuration {}", path.display()))
}

/// Build the component scope from flags, falling back to config defaults
pub fn build_scope(
    config: &Config,
    org: Option<&str>,
    project: Option<&str>,
    component: &str,
) -> Result<ComponentScope> {
    let organization = org
        .or(config.defaults.organization.as_deref())
        .ok_or_else(|| anyhow!("No organization given; pass --org or set defaults.organization"))?;
    let project = project
        .or(config.defaults.project.as_deref())
        .ok_or_else(|| anyhow!("No project given; pass --project or set defaults.project"))?;

    Ok(ComponentScope::new(organization, project, component)?)
}

/// Tie-break preference from the config, or the built-in one
pub fn preference(config: &Config) -> EnvironmentPreference {
    match &config.ordering.preferred_environments {
        Some(names) => EnvironmentPreference::new(names.iter().map(String::as_str)),
        None => EnvironmentPreference::default(),
    }
}

/// Per-invocation request context carrying the configured token
pub fn request_context(config: &Config) -> RequestContext {
    match config.platform.token() {
        Some(token) => RequestContext::with_token(token),
        None => RequestContext::new(),
    }
}

/// Resolver over the configured platform API
pub fn build_resolver(config: &Config) -> Result<TopologyResolver<HttpGateway>> {
    let options = HttpGatewayOptions {
        connect_timeout: Duration::from_secs(config.platform.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.platform.timeout_secs),
    };
    let gateway = HttpGateway::with_options(&config.platform.base_url, options)
        .context("Failed to create platform client")?;

    Ok(TopologyResolver::new(gateway).with_preference(preference(config)))
}
