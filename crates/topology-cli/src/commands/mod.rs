pub mod mutate;
pub mod resolve;
pub mod validate;

use anyhow::Result;
use platform_client::HttpGateway;
use topology_cli::OutputFormat;
use topology_cli::session;
use topology_config::Config;
use topology_core::{ComponentScope, RequestContext, TopologyResolver, TopologyView};

/// State shared by the commands of one CLI invocation
pub struct Invocation<'a> {
    config: &'a Config,
    org: Option<&'a str>,
    project: Option<&'a str>,
    pub format: OutputFormat,
    pub resolver: TopologyResolver<HttpGateway>,
    pub ctx: RequestContext,
}

impl<'a> Invocation<'a> {
    pub fn new(
        config: &'a Config,
        org: Option<&'a str>,
        project: Option<&'a str>,
        format: OutputFormat,
    ) -> Result<Self> {
        Ok(Self {
            config,
            org,
            project,
            format,
            resolver: session::build_resolver(config)?,
            ctx: session::request_context(config),
        })
    }

    pub fn scope(&self, component: &str) -> Result<ComponentScope> {
        session::build_scope(self.config, self.org, self.project, component)
    }

    pub fn print(&self, view: &TopologyView) -> Result<()> {
        println!("{}", topology_cli::render_view(view, self.format)?);
        Ok(())
    }
}
