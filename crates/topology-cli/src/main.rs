use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use topology_cli::OutputFormat;
use topology_cli::logging::init_logging;
use topology_cli::session::{self, DEFAULT_CONFIG_PATH};
use topology_core::BindingReleaseState;

mod commands;

#[derive(Parser)]
#[command(name = "topology")]
#[command(about = "Inspect and change the deployment topology of a component")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Organization (overrides defaults.organization)
    #[arg(long, global = true)]
    org: Option<String>,

    /// Project (overrides defaults.project)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Fail on referenced environment variables that are not set
        #[arg(short, long)]
        strict: bool,
    },

    /// Show the deployment topology of a component
    Resolve {
        /// Component name
        component: String,
    },

    /// Promote the release in one environment to another
    Promote {
        /// Component name
        component: String,

        /// Source environment
        #[arg(long)]
        from: String,

        /// Target environment
        #[arg(long)]
        to: String,
    },

    /// Suspend the release bound in an environment
    Suspend {
        /// Component name
        component: String,

        /// Environment
        #[arg(short, long)]
        env: String,
    },

    /// Resume a suspended release
    Resume {
        /// Component name
        component: String,

        /// Environment
        #[arg(short, long)]
        env: String,
    },

    /// Remove the release from an environment
    Undeploy {
        /// Component name
        component: String,

        /// Environment
        #[arg(short, long)]
        env: String,
    },

    /// Delete a release binding
    DeleteBinding {
        /// Component name
        component: String,

        /// Binding name
        #[arg(short, long)]
        binding: String,
    },

    /// Create a component release
    CreateRelease {
        /// Component name
        component: String,

        /// Release name (platform assigned when omitted)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Deploy a release to the first environment of the pipeline
    Deploy {
        /// Component name
        component: String,

        /// Release name
        #[arg(short, long)]
        release: String,
    },

    /// Replace a binding's component type overrides
    PatchOverrides {
        /// Component name
        component: String,

        /// Binding name
        #[arg(short, long)]
        binding: String,

        /// JSON or YAML file holding the overrides
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let Cli {
        config: config_path,
        org,
        project,
        format,
        verbose,
        command,
    } = Cli::parse();

    if let Commands::Validate { strict } = command {
        return commands::validate::run(&config_path, strict);
    }

    let config = session::load_config(&config_path)?;
    init_logging(verbose, config.settings.log_level.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let inv = commands::Invocation::new(&config, org.as_deref(), project.as_deref(), format)?;

        match command {
            Commands::Validate { .. } => Ok(()),
            Commands::Resolve { component } => commands::resolve::run(&inv, &component).await,
            Commands::Promote {
                component,
                from,
                to,
            } => commands::mutate::promote(&inv, &component, &from, &to).await,
            Commands::Suspend { component, env } => {
                commands::mutate::set_release_state(&inv, &component, &env, BindingReleaseState::Suspend)
                    .await
            }
            Commands::Resume { component, env } => {
                commands::mutate::set_release_state(&inv, &component, &env, BindingReleaseState::Active)
                    .await
            }
            Commands::Undeploy { component, env } => {
                commands::mutate::set_release_state(
                    &inv,
                    &component,
                    &env,
                    BindingReleaseState::Undeploy,
                )
                .await
            }
            Commands::DeleteBinding { component, binding } => {
                commands::mutate::delete_binding(&inv, &component, &binding).await
            }
            Commands::CreateRelease { component, name } => {
                commands::mutate::create_release(&inv, &component, name.as_deref()).await
            }
            Commands::Deploy { component, release } => {
                commands::mutate::deploy(&inv, &component, &release).await
            }
            Commands::PatchOverrides {
                component,
                binding,
                file,
            } => commands::mutate::patch_overrides(&inv, &component, &binding, &file).await,
        }
    })
}
