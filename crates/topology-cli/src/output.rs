//! Rendering topology views as tables or JSON

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use topology_core::{DeploymentStatus, ResolvedEnvironment, TopologyView};

/// Output format of view-producing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table
    Table,
    /// Pretty-printed JSON, as served to the portal
    Json,
}

/// Render a view in the requested format
pub fn render_view(view: &TopologyView, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Table => Ok(view_table(view).to_string()),
    }
}

fn status_color(status: DeploymentStatus) -> Color {
    match status {
        DeploymentStatus::Success => Color::Green,
        DeploymentStatus::Failed => Color::Red,
        DeploymentStatus::Suspended => Color::Yellow,
        DeploymentStatus::Pending => Color::Cyan,
        DeploymentStatus::NotDeployed => Color::DarkGrey,
    }
}

fn promotes_to(env: &ResolvedEnvironment) -> String {
    let Some(targets) = &env.promotion_targets else {
        return "-".to_string();
    };

    targets
        .iter()
        .map(|t| {
            if t.requires_approval == Some(true) || t.is_manual_approval_required == Some(true) {
                format!("{} (approval)", t.name)
            } else {
                t.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table with one row per environment, in view order
pub fn view_table(view: &TopologyView) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ENVIRONMENT",
        "STATUS",
        "RELEASE",
        "STATE",
        "DEPLOYED",
        "PROMOTES TO",
    ]);

    for env in view.iter() {
        let name = if env.is_production {
            format!("{} (prod)", env.name)
        } else {
            env.name.clone()
        };
        let deployed = env
            .deployment
            .last_deployed
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(name),
            Cell::new(env.deployment.status).fg(status_color(env.deployment.status)),
            Cell::new(env.deployment.release_name.as_deref().unwrap_or("-")),
            Cell::new(
                env.release_state
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(deployed),
            Cell::new(promotes_to(env)),
        ]);
    }

    table
}
