use super::Invocation;
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use topology_cli::overrides::load_overrides;
use topology_core::{BindingReleaseState, TopologyError, TopologyView};
use tracing::warn;

// A refresh failure still means the platform accepted the write
fn finish(
    inv: &Invocation<'_>,
    result: topology_core::Result<TopologyView>,
    action: &str,
) -> Result<()> {
    match result {
        Ok(view) => {
            eprintln!("✓ {}", action);
            inv.print(&view)
        }
        Err(err @ TopologyError::RefreshAfterWrite { .. }) => {
            warn!("{}", err);
            eprintln!("✓ {}", action);
            eprintln!("⚠ Could not load the updated topology; run `topology resolve` to see it");
            Err(anyhow::Error::new(err))
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("Failed: {}", action))),
    }
}

pub async fn promote(inv: &Invocation<'_>, component: &str, from: &str, to: &str) -> Result<()> {
    let scope = inv.scope(component)?;
    let result = inv.resolver.promote(&inv.ctx, &scope, from, to).await;
    finish(inv, result, &format!("Promote {} from '{}' to '{}'", component, from, to))
}

pub async fn set_release_state(
    inv: &Invocation<'_>,
    component: &str,
    env: &str,
    state: BindingReleaseState,
) -> Result<()> {
    let scope = inv.scope(component)?;
    let view = inv
        .resolver
        .resolve_checked(&inv.ctx, &scope)
        .await
        .with_context(|| format!("Failed to resolve topology of {}", scope))?;

    let environment = view.get(env).ok_or_else(|| {
        anyhow!(
            "Environment '{}' not found; known environments: {}",
            env,
            view.names().join(", ")
        )
    })?;

    let result = inv
        .resolver
        .update_binding_release_state(&inv.ctx, &scope, environment, state)
        .await;
    finish(
        inv,
        result,
        &format!("Set release state of {} in '{}' to {}", component, env, state),
    )
}

pub async fn delete_binding(inv: &Invocation<'_>, component: &str, binding: &str) -> Result<()> {
    let scope = inv.scope(component)?;
    let result = inv.resolver.delete_binding(&inv.ctx, &scope, binding).await;
    finish(inv, result, &format!("Delete binding '{}'", binding))
}

pub async fn create_release(
    inv: &Invocation<'_>,
    component: &str,
    name: Option<&str>,
) -> Result<()> {
    let scope = inv.scope(component)?;
    match inv.resolver.create_release(&inv.ctx, &scope, name).await {
        Ok(created) => {
            eprintln!("✓ Created release '{}'", created.release_name);
            inv.print(&created.topology)
        }
        Err(err) => finish(inv, Err(err), &format!("Create release of {}", component)),
    }
}

pub async fn deploy(inv: &Invocation<'_>, component: &str, release: &str) -> Result<()> {
    let scope = inv.scope(component)?;
    let result = inv.resolver.deploy_release(&inv.ctx, &scope, release).await;
    finish(inv, result, &format!("Deploy release '{}'", release))
}

pub async fn patch_overrides(
    inv: &Invocation<'_>,
    component: &str,
    binding: &str,
    file: &Path,
) -> Result<()> {
    let scope = inv.scope(component)?;
    let overrides = load_overrides(file)?;
    let result = inv
        .resolver
        .patch_binding_overrides(&inv.ctx, &scope, binding, &overrides)
        .await;
    finish(
        inv,
        result,
        &format!("Patch {} override keys on binding '{}'", overrides.len(), binding),
    )
}
