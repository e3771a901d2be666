use super::Invocation;
use anyhow::{Context, Result};

pub async fn run(inv: &Invocation<'_>, component: &str) -> Result<()> {
    let scope = inv.scope(component)?;
    let view = inv
        .resolver
        .resolve_checked(&inv.ctx, &scope)
        .await
        .with_context(|| format!("Failed to resolve topology of {}", scope))?;

    if view.is_empty() {
        eprintln!("No environments found for organization '{}'", scope.organization);
    }
    inv.print(&view)
}
