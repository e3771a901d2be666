//! Topology resolution and write-then-refresh mutations
//!
//! Every mutation performs exactly one write and then re-runs the whole
//! resolution (fetch, order, merge). No view is ever patched in place, so a
//! post-mutation view is exactly as fresh as the platform.

use crate::error::{GatewayError, Operation, Result, TopologyError};
use crate::fetch::{FetchedSources, fetch_sources};
use crate::gateway::{GatewayResult, PlatformGateway};
use crate::graph::{EnvironmentPreference, PromotionGraph, resolve_order};
use crate::merge::merge_bindings;
use crate::models::{BindingReleaseState, ResolvedEnvironment};
use crate::names::{NameIndex, NameKey};
use crate::scope::{ComponentScope, RequestContext};
use crate::view::TopologyView;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info};

/// Build the topology view from already-fetched sources
///
/// Pure: the same sources and preference always produce the same view.
pub fn build_view(sources: &FetchedSources, preference: &EnvironmentPreference) -> TopologyView {
    let mut names = NameIndex::new();
    let keys: Vec<NameKey> = sources
        .environments
        .iter()
        .map(|env| names.register(&env.name))
        .collect();

    let graph = sources
        .pipeline
        .as_ref()
        .map(|pipeline| PromotionGraph::from_pipeline(pipeline, &mut names));
    let order = resolve_order(&keys, graph.as_ref(), preference);
    debug!("Resolved environment order using {:?}", order.strategy);

    TopologyView::new(merge_bindings(
        &sources.environments,
        &order,
        &names,
        &sources.bindings,
        graph.as_ref(),
    ))
}

/// A release created through [`TopologyResolver::create_release`]
#[derive(Debug, Clone)]
pub struct CreatedRelease {
    /// Name the platform assigned to the release
    pub release_name: String,
    /// Topology after the release was created
    pub topology: TopologyView,
}

/// Resolves deployment topologies against a platform gateway
pub struct TopologyResolver<G> {
    gateway: G,
    preference: EnvironmentPreference,
}

impl<G: PlatformGateway> TopologyResolver<G> {
    /// Create a resolver using the default environment preference
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            preference: EnvironmentPreference::default(),
        }
    }

    /// Replace the tie-break preference used when ordering
    pub fn with_preference(mut self, preference: EnvironmentPreference) -> Self {
        self.preference = preference;
        self
    }

    /// The underlying gateway
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolve the topology, surfacing a failed environments read as an error
    pub async fn resolve_checked(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
    ) -> Result<TopologyView> {
        let started = Instant::now();
        let sources = fetch_sources(&self.gateway, ctx, scope).await?;
        let view = build_view(&sources, &self.preference);

        debug!(
            request_id = %ctx.request_id,
            "Resolved {} environments for {} in {}ms",
            view.len(),
            scope,
            started.elapsed().as_millis()
        );
        Ok(view)
    }

    /// Resolve the topology; an unavailable environments source yields an
    /// empty view
    pub async fn resolve_deployment_topology(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
    ) -> TopologyView {
        match self.resolve_checked(ctx, scope).await {
            Ok(view) => view,
            Err(err) => {
                error!(
                    request_id = %ctx.request_id,
                    "Returning empty topology for {}: {}", scope, err
                );
                TopologyView::default()
            }
        }
    }

    /// Promote the release bound in `source` to `target`
    pub async fn promote(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        source: &str,
        target: &str,
    ) -> Result<TopologyView> {
        require_non_empty("source environment", source)?;
        require_non_empty("target environment", target)?;

        info!("Promoting {} from '{}' to '{}'", scope, source, target);
        self.write_then_refresh(
            ctx,
            scope,
            Operation::Promote,
            self.gateway.promote(ctx, scope, source, target),
        )
        .await
    }

    /// Move an environment's binding to a new release state
    ///
    /// `environment` comes from a previously returned view. When its release
    /// state is known the transition is checked before anything is written.
    pub async fn update_binding_release_state(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        environment: &ResolvedEnvironment,
        state: BindingReleaseState,
    ) -> Result<TopologyView> {
        let binding = environment
            .binding_name
            .as_deref()
            .ok_or_else(|| TopologyError::NoBinding(environment.resource_name.clone()))?;

        if let Some(current) = environment.release_state
            && !current.can_transition_to(state)
        {
            return Err(TopologyError::InvalidTransition {
                from: current,
                to: state,
            });
        }

        info!(
            "Setting release state of binding '{}' ({}) to {}",
            binding, scope, state
        );
        self.write_then_refresh(
            ctx,
            scope,
            Operation::UpdateReleaseState,
            self.gateway
                .update_binding_release_state(ctx, scope, binding, state),
        )
        .await
    }

    /// Delete a release binding
    pub async fn delete_binding(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
    ) -> Result<TopologyView> {
        require_non_empty("binding name", binding)?;

        info!("Deleting binding '{}' of {}", binding, scope);
        self.write_then_refresh(
            ctx,
            scope,
            Operation::DeleteBinding,
            self.gateway.delete_binding(ctx, scope, binding),
        )
        .await
    }

    /// Create a component release; the platform names it when `release_name`
    /// is `None`
    pub async fn create_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: Option<&str>,
    ) -> Result<CreatedRelease> {
        if let Some(name) = release_name {
            require_non_empty("release name", name)?;
        }

        info!("Creating release for {}", scope);
        let mut release = String::new();
        let topology = self
            .write_then_refresh(ctx, scope, Operation::CreateRelease, async {
                release = self.gateway.create_release(ctx, scope, release_name).await?;
                Ok::<_, GatewayError>(())
            })
            .await?;
        info!("Created release '{}' for {}", release, scope);

        Ok(CreatedRelease {
            release_name: release,
            topology,
        })
    }

    /// Deploy a release to the first environment of the pipeline
    pub async fn deploy_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: &str,
    ) -> Result<TopologyView> {
        require_non_empty("release name", release_name)?;

        info!("Deploying release '{}' of {}", release_name, scope);
        self.write_then_refresh(
            ctx,
            scope,
            Operation::DeployRelease,
            self.gateway.deploy_release(ctx, scope, release_name),
        )
        .await
    }

    /// Replace a binding's component type overrides
    pub async fn patch_binding_overrides(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        overrides: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<TopologyView> {
        require_non_empty("binding name", binding)?;

        info!(
            "Patching {} override keys on binding '{}' of {}",
            overrides.len(),
            binding,
            scope
        );
        self.write_then_refresh(
            ctx,
            scope,
            Operation::PatchOverrides,
            self.gateway
                .patch_binding_overrides(ctx, scope, binding, overrides),
        )
        .await
    }

    async fn write_then_refresh(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        operation: Operation,
        write: impl Future<Output = GatewayResult<()>>,
    ) -> Result<TopologyView> {
        let started = Instant::now();
        if let Err(source) = write.await {
            error!(
                request_id = %ctx.request_id,
                "{} failed for {} after {}ms: {}",
                operation,
                scope,
                started.elapsed().as_millis(),
                source
            );
            return Err(TopologyError::Write { operation, source });
        }
        debug!(
            request_id = %ctx.request_id,
            "{} written for {} in {}ms, refreshing topology",
            operation,
            scope,
            started.elapsed().as_millis()
        );

        self.resolve_checked(ctx, scope).await.map_err(|err| {
            error!(
                request_id = %ctx.request_id,
                "{} succeeded for {} but refresh failed after {}ms: {}",
                operation,
                scope,
                started.elapsed().as_millis(),
                err
            );
            TopologyError::RefreshAfterWrite {
                operation,
                source: Box::new(err),
            }
        })
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TopologyError::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
