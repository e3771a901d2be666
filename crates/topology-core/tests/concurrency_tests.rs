//! The three source reads run concurrently

mod common;

use async_trait::async_trait;
use common::*;
use smol::Timer;
use std::time::{Duration, Instant};
use topology_core::memory::{GatewayCall, MemoryGateway};
use topology_core::{
    BindingReleaseState, ComponentScope, DeploymentPipeline, EnvironmentRecord, GatewayResult,
    PlatformGateway, ReleaseBinding, RequestContext, TopologyResolver,
};

const READ_DELAY: Duration = Duration::from_millis(150);

/// Delays every read by [`READ_DELAY`]
struct SlowGateway {
    inner: MemoryGateway,
}

#[async_trait]
impl PlatformGateway for SlowGateway {
    async fn list_environments(
        &self,
        ctx: &RequestContext,
        organization: &str,
    ) -> GatewayResult<Vec<EnvironmentRecord>> {
        Timer::after(READ_DELAY).await;
        self.inner.list_environments(ctx, organization).await
    }

    async fn list_release_bindings(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
    ) -> GatewayResult<Vec<ReleaseBinding>> {
        Timer::after(READ_DELAY).await;
        self.inner.list_release_bindings(ctx, scope).await
    }

    async fn get_deployment_pipeline(
        &self,
        ctx: &RequestContext,
        organization: &str,
        project: &str,
    ) -> GatewayResult<Option<DeploymentPipeline>> {
        Timer::after(READ_DELAY).await;
        self.inner
            .get_deployment_pipeline(ctx, organization, project)
            .await
    }

    async fn promote(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        source: &str,
        target: &str,
    ) -> GatewayResult<()> {
        self.inner.promote(ctx, scope, source, target).await
    }

    async fn update_binding_release_state(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        state: BindingReleaseState,
    ) -> GatewayResult<()> {
        self.inner
            .update_binding_release_state(ctx, scope, binding, state)
            .await
    }

    async fn delete_binding(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
    ) -> GatewayResult<()> {
        self.inner.delete_binding(ctx, scope, binding).await
    }

    async fn create_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: Option<&str>,
    ) -> GatewayResult<String> {
        self.inner.create_release(ctx, scope, release_name).await
    }

    async fn deploy_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: &str,
    ) -> GatewayResult<()> {
        self.inner.deploy_release(ctx, scope, release_name).await
    }

    async fn patch_binding_overrides(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        overrides: &serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<()> {
        self.inner
            .patch_binding_overrides(ctx, scope, binding, overrides)
            .await
    }
}

#[smol_potat::test]
async fn test_reads_overlap() {
    let resolver = TopologyResolver::new(SlowGateway { inner: gateway() });

    let started = Instant::now();
    let view = resolver.resolve_deployment_topology(&ctx(), &scope()).await;
    let elapsed = started.elapsed();

    assert_eq!(view.len(), 3);
    // Sequential reads would take at least three delays
    assert!(
        elapsed < READ_DELAY * 5 / 2,
        "resolution took {:?}, reads did not overlap",
        elapsed
    );
}

#[smol_potat::test]
async fn test_resolutions_can_race() {
    let resolver = TopologyResolver::new(SlowGateway { inner: gateway() });
    let ctx_a = ctx();
    let ctx_b = ctx();
    let scope = scope();

    let (a, b) = futures::join!(
        resolver.resolve_deployment_topology(&ctx_a, &scope),
        resolver.promote(&ctx_b, &scope, "development", "staging"),
    );

    assert_eq!(a.len(), 3);
    let b = b.unwrap();
    assert!(b.is_promoted("development", "staging"));
    assert_eq!(resolver.gateway().inner.calls(GatewayCall::ListEnvironments), 2);
}
