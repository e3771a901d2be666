//! Platform gateway trait
//!
//! The resolver talks to the platform only through [`PlatformGateway`]. Each
//! call receives the caller's [`RequestContext`] explicitly; implementations
//! hold transport configuration only.

use crate::error::GatewayError;
use crate::models::{BindingReleaseState, DeploymentPipeline, EnvironmentRecord, ReleaseBinding};
use crate::scope::{ComponentScope, RequestContext};
use async_trait::async_trait;

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Reads and writes against the platform API
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// List the environments of an organization
    async fn list_environments(
        &self,
        ctx: &RequestContext,
        organization: &str,
    ) -> GatewayResult<Vec<EnvironmentRecord>>;

    /// List the release bindings of a component
    async fn list_release_bindings(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
    ) -> GatewayResult<Vec<ReleaseBinding>>;

    /// Fetch a project's deployment pipeline; `None` when it has none
    async fn get_deployment_pipeline(
        &self,
        ctx: &RequestContext,
        organization: &str,
        project: &str,
    ) -> GatewayResult<Option<DeploymentPipeline>>;

    /// Promote the release bound in `source` to `target`
    async fn promote(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        source: &str,
        target: &str,
    ) -> GatewayResult<()>;

    /// Change the release state of a binding
    async fn update_binding_release_state(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        state: BindingReleaseState,
    ) -> GatewayResult<()>;

    /// Delete a release binding
    async fn delete_binding(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
    ) -> GatewayResult<()>;

    /// Create a component release, returning its name
    async fn create_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: Option<&str>,
    ) -> GatewayResult<String>;

    /// Deploy a component release to the first environment of the pipeline
    async fn deploy_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: &str,
    ) -> GatewayResult<()>;

    /// Replace a binding's component type overrides
    async fn patch_binding_overrides(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        overrides: &serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<()>;
}
