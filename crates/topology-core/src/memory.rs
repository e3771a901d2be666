//! In-memory platform gateway
//!
//! Holds environments, bindings, releases and a pipeline in process, applies
//! writes the way the platform would, and lets tests inject a failure for any
//! call. Undeploying a binding removes it.

use crate::error::GatewayError;
use crate::gateway::{GatewayResult, PlatformGateway};
use crate::models::{
    BindingReleaseState, DeploymentPipeline, EnvironmentRecord, ReleaseBinding,
};
use crate::names::NameKey;
use crate::scope::{ComponentScope, RequestContext};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Gateway calls, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    /// `list_environments`
    ListEnvironments,
    /// `list_release_bindings`
    ListReleaseBindings,
    /// `get_deployment_pipeline`
    GetDeploymentPipeline,
    /// `promote`
    Promote,
    /// `update_binding_release_state`
    UpdateReleaseState,
    /// `delete_binding`
    DeleteBinding,
    /// `create_release`
    CreateRelease,
    /// `deploy_release`
    DeployRelease,
    /// `patch_binding_overrides`
    PatchOverrides,
}

#[derive(Default)]
struct State {
    environments: Vec<EnvironmentRecord>,
    bindings: Vec<ReleaseBinding>,
    pipeline: Option<DeploymentPipeline>,
    releases: Vec<String>,
    failures: HashMap<GatewayCall, GatewayError>,
    calls: HashMap<GatewayCall, usize>,
}

/// In-memory [`PlatformGateway`]
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    /// Create an empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed environments
    pub fn with_environments(self, environments: Vec<EnvironmentRecord>) -> Self {
        self.state().environments = environments;
        self
    }

    /// Seed release bindings
    pub fn with_bindings(self, bindings: Vec<ReleaseBinding>) -> Self {
        {
            let mut state = self.state();
            for binding in &bindings {
                if !state.releases.contains(&binding.release_name) {
                    state.releases.push(binding.release_name.clone());
                }
            }
            state.bindings = bindings;
        }
        self
    }

    /// Seed the deployment pipeline
    pub fn with_pipeline(self, pipeline: DeploymentPipeline) -> Self {
        self.state().pipeline = Some(pipeline);
        self
    }

    /// Make every subsequent `call` fail with `error`
    pub fn fail_on(&self, call: GatewayCall, error: GatewayError) {
        self.state().failures.insert(call, error);
    }

    /// Stop failing `call`
    pub fn clear_failure(&self, call: GatewayCall) {
        self.state().failures.remove(&call);
    }

    /// How many times `call` was made
    pub fn calls(&self, call: GatewayCall) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    /// Current bindings
    pub fn bindings(&self) -> Vec<ReleaseBinding> {
        self.state().bindings.clone()
    }

    /// Releases created so far
    pub fn releases(&self) -> Vec<String> {
        self.state().releases.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: GatewayCall) -> GatewayResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        *state.calls.entry(call).or_default() += 1;
        match state.failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }
}

fn binding_index(state: &State, name: &str) -> GatewayResult<usize> {
    state
        .bindings
        .iter()
        .position(|b| b.name == name)
        .ok_or_else(|| GatewayError::NotFound(format!("release binding '{}'", name)))
}

fn bind(state: &mut State, scope: &ComponentScope, environment: &str, release: &str) {
    let key = NameKey::new(environment);
    let binding = ReleaseBinding {
        name: format!("{}-{}", scope.component, key.as_str()),
        environment: environment.to_string(),
        release_name: release.to_string(),
        status: "Ready".to_string(),
        created_at: Utc::now(),
        component_type_env_overrides: None,
        release_state: Some(BindingReleaseState::Active),
        image: None,
        endpoints: Vec::new(),
    };

    match state
        .bindings
        .iter()
        .position(|b| NameKey::new(&b.environment) == key)
    {
        Some(idx) => {
            let existing = &mut state.bindings[idx];
            existing.release_name = binding.release_name;
            existing.status = binding.status;
            existing.created_at = binding.created_at;
            existing.release_state = binding.release_state;
        }
        None => state.bindings.push(binding),
    }
}

#[async_trait]
impl PlatformGateway for MemoryGateway {
    async fn list_environments(
        &self,
        _ctx: &RequestContext,
        _organization: &str,
    ) -> GatewayResult<Vec<EnvironmentRecord>> {
        let state = self.begin(GatewayCall::ListEnvironments)?;
        Ok(state.environments.clone())
    }

    async fn list_release_bindings(
        &self,
        _ctx: &RequestContext,
        _scope: &ComponentScope,
    ) -> GatewayResult<Vec<ReleaseBinding>> {
        let state = self.begin(GatewayCall::ListReleaseBindings)?;
        Ok(state.bindings.clone())
    }

    async fn get_deployment_pipeline(
        &self,
        _ctx: &RequestContext,
        _organization: &str,
        _project: &str,
    ) -> GatewayResult<Option<DeploymentPipeline>> {
        let state = self.begin(GatewayCall::GetDeploymentPipeline)?;
        Ok(state.pipeline.clone())
    }

    async fn promote(
        &self,
        _ctx: &RequestContext,
        scope: &ComponentScope,
        source: &str,
        target: &str,
    ) -> GatewayResult<()> {
        let mut state = self.begin(GatewayCall::Promote)?;
        let source_key = NameKey::new(source);
        let release = state
            .bindings
            .iter()
            .find(|b| NameKey::new(&b.environment) == source_key)
            .map(|b| b.release_name.clone())
            .ok_or_else(|| {
                GatewayError::NotFound(format!("no release bound in environment '{}'", source))
            })?;

        bind(&mut state, scope, target, &release);
        Ok(())
    }

    async fn update_binding_release_state(
        &self,
        _ctx: &RequestContext,
        _scope: &ComponentScope,
        binding: &str,
        release_state: BindingReleaseState,
    ) -> GatewayResult<()> {
        let mut state = self.begin(GatewayCall::UpdateReleaseState)?;
        let idx = binding_index(&state, binding)?;

        match release_state {
            BindingReleaseState::Undeploy => {
                state.bindings.remove(idx);
            }
            BindingReleaseState::Suspend => {
                state.bindings[idx].release_state = Some(release_state);
                state.bindings[idx].status = "Suspended".to_string();
            }
            BindingReleaseState::Active => {
                state.bindings[idx].release_state = Some(release_state);
                state.bindings[idx].status = "Ready".to_string();
            }
        }
        Ok(())
    }

    async fn delete_binding(
        &self,
        _ctx: &RequestContext,
        _scope: &ComponentScope,
        binding: &str,
    ) -> GatewayResult<()> {
        let mut state = self.begin(GatewayCall::DeleteBinding)?;
        let idx = binding_index(&state, binding)?;
        state.bindings.remove(idx);
        Ok(())
    }

    async fn create_release(
        &self,
        _ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: Option<&str>,
    ) -> GatewayResult<String> {
        let mut state = self.begin(GatewayCall::CreateRelease)?;
        let name = match release_name {
            Some(name) => name.to_string(),
            None => format!("{}-release-{}", scope.component, state.releases.len() + 1),
        };
        if state.releases.contains(&name) {
            return Err(GatewayError::Api {
                code: Some("CONFLICT".to_string()),
                message: format!("release '{}' already exists", name),
            });
        }
        state.releases.push(name.clone());
        Ok(name)
    }

    async fn deploy_release(
        &self,
        _ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: &str,
    ) -> GatewayResult<()> {
        let mut state = self.begin(GatewayCall::DeployRelease)?;
        if !state.releases.iter().any(|r| r == release_name) {
            return Err(GatewayError::NotFound(format!("release '{}'", release_name)));
        }

        let first = state
            .pipeline
            .as_ref()
            .and_then(|p| p.promotion_paths.first())
            .map(|p| p.source_environment_ref.clone())
            .or_else(|| state.environments.first().map(|e| e.name.clone()))
            .ok_or_else(|| GatewayError::Other("no environment to deploy to".to_string()))?;

        bind(&mut state, scope, &first, release_name);
        Ok(())
    }

    async fn patch_binding_overrides(
        &self,
        _ctx: &RequestContext,
        _scope: &ComponentScope,
        binding: &str,
        overrides: &serde_json::Map<String, serde_json::Value>,
    ) -> GatewayResult<()> {
        let mut state = self.begin(GatewayCall::PatchOverrides)?;
        let idx = binding_index(&state, binding)?;
        state.bindings[idx].component_type_env_overrides = Some(overrides.clone());
        Ok(())
    }
}
