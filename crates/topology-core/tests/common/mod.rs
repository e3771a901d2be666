//! Shared fixtures for topology integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use topology_core::memory::MemoryGateway;
use topology_core::{
    BindingReleaseState, ComponentScope, DeploymentPipeline, EnvironmentRecord, PromotionPath,
    PromotionTarget, ReleaseBinding, RequestContext, TopologyResolver,
};

/// Scope every fixture lives in
pub fn scope() -> ComponentScope {
    ComponentScope::new("acme", "shop", "checkout").expect("valid scope")
}

/// A fresh request context
pub fn ctx() -> RequestContext {
    RequestContext::with_token("test-token")
}

/// Build an environment record
pub fn environment(name: &str) -> EnvironmentRecord {
    let mut env = EnvironmentRecord::new(format!("uid-{}", name.to_lowercase()), name);
    env.is_production = name.eq_ignore_ascii_case("production");
    env
}

/// Environments in platform order, deliberately not pipeline order
pub fn environments() -> Vec<EnvironmentRecord> {
    vec![
        environment("production"),
        environment("development"),
        environment("staging"),
    ]
}

/// Promotion path from `source` to each of `targets`
pub fn path(source: &str, targets: &[&str]) -> PromotionPath {
    PromotionPath {
        source_environment_ref: source.to_string(),
        target_environment_refs: targets.iter().map(|t| PromotionTarget::new(*t)).collect(),
    }
}

/// development -> staging -> production, production gated by approval
pub fn pipeline() -> DeploymentPipeline {
    let mut to_production = path("staging", &["production"]);
    to_production.target_environment_refs[0].requires_approval = Some(true);

    DeploymentPipeline {
        name: "default".to_string(),
        promotion_paths: vec![path("development", &["staging"]), to_production],
    }
}

/// Build a binding named the way the platform names them
pub fn binding(environment: &str, release: &str, status: &str) -> ReleaseBinding {
    ReleaseBinding {
        name: format!("checkout-{}", environment.to_lowercase()),
        environment: environment.to_string(),
        release_name: release.to_string(),
        status: status.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        component_type_env_overrides: None,
        release_state: None,
        image: Some(format!("registry.local/checkout:{}", release)),
        endpoints: vec![],
    }
}

/// development runs r2, staging and production run r1, production suspended
pub fn bindings() -> Vec<ReleaseBinding> {
    let mut production = binding("production", "checkout-r1", "Suspended");
    production.release_state = Some(BindingReleaseState::Suspend);

    vec![
        binding("development", "checkout-r2", "Ready"),
        binding("staging", "checkout-r1", "Ready"),
        production,
    ]
}

/// Gateway seeded with the full fixture set
pub fn gateway() -> MemoryGateway {
    MemoryGateway::new()
        .with_environments(environments())
        .with_bindings(bindings())
        .with_pipeline(pipeline())
}

/// Resolver over the full fixture set
pub fn resolver() -> TopologyResolver<MemoryGateway> {
    TopologyResolver::new(gateway())
}
