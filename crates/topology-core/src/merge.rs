//! Merge release bindings into the ordered environment list

use crate::graph::{EnvironmentOrder, PromotionGraph};
use crate::models::{
    DeploymentInfo, DeploymentStatus, EnvironmentRecord, ReleaseBinding, ResolvedEnvironment,
    ResolvedPromotionTarget,
};
use crate::names::{NameIndex, NameKey};
use indexmap::IndexMap;

/// Map a binding's free-text status onto a [`DeploymentStatus`]
///
/// Matching is case-insensitive and ignores spaces, `_` and `-`, so
/// "NotReady", "not ready" and "not_ready" are the same. A present binding
/// never maps to [`DeploymentStatus::NotDeployed`].
pub fn derive_status(raw: &str) -> DeploymentStatus {
    let status: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    // "notready" contains "ready", so the negative forms go first
    if status.contains("failed") || status.contains("error") {
        DeploymentStatus::Failed
    } else if status.contains("suspend") {
        DeploymentStatus::Suspended
    } else if status.contains("notready") || status.contains("pending") {
        DeploymentStatus::Pending
    } else if status.contains("ready") || status.contains("active") {
        DeploymentStatus::Success
    } else {
        DeploymentStatus::Pending
    }
}

/// Build the topology view rows for `environments` in `order`
///
/// `names` must already contain every environment name. Environments that
/// share a case-folded name stay adjacent, in input order.
pub fn merge_bindings(
    environments: &[EnvironmentRecord],
    order: &EnvironmentOrder,
    names: &NameIndex,
    bindings: &[ReleaseBinding],
    graph: Option<&PromotionGraph>,
) -> Vec<ResolvedEnvironment> {
    let mut by_key: IndexMap<NameKey, Vec<&EnvironmentRecord>> = IndexMap::new();
    for env in environments {
        by_key.entry(NameKey::new(&env.name)).or_default().push(env);
    }

    // First binding per environment wins
    let mut current: IndexMap<NameKey, &ReleaseBinding> = IndexMap::new();
    for binding in bindings {
        current
            .entry(NameKey::new(&binding.environment))
            .or_insert(binding);
    }

    let mut resolved = Vec::with_capacity(environments.len());
    for key in &order.keys {
        let Some(records) = by_key.get(key) else {
            continue;
        };
        let targets = graph.map(|g| promotion_targets(key, g, &by_key, names));

        for env in records {
            resolved.push(resolve_environment(
                env,
                current.get(key).copied(),
                targets.clone().flatten(),
            ));
        }
    }

    resolved
}

fn resolve_environment(
    env: &EnvironmentRecord,
    binding: Option<&ReleaseBinding>,
    promotion_targets: Option<Vec<ResolvedPromotionTarget>>,
) -> ResolvedEnvironment {
    let mut resolved = ResolvedEnvironment {
        uid: env.uid.clone(),
        name: env.label().to_string(),
        resource_name: env.name.clone(),
        is_production: env.is_production,
        binding_name: None,
        has_component_type_overrides: None,
        release_state: None,
        deployment: DeploymentInfo::not_deployed(),
        endpoints: Vec::new(),
        promotion_targets,
    };

    if let Some(binding) = binding {
        resolved.binding_name = Some(binding.name.clone());
        resolved.has_component_type_overrides = Some(binding.has_component_type_overrides());
        resolved.release_state = binding.release_state;
        resolved.endpoints = binding.endpoints.clone();
        resolved.deployment = DeploymentInfo {
            status: derive_status(&binding.status),
            last_deployed: Some(binding.created_at),
            image: binding.image.clone(),
            release_name: Some(binding.release_name.clone()),
        };
    }

    resolved
}

fn promotion_targets(
    key: &NameKey,
    graph: &PromotionGraph,
    environments: &IndexMap<NameKey, Vec<&EnvironmentRecord>>,
    names: &NameIndex,
) -> Option<Vec<ResolvedPromotionTarget>> {
    let edges = graph.targets(key);
    if edges.is_empty() {
        return None;
    }

    let targets = edges
        .iter()
        .map(|edge| {
            let canonical = names.canonical(&edge.target).unwrap_or(edge.target.as_str());
            let known = environments.get(&edge.target).and_then(|e| e.first());
            let (name, resource_name) = match known {
                Some(env) => (env.label().to_string(), env.name.clone()),
                None => (canonical.to_string(), canonical.to_string()),
            };
            ResolvedPromotionTarget {
                name,
                resource_name,
                requires_approval: edge.requires_approval,
                is_manual_approval_required: edge.is_manual_approval_required,
            }
        })
        .collect();

    Some(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EnvironmentPreference, resolve_order};
    use crate::models::{DeploymentPipeline, PromotionPath, PromotionTarget};
    use chrono::{TimeZone, Utc};

    fn binding(environment: &str, release: &str, status: &str) -> ReleaseBinding {
        ReleaseBinding {
            name: format!("api-{}", environment.to_lowercase()),
            environment: environment.to_string(),
            release_name: release.to_string(),
            status: status.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            component_type_env_overrides: None,
            release_state: None,
            image: Some(format!("registry.local/api:{}", release)),
            endpoints: vec![],
        }
    }

    fn build(
        environments: &[EnvironmentRecord],
        bindings: &[ReleaseBinding],
        pipeline: Option<&DeploymentPipeline>,
    ) -> Vec<ResolvedEnvironment> {
        let mut names = NameIndex::new();
        let keys: Vec<_> = environments.iter().map(|e| names.register(&e.name)).collect();
        let graph = pipeline.map(|p| PromotionGraph::from_pipeline(p, &mut names));
        let order = resolve_order(&keys, graph.as_ref(), &EnvironmentPreference::default());
        merge_bindings(environments, &order, &names, bindings, graph.as_ref())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(derive_status("Ready"), DeploymentStatus::Success);
        assert_eq!(derive_status("Active"), DeploymentStatus::Success);
        assert_eq!(derive_status("Failed: image pull error"), DeploymentStatus::Failed);
        assert_eq!(derive_status("ReconcileError"), DeploymentStatus::Failed);
        assert_eq!(derive_status("Suspended"), DeploymentStatus::Suspended);
        assert_eq!(derive_status("NotReady"), DeploymentStatus::Pending);
        assert_eq!(derive_status("not ready"), DeploymentStatus::Pending);
        assert_eq!(derive_status("Pending"), DeploymentStatus::Pending);
        assert_eq!(derive_status("Progressing"), DeploymentStatus::Pending);
        assert_eq!(derive_status(""), DeploymentStatus::Pending);
    }

    #[test]
    fn test_bound_environment_fields() {
        let envs = vec![EnvironmentRecord::new("u1", "development")];
        let mut b = binding("Development", "api-r1", "Ready");
        b.component_type_env_overrides =
            Some(serde_json::from_str(r#"{"replicas": 3}"#).unwrap());

        let view = build(&envs, &[b], None);
        assert_eq!(view.len(), 1);

        let dev = &view[0];
        assert_eq!(dev.binding_name.as_deref(), Some("api-development"));
        assert_eq!(dev.has_component_type_overrides, Some(true));
        assert_eq!(dev.deployment.status, DeploymentStatus::Success);
        assert_eq!(dev.deployment.release_name.as_deref(), Some("api-r1"));
        assert_eq!(dev.deployment.image.as_deref(), Some("registry.local/api:api-r1"));
        assert!(dev.deployment.last_deployed.is_some());
        assert!(dev.promotion_targets.is_none());
    }

    #[test]
    fn test_unbound_environment_is_not_deployed() {
        let envs = vec![EnvironmentRecord::new("u1", "dev"), EnvironmentRecord::new("u2", "prod")];
        let view = build(&envs, &[binding("dev", "r1", "Ready")], None);

        let prod = &view[1];
        assert_eq!(prod.deployment, DeploymentInfo::not_deployed());
        assert!(prod.binding_name.is_none());
        assert!(prod.has_component_type_overrides.is_none());
    }

    #[test]
    fn test_first_binding_wins() {
        let envs = vec![EnvironmentRecord::new("u1", "dev")];
        let view = build(
            &envs,
            &[binding("DEV", "first", "Ready"), binding("dev", "second", "Failed")],
            None,
        );

        assert_eq!(view[0].deployment.release_name.as_deref(), Some("first"));
        assert_eq!(view[0].deployment.status, DeploymentStatus::Success);
    }

    #[test]
    fn test_promotion_targets_carry_flags() {
        let mut envs = vec![
            EnvironmentRecord::new("u1", "development"),
            EnvironmentRecord::new("u2", "production"),
        ];
        envs[1].display_name = Some("Production".to_string());

        let mut target = PromotionTarget::new("PRODUCTION");
        target.requires_approval = Some(true);
        target.is_manual_approval_required = Some(false);
        let pipeline = DeploymentPipeline {
            name: "default".to_string(),
            promotion_paths: vec![PromotionPath {
                source_environment_ref: "Development".to_string(),
                target_environment_refs: vec![target],
            }],
        };

        let view = build(&envs, &[], Some(&pipeline));
        let targets = view[0].promotion_targets.as_ref().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "Production");
        assert_eq!(targets[0].resource_name, "production");
        assert_eq!(targets[0].requires_approval, Some(true));
        assert_eq!(targets[0].is_manual_approval_required, Some(false));
        assert!(view[1].promotion_targets.is_none());
    }

    #[test]
    fn test_environments_sharing_a_name_are_both_kept() {
        let envs = vec![
            EnvironmentRecord::new("u1", "dev"),
            EnvironmentRecord::new("u2", "prod"),
            EnvironmentRecord::new("u3", "Dev"),
        ];
        let view = build(&envs, &[], None);

        let uids: Vec<_> = view.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["u1", "u3", "u2"]);
    }
}
