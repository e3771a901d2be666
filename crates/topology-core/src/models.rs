//! Data models for environments, release bindings and deployment pipelines
//!
//! Wire types mirror the platform API's camelCase JSON. Output types
//! ([`ResolvedEnvironment`] and friends) use the same convention so they can
//! be handed to the portal UI unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An environment as returned by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRecord {
    /// Unique identifier
    pub uid: String,
    /// Resource name, the key used by bindings and pipelines
    pub name: String,
    /// Human readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Namespace the environment lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Data plane the environment deploys to
    #[serde(default)]
    pub data_plane_ref: String,
    /// Whether this is a production environment
    #[serde(default)]
    pub is_production: bool,
    /// DNS prefix for exposed endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_prefix: Option<String>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EnvironmentRecord {
    /// Create an environment record with only identity fields set
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            display_name: None,
            namespace: None,
            data_plane_ref: String::new(),
            is_production: false,
            dns_prefix: None,
            created_at: None,
        }
    }

    /// Name shown to users
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// Release state of a binding, as requested by the portal
///
/// `Active` and `Suspend` can be toggled freely; `Undeploy` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingReleaseState {
    /// Release is running
    Active,
    /// Release is scaled down but kept
    Suspend,
    /// Release is removed from the environment
    Undeploy,
}

impl BindingReleaseState {
    /// Check whether the state machine allows moving to `next`
    pub fn can_transition_to(self, next: BindingReleaseState) -> bool {
        use BindingReleaseState::*;
        matches!(
            (self, next),
            (Active, Suspend) | (Suspend, Active) | (Active, Undeploy) | (Suspend, Undeploy)
        )
    }
}

impl fmt::Display for BindingReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BindingReleaseState::Active => "Active",
            BindingReleaseState::Suspend => "Suspend",
            BindingReleaseState::Undeploy => "Undeploy",
        };
        f.write_str(s)
    }
}

/// An endpoint exposed by a deployed release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInfo {
    /// Endpoint name
    pub name: String,
    /// Public or internal URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Visibility (e.g. public, organization, project)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

/// Assignment of a component release to an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseBinding {
    /// Binding resource name
    pub name: String,
    /// Environment the binding targets
    pub environment: String,
    /// Release currently bound
    pub release_name: String,
    /// Free-text status reported by the platform
    #[serde(default)]
    pub status: String,
    /// When the binding was created
    pub created_at: DateTime<Utc>,
    /// Per-environment overrides of the component type parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type_env_overrides: Option<serde_json::Map<String, serde_json::Value>>,
    /// Requested release state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_state: Option<BindingReleaseState>,
    /// Container image of the bound release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Endpoints exposed by the bound release
    #[serde(default)]
    pub endpoints: Vec<EndpointInfo>,
}

impl ReleaseBinding {
    /// Whether the binding carries a non-empty override map
    pub fn has_component_type_overrides(&self) -> bool {
        self.component_type_env_overrides
            .as_ref()
            .is_some_and(|o| !o.is_empty())
    }
}

/// A permitted promotion from one environment to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionTarget {
    /// Target environment name
    pub name: String,
    /// Promotion requires an approval step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    /// Approval must be given manually
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_manual_approval_required: Option<bool>,
}

impl PromotionTarget {
    /// Create a target with no approval flags
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_approval: None,
            is_manual_approval_required: None,
        }
    }
}

/// All promotions allowed out of one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPath {
    /// Source environment name
    pub source_environment_ref: String,
    /// Targets in pipeline order
    #[serde(default)]
    pub target_environment_refs: Vec<PromotionTarget>,
}

/// A project's deployment pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPipeline {
    /// Pipeline name
    #[serde(default)]
    pub name: String,
    /// Promotion paths; together they form the promotion graph
    #[serde(default)]
    pub promotion_paths: Vec<PromotionPath>,
}

/// Normalized deployment status shown per environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStatus {
    /// Release is running and ready
    Success,
    /// Release failed
    Failed,
    /// Release is suspended
    Suspended,
    /// Release is rolling out or in an unknown state
    Pending,
    /// Nothing is bound to the environment
    NotDeployed,
}

impl DeploymentStatus {
    /// Wire/display form
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Suspended => "suspended",
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::NotDeployed => "not-deployed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment details of one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    /// Normalized status
    pub status: DeploymentStatus,
    /// When the current binding was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<DateTime<Utc>>,
    /// Container image of the bound release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Bound release name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
}

impl DeploymentInfo {
    /// Deployment info for an environment with no binding
    pub fn not_deployed() -> Self {
        Self {
            status: DeploymentStatus::NotDeployed,
            last_deployed: None,
            image: None,
            release_name: None,
        }
    }
}

/// A promotion target as exposed in the topology view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPromotionTarget {
    /// Display name of the target environment
    pub name: String,
    /// Canonical resource name of the target environment
    pub resource_name: String,
    /// Promotion requires an approval step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    /// Approval must be given manually
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_manual_approval_required: Option<bool>,
}

/// One environment of the topology view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEnvironment {
    /// Environment uid
    pub uid: String,
    /// Display name
    pub name: String,
    /// Canonical resource name
    pub resource_name: String,
    /// Whether this is a production environment
    #[serde(default)]
    pub is_production: bool,
    /// Current binding's resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_name: Option<String>,
    /// Whether the current binding overrides component type parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_component_type_overrides: Option<bool>,
    /// Requested release state of the current binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_state: Option<BindingReleaseState>,
    /// Deployment details
    pub deployment: DeploymentInfo,
    /// Endpoints exposed in this environment
    #[serde(default)]
    pub endpoints: Vec<EndpointInfo>,
    /// Environments this one may promote to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_targets: Option<Vec<ResolvedPromotionTarget>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_release_state_machine() {
        use BindingReleaseState::*;

        assert!(Active.can_transition_to(Suspend));
        assert!(Suspend.can_transition_to(Active));
        assert!(Active.can_transition_to(Undeploy));
        assert!(Suspend.can_transition_to(Undeploy));

        assert!(!Undeploy.can_transition_to(Active));
        assert!(!Undeploy.can_transition_to(Suspend));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn test_binding_decodes_platform_json() {
        let binding: ReleaseBinding = serde_json::from_value(json!({
            "name": "api-development",
            "environment": "development",
            "releaseName": "api-20240101-1",
            "status": "Ready",
            "createdAt": "2024-01-01T10:00:00Z",
            "componentTypeEnvOverrides": { "replicas": 2 },
            "releaseState": "Active"
        }))
        .unwrap();

        assert_eq!(binding.release_name, "api-20240101-1");
        assert_eq!(binding.release_state, Some(BindingReleaseState::Active));
        assert!(binding.has_component_type_overrides());
        assert!(binding.endpoints.is_empty());
    }

    #[test]
    fn test_empty_overrides_are_not_overrides() {
        let binding: ReleaseBinding = serde_json::from_value(json!({
            "name": "b",
            "environment": "dev",
            "releaseName": "r",
            "createdAt": "2024-01-01T10:00:00Z",
            "componentTypeEnvOverrides": {}
        }))
        .unwrap();
        assert!(!binding.has_component_type_overrides());
    }

    #[test]
    fn test_environment_label_prefers_display_name() {
        let mut env = EnvironmentRecord::new("1", "dev");
        assert_eq!(env.label(), "dev");

        env.display_name = Some("Development".to_string());
        assert_eq!(env.label(), "Development");

        env.display_name = Some("  ".to_string());
        assert_eq!(env.label(), "dev");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let value = serde_json::to_value(DeploymentStatus::NotDeployed).unwrap();
        assert_eq!(value, json!("not-deployed"));
        assert_eq!(DeploymentStatus::Success.to_string(), "success");
    }
}
