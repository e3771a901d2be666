//! The ordered, merged topology returned by every read and mutation

use crate::models::{DeploymentStatus, ResolvedEnvironment};
use crate::names::NameKey;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Snapshot of a component's deployment topology
///
/// Each resolution builds a new view; views are never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyView {
    environments: Vec<ResolvedEnvironment>,
}

impl TopologyView {
    /// Wrap resolved environments, already in display order
    pub fn new(environments: Vec<ResolvedEnvironment>) -> Self {
        Self { environments }
    }

    /// Environment by resource name, ignoring case
    pub fn get(&self, name: &str) -> Option<&ResolvedEnvironment> {
        let key = NameKey::new(name);
        self.environments
            .iter()
            .find(|env| NameKey::new(&env.resource_name) == key)
    }

    /// Resource names in display order
    pub fn names(&self) -> Vec<&str> {
        self.environments
            .iter()
            .map(|env| env.resource_name.as_str())
            .collect()
    }

    /// Whether `target` already runs the release bound in `source`
    pub fn is_promoted(&self, source: &str, target: &str) -> bool {
        let (Some(source), Some(target)) = (self.get(source), self.get(target)) else {
            return false;
        };
        if target.deployment.status == DeploymentStatus::NotDeployed {
            return false;
        }

        match (
            source.deployment.release_name.as_deref(),
            target.deployment.release_name.as_deref(),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Consume the view
    pub fn into_inner(self) -> Vec<ResolvedEnvironment> {
        self.environments
    }
}

impl Deref for TopologyView {
    type Target = [ResolvedEnvironment];

    fn deref(&self) -> &Self::Target {
        &self.environments
    }
}

impl IntoIterator for TopologyView {
    type Item = ResolvedEnvironment;
    type IntoIter = std::vec::IntoIter<ResolvedEnvironment>;

    fn into_iter(self) -> Self::IntoIter {
        self.environments.into_iter()
    }
}
