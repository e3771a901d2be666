//! Per-request identity passed explicitly into every call

use crate::error::{Result, TopologyError};
use std::fmt;
use uuid::Uuid;

/// The component a resolution or mutation is about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentScope {
    /// Organization name
    pub organization: String,
    /// Project name
    pub project: String,
    /// Component name
    pub component: String,
}

impl ComponentScope {
    /// Create a scope, rejecting empty identifiers
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        component: impl Into<String>,
    ) -> Result<Self> {
        let scope = Self {
            organization: organization.into(),
            project: project.into(),
            component: component.into(),
        };

        for (field, value) in [
            ("organization", &scope.organization),
            ("project", &scope.project),
            ("component", &scope.component),
        ] {
            if value.trim().is_empty() {
                return Err(TopologyError::InvalidScope(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        Ok(scope)
    }
}

impl fmt::Display for ComponentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.project, self.component)
    }
}

/// Caller identity for a single request
///
/// Created per call and threaded through the gateway; nothing retains it
/// once the call returns.
#[derive(Clone)]
pub struct RequestContext {
    /// Correlation id used in logs
    pub request_id: Uuid,
    token: Option<String>,
}

impl RequestContext {
    /// Anonymous context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token: None,
        }
    }

    /// Context carrying a bearer token; blank tokens are ignored
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            request_id: Uuid::new_v4(),
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    /// Bearer token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
