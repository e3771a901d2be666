//! Error types for topology resolution

use crate::models::BindingReleaseState;
use thiserror::Error;

/// Result type alias for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised by a platform gateway call
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success HTTP status
    #[error("Platform returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The platform answered 2xx but flagged the call as unsuccessful
    #[error("Platform API error: {message}")]
    Api {
        /// Platform error code, if any
        code: Option<String>,
        /// Error message
        message: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode platform response: {0}")]
    Decode(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("Gateway error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Mutation kinds, used to label write and refresh failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Promote a release from one environment to another
    Promote,
    /// Change a binding's release state
    UpdateReleaseState,
    /// Delete a release binding
    DeleteBinding,
    /// Create a component release
    CreateRelease,
    /// Deploy a component release
    DeployRelease,
    /// Patch a binding's environment overrides
    PatchOverrides,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Promote => "promote",
            Operation::UpdateReleaseState => "update-release-state",
            Operation::DeleteBinding => "delete-binding",
            Operation::CreateRelease => "create-release",
            Operation::DeployRelease => "deploy-release",
            Operation::PatchOverrides => "patch-overrides",
        };
        f.write_str(name)
    }
}

/// Topology resolver error type
#[derive(Error, Debug)]
pub enum TopologyError {
    /// Organization, project or component identifier was empty
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The environments source failed, so no view can be built
    #[error("Environments unavailable: {0}")]
    EnvironmentsUnavailable(#[source] GatewayError),

    /// A mutation's write call failed; nothing was refreshed
    #[error("{operation} failed: {source}")]
    Write {
        /// The mutation that failed
        operation: Operation,
        /// Underlying gateway error
        #[source]
        source: GatewayError,
    },

    /// A mutation's write succeeded but the follow-up resolution failed
    #[error("{operation} succeeded but refreshing the topology failed: {source}")]
    RefreshAfterWrite {
        /// The mutation whose write succeeded
        operation: Operation,
        /// Why the refresh failed
        #[source]
        source: Box<TopologyError>,
    },

    /// The environment has no release binding to act on
    #[error("Environment '{0}' has no release binding")]
    NoBinding(String),

    /// Release state transition not allowed by the binding state machine
    #[error("Invalid release state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state
        from: BindingReleaseState,
        /// Requested state
        to: BindingReleaseState,
    },

    /// Request parameter validation failed
    #[error("Validation error: {0}")]
    Validation(String),
}

impl TopologyError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the underlying write reached the platform successfully
    pub fn write_succeeded(&self) -> bool {
        matches!(self, TopologyError::RefreshAfterWrite { .. })
    }
}
