//! Error types for the platform client

use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while setting up a client
///
/// Failures of individual calls are reported as
/// [`topology_core::GatewayError`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The base URL cannot be used for API requests
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
