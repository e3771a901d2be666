//! HTTP gateway to the platform REST API
//!
//! [`HttpGateway`] implements [`topology_core::PlatformGateway`] over
//! `reqwest`. Requests go to `{base_url}/api/v1/...` with percent-encoded
//! path segments; the caller's bearer token and request id are taken from the
//! [`topology_core::RequestContext`] of each call.
//!
//! `reqwest` drives its I/O on tokio, so callers must run the gateway inside
//! a tokio runtime.

pub mod envelope;
pub mod error;
pub mod http;

pub use envelope::{ApiResponse, ListData, decode_response};
pub use error::{ClientError, Result};
pub use http::{HttpGateway, HttpGatewayOptions, REQUEST_ID_HEADER};
