//! Deployment topology resolution
//!
//! Resolves the deployment topology of a component across a chain of
//! environments. A resolution reads three independently failing sources from
//! the platform (environments, release bindings and the deployment
//! pipeline), orders the environments along the pipeline's promotion graph,
//! and merges each environment's current binding into the result.
//!
//! # Architecture
//!
//! The crate is runtime-agnostic. It talks to the platform only through the
//! [`PlatformGateway`] trait and awaits its reads with `futures`, so any
//! executor can drive it.
//!
//! - [`fetch`] issues the reads concurrently and settles each into a
//!   [`SourceOutcome`]
//! - [`graph`] orders environments (Kahn sort, levels, preference tie-break)
//! - [`merge`] joins bindings onto the ordered environments
//! - [`TopologyResolver`] ties these together and implements the mutations,
//!   each of which writes once and then resolves again
//!
//! # Example
//!
//! ```no_run
//! use topology_core::{ComponentScope, PlatformGateway, RequestContext, TopologyResolver};
//!
//! # async fn example<G: PlatformGateway>(gateway: G) -> topology_core::Result<()> {
//! let resolver = TopologyResolver::new(gateway);
//! let scope = ComponentScope::new("acme", "shop", "checkout")?;
//! let ctx = RequestContext::new();
//!
//! let view = resolver.promote(&ctx, &scope, "development", "staging").await?;
//! assert!(view.is_promoted("development", "staging"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fetch;
pub mod gateway;
pub mod graph;
pub mod merge;
pub mod models;
pub mod names;
pub mod resolver;
pub mod scope;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use error::{GatewayError, Operation, Result, TopologyError};
pub use fetch::{FetchReport, FetchedSources, OutcomeKind, SourceOutcome, SourcePolicy, fetch_sources};
pub use gateway::{GatewayResult, PlatformGateway};
pub use graph::{
    CycleError, DEFAULT_ENVIRONMENT_PREFERENCE, EnvironmentOrder, EnvironmentPreference,
    OrderStrategy, PromotionGraph, resolve_order,
};
pub use merge::{derive_status, merge_bindings};
pub use models::*;
pub use names::{NameIndex, NameKey};
pub use resolver::{CreatedRelease, TopologyResolver, build_view};
pub use scope::{ComponentScope, RequestContext};
pub use view::TopologyView;
