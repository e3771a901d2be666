//! Concurrent fetch of the three topology sources
//!
//! Environments are the backbone of the view and are required; release
//! bindings and the deployment pipeline are enrichments. Each source settles
//! into a [`SourceOutcome`] according to its [`SourcePolicy`], so the
//! fatal/degraded asymmetry lives in one place instead of scattered error
//! handling.

use crate::error::{GatewayError, TopologyError};
use crate::gateway::{GatewayResult, PlatformGateway};
use crate::models::{DeploymentPipeline, EnvironmentRecord, ReleaseBinding};
use crate::scope::{ComponentScope, RequestContext};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// How a source failure affects the resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// Failure aborts the resolution
    Required,
    /// Failure degrades to an empty value
    Optional,
}

/// Settled state of one source
#[derive(Debug, Clone)]
pub enum SourceOutcome<T> {
    /// The source answered
    Ready(T),
    /// The source failed or had nothing; the resolution continues without it
    Degraded {
        /// Why the source is unavailable
        reason: String,
    },
    /// The source failed and the resolution cannot continue
    Fatal(GatewayError),
}

/// Discriminant of a [`SourceOutcome`], for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// See [`SourceOutcome::Ready`]
    Ready,
    /// See [`SourceOutcome::Degraded`]
    Degraded,
    /// See [`SourceOutcome::Fatal`]
    Fatal,
}

impl<T> SourceOutcome<T> {
    /// Settle a gateway result under a policy
    pub fn settle(result: GatewayResult<T>, policy: SourcePolicy) -> Self {
        match (result, policy) {
            (Ok(value), _) => SourceOutcome::Ready(value),
            (Err(err), SourcePolicy::Required) => SourceOutcome::Fatal(err),
            (Err(err), SourcePolicy::Optional) => SourceOutcome::Degraded {
                reason: err.to_string(),
            },
        }
    }

    /// Discriminant of this outcome
    pub fn kind(&self) -> OutcomeKind {
        match self {
            SourceOutcome::Ready(_) => OutcomeKind::Ready,
            SourceOutcome::Degraded { .. } => OutcomeKind::Degraded,
            SourceOutcome::Fatal(_) => OutcomeKind::Fatal,
        }
    }
}

impl<T> SourceOutcome<Option<T>> {
    /// Treat a successful-but-absent answer as degraded
    pub fn require_present(self, what: &str) -> SourceOutcome<T> {
        match self {
            SourceOutcome::Ready(Some(value)) => SourceOutcome::Ready(value),
            SourceOutcome::Ready(None) => SourceOutcome::Degraded {
                reason: format!("no {} configured", what),
            },
            SourceOutcome::Degraded { reason } => SourceOutcome::Degraded { reason },
            SourceOutcome::Fatal(err) => SourceOutcome::Fatal(err),
        }
    }
}

/// Timing and outcome of one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceReport {
    /// How the source settled
    pub kind: OutcomeKind,
    /// Time the call took
    pub elapsed: Duration,
}

/// Timing and outcome of all three sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Environments source
    pub environments: SourceReport,
    /// Release bindings source
    pub bindings: SourceReport,
    /// Deployment pipeline source
    pub pipeline: SourceReport,
}

/// Inputs of one resolution after degradation has been applied
#[derive(Debug, Clone)]
pub struct FetchedSources {
    /// Environments, in platform order
    pub environments: Vec<EnvironmentRecord>,
    /// Release bindings; empty when the source degraded
    pub bindings: Vec<ReleaseBinding>,
    /// Deployment pipeline; `None` when the source degraded
    pub pipeline: Option<DeploymentPipeline>,
    /// Per-source outcome and timing
    pub report: FetchReport,
}

async fn timed<T>(fut: impl Future<Output = T>) -> (T, Duration) {
    let started = Instant::now();
    let output = fut.await;
    (output, started.elapsed())
}

/// Issue the three reads concurrently and settle each one
///
/// Fails only when the environments read fails; the pending reads are
/// dropped at that point.
pub async fn fetch_sources<G>(
    gateway: &G,
    ctx: &RequestContext,
    scope: &ComponentScope,
) -> Result<FetchedSources, TopologyError>
where
    G: PlatformGateway + ?Sized,
{
    let environments = async {
        let (result, elapsed) = timed(gateway.list_environments(ctx, &scope.organization)).await;
        match SourceOutcome::settle(result, SourcePolicy::Required) {
            SourceOutcome::Fatal(err) => {
                error!(
                    request_id = %ctx.request_id,
                    "Failed to list environments for {} after {}ms: {}",
                    scope,
                    elapsed.as_millis(),
                    err
                );
                Err(TopologyError::EnvironmentsUnavailable(err))
            }
            outcome => Ok((outcome, elapsed)),
        }
    };
    let bindings = async {
        Ok::<_, TopologyError>(timed(gateway.list_release_bindings(ctx, scope)).await)
    };
    let pipeline = async {
        Ok::<_, TopologyError>(
            timed(gateway.get_deployment_pipeline(ctx, &scope.organization, &scope.project))
                .await,
        )
    };

    let (
        (env_outcome, env_elapsed),
        (bindings_result, bindings_elapsed),
        (pipeline_result, pipeline_elapsed),
    ) = futures::try_join!(environments, bindings, pipeline)?;

    let environments = match env_outcome {
        SourceOutcome::Ready(environments) => environments,
        // Required sources never settle as degraded
        SourceOutcome::Degraded { .. } | SourceOutcome::Fatal(_) => Vec::new(),
    };
    debug!(
        request_id = %ctx.request_id,
        "Listed {} environments for {} in {}ms",
        environments.len(),
        scope,
        env_elapsed.as_millis()
    );

    let bindings_outcome = SourceOutcome::settle(bindings_result, SourcePolicy::Optional);
    let bindings_kind = bindings_outcome.kind();
    let bindings = match bindings_outcome {
        SourceOutcome::Ready(bindings) => {
            debug!(
                request_id = %ctx.request_id,
                "Listed {} release bindings for {} in {}ms",
                bindings.len(),
                scope,
                bindings_elapsed.as_millis()
            );
            bindings
        }
        SourceOutcome::Degraded { reason } => {
            warn!(
                request_id = %ctx.request_id,
                "Release bindings unavailable for {} after {}ms, continuing without bindings: {}",
                scope,
                bindings_elapsed.as_millis(),
                reason
            );
            Vec::new()
        }
        SourceOutcome::Fatal(_) => Vec::new(),
    };

    let pipeline_outcome =
        SourceOutcome::settle(pipeline_result, SourcePolicy::Optional).require_present("deployment pipeline");
    let pipeline_kind = pipeline_outcome.kind();
    let pipeline = match pipeline_outcome {
        SourceOutcome::Ready(pipeline) => {
            debug!(
                request_id = %ctx.request_id,
                "Fetched deployment pipeline '{}' ({} promotion paths) for {} in {}ms",
                pipeline.name,
                pipeline.promotion_paths.len(),
                scope,
                pipeline_elapsed.as_millis()
            );
            Some(pipeline)
        }
        SourceOutcome::Degraded { reason } => {
            warn!(
                request_id = %ctx.request_id,
                "Deployment pipeline unavailable for {} after {}ms, using environment order: {}",
                scope,
                pipeline_elapsed.as_millis(),
                reason
            );
            None
        }
        SourceOutcome::Fatal(_) => None,
    };

    Ok(FetchedSources {
        environments,
        bindings,
        pipeline,
        report: FetchReport {
            environments: SourceReport {
                kind: OutcomeKind::Ready,
                elapsed: env_elapsed,
            },
            bindings: SourceReport {
                kind: bindings_kind,
                elapsed: bindings_elapsed,
            },
            pipeline: SourceReport {
                kind: pipeline_kind,
                elapsed: pipeline_elapsed,
            },
        },
    })
}
