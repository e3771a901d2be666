//! `reqwest` implementation of [`PlatformGateway`]

use crate::envelope::{ListData, ReleaseRef, decode_response, required};
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use topology_core::{
    BindingReleaseState, ComponentScope, DeploymentPipeline, EnvironmentRecord, GatewayError,
    GatewayResult, PlatformGateway, ReleaseBinding, RequestContext,
};
use tracing::{debug, warn};
use url::Url;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Transport settings for [`HttpGateway`]
#[derive(Debug, Clone)]
pub struct HttpGatewayOptions {
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Time allowed for a whole request
    pub request_timeout: Duration,
}

impl Default for HttpGatewayOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Gateway to the platform REST API
///
/// Holds only transport configuration. Caller identity comes in with each
/// call's [`RequestContext`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a gateway with default timeouts
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, HttpGatewayOptions::default())
    }

    /// Create a gateway with explicit transport settings
    pub fn with_options(base_url: &str, options: HttpGatewayOptions) -> Result<Self> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);

        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: url,
        })
    }

    /// Base URL requests are built from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of `segments` under the API root, each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "v1"])
                .extend(segments);
        }
        url
    }

    fn component_endpoint(&self, scope: &ComponentScope, tail: &[&str]) -> Url {
        let mut segments = vec![
            "orgs",
            scope.organization.as_str(),
            "projects",
            scope.project.as_str(),
            "components",
            scope.component.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> GatewayResult<Option<T>> {
        let started = Instant::now();
        debug!(request_id = %ctx.request_id, "{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, ctx.request_id.to_string());
        if let Some(token) = ctx.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        let result = decode_response(status, &text);
        match &result {
            Ok(_) => debug!(
                request_id = %ctx.request_id,
                "{} {} -> {} in {}ms",
                method,
                url,
                status,
                started.elapsed().as_millis()
            ),
            Err(err) => warn!(
                request_id = %ctx.request_id,
                "{} {} -> {} in {}ms: {}",
                method,
                url,
                status,
                started.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    async fn write(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> GatewayResult<()> {
        self.send::<Value>(ctx, method, url, body).await.map(|_| ())
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Transport(format!("request timed out: {}", err))
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl PlatformGateway for HttpGateway {
    async fn list_environments(
        &self,
        ctx: &RequestContext,
        organization: &str,
    ) -> GatewayResult<Vec<EnvironmentRecord>> {
        let url = self.endpoint(&["orgs", organization, "environments"]);
        let data: Option<ListData<EnvironmentRecord>> =
            self.send(ctx, Method::GET, url, None).await?;
        Ok(data.map(|d| d.items).unwrap_or_default())
    }

    async fn list_release_bindings(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
    ) -> GatewayResult<Vec<ReleaseBinding>> {
        let url = self.component_endpoint(scope, &["release-bindings"]);
        let data: Option<ListData<ReleaseBinding>> =
            self.send(ctx, Method::GET, url, None).await?;
        Ok(data.map(|d| d.items).unwrap_or_default())
    }

    async fn get_deployment_pipeline(
        &self,
        ctx: &RequestContext,
        organization: &str,
        project: &str,
    ) -> GatewayResult<Option<DeploymentPipeline>> {
        let url = self.endpoint(&[
            "orgs",
            organization,
            "projects",
            project,
            "deployment-pipeline",
        ]);
        match self.send(ctx, Method::GET, url, None).await {
            Ok(pipeline) => Ok(pipeline),
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn promote(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        source: &str,
        target: &str,
    ) -> GatewayResult<()> {
        let url = self.component_endpoint(scope, &["promote"]);
        let body = json!({ "sourceEnv": source, "targetEnv": target });
        self.write(ctx, Method::POST, url, Some(body)).await
    }

    async fn update_binding_release_state(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        state: BindingReleaseState,
    ) -> GatewayResult<()> {
        let url = self.component_endpoint(scope, &["release-bindings", binding]);
        let body = json!({ "releaseState": state });
        self.write(ctx, Method::PATCH, url, Some(body)).await
    }

    async fn delete_binding(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
    ) -> GatewayResult<()> {
        let url = self.component_endpoint(scope, &["release-bindings", binding]);
        self.write(ctx, Method::DELETE, url, None).await
    }

    async fn create_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: Option<&str>,
    ) -> GatewayResult<String> {
        let url = self.component_endpoint(scope, &["component-releases"]);
        let body = match release_name {
            Some(name) => json!({ "releaseName": name }),
            None => json!({}),
        };
        let data: Option<ReleaseRef> = self.send(ctx, Method::POST, url, Some(body)).await?;
        Ok(required(data, "release")?.name)
    }

    async fn deploy_release(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        release_name: &str,
    ) -> GatewayResult<()> {
        let url = self.component_endpoint(scope, &["deploy"]);
        let body = json!({ "releaseName": release_name });
        self.write(ctx, Method::POST, url, Some(body)).await
    }

    async fn patch_binding_overrides(
        &self,
        ctx: &RequestContext,
        scope: &ComponentScope,
        binding: &str,
        overrides: &serde_json::Map<String, Value>,
    ) -> GatewayResult<()> {
        let url = self.component_endpoint(scope, &["release-bindings", binding]);
        let body = json!({ "componentTypeEnvOverrides": overrides });
        self.write(ctx, Method::PATCH, url, Some(body)).await
    }
}
