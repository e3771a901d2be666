//! HttpGateway against a mocked platform API

use platform_client::HttpGateway;
use serde_json::json;
use topology_core::{
    BindingReleaseState, ComponentScope, GatewayError, PlatformGateway, RequestContext,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPONENT: &str = "/api/v1/orgs/acme/projects/shop/components/checkout";

fn scope() -> ComponentScope {
    ComponentScope::new("acme", "shop", "checkout").unwrap()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

#[tokio::test]
async fn test_list_environments() {
    let server = MockServer::start().await;
    let ctx = RequestContext::with_token("secret-token");
    let request_id = ctx.request_id.to_string();

    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/acme/environments"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("x-request-id", request_id.as_str()))
        .respond_with(ok(json!({ "items": [
            { "uid": "e1", "name": "development", "dataPlaneRef": "default" },
            { "uid": "e2", "name": "production", "displayName": "Production", "isProduction": true }
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let environments = gateway.list_environments(&ctx, "acme").await.unwrap();
    assert_eq!(environments.len(), 2);
    assert_eq!(environments[0].name, "development");
    assert!(environments[1].is_production);
}

#[tokio::test]
async fn test_list_bindings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/release-bindings", COMPONENT)))
        .respond_with(ok(json!({ "items": [{
            "name": "checkout-development",
            "environment": "development",
            "releaseName": "checkout-r2",
            "status": "Ready",
            "createdAt": "2026-03-01T12:00:00Z",
            "releaseState": "Active",
            "componentTypeEnvOverrides": { "replicas": 2 }
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let bindings = gateway
        .list_release_bindings(&RequestContext::new(), &scope())
        .await
        .unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].release_state, Some(BindingReleaseState::Active));
    assert!(bindings[0].has_component_type_overrides());

    // Anonymous contexts send no credentials
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_missing_pipeline_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/acme/projects/shop/deployment-pipeline"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "pipeline not found",
            "code": "NOT_FOUND"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let pipeline = gateway
        .get_deployment_pipeline(&RequestContext::new(), "acme", "shop")
        .await
        .unwrap();
    assert!(pipeline.is_none());
}

#[tokio::test]
async fn test_pipeline_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/acme/projects/shop/deployment-pipeline"))
        .respond_with(ok(json!({
            "name": "default",
            "promotionPaths": [
                {
                    "sourceEnvironmentRef": "development",
                    "targetEnvironmentRefs": [{ "name": "staging" }]
                },
                {
                    "sourceEnvironmentRef": "staging",
                    "targetEnvironmentRefs": [{ "name": "production", "requiresApproval": true }]
                }
            ]
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let pipeline = gateway
        .get_deployment_pipeline(&RequestContext::new(), "acme", "shop")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pipeline.promotion_paths.len(), 2);
    assert_eq!(
        pipeline.promotion_paths[1].target_environment_refs[0].requires_approval,
        Some(true)
    );
}

#[tokio::test]
async fn test_write_bodies() {
    let server = MockServer::start().await;
    let binding = format!("{}/release-bindings/checkout-staging", COMPONENT);

    Mock::given(method("POST"))
        .and(path(format!("{}/promote", COMPONENT)))
        .and(body_json(json!({ "sourceEnv": "development", "targetEnv": "staging" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(binding.as_str()))
        .and(body_json(json!({ "releaseState": "Suspend" })))
        .respond_with(ok(json!({ "releaseState": "Suspend" })))
        .expect(1)
        .mount(&server)
        .await;
    // Empty success body
    Mock::given(method("DELETE"))
        .and(path(binding.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/component-releases", COMPONENT)))
        .and(body_json(json!({})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "success": true, "data": { "name": "checkout-r3" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let ctx = RequestContext::new();

    gateway
        .promote(&ctx, &scope(), "development", "staging")
        .await
        .unwrap();
    gateway
        .update_binding_release_state(
            &ctx,
            &scope(),
            "checkout-staging",
            BindingReleaseState::Suspend,
        )
        .await
        .unwrap();
    gateway
        .delete_binding(&ctx, &scope(), "checkout-staging")
        .await
        .unwrap();
    let release = gateway.create_release(&ctx, &scope(), None).await.unwrap();
    assert_eq!(release, "checkout-r3");
}

#[tokio::test]
async fn test_patch_overrides_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/release-bindings/checkout-production", COMPONENT)))
        .and(body_json(json!({ "componentTypeEnvOverrides": { "replicas": 3 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let mut overrides = serde_json::Map::new();
    overrides.insert("replicas".to_string(), json!(3));
    gateway
        .patch_binding_overrides(
            &RequestContext::new(),
            &scope(),
            "checkout-production",
            &overrides,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/acme/environments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "database unavailable"
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let err = gateway
        .list_environments(&RequestContext::new(), "acme")
        .await
        .unwrap_err();
    assert!(
        matches!(err, GatewayError::Status { status: 500, ref message } if message == "database unavailable"),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_api_error_and_missing_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/deploy", COMPONENT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "release already exists",
            "code": "CONFLICT"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/component-releases", COMPONENT)))
        .and(body_json(json!({ "releaseName": "checkout-r4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let ctx = RequestContext::new();

    let err = gateway
        .deploy_release(&ctx, &scope(), "checkout-r1")
        .await
        .unwrap_err();
    assert!(
        matches!(err, GatewayError::Api { ref code, .. } if code.as_deref() == Some("CONFLICT"))
    );

    // create-release must return the created release
    let err = gateway
        .create_release(&ctx, &scope(), Some("checkout-r4"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let gateway = HttpGateway::new(&uri).unwrap();
    let err = gateway
        .list_environments(&RequestContext::new(), "acme")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
