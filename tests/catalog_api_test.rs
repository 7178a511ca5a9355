//! # 目录 API 测试
//!
//! 在内存中组装完整的独立服务路由，通过 `oneshot` 发送请求

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use backend_common::config::{AppConfig, AuthKey, CorsConfig};
use backend_common::service::create_standalone_router;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn component(name: &str, owner: &str) -> Value {
    json!({
        "apiVersion": "backstage.io/v1alpha1",
        "kind": "Component",
        "metadata": { "name": name },
        "spec": { "owner": owner }
    })
}

#[tokio::test]
async fn test_entity_lifecycle() {
    let app = create_standalone_router(&AppConfig::default(), false)
        .await
        .unwrap();

    let (status, created) = send(&app, post_json("/catalog/entities", &component("web", "a"))).await;
    assert_eq!(status, StatusCode::OK);
    let uid = created["metadata"]["uid"].as_str().unwrap().to_string();

    let (status, by_uid) = send(&app, get(&format!("/catalog/entities/by-uid/{uid}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_uid["metadata"]["name"], "web");

    let (status, by_name) = send(&app, get("/catalog/entities/by-name/component/default/web")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_name["spec"]["owner"], "a");

    // 更新后按名称查询不能返回缓存中的旧值
    send(&app, post_json("/catalog/entities", &component("web", "b"))).await;
    let (_, by_name) = send(&app, get("/catalog/entities/by-name/Component/default/web")).await;
    assert_eq!(by_name["spec"]["owner"], "b");
    assert_eq!(by_name["metadata"]["uid"], uid.as_str());

    let (status, _) = send(&app, delete(&format!("/catalog/entities/by-uid/{uid}"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/catalog/entities/by-name/component/default/web")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_with_kind_filter() {
    let app = create_standalone_router(&AppConfig::default(), false)
        .await
        .unwrap();

    send(&app, post_json("/catalog/entities", &component("web", "a"))).await;
    let mut api = component("petstore", "a");
    api["kind"] = json!("API");
    send(&app, post_json("/catalog/entities", &api)).await;

    let (_, all) = send(&app, get("/catalog/entities")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, apis) = send(&app, get("/catalog/entities?kind=api")).await;
    let apis = apis.as_array().unwrap();
    assert_eq!(apis.len(), 1);
    assert_eq!(apis[0]["metadata"]["name"], "petstore");
}

#[tokio::test]
async fn test_invalid_entity_is_rejected() {
    let app = create_standalone_router(&AppConfig::default(), false)
        .await
        .unwrap();

    let (status, body) = send(&app, post_json("/catalog/entities", &component("-bad-", "a"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_entity_is_404() {
    let app = create_standalone_router(&AppConfig::default(), false)
        .await
        .unwrap();

    let (status, body) = send(&app, get("/catalog/entities/by-uid/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_requires_permission_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/permission/authorize"))
        .respond_with(|request: &wiremock::Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": body["items"][0]["id"], "result": "DENY" }]
            }))
        })
        .mount(&server)
        .await;

    let address = server.address();
    let mut config = AppConfig::default();
    config.permission.enabled = true;
    config.backend.listen.host = address.ip().to_string();
    config.backend.listen.port = address.port();
    config.backend.auth.keys = vec![AuthKey {
        secret: "integration-secret".to_string(),
    }];

    let app = create_standalone_router(&config, false).await.unwrap();
    let (_, created) = send(&app, post_json("/catalog/entities", &component("web", "a"))).await;
    let uri = format!(
        "/catalog/entities/by-uid/{}",
        created["metadata"]["uid"].as_str().unwrap()
    );

    let (status, body) = send(&app, delete(&uri, Some("user-token"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

    // 服务令牌绕过权限后端
    let token = backend_common::service::ServerTokenManager::from_config(&config)
        .get_token()
        .unwrap();
    let (status, _) = send(&app, delete(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cors_allows_dev_frontend() {
    let app = create_standalone_router(&AppConfig::default(), true)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/healthcheck")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_uses_configured_origin() {
    let mut config = AppConfig::default();
    config.backend.cors = Some(CorsConfig {
        origin: "https://portal.example.com".to_string(),
    });
    let app = create_standalone_router(&config, true).await.unwrap();

    let request = Request::builder()
        .uri("/healthcheck")
        .header(header::ORIGIN, "https://portal.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://portal.example.com"
    );

    let request = Request::builder()
        .uri("/healthcheck")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_invalid_cors_origin_is_config_error() {
    let mut config = AppConfig::default();
    config.backend.cors = Some(CorsConfig {
        origin: "bad\norigin".to_string(),
    });

    let err = create_standalone_router(&config, true).await.unwrap_err();
    assert_eq!(err.to_http_response_parts().1, "CONFIG_ERROR");
}

#[tokio::test]
async fn test_refresh_clears_catalog_cache() {
    let app = create_standalone_router(&AppConfig::default(), false)
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/catalog/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
