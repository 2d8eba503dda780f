//! Unit tests for the HTTP router

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use postgres_cluster_api::api::build_router;
use postgres_cluster_api::health::HealthState;

use crate::common::*;

struct TestApp {
    router: Router,
    health_state: Arc<HealthState>,
}

impl TestApp {
    fn new(fake: FakeControlPlane) -> Self {
        let (ctx, health_state) = test_context_with_metrics(fake);
        let router = build_router(Arc::new(ctx), health_state.clone());
        Self {
            router,
            health_state,
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let (status, _, body) = self.send(req).await;
        (status, body)
    }
}

fn demo_body() -> Value {
    json!({
        "name": "demo",
        "user": "alice",
        "password": "p1",
        "databases": ["db1"],
        "storage": "1Gi"
    })
}

#[tokio::test(start_paused = true)]
async fn test_create_returns_cluster_json() {
    let app = TestApp::new(FakeControlPlane::new());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(demo_body().to_string()))
        .unwrap();

    let (status, headers, body) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "clusterName": "demo",
            "user": "alice",
            "databases": ["db1"],
            "storage": "1Gi",
            "password": "p1",
            "nodePort": FAKE_NODE_PORT
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_malformed_json() {
    let app = TestApp::new(FakeControlPlane::new());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/create")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let (status, _, body) = app.send(req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid json");
}

#[tokio::test(start_paused = true)]
async fn test_create_missing_field() {
    let app = TestApp::new(FakeControlPlane::new());
    let mut body = demo_body();
    body["storage"] = json!("");

    let (status, body) = app.call(Method::POST, "/create", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("are required"));
}

#[tokio::test(start_paused = true)]
async fn test_create_conflict_is_500() {
    let app = TestApp::new(FakeControlPlane::new());
    app.call(Method::POST, "/create", Some(demo_body())).await;

    let (status, body) = app.call(Method::POST, "/create", Some(demo_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("k8s create error: "));
}

#[tokio::test(start_paused = true)]
async fn test_create_wrong_method() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, _) = app.call(Method::GET, "/create", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(start_paused = true)]
async fn test_get_without_name() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, body) = app.call(Method::GET, "/get", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing name param"));
}

#[tokio::test(start_paused = true)]
async fn test_get_unknown_is_404() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, body) = app.call(Method::GET, "/get?name=nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.starts_with("not found: "));
}

#[tokio::test(start_paused = true)]
async fn test_get_omits_password() {
    let app = TestApp::new(FakeControlPlane::new());
    app.call(Method::POST, "/create", Some(demo_body())).await;

    let (status, body) = app.call(Method::GET, "/get?name=demo", None).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["clusterName"], "demo");
    assert_eq!(body["databases"], json!(["db1"]));
    assert_eq!(body["nodePort"], FAKE_NODE_PORT);
    assert!(body.get("password").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_delete_then_get_is_404() {
    let app = TestApp::new(FakeControlPlane::new());
    app.call(Method::POST, "/create", Some(demo_body())).await;

    let (status, body) = app.call(Method::DELETE, "/delete?name=demo", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = app.call(Method::GET, "/get?name=demo", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_delete_accepts_any_method() {
    let app = TestApp::new(FakeControlPlane::new());
    app.call(Method::POST, "/create", Some(demo_body())).await;

    let (status, _) = app.call(Method::POST, "/delete?name=demo", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test(start_paused = true)]
async fn test_delete_without_name() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, body) = app.call(Method::DELETE, "/delete", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing name param"));
}

#[tokio::test(start_paused = true)]
async fn test_delete_unknown_is_500() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, body) = app.call(Method::DELETE, "/delete?name=nope", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("delete error: "));
}

#[tokio::test(start_paused = true)]
async fn test_list_returns_names() {
    let app = TestApp::new(FakeControlPlane::new());
    let (status, body) = app.call(Method::GET, "/list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!([]));

    app.call(Method::POST, "/create", Some(demo_body())).await;
    let (_, body) = app.call(Method::GET, "/list", None).await;

    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!(["demo"]));
}

#[tokio::test(start_paused = true)]
async fn test_list_failure() {
    let fake = FakeControlPlane::new();
    fake.state().failures.list = Some(500);
    let app = TestApp::new(fake);

    let (status, body) = app.call(Method::GET, "/list", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("list error: "));
}

#[tokio::test(start_paused = true)]
async fn test_cors_allows_any_origin() {
    let app = TestApp::new(FakeControlPlane::new());
    let req = Request::builder()
        .method(Method::GET)
        .uri("/list")
        .header(header::ORIGIN, "https://dashboard.example.com")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cors_preflight() {
    let app = TestApp::new(FakeControlPlane::new());
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/create")
        .header(header::ORIGIN, "https://dashboard.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test(start_paused = true)]
async fn test_probes() {
    let app = TestApp::new(FakeControlPlane::new());

    let (status, _) = app.call(Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.health_state.set_ready(true).await;
    let (status, _) = app.call(Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_count_requests() {
    let app = TestApp::new(FakeControlPlane::new());
    app.call(Method::GET, "/get", None).await;
    app.call(Method::GET, "/list", None).await;

    let (status, body) = app.call(Method::GET, "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("pgcluster_api_requests_total"));
    assert!(body.contains("outcome=\"client_error\""));
    assert!(body.contains("operation=\"list\""));
}
