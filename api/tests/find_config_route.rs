use std::sync::Arc;

use api::{AppState, Settings, router};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, concat: bool) -> Settings {
    let uri = server.uri();
    let concat = if concat { "true" } else { "false" };
    Settings::from_lookup(|key| match key {
        "SERVER" => Some(uri.clone()),
        "GITHUB_TOKEN" => Some("ghp_test".into()),
        "PLUGIN_CONCAT" => Some(concat.into()),
        _ => None,
    })
    .unwrap()
}

fn build_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn push_event(git_ref: &str) -> Value {
    json!({
        "repo": {"namespace": "octo", "name": "mono", "config_path": ".drone.yml", "default_branch": "main"},
        "build": {"before": "aaa", "after": "bbb", "ref": git_ref, "trigger": "@hook"}
    })
}

async fn mount_file(server: &MockServer, file: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v3/repos/octo/mono/contents/{file}")))
        .and(query_param("ref", "bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_compare(server: &MockServer, files: &[&str]) {
    let files: Vec<Value> = files.iter().map(|f| json!({"filename": f})).collect();
    Mock::given(method("GET"))
        .and(path("/api/v3/repos/octo/mono/compare/aaa...bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": files})))
        .mount(server)
        .await;
}

async fn missing_files_are_404(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn push_returns_nearest_config() {
    let server = MockServer::start().await;
    mount_compare(&server, &["svc/api/main.go"]).await;
    mount_file(&server, "svc/.drone.yml", "kind: pipeline\nname: svc\n").await;
    mount_file(&server, ".drone.yml", "kind: pipeline\nname: root\n").await;
    missing_files_are_404(&server).await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(build_request(push_event("refs/heads/main")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"data": "kind: pipeline\nname: svc\n"})
    );
}

#[tokio::test]
async fn concat_returns_multi_document() {
    let server = MockServer::start().await;
    mount_compare(&server, &["svc/main.go"]).await;
    mount_file(&server, "svc/.drone.yml", "name: svc").await;
    mount_file(&server, ".drone.yml", "name: root").await;
    missing_files_are_404(&server).await;

    let app = router(Arc::new(AppState::new(settings(&server, true))));
    let resp = app
        .oneshot(build_request(push_event("refs/heads/main")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await["data"].as_str().unwrap().to_string();
    assert_eq!(
        data,
        "# .drone.yml origin: /svc/.drone.yml\nname: svc\n\n---\n# .drone.yml origin: /.drone.yml\nname: root\n"
    );
}

#[tokio::test]
async fn empty_diff_is_no_content() {
    let server = MockServer::start().await;
    mount_compare(&server, &[]).await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(build_request(push_event("refs/heads/main")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn no_config_is_not_found() {
    let server = MockServer::start().await;
    mount_compare(&server, &["a/b.go"]).await;
    missing_files_are_404(&server).await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(build_request(push_event("refs/heads/main")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "NO_CONFIG_FOUND");
}

#[tokio::test]
async fn compare_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(build_request(push_event("refs/heads/main")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn malformed_pull_request_ref_is_bad_request() {
    let server = MockServer::start().await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(build_request(push_event("refs/pull/x/head")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "INVALID_BUILD");
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let server = MockServer::start().await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_ok() {
    let server = MockServer::start().await;

    let app = router(Arc::new(AppState::new(settings(&server, false))));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}
