use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use promptmaster_cli::cli::ONE_SHOT;
use promptmaster_cli::{router, AppState, ServedSurfaces};
use promptmaster_preview::bootstrap::js_string_literal;
use promptmaster_preview::{Dialect, PreviewScheduler, RenderHost, RenderHostHandle, SourceDocument};
use serde_json::Value;
use tower::ServiceExt;

fn setup() -> (AppState, RenderHostHandle) {
    let surfaces = ServedSurfaces::new();
    let (host, _task) = RenderHost::spawn(surfaces.clone());
    let scheduler = PreviewScheduler::spawn(ONE_SHOT, host.clone());
    (AppState::new(scheduler, surfaces), host)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_preview_is_sandboxed_placeholder_when_empty() {
    let (state, _host) = setup();
    let response = router(state).oneshot(get("/preview")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_SECURITY_POLICY],
        "sandbox allow-scripts"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert!(body_text(response).await.contains("<body></body>"));
}

#[tokio::test]
async fn test_preview_serves_rendered_document() {
    let (state, host) = setup();
    state
        .scheduler()
        .submit(SourceDocument::new("<div>B</div>", Dialect::Html))
        .unwrap();
    assert!(state.scheduler().settled().await.document().is_some());
    host.flush().await.unwrap();

    let response = router(state).oneshot(get("/preview")).await.unwrap();
    let body = body_text(response).await;
    assert!(body.contains(&js_string_literal("<div>B</div>")));
}

#[tokio::test]
async fn test_status_reports_failure() {
    let (state, _host) = setup();
    state
        .scheduler()
        .submit(SourceDocument::new("<div><span></div>", Dialect::Html))
        .unwrap();
    state.scheduler().settled().await;

    let response = router(state).oneshot(get("/status")).await.unwrap();
    let status: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(status["state"], "failed");
    assert_eq!(status["dialect"], "html");
    assert!(status["message"]
        .as_str()
        .unwrap()
        .starts_with("Syntax error in HTML structure"));
}

#[tokio::test]
async fn test_theme_endpoint_switches_theme() {
    let (state, _host) = setup();
    let app = router(state.clone());

    let response = app.oneshot(post_json("/theme", r#"{"dark":true}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.scheduler().state().is_dark);
    assert_eq!(state.status().toasts.len(), 1);
}

#[tokio::test]
async fn test_dialect_endpoint_rejects_unknown_dialect() {
    let (state, _host) = setup();
    let response = router(state)
        .oneshot(post_json("/dialect", r#"{"dialect":"vue"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Unknown dialect 'vue'"));
}

#[tokio::test]
async fn test_dialect_endpoint_reschedules() {
    let (state, _host) = setup();
    state
        .scheduler()
        .submit(SourceDocument::new("<b>x</b>", Dialect::Html))
        .unwrap();
    state.scheduler().settled().await;

    let response = router(state.clone())
        .oneshot(post_json("/dialect", r#"{"dialect":"jsx"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let outcome = state.scheduler().settled().await;
    assert!(outcome.document().unwrap().as_str().contains("Babel.transform"));
}

#[tokio::test]
async fn test_shell_page_creates_sandboxed_frames() {
    let (state, _host) = setup();
    let body = body_text(router(state).oneshot(get("/")).await.unwrap()).await;
    assert!(body.contains("setAttribute(\"sandbox\", \"allow-scripts\")"));
    assert!(body.contains("new EventSource(\"/events\")"));
}
