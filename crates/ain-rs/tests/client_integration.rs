//! Integration tests for `ProposalClient`.
//!
//! Each test starts a small axum stub of the proposal API on a random port.

use ain_rs::{
    AinError, Language, ProposalClient, RefinementKind, RefinementRequest, UserPayload,
};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/analyze_purpose/",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "suggestion": format!(
                        "Purpose: {} ({} months, {})",
                        body["purpose"].as_str().unwrap_or_default(),
                        body["development_time"],
                        body["language"].as_str().unwrap_or("-"),
                    )
                }))
            }),
        )
        .route(
            "/generate_full_proposal/",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/refine_proposal/",
            post(|Json(body): Json<Value>| async move {
                let request = body["refinement_request"].as_str().unwrap_or_default();
                if request.ends_with('?') {
                    Json(json!({"type": "answer", "content": "About three months."}))
                } else {
                    Json(json!({"suggestion": "### Overview\nRevised."}))
                }
            }),
        )
        .route(
            "/execute_custom_prompt/",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "suggestion": format!("{}|{}", body["language"].as_str().unwrap_or("-"), body["prompt"].as_str().unwrap_or_default())
                }))
            }),
        )
        .route("/generate_prompt/", post(|| async { "not json" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn payload() -> UserPayload {
    UserPayload {
        purpose: "Clinic booking".into(),
        project_type: "web".into(),
        budget: 800_000,
        experience_level: "beginner".into(),
        weekly_hours: "10-20".into(),
        development_time: Some(6),
        language: Some(Language::Ja),
    }
}

#[tokio::test]
async fn health_reports_live_backend() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(&base).unwrap();
    assert!(client.health().await);
}

#[tokio::test]
async fn analyze_purpose_sends_payload() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(&base).unwrap();
    let reply = client.analyze_purpose(&payload()).await.unwrap();
    assert_eq!(reply.suggestion, "Purpose: Clinic booking (6 months, ja)");
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(&base).unwrap();
    let err = client.generate_full_proposal(&payload()).await.unwrap_err();
    match &err {
        AinError::Http {
            endpoint, status, ..
        } => {
            assert_eq!(endpoint, "/generate_full_proposal/");
            assert_eq!(*status, 500);
        }
        other => panic!("expected Http, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "HTTP error! status: 500 - Internal Server Error"
    );
}

#[tokio::test]
async fn refine_accepts_typed_and_plain_replies() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(&base).unwrap();

    let mut request = RefinementRequest {
        user_payload: payload(),
        current_proposal: "### Overview\nDraft.".into(),
        refinement_request: "How long will this take?".into(),
    };
    let answer = client.refine_proposal(&request).await.unwrap();
    assert_eq!(answer.kind, RefinementKind::Answer);
    assert_eq!(answer.content, "About three months.");

    request.refinement_request = "Make it shorter".into();
    let revised = client.refine_proposal(&request).await.unwrap();
    assert_eq!(revised.kind, RefinementKind::Proposal);
    assert_eq!(revised.content, "### Overview\nRevised.");
}

#[tokio::test]
async fn custom_prompt_carries_language() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(format!("{base}/")).unwrap();
    let reply = client
        .execute_custom_prompt("Build a booking app", Language::En)
        .await
        .unwrap();
    assert_eq!(reply.suggestion, "en|Build a booking app");
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let base = spawn_stub().await;
    let client = ProposalClient::new(&base).unwrap();
    let err = client.generate_prompt(&payload()).await.unwrap_err();
    assert!(matches!(err, AinError::Decode(_)));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = format!("http://{addr}");
    let client = ProposalClient::new(&base).unwrap();
    let err = client.analyze_purpose(&payload()).await.unwrap_err();
    match err {
        AinError::Unreachable { base_url } => assert_eq!(base_url, base),
        other => panic!("expected Unreachable, got {other:?}"),
    }
    assert!(!client.health().await);
}
