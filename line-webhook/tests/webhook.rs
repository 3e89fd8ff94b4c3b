//! End-to-end tests for the HTTP surface.
//!
//! These drive the axum router directly with a recording reply sender in
//! place of the LINE API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt; // For `oneshot`

use line_webhook::event::ReplyToken;
use line_webhook::reply::GREETING_MESSAGE;
use line_webhook::web::{compute_signature, router, AppState, SIGNATURE_HEADER};
use line_webhook::{EventDispatcher, IngestionPipeline, KeywordComposer, ReplyError, ReplySender};

const SECRET: &str = "integration-channel-secret";

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    fail_tokens: Vec<&'static str>,
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn send(&self, reply_token: &ReplyToken, message: &str) -> Result<(), ReplyError> {
        if self.fail_tokens.iter().any(|t| *t == reply_token.as_str()) {
            return Err(ReplyError::Status {
                status: 400,
                body: r#"{"message":"Invalid reply token"}"#.to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((reply_token.as_str().to_string(), message.to_string()));
        Ok(())
    }
}

fn app(sender: Arc<RecordingSender>) -> Router {
    let dispatcher = EventDispatcher::new(sender, Arc::new(KeywordComposer)).with_concurrency(4);
    let pipeline = IngestionPipeline::new(SECRET, dispatcher, Duration::from_secs(5)).unwrap();
    router(AppState::new(pipeline))
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn sign(body: &str) -> String {
    compute_signature(body.as_bytes(), SECRET.as_bytes()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_text_message_hello_gets_greeting() {
    let sender = Arc::new(RecordingSender::default());
    let body = r#"{"destination":"Ubot","events":[{
        "type":"message",
        "replyToken":"reply-1",
        "source":{"type":"user","userId":"U1"},
        "timestamp":1462629479859,
        "message":{"type":"text","id":"1","text":"hello"}
    }]}"#;

    let response = app(sender.clone())
        .oneshot(webhook_request(body, Some(&sign(body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "reply-1");
    assert_eq!(sent[0].1, GREETING_MESSAGE);
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let sender = Arc::new(RecordingSender::default());
    let body = r#"{"events":[{"type":"follow","replyToken":"reply-1"}]}"#;

    let response = app(sender.clone())
        .oneshot(webhook_request(body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_and_invalid_signature_look_the_same() {
    let body = r#"{"events":[]}"#;

    let missing = app(Arc::new(RecordingSender::default()))
        .oneshot(webhook_request(body, None))
        .await
        .unwrap();
    let invalid = app(Arc::new(RecordingSender::default()))
        .oneshot(webhook_request(body, Some(&sign(r#"{"events":[ ]}"#))))
        .await
        .unwrap();

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(missing).await, json_body(invalid).await);
}

#[tokio::test]
async fn test_malformed_envelope_is_bad_request() {
    let sender = Arc::new(RecordingSender::default());
    let body = r#"{"events":"#;

    let response = app(sender.clone())
        .oneshot(webhook_request(body, Some(&sign(body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_batch_is_acknowledged() {
    let body = r#"{"destination":"Ubot","events":[]}"#;

    let response = app(Arc::new(RecordingSender::default()))
        .oneshot(webhook_request(body, Some(&sign(body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_per_event_failures_do_not_affect_status() {
    let sender = Arc::new(RecordingSender {
        fail_tokens: vec!["reply-2"],
        ..Default::default()
    });
    let body = r#"{"events":[
        {"type":"message","replyToken":"reply-1","source":{"userId":"U1"},"message":{"type":"text","text":"one"}},
        {"type":"message","replyToken":"reply-2","source":{"userId":"U2"},"message":{"type":"text","text":"two"}},
        {"type":"message","replyToken":"reply-3","source":{"userId":"U3"},"message":{"type":"text","text":"three"}},
        {"type":"postback","replyToken":"reply-4","source":{"userId":"U4"},"postback":{"data":"not json"}}
    ]}"#;

    let response = app(sender.clone())
        .oneshot(webhook_request(body, Some(&sign(body))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let mut tokens: Vec<String> = sender
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(t, _)| t.clone())
        .collect();
    tokens.sort();
    assert_eq!(tokens, vec!["reply-1", "reply-3"]);
}

#[tokio::test]
async fn test_signature_header_name_is_case_insensitive() {
    let sender = Arc::new(RecordingSender::default());
    let body = r#"{"events":[{"type":"follow","replyToken":"reply-1","source":{"userId":"U1"}}]}"#;

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("X-Line-Signature", sign(body))
        .body(Body::from(body))
        .unwrap();

    let response = app(sender.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sender.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app(Arc::new(RecordingSender::default()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
