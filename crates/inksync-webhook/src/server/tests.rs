// crates/inksync-webhook/src/server/tests.rs
// ============================================================================
// Module: Webhook Server Tests
// Description: Request-processing tests for the webhook endpoint.
// Purpose: Validate status-code mapping, idempotent replays, and notification flow.
// Dependencies: inksync-core, axum, bytes, serde_json, tokio
// ============================================================================

//! ## Overview
//! Drives the webhook processing pipeline end to end over an in-memory
//! store: payload-shape handling, status-code mapping for malformed and
//! unknown inputs, replay and terminal-absorption behavior, best-effort
//! notification delivery, audit payload capture, and response rendering.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use inksync_core::CanonicalStatus;
use inksync_core::ContractStatus;
use inksync_core::ExternalDocumentId;
use inksync_core::InMemoryRequestStore;
use inksync_core::NotificationEvent;
use inksync_core::Notifier;
use inksync_core::NotifyError;
use inksync_core::Reconciler;
use inksync_core::RentalId;
use inksync_core::RequestId;
use inksync_core::SharedRequestStore;
use inksync_core::SignatureRequest;
use inksync_core::SignatureRequestStore;
use inksync_core::Signer;
use inksync_core::Timestamp;
use serde_json::Value;
use serde_json::json;

use super::ReplyBody;
use super::WebhookReply;
use super::WebhookState;
use super::handle_method_not_allowed;
use super::process_webhook;
use super::with_cors;
use crate::audit::NoopAuditSink;
use crate::audit::WebhookAuditEvent;
use crate::audit::WebhookAuditSink;

// ============================================================================
// SECTION: Test Doubles
// ============================================================================

/// Notifier that records delivered events.
struct RecordingNotifier {
    /// Delivered notification events.
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier.
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of the delivered events.
    fn delivered(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.events.lock().expect("notifier lock").push(event.clone());
        Ok(())
    }
}

/// Notifier that always fails delivery.
struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("provider unreachable".to_string()))
    }
}

/// Audit sink that records events for inspection.
struct RecordingAuditSink {
    /// Recorded audit events.
    events: Mutex<Vec<WebhookAuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty recording sink.
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of the recorded events.
    fn recorded(&self) -> Vec<WebhookAuditEvent> {
        self.events.lock().expect("audit lock").clone()
    }
}

impl WebhookAuditSink for RecordingAuditSink {
    fn record(&self, event: &WebhookAuditEvent) {
        self.events.lock().expect("audit lock").push(event.clone());
    }
}

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Builds a pending signature request awaiting vendor callbacks.
fn pending_request(external: &str) -> SignatureRequest {
    SignatureRequest {
        id: RequestId::from_raw(1).expect("non-zero id"),
        rental_id: RentalId::from_raw(7).expect("non-zero id"),
        external_document_id: ExternalDocumentId::new(external),
        contract_number: "MC-2024-0031".to_string(),
        client_name: "Ada Riley".to_string(),
        client_email: "ada@example.com".to_string(),
        status: ContractStatus::Sent,
        signed_at: None,
        document_url: None,
        created_at: Timestamp::UnixMillis(1_700_000_000_000),
        updated_at: Timestamp::UnixMillis(1_700_000_000_000),
        signers: vec![Signer {
            name: "Ada Riley".to_string(),
            email: "ada@example.com".to_string(),
            role: "client".to_string(),
            signed_at: None,
        }],
    }
}

/// Assembled processing state with readable test doubles.
struct Harness {
    /// Shared handler state under test.
    state: WebhookState,
    /// Store backing the reconciler.
    store: SharedRequestStore,
    /// Recording notifier, when used.
    notifier: Arc<RecordingNotifier>,
}

/// Builds a webhook state over a seeded in-memory store.
fn harness(records: &[SignatureRequest]) -> Harness {
    let store = SharedRequestStore::from_store(InMemoryRequestStore::new());
    for record in records {
        store.insert(record).expect("seed record");
    }
    let notifier = Arc::new(RecordingNotifier::new());
    let state = WebhookState {
        reconciler: Reconciler::new(store.clone()),
        notifier: Arc::clone(&notifier) as Arc<dyn Notifier>,
        audit: Arc::new(NoopAuditSink),
        max_body_bytes: 4 * 1024,
    };
    Harness {
        state,
        store,
        notifier,
    }
}

/// Runs one webhook body through the processing pipeline.
fn process(harness: &Harness, body: &Value) -> WebhookReply {
    let bytes = Bytes::from(serde_json::to_vec(body).expect("encode body"));
    process_webhook(&harness.state, Some("203.0.113.9".to_string()), &bytes)
}

/// Loads the seeded record back from the store.
fn reload(harness: &Harness, external: &str) -> SignatureRequest {
    harness
        .store
        .find_by_external_id(&ExternalDocumentId::new(external))
        .expect("load")
        .expect("record exists")
}

/// Asserts that a reply is the JSON success acknowledgement.
fn assert_success(reply: &WebhookReply) {
    assert_eq!(reply.status, StatusCode::OK);
    assert!(matches!(reply.body, ReplyBody::Success));
}

// ============================================================================
// SECTION: Happy Path Scenarios
// ============================================================================

#[test]
fn flat_signed_payload_marks_record_signed_and_notifies() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(
        &harness,
        &json!({
            "signature_request_id": "req_31",
            "status": "signed",
            "signed_at": "2024-06-01T10:00:00Z",
            "download_url": "https://vendor.example/req_31.pdf",
            "signer": { "name": "Ada Riley", "email": "ada@example.com" }
        }),
    );
    assert_success(&reply);

    let record = reload(&harness, "req_31");
    assert_eq!(record.status, ContractStatus::Signed);
    assert!(record.signed_at.is_some());
    assert_eq!(record.document_url.as_deref(), Some("https://vendor.example/req_31.pdf"));
    assert!(record.signers[0].signed_at.is_some());

    let delivered = harness.notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].transition, CanonicalStatus::Signed);
    assert_eq!(delivered[0].contract_number, "MC-2024-0031");
    assert_eq!(delivered[0].signer_name.as_deref(), Some("Ada Riley"));
}

#[test]
fn nested_document_payload_is_accepted() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(
        &harness,
        &json!({
            "document": { "id": "req_31", "status": "completed" }
        }),
    );
    assert_success(&reply);
    assert_eq!(reload(&harness, "req_31").status, ContractStatus::Signed);
}

#[test]
fn rejected_payload_cancels_and_notifies() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(
        &harness,
        &json!({ "document_id": "req_31", "status": "rejected" }),
    );
    assert_success(&reply);
    assert_eq!(reload(&harness, "req_31").status, ContractStatus::Cancelled);

    let delivered = harness.notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].transition, CanonicalStatus::Cancelled);
}

#[test]
fn unrecognized_vendor_status_keeps_record_sent_without_notification() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(
        &harness,
        &json!({ "document_id": "req_31", "status": "viewed_by_recipient" }),
    );
    assert_success(&reply);
    assert_eq!(reload(&harness, "req_31").status, ContractStatus::Sent);
    assert!(harness.notifier.delivered().is_empty());
}

// ============================================================================
// SECTION: Replay and Terminal Absorption
// ============================================================================

#[test]
fn replayed_signed_event_is_a_no_op() {
    let harness = harness(&[pending_request("req_31")]);
    let payload = json!({
        "signature_request_id": "req_31",
        "status": "signed",
        "signed_at": "2024-06-01T10:00:00Z"
    });
    let first = process(&harness, &payload);
    assert_success(&first);
    let signed_at = reload(&harness, "req_31").signed_at;

    let second = process(&harness, &payload);
    assert_success(&second);
    assert_eq!(reload(&harness, "req_31").signed_at, signed_at);
    assert_eq!(harness.notifier.delivered().len(), 1);
}

#[test]
fn events_after_cancellation_are_absorbed() {
    let harness = harness(&[pending_request("req_31")]);
    let first = process(
        &harness,
        &json!({ "document_id": "req_31", "status": "expired" }),
    );
    assert_success(&first);

    let second = process(
        &harness,
        &json!({ "document_id": "req_31", "status": "signed" }),
    );
    assert_success(&second);
    assert_eq!(reload(&harness, "req_31").status, ContractStatus::Cancelled);
    assert_eq!(harness.notifier.delivered().len(), 1);
}

// ============================================================================
// SECTION: Rejection Paths
// ============================================================================

#[test]
fn invalid_json_returns_bad_request() {
    let harness = harness(&[pending_request("req_31")]);
    let bytes = Bytes::from_static(b"{not json");
    let reply = process_webhook(&harness.state, None, &bytes);
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_text(), Some("invalid json payload"));
}

#[test]
fn payload_without_document_identifier_returns_bad_request() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(&harness, &json!({ "status": "signed" }));
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.error_text().expect("error text").contains("document identifier"));
}

#[test]
fn unknown_document_returns_bad_request_without_writes() {
    let harness = harness(&[pending_request("req_31")]);
    let reply = process(
        &harness,
        &json!({ "document_id": "req_unknown", "status": "signed" }),
    );
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.error_text().expect("error text").contains("req_unknown"));
    assert_eq!(reload(&harness, "req_31").status, ContractStatus::Sent);
    assert!(harness.notifier.delivered().is_empty());
}

#[test]
fn oversized_body_returns_payload_too_large() {
    let harness = harness(&[pending_request("req_31")]);
    let oversized = vec![b'a'; harness.state.max_body_bytes + 1];
    let reply = process_webhook(&harness.state, None, &Bytes::from(oversized));
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.error_text(), Some("request body too large"));
}

// ============================================================================
// SECTION: Notification Failure Handling
// ============================================================================

#[test]
fn notification_failure_does_not_change_the_response_or_the_record() {
    let store = SharedRequestStore::from_store(InMemoryRequestStore::new());
    store.insert(&pending_request("req_31")).expect("seed record");
    let state = WebhookState {
        reconciler: Reconciler::new(store.clone()),
        notifier: Arc::new(FailingNotifier),
        audit: Arc::new(NoopAuditSink),
        max_body_bytes: 4 * 1024,
    };
    let bytes = Bytes::from(
        serde_json::to_vec(&json!({ "document_id": "req_31", "status": "signed" }))
            .expect("encode body"),
    );
    let reply = process_webhook(&state, None, &bytes);
    assert_success(&reply);

    let record = store
        .find_by_external_id(&ExternalDocumentId::new("req_31"))
        .expect("load")
        .expect("record exists");
    assert_eq!(record.status, ContractStatus::Signed);
}

// ============================================================================
// SECTION: Audit Trail
// ============================================================================

/// Builds a webhook state over a recording audit sink.
fn audited_state(records: &[SignatureRequest]) -> (WebhookState, Arc<RecordingAuditSink>) {
    let store = SharedRequestStore::from_store(InMemoryRequestStore::new());
    for record in records {
        store.insert(record).expect("seed record");
    }
    let audit = Arc::new(RecordingAuditSink::new());
    let state = WebhookState {
        reconciler: Reconciler::new(store),
        notifier: Arc::new(RecordingNotifier::new()),
        audit: Arc::clone(&audit) as Arc<dyn WebhookAuditSink>,
        max_body_bytes: 4 * 1024,
    };
    (state, audit)
}

#[test]
fn applied_events_are_audited_with_the_raw_payload() {
    let (state, audit) = audited_state(&[pending_request("req_31")]);
    let payload = json!({ "document_id": "req_31", "status": "signed" });
    let bytes = Bytes::from(serde_json::to_vec(&payload).expect("encode body"));
    let reply = process_webhook(&state, Some("203.0.113.9".to_string()), &bytes);
    assert_eq!(reply.status, StatusCode::OK);

    let events = audit.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, "applied");
    assert_eq!(events[0].document_id.as_deref(), Some("req_31"));
    assert_eq!(events[0].payload, Some(payload));
}

#[test]
fn unparseable_bodies_are_audited_with_their_raw_text() {
    let (state, audit) = audited_state(&[pending_request("req_31")]);
    let reply = process_webhook(&state, None, &Bytes::from_static(b"{not json"));
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let events = audit.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, "rejected");
    assert_eq!(events[0].payload, Some(Value::String("{not json".to_string())));
}

// ============================================================================
// SECTION: Response Rendering
// ============================================================================

#[tokio::test]
async fn error_replies_render_as_plain_text() {
    let reply = WebhookReply::error(StatusCode::BAD_REQUEST, "invalid json payload");
    let response = reply.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()["content-type"].to_str().expect("header text");
    assert!(content_type.starts_with("text/plain"));
    let body = axum::body::to_bytes(response.into_body(), 1024).await.expect("body");
    assert_eq!(body.as_ref(), b"invalid json payload");
}

#[tokio::test]
async fn success_replies_render_as_json() {
    let response = WebhookReply::ok().into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.expect("body");
    let value: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(value, json!({ "success": true }));
}

#[tokio::test]
async fn unsupported_methods_get_a_cors_tagged_405() {
    let response = handle_method_not_allowed().await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = axum::body::to_bytes(response.into_body(), 1024).await.expect("body");
    assert_eq!(body.as_ref(), b"Method not allowed");
}

#[test]
fn responses_carry_permissive_cors_headers() {
    let response = with_cors(StatusCode::OK.into_response());
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "content-type");
}
