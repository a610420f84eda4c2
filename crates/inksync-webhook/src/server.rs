// crates/inksync-webhook/src/server.rs
// ============================================================================
// Module: Webhook Server
// Description: Axum HTTP endpoint for vendor signature callbacks.
// Purpose: Map vendor webhook requests onto the reconciler with strict codes.
// Dependencies: inksync-config, inksync-core, axum, tokio
// ============================================================================

//! ## Overview
//! The webhook server exposes `POST /signature-webhook` for vendor callbacks,
//! an `OPTIONS` preflight for browser-hosted vendor consoles, and
//! `GET /healthz` for liveness probes. Vendor payloads are untrusted: bodies
//! over the configured limit return 413, unparseable or unmatchable payloads
//! return 400, and the vendor's own status vocabulary is never trusted beyond
//! the canonical mapping. Notification failures are logged and swallowed so a
//! lost email can never make the vendor re-deliver an already-applied event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use inksync_config::ServerConfig;
use inksync_core::CanonicalStatus;
use inksync_core::NotificationEvent;
use inksync_core::Notifier;
use inksync_core::ReconcileError;
use inksync_core::ReconcileOutcome;
use inksync_core::Reconciler;
use inksync_core::SharedRequestStore;
use inksync_core::SignatureEvent;
use inksync_core::Timestamp;
use inksync_core::normalize_payload;
use serde_json::Value;
use serde_json::json;

use crate::audit::WebhookAuditEvent;
use crate::audit::WebhookAuditEventParams;
use crate::audit::WebhookAuditSink;

// ============================================================================
// SECTION: Webhook Server
// ============================================================================

/// Webhook server instance.
pub struct WebhookServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shared handler state.
    state: Arc<WebhookState>,
}

/// Shared state for webhook handlers.
struct WebhookState {
    /// Reconciler over the signature-request store.
    reconciler: Reconciler<SharedRequestStore>,
    /// Best-effort notifier for terminal transitions.
    notifier: Arc<dyn Notifier>,
    /// Audit sink for request events.
    audit: Arc<dyn WebhookAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

impl WebhookServer {
    /// Builds a new webhook server over an assembled store and notifier.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: SharedRequestStore,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn WebhookAuditSink>,
    ) -> Self {
        let state = Arc::new(WebhookState {
            reconciler: Reconciler::new(store),
            notifier,
            audit,
            max_body_bytes: config.max_body_bytes,
        });
        Self {
            config,
            state,
        }
    }

    /// Serves webhook requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookServerError`] when the bind address is invalid or the
    /// server fails.
    pub async fn serve(self) -> Result<(), WebhookServerError> {
        let addr: SocketAddr = self
            .config
            .bind
            .parse()
            .map_err(|_| WebhookServerError::Config("invalid bind address".to_string()))?;
        // Bodies past the handler limit still need to reach the size check so
        // the handler controls the 413 response body.
        let body_limit = self.config.max_body_bytes.saturating_add(1);
        let app = Router::new()
            .route(
                "/signature-webhook",
                post(handle_webhook)
                    .options(handle_preflight)
                    .fallback(handle_method_not_allowed),
            )
            .route("/healthz", get(handle_health))
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| WebhookServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| WebhookServerError::Transport("http server failed".to_string()))
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles vendor signature callbacks.
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Result<Bytes, BytesRejection>,
) -> Response {
    let peer_ip = Some(peer.ip().to_string());
    let reply = match bytes {
        Ok(bytes) => process_with_blocking(&state, peer_ip, &bytes),
        Err(rejection) => reject_unreadable_body(&state, peer_ip, &rejection),
    };
    with_cors(reply.into_response())
}

/// Handles CORS preflight requests from browser-hosted vendor consoles.
async fn handle_preflight() -> Response {
    with_cors(StatusCode::NO_CONTENT.into_response())
}

/// Handles requests with an unsupported method on the webhook path.
async fn handle_method_not_allowed() -> Response {
    with_cors((StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response())
}

/// Handles liveness probes.
async fn handle_health() -> Response {
    with_cors((StatusCode::OK, axum::Json(json!({ "status": "ok" }))).into_response())
}

/// Adds permissive CORS headers to a response.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers
        .insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"));
    response
}

// ============================================================================
// SECTION: Request Processing
// ============================================================================

/// Webhook reply with a status code and the matching body form.
struct WebhookReply {
    /// HTTP status code for the response.
    status: StatusCode,
    /// Response body.
    body: ReplyBody,
}

/// Response body forms for the webhook endpoint.
enum ReplyBody {
    /// JSON acknowledgement for accepted events.
    Success,
    /// Plain-text error description.
    Message(String),
}

impl WebhookReply {
    /// Builds the success reply.
    fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Success,
        }
    }

    /// Builds a plain-text error reply with the given status code.
    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: ReplyBody::Message(message.to_string()),
        }
    }

    /// Returns the error text for rejected or failed replies.
    fn error_text(&self) -> Option<&str> {
        match &self.body {
            ReplyBody::Success => None,
            ReplyBody::Message(message) => Some(message),
        }
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        match self.body {
            ReplyBody::Success => {
                (self.status, axum::Json(json!({ "success": true }))).into_response()
            }
            ReplyBody::Message(message) => (self.status, message).into_response(),
        }
    }
}

/// Processes a webhook body, shifting to a blocking context when available.
fn process_with_blocking(
    state: &WebhookState,
    peer_ip: Option<String>,
    bytes: &Bytes,
) -> WebhookReply {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| process_webhook(state, peer_ip, bytes))
        }
        _ => process_webhook(state, peer_ip, bytes),
    }
}

/// Validates, normalizes, and reconciles one webhook body.
fn process_webhook(state: &WebhookState, peer_ip: Option<String>, bytes: &Bytes) -> WebhookReply {
    if bytes.len() > state.max_body_bytes {
        let reply = WebhookReply::error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        record_rejection(state, peer_ip, None, None, &reply, bytes.len());
        return reply;
    }
    let Ok(payload) = serde_json::from_slice::<Value>(bytes.as_ref()) else {
        let raw = Value::String(String::from_utf8_lossy(bytes.as_ref()).into_owned());
        let reply = WebhookReply::error(StatusCode::BAD_REQUEST, "invalid json payload");
        record_rejection(state, peer_ip, None, Some(raw), &reply, bytes.len());
        return reply;
    };
    let event = match normalize_payload(&payload) {
        Ok(event) => event,
        Err(err) => {
            let reply = WebhookReply::error(StatusCode::BAD_REQUEST, &err.to_string());
            record_rejection(state, peer_ip, None, Some(payload), &reply, bytes.len());
            return reply;
        }
    };
    let document_id = event.document_id.to_string();
    match state.reconciler.reconcile(&event, current_timestamp()) {
        Ok(outcome) => {
            let (outcome_label, status) = describe_outcome(&outcome);
            notify_terminal(state, &event, &outcome);
            state.audit.record(&WebhookAuditEvent::new(WebhookAuditEventParams {
                peer_ip,
                outcome: outcome_label,
                document_id: Some(document_id),
                status,
                error: None,
                payload: Some(payload),
                request_bytes: bytes.len(),
            }));
            WebhookReply::ok()
        }
        Err(err) => {
            let status = match err {
                ReconcileError::UnknownDocument(_) => StatusCode::BAD_REQUEST,
                ReconcileError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let reply = WebhookReply::error(status, &err.to_string());
            record_rejection(state, peer_ip, Some(document_id), Some(payload), &reply, bytes.len());
            reply
        }
    }
}

/// Rejects a body the extractor could not buffer, keeping the audit trail.
fn reject_unreadable_body(
    state: &WebhookState,
    peer_ip: Option<String>,
    rejection: &BytesRejection,
) -> WebhookReply {
    let status = rejection.status();
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "request body too large"
    } else {
        "unreadable request body"
    };
    let reply = WebhookReply::error(status, message);
    record_rejection(state, peer_ip, None, None, &reply, 0);
    reply
}

/// Records a rejected or failed request in the audit log.
fn record_rejection(
    state: &WebhookState,
    peer_ip: Option<String>,
    document_id: Option<String>,
    payload: Option<Value>,
    reply: &WebhookReply,
    request_bytes: usize,
) {
    let outcome = if reply.status.is_server_error() { "error" } else { "rejected" };
    let error = reply.error_text().map(str::to_string);
    state.audit.record(&WebhookAuditEvent::new(WebhookAuditEventParams {
        peer_ip,
        outcome,
        document_id,
        status: None,
        error,
        payload,
        request_bytes,
    }));
}

/// Labels a reconcile outcome for audit logging.
const fn describe_outcome(outcome: &ReconcileOutcome) -> (&'static str, Option<&'static str>) {
    match outcome {
        ReconcileOutcome::Applied {
            transition, ..
        } => ("applied", Some(transition.as_str())),
        ReconcileOutcome::AlreadyTerminal {
            ..
        } => ("already_terminal", None),
    }
}

/// Sends a best-effort notification for a reconciled terminal transition.
///
/// Failures are audited and swallowed; a lost notification never changes the
/// webhook response.
fn notify_terminal(state: &WebhookState, event: &SignatureEvent, outcome: &ReconcileOutcome) {
    let ReconcileOutcome::Applied {
        transition,
        record,
        ..
    } = outcome
    else {
        return;
    };
    if !matches!(transition, CanonicalStatus::Signed | CanonicalStatus::Cancelled) {
        return;
    }
    let notification = NotificationEvent {
        transition: *transition,
        contract_number: record.contract_number.clone(),
        client_name: record.client_name.clone(),
        client_email: record.client_email.clone(),
        signer_name: event.signer.as_ref().map(|signer| signer.name.clone()),
        document_url: record.document_url.clone(),
    };
    if let Err(err) = state.notifier.notify(&notification) {
        state.audit.record(&WebhookAuditEvent::new(WebhookAuditEventParams {
            peer_ip: None,
            outcome: "notify_failed",
            document_id: Some(event.document_id.to_string()),
            status: Some(transition.as_str()),
            error: Some(err.to_string()),
            payload: None,
            request_bytes: 0,
        }));
    }
}

/// Reads the host clock as a reconciliation timestamp.
fn current_timestamp() -> Timestamp {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    Timestamp::UnixMillis(i64::try_from(millis).unwrap_or(i64::MAX))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Webhook server errors.
#[derive(Debug, thiserror::Error)]
pub enum WebhookServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
