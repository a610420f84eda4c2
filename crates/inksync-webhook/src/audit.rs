// crates/inksync-webhook/src/audit.rs
// ============================================================================
// Module: Webhook Audit Logging
// Description: Structured audit events for webhook request handling.
// Purpose: Emit one JSON line per webhook request without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines the audit event payload and sinks for webhook request
//! logging. It is intentionally lightweight so deployments can route events
//! to their preferred logging pipeline without redesign.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Webhook audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Request outcome label.
    pub outcome: &'static str,
    /// Vendor document identifier when one was extracted.
    pub document_id: Option<String>,
    /// Canonical status applied by the reconciler, when any.
    pub status: Option<&'static str>,
    /// Error message for rejected or failed requests.
    pub error: Option<String>,
    /// Raw inbound payload; unparseable bodies are carried as a lossy string.
    pub payload: Option<Value>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

/// Inputs required to construct a webhook audit event.
pub struct WebhookAuditEventParams {
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Request outcome label.
    pub outcome: &'static str,
    /// Vendor document identifier when one was extracted.
    pub document_id: Option<String>,
    /// Canonical status applied by the reconciler, when any.
    pub status: Option<&'static str>,
    /// Error message for rejected or failed requests.
    pub error: Option<String>,
    /// Raw inbound payload when one was received.
    pub payload: Option<Value>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

impl WebhookAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: WebhookAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "signature_webhook",
            timestamp_ms,
            peer_ip: params.peer_ip,
            outcome: params.outcome,
            document_id: params.document_id,
            status: params.status,
            error: params.error,
            payload: params.payload,
            request_bytes: params.request_bytes,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for webhook request events.
pub trait WebhookAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &WebhookAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl WebhookAuditSink for StderrAuditSink {
    fn record(&self, event: &WebhookAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl WebhookAuditSink for FileAuditSink {
    fn record(&self, event: &WebhookAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl WebhookAuditSink for NoopAuditSink {
    fn record(&self, _event: &WebhookAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
