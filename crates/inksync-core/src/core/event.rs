// crates/inksync-core/src/core/event.rs
// ============================================================================
// Module: InkSync Payload Normalizer
// Description: Normalization of vendor webhook payloads into canonical events.
// Purpose: Isolate vendor-shape knowledge in one ordered matcher list.
// Dependencies: crate::core::identifiers, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The signing vendor delivers webhook payloads in more than one shape: a
//! flat shape carrying `signature_request_id`/`document_id`/`id` at the top
//! level, and a nested shape carrying `document.*` fields. Normalization runs
//! an ordered list of shape matchers; each matcher either produces the
//! canonical event or declines, and the first match wins. Adding a vendor
//! shape is a pure-addition change to the matcher list.
//!
//! Normalization has no side effects. A payload with no recognizable
//! document identifier fails with [`NormalizeError::MissingDocumentIdentifier`]
//! and must surface as a client error, never a retryable server error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ExternalDocumentId;

// ============================================================================
// SECTION: Normalized Event
// ============================================================================

/// Signer details carried by a webhook event.
///
/// # Invariants
/// - Fields reflect the vendor payload verbatim; no validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSigner {
    /// Signer display name.
    pub name: String,
    /// Signer email address.
    pub email: String,
}

/// Canonical webhook event produced by normalization.
///
/// # Invariants
/// - `vendor_status` is the raw vendor string; mapping happens downstream.
/// - `vendor_signed_at` is carried as an opaque string and never parsed.
/// - `download_url` is only populated on completion-type events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEvent {
    /// Vendor-assigned document identifier.
    pub document_id: ExternalDocumentId,
    /// Raw vendor status string.
    pub vendor_status: String,
    /// Vendor-reported signing timestamp, when present.
    pub vendor_signed_at: Option<String>,
    /// Signed-document download location, when present.
    pub download_url: Option<String>,
    /// Signer details, when present.
    pub signer: Option<EventSigner>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No known identifier field was present in the payload.
    #[error("webhook payload carries no document identifier")]
    MissingDocumentIdentifier,
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Shape matcher signature: produce the canonical event or decline.
type ShapeMatcher = fn(&Value) -> Option<SignatureEvent>;

/// Ordered vendor shape matchers; the first match wins.
const SHAPE_MATCHERS: &[ShapeMatcher] = &[match_flat_shape, match_nested_shape];

/// Normalizes an arbitrary vendor webhook payload into a canonical event.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingDocumentIdentifier`] when no matcher
/// recognizes a document identifier in the payload.
pub fn normalize_payload(payload: &Value) -> Result<SignatureEvent, NormalizeError> {
    SHAPE_MATCHERS
        .iter()
        .find_map(|matcher| matcher(payload))
        .ok_or(NormalizeError::MissingDocumentIdentifier)
}

/// Matches the flat vendor shape with top-level identifier fields.
///
/// Identifier priority: `signature_request_id`, then `document_id`, then
/// `id`.
fn match_flat_shape(payload: &Value) -> Option<SignatureEvent> {
    let object = payload.as_object()?;
    let document_id = ["signature_request_id", "document_id", "id"]
        .iter()
        .find_map(|field| object.get(*field).and_then(Value::as_str))?;
    Some(SignatureEvent {
        document_id: ExternalDocumentId::new(document_id),
        vendor_status: string_field(payload, "status").unwrap_or_default(),
        vendor_signed_at: string_field(payload, "signed_at"),
        download_url: string_field(payload, "download_url"),
        signer: signer_field(payload.get("signer")),
    })
}

/// Matches the nested vendor shape with `document.*` fields.
///
/// `document.download_url` is supplied by the vendor only on
/// completion-type events and is carried through verbatim.
fn match_nested_shape(payload: &Value) -> Option<SignatureEvent> {
    let document = payload.get("document")?;
    let document_id = ["id", "document_id"]
        .iter()
        .find_map(|field| document.get(*field).and_then(Value::as_str))?;
    Some(SignatureEvent {
        document_id: ExternalDocumentId::new(document_id),
        vendor_status: string_field(document, "status")
            .or_else(|| string_field(payload, "status"))
            .unwrap_or_default(),
        vendor_signed_at: string_field(document, "signed_at")
            .or_else(|| string_field(payload, "signed_at")),
        download_url: string_field(document, "download_url"),
        signer: signer_field(document.get("signer")).or_else(|| signer_field(payload.get("signer"))),
    })
}

/// Extracts an owned string field from a JSON object value.
fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Extracts signer details from an optional JSON object value.
fn signer_field(value: Option<&Value>) -> Option<EventSigner> {
    let signer = value?;
    let name = signer.get("name").and_then(Value::as_str)?;
    let email = signer.get("email").and_then(Value::as_str)?;
    Some(EventSigner {
        name: name.to_string(),
        email: email.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
