// crates/inksync-webhook/src/lib.rs
// ============================================================================
// Module: InkSync Webhook
// Description: HTTP webhook endpoint for vendor signature events.
// Purpose: Accept, normalize, and reconcile vendor callbacks over axum.
// Dependencies: inksync-config, inksync-core, axum, tokio
// ============================================================================

//! ## Overview
//! The webhook crate hosts the inbound HTTP surface. A single POST endpoint
//! receives vendor signature callbacks, normalizes them, and drives the
//! reconciler; a health endpoint supports liveness probes. Vendor payloads
//! are untrusted and every malformed input maps to a deliberate status code.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::WebhookAuditEvent;
pub use audit::WebhookAuditSink;
pub use server::WebhookServer;
pub use server::WebhookServerError;
