// crates/inksync-notify/src/lib.rs
// ============================================================================
// Module: InkSync Notify
// Description: Outbound email notifications for terminal signature transitions.
// Purpose: Deliver signed/cancelled notices through an HTTP email provider.
// Dependencies: inksync-core, reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Implements the best-effort [`inksync_core::Notifier`] seam over an HTTP
//! email provider. Delivery failures surface as [`inksync_core::NotifyError`]
//! and are swallowed by callers; a lost email never affects a reconciled
//! status.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod email;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use email::EmailNotifier;
pub use email::EmailNotifierConfig;
