// crates/inksync-core/src/lib.rs
// ============================================================================
// Module: InkSync Core Library
// Description: Public API surface for the InkSync core.
// Purpose: Expose canonical types, interfaces, and reconciliation helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! InkSync core implements webhook-driven status reconciliation for
//! electronic-signature documents. It maps heterogeneous vendor payload
//! shapes onto a canonical contract-status state machine and applies
//! forward transitions exactly once per logical event. The core is
//! transport- and storage-agnostic and integrates through explicit
//! interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::NotificationEvent;
pub use interfaces::Notifier;
pub use interfaces::NoopNotifier;
pub use interfaces::NotifyError;
pub use interfaces::SignatureRequestStore;
pub use interfaces::StoreError;
pub use runtime::InMemoryRequestStore;
pub use runtime::ReconcileError;
pub use runtime::ReconcileOutcome;
pub use runtime::Reconciler;
pub use runtime::SharedRequestStore;
