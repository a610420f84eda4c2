// crates/inksync-core/src/runtime/mod.rs
// ============================================================================
// Module: InkSync Runtime
// Description: Reconciliation engine and store helpers.
// Purpose: Apply normalized webhook events against the persisted store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the reconciliation step and provide store
//! helpers for tests and hosts. All transports must call into the same
//! reconciler to preserve the idempotence and terminal-absorption
//! invariants.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod reconciler;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use reconciler::ReconcileError;
pub use reconciler::ReconcileOutcome;
pub use reconciler::Reconciler;
pub use store::InMemoryRequestStore;
pub use store::SharedRequestStore;
