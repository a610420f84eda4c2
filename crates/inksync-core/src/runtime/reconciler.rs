// crates/inksync-core/src/runtime/reconciler.rs
// ============================================================================
// Module: InkSync Reconciler
// Description: Applies normalized webhook events to persisted records.
// Purpose: Enforce idempotence and terminal absorption on status transitions.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! The reconciler loads the record addressed by a webhook event, decides
//! whether the event represents a forward transition, and applies the update
//! as a single atomic write keyed by the internal record id.
//!
//! Terminal states absorb everything: once a record is `signed` or
//! `cancelled`, any further event for the same document is a successful
//! no-op. Duplicate and out-of-order webhook deliveries are expected from
//! HTTP transports and converge safely through this guard, provided the
//! store's update-by-id operation is atomic.
//!
//! There is no local retry or redelivery queue. A store failure surfaces as
//! a server error and the vendor's own webhook redelivery is the resilience
//! mechanism.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::CanonicalStatus;
use crate::core::ContractStatus;
use crate::core::SignatureEvent;
use crate::core::SignatureRequest;
use crate::core::SignerCompletion;
use crate::core::StatusUpdate;
use crate::core::Timestamp;
use crate::core::map_vendor_status;
use crate::interfaces::SignatureRequestStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Outcomes and Errors
// ============================================================================

/// Result of reconciling one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A forward transition was applied and persisted.
    Applied {
        /// Status before the transition.
        previous: ContractStatus,
        /// Canonical status the event mapped onto.
        transition: CanonicalStatus,
        /// Record state after the update.
        record: SignatureRequest,
    },
    /// The record was already terminal; nothing was mutated.
    AlreadyTerminal {
        /// Terminal status the record holds.
        status: ContractStatus,
    },
}

/// Reconciliation failures.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The event references a document this system has no record of.
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    /// The store rejected the read or the atomic write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Webhook event reconciler over a signature-request store.
pub struct Reconciler<S: SignatureRequestStore> {
    /// Backing signature-request store.
    store: S,
}

impl<S: SignatureRequestStore> Reconciler<S> {
    /// Creates a reconciler over the given store.
    pub const fn new(store: S) -> Self {
        Self {
            store,
        }
    }

    /// Returns a reference to the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles one normalized webhook event at the host-supplied time.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::UnknownDocument`] when no record matches the
    /// event's document identifier, or [`ReconcileError::Store`] when the
    /// store read or atomic write fails. Unknown documents are client
    /// errors; the event is not queued or retried here.
    pub fn reconcile(
        &self,
        event: &SignatureEvent,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let record = self
            .store
            .find_by_external_id(&event.document_id)?
            .ok_or_else(|| ReconcileError::UnknownDocument(event.document_id.to_string()))?;

        if record.status.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal {
                status: record.status,
            });
        }

        let transition = map_vendor_status(&event.vendor_status);
        let update = build_update(event, transition, now);
        self.store.apply_update(record.id, &update)?;
        let previous = record.status;
        Ok(ReconcileOutcome::Applied {
            previous,
            transition,
            record: record.with_update(&update),
        })
    }
}

/// Builds the atomic update for a mapped transition.
///
/// `signed_at` and `document_url` are only populated on `signed`
/// transitions; the vendor-reported timestamp is used solely for per-signer
/// completion marking and never overrides the host clock.
fn build_update(
    event: &SignatureEvent,
    transition: CanonicalStatus,
    now: Timestamp,
) -> StatusUpdate {
    let signed = transition == CanonicalStatus::Signed;
    StatusUpdate {
        status: transition.as_contract_status(),
        updated_at: now,
        signed_at: signed.then_some(now),
        document_url: if signed {
            event.download_url.clone()
        } else {
            None
        },
        signer_completion: if signed {
            event.signer.as_ref().map(|signer| SignerCompletion {
                email: signer.email.clone(),
                signed_at: now,
            })
        } else {
            None
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
