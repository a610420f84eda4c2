// crates/inksync-core/src/core/record.rs
// ============================================================================
// Module: InkSync Signature Request Records
// Description: Persisted signature-request record and atomic update payload.
// Purpose: Provide the single entity the reconciliation core mutates.
// Dependencies: crate::core::{identifiers, status, time}, serde
// ============================================================================

//! ## Overview
//! A signature request is created when a contract document is dispatched to
//! the signing vendor and mutated only by the reconciler in response to
//! inbound webhook events. Records are never deleted by this core; deletion
//! is a separate administrative action.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ExternalDocumentId;
use crate::core::identifiers::RentalId;
use crate::core::identifiers::RequestId;
use crate::core::status::ContractStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Signers
// ============================================================================

/// One signing party on a signature request.
///
/// # Invariants
/// - Read-only from the reconciler's perspective except for `signed_at`,
///   which is set exactly once when the vendor reports signer completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    /// Signer display name.
    pub name: String,
    /// Signer email address.
    pub email: String,
    /// Signer role (for example "client" or "franchisee").
    pub role: String,
    /// Timestamp when this signer completed, when reported by the vendor.
    pub signed_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Signature Request Record
// ============================================================================

/// Persisted signature-request record.
///
/// # Invariants
/// - `id` is immutable and assigned at creation.
/// - `external_document_id` is unique per outstanding request.
/// - Once `status` is terminal, webhook events no longer mutate the record.
/// - `signed_at` is set exactly once, on the transition into `signed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Internal record identifier.
    pub id: RequestId,
    /// Rental/contract record this request belongs to.
    pub rental_id: RentalId,
    /// Document identifier assigned by the signing vendor.
    pub external_document_id: ExternalDocumentId,
    /// Human-facing contract number referenced in notifications.
    pub contract_number: String,
    /// Client party display name.
    pub client_name: String,
    /// Client party email address for notifications.
    pub client_email: String,
    /// Current lifecycle status.
    pub status: ContractStatus,
    /// Timestamp of the transition into `signed`, when it happened.
    pub signed_at: Option<Timestamp>,
    /// Final signed-document download location, when the vendor supplied one.
    pub document_url: Option<String>,
    /// Record creation timestamp.
    pub created_at: Timestamp,
    /// Timestamp of the last accepted transition.
    pub updated_at: Timestamp,
    /// Signing parties on this request.
    pub signers: Vec<Signer>,
}

// ============================================================================
// SECTION: Atomic Update Payload
// ============================================================================

/// Per-signer completion marker carried by an update.
///
/// # Invariants
/// - `email` selects the signer; unknown emails leave signer rows untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCompletion {
    /// Email address of the signer that completed.
    pub email: String,
    /// Completion timestamp recorded for the signer.
    pub signed_at: Timestamp,
}

/// Atomic status update applied to a signature request by internal id.
///
/// # Invariants
/// - Applied all-or-nothing; a failed write leaves no partial field updates.
/// - `signed_at` and `document_url` are only populated for `signed`
///   transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New lifecycle status.
    pub status: ContractStatus,
    /// Timestamp of this transition.
    pub updated_at: Timestamp,
    /// Transition-into-signed timestamp, when applicable.
    pub signed_at: Option<Timestamp>,
    /// Signed-document download location, when the vendor supplied one.
    pub document_url: Option<String>,
    /// Optional per-signer completion marker.
    pub signer_completion: Option<SignerCompletion>,
}

impl SignatureRequest {
    /// Returns the record with an update applied in memory.
    ///
    /// Store implementations use this to keep their in-memory and durable
    /// representations aligned with the atomic write semantics.
    #[must_use]
    pub fn with_update(mut self, update: &StatusUpdate) -> Self {
        self.status = update.status;
        self.updated_at = update.updated_at;
        if let Some(signed_at) = update.signed_at {
            self.signed_at = Some(signed_at);
        }
        if let Some(url) = &update.document_url {
            self.document_url = Some(url.clone());
        }
        if let Some(completion) = &update.signer_completion {
            for signer in &mut self.signers {
                if signer.email == completion.email && signer.signed_at.is_none() {
                    signer.signed_at = Some(completion.signed_at);
                }
            }
        }
        self
    }
}
