// crates/inksync-core/src/interfaces/mod.rs
// ============================================================================
// Module: InkSync Interfaces
// Description: Store and notifier seams consumed by the reconciliation core.
// Purpose: Keep the core transport- and storage-agnostic behind explicit traits.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The reconciler touches exactly two collaborators: a signature-request
//! store with an atomic update-by-id operation, and a best-effort notifier.
//! Both are trait seams so that hosts can wire durable or in-memory
//! implementations without touching core logic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::CanonicalStatus;
use crate::core::ExternalDocumentId;
use crate::core::RequestId;
use crate::core::SignatureRequest;
use crate::core::StatusUpdate;

// ============================================================================
// SECTION: Signature Request Store
// ============================================================================

/// Signature-request store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("signature request store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("signature request store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("signature request store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("signature request store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("signature request store error: {0}")]
    Store(String),
}

/// Persistence seam for signature-request records.
///
/// # Invariants
/// - `apply_update` is atomic: a failed write leaves no partial mutation.
/// - `apply_update` is keyed by the internal record id, never by the
///   external document identifier.
pub trait SignatureRequestStore {
    /// Inserts a new record at dispatch time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the external document
    /// identifier is already taken.
    fn insert(&self, record: &SignatureRequest) -> Result<(), StoreError>;

    /// Loads a record by internal identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn find_by_id(&self, id: RequestId) -> Result<Option<SignatureRequest>, StoreError>;

    /// Loads a record by vendor-assigned document identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn find_by_external_id(
        &self,
        external_document_id: &ExternalDocumentId,
    ) -> Result<Option<SignatureRequest>, StoreError>;

    /// Applies a status update to a record as a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record does not exist or the write
    /// fails; no partial field updates are left behind.
    fn apply_update(&self, id: RequestId, update: &StatusUpdate) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Notification payload could not be constructed.
    #[error("notification invalid: {0}")]
    Invalid(String),
    /// Delivery to the email provider failed.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Notification payload for a terminal transition.
///
/// # Invariants
/// - Only produced for `signed` and `cancelled` transitions, never `sent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Transition that was just reconciled.
    pub transition: CanonicalStatus,
    /// Human-facing contract number.
    pub contract_number: String,
    /// Client party display name.
    pub client_name: String,
    /// Client party email address.
    pub client_email: String,
    /// Name of the signer reported by the vendor, when available.
    pub signer_name: Option<String>,
    /// Signed-document download location, when available.
    pub document_url: Option<String>,
}

/// Best-effort notification seam.
///
/// Failures must be logged by callers and swallowed: a notification failure
/// never affects the webhook response and never rolls back a reconciled
/// status.
pub trait Notifier: Send + Sync {
    /// Sends one notification for a terminal transition.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails; callers treat this as
    /// non-fatal.
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Notifier that discards all notifications.
///
/// # Invariants
/// - Notifications are intentionally dropped; used when email is disabled.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &NotificationEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
