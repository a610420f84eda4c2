// crates/inksync-core/src/core/mod.rs
// ============================================================================
// Module: InkSync Core Types
// Description: Canonical signature-request and event structures.
// Purpose: Provide stable, serializable types for records and webhook events.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define signature-request records, the canonical status state
//! machine, and the normalized webhook event. These types are the canonical
//! source of truth for any derived surface (HTTP transport, stores, CLI).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod event;
pub mod identifiers;
pub mod record;
pub mod status;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use event::EventSigner;
pub use event::NormalizeError;
pub use event::SignatureEvent;
pub use event::normalize_payload;
pub use identifiers::ExternalDocumentId;
pub use identifiers::RentalId;
pub use identifiers::RequestId;
pub use record::SignatureRequest;
pub use record::Signer;
pub use record::SignerCompletion;
pub use record::StatusUpdate;
pub use status::CanonicalStatus;
pub use status::ContractStatus;
pub use status::map_vendor_status;
pub use time::Timestamp;
