// crates/inksync-core/src/core/status.rs
// ============================================================================
// Module: InkSync Status Model
// Description: Contract status state machine and vendor status mapping.
// Purpose: Provide the canonical status vocabulary and the total vendor lookup.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the contract-status state machine and the mapping from
//! vendor-specific status strings onto the canonical three-valued status.
//! `signed` and `cancelled` are terminal; once a record reaches either, no
//! further webhook transition is accepted.
//!
//! Unrecognized vendor statuses map to `sent`. The fallback is intentionally
//! non-terminal so an unknown vendor string can never destructively move a
//! contract into a wrong terminal state; do not change it without product
//! input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Contract Status
// ============================================================================

/// Signature-request lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and storage.
/// - `Signed` and `Cancelled` are terminal: webhook events never move a
///   record out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Contract drafted, not yet rendered for signature.
    Draft,
    /// Contract document generated, not yet dispatched to the vendor.
    Generated,
    /// Document dispatched to the signing vendor; signatures outstanding.
    Sent,
    /// All required signatures collected.
    Signed,
    /// Signing rejected, expired, or otherwise abandoned.
    Cancelled,
}

impl ContractStatus {
    /// Returns true when the status is terminal for webhook reconciliation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Signed | Self::Cancelled)
    }

    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generated => "generated",
            Self::Sent => "sent",
            Self::Signed => "signed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status label (returns `None` for unknown labels).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "draft" => Some(Self::Draft),
            "generated" => Some(Self::Generated),
            "sent" => Some(Self::Sent),
            "signed" => Some(Self::Signed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Canonical Status
// ============================================================================

/// Canonical status produced by vendor status mapping.
///
/// # Invariants
/// - Variants are stable for serialization and audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    /// Document outstanding with the vendor.
    Sent,
    /// Document fully signed or completed.
    Signed,
    /// Document rejected or expired.
    Cancelled,
}

impl CanonicalStatus {
    /// Returns a stable label for the canonical status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Signed => "signed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns the contract status this canonical status transitions into.
    #[must_use]
    pub const fn as_contract_status(self) -> ContractStatus {
        match self {
            Self::Sent => ContractStatus::Sent,
            Self::Signed => ContractStatus::Signed,
            Self::Cancelled => ContractStatus::Cancelled,
        }
    }
}

// ============================================================================
// SECTION: Vendor Status Mapping
// ============================================================================

/// Maps a vendor status string onto the canonical status.
///
/// The mapping is total: every input, including the empty string and
/// arbitrary garbage, produces a defined output and never raises.
/// Unrecognized statuses (including `"pending"` and `"sent"` itself) fall
/// back to [`CanonicalStatus::Sent`].
#[must_use]
pub fn map_vendor_status(vendor_status: &str) -> CanonicalStatus {
    match vendor_status {
        "signed" | "completed" => CanonicalStatus::Signed,
        "rejected" | "expired" => CanonicalStatus::Cancelled,
        _ => CanonicalStatus::Sent,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
