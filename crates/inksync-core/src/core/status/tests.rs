// crates/inksync-core/src/core/status/tests.rs
// ============================================================================
// Module: Status Model Tests
// Description: Unit and property tests for vendor status mapping.
// Purpose: Pin the total mapping table and terminal-state classification.
// Dependencies: inksync-core, proptest
// ============================================================================

//! ## Overview
//! Validates the vendor status mapping table, the safe fallback for
//! unrecognized statuses, and terminal-state classification.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use proptest::prelude::proptest;

use super::CanonicalStatus;
use super::ContractStatus;
use super::map_vendor_status;

// ============================================================================
// SECTION: Mapping Table Tests
// ============================================================================

#[test]
fn signed_and_completed_map_to_signed() {
    assert_eq!(map_vendor_status("signed"), CanonicalStatus::Signed);
    assert_eq!(map_vendor_status("completed"), CanonicalStatus::Signed);
}

#[test]
fn rejected_and_expired_map_to_cancelled() {
    assert_eq!(map_vendor_status("rejected"), CanonicalStatus::Cancelled);
    assert_eq!(map_vendor_status("expired"), CanonicalStatus::Cancelled);
}

#[test]
fn unrecognized_statuses_fall_back_to_sent() {
    assert_eq!(map_vendor_status("pending"), CanonicalStatus::Sent);
    assert_eq!(map_vendor_status("sent"), CanonicalStatus::Sent);
    assert_eq!(map_vendor_status(""), CanonicalStatus::Sent);
    assert_eq!(map_vendor_status("weird_unrecognized_value"), CanonicalStatus::Sent);
    assert_eq!(map_vendor_status("SIGNED"), CanonicalStatus::Sent);
}

proptest! {
    #[test]
    fn mapping_is_total_for_arbitrary_strings(vendor_status in ".*") {
        let mapped = map_vendor_status(&vendor_status);
        assert!(matches!(
            mapped,
            CanonicalStatus::Sent | CanonicalStatus::Signed | CanonicalStatus::Cancelled
        ));
    }
}

// ============================================================================
// SECTION: Terminal Classification Tests
// ============================================================================

#[test]
fn only_signed_and_cancelled_are_terminal() {
    assert!(ContractStatus::Signed.is_terminal());
    assert!(ContractStatus::Cancelled.is_terminal());
    assert!(!ContractStatus::Draft.is_terminal());
    assert!(!ContractStatus::Generated.is_terminal());
    assert!(!ContractStatus::Sent.is_terminal());
}

#[test]
fn status_labels_round_trip() {
    for status in [
        ContractStatus::Draft,
        ContractStatus::Generated,
        ContractStatus::Sent,
        ContractStatus::Signed,
        ContractStatus::Cancelled,
    ] {
        assert_eq!(ContractStatus::from_label(status.as_str()), Some(status));
    }
    assert_eq!(ContractStatus::from_label("archived"), None);
}

#[test]
fn canonical_status_projects_onto_contract_status() {
    assert_eq!(CanonicalStatus::Sent.as_contract_status(), ContractStatus::Sent);
    assert_eq!(CanonicalStatus::Signed.as_contract_status(), ContractStatus::Signed);
    assert_eq!(CanonicalStatus::Cancelled.as_contract_status(), ContractStatus::Cancelled);
}
