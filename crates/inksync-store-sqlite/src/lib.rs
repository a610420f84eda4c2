// crates/inksync-store-sqlite/src/lib.rs
// ============================================================================
// Module: InkSync SQLite Store Library
// Description: Durable signature-request store backed by SQLite.
// Purpose: Expose the SQLite store implementation and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! `inksync-store-sqlite` provides the durable [`inksync_core::SignatureRequestStore`]
//! implementation used in production deployments. Updates are applied as
//! single transactions so a failed write never leaves partial field updates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteRequestStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
