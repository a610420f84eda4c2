// crates/inksync-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Durable store behavior tests against temporary databases.
// Purpose: Validate persistence, uniqueness, atomic updates, and fail-closed opens.
// Dependencies: inksync-core, inksync-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Exercises the SQLite store against temporary database files: record
//! round-trips with signers, the unique external-document-id constraint,
//! transactional updates covering the signer row, and the schema-version
//! check on open.

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

use inksync_core::ContractStatus;
use inksync_core::ExternalDocumentId;
use inksync_core::RentalId;
use inksync_core::RequestId;
use inksync_core::SignatureRequest;
use inksync_core::SignatureRequestStore;
use inksync_core::Signer;
use inksync_core::SignerCompletion;
use inksync_core::StatusUpdate;
use inksync_core::StoreError;
use inksync_core::Timestamp;
use inksync_store_sqlite::SqliteRequestStore;
use inksync_store_sqlite::SqliteStoreConfig;
use inksync_store_sqlite::SqliteStoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens a store in a fresh temporary directory.
fn open_store(dir: &TempDir) -> SqliteRequestStore {
    SqliteRequestStore::new(SqliteStoreConfig {
        path: dir.path().join("inksync.db"),
        busy_timeout_ms: 1_000,
        journal_mode: inksync_store_sqlite::SqliteJournalMode::Wal,
        sync_mode: inksync_store_sqlite::SqliteSyncMode::Full,
    })
    .expect("store opens")
}

/// Builds a signature request for store tests.
fn request(id: u64, external: &str) -> SignatureRequest {
    SignatureRequest {
        id: RequestId::from_raw(id).expect("non-zero id"),
        rental_id: RentalId::from_raw(42).expect("non-zero id"),
        external_document_id: ExternalDocumentId::new(external),
        contract_number: format!("MC-2024-{id:04}"),
        client_name: "Ada Riley".to_string(),
        client_email: "ada@example.com".to_string(),
        status: ContractStatus::Sent,
        signed_at: None,
        document_url: None,
        created_at: Timestamp::UnixMillis(1_700_000_000_000),
        updated_at: Timestamp::UnixMillis(1_700_000_000_000),
        signers: vec![
            Signer {
                name: "Ada Riley".to_string(),
                email: "ada@example.com".to_string(),
                role: "client".to_string(),
                signed_at: None,
            },
            Signer {
                name: "Miles Okafor".to_string(),
                email: "miles@franchise.example".to_string(),
                role: "franchisee".to_string(),
                signed_at: None,
            },
        ],
    }
}

// ============================================================================
// SECTION: Round-Trip Tests
// ============================================================================

#[test]
fn insert_and_load_round_trips_with_signers() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let record = request(1, "req_1");
    store.insert(&record).expect("insert");

    let by_external = store
        .find_by_external_id(&ExternalDocumentId::new("req_1"))
        .expect("load")
        .expect("record exists");
    assert_eq!(by_external, record);

    let by_id =
        store.find_by_id(record.id).expect("load").expect("record exists");
    assert_eq!(by_id, record);
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    {
        let store = open_store(&dir);
        store.insert(&request(1, "req_1")).expect("insert");
    }
    let store = open_store(&dir);
    let loaded = store
        .find_by_external_id(&ExternalDocumentId::new("req_1"))
        .expect("load")
        .expect("record exists");
    assert_eq!(loaded.contract_number, "MC-2024-0001");
}

#[test]
fn missing_record_loads_as_none() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let loaded =
        store.find_by_external_id(&ExternalDocumentId::new("nonexistent_999")).expect("load");
    assert_eq!(loaded, None);
}

// ============================================================================
// SECTION: Uniqueness Tests
// ============================================================================

#[test]
fn duplicate_external_document_id_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert(&request(1, "req_1")).expect("insert");
    let err = store.insert(&request(2, "req_1")).expect_err("duplicate rejected");
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn duplicate_internal_id_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert(&request(1, "req_1")).expect("insert");
    let err = store.insert(&request(1, "req_other")).expect_err("duplicate rejected");
    assert!(matches!(err, StoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Update Tests
// ============================================================================

#[test]
fn update_applies_status_and_signer_completion_together() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let record = request(1, "req_1");
    store.insert(&record).expect("insert");

    let now = Timestamp::UnixMillis(1_700_000_100_000);
    store
        .apply_update(record.id, &StatusUpdate {
            status: ContractStatus::Signed,
            updated_at: now,
            signed_at: Some(now),
            document_url: Some("https://vendor.example/req_1.pdf".to_string()),
            signer_completion: Some(SignerCompletion {
                email: "ada@example.com".to_string(),
                signed_at: now,
            }),
        })
        .expect("update");

    let loaded = store.find_by_id(record.id).expect("load").expect("record exists");
    assert_eq!(loaded.status, ContractStatus::Signed);
    assert_eq!(loaded.signed_at, Some(now));
    assert_eq!(loaded.updated_at, now);
    assert_eq!(loaded.document_url.as_deref(), Some("https://vendor.example/req_1.pdf"));
    assert_eq!(loaded.signers[0].signed_at, Some(now));
    assert_eq!(loaded.signers[1].signed_at, None);
}

#[test]
fn update_preserves_absent_optional_fields() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let record = request(1, "req_1");
    store.insert(&record).expect("insert");

    let signed_at = Timestamp::UnixMillis(1_700_000_100_000);
    store
        .apply_update(record.id, &StatusUpdate {
            status: ContractStatus::Signed,
            updated_at: signed_at,
            signed_at: Some(signed_at),
            document_url: None,
            signer_completion: None,
        })
        .expect("first update");

    // A later update without signed_at must not clear the stored value.
    let later = Timestamp::UnixMillis(1_700_000_200_000);
    store
        .apply_update(record.id, &StatusUpdate {
            status: ContractStatus::Signed,
            updated_at: later,
            signed_at: None,
            document_url: None,
            signer_completion: None,
        })
        .expect("second update");

    let loaded = store.find_by_id(record.id).expect("load").expect("record exists");
    assert_eq!(loaded.signed_at, Some(signed_at));
    assert_eq!(loaded.updated_at, later);
}

#[test]
fn update_on_missing_record_fails() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let err = store
        .apply_update(RequestId::from_raw(99).expect("non-zero id"), &StatusUpdate {
            status: ContractStatus::Sent,
            updated_at: Timestamp::UnixMillis(1),
            signed_at: None,
            document_url: None,
            signer_completion: None,
        })
        .expect_err("missing record fails");
    assert!(matches!(err, StoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Schema Version Tests
// ============================================================================

#[test]
fn schema_version_mismatch_fails_closed() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("inksync.db");
    {
        let store = SqliteRequestStore::new(SqliteStoreConfig {
            path: path.clone(),
            busy_timeout_ms: 1_000,
            journal_mode: inksync_store_sqlite::SqliteJournalMode::Wal,
            sync_mode: inksync_store_sqlite::SqliteSyncMode::Full,
        })
        .expect("store opens");
        store.insert(&request(1, "req_1")).expect("insert");
    }
    {
        let connection = rusqlite::Connection::open(&path).expect("raw open");
        connection
            .execute("UPDATE meta SET value = '999' WHERE key = 'schema_version'", [])
            .expect("tamper with version");
    }
    let err = SqliteRequestStore::new(SqliteStoreConfig {
        path,
        busy_timeout_ms: 1_000,
        journal_mode: inksync_store_sqlite::SqliteJournalMode::Wal,
        sync_mode: inksync_store_sqlite::SqliteSyncMode::Full,
    })
    .err()
    .expect("mismatch fails");
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}
