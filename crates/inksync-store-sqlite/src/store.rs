// crates/inksync-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Signature Request Store
// Description: Durable SignatureRequestStore backed by SQLite WAL.
// Purpose: Persist signature requests with atomic update-by-id semantics.
// Dependencies: inksync-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`SignatureRequestStore`] using `SQLite`.
//! Each record occupies one row in `signature_requests` plus one row per
//! signer; `apply_update` runs a single transaction covering the request row
//! and the optional signer completion row, so the write is all-or-nothing.
//! Timestamps are stored as canonical JSON to preserve the core time model.
//! The schema version is checked on open and mismatches fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use inksync_core::ContractStatus;
use inksync_core::ExternalDocumentId;
use inksync_core::RentalId;
use inksync_core::RequestId;
use inksync_core::SignatureRequest;
use inksync_core::SignatureRequestStore;
use inksync_core::Signer;
use inksync_core::StatusUpdate;
use inksync_core::StoreError;
use inksync_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` signature-request store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding full record payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or undecodable stored data.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed signature-request store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - `apply_update` runs inside one transaction (all-or-nothing).
/// - `external_document_id` carries a unique index.
#[derive(Clone)]
pub struct SqliteRequestStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRequestStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened, the
    /// pragmas cannot be applied, or the stored schema version mismatches.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = Connection::open(&config.path)
            .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        connection
            .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
            .map_err(SqliteStoreError::from)?;
        apply_pragmas(&connection, &config)?;
        ensure_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }
}

/// Applies journal and sync pragmas to a fresh connection.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
        .map_err(SqliteStoreError::from)?;
    connection
        .pragma_update(None, "synchronous", config.sync_mode.pragma_value())
        .map_err(SqliteStoreError::from)?;
    connection.pragma_update(None, "foreign_keys", "on").map_err(SqliteStoreError::from)?;
    Ok(())
}

/// Creates tables on first open and verifies the stored schema version.
fn ensure_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS signature_requests (
                 id INTEGER PRIMARY KEY,
                 rental_id INTEGER NOT NULL,
                 external_document_id TEXT NOT NULL,
                 contract_number TEXT NOT NULL,
                 client_name TEXT NOT NULL,
                 client_email TEXT NOT NULL,
                 status TEXT NOT NULL,
                 signed_at TEXT,
                 document_url TEXT,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );
             CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_external_document_id
                 ON signature_requests (external_document_id);
             CREATE TABLE IF NOT EXISTS signers (
                 request_id INTEGER NOT NULL
                     REFERENCES signature_requests (id) ON DELETE CASCADE,
                 position INTEGER NOT NULL,
                 name TEXT NOT NULL,
                 email TEXT NOT NULL,
                 role TEXT NOT NULL,
                 signed_at TEXT,
                 PRIMARY KEY (request_id, position)
             );",
        )
        .map_err(SqliteStoreError::from)?;

    let stored: Option<String> = connection
        .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| row.get(0))
        .optional()
        .map_err(SqliteStoreError::from)?;
    match stored {
        None => {
            connection
                .execute(
                    "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()],
                )
                .map_err(SqliteStoreError::from)?;
            Ok(())
        }
        Some(value) if value == SCHEMA_VERSION.to_string() => Ok(()),
        Some(value) => Err(SqliteStoreError::VersionMismatch(format!(
            "stored schema version {value}, expected {SCHEMA_VERSION}"
        ))),
    }
}

// ============================================================================
// SECTION: Row Codecs
// ============================================================================

/// Encodes a timestamp as canonical JSON text.
fn encode_timestamp(timestamp: Timestamp) -> Result<String, SqliteStoreError> {
    serde_json::to_string(&timestamp)
        .map_err(|err| SqliteStoreError::Invalid(format!("timestamp encoding failed: {err}")))
}

/// Encodes an optional timestamp as canonical JSON text.
fn encode_optional_timestamp(
    timestamp: Option<Timestamp>,
) -> Result<Option<String>, SqliteStoreError> {
    timestamp.map(encode_timestamp).transpose()
}

/// Decodes a timestamp from stored JSON text.
fn decode_timestamp(text: &str) -> Result<Timestamp, SqliteStoreError> {
    serde_json::from_str(text)
        .map_err(|err| SqliteStoreError::Corrupt(format!("timestamp decoding failed: {err}")))
}

/// Decodes an optional timestamp from stored JSON text.
fn decode_optional_timestamp(
    text: Option<String>,
) -> Result<Option<Timestamp>, SqliteStoreError> {
    text.as_deref().map(decode_timestamp).transpose()
}

/// Converts a stored integer id into a [`RequestId`].
fn decode_request_id(raw: i64) -> Result<RequestId, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(RequestId::from_raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid stored request id: {raw}")))
}

/// Converts a stored integer id into a [`RentalId`].
fn decode_rental_id(raw: i64) -> Result<RentalId, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(RentalId::from_raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid stored rental id: {raw}")))
}

/// Converts a stored status label into a [`ContractStatus`].
fn decode_status(label: &str) -> Result<ContractStatus, SqliteStoreError> {
    ContractStatus::from_label(label)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid stored status: {label}")))
}

/// Converts an internal id into the stored integer form.
fn encode_id(raw: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(raw)
        .map_err(|_| SqliteStoreError::Invalid(format!("id exceeds sqlite integer range: {raw}")))
}

/// Partial request row before signers are attached.
struct RequestRow {
    /// Decoded record without signer entries.
    record: SignatureRequest,
}

/// Reads one request row (without signers) from a rusqlite row.
fn read_request_row(row: &rusqlite::Row<'_>) -> Result<RequestRow, SqliteStoreError> {
    let id: i64 = row.get(0).map_err(SqliteStoreError::from)?;
    let rental_id: i64 = row.get(1).map_err(SqliteStoreError::from)?;
    let external: String = row.get(2).map_err(SqliteStoreError::from)?;
    let contract_number: String = row.get(3).map_err(SqliteStoreError::from)?;
    let client_name: String = row.get(4).map_err(SqliteStoreError::from)?;
    let client_email: String = row.get(5).map_err(SqliteStoreError::from)?;
    let status: String = row.get(6).map_err(SqliteStoreError::from)?;
    let signed_at: Option<String> = row.get(7).map_err(SqliteStoreError::from)?;
    let document_url: Option<String> = row.get(8).map_err(SqliteStoreError::from)?;
    let created_at: String = row.get(9).map_err(SqliteStoreError::from)?;
    let updated_at: String = row.get(10).map_err(SqliteStoreError::from)?;
    Ok(RequestRow {
        record: SignatureRequest {
            id: decode_request_id(id)?,
            rental_id: decode_rental_id(rental_id)?,
            external_document_id: ExternalDocumentId::new(external),
            contract_number,
            client_name,
            client_email,
            status: decode_status(&status)?,
            signed_at: decode_optional_timestamp(signed_at)?,
            document_url,
            created_at: decode_timestamp(&created_at)?,
            updated_at: decode_timestamp(&updated_at)?,
            signers: Vec::new(),
        },
    })
}

/// Loads signer rows for a request, ordered by position.
fn load_signers(
    connection: &Connection,
    request_id: i64,
) -> Result<Vec<Signer>, SqliteStoreError> {
    let mut statement = connection
        .prepare(
            "SELECT name, email, role, signed_at FROM signers
             WHERE request_id = ?1 ORDER BY position",
        )
        .map_err(SqliteStoreError::from)?;
    let rows = statement
        .query_map(params![request_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .map_err(SqliteStoreError::from)?;
    let mut signers = Vec::new();
    for row in rows {
        let (name, email, role, signed_at) = row.map_err(SqliteStoreError::from)?;
        signers.push(Signer {
            name,
            email,
            role,
            signed_at: decode_optional_timestamp(signed_at)?,
        });
    }
    Ok(signers)
}

/// Loads one full record through an optional lookup statement.
fn load_record(
    connection: &Connection,
    where_clause: &str,
    key: &dyn rusqlite::ToSql,
) -> Result<Option<SignatureRequest>, SqliteStoreError> {
    let sql = format!(
        "SELECT id, rental_id, external_document_id, contract_number, client_name,
                client_email, status, signed_at, document_url, created_at, updated_at
         FROM signature_requests WHERE {where_clause}"
    );
    let row: Option<RequestRow> = connection
        .query_row(&sql, params![key], |row| {
            Ok(read_request_row(row))
        })
        .optional()
        .map_err(SqliteStoreError::from)?
        .transpose()?;
    let Some(mut row) = row else {
        return Ok(None);
    };
    let request_id = encode_id(row.record.id.get())?;
    row.record.signers = load_signers(connection, request_id)?;
    Ok(Some(row.record))
}

// ============================================================================
// SECTION: Store Trait Implementation
// ============================================================================

impl SignatureRequestStore for SqliteRequestStore {
    fn insert(&self, record: &SignatureRequest) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let transaction = guard
            .transaction()
            .map_err(|err| StoreError::from(SqliteStoreError::from(err)))?;
        insert_record(&transaction, record).map_err(StoreError::from)?;
        transaction.commit().map_err(|err| StoreError::from(SqliteStoreError::from(err)))?;
        Ok(())
    }

    fn find_by_id(&self, id: RequestId) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let key = encode_id(id.get()).map_err(StoreError::from)?;
        load_record(&guard, "id = ?1", &key).map_err(StoreError::from)
    }

    fn find_by_external_id(
        &self,
        external_document_id: &ExternalDocumentId,
    ) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let key = external_document_id.as_str().to_string();
        load_record(&guard, "external_document_id = ?1", &key).map_err(StoreError::from)
    }

    fn apply_update(&self, id: RequestId, update: &StatusUpdate) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let transaction = guard
            .transaction()
            .map_err(|err| StoreError::from(SqliteStoreError::from(err)))?;
        apply_update_tx(&transaction, id, update).map_err(StoreError::from)?;
        transaction.commit().map_err(|err| StoreError::from(SqliteStoreError::from(err)))?;
        Ok(())
    }
}

/// Inserts the request row and its signer rows inside a transaction.
fn insert_record(
    transaction: &rusqlite::Transaction<'_>,
    record: &SignatureRequest,
) -> Result<(), SqliteStoreError> {
    let id = encode_id(record.id.get())?;
    let rental_id = encode_id(record.rental_id.get())?;
    let inserted = transaction.execute(
        "INSERT OR IGNORE INTO signature_requests
             (id, rental_id, external_document_id, contract_number, client_name,
              client_email, status, signed_at, document_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            rental_id,
            record.external_document_id.as_str(),
            record.contract_number,
            record.client_name,
            record.client_email,
            record.status.as_str(),
            encode_optional_timestamp(record.signed_at)?,
            record.document_url,
            encode_timestamp(record.created_at)?,
            encode_timestamp(record.updated_at)?,
        ],
    )?;
    if inserted == 0 {
        return Err(SqliteStoreError::Invalid(format!(
            "duplicate request id or external document id: {}",
            record.external_document_id
        )));
    }
    for (position, signer) in record.signers.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| SqliteStoreError::Invalid("too many signers".to_string()))?;
        transaction.execute(
            "INSERT INTO signers (request_id, position, name, email, role, signed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                position,
                signer.name,
                signer.email,
                signer.role,
                encode_optional_timestamp(signer.signed_at)?,
            ],
        )?;
    }
    Ok(())
}

/// Applies the atomic status update inside a transaction.
fn apply_update_tx(
    transaction: &rusqlite::Transaction<'_>,
    id: RequestId,
    update: &StatusUpdate,
) -> Result<(), SqliteStoreError> {
    let key = encode_id(id.get())?;
    let updated = transaction.execute(
        "UPDATE signature_requests
         SET status = ?1,
             updated_at = ?2,
             signed_at = COALESCE(?3, signed_at),
             document_url = COALESCE(?4, document_url)
         WHERE id = ?5",
        params![
            update.status.as_str(),
            encode_timestamp(update.updated_at)?,
            encode_optional_timestamp(update.signed_at)?,
            update.document_url,
            key,
        ],
    )?;
    if updated == 0 {
        return Err(SqliteStoreError::Invalid(format!("no record for request id: {id}")));
    }
    if let Some(completion) = &update.signer_completion {
        transaction.execute(
            "UPDATE signers SET signed_at = ?1
             WHERE request_id = ?2 AND email = ?3 AND signed_at IS NULL",
            params![encode_timestamp(completion.signed_at)?, key, completion.email],
        )?;
    }
    Ok(())
}
