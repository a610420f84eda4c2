// crates/inksync-core/src/runtime/store.rs
// ============================================================================
// Module: InkSync In-Memory Store
// Description: Simple in-memory signature-request store for tests and demos.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`SignatureRequestStore`] for tests and local demos. Updates are applied
//! under a single mutex, which satisfies the atomic update-by-id contract.
//! It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::ExternalDocumentId;
use crate::core::RequestId;
use crate::core::SignatureRequest;
use crate::core::StatusUpdate;
use crate::interfaces::SignatureRequestStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory signature-request store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRequestStore {
    /// Record map keyed by internal id, protected by a mutex.
    records: Arc<Mutex<BTreeMap<RequestId, SignatureRequest>>>,
}

impl InMemoryRequestStore {
    /// Creates a new in-memory signature-request store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl SignatureRequestStore for InMemoryRequestStore {
    fn insert(&self, record: &SignatureRequest) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("request store mutex poisoned".to_string()))?;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Invalid(format!("duplicate request id: {}", record.id)));
        }
        let taken = guard
            .values()
            .any(|existing| existing.external_document_id == record.external_document_id);
        if taken {
            return Err(StoreError::Invalid(format!(
                "duplicate external document id: {}",
                record.external_document_id
            )));
        }
        guard.insert(record.id, record.clone());
        drop(guard);
        Ok(())
    }

    fn find_by_id(&self, id: RequestId) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("request store mutex poisoned".to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    fn find_by_external_id(
        &self,
        external_document_id: &ExternalDocumentId,
    ) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("request store mutex poisoned".to_string()))?;
        Ok(guard
            .values()
            .find(|record| record.external_document_id == *external_document_id)
            .cloned())
    }

    fn apply_update(&self, id: RequestId, update: &StatusUpdate) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Store("request store mutex poisoned".to_string()))?;
        let record = guard
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::Invalid(format!("no record for request id: {id}")))?;
        guard.insert(id, record.with_update(update));
        drop(guard);
        Ok(())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared signature-request store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRequestStore {
    /// Inner store implementation.
    inner: Arc<dyn SignatureRequestStore + Send + Sync>,
}

impl SharedRequestStore {
    /// Wraps a signature-request store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl SignatureRequestStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn SignatureRequestStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl SignatureRequestStore for SharedRequestStore {
    fn insert(&self, record: &SignatureRequest) -> Result<(), StoreError> {
        self.inner.insert(record)
    }

    fn find_by_id(&self, id: RequestId) -> Result<Option<SignatureRequest>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn find_by_external_id(
        &self,
        external_document_id: &ExternalDocumentId,
    ) -> Result<Option<SignatureRequest>, StoreError> {
        self.inner.find_by_external_id(external_document_id)
    }

    fn apply_update(&self, id: RequestId, update: &StatusUpdate) -> Result<(), StoreError> {
        self.inner.apply_update(id, update)
    }
}
