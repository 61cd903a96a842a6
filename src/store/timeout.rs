//! Application-level deadline for record store calls
//!
//! The store client has no per-operation timeout of its own. A call that
//! exceeds the deadline fails with the same `RecordStore` error kind as a
//! connectivity failure, flagged `timed_out`.

use async_trait::async_trait;
use bson::Document;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::{CampCollection, NewRecord, Predicate, RecordStore, Scope, StoredRecord};
use crate::types::{PortalError, Result, StoreOp};

/// Wraps a store and bounds every call by `timeout`
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: RecordStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T: Send>(
        &self,
        op: StoreOp,
        scope: &(dyn std::fmt::Display + Sync),
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(op = %op, scope = %scope, timeout_ms, "Record store call timed out");
                Err(PortalError::store_timeout(op, scope, timeout_ms))
            }
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for TimeoutStore<S> {
    async fn find(&self, scope: &Scope, predicate: &Predicate) -> Result<Vec<StoredRecord>> {
        self.bounded(StoreOp::Find, scope, self.inner.find(scope, predicate))
            .await
    }

    async fn find_across_camps(
        &self,
        collection: &CampCollection,
        predicate: &Predicate,
    ) -> Result<Vec<StoredRecord>> {
        self.bounded(
            StoreOp::FindAcrossCamps,
            &collection.name(),
            self.inner.find_across_camps(collection, predicate),
        )
        .await
    }

    async fn get_by_key(&self, scope: &Scope, key: &str) -> Result<Option<StoredRecord>> {
        self.bounded(StoreOp::GetByKey, scope, self.inner.get_by_key(scope, key))
            .await
    }

    async fn create(&self, scope: &Scope, record: NewRecord) -> Result<String> {
        self.bounded(StoreOp::Create, scope, self.inner.create(scope, record))
            .await
    }

    async fn update(&self, scope: &Scope, key: &str, partial: Document) -> Result<()> {
        self.bounded(StoreOp::Update, scope, self.inner.update(scope, key, partial))
            .await
    }
}
