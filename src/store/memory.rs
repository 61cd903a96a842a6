//! In-memory record store
//!
//! Records are kept per scope in insertion order. Used for tests and for
//! running the portal against a JSON seed file without MongoDB.

use async_trait::async_trait;
use bson::{Bson, DateTime, Document};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CampCollection, NewRecord, Predicate, RecordStore, Scope, StoredRecord};
use crate::types::{PortalError, Result, StoreOp};

/// In-memory document store
#[derive(Default)]
pub struct MemoryRecordStore {
    scopes: DashMap<Scope, Vec<(String, Document)>>,
    /// Collections that fail every operation (for failure-path tests)
    failing: Mutex<HashSet<&'static str>>,
    /// Number of `find` calls served
    find_calls: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with a known key, replacing any record with that key
    pub fn insert(&self, scope: Scope, key: impl Into<String>, fields: Document) {
        let key = key.into();
        let mut records = self.scopes.entry(scope).or_default();
        match records.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = fields,
            None => records.push((key, fields)),
        }
    }

    /// Make every operation on the named collection fail
    pub fn fail_collection(&self, collection: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(collection);
        }
    }

    /// How many `find` calls have been served
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::Relaxed)
    }

    /// Load a seed file
    ///
    /// ```json
    /// { "camps": { "c1": { "camp_name": "...",
    ///     "beneficiaries": { "b1": { ... } },
    ///     "distribution": { "d1": { ... } },
    ///     "parcels": { "p1": { ... } } } } }
    /// ```
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PortalError::Config(format!("Failed to read seed {}: {e}", path.display())))?;
        let store = Self::from_seed_json(&raw)?;
        info!(path = %path.display(), "Loaded in-memory seed");
        Ok(store)
    }

    /// Load seed data from a JSON string
    pub fn from_seed_json(raw: &str) -> Result<Self> {
        let seed: Seed = serde_json::from_str(raw)?;
        let store = Self::new();

        for (camp_id, camp) in seed.camps {
            store.insert(Scope::Camps, camp_id.clone(), json_to_document(camp.fields)?);
            for (key, value) in camp.beneficiaries {
                store.insert(Scope::beneficiaries(&camp_id), key, json_to_document(value)?);
            }
            for (key, value) in camp.distribution {
                store.insert(Scope::distribution(&camp_id), key, json_to_document(value)?);
            }
            for (key, value) in camp.parcels {
                store.insert(Scope::parcels(&camp_id), key, json_to_document(value)?);
            }
        }

        Ok(store)
    }

    fn check_available(&self, op: StoreOp, scope: &Scope) -> Result<()> {
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(scope.collection_name()))
            .unwrap_or(false);
        if failing {
            return Err(PortalError::store(op, scope, "store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, scope: &Scope, predicate: &Predicate) -> Result<Vec<StoredRecord>> {
        self.find_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available(StoreOp::Find, scope)?;

        let results: Vec<StoredRecord> = self
            .scopes
            .get(scope)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, fields)| predicate.matches(fields))
                    .map(|(key, fields)| stored(scope, key, fields))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            scope = %scope,
            field = %predicate.field,
            value = %predicate.value,
            hits = results.len(),
            "memory find"
        );
        Ok(results)
    }

    async fn find_across_camps(
        &self,
        collection: &CampCollection,
        predicate: &Predicate,
    ) -> Result<Vec<StoredRecord>> {
        let mut results = Vec::new();
        for entry in self.scopes.iter() {
            let scope = entry.key();
            let same_collection =
                matches!(scope, Scope::Camp { collection: c, .. } if c == collection);
            if !same_collection {
                continue;
            }
            self.check_available(StoreOp::FindAcrossCamps, scope)?;
            results.extend(
                entry
                    .value()
                    .iter()
                    .filter(|(_, fields)| predicate.matches(fields))
                    .map(|(key, fields)| stored(scope, key, fields)),
            );
        }
        // Stable across runs regardless of map iteration order
        results.sort_by(|a, b| (&a.camp_id, &a.key).cmp(&(&b.camp_id, &b.key)));
        Ok(results)
    }

    async fn get_by_key(&self, scope: &Scope, key: &str) -> Result<Option<StoredRecord>> {
        self.check_available(StoreOp::GetByKey, scope)?;
        Ok(self.scopes.get(scope).and_then(|records| {
            records
                .iter()
                .find(|(k, _)| k == key)
                .map(|(k, fields)| stored(scope, k, fields))
        }))
    }

    async fn create(&self, scope: &Scope, record: NewRecord) -> Result<String> {
        self.check_available(StoreOp::Create, scope)?;
        let key = Uuid::new_v4().simple().to_string();
        let mut fields = record.fields;
        for field in record.server_timestamps {
            fields.insert(field, Bson::DateTime(DateTime::now()));
        }
        self.scopes
            .entry(scope.clone())
            .or_default()
            .push((key.clone(), fields));
        Ok(key)
    }

    async fn update(&self, scope: &Scope, key: &str, partial: Document) -> Result<()> {
        self.check_available(StoreOp::Update, scope)?;
        let mut records = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| PortalError::store(StoreOp::Update, scope, format!("no document {key}")))?;
        let (_, fields) = records
            .iter_mut()
            .find(|(k, _)| k == key)
            .ok_or_else(|| PortalError::store(StoreOp::Update, scope, format!("no document {key}")))?;
        for (name, value) in partial {
            fields.insert(name, value);
        }
        Ok(())
    }
}

fn stored(scope: &Scope, key: &str, fields: &Document) -> StoredRecord {
    let camp_id = match scope {
        Scope::Camps => None,
        Scope::Camp { camp_id, .. } => Some(camp_id.clone()),
    };
    StoredRecord {
        key: key.to_string(),
        camp_id,
        fields: fields.clone(),
    }
}

#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    camps: BTreeMap<String, SeedCamp>,
}

#[derive(Deserialize)]
struct SeedCamp {
    #[serde(default)]
    beneficiaries: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    distribution: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    parcels: BTreeMap<String, serde_json::Value>,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

fn json_to_document(value: impl Into<serde_json::Value>) -> Result<Document> {
    match bson::to_bson(&value.into())? {
        Bson::Document(doc) => Ok(doc),
        other => Err(PortalError::Serialization(format!(
            "seed record must be an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryRecordStore::new();
        store.insert(Scope::distribution("c1"), "d1", doc! { "beneficiary_id": "7" });
        store.insert(Scope::distribution("c1"), "d2", doc! { "beneficiary_id": 7_i64 });
        store.insert(Scope::distribution("c2"), "d3", doc! { "beneficiary_id": "7" });

        let hits = store
            .find(&Scope::distribution("c1"), &Predicate::eq("beneficiary_id", "7"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "d1");
        assert_eq!(hits[0].camp_id.as_deref(), Some("c1"));
        assert_eq!(store.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_find_across_camps() {
        let store = MemoryRecordStore::new();
        store.insert(Scope::beneficiaries("c2"), "b2", doc! { "head_id_number": "900" });
        store.insert(Scope::beneficiaries("c1"), "b1", doc! { "head_id_number": "900" });
        store.insert(Scope::parcels("c1"), "p1", doc! { "head_id_number": "900" });

        let hits = store
            .find_across_camps(
                &CampCollection::Beneficiaries,
                &Predicate::eq("head_id_number", "900"),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].camp_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_create_stamps_server_time() {
        let store = MemoryRecordStore::new();
        let scope = Scope::complaints("c1", "b1");
        let key = store
            .create(
                &scope,
                NewRecord::new(doc! { "complaint_text": "x" }).with_server_timestamp("created_at"),
            )
            .await
            .unwrap();
        let record = store.get_by_key(&scope, &key).await.unwrap().unwrap();
        assert!(matches!(record.fields.get("created_at"), Some(Bson::DateTime(_))));
    }

    #[tokio::test]
    async fn test_update_missing_is_error() {
        let store = MemoryRecordStore::new();
        let err = store
            .update(&Scope::beneficiaries("c1"), "nope", doc! { "password_hash": "h" })
            .await
            .unwrap_err();
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn test_failing_collection() {
        let store = MemoryRecordStore::new();
        store.fail_collection("parcels");
        let err = store.get_by_key(&Scope::parcels("c1"), "p1").await.unwrap_err();
        assert!(err.is_store_failure());
        assert!(store.get_by_key(&Scope::Camps, "c1").await.unwrap().is_none());
    }

    #[test]
    fn test_seed_json() {
        let store = MemoryRecordStore::from_seed_json(
            r#"{ "camps": { "c1": {
                "camp_name": "Camp One",
                "beneficiaries": { "b1": { "head_id_number": "900", "main_phone": "0599" } },
                "parcels": { "p1": { "id": 3, "status": "open" } }
            } } }"#,
        )
        .unwrap();
        let camp = tokio_test::block_on(store.get_by_key(&Scope::Camps, "c1"))
            .unwrap()
            .unwrap();
        assert_eq!(camp.fields.get_str("camp_name").unwrap(), "Camp One");
        assert!(camp.fields.get("beneficiaries").is_none());
        let parcel = tokio_test::block_on(store.get_by_key(&Scope::parcels("c1"), "p1"))
            .unwrap()
            .unwrap();
        assert!(matches!(parcel.fields.get("id"), Some(Bson::Int64(3)) | Some(Bson::Int32(3))));
    }
}
