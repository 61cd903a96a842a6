//! MongoDB client and record store backend
//!
//! Each logical collection is one physical collection. Child records carry a
//! `camp_id` field; complaints also carry `beneficiary_key`. Document keys
//! are string `_id` values; records imported with a default `ObjectId` key
//! are addressed by its hex form.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{
    CampCollection, NewRecord, Predicate, RecordStore, Scope, StoredRecord, BENEFICIARIES, CAMPS,
    COMPLAINTS, DISTRIBUTION, PARCELS,
};
use crate::types::{PortalError, Result, StoreOp};

const CAMP_FIELD: &str = "camp_id";
const BENEFICIARY_KEY_FIELD: &str = "beneficiary_key";

/// Index definitions per collection
pub trait IntoIndexes {
    fn into_indices() -> Vec<(&'static str, Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| PortalError::store(StoreOp::Connect, uri, e))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PortalError::store(StoreOp::Connect, db_name, format!("ping failed: {e}")))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get an untyped collection
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection(name)
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Record store backed by MongoDB
#[derive(Clone)]
pub struct MongoRecordStore {
    mongo: MongoClient,
}

impl MongoRecordStore {
    pub fn new(mongo: MongoClient) -> Self {
        Self { mongo }
    }

    /// Create the lookup indexes the portal queries rely on
    pub async fn ensure_indexes(&self) -> Result<()> {
        for (collection, keys, options) in Self::into_indices() {
            let model = IndexModel::builder().keys(keys).options(options).build();
            self.mongo
                .collection(collection)
                .create_index(model)
                .await
                .map_err(|e| PortalError::store(StoreOp::Connect, collection, format!("index: {e}")))?;
        }
        info!(db = self.mongo.db_name(), "Record store indexes ensured");
        Ok(())
    }

    fn collection_for(&self, scope: &Scope) -> Collection<Document> {
        self.mongo.collection(scope.collection_name())
    }
}

impl IntoIndexes for MongoRecordStore {
    fn into_indices() -> Vec<(&'static str, Document, Option<IndexOptions>)> {
        let named = |name: &str| Some(IndexOptions::builder().name(name.to_string()).build());
        vec![
            (
                BENEFICIARIES,
                doc! { "head_id_number": 1 },
                named("head_id_number_index"),
            ),
            (
                DISTRIBUTION,
                doc! { CAMP_FIELD: 1, "beneficiary_id": 1 },
                named("camp_beneficiary_index"),
            ),
            (PARCELS, doc! { CAMP_FIELD: 1, "id": 1 }, named("camp_parcel_id_index")),
            (
                COMPLAINTS,
                doc! { CAMP_FIELD: 1, BENEFICIARY_KEY_FIELD: 1 },
                named("camp_beneficiary_key_index"),
            ),
        ]
    }
}

/// Filter restricting a query to a scope
fn scope_filter(scope: &Scope) -> Document {
    match scope {
        Scope::Camps => Document::new(),
        Scope::Camp {
            camp_id,
            collection: CampCollection::Complaints { beneficiary_key },
        } => doc! { CAMP_FIELD: camp_id.as_str(), BENEFICIARY_KEY_FIELD: beneficiary_key.as_str() },
        Scope::Camp { camp_id, .. } => doc! { CAMP_FIELD: camp_id.as_str() },
    }
}

/// `_id` condition for a document key
///
/// A key that parses as an `ObjectId` matches either representation.
fn key_filter(key: &str) -> Bson {
    match ObjectId::parse_str(key) {
        Ok(oid) => Bson::Document(doc! { "$in": [key, oid] }),
        Err(_) => Bson::String(key.to_string()),
    }
}

/// Split a stored document into key, camp and body
fn into_record(mut raw: Document) -> Option<StoredRecord> {
    let key = match raw.remove("_id")? {
        Bson::String(s) => s,
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    };
    let camp_id = match raw.remove(CAMP_FIELD) {
        Some(Bson::String(s)) => Some(s),
        _ => None,
    };
    raw.remove(BENEFICIARY_KEY_FIELD);
    Some(StoredRecord {
        key,
        camp_id,
        fields: raw,
    })
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn find(&self, scope: &Scope, predicate: &Predicate) -> Result<Vec<StoredRecord>> {
        let mut filter = scope_filter(scope);
        filter.insert(predicate.field.clone(), predicate.value.clone());

        let cursor = self
            .collection_for(scope)
            .find(filter)
            .await
            .map_err(|e| PortalError::store(StoreOp::Find, scope, e))?;
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| PortalError::store(StoreOp::Find, scope, e))?;

        debug!(scope = %scope, field = %predicate.field, hits = docs.len(), "mongo find");
        Ok(docs.into_iter().filter_map(into_record).collect())
    }

    async fn find_across_camps(
        &self,
        collection: &CampCollection,
        predicate: &Predicate,
    ) -> Result<Vec<StoredRecord>> {
        let mut filter = Document::new();
        filter.insert(predicate.field.clone(), predicate.value.clone());
        let cursor = self
            .mongo
            .collection(collection.name())
            .find(filter)
            .sort(doc! { CAMP_FIELD: 1, "_id": 1 })
            .await
            .map_err(|e| PortalError::store(StoreOp::FindAcrossCamps, collection.name(), e))?;
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| PortalError::store(StoreOp::FindAcrossCamps, collection.name(), e))?;

        Ok(docs.into_iter().filter_map(into_record).collect())
    }

    async fn get_by_key(&self, scope: &Scope, key: &str) -> Result<Option<StoredRecord>> {
        let mut filter = scope_filter(scope);
        filter.insert("_id", key_filter(key));

        let found = self
            .collection_for(scope)
            .find_one(filter)
            .await
            .map_err(|e| PortalError::store(StoreOp::GetByKey, scope, e))?;
        Ok(found.and_then(into_record))
    }

    async fn create(&self, scope: &Scope, record: NewRecord) -> Result<String> {
        let key = Uuid::new_v4().simple().to_string();

        let mut fields = record.fields;
        fields.extend(scope_filter(scope));

        // Upsert so the server clock fills timestamps in the same write
        let mut update = doc! { "$setOnInsert": fields };
        if !record.server_timestamps.is_empty() {
            let stamps: Document = record
                .server_timestamps
                .into_iter()
                .map(|field| (field, Bson::Boolean(true)))
                .collect();
            update.insert("$currentDate", stamps);
        }

        self.collection_for(scope)
            .update_one(doc! { "_id": key.as_str() }, update)
            .upsert(true)
            .await
            .map_err(|e| PortalError::store(StoreOp::Create, scope, e))?;

        debug!(scope = %scope, key = %key, "mongo create");
        Ok(key)
    }

    async fn update(&self, scope: &Scope, key: &str, partial: Document) -> Result<()> {
        let mut filter = scope_filter(scope);
        filter.insert("_id", key_filter(key));

        let result = self
            .collection_for(scope)
            .update_one(filter, doc! { "$set": partial })
            .await
            .map_err(|e| PortalError::store(StoreOp::Update, scope, e))?;

        if result.matched_count == 0 {
            return Err(PortalError::store(
                StoreOp::Update,
                scope,
                format!("no document {key}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Round trips against a live server need a running MongoDB instance

    #[test]
    fn test_scope_filter() {
        assert!(scope_filter(&Scope::Camps).is_empty());
        assert_eq!(
            scope_filter(&Scope::parcels("c1")),
            doc! { "camp_id": "c1" }
        );
        assert_eq!(
            scope_filter(&Scope::complaints("c1", "b1")),
            doc! { "camp_id": "c1", "beneficiary_key": "b1" }
        );
    }

    #[test]
    fn test_into_record_strips_bookkeeping() {
        let record = into_record(doc! {
            "_id": "p1",
            "camp_id": "c1",
            "name": "Flour",
        })
        .unwrap();
        assert_eq!(record.key, "p1");
        assert_eq!(record.camp_id.as_deref(), Some("c1"));
        assert_eq!(record.fields, doc! { "name": "Flour" });
    }

    #[test]
    fn test_key_filter_matches_object_id_keys() {
        let hex = "65a1b2c3d4e5f60718293a4b";
        let oid = ObjectId::parse_str(hex).unwrap();
        assert_eq!(key_filter(hex), Bson::Document(doc! { "$in": [hex, oid] }));
        assert_eq!(key_filter("b1"), Bson::String("b1".into()));
    }

    #[test]
    fn test_object_id_key_round_trips() {
        let oid = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let record = into_record(doc! { "_id": oid, "camp_id": "c1" }).unwrap();
        let mut filter = scope_filter(&Scope::beneficiaries("c1"));
        filter.insert("_id", key_filter(&record.key));
        let ids = filter.get_document("_id").unwrap().get_array("$in").unwrap();
        assert!(ids.contains(&Bson::ObjectId(oid)));
    }

    #[test]
    fn test_into_record_requires_key() {
        assert!(into_record(doc! { "name": "x" }).is_none());
    }

    #[test]
    fn test_indices_cover_lookup_fields() {
        let indices = MongoRecordStore::into_indices();
        assert!(indices
            .iter()
            .any(|(c, keys, _)| *c == DISTRIBUTION && keys.contains_key("beneficiary_id")));
        assert!(indices.iter().all(|(c, _, _)| *c != CAMPS));
    }
}
