//! Record store abstraction
//!
//! The portal is a direct client of a hosted document store. Every read and
//! write goes through [`RecordStore`], scoped to a camp and one of its child
//! collections:
//!
//! ```text
//! camps/{camp_id}
//!   ├── beneficiaries/{key}
//!   │     └── complaints/{key}
//!   ├── distribution/{key}
//!   └── parcels/{key}
//! ```
//!
//! Backends:
//! - [`MemoryRecordStore`]: dashmap-backed, used by tests and seed files
//! - [`crate::db::MongoRecordStore`]: production MongoDB backend
//! - [`TimeoutStore`]: decorator imposing an application-level deadline

mod memory;
mod timeout;

pub use memory::MemoryRecordStore;
pub use timeout::TimeoutStore;

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt;

use crate::types::Result;

pub const CAMPS: &str = "camps";
pub const BENEFICIARIES: &str = "beneficiaries";
pub const DISTRIBUTION: &str = "distribution";
pub const PARCELS: &str = "parcels";
pub const COMPLAINTS: &str = "complaints";

/// Child collection of a camp
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CampCollection {
    Beneficiaries,
    Distribution,
    Parcels,
    /// Complaints live under one beneficiary
    Complaints { beneficiary_key: String },
}

impl CampCollection {
    /// Logical collection name
    pub fn name(&self) -> &'static str {
        match self {
            CampCollection::Beneficiaries => BENEFICIARIES,
            CampCollection::Distribution => DISTRIBUTION,
            CampCollection::Parcels => PARCELS,
            CampCollection::Complaints { .. } => COMPLAINTS,
        }
    }
}

/// Where a record lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The top-level camps collection
    Camps,
    /// A collection owned by one camp
    Camp {
        camp_id: String,
        collection: CampCollection,
    },
}

impl Scope {
    pub fn camp(camp_id: impl Into<String>, collection: CampCollection) -> Self {
        Scope::Camp {
            camp_id: camp_id.into(),
            collection,
        }
    }

    pub fn beneficiaries(camp_id: impl Into<String>) -> Self {
        Self::camp(camp_id, CampCollection::Beneficiaries)
    }

    pub fn distribution(camp_id: impl Into<String>) -> Self {
        Self::camp(camp_id, CampCollection::Distribution)
    }

    pub fn parcels(camp_id: impl Into<String>) -> Self {
        Self::camp(camp_id, CampCollection::Parcels)
    }

    pub fn complaints(camp_id: impl Into<String>, beneficiary_key: impl Into<String>) -> Self {
        Self::camp(
            camp_id,
            CampCollection::Complaints {
                beneficiary_key: beneficiary_key.into(),
            },
        )
    }

    /// Logical collection name of this scope
    pub fn collection_name(&self) -> &'static str {
        match self {
            Scope::Camps => CAMPS,
            Scope::Camp { collection, .. } => collection.name(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Camps => f.write_str(CAMPS),
            Scope::Camp {
                camp_id,
                collection: CampCollection::Complaints { beneficiary_key },
            } => write!(
                f,
                "{CAMPS}/{camp_id}/{BENEFICIARIES}/{beneficiary_key}/{COMPLAINTS}"
            ),
            Scope::Camp {
                camp_id,
                collection,
            } => write!(f, "{CAMPS}/{camp_id}/{}", collection.name()),
        }
    }
}

/// Equality predicate on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub value: Bson,
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Test a record against this predicate with store equality semantics
    pub fn matches(&self, record: &Document) -> bool {
        record
            .get(&self.field)
            .is_some_and(|stored| values_equal(stored, &self.value))
    }
}

/// A record read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Store-assigned document key
    pub key: String,
    /// Owning camp, when the record lives under one
    pub camp_id: Option<String>,
    /// Record body, without store bookkeeping fields
    pub fields: Document,
}

/// A record to create
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub fields: Document,
    /// Fields the store fills with its own clock at creation
    pub server_timestamps: Vec<String>,
}

impl NewRecord {
    pub fn new(fields: Document) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }
}

/// Document store operations used by the portal
///
/// All operations are read-your-writes within a scope; no transactions or
/// optimistic concurrency are offered.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records in `scope` matching `predicate`
    async fn find(&self, scope: &Scope, predicate: &Predicate) -> Result<Vec<StoredRecord>>;

    /// Records in the named child collection of every camp matching `predicate`
    async fn find_across_camps(
        &self,
        collection: &CampCollection,
        predicate: &Predicate,
    ) -> Result<Vec<StoredRecord>>;

    /// One record by document key, `None` when absent
    async fn get_by_key(&self, scope: &Scope, key: &str) -> Result<Option<StoredRecord>>;

    /// Insert a record, returning its assigned key
    async fn create(&self, scope: &Scope, record: NewRecord) -> Result<String>;

    /// Merge `partial` into an existing record
    async fn update(&self, scope: &Scope, key: &str, partial: Document) -> Result<()>;
}

/// Store equality: numbers compare by value across widths, everything else
/// compares structurally. A string never equals a number.
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a == b,
        _ => false,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Text form of a scalar value, `None` for null, missing-like or compound values
pub fn value_to_text(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        Bson::Double(n) if n.fract() == 0.0 && n.is_finite() => Some(format!("{}", *n as i64)),
        Bson::Double(n) => Some(n.to_string()),
        Bson::Boolean(b) => Some(b.to_string()),
        Bson::DateTime(dt) => Some(dt.to_chrono().to_rfc3339()),
        Bson::Timestamp(ts) => chrono::DateTime::from_timestamp(i64::from(ts.time), 0)
            .map(|dt| dt.to_rfc3339()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        _ => None,
    }
}

/// Numeric coercion of a scalar value
///
/// Text is trimmed and parsed as an integer; values that do not parse, and
/// zero, yield `None`.
pub fn numeric_coercion(value: &Bson) -> Option<Bson> {
    let n = match value {
        Bson::String(s) => s.trim().parse::<i64>().ok()?,
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        Bson::Double(n) if n.fract() == 0.0 && n.is_finite() => *n as i64,
        _ => return None,
    };
    (n != 0).then_some(Bson::Int64(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Camps.to_string(), "camps");
        assert_eq!(Scope::parcels("c1").to_string(), "camps/c1/parcels");
        assert_eq!(
            Scope::complaints("c1", "b7").to_string(),
            "camps/c1/beneficiaries/b7/complaints"
        );
    }

    #[test]
    fn test_values_equal_numeric_widths() {
        assert!(values_equal(&Bson::Int32(5), &Bson::Int64(5)));
        assert!(values_equal(&Bson::Double(5.0), &Bson::Int64(5)));
        assert!(!values_equal(&Bson::String("5".into()), &Bson::Int64(5)));
        assert!(values_equal(
            &Bson::String("abc".into()),
            &Bson::String("abc".into())
        ));
    }

    #[test]
    fn test_predicate_missing_field() {
        let p = Predicate::eq("beneficiary_id", "7");
        assert!(!p.matches(&doc! { "parcel_id": "7" }));
        assert!(p.matches(&doc! { "beneficiary_id": "7" }));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(numeric_coercion(&Bson::String(" 42 ".into())), Some(Bson::Int64(42)));
        assert_eq!(numeric_coercion(&Bson::String("abc".into())), None);
        assert_eq!(numeric_coercion(&Bson::String("0".into())), None);
        assert_eq!(numeric_coercion(&Bson::Double(3.0)), Some(Bson::Int64(3)));
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&Bson::Int32(12)).as_deref(), Some("12"));
        assert_eq!(value_to_text(&Bson::Double(12.0)).as_deref(), Some("12"));
        assert_eq!(value_to_text(&Bson::Null), None);
    }
}
