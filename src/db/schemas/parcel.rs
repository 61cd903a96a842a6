//! Parcel document schema
//!
//! A distributable aid package. Addressed either by its document key or by
//! the embedded `id`; the two are not guaranteed to agree.

use bson::Bson;
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::store::StoredRecord;
use crate::types::Result;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ParcelDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub type_parcel: Option<String>,
    /// Lifecycle status literal
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ParcelDoc {
    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Ok(bson::from_document(record.fields.clone())?)
    }
}
