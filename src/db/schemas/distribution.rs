//! Distribution document schema
//!
//! Joins one beneficiary to one parcel. Both references are raw values: the
//! beneficiary may be referenced by document key, embedded id or national
//! identifier, as a string or a number.

use bson::Bson;
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::store::StoredRecord;
use crate::types::Result;

pub const BENEFICIARY_REF_FIELD: &str = "beneficiary_id";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DistributionDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_id: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<Bson>,
    /// Receipt status literal
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub distribution_date: Option<String>,
}

impl DistributionDoc {
    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Ok(bson::from_document(record.fields.clone())?)
    }
}
