//! Camp document schema

use serde::{Deserialize, Serialize};

use super::lenient;
use crate::store::StoredRecord;
use crate::types::Result;

/// Camp display metadata
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CampDoc {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub camp_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub representative_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub representative_phone: Option<String>,
}

impl CampDoc {
    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Ok(bson::from_document(record.fields.clone())?)
    }
}
