//! Complaint document schema
//!
//! Stored under `camps/{camp}/beneficiaries/{key}/complaints`. Created once
//! with a pending status and a server-assigned timestamp; never updated by
//! the portal.

use bson::{doc, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::store::StoredRecord;
use crate::types::Result;

pub const COMPLAINT_STATUS_PENDING: &str = "pending";

/// Field filled by the store clock on creation
pub const CREATED_AT_FIELD: &str = "created_at";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ComplaintDoc {
    pub complaint_text: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl ComplaintDoc {
    /// Body of a new complaint, without the server timestamp
    pub fn new_fields(text: &str) -> Document {
        doc! {
            "complaint_text": text,
            "status": COMPLAINT_STATUS_PENDING,
        }
    }

    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Ok(bson::from_document(record.fields.clone())?)
    }
}
