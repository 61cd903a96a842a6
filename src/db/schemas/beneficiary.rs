//! Beneficiary document schema
//!
//! A registered household. Keyed by the store; identified in the domain by
//! `head_id_number`. Some records also carry an embedded `id`.

use bson::Bson;
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::store::{value_to_text, StoredRecord};
use crate::types::Result;

/// Beneficiary document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BeneficiaryDoc {
    /// Embedded identifier, string or number depending on the record's age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,

    /// National identifier of the head of household
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_id_number: Option<Bson>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub head_name: Option<String>,

    /// Registered phone, doubles as the login secret until a password is set
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub main_phone: Option<String>,

    /// Hex SHA-256 of the password, when one has been set
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_count", skip_serializing_if = "Option::is_none")]
    pub family_count: Option<u32>,

    #[serde(default, deserialize_with = "lenient::count")]
    pub males_0_2: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub males_5_17: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub males_17_60: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub males_60_plus: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub females_0_2: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub females_5_17: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub females_17_60: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub females_60_plus: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub disabled_count: u32,

    /// Original place of residence
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub governorate: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

/// Household composition by age band
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Demographics {
    pub males_0_2: u32,
    pub males_5_17: u32,
    pub males_17_60: u32,
    pub males_60_plus: u32,
    pub females_0_2: u32,
    pub females_5_17: u32,
    pub females_17_60: u32,
    pub females_60_plus: u32,
    pub disabled_count: u32,
}

impl Demographics {
    /// Sum of the eight age bands (disabled members are counted within them),
    /// saturating at `u32::MAX`
    pub fn total_members(&self) -> u32 {
        [
            self.males_0_2,
            self.males_5_17,
            self.males_17_60,
            self.males_60_plus,
            self.females_0_2,
            self.females_5_17,
            self.females_17_60,
            self.females_60_plus,
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add)
    }
}

impl BeneficiaryDoc {
    pub fn from_record(record: &StoredRecord) -> Result<Self> {
        Ok(bson::from_document(record.fields.clone())?)
    }

    /// Domain identifier as text
    pub fn head_id_text(&self) -> Option<String> {
        self.head_id_number
            .as_ref()
            .and_then(value_to_text)
            .filter(|s| !s.is_empty())
    }

    pub fn demographics(&self) -> Demographics {
        Demographics {
            males_0_2: self.males_0_2,
            males_5_17: self.males_5_17,
            males_17_60: self.males_17_60,
            males_60_plus: self.males_60_plus,
            females_0_2: self.females_0_2,
            females_5_17: self.females_5_17,
            females_17_60: self.females_17_60,
            females_60_plus: self.females_60_plus,
            disabled_count: self.disabled_count,
        }
    }

    /// Recorded family size, or the sum of the age bands when unset
    pub fn family_total(&self) -> u32 {
        self.family_count
            .unwrap_or_else(|| self.demographics().total_members())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn record(fields: bson::Document) -> StoredRecord {
        StoredRecord {
            key: "b1".into(),
            camp_id: Some("c1".into()),
            fields,
        }
    }

    #[test]
    fn test_mixed_representations() {
        let doc = BeneficiaryDoc::from_record(&record(doc! {
            "id": 17_i32,
            "head_id_number": "400123456",
            "head_name": "Ahmad",
            "main_phone": 599123456_i64,
            "males_0_2": "2",
            "females_17_60": 1_i32,
            "disabled_count": "x",
        }))
        .unwrap();

        assert_eq!(doc.id, Some(Bson::Int32(17)));
        assert_eq!(doc.head_id_text().as_deref(), Some("400123456"));
        assert_eq!(doc.main_phone.as_deref(), Some("599123456"));
        assert_eq!(doc.males_0_2, 2);
        assert_eq!(doc.disabled_count, 0);
        assert_eq!(doc.family_total(), 3);
        assert!(doc.password_hash.is_none());
    }

    #[test]
    fn test_family_count_preferred() {
        let doc = BeneficiaryDoc::from_record(&record(doc! {
            "family_count": 6_i32,
            "males_0_2": 1_i32,
        }))
        .unwrap();
        assert_eq!(doc.family_total(), 6);
    }

    #[test]
    fn test_zero_family_count_falls_back() {
        let doc = BeneficiaryDoc::from_record(&record(doc! {
            "family_count": 0_i32,
            "males_5_17": 2_i32,
        }))
        .unwrap();
        assert_eq!(doc.family_total(), 2);
    }

    #[test]
    fn test_empty_password_hash_is_absent() {
        let doc = BeneficiaryDoc::from_record(&record(doc! { "password_hash": "" })).unwrap();
        assert!(doc.password_hash.is_none());
    }

    #[test]
    fn test_total_members_saturates() {
        let doc = BeneficiaryDoc::from_record(&record(doc! {
            "males_0_2": 4_000_000_000_i64,
            "females_0_2": 1_000_000_000_i64,
            "males_60_plus": 3_i32,
        }))
        .unwrap();
        assert_eq!(doc.males_0_2, 4_000_000_000);
        assert_eq!(doc.family_total(), u32::MAX);
    }
}
