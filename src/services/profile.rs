//! Household profile

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::{BeneficiaryDoc, Demographics};
use crate::resolver::PLACEHOLDER;
use crate::session::SessionContext;
use crate::store::{RecordStore, Scope};
use crate::types::{PortalError, Result};

/// Display-ready profile of a beneficiary household
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BeneficiaryProfile {
    pub head_name: String,
    pub head_id_number: String,
    pub main_phone: String,
    pub camp_name: String,
    pub camp_location: String,
    pub representative_name: String,
    pub representative_phone: String,
    pub family_total: u32,
    pub demographics: Demographics,
    pub governorate: String,
    pub town: String,
    pub landmark: String,
}

impl BeneficiaryProfile {
    fn build(beneficiary: &BeneficiaryDoc, session: &SessionContext) -> Self {
        let text = |v: Option<&String>| v.cloned().unwrap_or_else(|| PLACEHOLDER.to_string());
        let camp = session.camp();
        Self {
            head_name: text(beneficiary.head_name.as_ref()),
            head_id_number: beneficiary
                .head_id_text()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            main_phone: text(beneficiary.main_phone.as_ref()),
            camp_name: text(camp.camp_name.as_ref()),
            camp_location: text(camp.location.as_ref()),
            representative_name: text(camp.representative_name.as_ref()),
            representative_phone: text(camp.representative_phone.as_ref()),
            family_total: beneficiary.family_total(),
            demographics: beneficiary.demographics(),
            governorate: text(beneficiary.governorate.as_ref()),
            town: text(beneficiary.town.as_ref()),
            landmark: text(beneficiary.landmark.as_ref()),
        }
    }
}

pub struct ProfileService {
    store: Arc<dyn RecordStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fresh profile of the session's beneficiary
    ///
    /// Household data is re-read from the store; camp details come from the
    /// session.
    pub async fn load(&self, session: &SessionContext) -> Result<BeneficiaryProfile> {
        let record = self
            .store
            .get_by_key(&Scope::beneficiaries(&session.camp_id), &session.beneficiary_key)
            .await?
            .ok_or_else(|| {
                warn!(
                    camp_id = %session.camp_id,
                    beneficiary = %session.beneficiary_key,
                    "Session beneficiary no longer exists"
                );
                PortalError::NotFound(format!("beneficiary {}", session.beneficiary_key))
            })?;

        let beneficiary = BeneficiaryDoc::from_record(&record)?;
        Ok(BeneficiaryProfile::build(&beneficiary, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::CampDoc;
    use crate::store::MemoryRecordStore;
    use bson::doc;

    fn session() -> SessionContext {
        SessionContext::new(
            BeneficiaryDoc::default(),
            CampDoc {
                camp_name: Some("Camp One".into()),
                representative_phone: Some("0599000000".into()),
                ..Default::default()
            },
            "c1",
            "b1",
        )
    }

    #[tokio::test]
    async fn test_load_profile() {
        let store = MemoryRecordStore::new();
        store.insert(
            Scope::beneficiaries("c1"),
            "b1",
            doc! {
                "head_name": "Ahmad",
                "head_id_number": 400111222_i64,
                "males_0_2": 1_i32,
                "females_5_17": "2",
                "females_17_60": 1_i32,
                "disabled_count": 1_i32,
                "town": "Beit Hanoun",
            },
        );

        let profile = ProfileService::new(Arc::new(store))
            .load(&session())
            .await
            .unwrap();
        assert_eq!(profile.head_name, "Ahmad");
        assert_eq!(profile.head_id_number, "400111222");
        assert_eq!(profile.main_phone, PLACEHOLDER);
        assert_eq!(profile.camp_name, "Camp One");
        assert_eq!(profile.camp_location, PLACEHOLDER);
        assert_eq!(profile.family_total, 4);
        assert_eq!(profile.demographics.disabled_count, 1);
        assert_eq!(profile.town, "Beit Hanoun");
        assert_eq!(profile.governorate, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_missing_beneficiary() {
        let err = ProfileService::new(Arc::new(MemoryRecordStore::new()))
            .load(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_profile_with_oversized_counts() {
        let store = MemoryRecordStore::new();
        store.insert(
            Scope::beneficiaries("c1"),
            "b1",
            doc! {
                "males_0_2": 4_000_000_000_i64,
                "females_0_2": 1_000_000_000_i64,
            },
        );

        let profile = ProfileService::new(Arc::new(store))
            .load(&session())
            .await
            .unwrap();
        assert_eq!(profile.family_total, u32::MAX);
    }
}
