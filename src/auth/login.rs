//! Login by national identifier
//!
//! The beneficiary is looked up across every camp by `head_id_number`; the
//! first match wins. The credential is then checked against whichever mode
//! the record is in, and the owning camp's metadata is cached into the
//! session.

use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::auth::CredentialMode;
use crate::db::schemas::{BeneficiaryDoc, CampDoc};
use crate::session::SessionContext;
use crate::store::{CampCollection, Predicate, RecordStore, Scope};
use crate::types::{PortalError, Result};

pub struct LoginService {
    store: Arc<dyn RecordStore>,
}

impl LoginService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Authenticate and build a session
    pub async fn login(&self, national_id: &str, credential: &str) -> Result<SessionContext> {
        let national_id = national_id.trim();
        let credential = Zeroizing::new(credential.trim().to_string());
        if national_id.is_empty() || credential.is_empty() {
            return Err(PortalError::Validation(
                "national id and credential are required".into(),
            ));
        }

        let matches = self
            .store
            .find_across_camps(
                &CampCollection::Beneficiaries,
                &Predicate::eq("head_id_number", national_id),
            )
            .await?;

        let Some(record) = matches.into_iter().next() else {
            info!(national_id, "Login rejected: unknown national id");
            return Err(PortalError::NotFound(format!("national id {national_id}")));
        };
        let camp_id = record.camp_id.clone().ok_or_else(|| {
            PortalError::DataInconsistency(format!("beneficiary {} has no camp", record.key))
        })?;

        let beneficiary = BeneficiaryDoc::from_record(&record)?;
        let mode = CredentialMode::of(&beneficiary);
        if let Err(e) = mode.verify(&credential) {
            info!(national_id, mode = ?mode.kind(), "Login rejected: credential mismatch");
            return Err(e);
        }

        let camp = match self.store.get_by_key(&Scope::Camps, &camp_id).await? {
            Some(record) => CampDoc::from_record(&record)?,
            None => {
                warn!(camp_id = %camp_id, "Beneficiary camp has no camp record");
                CampDoc::default()
            }
        };

        info!(camp_id = %camp_id, beneficiary = %record.key, "Login succeeded");
        Ok(SessionContext::new(beneficiary, camp, camp_id, record.key))
    }
}
