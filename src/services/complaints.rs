//! Complaint submission

use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{ComplaintDoc, CREATED_AT_FIELD};
use crate::session::SessionContext;
use crate::store::{NewRecord, RecordStore, Scope};
use crate::types::{PortalError, Result};

pub struct ComplaintService {
    store: Arc<dyn RecordStore>,
}

impl ComplaintService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// File a complaint, returning its store key
    ///
    /// The creation time is assigned by the store, not by this client.
    pub async fn submit(&self, session: &SessionContext, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PortalError::Validation("complaint text is required".into()));
        }

        let scope = Scope::complaints(&session.camp_id, &session.beneficiary_key);
        let record = NewRecord::new(ComplaintDoc::new_fields(text)).with_server_timestamp(CREATED_AT_FIELD);
        let key = self.store.create(&scope, record).await?;

        info!(scope = %scope, complaint = %key, "Complaint submitted");
        Ok(key)
    }

    /// Read back one of the session beneficiary's complaints
    pub async fn fetch(&self, session: &SessionContext, key: &str) -> Result<ComplaintDoc> {
        let scope = Scope::complaints(&session.camp_id, &session.beneficiary_key);
        let record = self
            .store
            .get_by_key(&scope, key)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("complaint {key}")))?;
        ComplaintDoc::from_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{BeneficiaryDoc, CampDoc, COMPLAINT_STATUS_PENDING};
    use crate::store::MemoryRecordStore;

    fn session() -> SessionContext {
        SessionContext::new(BeneficiaryDoc::default(), CampDoc::default(), "c1", "b1")
    }

    #[tokio::test]
    async fn test_submit_and_fetch() {
        let service = ComplaintService::new(Arc::new(MemoryRecordStore::new()));
        let key = service.submit(&session(), "  no food delivered ").await.unwrap();
        let complaint = service.fetch(&session(), &key).await.unwrap();
        assert_eq!(complaint.complaint_text, "no food delivered");
        assert_eq!(complaint.status, COMPLAINT_STATUS_PENDING);
        assert!(complaint.created_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ComplaintService::new(store.clone());
        assert!(matches!(
            service.submit(&session(), "   ").await,
            Err(PortalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_complaints_scoped_to_beneficiary() {
        let service = ComplaintService::new(Arc::new(MemoryRecordStore::new()));
        let key = service.submit(&session(), "late delivery").await.unwrap();
        let other = SessionContext::new(BeneficiaryDoc::default(), CampDoc::default(), "c1", "b2");
        assert!(matches!(
            service.fetch(&other, &key).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
