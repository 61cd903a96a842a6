//! Password change
//!
//! Two steps: prove the current credential (password, or the registered
//! phone if no password was ever set), then write the new digest. The
//! sequence is read-verify-then-write with no concurrency check; two racing
//! changes resolve as last write wins.

use bson::doc;
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

use crate::auth::{hash_password, CredentialMode, MIN_PASSWORD_LEN};
use crate::db::schemas::BeneficiaryDoc;
use crate::session::SessionContext;
use crate::store::{RecordStore, Scope};
use crate::types::{PortalError, Result};

pub struct PasswordChangeService {
    store: Arc<dyn RecordStore>,
}

impl PasswordChangeService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Step one: check the current credential against the stored record
    pub async fn verify_current(&self, session: &SessionContext, input: &str) -> Result<()> {
        let input = Zeroizing::new(input.trim().to_string());
        if input.is_empty() {
            return Err(PortalError::Validation("current credential is required".into()));
        }

        let record = self
            .store
            .get_by_key(&Scope::beneficiaries(&session.camp_id), &session.beneficiary_key)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("beneficiary {}", session.beneficiary_key)))?;
        let beneficiary = BeneficiaryDoc::from_record(&record)?;

        CredentialMode::of(&beneficiary).verify(&input)
    }

    /// Step two: store the new password and refresh the session copy.
    /// Only reachable through [`Self::change`], after step one succeeded.
    async fn set_new_password(
        &self,
        session: &mut SessionContext,
        new_password: &str,
        confirmation: &str,
    ) -> Result<()> {
        let new_password = Zeroizing::new(new_password.trim().to_string());
        let confirmation = Zeroizing::new(confirmation.trim().to_string());

        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if *new_password != *confirmation {
            return Err(PortalError::Validation("passwords do not match".into()));
        }

        let digest = hash_password(&new_password);
        self.store
            .update(
                &Scope::beneficiaries(&session.camp_id),
                &session.beneficiary_key,
                doc! { "password_hash": digest.as_str() },
            )
            .await?;

        session.profile.beneficiary.password_hash = Some(digest);
        info!(
            camp_id = %session.camp_id,
            beneficiary = %session.beneficiary_key,
            "Password changed"
        );
        Ok(())
    }

    /// Both steps in sequence
    pub async fn change(
        &self,
        session: &mut SessionContext,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<()> {
        self.verify_current(session, current).await?;
        self.set_new_password(session, new_password, confirmation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db::schemas::CampDoc;
    use crate::store::MemoryRecordStore;
    use crate::types::CredentialKind;

    fn setup() -> (Arc<MemoryRecordStore>, SessionContext) {
        let store = MemoryRecordStore::new();
        store.insert(
            Scope::beneficiaries("c1"),
            "b1",
            doc! { "head_id_number": "400", "main_phone": "0599111222" },
        );
        let session = SessionContext::new(
            BeneficiaryDoc {
                main_phone: Some("0599111222".into()),
                ..Default::default()
            },
            CampDoc::default(),
            "c1",
            "b1",
        );
        (Arc::new(store), session)
    }

    #[tokio::test]
    async fn test_phone_then_password() {
        let (store, mut session) = setup();
        let service = PasswordChangeService::new(store.clone());

        service
            .change(&mut session, "0599111222", "newpass1", "newpass1")
            .await
            .unwrap();

        let stored = store
            .get_by_key(&Scope::beneficiaries("c1"), "b1")
            .await
            .unwrap()
            .unwrap();
        let hash = stored.fields.get_str("password_hash").unwrap();
        assert!(verify_password("newpass1", hash));
        assert_eq!(session.beneficiary().password_hash.as_deref(), Some(hash));

        // The phone no longer proves identity
        assert!(matches!(
            service.verify_current(&session, "0599111222").await,
            Err(PortalError::InvalidCredential(CredentialKind::Password))
        ));
        service.verify_current(&session, "newpass1").await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_current_credential() {
        let (store, mut session) = setup();
        let service = PasswordChangeService::new(store.clone());
        let err = service
            .change(&mut session, "0000", "newpass1", "newpass1")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::InvalidCredential(CredentialKind::Phone)));
        assert!(session.beneficiary().password_hash.is_none());

        // Nothing was written
        let stored = store
            .get_by_key(&Scope::beneficiaries("c1"), "b1")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.fields.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_new_password_rules() {
        let (store, mut session) = setup();
        let service = PasswordChangeService::new(store);
        assert!(matches!(
            service.set_new_password(&mut session, "abc", "abc").await,
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            service.set_new_password(&mut session, "abcdef", "abcdeg").await,
            Err(PortalError::Validation(_))
        ));
        // Six Arabic letters are six characters, not twelve bytes
        service
            .set_new_password(&mut session, "كلمةسر", "كلمةسر")
            .await
            .unwrap();
    }
}
