//! Credential mode of a beneficiary
//!
//! A beneficiary has exactly one active mode: password when `password_hash`
//! is set, registered phone otherwise. Setting a password therefore retires
//! the phone as a login secret.

use crate::auth::password::{constant_time_eq, verify_password};
use crate::db::schemas::BeneficiaryDoc;
use crate::types::{CredentialKind, PortalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode<'a> {
    Password { hash: &'a str },
    Phone { phone: Option<&'a str> },
}

impl<'a> CredentialMode<'a> {
    pub fn of(beneficiary: &'a BeneficiaryDoc) -> Self {
        match beneficiary.password_hash.as_deref() {
            Some(hash) => CredentialMode::Password { hash },
            None => CredentialMode::Phone {
                phone: beneficiary.main_phone.as_deref(),
            },
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialMode::Password { .. } => CredentialKind::Password,
            CredentialMode::Phone { .. } => CredentialKind::Phone,
        }
    }

    /// Check a supplied secret against this mode
    pub fn verify(&self, supplied: &str) -> Result<()> {
        let ok = match self {
            CredentialMode::Password { hash } => verify_password(supplied, hash),
            CredentialMode::Phone { phone: Some(phone) } => {
                constant_time_eq(supplied.as_bytes(), phone.trim().as_bytes())
            }
            CredentialMode::Phone { phone: None } => false,
        };

        if ok {
            Ok(())
        } else {
            Err(PortalError::InvalidCredential(self.kind()))
        }
    }
}
