//! Session context
//!
//! The signed-in beneficiary, their camp and document key travel as an
//! explicit [`SessionContext`] value. It is built by a successful login,
//! persisted client-side by [`SessionFile`], and dropped on logout.

mod persist;

pub use persist::SessionFile;

use serde::{Deserialize, Serialize};

use crate::db::schemas::{BeneficiaryDoc, CampDoc};

/// Profile cached at login: beneficiary record plus camp display metadata
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SessionProfile {
    pub beneficiary: BeneficiaryDoc,
    #[serde(default)]
    pub camp: CampDoc,
}

/// Signed-in beneficiary
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContext {
    pub profile: SessionProfile,
    pub camp_id: String,
    /// Store document key of the beneficiary
    pub beneficiary_key: String,
}

impl SessionContext {
    pub fn new(
        beneficiary: BeneficiaryDoc,
        camp: CampDoc,
        camp_id: impl Into<String>,
        beneficiary_key: impl Into<String>,
    ) -> Self {
        Self {
            profile: SessionProfile { beneficiary, camp },
            camp_id: camp_id.into(),
            beneficiary_key: beneficiary_key.into(),
        }
    }

    pub fn beneficiary(&self) -> &BeneficiaryDoc {
        &self.profile.beneficiary
    }

    pub fn camp(&self) -> &CampDoc {
        &self.profile.camp
    }
}
