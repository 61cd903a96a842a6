//! Portal state shared by every command
//!
//! Bundles the services over one record store, the way a request handler
//! would hold them.

use std::sync::Arc;

use crate::auth::LoginService;
use crate::resolver::{DistributionResolver, StatusVocabulary};
use crate::services::{ComplaintService, PasswordChangeService, ProfileService};
use crate::store::RecordStore;

pub struct Portal {
    pub login: LoginService,
    pub profile: ProfileService,
    pub parcels: DistributionResolver,
    pub complaints: ComplaintService,
    pub passwords: PasswordChangeService,
}

impl Portal {
    pub fn new(store: Arc<dyn RecordStore>, vocabulary: StatusVocabulary) -> Self {
        Self {
            login: LoginService::new(store.clone()),
            profile: ProfileService::new(store.clone()),
            parcels: DistributionResolver::new(store.clone(), vocabulary),
            complaints: ComplaintService::new(store.clone()),
            passwords: PasswordChangeService::new(store),
        }
    }
}
