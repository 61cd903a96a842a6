//! Distribution resolver
//!
//! Finds the parcels allocated to a signed-in beneficiary:
//!
//! ```text
//! candidates ──► distribution (first candidate with hits wins)
//!                    │
//!                    ▼ per distribution
//!               parcel by key ──miss──► parcel by embedded id ──miss──► dropped
//!                    │
//!                    ▼
//!               visibility filter ──► projection ──► sort by date desc
//! ```
//!
//! Resolution is read-only. An empty result is a success; only record store
//! failures are errors.

mod reference;
mod view;

pub use reference::{CandidateKind, IdentifierCandidate, Reference};
pub use view::{ParcelView, StatusVocabulary, PLACEHOLDER};

use bson::Bson;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::schemas::{DistributionDoc, ParcelDoc, BENEFICIARY_REF_FIELD};
use crate::session::SessionContext;
use crate::store::{Predicate, RecordStore, Scope, StoredRecord};
use crate::types::{PortalError, Result};

/// Embedded identifier attribute of a parcel
const PARCEL_ID_FIELD: &str = "id";

/// Outcome of one resolution, with the bookkeeping behind it
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParcelResolution {
    pub parcels: Vec<ParcelView>,
    /// Candidate whose query produced the distributions
    #[serde(skip)]
    pub matched: Option<IdentifierCandidate>,
    /// Distributions found for the matched candidate
    pub distributions: usize,
    /// Distributions whose parcel could not be found
    pub unresolved: usize,
    /// Pairs removed by the visibility rule
    pub hidden: usize,
    /// Views identical to one already collected
    pub duplicates: usize,
    /// Visible views whose distribution is marked collected
    pub received: usize,
}

/// Resolves a beneficiary's distributions to parcel views
pub struct DistributionResolver {
    store: Arc<dyn RecordStore>,
    vocabulary: StatusVocabulary,
}

impl DistributionResolver {
    pub fn new(store: Arc<dyn RecordStore>, vocabulary: StatusVocabulary) -> Self {
        Self { store, vocabulary }
    }

    /// Parcel views for the session's beneficiary
    pub async fn resolve_for_session(&self, session: &SessionContext) -> Result<Vec<ParcelView>> {
        let candidates = IdentifierCandidate::from_session(session);
        self.resolve_parcels(&session.camp_id, &candidates).await
    }

    /// Parcel views for the first candidate that has distributions in `camp_id`
    pub async fn resolve_parcels(
        &self,
        camp_id: &str,
        candidates: &[IdentifierCandidate],
    ) -> Result<Vec<ParcelView>> {
        Ok(self.resolve(camp_id, candidates).await?.parcels)
    }

    /// Full resolution, including how many records were dropped and why
    pub async fn resolve(
        &self,
        camp_id: &str,
        candidates: &[IdentifierCandidate],
    ) -> Result<ParcelResolution> {
        let Some((matched, distributions)) = self.find_distributions(camp_id, candidates).await? else {
            info!(camp_id, candidates = candidates.len(), "No distributions for any candidate");
            return Ok(ParcelResolution::default());
        };

        let mut resolution = ParcelResolution {
            distributions: distributions.len(),
            matched: Some(matched),
            ..Default::default()
        };

        for record in &distributions {
            let distribution = match DistributionDoc::from_record(record) {
                Ok(d) => d,
                Err(e) => {
                    warn!(camp_id, distribution = %record.key, error = %e, "Skipping undecodable distribution");
                    resolution.unresolved += 1;
                    continue;
                }
            };

            let Some((parcel_key, parcel)) = self.resolve_parcel(camp_id, record, &distribution).await? else {
                resolution.unresolved += 1;
                continue;
            };

            if !self
                .vocabulary
                .is_visible(parcel.status.as_deref(), distribution.status.as_deref())
            {
                debug!(camp_id, parcel = %parcel_key, "Hidden: closed and not received");
                resolution.hidden += 1;
                continue;
            }

            let view = ParcelView::project(&parcel_key, &parcel, &distribution);
            if resolution.parcels.contains(&view) {
                debug!(camp_id, parcel = %parcel_key, distribution = %record.key, "Duplicate view dropped");
                resolution.duplicates += 1;
                continue;
            }
            if self.vocabulary.is_received(distribution.status.as_deref()) {
                resolution.received += 1;
            }
            resolution.parcels.push(view);
        }

        // Stable: equal dates keep distribution order
        resolution
            .parcels
            .sort_by(|a, b| b.parcel_date.cmp(&a.parcel_date));

        info!(
            camp_id,
            distributions = resolution.distributions,
            visible = resolution.parcels.len(),
            hidden = resolution.hidden,
            unresolved = resolution.unresolved,
            duplicates = resolution.duplicates,
            received = resolution.received,
            "Parcels resolved"
        );
        Ok(resolution)
    }

    /// First candidate with a non-empty distribution set, and that set
    async fn find_distributions(
        &self,
        camp_id: &str,
        candidates: &[IdentifierCandidate],
    ) -> Result<Option<(IdentifierCandidate, Vec<StoredRecord>)>> {
        let scope = Scope::distribution(camp_id);

        for candidate in candidates {
            let found = self
                .store
                .find(&scope, &Predicate::eq(BENEFICIARY_REF_FIELD, candidate.value.clone()))
                .await
                .map_err(|e| e.with_candidate(&candidate.value))?;

            debug!(camp_id, candidate = %candidate, hits = found.len(), "Distribution lookup");
            if !found.is_empty() {
                return Ok(Some((candidate.clone(), found)));
            }
        }
        Ok(None)
    }

    /// Parcel for a distribution, or `None` when the reference dangles
    async fn resolve_parcel(
        &self,
        camp_id: &str,
        record: &StoredRecord,
        distribution: &DistributionDoc,
    ) -> Result<Option<(String, ParcelDoc)>> {
        let raw = distribution.parcel_id.clone().unwrap_or(Bson::Null);
        let scope = Scope::parcels(camp_id);

        for reference in Reference::parcel_chain(&raw) {
            let found = match &reference {
                Reference::ByStoreKey(key) => self
                    .store
                    .get_by_key(&scope, key)
                    .await
                    .map_err(|e| e.with_candidate(&reference))?,
                Reference::ByDomainId(value) => self
                    .store
                    .find(&scope, &Predicate::eq(PARCEL_ID_FIELD, value.clone()))
                    .await
                    .map_err(|e| e.with_candidate(&reference))?
                    .into_iter()
                    .next(),
            };

            let Some(found) = found else { continue };
            match ParcelDoc::from_record(&found) {
                Ok(parcel) => {
                    debug!(camp_id, reference = %reference, parcel = %found.key, "Parcel resolved");
                    return Ok(Some((found.key, parcel)));
                }
                Err(e) => {
                    warn!(camp_id, parcel = %found.key, error = %e, "Skipping undecodable parcel");
                }
            }
        }

        let inconsistency = PortalError::DataInconsistency(format!(
            "distribution {} references missing parcel {}",
            record.key, raw
        ));
        warn!(camp_id, error = %inconsistency, "Dropping distribution");
        Ok(None)
    }
}
