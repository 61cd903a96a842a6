//! Parcel view records and the visibility rule

use serde::Serialize;

use crate::db::schemas::{DistributionDoc, ParcelDoc};

/// Substituted for any missing field in a view record
pub const PLACEHOLDER: &str = "---";

/// Status literals used by the deployed data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusVocabulary {
    /// Parcel lifecycle status meaning the parcel round has ended
    pub parcel_closed: String,
    /// Distribution status meaning the beneficiary did not collect
    pub not_received: String,
    /// Distribution status meaning the beneficiary collected
    pub received: String,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self {
            parcel_closed: "انتهى".to_string(),
            not_received: "لم يستلم".to_string(),
            received: "استلم".to_string(),
        }
    }
}

impl StatusVocabulary {
    /// A pair is hidden only when the parcel is closed and was not received
    pub fn is_visible(&self, parcel_status: Option<&str>, distribution_status: Option<&str>) -> bool {
        let closed = parcel_status.map(str::trim) == Some(self.parcel_closed.as_str());
        let not_received = distribution_status.map(str::trim) == Some(self.not_received.as_str());
        !(closed && not_received)
    }

    /// Whether a distribution status records a collected parcel
    pub fn is_received(&self, distribution_status: Option<&str>) -> bool {
        distribution_status.map(str::trim) == Some(self.received.as_str())
    }
}

/// Flattened parcel + distribution record shown to the beneficiary
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ParcelView {
    pub parcel_id: String,
    pub parcel_name: String,
    /// Empty when the parcel has no description
    pub parcel_description: String,
    pub parcel_type: String,
    pub parcel_status: String,
    pub parcel_date: String,
    pub distribution_status: String,
    pub distribution_date: String,
}

impl ParcelView {
    pub fn project(parcel_key: &str, parcel: &ParcelDoc, distribution: &DistributionDoc) -> Self {
        let or_placeholder = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
        Self {
            parcel_id: parcel_key.to_string(),
            parcel_name: or_placeholder(&parcel.name),
            parcel_description: parcel.description.clone().unwrap_or_default(),
            parcel_type: or_placeholder(&parcel.type_parcel),
            parcel_status: or_placeholder(&parcel.status),
            parcel_date: or_placeholder(&parcel.date),
            distribution_status: or_placeholder(&distribution.status),
            distribution_date: or_placeholder(&distribution.distribution_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_matrix() {
        let vocab = StatusVocabulary::default();
        let open = Some("متاح");
        let closed = Some("انتهى");
        let received = Some("استلم");
        let not_received = Some("لم يستلم");

        assert!(vocab.is_visible(open, received));
        assert!(vocab.is_visible(open, not_received));
        assert!(vocab.is_visible(closed, received));
        assert!(!vocab.is_visible(closed, not_received));
        assert!(vocab.is_received(Some(" استلم ")));
        assert!(!vocab.is_received(not_received));
        assert!(!vocab.is_received(None));
    }

    #[test]
    fn test_missing_statuses_are_visible() {
        let vocab = StatusVocabulary::default();
        assert!(vocab.is_visible(None, None));
        assert!(vocab.is_visible(Some("انتهى"), None));
    }

    #[test]
    fn test_projection_placeholders() {
        let view = ParcelView::project("p1", &ParcelDoc::default(), &DistributionDoc::default());
        assert_eq!(view.parcel_id, "p1");
        assert_eq!(view.parcel_name, PLACEHOLDER);
        assert_eq!(view.parcel_description, "");
        assert_eq!(view.parcel_type, PLACEHOLDER);
        assert_eq!(view.parcel_date, PLACEHOLDER);
        assert_eq!(view.distribution_status, PLACEHOLDER);
        assert_eq!(view.distribution_date, PLACEHOLDER);
    }
}
