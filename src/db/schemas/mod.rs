//! Typed views of portal documents
//!
//! Documents are written by an administrative backend with an inconsistent
//! schema: the same attribute can be a string in one record and a number in
//! another. Text and count fields are therefore decoded leniently, and the
//! reference attributes are kept as raw values.

mod beneficiary;
mod camp;
mod complaint;
mod distribution;
mod lenient;
mod parcel;

pub use beneficiary::{BeneficiaryDoc, Demographics};
pub use camp::CampDoc;
pub use complaint::{ComplaintDoc, COMPLAINT_STATUS_PENDING, CREATED_AT_FIELD};
pub use distribution::{DistributionDoc, BENEFICIARY_REF_FIELD};
pub use parcel::ParcelDoc;
