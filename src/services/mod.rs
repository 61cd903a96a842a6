//! Portal services over the record store
//!
//! Each service takes the explicit [`crate::session::SessionContext`] of the
//! signed-in beneficiary.

pub mod complaints;
pub mod password_change;
pub mod profile;
pub mod qr;

pub use complaints::ComplaintService;
pub use password_change::PasswordChangeService;
pub use profile::{BeneficiaryProfile, ProfileService};
pub use qr::QrPayload;
