//! tawzi3 portal - beneficiary portal for an aid-distribution program
//!
//! Beneficiaries sign in with their national identifier and a phone number
//! or password, then view their household profile and parcel history, file
//! complaints, show their QR identity and change their password. All data
//! lives in a multi-tenant document store partitioned by camp.
//!
//! ## Modules
//!
//! - **store**: record store trait, in-memory backend, timeout decorator
//! - **db**: MongoDB backend and typed document schemas
//! - **resolver**: beneficiary → distribution → parcel resolution
//! - **auth**: credential digests, credential modes, login
//! - **session**: explicit session context and its local persistence
//! - **services**: profile, complaints, password change, QR payload

pub mod auth;
pub mod config;
pub mod db;
pub mod portal;
pub mod resolver;
pub mod services;
pub mod session;
pub mod store;
pub mod types;

pub use config::Args;
pub use portal::Portal;
pub use types::{PortalError, Result};
