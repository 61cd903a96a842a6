//! Authentication for the portal
//!
//! Provides:
//! - SHA-256 credential digests with constant-structure comparison
//! - Credential mode selection (password or registered phone)
//! - Login by national identifier across camps

pub mod credential;
pub mod login;
pub mod password;

pub use credential::CredentialMode;
pub use login::LoginService;
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
