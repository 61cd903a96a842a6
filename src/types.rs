//! Common error and result types for the portal

use std::fmt;
use thiserror::Error;

/// Record store operation, carried in store errors for context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Connect,
    Find,
    FindAcrossCamps,
    GetByKey,
    Create,
    Update,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Connect => "connect",
            StoreOp::Find => "find",
            StoreOp::FindAcrossCamps => "find_across_camps",
            StoreOp::GetByKey => "get_by_key",
            StoreOp::Create => "create",
            StoreOp::Update => "update",
        };
        f.write_str(name)
    }
}

/// Portal error types
#[derive(Error, Debug)]
pub enum PortalError {
    /// Identifier or record not in the system
    #[error("Not found: {0}")]
    NotFound(String),

    /// Supplied secret does not match the stored credential
    #[error("Invalid credential: {0}")]
    InvalidCredential(CredentialKind),

    /// Connectivity or operation failure in the record store
    #[error("Record store {op} failed on {scope}{}: {message}", candidate_suffix(.candidate))]
    RecordStore {
        op: StoreOp,
        scope: String,
        candidate: Option<String>,
        message: String,
        timed_out: bool,
    },

    /// A record references something that does not exist
    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),

    /// User input rejected before touching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted session missing or unusable
    #[error("Session error: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Which credential check rejected the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    Phone,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Password => f.write_str("password mismatch"),
            CredentialKind::Phone => f.write_str("phone mismatch"),
        }
    }
}

fn candidate_suffix(candidate: &Option<String>) -> String {
    match candidate {
        Some(value) => format!(" (candidate {value})"),
        None => String::new(),
    }
}

impl PortalError {
    /// Build a store error for an operation on a scope
    pub fn store(op: StoreOp, scope: impl fmt::Display, message: impl fmt::Display) -> Self {
        PortalError::RecordStore {
            op,
            scope: scope.to_string(),
            candidate: None,
            message: message.to_string(),
            timed_out: false,
        }
    }

    /// Build a store error for an operation that exceeded its deadline
    pub fn store_timeout(op: StoreOp, scope: impl fmt::Display, timeout_ms: u64) -> Self {
        PortalError::RecordStore {
            op,
            scope: scope.to_string(),
            candidate: None,
            message: format!("timed out after {timeout_ms}ms"),
            timed_out: true,
        }
    }

    /// Attach the identifier candidate being tried when a store error occurred
    pub fn with_candidate(self, value: impl fmt::Display) -> Self {
        match self {
            PortalError::RecordStore {
                op,
                scope,
                message,
                timed_out,
                ..
            } => PortalError::RecordStore {
                op,
                scope,
                candidate: Some(value.to_string()),
                message,
                timed_out,
            },
            other => other,
        }
    }

    /// Whether this error came from the record store
    pub fn is_store_failure(&self) -> bool {
        matches!(self, PortalError::RecordStore { .. })
    }

    /// Localized message shown to the beneficiary
    pub fn user_message(&self) -> &'static str {
        match self {
            PortalError::NotFound(_) => "رقم الهوية غير موجود في النظام",
            PortalError::InvalidCredential(CredentialKind::Password) => "كلمة المرور غير صحيحة",
            PortalError::InvalidCredential(CredentialKind::Phone) => "رقم الهاتف غير صحيح",
            PortalError::Validation(_) => "الرجاء إدخال جميع البيانات",
            PortalError::Session(_) => "الرجاء تسجيل الدخول",
            PortalError::RecordStore { .. }
            | PortalError::DataInconsistency(_)
            | PortalError::Serialization(_)
            | PortalError::Config(_) => "حدث خطأ، الرجاء المحاولة مرة أخرى",
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for PortalError {
    fn from(err: bson::de::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

impl From<bson::ser::Error> for PortalError {
    fn from(err: bson::ser::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

/// Result type for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_includes_candidate() {
        let err = PortalError::store(StoreOp::Find, "camps/c1/distribution", "connection reset")
            .with_candidate("\"42\"");
        let text = err.to_string();
        assert!(text.contains("find"));
        assert!(text.contains("camps/c1/distribution"));
        assert!(text.contains("candidate \"42\""));
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_with_candidate_leaves_other_errors() {
        let err = PortalError::NotFound("x".into()).with_candidate("1");
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[test]
    fn test_timeout_shares_store_kind() {
        let err = PortalError::store_timeout(StoreOp::GetByKey, "camps", 50);
        match err {
            PortalError::RecordStore { timed_out, .. } => assert!(timed_out),
            other => panic!("unexpected {other:?}"),
        }
    }
}
