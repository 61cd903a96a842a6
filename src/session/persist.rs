//! Client-local session persistence
//!
//! Three scalar values are kept in a JSON file: the serialized profile, the
//! camp id and the beneficiary document key. There is no expiry. All three
//! present means signed in; anything else means signed out.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{SessionContext, SessionProfile};
use crate::types::{PortalError, Result};

#[derive(Serialize, Deserialize, Default)]
struct PersistedSession {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    camp_id: Option<String>,
    #[serde(default)]
    doc_id: Option<String>,
}

/// Session file on local disk
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the session, replacing any previous one
    pub fn save(&self, session: &SessionContext) -> Result<()> {
        let persisted = PersistedSession {
            user: Some(serde_json::to_string(&session.profile)?),
            camp_id: Some(session.camp_id.clone()),
            doc_id: Some(session.beneficiary_key.clone()),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PortalError::Session(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let body = serde_json::to_vec_pretty(&persisted)?;
        std::fs::write(&self.path, body).map_err(|e| {
            PortalError::Session(format!("Failed to write {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Read the session, `None` unless all three values are present and valid
    pub fn load(&self) -> Option<SessionContext> {
        let raw = std::fs::read(&self.path).ok()?;
        let persisted: PersistedSession = match serde_json::from_slice(&raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                return None;
            }
        };

        let (user, camp_id, doc_id) = match persisted {
            PersistedSession {
                user: Some(user),
                camp_id: Some(camp_id),
                doc_id: Some(doc_id),
            } if !camp_id.is_empty() && !doc_id.is_empty() => (user, camp_id, doc_id),
            _ => return None,
        };

        let profile: SessionProfile = match serde_json::from_str(&user) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Ignoring session with unreadable profile");
                return None;
            }
        };

        Some(SessionContext {
            profile,
            camp_id,
            beneficiary_key: doc_id,
        })
    }

    /// Load the session or fail with a session error
    pub fn require(&self) -> Result<SessionContext> {
        self.load()
            .ok_or_else(|| PortalError::Session("not signed in".into()))
    }

    /// Remove the session; a missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortalError::Session(format!(
                "Failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{BeneficiaryDoc, CampDoc};
    use bson::Bson;
    use tempfile::TempDir;

    fn session() -> SessionContext {
        SessionContext::new(
            BeneficiaryDoc {
                id: Some(Bson::Int64(12)),
                head_id_number: Some(Bson::String("400123456".into())),
                head_name: Some("Ahmad".into()),
                main_phone: Some("0599".into()),
                males_0_2: 2,
                ..Default::default()
            },
            CampDoc {
                camp_name: Some("Camp One".into()),
                ..Default::default()
            },
            "c1",
            "b1",
        )
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested/session.json"));

        assert!(file.load().is_none());
        file.save(&session()).unwrap();

        let loaded = file.load().expect("session present");
        assert_eq!(loaded.camp_id, "c1");
        assert_eq!(loaded.beneficiary_key, "b1");
        assert_eq!(loaded.beneficiary().head_name.as_deref(), Some("Ahmad"));
        assert_eq!(loaded.beneficiary().head_id_text().as_deref(), Some("400123456"));
        assert_eq!(loaded.beneficiary().males_0_2, 2);
        assert_eq!(loaded.camp().camp_name.as_deref(), Some("Camp One"));

        file.clear().unwrap();
        assert!(file.load().is_none());
        file.clear().unwrap();
    }

    #[test]
    fn test_partial_session_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"user":"{}","camp_id":"c1"}"#).unwrap();
        let file = SessionFile::new(&path);
        assert!(file.load().is_none());
        assert!(matches!(file.require(), Err(PortalError::Session(_))));
    }

    #[test]
    fn test_garbage_session_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(SessionFile::new(&path).load().is_none());
    }
}
