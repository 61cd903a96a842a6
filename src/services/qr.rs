//! QR identity payload
//!
//! The QR code encodes the national identifier so distribution staff can
//! scan it at the point of collection. When the record has no national
//! identifier the document key is encoded instead. Rendering the image is
//! left to the caller.

use serde::Serialize;

use crate::session::SessionContext;
use crate::store::value_to_text;

/// Data behind a beneficiary's QR code
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct QrPayload {
    /// Text to encode
    pub text: String,
    /// Name shown under the code
    pub display_name: Option<String>,
}

/// Compact form with short keys, for scanners that read structured data
#[derive(Serialize)]
struct CompactPayload<'a> {
    id: String,
    name: Option<&'a str>,
    camp: &'a str,
}

impl QrPayload {
    pub fn for_session(session: &SessionContext) -> Self {
        let beneficiary = session.beneficiary();
        Self {
            text: beneficiary
                .head_id_text()
                .unwrap_or_else(|| session.beneficiary_key.clone()),
            display_name: beneficiary.head_name.clone(),
        }
    }

    /// `{"id", "name", "camp"}` JSON for the session's beneficiary
    pub fn compact_json(session: &SessionContext) -> String {
        let beneficiary = session.beneficiary();
        let id = beneficiary
            .id
            .as_ref()
            .and_then(value_to_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| session.beneficiary_key.clone());
        let compact = CompactPayload {
            id,
            name: beneficiary.head_name.as_deref(),
            camp: &session.camp_id,
        };
        // Only strings and options; serialization cannot fail
        serde_json::to_string(&compact).unwrap_or_default()
    }
}
