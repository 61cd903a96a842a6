//! Identifier candidates and record references
//!
//! Distribution records reference beneficiaries and parcels ambiguously: by
//! store key or by an embedded domain value, as text or as a number. The
//! ambiguity is a known inconsistency in the upstream data; until it is
//! migrated away, lookups try each interpretation in a fixed order.

use bson::Bson;
use std::fmt;

use crate::session::SessionContext;
use crate::store::{numeric_coercion, value_to_text, values_equal};

/// Where a candidate identifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Embedded `id` attribute of the beneficiary record
    EmbeddedId,
    /// Store document key
    DocumentKey,
    /// National identifier (`head_id_number`)
    DomainId,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKind::EmbeddedId => f.write_str("embedded_id"),
            CandidateKind::DocumentKey => f.write_str("document_key"),
            CandidateKind::DomainId => f.write_str("domain_id"),
        }
    }
}

/// One value to try against a distribution's beneficiary reference
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierCandidate {
    pub value: Bson,
    pub kind: CandidateKind,
}

impl IdentifierCandidate {
    pub fn new(value: impl Into<Bson>, kind: CandidateKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Candidates for a signed-in beneficiary, in fallback priority order
    ///
    /// 1. embedded id as stored, 2. its numeric coercion, 3. document key,
    /// 4. national identifier, 5. numeric document key, 6. numeric national
    /// identifier. Empty values, failed coercions and values equal to an
    /// earlier candidate under store equality are skipped.
    pub fn from_session(session: &SessionContext) -> Vec<IdentifierCandidate> {
        let beneficiary = session.beneficiary();
        let key = Bson::String(session.beneficiary_key.clone());
        let embedded = beneficiary.id.clone().filter(is_present);
        let domain = beneficiary.head_id_number.clone().filter(is_present);

        let ordered = [
            (embedded.clone(), CandidateKind::EmbeddedId),
            (embedded.as_ref().and_then(numeric_coercion), CandidateKind::EmbeddedId),
            (Some(key.clone()).filter(is_present), CandidateKind::DocumentKey),
            (domain.clone(), CandidateKind::DomainId),
            (numeric_coercion(&key), CandidateKind::DocumentKey),
            (domain.as_ref().and_then(numeric_coercion), CandidateKind::DomainId),
        ];

        let mut candidates: Vec<IdentifierCandidate> = Vec::new();
        for (value, kind) in ordered {
            let Some(value) = value else { continue };
            if candidates.iter().any(|c| values_equal(&c.value, &value)) {
                continue;
            }
            candidates.push(IdentifierCandidate { value, kind });
        }
        candidates
    }
}

impl fmt::Display for IdentifierCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

/// How a record is addressed
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// By store document key
    ByStoreKey(String),
    /// By the value of the record's embedded `id` attribute
    ByDomainId(Bson),
}

impl Reference {
    /// Lookup chain for a parcel reference taken from a distribution
    ///
    /// Store key first, then embedded id by the raw value, then by the
    /// alternate representation (number for text, text for a number).
    pub fn parcel_chain(raw: &Bson) -> Vec<Reference> {
        let mut chain = Vec::with_capacity(3);
        if !is_present(raw) {
            return chain;
        }

        if let Some(key) = value_to_text(raw).filter(|k| !k.is_empty()) {
            chain.push(Reference::ByStoreKey(key));
        }
        chain.push(Reference::ByDomainId(raw.clone()));

        let alternate = match raw {
            Bson::String(_) => numeric_coercion(raw),
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => value_to_text(raw).map(Bson::String),
            _ => None,
        };
        if let Some(alternate) = alternate.filter(|a| a != raw) {
            chain.push(Reference::ByDomainId(alternate));
        }
        chain
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::ByStoreKey(key) => write!(f, "key:{key}"),
            Reference::ByDomainId(value) => write!(f, "id:{value}"),
        }
    }
}

fn is_present(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => false,
        Bson::String(s) => !s.trim().is_empty(),
        Bson::Int32(0) | Bson::Int64(0) => false,
        Bson::Double(n) => *n != 0.0 && !n.is_nan(),
        _ => true,
    }
}
