//! Lenient field decoders
//!
//! `text` accepts strings, numbers and timestamps and renders them as text;
//! empty strings decode as absent. `count` accepts numbers and numeric
//! strings; anything else decodes as zero.

use bson::Bson;
use serde::{Deserialize, Deserializer};

use crate::store::value_to_text;

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Bson>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_text)
        .filter(|s| !s.is_empty()))
}

pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Bson>::deserialize(deserializer)?;
    Ok(value.as_ref().map(to_count).unwrap_or(0))
}

pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Bson>::deserialize(deserializer)?;
    Ok(value.as_ref().map(to_count).filter(|n| *n > 0))
}

fn to_count(value: &Bson) -> u32 {
    let n = match value {
        Bson::Int32(n) => f64::from(*n),
        Bson::Int64(n) => *n as f64,
        Bson::Double(n) => *n,
        Bson::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n as u32
    } else {
        0
    }
}
