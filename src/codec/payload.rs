//! Payload parsing for data trailing a tag
//!
//! The detector is schema-less: callers name the keys they care about and only
//! those are extracted. Two payload forms are understood:
//! - a JSON object (`{"k":"v"}`), projected onto the wanted keys
//! - flat text (`name:alice,age:30`), searched key by key

use crate::errors::PayloadParseError;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Key → value pairs extracted from a payload
pub type PayloadFields = BTreeMap<String, String>;

/// Separators skipped directly after a key in the flat form
const FLAT_KEY_SEPARATORS: [char; 2] = [':', '='];

/// Parse a payload, recovering JSON failures as an empty map
///
/// JSON parse failures are logged at warn level and never propagated; use
/// [`try_parse_payload`] when the caller needs the error itself.
pub fn parse_payload<S: AsRef<str>>(payload: &str, wanted_keys: &[S]) -> PayloadFields {
    match try_parse_payload(payload, wanted_keys) {
        Ok(fields) => fields,
        Err(e) => {
            warn!("Error parsing tagged data as JSON: {}", e);
            PayloadFields::new()
        }
    }
}

/// Parse a payload, surfacing JSON failures
pub fn try_parse_payload<S: AsRef<str>>(
    payload: &str,
    wanted_keys: &[S],
) -> Result<PayloadFields, PayloadParseError> {
    if looks_like_json_object(payload) {
        parse_json(payload, wanted_keys)
    } else {
        Ok(parse_flat(payload, wanted_keys))
    }
}

fn looks_like_json_object(payload: &str) -> bool {
    let trimmed = payload.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

fn parse_json<S: AsRef<str>>(
    payload: &str,
    wanted_keys: &[S],
) -> Result<PayloadFields, PayloadParseError> {
    let value: Value = serde_json::from_str(payload.trim())?;
    let mut fields = PayloadFields::new();

    if let Value::Object(object) = value {
        for key in wanted_keys {
            let key = key.as_ref();
            if let Some(value) = object.get(key) {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                fields.insert(key.to_string(), rendered);
            }
        }
    }

    Ok(fields)
}

/// First literal occurrence of each key; value runs to the next comma
///
/// A key that is a substring of another key or of a value matches wherever it
/// first appears.
fn parse_flat<S: AsRef<str>>(payload: &str, wanted_keys: &[S]) -> PayloadFields {
    let mut fields = PayloadFields::new();

    for key in wanted_keys {
        let key = key.as_ref();
        if key.is_empty() {
            continue;
        }
        if let Some(index) = payload.find(key) {
            let mut rest = &payload[index + key.len()..];
            if let Some(stripped) = rest.strip_prefix(&FLAT_KEY_SEPARATORS[..]) {
                rest = stripped;
            }
            let value = match rest.find(',') {
                Some(end) => &rest[..end],
                None => rest,
            };
            fields.insert(key.to_string(), value.to_string());
        }
    }

    fields
}
