//! Canonical form of the JSON transactions (sign docs) signed by the device app.
//!
//! The app refuses to sign a transaction unless it is compact JSON with every
//! dictionary sorted by key and all the mandatory fields present. Checking a
//! fixture here gives a precise error instead of a generic device status.

use serde_json::{Map, Value};

/// Reasons a sign doc is not in canonical form
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug)]
pub enum SignDocError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The sign doc is not a JSON object")]
    NotAnObject,

    #[error("JSON contains whitespace in the corpus")]
    ContainsWhitespace,

    #[error("JSON Dictionaries are not sorted")]
    NotSorted,

    #[error("JSON missing account_number")]
    MissingAccountNumber,

    #[error("JSON missing chain_id")]
    MissingChainId,

    #[error("JSON missing fee")]
    MissingFee,

    #[error("JSON missing msgs")]
    MissingMsgs,

    #[error("JSON missing sequence")]
    MissingSequence,
}

/// Check `tx` is a sign doc the device app accepts
pub fn validate(tx: &[u8]) -> Result<(), SignDocError> {
    let value: Value = serde_json::from_slice(tx)?;
    let object = value.as_object().ok_or(SignDocError::NotAnObject)?;

    if contains_whitespace(tx) {
        return Err(SignDocError::ContainsWhitespace);
    }
    if !is_sorted(&value) {
        return Err(SignDocError::NotSorted);
    }

    for (field, missing) in [
        ("account_number", SignDocError::MissingAccountNumber),
        ("chain_id", SignDocError::MissingChainId),
        ("fee", SignDocError::MissingFee),
        ("msgs", SignDocError::MissingMsgs),
        ("sequence", SignDocError::MissingSequence),
    ] {
        if !object.contains_key(field) {
            return Err(missing);
        }
    }
    Ok(())
}

/// Compact serialization of `tx` with every dictionary sorted by key
pub fn canonicalize(tx: &[u8]) -> Result<Vec<u8>, SignDocError> {
    let value: Value = serde_json::from_slice(tx)?;
    Ok(sorted(&value).to_string().into_bytes())
}

/// Whitespace outside string literals
fn contains_whitespace(json: &[u8]) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    for &b in json {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b' ' | b'\t' | b'\n' | b'\r' => return true,
                _ => {}
            }
        }
    }
    false
}

fn is_sorted(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            keys.windows(2).all(|w| w[0] <= w[1]) && map.values().all(is_sorted)
        }
        Value::Array(items) => items.iter().all(is_sorted),
        _ => true,
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let map: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), sorted(v)))
                .collect();
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
