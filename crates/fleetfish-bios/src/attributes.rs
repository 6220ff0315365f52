//! Attribute input parsing and selection

use std::path::Path;

use fleetfish_core::{AttributeSet, HostError, HostResult};
use serde_json::Value;

use crate::decoder::{decode_key, DecodeMode, Decoder};
use crate::error::{BiosError, BiosResult};

/// Parse `key=value` arguments into an attribute set.
///
/// Values are typed as YAML scalars: `1` is a number, `true` a boolean,
/// anything else stays a string.
pub fn parse_assignments<I, S>(args: I) -> BiosResult<AttributeSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut attributes = AttributeSet::new();
    for arg in args {
        let arg = arg.as_ref();
        let (key, raw) = arg
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| BiosError::InvalidAssignment(arg.to_string()))?;
        attributes.insert(key.trim().to_string(), scalar(raw.trim()));
    }
    Ok(attributes)
}

fn scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}

/// Load a YAML mapping of attribute names to values
pub fn load_attribute_file(path: impl AsRef<Path>) -> BiosResult<AttributeSet> {
    let content = std::fs::read_to_string(path)?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(AttributeSet::new()),
        _ => Err(BiosError::NotAMapping),
    }
}

/// Pick the requested keys out of a host's live attributes.
///
/// Requested keys are raw attribute names; output keys are decoded. An
/// empty request selects everything. Keys the host does not have map to
/// `null`, but at least one must exist.
pub fn select_attributes(
    live: &AttributeSet,
    requested: &[String],
    decoder: Option<&Decoder>,
    mode: DecodeMode,
) -> HostResult<AttributeSet> {
    if live.is_empty() {
        return Err(HostError::Unsupported(
            "no BIOS attributes reported; the node may be off, or in a broken state".to_string(),
        ));
    }

    if requested.is_empty() {
        return Ok(live
            .iter()
            .map(|(k, v)| (decode_key(decoder, k, mode), v.clone()))
            .collect());
    }

    if !requested.iter().any(|key| live.contains_key(key)) {
        return Err(HostError::NoMatchingAttributes(requested.to_vec()));
    }

    Ok(requested
        .iter()
        .map(|key| {
            let value = live.get(key).cloned().unwrap_or(Value::Null);
            (decode_key(decoder, key, mode), value)
        })
        .collect())
}

/// Drop requested writes for keys the host does not have
pub fn retain_known(requested: &AttributeSet, live: &AttributeSet) -> HostResult<AttributeSet> {
    let known: AttributeSet = requested
        .iter()
        .filter(|(key, _)| live.contains_key(*key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if known.is_empty() {
        return Err(HostError::NoMatchingAttributes(requested.keys().cloned().collect()));
    }

    let skipped = requested.len() - known.len();
    if skipped > 0 {
        tracing::warn!(skipped, "ignoring attributes the host does not report");
    }
    Ok(known)
}
