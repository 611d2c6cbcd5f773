//! Defensive decoding of the JSON text columns of a maqam row
//!
//! Every function here is total. Anything that is not the expected shape is
//! treated as "no data": an empty list, an empty jins, or `None`.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use super::{Bilingual, Jins, JinsNotes};

/// Parse a stored JSON column, logging and discarding malformed text
///
/// Absent and empty columns are `None` without a warning.
pub fn parse_column(raw: Option<&str>, column: &str, maqam_id: i64) -> Option<Value> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("maqam {}: ignoring malformed {}: {}", maqam_id, column, e);
            None
        }
    }
}

/// List of strings; non-string items are skipped
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// List of integer ids; anything else is skipped
pub fn id_list(value: Option<&Value>) -> Vec<i64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    }
}

/// Mood → weight map
///
/// Only a JSON object yields `Some`; non-numeric weights are dropped.
pub fn emotion_weights(value: Option<&Value>) -> Option<BTreeMap<String, f64>> {
    match value {
        Some(Value::Object(map)) => Some(
            map.iter()
                .filter_map(|(mood, weight)| weight.as_f64().map(|w| (mood.clone(), w)))
                .collect(),
        ),
        _ => None,
    }
}

/// Ordered ajnas
///
/// A malformed element still occupies its position (as an empty jins) so a
/// broken first jins never promotes the second one to identifying pattern.
pub fn ajnas(value: Option<&Value>) -> Vec<Jins> {
    match value {
        Some(Value::Array(items)) => items.iter().map(jins).collect(),
        _ => Vec::new(),
    }
}

fn jins(value: &Value) -> Jins {
    let Value::Object(obj) = value else {
        return Jins::default();
    };

    let name = match obj.get("name") {
        Some(Value::String(s)) => Bilingual::new(Some(s.clone()), None),
        Some(Value::Object(by_lang)) => Bilingual::new(
            by_lang.get("en").and_then(Value::as_str).map(str::to_string),
            by_lang.get("ar").and_then(Value::as_str).map(str::to_string),
        ),
        _ => Bilingual::default(),
    };

    let notes = match obj.get("notes") {
        Some(Value::Object(by_lang)) => JinsNotes::ByLanguage(
            by_lang
                .iter()
                .filter(|(_, notes)| notes.is_array())
                .map(|(lang, notes)| (lang.clone(), string_list(Some(notes))))
                .collect(),
        ),
        Some(list @ Value::Array(_)) => JinsNotes::Flat(string_list(Some(list))),
        _ => JinsNotes::default(),
    };

    Jins { name, notes }
}
