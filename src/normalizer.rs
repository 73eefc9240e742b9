//! Provider record normalization.
//!
//! The only place that knows the provider's field names. Everything
//! downstream works with [`PatentRecord`].

use crate::error::MalformedRecordError;
use crate::models::PatentRecord;
use serde_json::{Map, Value};

const TITLE_KEYS: &[&str] = &["title"];
const ABSTRACT_KEYS: &[&str] = &["snippet", "abstract", "summary"];
const DATE_KEYS: &[&str] = &["publication_date", "priority_date", "filing_date"];
const INVENTOR_KEYS: &[&str] = &["inventors", "inventor"];
const ASSIGNEE_KEYS: &[&str] = &["assignees", "assignee"];
const ID_KEYS: &[&str] = &["patent_id", "publication_number"];
const LINK_KEYS: &[&str] = &["patent_link", "link"];
const PDF_KEYS: &[&str] = &["pdf"];

/// Normalize one raw provider record.
///
/// `index` is only used for the error message.
pub fn normalize_record(raw: &Value, index: usize) -> Result<PatentRecord, MalformedRecordError> {
    let obj = raw.as_object().ok_or(MalformedRecordError {
        index,
        found: json_type(raw),
    })?;

    Ok(PatentRecord {
        title: text_field(obj, TITLE_KEYS),
        abstract_text: text_field(obj, ABSTRACT_KEYS),
        publication_date: text_field(obj, DATE_KEYS),
        inventors: name_list(obj, INVENTOR_KEYS),
        assignees: name_list(obj, ASSIGNEE_KEYS),
        patent_id: text_field(obj, ID_KEYS),
        patent_link: text_field(obj, LINK_KEYS),
        pdf_link: text_field(obj, PDF_KEYS),
    })
}

/// Normalize every record, failing on the first malformed one.
pub fn normalize_records(raw: &[Value]) -> Result<Vec<PatentRecord>, MalformedRecordError> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| normalize_record(value, index))
        .collect()
}

/// First non-null value among `keys`.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    match first_present(obj, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// A string, an array of strings, or an array of `{"name": ...}` objects.
fn name_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let names: Vec<&str> = match first_present(obj, keys) {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(o) => o.get("name").and_then(Value::as_str),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    names
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .map(String::from)
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
