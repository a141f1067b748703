//! Text form of the backing file: a JSON object mapping student id to record.

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{DocumentError, SchemaError};
use crate::record::Record;

/// Records keyed by id, in insertion order.
pub type Records = IndexMap<String, Record>;

/// Parse a student document.
pub fn parse(text: &str) -> Result<Records, DocumentError> {
    let data: Value = serde_json::from_str(text)?;
    Ok(from_value(&data)?)
}

/// Decode an already-parsed document. Member order is preserved.
pub fn from_value(data: &Value) -> Result<Records, SchemaError> {
    let obj = data.as_object().ok_or(SchemaError::NotAnObject)?;

    let mut records = Records::with_capacity(obj.len());
    for (key, value) in obj {
        let record = Record::from_value(value).map_err(|e| e.in_record(key))?;
        if record.id != *key {
            return Err(SchemaError::IdMismatch {
                key: key.clone(),
                id: record.id,
            });
        }
        records.insert(key.clone(), record);
    }
    Ok(records)
}

/// Render records as pretty-printed JSON (two-space indent, trailing newline).
///
/// Each member is written through the same serializer as [`Record::to_value`],
/// so a non-finite grade fails here instead of being written as `null`.
pub fn render(records: &Records) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(records)?;
    text.push('\n');
    Ok(text)
}
