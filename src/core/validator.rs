//! Required-field schema enforcement for incoming records.
//!
//! Checks are by key presence only. A field holding `0`, `""` or `null` is
//! present; a missing key is not.

use crate::core::message::{MessageKind, Record, FIELD_TYPE};
use crate::error::constants::ERR_MISSING_TYPE;
use crate::error::{ProtocolError, Result};
use serde_json::Value;

/// Gate a record on the schema of its `type`, returning it unchanged.
pub fn validate(record: Record) -> Result<Record> {
    check(&record)?;
    Ok(record)
}

/// Resolve the record's kind and verify every field that kind requires.
///
/// # Errors
/// - `UnknownType` if `type` is absent, not a string, or not a known kind
/// - `MissingField` naming the first absent required field
pub fn check(record: &Record) -> Result<MessageKind> {
    let kind = match record.get(FIELD_TYPE) {
        Some(Value::String(name)) => name.parse::<MessageKind>()?,
        Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
        None => return Err(ProtocolError::UnknownType(ERR_MISSING_TYPE.to_string())),
    };

    if let Some(missing) = kind
        .required_fields()
        .iter()
        .find(|field| !record.contains_key(**field))
    {
        return Err(ProtocolError::MissingField(*missing));
    }

    Ok(kind)
}
