//! Record-level types exchanged between data sources and the list engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{ApiError, Value};

/// One item of a managed collection: field name to value.
pub type Record = HashMap<String, Value>;

/// Parameters handed to a fetch collaborator (usually sent as a query string).
pub type FetchParams = HashMap<String, Value>;

/// Field every record must carry.
pub const ID_FIELD: &str = "id";

/// Stable identifier of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(RecordId::Int(*i)),
            Value::Float(f) if f.fract() == 0.0 => Some(RecordId::Int(*f as i64)),
            Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    /// Identifier of `record`, if it has a usable `id` field.
    pub fn of(record: &Record) -> Option<Self> {
        record.get(ID_FIELD).and_then(RecordId::from_value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordId::Int(i) => Some(*i),
            RecordId::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        RecordId::Int(i)
    }
}

impl From<i32> for RecordId {
    fn from(i: i32) -> Self {
        RecordId::Int(i as i64)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Int(i) => Value::Integer(i),
            RecordId::Text(s) => Value::String(s),
        }
    }
}

/// Page metadata some servers attach next to `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Result of one fetch: the records plus whatever page metadata came along.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    pub records: Vec<Record>,
    pub pagination: Option<Pagination>,
}

impl FetchResponse {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            pagination: None,
        }
    }

    /// Accept either a bare JSON array of objects or an envelope object with a
    /// `data` array. A missing or null `data` is an empty result.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ApiError> {
        match value {
            serde_json::Value::Array(rows) => Ok(Self::from_records(Self::rows_to_records(rows)?)),
            serde_json::Value::Object(mut envelope) => {
                let pagination = match envelope.remove("pagination") {
                    Some(serde_json::Value::Null) | None => None,
                    Some(meta) => Some(serde_json::from_value(meta).map_err(|e| {
                        ApiError::invalid_response(format!("malformed pagination: {}", e))
                    })?),
                };
                let records = match envelope.remove("data") {
                    Some(serde_json::Value::Array(rows)) => Self::rows_to_records(rows)?,
                    Some(serde_json::Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(ApiError::invalid_response(format!(
                            "expected `data` to be an array, got {}",
                            json_kind(&other)
                        )))
                    }
                };
                Ok(Self {
                    records,
                    pagination,
                })
            }
            other => Err(ApiError::invalid_response(format!(
                "expected an array or an object with `data`, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn rows_to_records(rows: Vec<serde_json::Value>) -> Result<Vec<Record>, ApiError> {
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| match Value::from_json_value(row) {
                Value::Object(fields) => Ok(fields),
                other => Err(ApiError::invalid_response(format!(
                    "row {} is not an object: {}",
                    i,
                    other.to_json_string()
                ))),
            })
            .collect()
    }
}

impl From<Vec<Record>> for FetchResponse {
    fn from(records: Vec<Record>) -> Self {
        Self::from_records(records)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_response() {
        let resp = FetchResponse::from_json(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(resp.records.len(), 2);
        assert_eq!(RecordId::of(&resp.records[1]), Some(RecordId::Int(2)));
        assert!(resp.pagination.is_none());
    }

    #[test]
    fn test_envelope_response_with_pagination() {
        let resp = FetchResponse::from_json(json!({
            "data": [{"id": 7, "name": "A"}],
            "pagination": {"page": 1, "limit": 10, "total": 1, "totalPages": 1}
        }))
        .unwrap();
        assert_eq!(resp.records.len(), 1);
        assert_eq!(resp.pagination.unwrap().total_pages, 1);
    }

    #[test]
    fn test_envelope_without_data_is_empty() {
        let resp = FetchResponse::from_json(json!({"success": true})).unwrap();
        assert!(resp.records.is_empty());
    }

    #[test]
    fn test_unexpected_shapes_are_rejected() {
        let err = FetchResponse::from_json(json!("nope")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));

        let err = FetchResponse::from_json(json!([1, 2])).unwrap_err();
        assert!(err.message().contains("row 0"));

        let err = FetchResponse::from_json(json!({"data": 3})).unwrap_err();
        assert!(err.message().contains("`data`"));
    }

    #[test]
    fn test_record_id_from_value() {
        assert_eq!(
            RecordId::from_value(&Value::Float(3.0)),
            Some(RecordId::Int(3))
        );
        assert_eq!(
            RecordId::from_value(&Value::from("abc")),
            Some(RecordId::Text("abc".into()))
        );
        assert_eq!(RecordId::from_value(&Value::Boolean(true)), None);
    }
}
