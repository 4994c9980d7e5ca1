//! Turning server JSON into validated entities
//!
//! Servers (json-server in particular) sometimes send numeric ids as strings.
//! Id fields are coerced to integers first, then the payload is deserialized
//! and run through the entity's `Validate` impl.

use serde_json::Value as Json;

use tabula_api::ApiError;
use tabula_core::{Resource, Result};

/// Leading integer of `s`, ignoring leading whitespace and trailing junk
/// ("12abc" is 12). `None` when `s` does not start with a number.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Coerce string-valued id fields of one JSON object to integers
pub fn normalize_ids(json: &mut Json, id_fields: &[(&str, &str)]) -> Result<()> {
    let Some(obj) = json.as_object_mut() else {
        return Ok(());
    };

    for (field, entity) in id_fields {
        if let Some(Json::String(raw)) = obj.get(*field) {
            let id = parse_leading_int(raw).ok_or_else(|| {
                ApiError::validation(format!(
                    "Invalid {} ID: {} cannot be converted to number",
                    entity, raw
                ))
            })?;
            obj.insert(field.to_string(), Json::from(id));
        }
    }
    Ok(())
}

/// Normalize, deserialize and validate one entity
pub fn parse_one<T: Resource>(mut json: Json) -> Result<T> {
    normalize_ids(&mut json, &T::id_fields())?;

    let entity: T = serde_json::from_value(json).map_err(|e| {
        ApiError::validation(format!("invalid {}: {}", T::short_name(), e))
    })?;
    entity.validate()?;
    Ok(entity)
}

/// Normalize, deserialize and validate a list of entities.
///
/// Accepts a bare array or an object carrying the array under `data`.
pub fn parse_many<T: Resource>(json: Json) -> Result<Vec<T>> {
    let rows = match json {
        Json::Array(rows) => rows,
        Json::Object(mut obj) => match obj.remove("data") {
            Some(Json::Array(rows)) => rows,
            Some(Json::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ApiError::invalid_response(format!(
                    "expected `data` to be an array of {}, got {}",
                    T::entity_name(),
                    other
                )))
            }
        },
        Json::Null => Vec::new(),
        other => {
            return Err(ApiError::invalid_response(format!(
                "expected an array of {}, got {}",
                T::entity_name(),
                other
            )))
        }
    };

    rows.into_iter().map(parse_one::<T>).collect()
}
