//! Field-level validation results
//!
//! Validation produces a list of `FieldError`s in the order the checks ran.
//! Forms only show one message per field, so `field_map` keeps the first one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use tabula_api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path to the offending value, e.g. `["tags", "0"]`
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            path: vec![field.to_string()],
            message: message.into(),
        }
    }

    /// Top-level field the error belongs to
    pub fn field(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.join("."), self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Record `message` against `field` unless `ok`
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Field name to message, first error per top-level field wins
    pub fn field_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for err in &self.errors {
            map.entry(err.field().to_string())
                .or_insert_with(|| err.message.clone());
        }
        map
    }

    /// `"path: message, path: message"`
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(FieldError::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors.summary())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_map_keeps_first_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "name must not be empty");
        errors.add("age", "age must be at least 1");
        errors.add("name", "second name message");

        let map = errors.field_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["name"], "name must not be empty");
    }

    #[test]
    fn test_summary_joins_paths() {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError {
            path: vec!["tags".into(), "0".into()],
            message: "must not be empty".into(),
        });
        errors.add("title", "title must not be empty");

        assert_eq!(
            errors.summary(),
            "tags.0: must not be empty, title: title must not be empty"
        );
        assert_eq!(errors.errors()[0].field(), "tags");
    }

    #[test]
    fn test_into_api_error() {
        let mut errors = ValidationErrors::new();
        errors.check(false, "email", "invalid email");
        let err: ApiError = errors.into_result().unwrap_err().into();
        assert_eq!(err.message(), "email: invalid email");
    }
}
