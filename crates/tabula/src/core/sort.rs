use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use tabula_api::{Record, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// Current sort field and direction. An empty field disables sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.field.is_empty()
    }

    /// Same field flips the direction, a new field starts ascending
    pub fn toggle_field(&mut self, field: &str) {
        if self.field == field {
            self.direction = self.direction.toggled();
        } else {
            self.field = field.to_string();
            self.direction = SortDirection::Asc;
        }
    }

    /// Missing fields sort as null
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let a = a.get(&self.field).unwrap_or(&Value::Null);
        let b = b.get(&self.field).unwrap_or(&Value::Null);
        self.direction.apply(a.sort_cmp(b))
    }
}
