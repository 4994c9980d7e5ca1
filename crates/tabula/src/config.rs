//! Configuration types shared by the engine and its hosts

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sort::{SortDirection, SortSpec};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("page_size must be greater than 0")]
    ZeroPageSize,

    #[error("base_url must not be empty")]
    EmptyBaseUrl,

    #[error("timeout must be greater than 0")]
    ZeroTimeout,

    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

/// Construction-time settings of a `ListEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: usize,
    /// Empty disables sorting
    pub default_sort_field: String,
    pub default_sort_direction: SortDirection,
    /// Fields eligible for free-text search; empty disables search
    pub search_fields: Vec<String>,
    /// Load once when the engine is started
    pub auto_load: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            default_sort_field: "id".to_string(),
            default_sort_direction: SortDirection::Asc,
            search_fields: Vec::new(),
            auto_load: true,
        }
    }
}

impl ListConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort_field = field.into();
        self.default_sort_direction = direction;
        self
    }

    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    pub fn default_sort(&self) -> SortSpec {
        SortSpec::new(self.default_sort_field.clone(), self.default_sort_direction)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(())
    }
}
