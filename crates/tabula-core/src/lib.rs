//! Core traits for tabula data sources
//!
//! This crate provides the seams the rest of the workspace is built around:
//! - `Resource`: a validated entity type with its REST endpoint and id fields
//! - `DataSource` / `CrudOperations`: typed read and write access to a resource
//! - `Fetcher`: the record-level async collaborator consumed by the list engine
//! - `Validate` / `ValidationErrors`: field-level validation results

pub mod traits;
pub mod validation;

pub use traits::{
    CrudOperations, DataSource, FetchFn, Fetcher, MaybeSendSync, Resource, ResourceBackend,
    Result,
};
pub use validation::{FieldError, Validate, ValidationErrors};
