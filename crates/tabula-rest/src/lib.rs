//! REST integration for tabula
//!
//! This crate connects the generic engine to a JSON REST API:
//!
//! - `client` - RestClient (HTTP transport, error mapping)
//! - `schema` - id normalization and validated parsing of server payloads
//! - `models` - users, posts and comments with their drafts and patches
//! - `resource` - RestResource, one typed `DataSource` + `CrudOperations` per entity
//! - `post_form` / `user_store` - post form actions and the user status toggle
//! - `fake` - FakeResource, an in-memory backend for tests and offline mode
//! - `di` - RestConfig and AppContext wiring everything together

pub mod client;
pub mod di;
pub mod fake;
pub mod models;
pub mod post_form;
pub mod resource;
pub mod schema;
pub mod user_store;

pub use client::RestClient;
pub use di::{AppContext, ResourceKind, RestConfig};
pub use fake::FakeResource;
pub use models::*;
pub use post_form::PostFormOps;
pub use resource::{PostStatusOps, RestResource};
pub use user_store::UserStoreOps;
pub use tabula::SharedStore;
