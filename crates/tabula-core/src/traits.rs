//! Core data source traits
//!
//! These traits describe how typed resources are read and written, and how the
//! list engine obtains untyped records. They are implemented by the REST layer,
//! by in-memory fakes, and by plain closures in tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use crate::validation::Validate;
use tabula_api::{ApiError, FetchParams, FetchResponse};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Shorthand for the thread-safety bounds every collaborator carries.
pub trait MaybeSendSync: Send + Sync {}
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// A validated entity exposed by a REST endpoint.
///
/// One implementation per entity (users, posts, comments) replaces the
/// per-entity copies of fetching, parsing and validation code.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + Debug + Validate + MaybeSendSync + 'static
{
    /// Payload for creating a new entity (everything except the id)
    type Draft: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + PartialEq
        + Debug
        + Validate
        + MaybeSendSync
        + 'static;

    /// Partial update payload; unset fields are not sent
    type Patch: Serialize + Clone + Default + Debug + Validate + MaybeSendSync + 'static;

    /// Collection name, e.g. "users"
    fn entity_name() -> &'static str;

    /// Singular name used in messages, e.g. "user"
    fn short_name() -> &'static str;

    /// Path of the collection relative to the API base URL
    fn endpoint() -> String {
        format!("/{}", Self::entity_name())
    }

    /// Fields holding numeric ids that servers sometimes send as strings,
    /// paired with the entity each id refers to (used in error messages)
    fn id_fields() -> Vec<(&'static str, &'static str)> {
        vec![("id", Self::short_name())]
    }

    fn id(&self) -> i64;

    /// Draft carrying this entity's current values (used to prefill forms)
    fn to_draft(&self) -> Self::Draft;
}

/// Read-only typed access to a resource
#[async_trait]
pub trait DataSource<T>: MaybeSendSync
where
    T: MaybeSendSync + 'static,
{
    /// Fetch entities matching `params` (sent as query parameters)
    async fn query(&self, params: &FetchParams) -> Result<Vec<T>>;

    /// Returns `Ok(None)` when the entity does not exist
    async fn get_by_id(&self, id: i64) -> Result<Option<T>>;

    async fn get_all(&self) -> Result<Vec<T>> {
        let params = FetchParams::new();
        self.query(&params).await
    }
}

/// Write operations on a resource. Every call returns the server's view of
/// the entity so callers can update local caches from it.
#[async_trait]
pub trait CrudOperations<T>: MaybeSendSync
where
    T: Resource,
{
    async fn create(&self, draft: T::Draft) -> Result<T>;

    /// Full replacement
    async fn update(&self, id: i64, draft: T::Draft) -> Result<T>;

    async fn patch(&self, id: i64, patch: T::Patch) -> Result<T>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// Anything that can both read and write a resource
pub trait ResourceBackend<T>: DataSource<T> + CrudOperations<T>
where
    T: Resource,
{
}

impl<T, D> ResourceBackend<T> for D
where
    T: Resource,
    D: DataSource<T> + CrudOperations<T>,
{
}

/// Record-level async data source consumed by the list engine.
///
/// Implementations must report failures through the returned error, carrying
/// a human-readable message; they own timeouts and transport concerns.
#[async_trait]
pub trait Fetcher: MaybeSendSync {
    async fn fetch(&self, params: FetchParams) -> Result<FetchResponse>;
}

#[async_trait]
impl<F> Fetcher for Arc<F>
where
    F: Fetcher + ?Sized,
{
    async fn fetch(&self, params: FetchParams) -> Result<FetchResponse> {
        (**self).fetch(params).await
    }
}

/// Adapter turning an async closure into a `Fetcher`
///
/// ```ignore
/// let fetcher = FetchFn(|_params| async { Ok::<_, ApiError>(FetchResponse::default()) });
/// ```
pub struct FetchFn<F>(pub F);

#[async_trait]
impl<F, Fut> Fetcher for FetchFn<F>
where
    F: Fn(FetchParams) -> Fut + MaybeSendSync,
    Fut: Future<Output = Result<FetchResponse>> + Send,
{
    async fn fetch(&self, params: FetchParams) -> Result<FetchResponse> {
        (self.0)(params).await
    }
}
