//! One validated REST resource per entity type
//!
//! `RestResource<T>` implements the typed `DataSource` / `CrudOperations`
//! traits for any `Resource`. Outgoing drafts and patches are validated
//! before a request is made; incoming payloads go through `schema` so ids are
//! normalized and every entity is validated.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::RestClient;
use crate::models::{Comment, Post, PostPatch, PostStatus, User};
use crate::schema::{parse_many, parse_one};
use tabula_api::{FetchParams, Value};
use tabula_core::{CrudOperations, DataSource, Resource, Result, Validate};

pub struct RestResource<T: Resource> {
    client: Arc<RestClient>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for RestResource<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            _phantom: PhantomData,
        }
    }
}

impl<T: Resource> RestResource<T> {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            client,
            _phantom: PhantomData,
        }
    }

    fn item_path(id: i64) -> String {
        format!("{}/{}", T::endpoint(), id)
    }

    /// Full-text search through the server's `q` parameter
    pub async fn search(&self, keyword: &str) -> Result<Vec<T>> {
        self.query(&params([("q", Value::from(keyword))])).await
    }

    /// Entities whose foreign key `field` equals `id`, e.g. posts by `userId`
    pub async fn list_by(&self, field: &str, id: i64) -> Result<Vec<T>> {
        self.query(&params([(field, Value::Integer(id))])).await
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> FetchParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[async_trait]
impl<T: Resource> DataSource<T> for RestResource<T> {
    async fn query(&self, params: &FetchParams) -> Result<Vec<T>> {
        let json = self.client.get(&T::endpoint(), params).await?;
        let items = parse_many::<T>(json)?;
        debug!("[RestResource] {} {} fetched", items.len(), T::entity_name());
        Ok(items)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<T>> {
        match self.client.get_optional(&Self::item_path(id)).await? {
            Some(json) => parse_one::<T>(json).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<T: Resource> CrudOperations<T> for RestResource<T> {
    async fn create(&self, draft: T::Draft) -> Result<T> {
        draft.validate()?;
        let json = self.client.post(&T::endpoint(), &draft).await?;
        let created = parse_one::<T>(json)?;
        info!("[RestResource] created {} {}", T::short_name(), created.id());
        Ok(created)
    }

    async fn update(&self, id: i64, draft: T::Draft) -> Result<T> {
        draft.validate()?;
        let json = self.client.put(&Self::item_path(id), &draft).await?;
        parse_one::<T>(json)
    }

    async fn patch(&self, id: i64, patch: T::Patch) -> Result<T> {
        patch.validate()?;
        let json = self.client.patch(&Self::item_path(id), &patch).await?;
        parse_one::<T>(json)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&Self::item_path(id)).await?;
        info!("[RestResource] deleted {} {}", T::short_name(), id);
        Ok(())
    }
}

impl RestResource<User> {
    pub async fn active(&self) -> Result<Vec<User>> {
        self.query(&params([("isActive", Value::Boolean(true))])).await
    }
}

/// Status transitions shared by every post backend
#[async_trait]
pub trait PostStatusOps: CrudOperations<Post> {
    async fn publish(&self, id: i64) -> Result<Post> {
        self.patch(id, PostPatch::status(PostStatus::Published)).await
    }

    async fn unpublish(&self, id: i64) -> Result<Post> {
        self.patch(id, PostPatch::status(PostStatus::Draft)).await
    }

    async fn archive(&self, id: i64) -> Result<Post> {
        self.patch(id, PostPatch::status(PostStatus::Archived)).await
    }
}

impl<B: CrudOperations<Post> + ?Sized> PostStatusOps for B {}

impl RestResource<Post> {
    pub async fn by_user(&self, user_id: i64) -> Result<Vec<Post>> {
        self.list_by("userId", user_id).await
    }

    pub async fn with_status(&self, status: PostStatus) -> Result<Vec<Post>> {
        self.query(&params([("status", Value::from(status.to_string()))]))
            .await
    }
}

impl RestResource<Comment> {
    pub async fn by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.list_by("postId", post_id).await
    }

    pub async fn by_user(&self, user_id: i64) -> Result<Vec<Comment>> {
        self.list_by("userId", user_id).await
    }
}
