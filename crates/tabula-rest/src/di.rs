//! Wiring of the REST client, resources and stores
//!
//! `AppContext` owns one `RestClient` and builds every service on top of it,
//! so hosts only deal with a `RestConfig`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::client::{RestClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::models::{Comment, Post, User};
use crate::resource::RestResource;
use tabula::{ConfigError, ListConfig, ListEngine, ResourceFetcher, ResourceStore, SharedStore};
use tabula_core::{Fetcher, Resource, Result};

/// Connection settings for the REST API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Entity collections the context can browse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Users,
    Posts,
    Comments,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Users => User::entity_name(),
            ResourceKind::Posts => Post::entity_name(),
            ResourceKind::Comments => Comment::entity_name(),
        }
    }

    /// Fields searched by default when browsing this collection
    pub fn search_fields(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Users => &["name", "email", "city"],
            ResourceKind::Posts => &["title", "content"],
            ResourceKind::Comments => &["content"],
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "users" | "user" => Ok(ResourceKind::Users),
            "posts" | "post" => Ok(ResourceKind::Posts),
            "comments" | "comment" => Ok(ResourceKind::Comments),
            other => Err(ConfigError::UnknownResource(other.to_string())),
        }
    }
}

pub struct AppContext {
    config: RestConfig,
    client: Arc<RestClient>,
    pub users: RestResource<User>,
    pub posts: RestResource<Post>,
    pub comments: RestResource<Comment>,
    pub user_store: SharedStore<User>,
    pub post_store: SharedStore<Post>,
    pub comment_store: SharedStore<Comment>,
}

impl AppContext {
    pub fn init(config: RestConfig) -> anyhow::Result<Self> {
        config.validate()?;
        info!(
            "[AppContext] connecting to {} (timeout {} ms)",
            config.base_url, config.timeout_ms
        );

        let client = Arc::new(RestClient::new(&config.base_url, config.timeout())?);
        let users = RestResource::<User>::new(Arc::clone(&client));
        let posts = RestResource::<Post>::new(Arc::clone(&client));
        let comments = RestResource::<Comment>::new(Arc::clone(&client));

        Ok(Self {
            user_store: store_for(&users),
            post_store: store_for(&posts),
            comment_store: store_for(&comments),
            users,
            posts,
            comments,
            client,
            config,
        })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Record-level fetcher over one collection, for a `ListEngine`
    pub fn fetcher(&self, kind: ResourceKind) -> Arc<dyn Fetcher> {
        match kind {
            ResourceKind::Users => Arc::new(ResourceFetcher::<User, _>::new(Arc::new(
                self.users.clone(),
            ))),
            ResourceKind::Posts => Arc::new(ResourceFetcher::<Post, _>::new(Arc::new(
                self.posts.clone(),
            ))),
            ResourceKind::Comments => Arc::new(ResourceFetcher::<Comment, _>::new(Arc::new(
                self.comments.clone(),
            ))),
        }
    }

    /// List engine over one collection. Empty `search_fields` in `config`
    /// fall back to the collection's defaults.
    pub async fn engine(&self, kind: ResourceKind, config: ListConfig) -> ListEngine {
        let config = if config.search_fields.is_empty() {
            config.with_search_fields(kind.search_fields().iter().copied())
        } else {
            config
        };
        ListEngine::start(self.fetcher(kind), config).await
    }

    /// Drop every cached list
    pub async fn shutdown(&self) -> Result<()> {
        self.user_store.write().await.reset_state();
        self.post_store.write().await.reset_state();
        self.comment_store.write().await.reset_state();
        info!("[AppContext] shut down");
        Ok(())
    }
}

fn store_for<T: Resource>(resource: &RestResource<T>) -> SharedStore<T> {
    Arc::new(RwLock::new(ResourceStore::new(Arc::new(resource.clone()))))
}
