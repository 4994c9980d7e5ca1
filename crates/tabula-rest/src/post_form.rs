//! Post-specific form actions

use async_trait::async_trait;
use tracing::info;

use crate::models::{Post, PostStatus};
use tabula::{FormState, ResourceStore};
use tabula_core::Result;

/// Save a post form with an explicit status.
///
/// `id` selects the post being edited; without one a new post is created.
#[async_trait]
pub trait PostFormOps {
    fn set_author(&mut self, user_id: i64);

    async fn save_draft(&mut self, store: &mut ResourceStore<Post>, id: Option<i64>)
        -> Result<Post>;

    async fn publish(&mut self, store: &mut ResourceStore<Post>, id: Option<i64>) -> Result<Post>;
}

#[async_trait]
impl PostFormOps for FormState<Post> {
    fn set_author(&mut self, user_id: i64) {
        self.data_mut().user_id = user_id;
    }

    async fn save_draft(
        &mut self,
        store: &mut ResourceStore<Post>,
        id: Option<i64>,
    ) -> Result<Post> {
        save_with_status(self, store, id, PostStatus::Draft).await
    }

    async fn publish(&mut self, store: &mut ResourceStore<Post>, id: Option<i64>) -> Result<Post> {
        let post = save_with_status(self, store, id, PostStatus::Published).await?;
        info!("Published post {}", post.id);
        Ok(post)
    }
}

async fn save_with_status(
    form: &mut FormState<Post>,
    store: &mut ResourceStore<Post>,
    id: Option<i64>,
    status: PostStatus,
) -> Result<Post> {
    form.data_mut().status = status;
    match id {
        Some(id) => form.submit_update(store, id).await,
        None => form.submit_create(store).await,
    }
}
