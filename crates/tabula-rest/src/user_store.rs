use async_trait::async_trait;

use crate::models::{User, UserPatch};
use tabula::ResourceStore;
use tabula_api::ApiError;
use tabula_core::Result;

#[async_trait]
pub trait UserStoreOps {
    /// Flip `isActive` of a cached user through a patch
    async fn toggle_active(&mut self, id: i64) -> Result<User>;
}

#[async_trait]
impl UserStoreOps for ResourceStore<User> {
    async fn toggle_active(&mut self, id: i64) -> Result<User> {
        let is_active = self
            .get(id)
            .map(|user| user.is_active)
            .ok_or_else(|| ApiError::NotFound {
                entity: "user".to_string(),
                id: id.to_string(),
            })?;
        let patch = UserPatch {
            is_active: Some(!is_active),
            ..UserPatch::default()
        };
        self.patch(id, patch).await
    }
}
