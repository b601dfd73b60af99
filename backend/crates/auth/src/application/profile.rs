//! Profile Use Case
//!
//! Read and edit the caller's own profile, and upload an avatar.

use std::sync::Arc;

use bytes::Bytes;
use kernel::error::app_error::AppError;
use kernel::id::UserId;
use platform::media::{MediaError, MediaKind, inspect};
use platform::storage::{ObjectStorage, object_key};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::profile::{Bio, FullName};
use crate::error::{AuthError, AuthResult};

/// Fields left `None` are not changed
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    /// Empty string clears the bio
    pub bio: Option<String>,
}

pub struct ProfileUseCase<U, S>
where
    U: UserRepository,
    S: ObjectStorage,
{
    user_repo: Arc<U>,
    storage: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> ProfileUseCase<U, S>
where
    U: UserRepository,
    S: ObjectStorage,
{
    pub fn new(user_repo: Arc<U>, storage: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            storage,
            config,
        }
    }

    pub async fn get(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update(&self, user_id: &UserId, update: ProfileUpdate) -> AuthResult<User> {
        let full_name = update.full_name.map(FullName::new).transpose()?;
        let bio = update.bio.map(Bio::new).transpose()?;

        let mut user = self.get(user_id).await?;
        user.update_profile(full_name, bio);
        self.user_repo.update_user(&user).await?;

        tracing::info!(user_id = %user_id, "Profile updated");

        Ok(user)
    }

    /// The avatar URL is only recorded after the object is stored.
    pub async fn upload_avatar(
        &self,
        user_id: &UserId,
        content_type: &str,
        bytes: Bytes,
    ) -> AuthResult<User> {
        let media = inspect(
            MediaKind::Image,
            content_type,
            &bytes,
            self.config.avatar_max_bytes,
        )
        .map_err(media_error)?;

        let mut user = self.get(user_id).await?;

        let key = object_key(&format!("avatars/{user_id}"), media.extension);
        let stored = self.storage.put(&key, bytes, media.content_type).await?;

        user.set_avatar(stored.url);
        self.user_repo.update_user(&user).await?;

        tracing::info!(user_id = %user_id, key = %stored.key, size = stored.size, "Avatar uploaded");

        Ok(user)
    }
}

fn media_error(err: MediaError) -> AuthError {
    let action = match err {
        MediaError::TooLarge { .. } => "Please upload an image up to 5 MiB",
        _ => "Please upload a JPEG, PNG, GIF or WebP image",
    };
    AuthError::Validation(AppError::bad_request(err.to_string()).with_action(action))
}
