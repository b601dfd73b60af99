//! Media Use Case
//!
//! Teacher uploads for image and video blocks, and embed link
//! normalization. The returned URL is what a block payload then refers to.

use std::sync::Arc;

use bytes::Bytes;
use kernel::error::app_error::AppError;
use kernel::id::UserId;
use platform::media::{MediaError, MediaKind, inspect};
use platform::storage::{ObjectStorage, StoredObject, object_key};

use crate::application::config::ContentConfig;
use crate::domain::value_object::embed::EmbedVideo;
use crate::error::{ContentError, ContentResult};

pub struct MediaUseCase<S>
where
    S: ObjectStorage,
{
    storage: Arc<S>,
    config: Arc<ContentConfig>,
}

impl<S> MediaUseCase<S>
where
    S: ObjectStorage,
{
    pub fn new(storage: Arc<S>, config: Arc<ContentConfig>) -> Self {
        Self { storage, config }
    }

    pub async fn upload(
        &self,
        user_id: &UserId,
        kind: MediaKind,
        content_type: &str,
        bytes: Bytes,
    ) -> ContentResult<StoredObject> {
        let max_bytes = match kind {
            MediaKind::Image => self.config.image_max_bytes,
            MediaKind::Video => self.config.video_max_bytes,
        };
        let media =
            inspect(kind, content_type, &bytes, max_bytes).map_err(|e| media_error(kind, e))?;

        let prefix = match kind {
            MediaKind::Image => format!("images/{user_id}"),
            MediaKind::Video => format!("videos/{user_id}"),
        };
        let key = object_key(&prefix, media.extension);
        let stored = self.storage.put(&key, bytes, media.content_type).await?;

        tracing::info!(
            user_id = %user_id,
            kind = kind.as_str(),
            key = %stored.key,
            size = stored.size,
            "Media uploaded"
        );

        Ok(stored)
    }
}

/// Recognize a YouTube, Vimeo or Rutube link.
pub fn embed_video(url: &str) -> ContentResult<EmbedVideo> {
    Ok(EmbedVideo::parse(url)?)
}

fn media_error(kind: MediaKind, err: MediaError) -> ContentError {
    let action = match (kind, &err) {
        (MediaKind::Image, MediaError::TooLarge { .. }) => "Please upload an image up to 10 MiB",
        (MediaKind::Video, MediaError::TooLarge { .. }) => "Please upload a video up to 100 MiB",
        (MediaKind::Image, _) => "Please upload a JPEG, PNG, GIF or WebP image",
        (MediaKind::Video, _) => "Please upload an MP4, WebM or QuickTime video",
    };
    ContentError::Validation(AppError::bad_request(err.to_string()).with_action(action))
}
