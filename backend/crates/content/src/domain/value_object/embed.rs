//! Video Embeds
//!
//! Recognizes YouTube, Vimeo and Rutube links and turns them into the
//! provider's embeddable player URL.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    YouTube,
    Vimeo,
    Rutube,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedVideo {
    pub provider: VideoProvider,
    pub video_id: String,
    pub embed_url: String,
}

impl EmbedVideo {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|_| unsupported())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(unsupported());
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let parsed = match host {
            "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" => youtube_id(&url, &segments)
                .map(|id| (VideoProvider::YouTube, id)),
            "youtu.be" => segments
                .first()
                .filter(|id| is_youtube_id(id))
                .map(|id| (VideoProvider::YouTube, id.to_string())),
            "vimeo.com" | "player.vimeo.com" => vimeo_id(&segments).map(|id| (VideoProvider::Vimeo, id)),
            "rutube.ru" => rutube_id(&segments).map(|id| (VideoProvider::Rutube, id)),
            _ => None,
        };

        let (provider, video_id) = parsed.ok_or_else(unsupported)?;
        Ok(Self::new(provider, video_id))
    }

    fn new(provider: VideoProvider, video_id: String) -> Self {
        let embed_url = match provider {
            VideoProvider::YouTube => format!("https://www.youtube.com/embed/{video_id}"),
            VideoProvider::Vimeo => format!("https://player.vimeo.com/video/{video_id}"),
            VideoProvider::Rutube => format!("https://rutube.ru/play/embed/{video_id}"),
        };
        Self {
            provider,
            video_id,
            embed_url,
        }
    }
}

fn unsupported() -> AppError {
    AppError::bad_request("Unsupported video link")
        .with_action("Use a YouTube, Vimeo or Rutube video URL")
}

fn is_youtube_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn youtube_id(url: &Url, segments: &[&str]) -> Option<String> {
    let id = match segments {
        ["watch"] => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        ["embed" | "shorts" | "live" | "v", id, ..] => Some(id.to_string()),
        _ => None,
    }?;
    is_youtube_id(&id).then_some(id)
}

fn vimeo_id(segments: &[&str]) -> Option<String> {
    let id = match segments {
        ["video", id, ..] => id,
        [id, ..] => id,
        [] => return None,
    };
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

fn rutube_id(segments: &[&str]) -> Option<String> {
    let id = match segments {
        ["video", id, ..] => id,
        ["play", "embed", id, ..] => id,
        _ => return None,
    };
    (id.len() >= 8 && id.chars().all(|c| c.is_ascii_alphanumeric())).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_forms() {
        for link in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            let embed = EmbedVideo::parse(link).unwrap();
            assert_eq!(embed.provider, VideoProvider::YouTube, "{link}");
            assert_eq!(embed.video_id, "dQw4w9WgXcQ");
            assert_eq!(embed.embed_url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
        }
    }

    #[test]
    fn test_vimeo_and_rutube() {
        let vimeo = EmbedVideo::parse("https://vimeo.com/76979871").unwrap();
        assert_eq!(vimeo.provider, VideoProvider::Vimeo);
        assert_eq!(vimeo.embed_url, "https://player.vimeo.com/video/76979871");

        let player = EmbedVideo::parse("https://player.vimeo.com/video/76979871").unwrap();
        assert_eq!(player.video_id, "76979871");

        let rutube =
            EmbedVideo::parse("https://rutube.ru/video/c6cc4d620b1d4338901770a44b3e82f4/").unwrap();
        assert_eq!(rutube.provider, VideoProvider::Rutube);
        assert_eq!(
            rutube.embed_url,
            "https://rutube.ru/play/embed/c6cc4d620b1d4338901770a44b3e82f4"
        );
    }

    #[test]
    fn test_rejects_other_links() {
        for link in [
            "not a url",
            "ftp://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://example.com/video/123",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/channel/UC123",
            "https://vimeo.com/channels/staffpicks",
        ] {
            assert!(EmbedVideo::parse(link).is_err(), "{link} should be rejected");
        }
    }
}
