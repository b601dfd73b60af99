//! Block Payloads
//!
//! Typed content of one block. Stored as JSON alongside a `block_type`
//! column holding [`BlockPayload::kind`].

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use url::Url;

use super::embed::EmbedVideo;

pub const TEXT_MAX_CHARS: usize = 100_000;
pub const CAPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockPayload {
    Text {
        content: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Video {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Third-party player; `url` may be any supported link and is stored
    /// as the provider's embed URL.
    Embed {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl BlockPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            BlockPayload::Text { .. } => "text",
            BlockPayload::Image { .. } => "image",
            BlockPayload::Video { .. } => "video",
            BlockPayload::Embed { .. } => "embed",
        }
    }

    /// Validate user input and return the normalized payload.
    pub fn validated(self) -> AppResult<Self> {
        match self {
            BlockPayload::Text { content } => {
                if content.trim().is_empty() {
                    return Err(AppError::bad_request("Text block cannot be empty"));
                }
                if content.chars().count() > TEXT_MAX_CHARS {
                    return Err(AppError::bad_request(format!(
                        "Text block must be at most {TEXT_MAX_CHARS} characters"
                    )));
                }
                Ok(BlockPayload::Text { content })
            }
            BlockPayload::Image { url, caption, alt } => Ok(BlockPayload::Image {
                url: media_url(&url)?,
                caption: caption_text(caption)?,
                alt: caption_text(alt)?,
            }),
            BlockPayload::Video { url, caption } => Ok(BlockPayload::Video {
                url: media_url(&url)?,
                caption: caption_text(caption)?,
            }),
            BlockPayload::Embed { url, caption } => Ok(BlockPayload::Embed {
                url: EmbedVideo::parse(&url)?.embed_url,
                caption: caption_text(caption)?,
            }),
        }
    }
}

fn media_url(raw: &str) -> AppResult<String> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.into()),
        _ => Err(AppError::bad_request("Media URL must be an absolute http(s) URL")),
    }
}

fn caption_text(raw: Option<String>) -> AppResult<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let text = raw.trim();
    if text.chars().count() > CAPTION_MAX_CHARS {
        return Err(AppError::bad_request(format!(
            "Caption must be at most {CAPTION_MAX_CHARS} characters"
        )));
    }
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let payload: BlockPayload = serde_json::from_value(json!({
            "type": "image",
            "url": "https://cdn.example.com/a.png",
            "alt": "diagram"
        }))
        .unwrap();
        assert_eq!(payload.kind(), "image");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "type": "image", "url": "https://cdn.example.com/a.png", "alt": "diagram" })
        );

        assert!(serde_json::from_value::<BlockPayload>(json!({ "type": "quiz" })).is_err());
    }

    #[test]
    fn test_text_validation() {
        assert!(BlockPayload::Text { content: "  ".into() }.validated().is_err());
        assert!(
            BlockPayload::Text {
                content: "Hello".into()
            }
            .validated()
            .is_ok()
        );
    }

    #[test]
    fn test_media_url_validation() {
        let bad = BlockPayload::Video {
            url: "javascript:alert(1)".into(),
            caption: None,
        };
        assert!(bad.validated().is_err());

        let ok = BlockPayload::Image {
            url: " https://cdn.example.com/a.png ".into(),
            caption: Some("  ".into()),
            alt: None,
        }
        .validated()
        .unwrap();
        assert_eq!(
            ok,
            BlockPayload::Image {
                url: "https://cdn.example.com/a.png".into(),
                caption: None,
                alt: None,
            }
        );
    }

    #[test]
    fn test_embed_is_normalized() {
        let payload = BlockPayload::Embed {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            caption: None,
        }
        .validated()
        .unwrap();
        assert_eq!(
            payload,
            BlockPayload::Embed {
                url: "https://www.youtube.com/embed/dQw4w9WgXcQ".into(),
                caption: None,
            }
        );
    }
}
