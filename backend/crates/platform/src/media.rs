//! Media Upload Checks
//!
//! Content-type allowlists, size limits and a magic-number sniff for
//! uploaded files. The declared type must match what the bytes say.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("File is empty")]
    Empty,

    #[error("File is too large: {actual} bytes (max {max})")]
    TooLarge { max: usize, actual: usize },

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("File contents do not match content type {0}")]
    ContentMismatch(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["image/jpeg", "image/png", "image/gif", "image/webp"],
            MediaKind::Video => &["video/mp4", "video/webm", "video/quicktime"],
        }
    }
}

/// Checked upload metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub kind: MediaKind,
    /// Canonical content type (lower-cased, parameters stripped)
    pub content_type: &'static str,
    pub extension: &'static str,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    Some(match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => return None,
    })
}

fn sniff_matches(content_type: &str, bytes: &[u8]) -> bool {
    match content_type {
        "image/jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "image/png" => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "image/gif" => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        "image/webp" => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        "video/mp4" | "video/quicktime" => bytes.len() >= 8 && &bytes[4..8] == b"ftyp",
        "video/webm" => bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),
        _ => false,
    }
}

/// Validate an upload of `kind` against its declared content type.
pub fn inspect(
    kind: MediaKind,
    declared_type: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<MediaType, MediaError> {
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(MediaError::TooLarge {
            max: max_bytes,
            actual: bytes.len(),
        });
    }

    let normalized = declared_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let content_type = kind
        .allowed_types()
        .iter()
        .copied()
        .find(|allowed| *allowed == normalized)
        .ok_or_else(|| MediaError::UnsupportedType(declared_type.to_string()))?;

    if !sniff_matches(content_type, bytes) {
        return Err(MediaError::ContentMismatch(content_type.to_string()));
    }

    let extension =
        extension_for(content_type).ok_or_else(|| MediaError::UnsupportedType(normalized))?;

    Ok(MediaType {
        kind,
        content_type,
        extension,
    })
}
