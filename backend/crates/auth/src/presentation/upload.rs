//! Multipart upload reading, shared with the content routes.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use kernel::error::app_error::{AppError, AppResult};

/// Form field carrying the file
pub const FILE_FIELD: &str = "file";

/// Extra room for multipart framing on top of the file size limit
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug)]
pub struct Upload {
    pub content_type: String,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Read the `file` field. Other fields are skipped.
pub async fn read_file_field(multipart: &mut Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Ok(Upload {
            content_type,
            file_name,
            bytes,
        });
    }

    Err(AppError::bad_request("Missing multipart field 'file'")
        .with_action("Send the file as multipart/form-data in a field named 'file'"))
}

// Oversized bodies surface here too and are reported as 400
fn multipart_error(err: MultipartError) -> AppError {
    tracing::debug!(status = %err.status(), reason = %err.body_text(), "Multipart read failed");
    AppError::bad_request(format!("Invalid upload: {}", err.body_text()))
}
