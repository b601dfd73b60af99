//! Request Extractors
//!
//! Drop-in replacements for axum's `Json`, `Path` and `Query` whose
//! rejections become a 400 [`AppError`] problem response. The parser's
//! own message is only logged.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::app_error::AppError;

/// JSON body extractor and response
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "JSON body rejected");
        let err = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::bad_request("Request body must be JSON")
                    .with_action("Send the body with Content-Type: application/json")
            }
            JsonRejection::JsonSyntaxError(_) => AppError::bad_request("Request body is not valid JSON"),
            _ => AppError::bad_request("Request body does not match the expected fields")
                .with_action("Check required fields and their types"),
        };
        err.with_source(rejection)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Path parameters rejected");
        AppError::bad_request("Invalid path parameter").with_source(rejection)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Query string rejected");
        AppError::bad_request("Invalid query parameters").with_source(rejection)
    }
}
