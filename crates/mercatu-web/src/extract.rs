//! Request extractors with rejections routed through [`ApiError`].
//!
//! axum's stock `Json`/`Query`/`Path` answer malformed input with plain-text
//! bodies; these wrappers keep every error on the wire `{"error": ...}`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use mercatu_common::ApiError;

/// `axum::Json` with its rejection mapped to a 400 [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

// Handlers reply with the same `Json`, so it serializes like the original.
impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `axum::extract::Query` with its rejection mapped to a 400 [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

/// `axum::extract::Path` with its rejection mapped to a 400 [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);
