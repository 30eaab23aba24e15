//! REST endpoint handlers organized by resource.

pub mod contributions;
pub mod github;
pub mod me;
pub mod projects;
pub mod system;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(projects::routes())
        .merge(contributions::routes())
        .merge(me::routes())
        .merge(github::routes())
}

/// Renders a listing: `206 Partial Content` when it spans several pages,
/// `200 OK` otherwise.
pub(crate) fn paged<T: Serialize>(partial: bool, body: T) -> Response {
    let status = if partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    (status, Json(body)).into_response()
}
