use axum::{
    http::Uri,
    response::{IntoResponse, Response},
};

mod admin;
mod auth;
mod comments;
mod posts;
mod profiles;

pub use admin::*;
pub use auth::*;
pub use comments::*;
pub use posts::*;
pub use profiles::*;

use crate::{errors::RequestError, AppState};

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> RequestError {
    tracing::debug!(%uri, "no route matched");
    RequestError::NotFound
}

fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn render(
    state: &AppState,
    template: &str,
    context: &tera::Context,
) -> Result<Response, RequestError> {
    Ok(state.templates.render(template, context)?.into_response())
}
