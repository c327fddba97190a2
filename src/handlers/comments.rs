use std::sync::Arc;

use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;

use crate::{
    authentication::AuthUser,
    data_formats::{CommentForm, FieldErrors},
    db_helpers::{
        add_comment_to_post_in_db, delete_comment_in_db, get_comment_for_post_in_db,
        get_post_card_in_db, update_comment_in_db,
    },
    errors::RequestError,
    models::{Comment, User},
    templates::base_context,
    AppState,
};

use super::{post_detail_url, render};

pub async fn add_comment(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, RequestError> {
    let post = get_post_card_in_db(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if post.author_id != user.id && !post.is_visible(Utc::now()) {
        return Err(RequestError::NotFound);
    }

    match form.validate() {
        Ok(text) => {
            let comment = add_comment_to_post_in_db(&state.pool, user.id, post_id, &text).await?;
            tracing::info!(post_id, comment_id = comment.id, author = %user.username, "comment added");
        }
        Err(errors) => tracing::debug!(?errors, "discarding invalid comment"),
    }
    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}

/// Loads the comment for a mutating request. `Err(redirect)` when the user is not its author.
async fn owned_comment(
    state: &AppState,
    user: &User,
    post_id: i64,
    comment_id: i64,
) -> Result<Result<Comment, Response>, RequestError> {
    let comment = get_comment_for_post_in_db(&state.pool, post_id, comment_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if comment.author_id != user.id {
        tracing::info!(comment_id, user = %user.username, "refusing change to someone else's comment");
        return Ok(Err(Redirect::to(&post_detail_url(post_id)).into_response()));
    }
    Ok(Ok(comment))
}

fn render_comment_page(
    state: &AppState,
    user: &User,
    comment: &Comment,
    form: Option<&CommentForm>,
    errors: &FieldErrors,
) -> Result<Response, RequestError> {
    let mut context = base_context(Some(user));
    context.insert("comment", comment);
    context.insert("form", &form);
    context.insert("errors", errors);
    render(state, "blog/comment.html", &context)
}

pub async fn edit_comment_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, RequestError> {
    let comment = match owned_comment(&state, &user, post_id, comment_id).await? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    let form = CommentForm {
        text: comment.text.clone(),
    };
    render_comment_page(&state, &user, &comment, Some(&form), &FieldErrors::new())
}

pub async fn edit_comment(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Form(form): Form<CommentForm>,
) -> Result<Response, RequestError> {
    let comment = match owned_comment(&state, &user, post_id, comment_id).await? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => return render_comment_page(&state, &user, &comment, Some(&form), &errors),
    };
    update_comment_in_db(&state.pool, comment.id, &text).await?;
    tracing::info!(post_id, comment_id, author = %user.username, "comment updated");
    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}

pub async fn delete_comment_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, RequestError> {
    let comment = match owned_comment(&state, &user, post_id, comment_id).await? {
        Ok(comment) => comment,
        Err(redirect) => return Ok(redirect),
    };
    render_comment_page(&state, &user, &comment, None, &FieldErrors::new())
}

pub async fn delete_comment(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, RequestError> {
    if let Err(redirect) = owned_comment(&state, &user, post_id, comment_id).await? {
        return Ok(redirect);
    }
    delete_comment_in_db(&state.pool, comment_id).await?;
    tracing::info!(post_id, comment_id, author = %user.username, "comment deleted");
    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}
