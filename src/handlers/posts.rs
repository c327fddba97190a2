use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use chrono::Utc;

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{
        CommentForm, FieldErrors, PageQuery, PostForm, PostInput, INVALID_CHOICE,
    },
    db_helpers::{
        create_post_in_db, delete_post_in_db, get_category_by_id_in_db,
        get_comments_for_post_in_db, get_location_by_id_in_db, get_post_card_in_db,
        get_post_in_db, get_published_category_by_slug_in_db, list_categories_in_db,
        list_locations_in_db, list_posts_in_db, update_post_in_db, PostFilter,
    },
    errors::RequestError,
    media::save_image,
    models::{Post, User},
    templates::base_context,
    AppState,
};

use super::{post_detail_url, profile_url, render};

// ----------------- Listing Handlers -----------------

pub async fn index(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let page = list_posts_in_db(
        &state.pool,
        &PostFilter::visible(Utc::now()),
        query.page.as_deref(),
        state.config.page_size,
    )
    .await?;
    let mut context = base_context(user.as_ref());
    context.insert("page_obj", &page);
    render(&state, "blog/index.html", &context)
}

pub async fn category_posts(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let category = get_published_category_by_slug_in_db(&state.pool, &slug)
        .await?
        .ok_or(RequestError::NotFound)?;
    let filter = PostFilter {
        category_id: Some(category.id),
        ..PostFilter::visible(Utc::now())
    };
    let page = list_posts_in_db(
        &state.pool,
        &filter,
        query.page.as_deref(),
        state.config.page_size,
    )
    .await?;
    let mut context = base_context(user.as_ref());
    context.insert("category", &category);
    context.insert("page_obj", &page);
    render(&state, "blog/category.html", &context)
}

pub async fn post_detail(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    let post = get_post_card_in_db(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if maybe_user.get_id() != Some(post.author_id) && !post.is_visible(Utc::now()) {
        return Err(RequestError::NotFound);
    }
    let comments = get_comments_for_post_in_db(&state.pool, post_id).await?;

    let mut context = base_context(maybe_user.0.as_ref());
    context.insert("post", &post);
    context.insert("comments", &comments);
    context.insert("form", &CommentForm::default());
    render(&state, "blog/detail.html", &context)
}

// ----------------- Post Form Handlers -----------------

async fn render_post_form(
    state: &AppState,
    user: &User,
    form: &PostForm,
    errors: &FieldErrors,
    post_id: Option<i64>,
) -> Result<Response, RequestError> {
    let categories = list_categories_in_db(&state.pool).await?;
    let locations = list_locations_in_db(&state.pool).await?;
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("categories", &categories);
    context.insert("locations", &locations);
    context.insert("post_id", &post_id);
    render(state, "blog/create.html", &context)
}

/// Field validation plus checks that the chosen category and location exist.
async fn validate_post_form(
    state: &AppState,
    form: &PostForm,
) -> Result<Result<PostInput, FieldErrors>, RequestError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = FieldErrors::new();
    if let Some(id) = input.category_id {
        if get_category_by_id_in_db(&state.pool, id).await?.is_none() {
            errors.insert("category".to_owned(), INVALID_CHOICE.to_owned());
        }
    }
    if let Some(id) = input.location_id {
        if get_location_by_id_in_db(&state.pool, id).await?.is_none() {
            errors.insert("location".to_owned(), INVALID_CHOICE.to_owned());
        }
    }

    if errors.is_empty() {
        Ok(Ok(input))
    } else {
        Ok(Err(errors))
    }
}

/// Loads the post for a mutating request. `Err(redirect)` when the user is not its author.
async fn owned_post(
    state: &AppState,
    user: &User,
    post_id: i64,
) -> Result<Result<Post, Response>, RequestError> {
    let post = get_post_in_db(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    if post.author_id != user.id {
        tracing::info!(post_id, user = %user.username, "refusing change to someone else's post");
        return Ok(Err(Redirect::to(&post_detail_url(post_id)).into_response()));
    }
    Ok(Ok(post))
}

pub async fn create_post_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Response, RequestError> {
    render_post_form(
        &state,
        &user,
        &PostForm::blank(Utc::now()),
        &FieldErrors::new(),
        None,
    )
    .await
}

pub async fn create_post(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let form = PostForm::from_multipart(multipart).await?;
    let input = match validate_post_form(&state, &form).await? {
        Ok(input) => input,
        Err(errors) => return render_post_form(&state, &user, &form, &errors, None).await,
    };

    let image = match &form.image {
        Some(image) => Some(save_image(&state.config.media_dir, image).await?),
        None => None,
    };
    let post = create_post_in_db(&state.pool, user.id, &input, image.as_deref()).await?;
    tracing::info!(post_id = post.id, author = %user.username, "post created");

    Ok(Redirect::to(&profile_url(&user.username)).into_response())
}

pub async fn edit_post_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    let post = match owned_post(&state, &user, post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    render_post_form(
        &state,
        &user,
        &PostForm::from_post(&post),
        &FieldErrors::new(),
        Some(post_id),
    )
    .await
}

pub async fn edit_post(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let post = match owned_post(&state, &user, post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    let mut form = PostForm::from_multipart(multipart).await?;
    form.current_image = post.image.clone();

    let input = match validate_post_form(&state, &form).await? {
        Ok(input) => input,
        Err(errors) => return render_post_form(&state, &user, &form, &errors, Some(post_id)).await,
    };

    let image = match &form.image {
        Some(image) => Some(save_image(&state.config.media_dir, image).await?),
        None if form.image_clear => None,
        None => post.image,
    };
    update_post_in_db(&state.pool, post_id, &input, image.as_deref()).await?;
    tracing::info!(post_id, author = %user.username, "post updated");

    Ok(Redirect::to(&post_detail_url(post_id)).into_response())
}

pub async fn delete_post_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    if let Err(redirect) = owned_post(&state, &user, post_id).await? {
        return Ok(redirect);
    }
    let post = get_post_card_in_db(&state.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    let mut context = base_context(Some(&user));
    context.insert("post", &post);
    render(&state, "blog/delete.html", &context)
}

pub async fn delete_post(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    if let Err(redirect) = owned_post(&state, &user, post_id).await? {
        return Ok(redirect);
    }
    delete_post_in_db(&state.pool, post_id).await?;
    tracing::info!(post_id, author = %user.username, "post deleted");
    Ok(Redirect::to("/").into_response())
}
