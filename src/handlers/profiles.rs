use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{FieldErrors, PageQuery, ProfileForm},
    db_helpers::{get_profile_from_db, update_user_in_db},
    errors::RequestError,
    models::User,
    templates::base_context,
    AppState,
};

use super::{profile_url, render};

pub async fn profile(
    Extension(state): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let (profile, page) = get_profile_from_db(
        &state.pool,
        maybe_user.get_id(),
        &username,
        Utc::now(),
        query.page.as_deref(),
        state.config.page_size,
    )
    .await?;

    let mut context = base_context(maybe_user.0.as_ref());
    context.insert("full_name", &profile.full_name());
    context.insert("profile", &profile);
    context.insert("page_obj", &page);
    render(&state, "blog/profile.html", &context)
}

fn render_profile_form(
    state: &AppState,
    user: &User,
    form: &ProfileForm,
    errors: &FieldErrors,
) -> Result<Response, RequestError> {
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "blog/user.html", &context)
}

pub async fn edit_profile_form(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Response, RequestError> {
    render_profile_form(&state, &user, &ProfileForm::from_user(&user), &FieldErrors::new())
}

pub async fn edit_profile(
    Extension(state): Extension<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, RequestError> {
    let cleaned = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_profile_form(&state, &user, &form, &errors),
    };

    let updated = match update_user_in_db(&state.pool, user.id, &cleaned).await {
        Ok(updated) => updated,
        Err(e) if e.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.insert(
                "username".to_owned(),
                "A user with that username already exists.".to_owned(),
            );
            return render_profile_form(&state, &user, &form, &errors);
        }
        Err(e) => return Err(e),
    };
    tracing::info!(user_id = updated.id, username = %updated.username, "profile updated");

    Ok(Redirect::to(&profile_url(&updated.username)).into_response())
}
