use std::sync::Arc;

use axum::{
    extract::Query,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    authentication::{
        expired_session_cookie, get_jwt_token, hash_password_argon2, session_cookie,
        verify_password_argon2, MaybeUser,
    },
    data_formats::{FieldErrors, LoginForm, LoginQuery, RegistrationForm},
    db_helpers::{get_user_by_username, insert_user},
    errors::{RequestError, LOGIN_URL},
    models::User,
    templates::base_context,
    AppState,
};

use super::render;

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Only same-site absolute paths are honoured as a post-login destination.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

// ----------------- Registration Handlers -----------------

fn render_registration(
    state: &AppState,
    user: Option<&User>,
    form: &RegistrationForm,
    errors: &FieldErrors,
) -> Result<Response, RequestError> {
    let mut context = base_context(user);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "registration/registration_form.html", &context)
}

pub async fn registration_form(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, RequestError> {
    render_registration(
        &state,
        user.as_ref(),
        &RegistrationForm::default(),
        &FieldErrors::new(),
    )
}

pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, RequestError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_registration(&state, user.as_ref(), &form, &errors),
    };

    let password = hash_password_argon2(input.password.clone()).await?;
    let created = match insert_user(&state.pool, &input, &password, false).await {
        Ok(created) => created,
        Err(e) if e.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.insert(
                "username".to_owned(),
                "A user with that username already exists.".to_owned(),
            );
            return render_registration(&state, user.as_ref(), &form, &errors);
        }
        Err(e) => return Err(e),
    };
    tracing::info!(user_id = created.id, username = %created.username, "user registered");

    Ok(Redirect::to(LOGIN_URL).into_response())
}

// ----------------- Session Handlers -----------------

fn render_login(
    state: &AppState,
    form: &LoginForm,
    errors: &FieldErrors,
) -> Result<Response, RequestError> {
    let mut context = base_context(None);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "registration/login.html", &context)
}

pub async fn login_form(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, RequestError> {
    let form = LoginForm {
        next: query.next,
        ..Default::default()
    };
    render_login(&state, &form, &FieldErrors::new())
}

pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, RequestError> {
    let user = match get_user_by_username(&state.pool, form.username.trim()).await? {
        Some(user) => verify_password_argon2(form.password.clone(), &user.password)
            .await?
            .then_some(user),
        None => None,
    };
    let user = match user {
        Some(user) => user,
        None => {
            tracing::info!(username = %form.username, "failed login attempt");
            let mut errors = FieldErrors::new();
            errors.insert("credentials".to_owned(), INVALID_LOGIN.to_owned());
            return render_login(&state, &form, &errors);
        }
    };

    let token = get_jwt_token(user.id, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.id, username = %user.username, "user logged in");
    let next = safe_next(form.next.as_deref()).to_owned();
    Ok((jar.add(session_cookie(token)), Redirect::to(&next)).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    (jar.remove(expired_session_cookie()), Redirect::to("/")).into_response()
}
