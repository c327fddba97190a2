use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{db_helpers::get_user_by_id, errors::RequestError, models::User, AppState};

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(14);
pub const TOKEN_COOKIE: &str = "blogicum_token";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// The visitor, if their cookie carries a valid token for an existing user.
pub struct MaybeUser(pub Option<User>);

/// A logged in user. Anonymous visitors are redirected to the login page.
pub struct AuthUser(pub User);

/// A logged in staff user. Other users get 403.
pub struct StaffUser(pub User);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

fn app_state(parts: &Parts) -> Result<Arc<AppState>, RequestError> {
    parts
        .extensions
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| RequestError::ServerError(anyhow::anyhow!("AppState extension missing")))
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| parts.uri.path().to_owned())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(TOKEN_COOKIE) {
            Some(cookie) => cookie.value().to_owned(),
            None => return Ok(MaybeUser(None)),
        };

        let id = match verify_jwt_token(&token, &state.config.jwt_secret) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid session token");
                return Ok(MaybeUser(None));
            }
        };

        Ok(MaybeUser(get_user_by_id(&state.pool, id).await?))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(AuthUser(user)),
            MaybeUser(None) => Err(RequestError::LoginRequired(requested_path(parts))),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            tracing::warn!(user = %user.username, "non-staff user tried to open the admin");
            return Err(RequestError::Forbidden);
        }
        Ok(StaffUser(user))
    }
}

pub fn get_jwt_token(id: i64, jwt_secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<i64> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .context("Error verifying token")?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        anyhow::bail!("Token expired");
    }
    Ok(claim.id)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(JWT_EXPIRY_DURATION)
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, "").path("/").finish()
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
