mod admin;
mod authentication;
mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod media;
mod models;
mod templates;

use std::{net::TcpListener, path::Path, str::FromStr, sync::Arc};

use anyhow::Context;
pub use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::*, Extension, Router};
use handlers::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use admin::{blog_admin_site, AdminSite};
pub use config::{default_template_dir, Config};
pub use data_formats::{FieldErrors, RegistrationForm};
pub use errors::RequestError;
pub use models::User;
pub use templates::Templates;

/// Upper bound for request bodies, which mostly matters for post images.
const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Everything a handler needs, shared read-only between requests.
pub struct AppState {
    pub pool: SqlitePool,
    pub templates: Templates,
    pub config: Config,
    pub admin: AdminSite,
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let options = SqliteConnectOptions::from_str(db_url)
        .context("Invalid DATABASE_URL")?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to connect to the database")?;
    tracing::debug!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::debug!("migrations completed");
    Ok(pool)
}

pub fn make_router(media_dir: &Path) -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/", get(index))
        .route("/category/:slug/", get(category_posts))
        .route("/posts/create/", get(create_post_form).post(create_post))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(edit_post_form).post(edit_post))
        .route(
            "/posts/:post_id/delete/",
            get(delete_post_form).post(delete_post),
        )
        .route("/posts/:post_id/comment/", post(add_comment))
        .route(
            "/posts/:post_id/edit_comment/:comment_id/",
            get(edit_comment_form).post(edit_comment),
        )
        .route(
            "/posts/:post_id/delete_comment/:comment_id/",
            get(delete_comment_form).post(delete_comment),
        )
        .route("/profile/edit/", get(edit_profile_form).post(edit_profile))
        .route("/profile/:username/", get(profile))
        .route(
            "/auth/registration/",
            get(registration_form).post(register),
        )
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", post(logout))
        .route("/admin/", get(admin_index))
        .route("/admin/:model/", get(admin_model_list))
        .route("/admin/:model/add/", get(admin_add_form).post(admin_add))
        .route(
            "/admin/:model/:id/change/",
            get(admin_change_form).post(admin_change),
        )
        .route("/admin/:model/:id/delete/", post(admin_delete))
        .nest_service("/media", ServeDir::new(media_dir))
        .fallback(not_found)
}

/// Connects the database, loads templates and wires the router with its layers.
pub async fn build_app(config: Config) -> Result<Router> {
    let pool = init_db(&config.database_url).await?;
    let templates = Templates::new(&config.template_dir)?;
    tokio::fs::create_dir_all(&config.media_dir)
        .await
        .with_context(|| format!("Failed to create media dir {}", config.media_dir.display()))?;

    let router = make_router(&config.media_dir);
    let state = Arc::new(AppState {
        pool,
        templates,
        config,
        admin: blog_admin_site(),
    });
    Ok(router
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http()))
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn run_app(config: Config) -> Result<()> {
    let address = config.server_addr;
    let app = build_app(config).await?;
    let listener =
        TcpListener::bind(address).with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(%address, "server started");
    serve(listener, app).await
}

/// Creates a staff account, or promotes the existing user with that username.
pub async fn create_staff_user(
    pool: &SqlitePool,
    form: &RegistrationForm,
) -> std::result::Result<std::result::Result<User, FieldErrors>, RequestError> {
    if let Some(user) = db_helpers::get_user_by_username(pool, form.username.trim()).await? {
        db_helpers::set_user_staff_in_db(pool, user.id, true).await?;
        tracing::info!(username = %user.username, "promoted existing user to staff");
        return Ok(Ok(User {
            is_staff: true,
            ..user
        }));
    }
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(Err(errors)),
    };
    let password = authentication::hash_password_argon2(input.password.clone()).await?;
    let user = db_helpers::insert_user(pool, &input, &password, true).await?;
    tracing::info!(username = %user.username, "created staff user");
    Ok(Ok(user))
}
