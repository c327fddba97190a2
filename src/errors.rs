use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Not Found")]
    NotFound,
    #[error("Login required to access {0}")]
    LoginRequired(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("Malformed form upload: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ServerError(#[from] anyhow::Error),
}

impl RequestError {
    /// True when the underlying database error is a UNIQUE or PRIMARY KEY
    /// constraint violation (SQLite extended codes 2067 and 1555).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                matches!(e.code().as_deref(), Some("2067") | Some("1555"))
            }
            _ => false,
        }
    }
}

pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?next={}",
        LOGIN_URL,
        urlencoding::encode(next)
    ))
}

fn error_page(status: StatusCode, title: &str) -> Response {
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"><title>{code} {title}</title></head>
<body><h1>{code}</h1><p>{title}</p><p><a href="/">Back to the main page</a></p></body></html>"#,
        code = status.as_u16(),
        title = title,
    );
    (status, Html(body)).into_response()
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::NotFound => error_page(StatusCode::NOT_FOUND, "Page not found"),
            RequestError::LoginRequired(next) => login_redirect(&next).into_response(),
            RequestError::Forbidden => error_page(StatusCode::FORBIDDEN, "Access denied"),
            RequestError::MultipartError(ref e) => {
                tracing::warn!(error = %e, "rejected multipart body");
                error_page(StatusCode::BAD_REQUEST, "Bad Request")
            }
            RequestError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "database error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RequestError::TemplateError(ref e) => {
                tracing::error!(error = ?e, "failed to render template");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RequestError::IoError(ref e) => {
                tracing::error!(error = %e, "io error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RequestError::ServerError(ref e) => {
                tracing::error!(error = ?e, "server error");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}
