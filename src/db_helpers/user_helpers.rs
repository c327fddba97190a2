use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    data_formats::{ProfileForm, RegistrationInput, UserSummary},
    errors::RequestError,
    models::User,
};

use super::{get_user_by_id, USER_COLUMNS};

/// Inserts a new user. `password` must already be hashed.
pub async fn insert_user(
    pool: &SqlitePool,
    user: &RegistrationInput,
    password: &str,
    is_staff: bool,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        INSERT INTO users (username, email, password, is_staff, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        USER_COLUMNS
    );
    let user = sqlx::query_as::<_, User>(&query)
        .bind(&user.username)
        .bind(&user.email)
        .bind(password)
        .bind(is_staff)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn update_user_in_db(
    pool: &SqlitePool,
    id: i64,
    ProfileForm {
        username,
        email,
        first_name,
        last_name,
    }: &ProfileForm,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE users SET username = $1, email = $2, first_name = $3, last_name = $4
        WHERE id = $5
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    match get_user_by_id(pool, id).await? {
        Some(user) => Ok(user),
        None => Err(RequestError::NotFound),
    }
}

pub async fn set_user_staff_in_db(
    pool: &SqlitePool,
    id: i64,
    is_staff: bool,
) -> Result<(), RequestError> {
    sqlx::query("UPDATE users SET is_staff = $1 WHERE id = $2")
        .bind(is_staff)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes the user; their posts and comments go with them.
pub async fn delete_user_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_user_summaries_in_db(pool: &SqlitePool) -> Result<Vec<UserSummary>, RequestError> {
    let result = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT users.id AS id,
               users.username AS username,
               users.email AS email,
               users.is_staff AS is_staff,
               (SELECT COUNT(*) FROM posts WHERE posts.author_id = users.id) AS post_count
        FROM users
        ORDER BY users.username
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}
