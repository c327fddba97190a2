use chrono::Utc;
use sqlx::SqlitePool;

use crate::{data_formats::CommentView, errors::RequestError, models::Comment};

const COMMENT_VIEW_QUERY: &str = r#"
        SELECT comments.id         AS "id",
               comments.text       AS "text",
               comments.post_id    AS "post_id",
               posts.title         AS "post_title",
               comments.author_id  AS "author_id",
               users.username      AS "author_username",
               comments.created_at AS "created_at"
        FROM   comments
            JOIN users
                ON users.id = comments.author_id
            JOIN posts
                ON posts.id = comments.post_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (text, post_id, author_id, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, text, post_id, author_id, created_at
        "#,
    )
    .bind(text)
    .bind(post_id)
    .bind(author_id)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    Ok(result)
}

/// Looks a comment up by id, but only if it belongs to the given post.
pub async fn get_comment_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
    comment_id: i64,
) -> Result<Option<Comment>, RequestError> {
    let result = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, text, post_id, author_id, created_at
        FROM comments
        WHERE post_id = $1 AND id = $2
        "#,
    )
    .bind(post_id)
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

/// Comments of a post in the order they were written.
pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<CommentView>, RequestError> {
    let query = format!(
        "{} WHERE comments.post_id = $1 ORDER BY comments.created_at ASC, comments.id ASC",
        COMMENT_VIEW_QUERY
    );
    let result = sqlx::query_as::<_, CommentView>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn list_all_comments_in_db(pool: &SqlitePool) -> Result<Vec<CommentView>, RequestError> {
    let query = format!(
        "{} ORDER BY comments.created_at DESC, comments.id DESC",
        COMMENT_VIEW_QUERY
    );
    let result = sqlx::query_as::<_, CommentView>(&query)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn update_comment_in_db(
    pool: &SqlitePool,
    comment_id: i64,
    text: &str,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE comments SET text = $1 WHERE id = $2")
        .bind(text)
        .bind(comment_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn delete_comment_in_db(pool: &SqlitePool, comment_id: i64) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
