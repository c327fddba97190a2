use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    data_formats::{Page, PageWindow, PostCard, PostInput, PostModerationForm},
    errors::RequestError,
    models::Post,
};

const POST_CARD_QUERY: &str = r#"
            SELECT posts.id                    AS "id",
                   posts.title                 AS "title",
                   posts.text                  AS "text",
                   posts.image                 AS "image",
                   posts.pub_date              AS "pub_date",
                   posts.is_published          AS "is_published",
                   posts.created_at            AS "created_at",
                   posts.author_id             AS "author_id",
                   users.username              AS "author_username",
                   posts.category_id           AS "category_id",
                   categories.title            AS "category_title",
                   categories.slug             AS "category_slug",
                   categories.is_published     AS "category_is_published",
                   locations.name              AS "location_name",
                   locations.is_published      AS "location_is_published",
                   (SELECT Count(*)
                    FROM   comments
                    WHERE  comments.post_id = posts.id) AS "comment_count"
            FROM   posts
                JOIN users
                    ON users.id = posts.author_id
                LEFT JOIN categories
                    ON categories.id = posts.category_id
                LEFT JOIN locations
                    ON locations.id = posts.location_id
"#;

const POST_FILTER: &str = r#"
            WHERE  ( $1 = 0
                     OR ( posts.is_published = 1
                          AND posts.pub_date <= $2
                          AND categories.is_published = 1 ) )
                AND ( posts.category_id = $3
                      OR $3 IS NULL )
                AND ( posts.author_id = $4
                      OR $4 IS NULL )
"#;

const POST_COLUMNS: &str = "id, title, text, image, pub_date, author_id, location_id, category_id, is_published, created_at";

/// Which posts a listing shows.
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub now: DateTime<Utc>,
    /// Restrict to published, already due posts in published categories.
    pub only_visible: bool,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl PostFilter {
    pub fn visible(now: DateTime<Utc>) -> Self {
        PostFilter {
            now,
            only_visible: true,
            category_id: None,
            author_id: None,
        }
    }
}

/// One page of posts, newest publication date first, each annotated with its
/// comment count.
pub async fn list_posts_in_db(
    pool: &SqlitePool,
    filter: &PostFilter,
    page: Option<&str>,
    page_size: i64,
) -> Result<Page<PostCard>, RequestError> {
    let mut tx = pool.begin().await?;

    let count_query = format!(
        r#"
            SELECT Count(*)
            FROM   posts
                LEFT JOIN categories
                    ON categories.id = posts.category_id
            {}
        "#,
        POST_FILTER
    );
    let total = sqlx::query_scalar::<_, i64>(&count_query)
        .bind(filter.only_visible)
        .bind(filter.now)
        .bind(filter.category_id)
        .bind(filter.author_id)
        .fetch_one(&mut tx)
        .await?;

    let window = PageWindow::resolve(page, total, page_size);
    let list_query = format!(
        "{} {} ORDER BY posts.pub_date DESC, posts.id DESC LIMIT $5 OFFSET $6",
        POST_CARD_QUERY, POST_FILTER
    );
    let posts = sqlx::query_as::<_, PostCard>(&list_query)
        .bind(filter.only_visible)
        .bind(filter.now)
        .bind(filter.category_id)
        .bind(filter.author_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;

    Ok(Page::new(posts, window, total))
}

/// Every post regardless of visibility, for the admin list.
pub async fn list_all_post_cards_in_db(pool: &SqlitePool) -> Result<Vec<PostCard>, RequestError> {
    let query = format!(
        "{} ORDER BY posts.pub_date DESC, posts.id DESC",
        POST_CARD_QUERY
    );
    let posts = sqlx::query_as::<_, PostCard>(&query)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn get_post_card_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<PostCard>, RequestError> {
    let query = format!("{} WHERE posts.id = $1", POST_CARD_QUERY);
    let result = sqlx::query_as::<_, PostCard>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_post_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
    let result = sqlx::query_as::<_, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post: &PostInput,
    image: Option<&str>,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        INSERT INTO posts (title, text, image, pub_date, author_id, location_id, category_id, is_published, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        POST_COLUMNS
    );
    let result = sqlx::query_as::<_, Post>(&query)
        .bind(&post.title)
        .bind(&post.text)
        .bind(image)
        .bind(post.pub_date)
        .bind(author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(post.is_published)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    post: &PostInput,
    image: Option<&str>,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE posts
        SET title = $1, text = $2, image = $3, pub_date = $4,
            location_id = $5, category_id = $6, is_published = $7
        WHERE id = $8
        "#,
    )
    .bind(&post.title)
    .bind(&post.text)
    .bind(image)
    .bind(post.pub_date)
    .bind(post.location_id)
    .bind(post.category_id)
    .bind(post.is_published)
    .bind(id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Changes only what the admin moderates: the title and the published flag.
pub async fn moderate_post_in_db(
    pool: &SqlitePool,
    id: i64,
    post: &PostModerationForm,
) -> Result<bool, RequestError> {
    let result = sqlx::query("UPDATE posts SET title = $1, is_published = $2 WHERE id = $3")
        .bind(&post.title)
        .bind(post.is_published)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the post and, through the foreign key, its comments.
pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
