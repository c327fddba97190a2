use chrono::Utc;
use sqlx::SqlitePool;

use crate::{data_formats::CategoryForm, errors::RequestError, models::Category};

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

pub async fn get_published_category_by_slug_in_db(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Category>, RequestError> {
    let query = format!(
        "SELECT {} FROM categories WHERE slug = $1 AND is_published = 1",
        CATEGORY_COLUMNS
    );
    let result = sqlx::query_as::<_, Category>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_category_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Category>, RequestError> {
    let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
    let result = sqlx::query_as::<_, Category>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let query = format!("SELECT {} FROM categories ORDER BY title", CATEGORY_COLUMNS);
    let result = sqlx::query_as::<_, Category>(&query)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn create_category_in_db(
    pool: &SqlitePool,
    CategoryForm {
        title,
        description,
        slug,
        is_published,
    }: &CategoryForm,
) -> Result<Category, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        INSERT INTO categories (title, description, slug, is_published, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        CATEGORY_COLUMNS
    );
    let result = sqlx::query_as::<_, Category>(&query)
        .bind(title)
        .bind(description)
        .bind(slug)
        .bind(is_published)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn update_category_in_db(
    pool: &SqlitePool,
    id: i64,
    CategoryForm {
        title,
        description,
        slug,
        is_published,
    }: &CategoryForm,
) -> Result<bool, RequestError> {
    let result = sqlx::query(
        r#"
        UPDATE categories
        SET title = $1, description = $2, slug = $3, is_published = $4
        WHERE id = $5
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(slug)
    .bind(is_published)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the category. Its posts survive with the category cleared.
pub async fn delete_category_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
