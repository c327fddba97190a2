use chrono::Utc;
use sqlx::SqlitePool;

use crate::{data_formats::LocationForm, errors::RequestError, models::Location};

pub async fn get_location_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Location>, RequestError> {
    let result = sqlx::query_as::<_, Location>(
        "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

pub async fn list_locations_in_db(pool: &SqlitePool) -> Result<Vec<Location>, RequestError> {
    let result = sqlx::query_as::<_, Location>(
        "SELECT id, name, is_published, created_at FROM locations ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn create_location_in_db(
    pool: &SqlitePool,
    location: &LocationForm,
) -> Result<Location, RequestError> {
    let result = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (name, is_published, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, name, is_published, created_at
        "#,
    )
    .bind(&location.name)
    .bind(location.is_published)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(result)
}

pub async fn update_location_in_db(
    pool: &SqlitePool,
    id: i64,
    location: &LocationForm,
) -> Result<bool, RequestError> {
    let result = sqlx::query("UPDATE locations SET name = $1, is_published = $2 WHERE id = $3")
        .bind(&location.name)
        .bind(location.is_published)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the location. Posts that referenced it keep existing without one.
pub async fn delete_location_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
