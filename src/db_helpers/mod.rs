use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

mod category_helpers;
mod comment_helpers;
mod location_helpers;
mod post_helpers;
mod profile_helpers;
mod user_helpers;

pub use category_helpers::*;
pub use comment_helpers::*;
pub use location_helpers::*;
pub use post_helpers::*;
pub use profile_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password, is_staff, created_at";

// ----------------- Helper Functions -----------------

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
    let result = sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let result = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
