use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    data_formats::{Page, PostCard},
    errors::RequestError,
    models::User,
};

use super::{get_user_by_username, list_posts_in_db, PostFilter};

/// Loads a profile page: the user and one page of their posts.
///
/// The owner sees every post they wrote, everybody else only the visible ones.
pub async fn get_profile_from_db(
    pool: &SqlitePool,
    viewer_id: Option<i64>,
    username: &str,
    now: DateTime<Utc>,
    page: Option<&str>,
    page_size: i64,
) -> Result<(User, Page<PostCard>), RequestError> {
    let profile = match get_user_by_username(pool, username).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound),
    };
    let filter = PostFilter {
        author_id: Some(profile.id),
        only_visible: viewer_id != Some(profile.id),
        ..PostFilter::visible(now)
    };
    let posts = list_posts_in_db(pool, &filter, page, page_size).await?;
    Ok((profile, posts))
}
