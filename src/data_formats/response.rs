use chrono::{DateTime, Utc};
use serde::Serialize;

/// A post joined with everything a listing or detail page shows about it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,
    pub comment_count: i64,
}

impl PostCard {
    /// Published, not scheduled for the future, and filed under a published category.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.pub_date <= now && self.category_is_published == Some(true)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub post_id: i64,
    pub post_title: String,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// User row for the admin list, with the number of posts they authored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub post_count: i64,
}
