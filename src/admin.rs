//! Staff-only model admin.
//!
//! Every model exposed in the admin registers a [`ModelAdmin`] with the
//! [`AdminSite`]. A registration names the list columns and knows how to turn
//! its records into rows of display cells and how to delete a record. Models
//! that declare form fields also get add and change pages.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    data_formats::{
        AdminForm, CategoryForm, CommentView, FieldErrors, LocationForm, PostCard,
        PostModerationForm, UserSummary,
    },
    db_helpers::{
        create_category_in_db, create_location_in_db, delete_category_in_db,
        delete_comment_in_db, delete_location_in_db, delete_post_in_db, delete_user_in_db,
        get_category_by_id_in_db, get_location_by_id_in_db, get_post_in_db,
        list_all_comments_in_db, list_all_post_cards_in_db, list_categories_in_db,
        list_locations_in_db, list_user_summaries_in_db, moderate_post_in_db,
        update_category_in_db, update_location_in_db,
    },
    errors::RequestError,
    models::{Category, Location, Post},
};

pub const NO_IMAGE: &str = "No image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AdminCell {
    Text(String),
    Image(String),
}

impl AdminCell {
    fn text(value: impl ToString) -> Self {
        AdminCell::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminRow {
    pub id: i64,
    pub cells: Vec<AdminCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminWidget {
    Text,
    Textarea,
    Checkbox,
}

/// One input of an admin add/change form. `name` is the matching
/// [`AdminForm`] field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: AdminWidget,
    pub help: Option<&'static str>,
}

const fn field(name: &'static str, label: &'static str, widget: AdminWidget) -> AdminField {
    AdminField {
        name,
        label,
        widget,
        help: None,
    }
}

const PUBLISHED: AdminField = field("is_published", "Published", AdminWidget::Checkbox);

/// A field together with the value and error the form page shows for it.
#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    #[serde(flatten)]
    pub field: AdminField,
    pub value: String,
    pub checked: bool,
    pub error: Option<String>,
}

pub fn bind_fields(fields: &[AdminField], form: &AdminForm, errors: &FieldErrors) -> Vec<BoundField> {
    fields
        .iter()
        .map(|field| BoundField {
            field: *field,
            value: form.text(field.name).to_owned(),
            checked: form.checked(field.name),
            error: errors.get(field.name).cloned(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminModelInfo {
    pub slug: &'static str,
    pub title: &'static str,
    pub can_add: bool,
    pub can_change: bool,
}

#[axum::async_trait]
pub trait ModelAdmin: Send + Sync {
    /// URL segment under `/admin/`.
    fn slug(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn columns(&self) -> &'static [&'static str];
    /// Inputs of the add and change forms. No fields means no forms.
    fn fields(&self) -> &'static [AdminField] {
        &[]
    }
    /// Whether `/admin/<slug>/add/` has a form for this model.
    fn can_add(&self) -> bool {
        false
    }
    /// Whether `/admin/<slug>/<id>/change/` has a form for this model.
    fn can_change(&self) -> bool {
        !self.fields().is_empty()
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError>;
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError>;
    /// The change form filled from the stored record, `None` if it is gone.
    async fn initial(&self, _pool: &SqlitePool, _id: i64) -> Result<Option<AdminForm>, RequestError> {
        Ok(None)
    }
    /// Creates (`id` is `None`) or updates a record. Validation problems come
    /// back as field errors for the form page.
    async fn save(
        &self,
        _pool: &SqlitePool,
        _id: Option<i64>,
        _form: &AdminForm,
    ) -> Result<Result<(), FieldErrors>, RequestError> {
        Err(RequestError::NotFound)
    }
}

#[derive(Default)]
pub struct AdminSite {
    models: Vec<Box<dyn ModelAdmin>>,
}

impl AdminSite {
    pub fn register(mut self, model: impl ModelAdmin + 'static) -> Self {
        self.models.push(Box::new(model));
        self
    }

    pub fn get(&self, slug: &str) -> Option<&dyn ModelAdmin> {
        self.models
            .iter()
            .find(|model| model.slug() == slug)
            .map(|model| model.as_ref())
    }

    pub fn models(&self) -> Vec<AdminModelInfo> {
        self.models
            .iter()
            .map(|model| AdminModelInfo {
                slug: model.slug(),
                title: model.title(),
                can_add: model.can_add(),
                can_change: model.can_change(),
            })
            .collect()
    }
}

/// The admin site with every blog model registered.
pub fn blog_admin_site() -> AdminSite {
    AdminSite::default()
        .register(UserAdmin)
        .register(LocationAdmin)
        .register(CategoryAdmin)
        .register(PostAdmin)
        .register(CommentAdmin)
}

// ----------------- Registrations -----------------

pub struct UserAdmin;
pub struct LocationAdmin;
pub struct CategoryAdmin;
pub struct PostAdmin;
pub struct CommentAdmin;

const DUPLICATE_SLUG: &str = "Category with this slug already exists.";

fn location_form(location: &Location) -> AdminForm {
    AdminForm {
        name: location.name.clone(),
        is_published: location.is_published,
        ..Default::default()
    }
}

fn category_form(category: &Category) -> AdminForm {
    AdminForm {
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
        is_published: category.is_published,
        ..Default::default()
    }
}

fn post_form(post: &Post) -> AdminForm {
    AdminForm {
        title: post.title.clone(),
        is_published: post.is_published,
        ..Default::default()
    }
}

pub fn user_row(user: &UserSummary) -> AdminRow {
    AdminRow {
        id: user.id,
        cells: vec![
            AdminCell::text(&user.username),
            AdminCell::text(&user.email),
            AdminCell::text(user.post_count),
        ],
    }
}

pub fn location_row(location: &Location) -> AdminRow {
    AdminRow {
        id: location.id,
        cells: vec![AdminCell::text(&location.name)],
    }
}

pub fn category_row(category: &Category) -> AdminRow {
    AdminRow {
        id: category.id,
        cells: vec![
            AdminCell::text(&category.title),
            AdminCell::text(&category.slug),
            AdminCell::text(if category.is_published { "yes" } else { "no" }),
        ],
    }
}

pub fn post_row(post: &PostCard) -> AdminRow {
    let image = match &post.image {
        Some(path) => AdminCell::Image(format!("/media/{}", path)),
        None => AdminCell::text(NO_IMAGE),
    };
    AdminRow {
        id: post.id,
        cells: vec![
            AdminCell::text(&post.title),
            AdminCell::text(&post.author_username),
            AdminCell::text(post.category_title.as_deref().unwrap_or("-")),
            AdminCell::text(post.comment_count),
            image,
        ],
    }
}

pub fn comment_row(comment: &CommentView) -> AdminRow {
    AdminRow {
        id: comment.id,
        cells: vec![
            AdminCell::text(&comment.post_title),
            AdminCell::text(&comment.author_username),
            AdminCell::text(comment.created_at.format("%Y-%m-%d %H:%M")),
        ],
    }
}

#[axum::async_trait]
impl ModelAdmin for UserAdmin {
    fn slug(&self) -> &'static str {
        "user"
    }
    fn title(&self) -> &'static str {
        "Users"
    }
    fn columns(&self) -> &'static [&'static str] {
        &["Username", "Email", "Number of posts"]
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError> {
        let users = list_user_summaries_in_db(pool).await?;
        Ok(users.iter().map(user_row).collect())
    }
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
        delete_user_in_db(pool, id).await
    }
}

#[axum::async_trait]
impl ModelAdmin for LocationAdmin {
    fn slug(&self) -> &'static str {
        "location"
    }
    fn title(&self) -> &'static str {
        "Locations"
    }
    fn columns(&self) -> &'static [&'static str] {
        &["Name"]
    }
    fn fields(&self) -> &'static [AdminField] {
        const FIELDS: &[AdminField] = &[field("name", "Name", AdminWidget::Text), PUBLISHED];
        FIELDS
    }
    fn can_add(&self) -> bool {
        true
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError> {
        let locations = list_locations_in_db(pool).await?;
        Ok(locations.iter().map(location_row).collect())
    }
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
        delete_location_in_db(pool, id).await
    }
    async fn initial(&self, pool: &SqlitePool, id: i64) -> Result<Option<AdminForm>, RequestError> {
        Ok(get_location_by_id_in_db(pool, id).await?.as_ref().map(location_form))
    }
    async fn save(
        &self,
        pool: &SqlitePool,
        id: Option<i64>,
        form: &AdminForm,
    ) -> Result<Result<(), FieldErrors>, RequestError> {
        let cleaned = match LocationForm::from(form).validate() {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(Err(errors)),
        };
        match id {
            None => {
                create_location_in_db(pool, &cleaned).await?;
            }
            Some(id) => {
                if !update_location_in_db(pool, id, &cleaned).await? {
                    return Err(RequestError::NotFound);
                }
            }
        }
        Ok(Ok(()))
    }
}

#[axum::async_trait]
impl ModelAdmin for CategoryAdmin {
    fn slug(&self) -> &'static str {
        "category"
    }
    fn title(&self) -> &'static str {
        "Categories"
    }
    fn columns(&self) -> &'static [&'static str] {
        &["Title", "Slug", "Published"]
    }
    fn fields(&self) -> &'static [AdminField] {
        const FIELDS: &[AdminField] = &[
            field("title", "Title", AdminWidget::Text),
            field("description", "Description", AdminWidget::Textarea),
            AdminField {
                help: Some("Latin letters, digits, hyphens and underscores."),
                ..field("slug", "Slug", AdminWidget::Text)
            },
            PUBLISHED,
        ];
        FIELDS
    }
    fn can_add(&self) -> bool {
        true
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError> {
        let categories = list_categories_in_db(pool).await?;
        Ok(categories.iter().map(category_row).collect())
    }
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
        delete_category_in_db(pool, id).await
    }
    async fn initial(&self, pool: &SqlitePool, id: i64) -> Result<Option<AdminForm>, RequestError> {
        Ok(get_category_by_id_in_db(pool, id).await?.as_ref().map(category_form))
    }
    async fn save(
        &self,
        pool: &SqlitePool,
        id: Option<i64>,
        form: &AdminForm,
    ) -> Result<Result<(), FieldErrors>, RequestError> {
        let cleaned = match CategoryForm::from(form).validate() {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(Err(errors)),
        };
        let saved = match id {
            None => create_category_in_db(pool, &cleaned).await.map(|_| true),
            Some(id) => update_category_in_db(pool, id, &cleaned).await,
        };
        match saved {
            Ok(true) => Ok(Ok(())),
            Ok(false) => Err(RequestError::NotFound),
            Err(e) if e.is_unique_violation() => {
                let mut errors = FieldErrors::new();
                errors.insert("slug".to_owned(), DUPLICATE_SLUG.to_owned());
                Ok(Err(errors))
            }
            Err(e) => Err(e),
        }
    }
}

#[axum::async_trait]
impl ModelAdmin for PostAdmin {
    fn slug(&self) -> &'static str {
        "post"
    }
    fn title(&self) -> &'static str {
        "Posts"
    }
    fn columns(&self) -> &'static [&'static str] {
        &["Title", "Author", "Category", "Number of comments", "Image"]
    }
    fn fields(&self) -> &'static [AdminField] {
        const FIELDS: &[AdminField] = &[field("title", "Title", AdminWidget::Text), PUBLISHED];
        FIELDS
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError> {
        let posts = list_all_post_cards_in_db(pool).await?;
        Ok(posts.iter().map(post_row).collect())
    }
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
        delete_post_in_db(pool, id).await
    }
    async fn initial(&self, pool: &SqlitePool, id: i64) -> Result<Option<AdminForm>, RequestError> {
        Ok(get_post_in_db(pool, id).await?.as_ref().map(post_form))
    }
    /// Posts are written by their authors. The admin only moderates them.
    async fn save(
        &self,
        pool: &SqlitePool,
        id: Option<i64>,
        form: &AdminForm,
    ) -> Result<Result<(), FieldErrors>, RequestError> {
        let id = id.ok_or(RequestError::NotFound)?;
        let cleaned = match PostModerationForm::from(form).validate() {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(Err(errors)),
        };
        if !moderate_post_in_db(pool, id, &cleaned).await? {
            return Err(RequestError::NotFound);
        }
        Ok(Ok(()))
    }
}

#[axum::async_trait]
impl ModelAdmin for CommentAdmin {
    fn slug(&self) -> &'static str {
        "comment"
    }
    fn title(&self) -> &'static str {
        "Comments"
    }
    fn columns(&self) -> &'static [&'static str] {
        &["Post", "Author", "Added"]
    }
    async fn rows(&self, pool: &SqlitePool) -> Result<Vec<AdminRow>, RequestError> {
        let comments = list_all_comments_in_db(pool).await?;
        Ok(comments.iter().map(comment_row).collect())
    }
    async fn delete(&self, pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
        delete_comment_in_db(pool, id).await
    }
}
