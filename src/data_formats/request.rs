use std::collections::BTreeMap;

use axum::extract::Multipart;
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    errors::RequestError,
    media::UploadedImage,
    models::{Post, User},
};

pub const MAX_LENGTH_TITLE: usize = 256;
pub const MAX_LENGTH_NAME: usize = 256;
pub const MAX_LENGTH_SLUG: usize = 64;
pub const MAX_LENGTH_USERNAME: usize = 150;
pub const MIN_LENGTH_PASSWORD: usize = 8;

/// Format of `<input type="datetime-local">` values.
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

pub type FieldErrors = BTreeMap<String, String>;

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.is_some())
}

fn require(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field.to_owned(), REQUIRED.to_owned());
        return false;
    }
    true
}

fn check_max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.insert(
            field.to_owned(),
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, length
            ),
        );
    }
}

fn parse_choice(errors: &mut FieldErrors, field: &str, value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.insert(field.to_owned(), INVALID_CHOICE.to_owned());
            None
        }
    }
}

/// Years the database can order correctly: timestamps are stored as
/// RFC 3339 text, which only sorts chronologically for four digit years.
const DATETIME_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub fn parse_datetime_input(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .filter(|naive| DATETIME_YEARS.contains(&naive.year()))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_datetime_input(value: &DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

// ----------------- Post Form -----------------

/// Raw post form fields as submitted, kept as strings so the form can be
/// re-rendered unchanged when validation fails.
#[derive(Serialize, Debug, Default, Clone)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    pub is_published: bool,
    pub image_clear: bool,
    pub current_image: Option<String>,
    #[serde(skip)]
    pub image: Option<UploadedImage>,
}

#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
}

impl PostForm {
    pub fn blank(now: DateTime<Utc>) -> Self {
        PostForm {
            pub_date: format_datetime_input(&now),
            is_published: true,
            ..Default::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        PostForm {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(&post.pub_date),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
            image_clear: false,
            current_image: post.image.clone(),
            image: None,
        }
    }

    /// Reads a `multipart/form-data` submission. Unchecked checkboxes are
    /// simply absent from the body, so they default to false here.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, RequestError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "title" => form.title = field.text().await?,
                "text" => form.text = field.text().await?,
                "pub_date" => form.pub_date = field.text().await?,
                "location" => form.location = field.text().await?,
                "category" => form.category = field.text().await?,
                "is_published" => form.is_published = true,
                "image_clear" => form.image_clear = true,
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.image = Some(UploadedImage {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                other => tracing::debug!(field = other, "ignoring unknown post form field"),
            }
        }
        Ok(form)
    }

    pub fn validate(&self) -> Result<PostInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        if require(&mut errors, "title", &self.title) {
            check_max_length(&mut errors, "title", self.title.trim(), MAX_LENGTH_TITLE);
        }
        require(&mut errors, "text", &self.text);

        let pub_date = if require(&mut errors, "pub_date", &self.pub_date) {
            let parsed = parse_datetime_input(&self.pub_date);
            if parsed.is_none() {
                errors.insert("pub_date".to_owned(), "Enter a valid date/time.".to_owned());
            }
            parsed
        } else {
            None
        };

        let category_id = if require(&mut errors, "category", &self.category) {
            parse_choice(&mut errors, "category", &self.category)
        } else {
            None
        };
        let location_id = parse_choice(&mut errors, "location", &self.location);

        if let Some(image) = &self.image {
            if image.extension().is_none() {
                errors.insert(
                    "image".to_owned(),
                    "Upload a valid image. Allowed extensions: jpg, jpeg, png, gif, webp.".to_owned(),
                );
            } else if !image.is_readable_image() {
                errors.insert("image".to_owned(), INVALID_IMAGE.to_owned());
            }
        }

        match (errors.is_empty(), pub_date) {
            (true, Some(pub_date)) => Ok(PostInput {
                title: self.title.trim().to_owned(),
                text: self.text.clone(),
                pub_date,
                location_id,
                category_id,
                is_published: self.is_published,
            }),
            _ => Err(errors),
        }
    }
}

// ----------------- Comment Form -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        if require(&mut errors, "text", &self.text) {
            Ok(self.text.trim().to_owned())
        } else {
            Err(errors)
        }
    }
}

// ----------------- User Forms -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        ProfileForm {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }

    pub fn validate(&self) -> Result<ProfileForm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let cleaned = ProfileForm {
            username: self.username.trim().to_owned(),
            email: self.email.trim().to_owned(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
        };
        validate_username(&mut errors, &cleaned.username);
        validate_optional_email(&mut errors, &cleaned.email);
        check_max_length(&mut errors, "first_name", &cleaned.first_name, MAX_LENGTH_USERNAME);
        check_max_length(&mut errors, "last_name", &cleaned.last_name, MAX_LENGTH_USERNAME);
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

fn validate_username(errors: &mut FieldErrors, username: &str) {
    if !require(errors, "username", username) {
        return;
    }
    if !is_valid_username(username) {
        errors.insert(
            "username".to_owned(),
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_owned(),
        );
        return;
    }
    check_max_length(errors, "username", username, MAX_LENGTH_USERNAME);
}

fn validate_optional_email(errors: &mut FieldErrors, email: &str) {
    if !email.is_empty() && !is_valid_email(email) {
        errors.insert("email".to_owned(), "Enter a valid email address.".to_owned());
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegistrationInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim().to_owned();
        let email = self.email.trim().to_owned();
        validate_username(&mut errors, &username);
        validate_optional_email(&mut errors, &email);

        if require(&mut errors, "password1", &self.password1) {
            if self.password1.chars().count() < MIN_LENGTH_PASSWORD {
                errors.insert(
                    "password1".to_owned(),
                    format!(
                        "This password is too short. It must contain at least {} characters.",
                        MIN_LENGTH_PASSWORD
                    ),
                );
            } else if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.insert(
                    "password1".to_owned(),
                    "This password is entirely numeric.".to_owned(),
                );
            }
        }
        if require(&mut errors, "password2", &self.password2) && self.password1 != self.password2 {
            errors.insert(
                "password2".to_owned(),
                "The two password fields didn't match.".to_owned(),
            );
        }

        if errors.is_empty() {
            Ok(RegistrationInput {
                username,
                email,
                password: self.password1.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}

// ----------------- Admin Forms -----------------

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CategoryForm {
    pub title: String,
    pub description: String,
    pub slug: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_published: bool,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<CategoryForm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let cleaned = CategoryForm {
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            slug: self.slug.trim().to_owned(),
            is_published: self.is_published,
        };
        if require(&mut errors, "title", &cleaned.title) {
            check_max_length(&mut errors, "title", &cleaned.title, MAX_LENGTH_TITLE);
        }
        require(&mut errors, "description", &cleaned.description);
        if require(&mut errors, "slug", &cleaned.slug) {
            if !is_valid_slug(&cleaned.slug) {
                errors.insert(
                    "slug".to_owned(),
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
                        .to_owned(),
                );
            } else {
                check_max_length(&mut errors, "slug", &cleaned.slug, MAX_LENGTH_SLUG);
            }
        }
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LocationForm {
    pub name: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_published: bool,
}

impl LocationForm {
    pub fn validate(&self) -> Result<LocationForm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim().to_owned();
        if require(&mut errors, "name", &name) {
            check_max_length(&mut errors, "name", &name, MAX_LENGTH_NAME);
        }
        if errors.is_empty() {
            Ok(LocationForm {
                name,
                is_published: self.is_published,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PostModerationForm {
    pub title: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_published: bool,
}

impl PostModerationForm {
    pub fn validate(&self) -> Result<PostModerationForm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = self.title.trim().to_owned();
        if require(&mut errors, "title", &title) {
            check_max_length(&mut errors, "title", &title, MAX_LENGTH_TITLE);
        }
        if errors.is_empty() {
            Ok(PostModerationForm {
                title,
                is_published: self.is_published,
            })
        } else {
            Err(errors)
        }
    }
}

/// Body of the admin add and change forms, covering the fields of every
/// editable model. Each model reads the fields it owns.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdminForm {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub name: String,
    #[serde(deserialize_with = "checkbox")]
    pub is_published: bool,
}

impl AdminForm {
    pub fn blank() -> Self {
        AdminForm {
            is_published: true,
            ..Default::default()
        }
    }

    pub fn text(&self, field: &str) -> &str {
        match field {
            "title" => &self.title,
            "description" => &self.description,
            "slug" => &self.slug,
            "name" => &self.name,
            _ => "",
        }
    }

    pub fn checked(&self, field: &str) -> bool {
        field == "is_published" && self.is_published
    }
}

impl From<&AdminForm> for CategoryForm {
    fn from(form: &AdminForm) -> Self {
        CategoryForm {
            title: form.title.clone(),
            description: form.description.clone(),
            slug: form.slug.clone(),
            is_published: form.is_published,
        }
    }
}

impl From<&AdminForm> for LocationForm {
    fn from(form: &AdminForm) -> Self {
        LocationForm {
            name: form.name.clone(),
            is_published: form.is_published,
        }
    }
}

impl From<&AdminForm> for PostModerationForm {
    fn from(form: &AdminForm) -> Self {
        PostModerationForm {
            title: form.title.clone(),
            is_published: form.is_published,
        }
    }
}
