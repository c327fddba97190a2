#![allow(dead_code)]

use std::{
    net::TcpListener,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use blogicum::{build_app, default_template_dir, init_db, serve, Config};
use chrono::{DateTime, Duration, Utc};
use reqwest::{header::LOCATION, redirect::Policy, Client, Response, StatusCode};
use sqlx::SqlitePool;

pub const PASSWORD: &str = "correct-horse-battery";

static APP_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub media_dir: PathBuf,
}

fn scratch_dir() -> PathBuf {
    let n = APP_COUNTER.fetch_add(1, Ordering::SeqCst);
    let nanos = Utc::now().timestamp_subsec_nanos();
    let dir = std::env::temp_dir().join(format!(
        "blogicum-test-{}-{}-{}",
        std::process::id(),
        nanos,
        n
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_page_size(10).await
}

pub async fn spawn_app_with_page_size(page_size: i64) -> TestApp {
    let dir = scratch_dir();
    let database_url = format!("sqlite://{}", dir.join("blogicum.db").display());
    let media_dir = dir.join("media");
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "integration-test-secret".to_string(),
        server_addr: "127.0.0.1:0".parse().unwrap(),
        template_dir: default_template_dir(),
        media_dir: media_dir.clone(),
        page_size,
    };

    let app = build_app(config).await.expect("build app");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(serve(listener, app));

    let pool = init_db(&database_url).await.expect("open test database");
    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        media_dir,
    }
}

/// A browser-like client: keeps cookies, never follows redirects.
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
}

pub fn assert_redirect(response: &Response, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

/// Posts sorted by the order their titles appear in a rendered listing.
pub fn titles_in_order<'a>(body: &str, titles: &[&'a str]) -> Vec<&'a str> {
    let mut found: Vec<(usize, &str)> = titles
        .iter()
        .filter_map(|title| body.find(&format!(">{}</a></h2>", title)).map(|at| (at, *title)))
        .collect();
    found.sort();
    found.into_iter().map(|(_, title)| title).collect()
}

pub fn count_post_cards(body: &str) -> usize {
    body.matches("<article class=\"post-card\"").count()
}

/// A small but genuine PNG file.
pub fn png_bytes() -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([30, 144, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn hours_ahead(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client.post(self.url(path)).form(form).send().await.unwrap()
    }

    pub async fn register(&self, client: &Client, username: &str) -> Response {
        self.post_form(
            client,
            "/auth/registration/",
            &[
                ("username", username),
                ("email", "someone@example.com"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
        )
        .await
    }

    pub async fn login(&self, client: &Client, username: &str, password: &str) -> Response {
        self.post_form(
            client,
            "/auth/login/",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Registers a fresh account and returns a client logged in as it, with its id.
    pub async fn signed_in(&self, username: &str) -> (Client, i64) {
        let client = client();
        let response = self.register(&client, username).await;
        assert_redirect(&response, "/auth/login/");
        let response = self.login(&client, username, PASSWORD).await;
        assert_redirect(&response, "/");
        let id = self.user_id(username).await;
        (client, id)
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn make_staff(&self, user_id: i64) {
        sqlx::query("UPDATE users SET is_staff = 1 WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    pub async fn create_category(&self, slug: &str, is_published: bool) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO categories (title, description, slug, is_published, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            "#,
        )
        .bind(format!("Category {}", slug))
        .bind("Posts about things")
        .bind(slug)
        .bind(is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn create_location(&self, name: &str, is_published: bool) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO locations (name, is_published, created_at)
                VALUES ($1, $2, $3)
                RETURNING id
            "#,
        )
        .bind(name)
        .bind(is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        category_id: Option<i64>,
        pub_date: DateTime<Utc>,
        is_published: bool,
    ) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO posts (title, text, pub_date, author_id, category_id, is_published, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
            "#,
        )
        .bind(title)
        .bind(format!("Body of {}", title))
        .bind(pub_date)
        .bind(author_id)
        .bind(category_id)
        .bind(is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn create_comment(
        &self,
        author_id: i64,
        post_id: i64,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
                INSERT INTO comments (text, post_id, author_id, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id
            "#,
        )
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT Count(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post_title(&self, post_id: i64) -> Option<String> {
        sqlx::query_scalar::<_, String>("SELECT title FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }

    pub async fn comment_text(&self, comment_id: i64) -> Option<String> {
        sqlx::query_scalar::<_, String>("SELECT text FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }
}
