use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: SocketAddr,
    pub template_dir: PathBuf,
    pub media_dir: PathBuf,
    pub page_size: i64,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required, everything else has a default.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let server_addr = std::env::var("SERVER_ADDR")
            .unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_owned())
            .parse()
            .context("SERVER_ADDR is not a valid socket address")?;
        let template_dir = std::env::var("TEMPLATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_template_dir());
        let media_dir = std::env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let page_size = match std::env::var("PAGE_SIZE") {
            Ok(value) => value.parse().context("PAGE_SIZE must be an integer")?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };
        if page_size < 1 {
            anyhow::bail!("PAGE_SIZE must be positive");
        }

        Ok(Config {
            database_url,
            jwt_secret,
            server_addr,
            template_dir,
            media_dir,
            page_size,
        })
    }
}

pub fn default_template_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}
