use std::path::Path;

use anyhow::{Context as _, Result};
use axum::response::Html;
use tera::{Context, Tera};

use crate::{errors::RequestError, models::User};

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern = pattern
            .to_str()
            .context("template directory is not valid UTF-8")?;
        let tera = Tera::new(pattern).context("Failed to load templates")?;
        tracing::debug!(
            count = tera.get_template_names().count(),
            "loaded templates"
        );
        Ok(Templates { tera })
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, RequestError> {
        Ok(Html(self.tera.render(template, context)?))
    }
}

/// Context shared by every page: the logged in user, if any.
pub fn base_context(user: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("user", &user);
    context
}
