//! Fatal build errors.
//!
//! Every variant aborts the build. Conditions that only degrade the output
//! (uncategorized posts, a missing favicon, non-strict gaps) are reported as
//! [`crate::validate::Warning`]s instead.

use crate::config::ConfigError;
use crate::load::LoadError;
use crate::render::RenderError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Content error: {0}")]
    Load(#[from] LoadError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("{attribute} attribute must be unique but found overlap: {values:?}")]
    DuplicateKey {
        attribute: &'static str,
        values: Vec<String>,
    },
    #[error("Section category attributes must be unique, found duplicates: {0:?}")]
    DuplicateCategory(Vec<String>),
    #[error("Missing keys for {url:?}: {fields:?}")]
    MissingField { url: String, fields: Vec<String> },
    #[error("Clash with reserved url for page object: {0}")]
    ReservedUrl(String),
    #[error("{what} url: {key:?} not found")]
    MissingReference { what: &'static str, key: String },
    #[error("File not found: {0}")]
    MissingFile(PathBuf),
    #[error("Template not found: {template} (for {url:?})")]
    MissingTemplate { url: String, template: String },
    #[error("content.html not found for: {url} (looked in {path})")]
    ContentNotFound { url: String, path: PathBuf },
    #[error("Unknown type {page_type:?} for page object: {url:?}")]
    UnknownType { url: String, page_type: String },
    #[error("Invalid date {date:?} for page object {url:?} (expected YYYY-MM-DD)")]
    InvalidDate { url: String, date: String },
    #[error("Feed is empty but {0} needs at least one dated visual post")]
    EmptyFeed(String),
}

impl BuildError {
    pub fn missing_template(url: &str, template: &str) -> Self {
        BuildError::MissingTemplate {
            url: url.to_string(),
            template: template.to_string(),
        }
    }
}
