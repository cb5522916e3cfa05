//! Template rendering.
//!
//! The pipeline only needs two things from a template engine: render a named
//! template against a JSON context, and say whether a name exists. Both sit
//! behind the [`Renderer`] trait so the driver can be tested without one.
//!
//! [`JinjaRenderer`] is the production implementation. It loads templates by
//! file name from the templates directory with minijinja and exposes the
//! context to them as `props`, so a template reads `{{ props.title }}` or
//! loops over `props.posts`. Autoescaping follows the template's extension;
//! article bodies need `{{ props.articlebody | safe }}`.

use crate::config::TemplateTable;
use crate::types::PageType;
use minijinja::{Environment, ErrorKind, context};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Template error: {0}")]
    Engine(#[from] minijinja::Error),
}

/// Renders a named template against a context.
///
/// Implementations must be `Sync`: pages render in parallel.
pub trait Renderer: Sync {
    fn render(&self, name: &str, context: &Value) -> Result<String, RenderError>;
    fn has_template(&self, name: &str) -> bool;
}

/// minijinja environment reading templates from a directory.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new(template_dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(template_dir));
        Self { env }
    }
}

impl Renderer for JinjaRenderer {
    fn render(&self, name: &str, props: &Value) -> Result<String, RenderError> {
        let template = self.env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                RenderError::TemplateNotFound(name.to_string())
            } else {
                RenderError::Engine(e)
            }
        })?;
        Ok(template.render(context! { props => props })?)
    }

    fn has_template(&self, name: &str) -> bool {
        match self.env.get_template(name) {
            Ok(_) => true,
            // A template that exists but fails to parse is reported at render time
            Err(e) => e.kind() != ErrorKind::TemplateNotFound,
        }
    }
}

/// Pick the template for a page: a per-record override wins, otherwise the
/// type table. `None` means neither names one.
pub fn resolve_template<'a>(
    table: &'a TemplateTable,
    page_type: PageType,
    override_name: Option<&'a str>,
) -> Option<&'a str> {
    override_name
        .filter(|t| !t.is_empty())
        .or_else(|| table.get(page_type.as_str()).map(String::as_str))
}

/// Drop whitespace-only lines from rendered output.
pub fn strip_empty_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
