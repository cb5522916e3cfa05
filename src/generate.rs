//! HTML site generation.
//!
//! Stage 4 of the build. Takes a prepared [`Site`] and writes the final
//! static site through a [`Renderer`].
//!
//! ## Generated Pages
//!
//! - **Published pages** (`/{urlpath}/index.html`): every special page,
//!   section, and post. The homepage has an empty urlpath and lands at the
//!   output root.
//! - **Duplicate home** (`/{urlpathnonempty}/index.html`): with
//!   `duplicate_home`, the homepage rendered a second time at its own path.
//! - **Error page** (`/error.html`): the 404 template with the common props.
//! - **Latest feed** (`/latest/{n}/index.html`): with `latest_feed`, every
//!   visual feed entry, chained with its own navigation arrows.
//!
//! Phases run in that order; pages within a phase render in parallel.
//!
//! ## Template Context
//!
//! Every template sees one object, `props`:
//!
//! ```text
//! props
//! ├── favicon, avatar, css, params, js       # site assets
//! ├── version, year, title, domain
//! ├── sitekeywords, siteauthor, email
//! ├── social, news, sidebar, homelink
//! ├── ishomepage                             # true only on the homepage
//! ├── content                                # the page record; `content.hackurl`
//! │                                          # on a latest homepage
//! ├── posts                                  # the page's post list
//! ├── nav                                    # {first, prev, next, last}, posts only
//! └── articlebody                            # article pages only
//! ```
//!
//! ## Build Log
//!
//! Each render returns a [`LogRow`]; the driver concatenates them into the
//! [`BuildReport`] in render order.

use crate::config::load_config;
use crate::error::BuildError;
use crate::load::{article_body_path, load_content, read_article_body, read_news};
use crate::render::{JinjaRenderer, Renderer, strip_empty_lines};
use crate::resolve::{ResolvedPage, resolve_latest_feed, resolve_page};
use crate::site::{Site, logged, prepare};
use crate::types::{PageType, SidebarItem};
use crate::validate::Warning;
use chrono::Datelike;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a build reads from and writes to.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub templates: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
    /// Missing required fields and article bodies are errors.
    pub strict: bool,
}

/// One generated page, as recorded in the build log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub name: String,
    /// Root-relative, with a leading `/`.
    pub urlpath: String,
    pub urlkey: String,
    pub page_type: String,
    pub marker: String,
    pub template: String,
    pub directory: String,
    /// Comma-joined.
    pub css: String,
    pub js: String,
}

/// Result of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub rows: Vec<LogRow>,
    pub warnings: Vec<Warning>,
    /// Where the 404 page was written.
    pub error_page: Option<PathBuf>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Load, validate, and check files without rendering.
pub fn check(options: &BuildOptions) -> Result<Site, BuildError> {
    let renderer = JinjaRenderer::new(&options.templates);
    check_with_renderer(options, &renderer)
}

pub fn check_with_renderer<R: Renderer + ?Sized>(
    options: &BuildOptions,
    renderer: &R,
) -> Result<Site, BuildError> {
    info!("Loading content from {}", options.data.display());
    let config = load_config(&options.data)?;
    let content = load_content(&options.data, &config.special_pages)?;
    let mut site = prepare(config, &content, options.strict)?;
    let file_warnings = site.check_files(&options.data, &options.output, renderer)?;
    site.warnings.extend(file_warnings);
    Ok(site)
}

/// Run the full pipeline with minijinja templates from `options.templates`.
pub fn build(options: &BuildOptions) -> Result<(Site, BuildReport), BuildError> {
    let renderer = JinjaRenderer::new(&options.templates);
    build_with_renderer(options, &renderer)
}

pub fn build_with_renderer<R: Renderer + ?Sized>(
    options: &BuildOptions,
    renderer: &R,
) -> Result<(Site, BuildReport), BuildError> {
    let site = check_with_renderer(options, renderer)?;
    let report = generate(&site, renderer, &options.data, &options.output, options.strict)?;
    Ok((site, report))
}

/// Render every page of a prepared site into `output_dir`.
pub fn generate<R: Renderer + ?Sized>(
    site: &Site,
    renderer: &R,
    data_dir: &Path,
    output_dir: &Path,
    strict: bool,
) -> Result<BuildReport, BuildError> {
    fs::create_dir_all(output_dir)?;
    let common = common_props(site, data_dir)?;
    let ctx = RenderCtx {
        renderer,
        common: &common,
        data_dir,
        output_dir,
        strict,
    };

    let mut report = BuildReport {
        warnings: site.warnings.clone(),
        ..BuildReport::default()
    };
    let mut render_warnings = Vec::new();

    let pages: Vec<_> = site.pages().collect();
    info!("Rendering {} pages", pages.len());
    let rendered = pages
        .par_iter()
        .map(|page| -> Result<_, BuildError> {
            let (resolved, mut warnings) = resolve_page(site, page)?;
            let (row, body_warnings) = ctx.render(&resolved)?;
            warnings.extend(body_warnings);
            Ok((row, warnings))
        })
        .collect::<Result<Vec<_>, BuildError>>()?;
    for (row, warnings) in rendered {
        report.rows.push(row);
        render_warnings.extend(warnings);
    }

    if site.config.site.duplicate_home
        && let Some(home) = site.page(&site.config.site.homepage)
    {
        info!("Duplicating homepage at /{}", home.urlpathnonempty);
        let mut page = home.clone();
        page.ishomepage = false;
        page.urlpath = page.urlpathnonempty.clone();
        let (resolved, warnings) = resolve_page(site, &page)?;
        let (row, body_warnings) = ctx.render(&resolved)?;
        report.rows.push(row);
        render_warnings.extend(warnings);
        render_warnings.extend(body_warnings);
    }

    report.error_page = Some(render_error_page(renderer, site, &common, output_dir)?);

    if site.config.feed.latest_feed {
        let entries = resolve_latest_feed(site)?;
        info!("Creating latest feed ({} pages)", entries.len());
        let rendered = entries
            .par_iter()
            .map(|resolved| ctx.render(resolved))
            .collect::<Result<Vec<_>, BuildError>>()?;
        for (row, warnings) in rendered {
            report.rows.push(row);
            render_warnings.extend(warnings);
        }
    }

    report.warnings.extend(logged(render_warnings));
    Ok(report)
}

// ============================================================================
// Context assembly
// ============================================================================

#[derive(Serialize)]
struct CommonProps<'a> {
    favicon: &'a str,
    avatar: &'a str,
    css: &'a [String],
    params: &'a BTreeMap<String, Value>,
    js: &'a [String],
    version: &'static str,
    year: String,
    title: &'a str,
    domain: &'a str,
    sitekeywords: &'a str,
    siteauthor: &'a str,
    email: &'a str,
    social: &'a BTreeMap<String, String>,
    news: String,
    sidebar: &'a [SidebarItem],
    homelink: &'a str,
    ishomepage: bool,
}

/// The props every template receives, before any page-specific layer.
pub fn common_props(site: &Site, data_dir: &Path) -> Result<Map<String, Value>, BuildError> {
    let config = &site.config;
    let news = if config.site.show_news {
        read_news(data_dir)
    } else {
        String::new()
    };
    let props = CommonProps {
        favicon: &config.site.favicon,
        avatar: &config.site.avatar,
        css: &config.css.base,
        params: &config.css.params,
        js: &config.js.base,
        version: env!("CARGO_PKG_VERSION"),
        year: chrono::Local::now().year().to_string(),
        title: &config.site.title,
        domain: &config.site.domain,
        sitekeywords: &config.site.keywords,
        siteauthor: &config.site.author,
        email: &config.site.email,
        social: &config.social,
        news,
        sidebar: &site.sidebar,
        homelink: &site.homelink,
        ishomepage: false,
    };
    match serde_json::to_value(props)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Layer a resolved page over the common props.
pub fn page_context(
    common: &Map<String, Value>,
    resolved: &ResolvedPage,
    articlebody: Option<String>,
) -> Result<Value, BuildError> {
    let mut props = common.clone();
    append(&mut props, "css", &resolved.css);
    append(&mut props, "js", &resolved.js);
    props.insert("content".into(), serde_json::to_value(&resolved.page)?);
    props.insert("posts".into(), serde_json::to_value(&resolved.posts)?);
    if let Some(nav) = &resolved.nav {
        props.insert("nav".into(), serde_json::to_value(nav)?);
    }
    if let Some(body) = articlebody {
        props.insert("articlebody".into(), Value::String(body));
    }
    if resolved.page.ishomepage {
        props.insert("ishomepage".into(), Value::Bool(true));
    }
    Ok(Value::Object(props))
}

fn append(props: &mut Map<String, Value>, key: &str, extra: &[String]) {
    if let Some(Value::Array(items)) = props.get_mut(key) {
        items.extend(extra.iter().cloned().map(Value::String));
    }
}

fn string_list(props: &Value, key: &str) -> Vec<String> {
    props[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Rendering
// ============================================================================

struct RenderCtx<'a, R: ?Sized> {
    renderer: &'a R,
    common: &'a Map<String, Value>,
    data_dir: &'a Path,
    output_dir: &'a Path,
    strict: bool,
}

impl<R: Renderer + ?Sized> RenderCtx<'_, R> {
    /// Render one page to `{output}/{urlpath}/index.html`.
    fn render(&self, resolved: &ResolvedPage) -> Result<(LogRow, Vec<Warning>), BuildError> {
        let page = &resolved.page;
        let mut warnings = Vec::new();

        let articlebody = if page.page_type == PageType::Article {
            // The url key, not the urlpath: a homepage article has an empty urlpath
            match read_article_body(self.data_dir, &page.url)? {
                Some(body) => Some(body),
                None => {
                    let path = article_body_path(self.data_dir, &page.url);
                    if self.strict {
                        return Err(BuildError::ContentNotFound {
                            url: page.url.clone(),
                            path,
                        });
                    }
                    warnings.push(Warning::MissingArticleBody {
                        url: page.url.clone(),
                        path,
                    });
                    Some(String::new())
                }
            }
        } else {
            None
        };

        let context = page_context(self.common, resolved, articlebody)?;
        let directory = self.output_dir.join(&page.urlpath);
        debug!(
            "Create {} page [{}]: {} at url = /{}",
            page.page_type, resolved.marker, page.name, page.urlpath
        );
        let html = self.renderer.render(&resolved.template, &context)?;
        fs::create_dir_all(&directory)?;
        fs::write(directory.join("index.html"), strip_empty_lines(&html) + "\n")?;

        let row = LogRow {
            name: page.name.clone(),
            urlpath: format!("/{}", page.urlpath),
            urlkey: page.url.clone(),
            page_type: page.page_type.to_string(),
            marker: resolved.marker.to_string(),
            template: resolved.template.clone(),
            directory: format!("{}/{}", self.output_dir.display(), page.urlpath),
            css: string_list(&context, "css").join(","),
            js: string_list(&context, "js").join(","),
        };
        Ok((row, warnings))
    }
}

/// Render the 404 page to `{output}/error.html`.
pub fn render_error_page<R: Renderer + ?Sized>(
    renderer: &R,
    site: &Site,
    common: &Map<String, Value>,
    output_dir: &Path,
) -> Result<PathBuf, BuildError> {
    let template = site
        .config
        .templates
        .get("error")
        .ok_or_else(|| BuildError::missing_template("error.html", "<error>"))?;
    let mut props = common.clone();
    props.insert(
        "title".into(),
        Value::String(format!("{} | 404: Page Not Found", site.config.site.title)),
    );
    props.insert("keywords".into(), Value::from("error"));
    let html = renderer.render(template, &Value::Object(props))?;
    let path = output_dir.join("error.html");
    fs::write(&path, strip_empty_lines(&html) + "\n")?;
    Ok(path)
}
