//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The file lives in the
//! data directory next to the content collections. Stock defaults are the
//! base layer; the user's file overrides only what it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = ""
//! domain = ""
//! keywords = ""
//! author = ""
//! email = ""
//! homepage = "selected"     # url key rendered at the root path
//! homelink = ""             # url key linked from the site title ("" = root)
//! duplicate_home = false    # also render the homepage at its own path
//! show_news = false         # include published/news/content.html
//! sidebar = ["latest", "selected", "feed"]  # url keys, in display order
//! favicon = ""
//! avatar = ""
//!
//! [feed]
//! size = 5                  # posts in the feed
//! latest_feed = false       # render latest/1 .. latest/N
//!
//! [css]
//! base = []                 # stylesheets for every page, relative to output
//! by_type = {}              # page type -> extra stylesheets
//! by_url = {}               # url key -> extra stylesheets
//!
//! [css.params]              # free-form values handed to templates
//!
//! [js]
//! base = []
//! by_type = {}
//! by_url = {}
//!
//! [templates]
//! article = "post.article.html"
//! # ...
//!
//! [social]
//! instagram = "https://www.instagram.com/username"
//!
//! [[special_pages]]
//! url = "latest"
//! # ...
//! ```
//!
//! ## Partial Configuration
//!
//! Tables are merged key by key, so a file may override a single value.
//! Arrays (`sidebar`, `special_pages`, ...) replace the default wholesale.
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "site.toml";

/// Url keys that ordinary sections and posts may not use.
pub const RESERVED: &[&str] = &["static", "cover", "latest", "selected", "feed", "post"];

/// Social providers the templates have icons for.
pub const ALLOWED_SOCIAL: &[&str] = &[
    "instagram",
    "youtube",
    "twitter",
    "facebook",
    "linkedin",
    "tiktok",
    "bluesky",
    "reddit",
    "github",
];

/// Fields every post record must declare in strict mode.
pub const REQUIRED_POST_FIELDS: &[&str] = &[
    "name",
    "showname",
    "shownamesection",
    "subtitle",
    "showsubtitle",
    "type",
    "border",
    "files",
    "thumbnail",
    "url",
    "urlexternal",
    "publishedexternal",
    "publish",
    "specialpage",
    "selected",
    "author",
    "showauthor",
    "category",
    "series",
    "keywords",
    "date",
    "showdate",
    "blurb",
    "showblurb",
    "paywall",
    "ispreview",
    "description",
    "notes",
];

/// List fields every page carries after normalization, written or not.
/// Required-field checks count them as present.
pub const NORMALIZED_FIELDS: &[&str] = &["category", "files", "keywords"];

/// Fields every section record must declare in strict mode.
pub const REQUIRED_SECTION_FIELDS: &[&str] = &[
    "name",
    "showname",
    "subtitle",
    "showsubtitle",
    "category",
    "url",
    "publish",
    "specialpage",
    "type",
    "blurb",
    "showblurb",
    "description",
    "notes",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid site config: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// `Default` is the stock configuration; user files need only specify the
/// values they want to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site metadata, homepage aliasing, and sidebar.
    pub site: SiteSection,
    /// Feed size and the optional latest feed.
    pub feed: FeedConfig,
    /// Stylesheet manifests.
    pub css: CssConfig,
    /// Script manifests.
    pub js: AssetManifest,
    /// Page type to template name.
    pub templates: TemplateTable,
    /// Social provider to profile URL.
    pub social: BTreeMap<String, String>,
    /// Built-in special pages (cover, latest, selected, feed).
    pub special_pages: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteSection::default(),
            feed: FeedConfig::default(),
            css: CssConfig::default(),
            js: AssetManifest::default(),
            templates: default_templates(),
            social: BTreeMap::new(),
            special_pages: default_special_pages(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.size == 0 {
            return Err(ConfigError::Validation("feed.size must be at least 1".into()));
        }
        if let Some(provider) = self
            .social
            .keys()
            .find(|p| !ALLOWED_SOCIAL.contains(&p.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "Found unrecognized social media type: {provider} (allowed: {})",
                ALLOWED_SOCIAL.join(", ")
            )));
        }
        if !self.templates.contains_key("error") {
            return Err(ConfigError::Validation(
                "templates.error must name the 404 template".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Site title (e.g. "French Wines").
    pub title: String,
    /// Domain name (e.g. "frenchwines.com").
    pub domain: String,
    pub keywords: String,
    pub author: String,
    /// Public contact email.
    pub email: String,
    /// Url key of the page rendered at the root path.
    pub homepage: String,
    /// Url key linked from the site title. Empty means the root path.
    pub homelink: String,
    /// Render the homepage a second time at its own url path.
    pub duplicate_home: bool,
    /// Include `published/news/content.html` in every page.
    pub show_news: bool,
    /// Url keys shown in the sidebar, in order.
    pub sidebar: Vec<String>,
    /// Favicon path, relative to the output directory.
    pub favicon: String,
    /// Avatar image path, relative to the output directory.
    pub avatar: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: String::new(),
            domain: String::new(),
            keywords: String::new(),
            author: String::new(),
            email: String::new(),
            homepage: "selected".to_string(),
            homelink: String::new(),
            duplicate_home: false,
            show_news: false,
            sidebar: vec![
                "latest".to_string(),
                "selected".to_string(),
                "feed".to_string(),
            ],
            favicon: String::new(),
            avatar: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Number of posts in each feed.
    pub size: usize,
    /// Render every feed entry at `latest/{n}`.
    pub latest_feed: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            size: 5,
            latest_feed: false,
        }
    }
}

/// Global, per-type, and per-url asset lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetManifest {
    /// Files included on every page, relative to the output directory.
    pub base: Vec<String>,
    /// Extra files for pages of a given type.
    pub by_type: BTreeMap<String, Vec<String>>,
    /// Extra files for a single url key.
    pub by_url: BTreeMap<String, Vec<String>>,
}

impl AssetManifest {
    /// Extras for a page: type-specific entries first, then url-specific ones.
    pub fn extras_for(&self, page_type: &str, url: &str) -> Vec<String> {
        let by_type = self.by_type.get(page_type).into_iter().flatten();
        let by_url = self.by_url.get(url).into_iter().flatten();
        by_type.chain(by_url).cloned().collect()
    }

    /// Every file named anywhere in the manifest.
    pub fn all_files(&self) -> Vec<&str> {
        self.by_type
            .values()
            .chain(self.by_url.values())
            .flatten()
            .chain(&self.base)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CssConfig {
    pub base: Vec<String>,
    pub by_type: BTreeMap<String, Vec<String>>,
    pub by_url: BTreeMap<String, Vec<String>>,
    /// Free-form values (icon sizes, extra classes) exposed to templates.
    pub params: BTreeMap<String, serde_json::Value>,
}

impl CssConfig {
    pub fn manifest(&self) -> AssetManifest {
        AssetManifest {
            base: self.base.clone(),
            by_type: self.by_type.clone(),
            by_url: self.by_url.clone(),
        }
    }
}

/// Page type (or `error`) to template file name.
pub type TemplateTable = BTreeMap<String, String>;

fn default_templates() -> TemplateTable {
    [
        ("article", "post.article.html"),
        ("img", "post.visual.html"),
        ("video", "post.visual.html"),
        ("sectionarticle", "section.article.html"),
        ("sectionvisual", "section.visual.html"),
        ("error", "404.html"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_special_pages() -> Vec<serde_json::Map<String, serde_json::Value>> {
    let pages = serde_json::json!([
        {
            "name": "Cover",
            "url": "cover",
            "publish": false,
            "specialpage": true,
            "type": "article",
            "template": "cover.html",
            "description": "A cover page that doesn't inherit from the base template"
        },
        {
            "name": "Latest",
            "url": "latest",
            "publish": true,
            "specialpage": true,
            "type": "img",
            "template": "post.visual.html",
            "description": "The single most recent post"
        },
        {
            "name": "Selected",
            "url": "selected",
            "publish": true,
            "specialpage": true,
            "type": "sectionvisual",
            "template": "section.visual.html",
            "description": "A smattering of selected posts"
        },
        {
            "name": "Feed",
            "url": "feed",
            "publish": true,
            "specialpage": true,
            "type": "specialpage",
            "template": "feed.visual.html",
            "description": "A page with a limited number of recent posts"
        }
    ]);
    match pages {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Loading: stock defaults, then site.toml
// =============================================================================

/// The stock configuration as a TOML table: the bottom layer of every load.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock config must serialize: {e}")))
}

/// Layer the user's `site.toml` over the stock table.
///
/// Where both sides hold a table the keys merge recursively; any other user
/// value (scalar, array, array of tables) replaces the stock one outright.
pub fn merge_toml(stock: toml::Value, user: toml::Value) -> toml::Value {
    match (stock, user) {
        (toml::Value::Table(mut layered), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                let value = match layered.remove(&key) {
                    Some(default) => merge_toml(default, value),
                    None => value,
                };
                layered.insert(key, value);
            }
            toml::Value::Table(layered)
        }
        (_, replacement) => replacement,
    }
}

/// Parse the `site.toml` at `path`. A data directory without one is valid.
fn read_site_toml(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text).map(Some).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the site config for a data directory.
///
/// `site.toml` is layered over the stock defaults, unknown keys are
/// rejected, and the result is validated. Errors name the file.
pub fn load_config(data_dir: &Path) -> Result<SiteConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let mut layered = stock_defaults_value()?;
    if let Some(user) = read_site_toml(&path)? {
        layered = merge_toml(layered, user);
    }
    let config: SiteConfig = layered
        .try_into()
        .map_err(|source| ConfigError::Toml { path, source })?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# jinjagen site configuration
# ===========================
# Place this file at <data>/site.toml. All settings are optional; values
# shown are the defaults. Tables merge with the defaults key by key, arrays
# replace them. Unknown keys are an error.

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = ""
domain = ""
keywords = ""
author = ""
email = ""

# Url key rendered at the root path. May be a special page.
homepage = "selected"

# Url key linked from the site title. Leave empty to link the root path.
# Useful with a cover homepage: homepage = "cover", homelink = "selected".
homelink = ""

# Also render the homepage at its ordinary url path.
duplicate_home = false

# Show the news snippet from <data>/published/news/content.html.
show_news = false

# Sidebar entries (url keys), in display order.
sidebar = ["latest", "selected", "feed"]

# Paths relative to the output directory. Missing files only warn.
favicon = ""
avatar = ""

# ---------------------------------------------------------------------------
# Feed
# ---------------------------------------------------------------------------
[feed]
# Number of posts in the feed page.
size = 5

# Render each feed post at latest/1, latest/2, ...
latest_feed = false

# ---------------------------------------------------------------------------
# Stylesheets and scripts (paths relative to the output directory)
# ---------------------------------------------------------------------------
[css]
base = []

[css.by_type]
# article = ["static/css/article.css"]

[css.by_url]
# about = ["static/css/about.css"]

[css.params]
# socialiconsize = 16
# thumbnail_width = 300

[js]
base = []

[js.by_type]

[js.by_url]

# ---------------------------------------------------------------------------
# Templates: page type -> file in the templates directory
# ---------------------------------------------------------------------------
[templates]
article = "post.article.html"
img = "post.visual.html"
video = "post.visual.html"
sectionarticle = "section.article.html"
sectionvisual = "section.visual.html"
error = "404.html"

# ---------------------------------------------------------------------------
# Social links (instagram, youtube, twitter, facebook, linkedin, tiktok,
# bluesky, reddit, github)
# ---------------------------------------------------------------------------
[social]
# instagram = "https://www.instagram.com/username"

# ---------------------------------------------------------------------------
# Special pages
# ---------------------------------------------------------------------------
[[special_pages]]
name = "Cover"
url = "cover"
publish = false
specialpage = true
type = "article"
template = "cover.html"

[[special_pages]]
name = "Latest"
url = "latest"
publish = true
specialpage = true
type = "img"
template = "post.visual.html"

[[special_pages]]
name = "Selected"
url = "selected"
publish = true
specialpage = true
type = "sectionvisual"
template = "section.visual.html"

[[special_pages]]
name = "Feed"
url = "feed"
publish = true
specialpage = true
type = "specialpage"
template = "feed.visual.html"
"##
}
