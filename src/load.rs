//! Content loading.
//!
//! Stage 1 of the build. Reads the three content collections from the data
//! directory and the special pages from the site config, producing ordered
//! lists of [`RawRecord`]s. Nothing is filtered or interpreted here beyond
//! giving each known field a type.
//!
//! ## Data Directory Layout
//!
//! ```text
//! data/
//! ├── site.toml                       # Site configuration
//! ├── content.sections.json           # Section pages
//! ├── content.visual.json             # Image and video posts
//! ├── content.article.json            # Article posts
//! └── published/
//!     ├── img/                        # Source images (existence-checked)
//!     ├── video/                      # Source videos (existence-checked)
//!     ├── news/content.html           # Optional news snippet
//!     └── article/<url>/html/content.html
//! ```
//!
//! Records are flat JSON objects. Flags (`publish`, `specialpage`, `selected`)
//! may be booleans, `0`/`1`, or strings; list fields (`category`, `files`,
//! `keywords`) may be comma-delimited strings or arrays.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SECTIONS_FILE: &str = "content.sections.json";
pub const VISUAL_FILE: &str = "content.visual.json";
pub const ARTICLE_FILE: &str = "content.article.json";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} must contain a JSON array of objects")]
    NotAnArray { path: PathBuf },
    #[error("Malformed record {index} in {origin}: {source}")]
    Record {
        origin: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A boolean that content authors write as `true`, `1`, or `"1"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flag {
    fn truthy(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
            Flag::Float(f) => *f != 0.0,
            Flag::Text(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
        }
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Flag>::deserialize(deserializer)?;
    Ok(value.is_some_and(|f| f.truthy()))
}

/// A list field: either `"a, b"` or `["a", "b"]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Delimited {
    #[default]
    Absent,
    Text(String),
    List(Vec<String>),
}

impl Delimited {
    /// Split on commas and trim. Absent or blank values give an empty list.
    pub fn split(&self) -> Vec<String> {
        match self {
            Delimited::Absent => Vec::new(),
            Delimited::Text(s) if s.trim().is_empty() => Vec::new(),
            Delimited::Text(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
            Delimited::List(items) => items.iter().map(|p| p.trim().to_string()).collect(),
        }
    }
}

fn delimited<'de, D>(deserializer: D) -> Result<Delimited, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Delimited>::deserialize(deserializer)?.unwrap_or_default())
}

/// A content record as written by the author.
///
/// Known fields are typed; everything else is kept in `extra` and handed to
/// templates untouched. `declared` remembers which keys the author actually
/// wrote, for required-field checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub page_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub publish: bool,
    #[serde(default, deserialize_with = "flag")]
    pub specialpage: bool,
    #[serde(default, deserialize_with = "flag")]
    pub selected: bool,
    #[serde(default, deserialize_with = "delimited")]
    pub category: Delimited,
    #[serde(default, deserialize_with = "delimited")]
    pub files: Delimited,
    #[serde(default, deserialize_with = "delimited")]
    pub keywords: Delimited,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub urlpath: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    pub declared: BTreeSet<String>,
}

impl RawRecord {
    /// Build a record from one JSON object, remembering its key set.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let declared = map.keys().cloned().collect();
        let mut record: RawRecord = serde_json::from_value(Value::Object(map))?;
        record.declared = declared;
        Ok(record)
    }

    /// The url key with surrounding whitespace removed.
    pub fn key(&self) -> &str {
        self.url.trim()
    }

    /// The first declared category, if any.
    pub fn primary_category(&self) -> Option<String> {
        self.category.split().into_iter().find(|c| !c.is_empty())
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// All raw content for one build, in load order.
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    pub special: Vec<RawRecord>,
    pub sections: Vec<RawRecord>,
    pub visual: Vec<RawRecord>,
    pub article: Vec<RawRecord>,
}

impl ContentSet {
    /// Every record, special pages first.
    pub fn all(&self) -> impl Iterator<Item = &RawRecord> {
        self.special
            .iter()
            .chain(&self.sections)
            .chain(&self.visual)
            .chain(&self.article)
    }

    /// Sections and posts: the records authors write by hand.
    pub fn authored(&self) -> impl Iterator<Item = &RawRecord> {
        self.sections.iter().chain(&self.visual).chain(&self.article)
    }
}

/// Load the three collections from `data_dir` plus the configured special pages.
pub fn load_content(
    data_dir: &Path,
    special_pages: &[Map<String, Value>],
) -> Result<ContentSet, LoadError> {
    Ok(ContentSet {
        special: records_from_maps("special_pages", special_pages.iter().cloned())?,
        sections: load_collection(&data_dir.join(SECTIONS_FILE))?,
        visual: load_collection(&data_dir.join(VISUAL_FILE))?,
        article: load_collection(&data_dir.join(ARTICLE_FILE))?,
    })
}

/// Read one JSON array of records.
pub fn load_collection(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(LoadError::NotAnArray {
            path: path.to_path_buf(),
        });
    };
    let maps = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            _ => Err(LoadError::NotAnArray {
                path: path.to_path_buf(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    records_from_maps(&path.display().to_string(), maps)
}

fn records_from_maps(
    origin: &str,
    maps: impl IntoIterator<Item = Map<String, Value>>,
) -> Result<Vec<RawRecord>, LoadError> {
    maps.into_iter()
        .enumerate()
        .map(|(index, map)| {
            RawRecord::from_map(map).map_err(|source| LoadError::Record {
                origin: origin.to_string(),
                index,
                source,
            })
        })
        .collect()
}

// ============================================================================
// Body collaborators
// ============================================================================

/// Where an article's rendered body is expected.
pub fn article_body_path(data_dir: &Path, url: &str) -> PathBuf {
    data_dir
        .join("published/article")
        .join(url)
        .join("html/content.html")
}

/// Markdown fallback for an article body.
pub fn article_markdown_path(data_dir: &Path, url: &str) -> PathBuf {
    data_dir
        .join("published/article")
        .join(url)
        .join("content.md")
}

/// Read an article body as HTML.
///
/// Prefers `html/content.html`; falls back to `content.md` rendered with
/// pulldown-cmark. Returns `Ok(None)` when neither exists.
pub fn read_article_body(data_dir: &Path, url: &str) -> std::io::Result<Option<String>> {
    let html_path = article_body_path(data_dir, url);
    if html_path.is_file() {
        return fs::read_to_string(html_path).map(Some);
    }
    let md_path = article_markdown_path(data_dir, url);
    if md_path.is_file() {
        let markdown = fs::read_to_string(md_path)?;
        return Ok(Some(markdown_to_html(&markdown)));
    }
    Ok(None)
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = pulldown_cmark::Parser::new(markdown);
    let mut out = String::new();
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}

/// The sidebar news snippet. Missing or unreadable news is simply empty.
pub fn read_news(data_dir: &Path) -> String {
    fs::read_to_string(data_dir.join("published/news/content.html")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => RawRecord::from_map(map).unwrap(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn flags_accept_ints_bools_and_strings() {
        let r = record(json!({"url": "a", "publish": 1, "specialpage": "0", "selected": true}));
        assert!(r.publish);
        assert!(!r.specialpage);
        assert!(r.selected);

        let r = record(json!({"url": "a", "publish": "false"}));
        assert!(!r.publish);
    }

    #[test]
    fn missing_flags_default_to_false() {
        let r = record(json!({"url": "a"}));
        assert!(!r.publish && !r.specialpage && !r.selected);
    }

    #[test]
    fn delimited_fields_split_and_trim() {
        let r = record(json!({
            "url": "a",
            "category": "travel , food",
            "files": ["one.jpg", " two.jpg"],
            "keywords": ""
        }));
        assert_eq!(r.category.split(), vec!["travel", "food"]);
        assert_eq!(r.files.split(), vec!["one.jpg", "two.jpg"]);
        assert!(r.keywords.split().is_empty());
        assert_eq!(r.primary_category().as_deref(), Some("travel"));
    }

    #[test]
    fn null_list_field_is_absent() {
        let r = record(json!({"url": "a", "category": null}));
        assert_eq!(r.category, Delimited::Absent);
    }

    #[test]
    fn declared_keys_and_extras_are_kept() {
        let r = record(json!({"url": " a ", "thumbnail": "a.jpg", "border": 1}));
        assert_eq!(r.key(), "a");
        assert_eq!(r.extra_str("thumbnail"), Some("a.jpg"));
        assert_eq!(r.extra["border"], json!(1));
        assert!(r.declared.contains("thumbnail"));
        assert!(r.declared.contains("url"));
        assert!(!r.declared.contains("date"));
    }

    #[test]
    fn load_collection_reads_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(VISUAL_FILE);
        fs::write(&path, r#"[{"url": "a", "type": "img"}, {"url": "b", "type": "video"}]"#)
            .unwrap();
        let records = load_collection(&path).unwrap();
        let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
        assert_eq!(records[1].page_type.as_deref(), Some("video"));
    }

    #[test]
    fn load_collection_rejects_non_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(VISUAL_FILE);
        fs::write(&path, r#"{"url": "a"}"#).unwrap();
        assert!(matches!(
            load_collection(&path),
            Err(LoadError::NotAnArray { .. })
        ));
    }

    #[test]
    fn load_collection_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_collection(&tmp.path().join("nope.json")),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn article_body_prefers_html() {
        let tmp = TempDir::new().unwrap();
        let html = article_body_path(tmp.path(), "essay");
        fs::create_dir_all(html.parent().unwrap()).unwrap();
        fs::write(&html, "<p>html</p>").unwrap();
        fs::write(article_markdown_path(tmp.path(), "essay"), "*md*").unwrap();
        assert_eq!(
            read_article_body(tmp.path(), "essay").unwrap().as_deref(),
            Some("<p>html</p>")
        );
    }

    #[test]
    fn article_body_falls_back_to_markdown() {
        let tmp = TempDir::new().unwrap();
        let md = article_markdown_path(tmp.path(), "essay");
        fs::create_dir_all(md.parent().unwrap()).unwrap();
        fs::write(&md, "This is **bold**.").unwrap();
        let body = read_article_body(tmp.path(), "essay").unwrap().unwrap();
        assert!(body.contains("<strong>bold</strong>"));
    }

    #[test]
    fn article_body_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_article_body(tmp.path(), "essay").unwrap(), None);
    }

    #[test]
    fn news_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_news(tmp.path()), "");
    }
}
