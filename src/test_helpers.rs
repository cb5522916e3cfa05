//! Shared test utilities for the jinjagen test suite.
//!
//! Provides record and page builders, a recording [`Renderer`] whose lookups
//! panic with a readable message on a miss, and small list helpers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let records = vec![raw(json!({"url": "dawn", "type": "img", "publish": 1}))];
//! let pages = normalize(&records, "").unwrap();
//! assert_eq!(urls(&pages), vec!["dawn"]);
//! ```

use crate::load::{ContentSet, RawRecord};
use crate::render::{RenderError, Renderer};
use crate::types::{Page, PageType};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Mutex;

// =========================================================================
// Builders
// =========================================================================

/// Build a raw record from a JSON object literal. Panics on anything else.
pub fn raw(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => RawRecord::from_map(map).unwrap(),
        other => panic!("raw() expects a JSON object, got {other}"),
    }
}

/// A published img post at `post/{url}`.
pub fn post(url: &str, categories: &[&str], date: Option<&str>) -> Page {
    Page {
        url: url.to_string(),
        name: url.to_string(),
        page_type: PageType::Img,
        category: categories.iter().map(|c| c.to_string()).collect(),
        files: vec![],
        keywords: vec![],
        date: date.map(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        selected: false,
        specialpage: false,
        urlpath: format!("post/{url}"),
        urlpathnonempty: format!("post/{url}"),
        ishomepage: false,
        template: None,
        forward: None,
        extra: Default::default(),
    }
}

/// A published record of the given type with every listed key declared.
pub fn record(url: &str, page_type: &str, extra: Value) -> RawRecord {
    let mut map = match extra {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => panic!("record() expects an object for extras, got {other}"),
    };
    map.insert("url".into(), Value::from(url));
    map.insert("type".into(), Value::from(page_type));
    map.entry("publish").or_insert(Value::from(1));
    RawRecord::from_map(map).unwrap()
}

/// Content with the stock special pages and the given collections.
pub fn content(sections: Vec<RawRecord>, visual: Vec<RawRecord>, article: Vec<RawRecord>) -> ContentSet {
    let special = crate::config::SiteConfig::default()
        .special_pages
        .into_iter()
        .map(|m| RawRecord::from_map(m).unwrap())
        .collect();
    ContentSet {
        special,
        sections,
        visual,
        article,
    }
}

// =========================================================================
// Lookups
// =========================================================================

/// Url keys of a page list, in order.
pub fn urls(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|p| p.url.as_str()).collect()
}

// =========================================================================
// Recording renderer
// =========================================================================

/// A [`Renderer`] that records every call and renders a one-line summary.
///
/// Output is `"{template} /{urlpath}"` followed by blank lines, so tests can
/// assert where each context went and that blank lines were stripped.
#[derive(Default)]
pub struct RecordingRenderer {
    pub known: BTreeSet<String>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingRenderer {
    /// A renderer that knows the given template names.
    pub fn with_templates(names: &[&str]) -> Self {
        Self {
            known: names.iter().map(|n| n.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Contexts rendered with `template`, in call order.
    pub fn contexts_for(&self, template: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == template)
            .map(|(_, ctx)| ctx.clone())
            .collect()
    }

    /// The context whose `content.urlpath` is `urlpath`. Panics if absent.
    pub fn context_at(&self, urlpath: &str) -> Value {
        let calls = self.calls.lock().unwrap();
        calls
            .iter()
            .rev()
            .find(|(_, ctx)| ctx["content"]["urlpath"] == urlpath)
            .map(|(_, ctx)| ctx.clone())
            .unwrap_or_else(|| {
                let paths: Vec<&Value> = calls.iter().map(|(_, c)| &c["content"]["urlpath"]).collect();
                panic!("no render at urlpath '{urlpath}'. Rendered: {paths:?}")
            })
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, name: &str, context: &Value) -> Result<String, RenderError> {
        if !self.has_template(name) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), context.clone()));
        let urlpath = context["content"]["urlpath"].as_str().unwrap_or("");
        Ok(format!("{name} /{urlpath}\n\n"))
    }

    fn has_template(&self, name: &str) -> bool {
        self.known.contains(name)
    }
}
