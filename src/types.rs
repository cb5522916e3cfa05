//! Shared types used across all pipeline stages.
//!
//! A [`Page`] is the normalized form of a content record. Everything after
//! normalization (indexing, feeds, navigation, rendering) works on pages and
//! never on the raw records, so the invariants established by the normalizer
//! hold for every downstream consumer.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The kind of a content record, taken from its `type` field.
///
/// Special pages (`latest`, `selected`, `feed`, `cover`) reuse the ordinary
/// types and are told apart by [`Page::specialpage`]; the `specialpage` type
/// exists for pages that render like nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    SectionVisual,
    SectionArticle,
    Img,
    Video,
    Article,
    SpecialPage,
    Error,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        PageType::SectionVisual,
        PageType::SectionArticle,
        PageType::Img,
        PageType::Video,
        PageType::Article,
        PageType::SpecialPage,
        PageType::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageType::SectionVisual => "sectionvisual",
            PageType::SectionArticle => "sectionarticle",
            PageType::Img => "img",
            PageType::Video => "video",
            PageType::Article => "article",
            PageType::SpecialPage => "specialpage",
            PageType::Error => "error",
        }
    }

    /// Section pages list the posts of one category.
    pub fn is_section(self) -> bool {
        matches!(self, PageType::SectionVisual | PageType::SectionArticle)
    }

    /// Leaf content: a single image, video, or article.
    pub fn is_post(self) -> bool {
        matches!(self, PageType::Img | PageType::Video | PageType::Article)
    }

    /// The post flavor this type belongs to, if any.
    pub fn flavor(self) -> Option<Flavor> {
        match self {
            PageType::SectionVisual | PageType::Img | PageType::Video => Some(Flavor::Visual),
            PageType::SectionArticle | PageType::Article => Some(Flavor::Article),
            PageType::SpecialPage | PageType::Error => None,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a `type` string names no known page type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPageType(pub String);

impl FromStr for PageType {
    type Err = UnknownPageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownPageType(s.to_string()))
    }
}

/// The two families of posts. Each has its own category index, feed,
/// curated subset, and navigation chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Visual,
    Article,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Visual => f.write_str("visual"),
            Flavor::Article => f.write_str("article"),
        }
    }
}

/// A published, normalized content record.
///
/// Serializes with the field names templates expect (`type`, `urlpath`,
/// `ishomepage`, ...); pass-through fields in `extra` are flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub category: Vec<String>,
    pub files: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(serialize_with = "serialize_date")]
    pub date: Option<NaiveDate>,
    pub selected: bool,
    pub specialpage: bool,
    pub urlpath: String,
    pub urlpathnonempty: String,
    pub ishomepage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Set on a `latest` homepage so readers can page into the latest feed.
    /// Templates read it as `hackurl`.
    #[serde(rename = "hackurl", skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Page {
    /// Look up a pass-through string field such as `thumbnail`.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// Whether this page takes part in category indexing and navigation.
    pub fn is_indexable(&self) -> bool {
        !self.specialpage && !self.category.is_empty()
    }
}

fn serialize_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => s.serialize_str(""),
    }
}

/// Navigation arrows for one post: `<< < > >>`, as urlpaths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLinks {
    pub first: String,
    pub prev: String,
    pub next: String,
    pub last: String,
}

/// One sidebar entry, in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarItem {
    pub urlpath: String,
    pub name: String,
}
