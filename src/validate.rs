//! Uniqueness and integrity checks.
//!
//! Stage 3 of the build. Every check either passes, fails with a
//! [`BuildError`] that aborts the build, or returns [`Warning`]s that are
//! logged and carried into the build report.
//!
//! ## Fatal vs. Non-Fatal
//!
//! | Check | Outcome |
//! |-------|---------|
//! | duplicate url / urlpath | [`BuildError::DuplicateKey`] |
//! | duplicate section category | [`BuildError::DuplicateCategory`] |
//! | reserved url key | [`BuildError::ReservedUrl`] |
//! | unknown or missing type | [`BuildError::UnknownType`] |
//! | missing required fields | error in strict mode, warning otherwise |
//! | homepage / sidebar / home link | [`BuildError::MissingReference`] |
//! | empty visual feed when needed | [`BuildError::EmptyFeed`] |
//! | media, CSS, JS files | [`BuildError::MissingFile`] |
//! | templates | [`BuildError::MissingTemplate`] |
//! | categories, favicon, avatar | warning |

use crate::config::{AssetManifest, NORMALIZED_FIELDS, RESERVED, SiteSection, TemplateTable};
use crate::error::BuildError;
use crate::index::CategoryIndex;
use crate::load::RawRecord;
use crate::normalize::LATEST_URL;
use crate::render::Renderer;
use crate::types::{Flavor, Page, PageType};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A problem that degrades the site but does not stop the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    NoCategory { url: String },
    MultipleCategories { url: String, categories: Vec<String> },
    UnknownCategory { url: String, category: String },
    EmptyCategory { flavor: Flavor, category: String },
    SectionWithoutCategory { url: String },
    SectionCategoryMissing { url: String, category: String },
    MissingFields { url: String, fields: Vec<String> },
    MissingArticleBody { url: String, path: PathBuf },
    MissingAsset(PathBuf),
    NoFavicon,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoCategory { url } => write!(f, "post {url} has no category"),
            Warning::MultipleCategories { url, categories } => write!(
                f,
                "post {url} has multiple categories {categories:?}; only the first drives nav arrows"
            ),
            Warning::UnknownCategory { url, category } => {
                write!(f, "post {url} has unknown category ({category})")
            }
            Warning::EmptyCategory { flavor, category } => {
                write!(f, "there are no {flavor} posts for category: {category}")
            }
            Warning::SectionWithoutCategory { url } => {
                write!(f, "no category for section page: {url}")
            }
            Warning::SectionCategoryMissing { url, category } => {
                write!(f, "section page {url} lists category {category} but it has no posts")
            }
            Warning::MissingFields { url, fields } => {
                write!(f, "missing keys for {url}: {fields:?}")
            }
            Warning::MissingArticleBody { url, path } => {
                write!(f, "cannot read article body for {url} at {}", path.display())
            }
            Warning::MissingAsset(path) => write!(f, "file not found: {}", path.display()),
            Warning::NoFavicon => f.write_str("no favicon configured"),
        }
    }
}

// ============================================================================
// Key checks
// ============================================================================

/// Values that occur more than once, each listed once, in the order their
/// second occurrence is seen.
pub fn find_duplicates<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for key in keys {
        if !seen.insert(key) && reported.insert(key) {
            duplicates.push(key.to_string());
        }
    }
    duplicates
}

/// Fail if any key repeats. `attribute` names the key in the error.
pub fn check_unique<'a>(
    attribute: &'static str,
    keys: impl IntoIterator<Item = &'a str>,
) -> Result<(), BuildError> {
    let values = find_duplicates(keys);
    if values.is_empty() {
        Ok(())
    } else {
        Err(BuildError::DuplicateKey { attribute, values })
    }
}

/// No two sections may share a primary category. Sections without a
/// category are ignored here and warned about when they render.
pub fn check_unique_category(sections: &[RawRecord]) -> Result<(), BuildError> {
    let primaries: Vec<String> = sections.iter().filter_map(RawRecord::primary_category).collect();
    let duplicates = find_duplicates(primaries.iter().map(String::as_str));
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(BuildError::DuplicateCategory(duplicates))
    }
}

/// Sections and posts may not take a url key the special pages own.
pub fn check_reserved_words<'a>(
    records: impl IntoIterator<Item = &'a RawRecord>,
) -> Result<(), BuildError> {
    match records.into_iter().find(|r| RESERVED.contains(&r.key())) {
        Some(r) => Err(BuildError::ReservedUrl(r.key().to_string())),
        None => Ok(()),
    }
}

/// Every record, published or not, must carry a known `type`.
pub fn check_types<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Result<(), BuildError> {
    for record in records {
        let raw_type = record.page_type.as_deref().unwrap_or("").trim();
        if raw_type.parse::<PageType>().is_err() {
            return Err(BuildError::UnknownType {
                url: record.key().to_string(),
                page_type: raw_type.to_string(),
            });
        }
    }
    Ok(())
}

/// Published records must declare every key in `required`.
///
/// The list fields in [`NORMALIZED_FIELDS`] always exist once a record is
/// normalized, so leaving them out is never an error.
///
/// Strict mode fails on the first incomplete record; otherwise each one
/// produces a warning and normalization fills the gaps with defaults.
pub fn check_required_fields(
    records: &[RawRecord],
    required: &[&str],
    strict: bool,
) -> Result<Vec<Warning>, BuildError> {
    let mut warnings = Vec::new();
    for record in records.iter().filter(|r| r.publish) {
        let fields: Vec<String> = required
            .iter()
            .filter(|f| !record.declared.contains(**f) && !NORMALIZED_FIELDS.contains(*f))
            .map(|f| f.to_string())
            .collect();
        if fields.is_empty() {
            continue;
        }
        let url = record.key().to_string();
        if strict {
            return Err(BuildError::MissingField { url, fields });
        }
        warnings.push(Warning::MissingFields { url, fields });
    }
    Ok(warnings)
}

// ============================================================================
// Reference checks
// ============================================================================

/// The homepage, sidebar entries, and home link must name published pages.
pub fn check_references(site: &SiteSection, published: &[Page]) -> Result<(), BuildError> {
    let keys: HashSet<&str> = published.iter().map(|p| p.url.as_str()).collect();
    let missing = |what: &'static str, key: &str| BuildError::MissingReference {
        what,
        key: key.to_string(),
    };

    if site.homepage.is_empty() || !keys.contains(site.homepage.as_str()) {
        return Err(missing("Homepage", &site.homepage));
    }
    if site.sidebar.is_empty() {
        return Err(missing("Sidebar", ""));
    }
    if let Some(entry) = site.sidebar.iter().find(|k| !keys.contains(k.as_str())) {
        return Err(missing("Sidebar", entry));
    }
    if !site.homelink.is_empty() && !keys.contains(site.homelink.as_str()) {
        return Err(missing("Homelink", &site.homelink));
    }
    Ok(())
}

/// `latest` and `feed` render the visual feed, so it must not be empty when
/// either is published or `latest` is the homepage.
pub fn check_feed(homepage: &str, published: &[Page], visual_feed: &[Page]) -> Result<(), BuildError> {
    if !visual_feed.is_empty() {
        return Ok(());
    }
    if homepage == LATEST_URL {
        return Err(BuildError::EmptyFeed(format!("homepage {LATEST_URL:?}")));
    }
    match published
        .iter()
        .find(|p| p.url == LATEST_URL || p.url == "feed")
    {
        Some(page) => Err(BuildError::EmptyFeed(format!("page {:?}", page.url))),
        None => Ok(()),
    }
}

// ============================================================================
// Category checks
// ============================================================================

/// Categories declared by published sections of one flavor, in order.
pub fn declared_categories(sections: &[Page], flavor: Flavor) -> Vec<String> {
    let section_type = match flavor {
        Flavor::Visual => PageType::SectionVisual,
        Flavor::Article => PageType::SectionArticle,
    };
    sections
        .iter()
        .filter(|s| s.page_type == section_type)
        .flat_map(|s| s.category.iter().cloned())
        .collect()
}

/// Warn about uncategorized, multi-category, and unknown-category posts, and
/// about declared categories nobody posts to. Special pages are skipped.
pub fn check_categories(
    flavor: Flavor,
    declared: &[String],
    posts: &[Page],
    index: &CategoryIndex,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for post in posts.iter().filter(|p| !p.specialpage) {
        if post.category.is_empty() {
            warnings.push(Warning::NoCategory {
                url: post.url.clone(),
            });
            continue;
        }
        if post.category.len() > 1 {
            warnings.push(Warning::MultipleCategories {
                url: post.url.clone(),
                categories: post.category.clone(),
            });
        }
        for category in post.category.iter().filter(|c| !declared.contains(c)) {
            warnings.push(Warning::UnknownCategory {
                url: post.url.clone(),
                category: category.clone(),
            });
        }
    }
    for category in declared.iter().filter(|c| !index.contains(c)) {
        warnings.push(Warning::EmptyCategory {
            flavor,
            category: category.clone(),
        });
    }
    warnings
}

// ============================================================================
// File checks
// ============================================================================

/// Every file must exist under `dir`.
pub fn check_paths_exist<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = &'a str>,
) -> Result<(), BuildError> {
    for file in files {
        let path = dir.join(file);
        tracing::debug!("Checking file existence: {}", path.display());
        if !path.is_file() {
            return Err(BuildError::MissingFile(path));
        }
    }
    Ok(())
}

/// Thumbnails and media of published visual posts, in the data directory
/// and in the output tree.
pub fn check_media(data_dir: &Path, output_dir: &Path, visual: &[Page]) -> Result<(), BuildError> {
    let thumbnails: Vec<&str> = visual
        .iter()
        .filter_map(|p| p.extra_str("thumbnail"))
        .filter(|t| !t.is_empty())
        .collect();
    let files_of = |page_type: PageType| -> Vec<&str> {
        visual
            .iter()
            .filter(|p| p.page_type == page_type)
            .flat_map(|p| p.files.iter().map(String::as_str))
            .collect()
    };
    let images = files_of(PageType::Img);
    let videos = files_of(PageType::Video);

    for (img_dir, video_dir) in [
        (data_dir.join("published/img"), data_dir.join("published/video")),
        (output_dir.join("static/img"), output_dir.join("static/video")),
    ] {
        check_paths_exist(&img_dir, thumbnails.iter().copied())?;
        check_paths_exist(&img_dir, images.iter().copied())?;
        check_paths_exist(&video_dir, videos.iter().copied())?;
    }
    Ok(())
}

/// Stylesheets and scripts named anywhere in the manifests.
pub fn check_assets(
    output_dir: &Path,
    css: &AssetManifest,
    js: &AssetManifest,
) -> Result<(), BuildError> {
    check_paths_exist(output_dir, css.all_files())?;
    check_paths_exist(output_dir, js.all_files())
}

/// Favicon and avatar are optional; missing ones only warn.
pub fn check_site_images(output_dir: &Path, site: &SiteSection) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if !site.avatar.is_empty() && !output_dir.join(&site.avatar).is_file() {
        warnings.push(Warning::MissingAsset(output_dir.join(&site.avatar)));
    }
    if site.favicon.is_empty() {
        warnings.push(Warning::NoFavicon);
    } else if !output_dir.join(&site.favicon).is_file() {
        warnings.push(Warning::MissingAsset(output_dir.join(&site.favicon)));
    }
    warnings
}

/// Every template in the type table and every per-page override must load.
pub fn check_templates<R: Renderer + ?Sized>(
    renderer: &R,
    table: &TemplateTable,
    pages: &[Page],
) -> Result<(), BuildError> {
    for (kind, template) in table {
        if !renderer.has_template(template) {
            return Err(BuildError::missing_template(&format!("[templates] {kind}"), template));
        }
    }
    for page in pages {
        if let Some(template) = &page.template
            && !renderer.has_template(template)
        {
            return Err(BuildError::missing_template(&page.url, template));
        }
    }
    Ok(())
}
