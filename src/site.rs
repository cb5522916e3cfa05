//! The resolved site graph.
//!
//! [`prepare`] runs every content check in a fixed order, normalizes the
//! collections, and derives the read-only structures rendering needs: one
//! [`FlavorIndex`] per post flavor, the sidebar, and the home link.
//!
//! ## Check Order
//!
//! ```text
//! types → reserved urls → section categories → url uniqueness
//!       → required fields → normalize → urlpath uniqueness
//!       → references → feed → categories
//! ```
//!
//! The first failure aborts. File checks need the output and templates
//! directories and run separately through [`Site::check_files`].

use crate::config::{REQUIRED_POST_FIELDS, REQUIRED_SECTION_FIELDS, SiteConfig};
use crate::error::BuildError;
use crate::feed::{build_feed, select_curated};
use crate::index::{CategoryIndex, build_category_index};
use crate::load::{ContentSet, RawRecord};
use crate::nav::{NavChains, build_nav_chains};
use crate::normalize::normalize;
use crate::render::Renderer;
use crate::types::{Flavor, Page, SidebarItem};
use crate::validate::{self, Warning};
use std::path::Path;
use tracing::{debug, warn};

/// Everything derived from one flavor of posts.
#[derive(Debug, Clone, Default)]
pub struct FlavorIndex {
    /// Published posts, in input order.
    pub posts: Vec<Page>,
    pub categories: CategoryIndex,
    /// Newest first, at most `feed.size` posts.
    pub feed: Vec<Page>,
    pub selected: Vec<Page>,
    pub nav: NavChains,
    /// Categories named by published sections of this flavor.
    pub declared: Vec<String>,
}

impl FlavorIndex {
    fn build(flavor: Flavor, posts: Vec<Page>, sections: &[Page], feed_size: usize) -> Self {
        let categories = build_category_index(&posts);
        let nav = build_nav_chains(&categories);
        Self {
            feed: build_feed(&posts, feed_size),
            selected: select_curated(&posts),
            declared: validate::declared_categories(sections, flavor),
            categories,
            nav,
            posts,
        }
    }
}

/// A validated, normalized site ready to render.
#[derive(Debug, Clone)]
pub struct Site {
    pub config: SiteConfig,
    pub special: Vec<Page>,
    pub sections: Vec<Page>,
    pub visual: FlavorIndex,
    pub article: FlavorIndex,
    pub sidebar: Vec<SidebarItem>,
    /// Urlpath of the home-link page, or empty for the root.
    pub homelink: String,
    pub warnings: Vec<Warning>,
}

impl Site {
    /// Every published page: special pages, sections, visual, then article posts.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.special
            .iter()
            .chain(&self.sections)
            .chain(&self.visual.posts)
            .chain(&self.article.posts)
    }

    /// Look up a published page by url key.
    pub fn page(&self, url: &str) -> Option<&Page> {
        self.pages().find(|p| p.url == url)
    }

    pub fn flavor(&self, flavor: Flavor) -> &FlavorIndex {
        match flavor {
            Flavor::Visual => &self.visual,
            Flavor::Article => &self.article,
        }
    }

    /// Check that media, stylesheets, scripts, and templates exist.
    ///
    /// Missing favicon or avatar files only warn; the warnings are returned
    /// and logged.
    pub fn check_files<R: Renderer + ?Sized>(
        &self,
        data_dir: &Path,
        output_dir: &Path,
        renderer: &R,
    ) -> Result<Vec<Warning>, BuildError> {
        validate::check_media(data_dir, output_dir, &self.visual.posts)?;
        let pages: Vec<Page> = self.pages().cloned().collect();
        validate::check_templates(renderer, &self.config.templates, &pages)?;
        validate::check_assets(output_dir, &self.config.css.manifest(), &self.config.js)?;
        Ok(logged(validate::check_site_images(output_dir, &self.config.site)))
    }
}

/// Validate and resolve raw content against a config.
///
/// `strict` turns missing required fields into errors.
pub fn prepare(config: SiteConfig, content: &ContentSet, strict: bool) -> Result<Site, BuildError> {
    validate::check_types(content.all())?;
    validate::check_reserved_words(content.authored())?;
    validate::check_unique_category(&content.sections)?;
    validate::check_unique("url", content.all().map(RawRecord::key))?;

    let mut warnings = Vec::new();
    warnings.extend(validate::check_required_fields(
        &content.sections,
        REQUIRED_SECTION_FIELDS,
        strict,
    )?);
    for posts in [&content.visual, &content.article] {
        warnings.extend(validate::check_required_fields(posts, REQUIRED_POST_FIELDS, strict)?);
    }

    let homepage = config.site.homepage.as_str();
    let special = normalize(&content.special, homepage)?;
    let sections = normalize(&content.sections, homepage)?;
    let visual = normalize(&content.visual, homepage)?;
    let article = normalize(&content.article, homepage)?;
    debug!(
        "Published: {} special, {} sections, {} visual, {} article",
        special.len(),
        sections.len(),
        visual.len(),
        article.len()
    );

    let published: Vec<Page> = special
        .iter()
        .chain(&sections)
        .chain(&visual)
        .chain(&article)
        .cloned()
        .collect();
    validate::check_unique("urlpath", published.iter().map(|p| p.urlpath.as_str()))?;
    validate::check_references(&config.site, &published)?;

    let visual = FlavorIndex::build(Flavor::Visual, visual, &sections, config.feed.size);
    let article = FlavorIndex::build(Flavor::Article, article, &sections, config.feed.size);
    validate::check_feed(homepage, &published, &visual.feed)?;

    for (flavor, index) in [(Flavor::Visual, &visual), (Flavor::Article, &article)] {
        warnings.extend(validate::check_categories(
            flavor,
            &index.declared,
            &index.posts,
            &index.categories,
        ));
    }

    let find = |url: &str| published.iter().find(|p| p.url == url);
    let sidebar = config
        .site
        .sidebar
        .iter()
        .filter_map(|url| find(url.as_str()))
        .map(|p| SidebarItem {
            urlpath: p.urlpath.clone(),
            name: p.name.clone(),
        })
        .collect();
    let homelink = match config.site.homelink.as_str() {
        "" => String::new(),
        url => find(url).map(|p| p.urlpath.clone()).unwrap_or_default(),
    };

    Ok(Site {
        config,
        special,
        sections,
        visual,
        article,
        sidebar,
        homelink,
        warnings: logged(warnings),
    })
}

/// Emit each warning through tracing and pass them on.
pub(crate) fn logged(warnings: Vec<Warning>) -> Vec<Warning> {
    for w in &warnings {
        warn!("{w}");
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{content, record, urls};
    use serde_json::json;

    fn config(homepage: &str) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.homepage = homepage.to_string();
        config
    }

    fn travel_site() -> ContentSet {
        content(
            vec![record("travel", "sectionvisual", json!({"name": "Travel", "category": "travel"}))],
            vec![
                record("a", "img", json!({"category": "travel", "date": "2024-01-01", "selected": 1})),
                record("b", "img", json!({"category": "travel", "date": "2024-02-01"})),
            ],
            vec![],
        )
    }

    #[test]
    fn prepare_builds_flavor_views() {
        let site = prepare(config("selected"), &travel_site(), false).unwrap();
        assert_eq!(urls(&site.visual.feed), vec!["b", "a"]);
        assert_eq!(urls(&site.visual.selected), vec!["a"]);
        assert_eq!(site.visual.declared, vec!["travel"]);
        assert_eq!(site.visual.nav["a"].next, "post/b");
        assert!(site.article.posts.is_empty());
        // cover is unpublished by default
        assert!(site.page("cover").is_none());
        assert_eq!(site.page("selected").unwrap().urlpath, "");
    }

    #[test]
    fn sidebar_follows_configured_order() {
        let site = prepare(config("selected"), &travel_site(), false).unwrap();
        let paths: Vec<_> = site.sidebar.iter().map(|s| s.urlpath.as_str()).collect();
        // latest → latest/1, selected is the homepage, feed → feed
        assert_eq!(paths, vec!["latest/1", "", "feed"]);
        assert_eq!(site.sidebar[0].name, "Latest");
    }

    #[test]
    fn homelink_resolves_to_urlpath() {
        let mut cfg = config("selected");
        cfg.site.homelink = "travel".into();
        let site = prepare(cfg, &travel_site(), false).unwrap();
        assert_eq!(site.homelink, "travel");
    }

    #[test]
    fn strict_mode_requires_fields() {
        assert!(matches!(
            prepare(config("selected"), &travel_site(), true),
            Err(BuildError::MissingField { .. })
        ));
        let site = prepare(config("selected"), &travel_site(), false).unwrap();
        assert!(site.warnings.iter().any(|w| matches!(w, Warning::MissingFields { .. })));
    }

    /// A post declaring every required field except those in `omit`.
    fn complete_post(url: &str, omit: &[&str]) -> RawRecord {
        let mut map = serde_json::Map::new();
        for field in REQUIRED_POST_FIELDS.iter().filter(|f| !omit.contains(*f)) {
            map.insert(field.to_string(), json!(""));
        }
        map.insert("url".into(), json!(url));
        map.insert("type".into(), json!("img"));
        map.insert("publish".into(), json!(1));
        map.insert("category".into(), json!("travel"));
        map.insert("date".into(), json!("2024-01-01"));
        RawRecord::from_map(map).unwrap()
    }

    #[test]
    fn strict_mode_accepts_posts_without_list_fields() {
        let set = content(vec![], vec![complete_post("p1", &["files", "keywords"])], vec![]);
        let site = prepare(config("selected"), &set, true).unwrap();
        let p1 = &site.visual.posts[0];
        assert!(p1.files.is_empty());
        assert!(p1.keywords.is_empty());
        assert!(!site.warnings.iter().any(|w| matches!(w, Warning::MissingFields { .. })));
    }

    #[test]
    fn strict_mode_still_rejects_other_gaps() {
        let set = content(vec![], vec![complete_post("p1", &["files", "showdate"])], vec![]);
        assert!(matches!(
            prepare(config("selected"), &set, true),
            Err(BuildError::MissingField { fields, .. }) if fields == vec!["showdate"]
        ));
    }

    #[test]
    fn duplicate_url_across_collections_is_fatal() {
        let mut set = travel_site();
        set.article.push(record("a", "article", json!({})));
        assert!(matches!(
            prepare(config("selected"), &set, false),
            Err(BuildError::DuplicateKey { attribute: "url", .. })
        ));
    }

    #[test]
    fn duplicate_urlpath_is_fatal() {
        let mut set = travel_site();
        set.visual.push(record("c", "img", json!({"urlpath": "post/a", "category": "travel"})));
        assert!(matches!(
            prepare(config("selected"), &set, false),
            Err(BuildError::DuplicateKey { attribute: "urlpath", .. })
        ));
    }

    #[test]
    fn reserved_section_url_is_fatal() {
        let mut set = travel_site();
        set.sections.push(record("post", "sectionvisual", json!({"category": "x"})));
        assert!(matches!(
            prepare(config("selected"), &set, false),
            Err(BuildError::ReservedUrl(_))
        ));
    }

    #[test]
    fn unknown_homepage_is_fatal() {
        assert!(matches!(
            prepare(config("nowhere"), &travel_site(), false),
            Err(BuildError::MissingReference { what: "Homepage", .. })
        ));
    }

    #[test]
    fn published_feed_page_needs_posts() {
        let set = content(vec![], vec![], vec![]);
        assert!(matches!(
            prepare(config("selected"), &set, false),
            Err(BuildError::EmptyFeed(_))
        ));
    }

    #[test]
    fn section_without_posts_only_warns() {
        let mut set = travel_site();
        set.sections
            .push(record("desserts", "sectionvisual", json!({"category": "desserts"})));
        let site = prepare(config("selected"), &set, false).unwrap();
        assert!(site.warnings.contains(&Warning::EmptyCategory {
            flavor: Flavor::Visual,
            category: "desserts".into()
        }));
    }
}
