//! Per-page resolution.
//!
//! Decides, for one published page, which posts it lists, which navigation
//! arrows it shows, which extra stylesheets and scripts it loads, and which
//! template renders it. The aliased pages are handled here:
//!
//! - `selected` lists the curated visual posts
//! - `feed` lists the visual feed
//! - `latest` turns into a copy of the newest visual post, keeping its own
//!   urlpath and homepage flag
//!
//! Resolution is pure: nothing is read from or written to disk.

use crate::config::SiteConfig;
use crate::error::BuildError;
use crate::nav::NavChains;
use crate::normalize::LATEST_URL;
use crate::render::resolve_template;
use crate::site::Site;
use crate::types::{Flavor, NavLinks, Page, PageType};
use crate::validate::Warning;
use std::fmt;

/// How a generated page is labelled in the console listing and build log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Homepage,
    SpecialPage,
    Type(PageType),
}

impl Marker {
    pub fn of(page: &Page) -> Self {
        if page.ishomepage {
            Marker::Homepage
        } else if page.specialpage {
            Marker::SpecialPage
        } else {
            Marker::Type(page.page_type)
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Homepage => f.write_str("homepage"),
            Marker::SpecialPage => f.write_str("specialpage"),
            Marker::Type(t) => f.write_str(t.as_str()),
        }
    }
}

/// A page with everything it needs to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPage {
    /// The page itself, or the post standing in for `latest`.
    pub page: Page,
    pub posts: Vec<Page>,
    pub nav: Option<NavLinks>,
    /// Type- then url-specific stylesheets, appended to the base list.
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub template: String,
    pub marker: Marker,
}

/// Resolve one published page against the site.
///
/// Returns warnings for sections whose posts cannot be found.
pub fn resolve_page(site: &Site, page: &Page) -> Result<(ResolvedPage, Vec<Warning>), BuildError> {
    let mut warnings = Vec::new();
    let posts = posts_for(site, page, &mut warnings);

    let nav = match (page.url.as_str(), page.page_type.flavor()) {
        ("cover" | LATEST_URL, _) => None,
        (_, Some(flavor)) if page.page_type.is_post() => {
            site.flavor(flavor).nav.get(&page.url).cloned()
        }
        _ => None,
    };

    let page = if page.url == LATEST_URL {
        stand_in_for_latest(site, page)?
    } else {
        page.clone()
    };

    let resolved = finish(&site.config, page, posts, nav, None)?;
    Ok((resolved, warnings))
}

/// Resolve the pages of the latest feed: each visual feed entry at
/// `latest/{n}`, chained together in one bucket.
pub fn resolve_latest_feed(site: &Site) -> Result<Vec<ResolvedPage>, BuildError> {
    let entries: Vec<Page> = site
        .visual
        .feed
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let mut entry = post.clone();
            entry.urlpath = format!("{LATEST_URL}/{}", i + 1);
            entry.urlpathnonempty = entry.urlpath.clone();
            entry.ishomepage = false;
            entry.extra.insert("showdate".into(), serde_json::json!(1));
            entry
        })
        .collect();
    let chains: NavChains = crate::nav::build_nav_chain(&entries);

    entries
        .into_iter()
        .map(|entry| {
            let nav = chains.get(&entry.url).cloned();
            finish(&site.config, entry, Vec::new(), nav, Some(Marker::SpecialPage))
        })
        .collect()
}

fn posts_for(site: &Site, page: &Page, warnings: &mut Vec<Warning>) -> Vec<Page> {
    if page.url == "selected" {
        return site.visual.selected.clone();
    }
    if page.url == "feed" {
        return site.visual.feed.clone();
    }
    let flavor = match page.page_type {
        PageType::SectionVisual => Flavor::Visual,
        PageType::SectionArticle => Flavor::Article,
        _ => return Vec::new(),
    };
    let Some(category) = page.category.first() else {
        warnings.push(Warning::SectionWithoutCategory {
            url: page.url.clone(),
        });
        return Vec::new();
    };
    match site.flavor(flavor).categories.get(category) {
        Some(posts) => posts.to_vec(),
        None => {
            warnings.push(Warning::SectionCategoryMissing {
                url: page.url.clone(),
                category: category.clone(),
            });
            Vec::new()
        }
    }
}

fn stand_in_for_latest(site: &Site, placeholder: &Page) -> Result<Page, BuildError> {
    let newest = site
        .visual
        .feed
        .first()
        .ok_or_else(|| BuildError::EmptyFeed(format!("page {LATEST_URL:?}")))?;
    let mut page = newest.clone();
    page.extra.insert("showdate".into(), serde_json::json!(1));
    page.ishomepage = placeholder.ishomepage;
    page.urlpath = placeholder.urlpath.clone();

    let feed = &site.config.feed;
    if page.ishomepage && feed.latest_feed && feed.size > 1 && site.visual.feed.len() > 1 {
        page.forward = Some(format!("{LATEST_URL}/2"));
    }
    Ok(page)
}

fn finish(
    config: &SiteConfig,
    page: Page,
    posts: Vec<Page>,
    nav: Option<NavLinks>,
    marker: Option<Marker>,
) -> Result<ResolvedPage, BuildError> {
    let kind = page.page_type.as_str();
    let css = config.css.manifest().extras_for(kind, &page.url);
    let js = config.js.extras_for(kind, &page.url);
    let template = resolve_template(&config.templates, page.page_type, page.template.as_deref())
        .ok_or_else(|| BuildError::missing_template(&page.url, &format!("<{kind}>")))?
        .to_string();
    Ok(ResolvedPage {
        marker: marker.unwrap_or_else(|| Marker::of(&page)),
        page,
        posts,
        nav,
        css,
        js,
        template,
    })
}
