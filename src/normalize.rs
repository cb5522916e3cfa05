//! Record normalization.
//!
//! Stage 2 of the build. Turns published [`RawRecord`]s into [`Page`]s:
//! unpublished records are dropped, list fields are split, the url key is
//! trimmed, and every page gets its output path. The homepage is the one page
//! whose `urlpath` is empty; its natural path survives in `urlpathnonempty`
//! for the duplicate-home pass.
//!
//! Fields an author left out take their defaults here (empty name, no date,
//! empty lists). Whether leaving them out is acceptable is decided earlier by
//! [`crate::validate::check_required_fields`].

use crate::error::BuildError;
use crate::load::RawRecord;
use crate::types::{Page, PageType};
use chrono::NaiveDate;

/// Url key of the page that always shows the newest visual post.
pub const LATEST_URL: &str = "latest";

/// Keys the pipeline computes. Raw values under these names are discarded
/// so the computed ones are what templates see.
const DERIVED_KEYS: &[&str] = &["ishomepage", "urlpathnonempty", "hackurl"];

/// Optional knobs for [`url_path_of`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlPathOptions<'a> {
    /// Place the page under this directory instead of its default location.
    pub prefix: Option<&'a str>,
    /// Use this path verbatim.
    pub override_path: Option<&'a str>,
}

/// Compute the root-relative path a page is rendered at.
///
/// The rules form a strict precedence chain, first match wins:
///
/// 1. an override is returned verbatim
/// 2. a prefix gives `prefix/url`
/// 3. `latest` lives at `latest/1`, leaving room for `latest/2`, ...
/// 4. special pages live at their url key
/// 5. sections live at their url key
/// 6. posts live under `post/`
///
/// Types not covered above (`specialpage` and `error` records without the
/// special flag) fall back to the url key.
pub fn url_path_of(
    url: &str,
    page_type: PageType,
    specialpage: bool,
    options: UrlPathOptions<'_>,
) -> String {
    if let Some(path) = options.override_path.filter(|p| !p.is_empty()) {
        return path.to_string();
    }
    if let Some(prefix) = options.prefix.filter(|p| !p.is_empty()) {
        return format!("{prefix}/{url}");
    }
    if url == LATEST_URL {
        return format!("{LATEST_URL}/1");
    }
    if specialpage || page_type.is_section() {
        return url.to_string();
    }
    match page_type {
        PageType::Img | PageType::Video | PageType::Article => format!("post/{url}"),
        PageType::SectionVisual
        | PageType::SectionArticle
        | PageType::SpecialPage
        | PageType::Error => url.to_string(),
    }
}

/// Normalize one collection. Output order is input order.
pub fn normalize(records: &[RawRecord], homepage_url: &str) -> Result<Vec<Page>, BuildError> {
    records
        .iter()
        .filter(|r| r.publish)
        .map(|r| normalize_record(r, homepage_url))
        .collect()
}

/// Normalize a single published record.
pub fn normalize_record(record: &RawRecord, homepage_url: &str) -> Result<Page, BuildError> {
    let url = record.key().to_string();
    let raw_type = record.page_type.as_deref().unwrap_or("").trim();
    let page_type: PageType = raw_type.parse().map_err(|_| BuildError::UnknownType {
        url: url.clone(),
        page_type: raw_type.to_string(),
    })?;
    let date = parse_date(&url, record.date.as_deref())?;

    let natural_path = match record.urlpath.as_deref().filter(|p| !p.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => url_path_of(&url, page_type, record.specialpage, UrlPathOptions::default()),
    };
    let ishomepage = url == homepage_url;
    let urlpath = if ishomepage {
        String::new()
    } else {
        natural_path.clone()
    };

    let mut extra = record.extra.clone();
    extra.retain(|key, _| !DERIVED_KEYS.contains(&key.as_str()));

    Ok(Page {
        name: record.name.clone().unwrap_or_default(),
        page_type,
        category: record.category.split(),
        files: record.files.split(),
        keywords: record.keywords.split(),
        date,
        selected: record.selected,
        specialpage: record.specialpage,
        urlpath,
        urlpathnonempty: natural_path,
        ishomepage,
        template: record.template.clone().filter(|t| !t.is_empty()),
        forward: None,
        extra,
        url,
    })
}

fn parse_date(url: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, BuildError> {
    let Some(raw) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BuildError::InvalidDate {
            url: url.to_string(),
            date: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::raw;
    use serde_json::json;

    #[test]
    fn url_path_precedence() {
        let none = UrlPathOptions::default();
        assert_eq!(url_path_of("dawn", PageType::Img, false, none), "post/dawn");
        assert_eq!(url_path_of("essay", PageType::Article, false, none), "post/essay");
        assert_eq!(url_path_of("wine", PageType::SectionVisual, false, none), "wine");
        assert_eq!(url_path_of("about", PageType::Article, true, none), "about");
        assert_eq!(url_path_of("latest", PageType::Img, true, none), "latest/1");
        assert_eq!(url_path_of("404", PageType::Error, false, none), "404");
    }

    #[test]
    fn override_beats_prefix_beats_latest() {
        let prefixed = UrlPathOptions {
            prefix: Some("archive"),
            override_path: None,
        };
        assert_eq!(
            url_path_of("latest", PageType::Img, true, prefixed),
            "archive/latest"
        );
        let both = UrlPathOptions {
            prefix: Some("archive"),
            override_path: Some("elsewhere"),
        };
        assert_eq!(url_path_of("latest", PageType::Img, true, both), "elsewhere");
    }

    #[test]
    fn special_flag_beats_post_type() {
        // `cover` is an article-typed special page and must not land under post/
        let none = UrlPathOptions::default();
        assert_eq!(url_path_of("cover", PageType::Article, true, none), "cover");
    }

    #[test]
    fn url_path_is_total_and_deterministic() {
        for t in PageType::ALL {
            for special in [false, true] {
                let a = url_path_of("x", t, special, UrlPathOptions::default());
                let b = url_path_of("x", t, special, UrlPathOptions::default());
                assert_eq!(a, b);
                assert!(!a.is_empty());
            }
        }
    }

    #[test]
    fn normalize_drops_unpublished_and_keeps_order() {
        let records = vec![
            raw(json!({"url": "b", "type": "img", "publish": 1})),
            raw(json!({"url": "a", "type": "img", "publish": 0})),
            raw(json!({"url": "c", "type": "video", "publish": 1})),
        ];
        let pages = normalize(&records, "").unwrap();
        let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c"]);
    }

    #[test]
    fn normalize_splits_fields_without_touching_input() {
        let records = vec![raw(json!({
            "url": "  dawn ",
            "type": "img",
            "publish": 1,
            "category": "travel, food",
            "files": "a.jpg,b.jpg",
            "date": "2024-02-01"
        }))];
        let pages = normalize(&records, "").unwrap();
        let page = &pages[0];
        assert_eq!(page.url, "dawn");
        assert_eq!(page.category, vec!["travel", "food"]);
        assert_eq!(page.files, vec!["a.jpg", "b.jpg"]);
        assert!(page.keywords.is_empty());
        assert_eq!(page.date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(page.urlpath, "post/dawn");
        // The raw record is unchanged
        assert_eq!(records[0].url, "  dawn ");
    }

    #[test]
    fn homepage_is_blanked_and_keeps_natural_path() {
        let records = vec![
            raw(json!({"url": "cover", "type": "article", "publish": 1, "specialpage": 1})),
            raw(json!({"url": "wine", "type": "sectionvisual", "publish": 1})),
        ];
        let pages = normalize(&records, "cover").unwrap();
        assert!(pages[0].ishomepage);
        assert_eq!(pages[0].urlpath, "");
        assert_eq!(pages[0].urlpathnonempty, "cover");
        assert!(!pages[1].ishomepage);
        assert_eq!(pages[1].urlpath, pages[1].urlpathnonempty);
    }

    #[test]
    fn raw_values_cannot_override_derived_keys() {
        let records = vec![raw(json!({
            "url": "p1",
            "type": "img",
            "publish": 1,
            "ishomepage": true,
            "urlpathnonempty": "elsewhere",
            "hackurl": "latest/9",
            "border": "thin"
        }))];
        let page = &normalize(&records, "selected").unwrap()[0];
        assert!(!page.extra.contains_key("ishomepage"));
        assert_eq!(page.extra_str("border"), Some("thin"));

        let content = serde_json::to_value(page).unwrap();
        assert_eq!(content["ishomepage"], false);
        assert_eq!(content["urlpathnonempty"], "post/p1");
        assert!(content.get("hackurl").is_none());
    }

    #[test]
    fn explicit_urlpath_passes_through() {
        let records = vec![raw(
            json!({"url": "dawn", "type": "img", "publish": 1, "urlpath": "photos/dawn"}),
        )];
        let pages = normalize(&records, "").unwrap();
        assert_eq!(pages[0].urlpath, "photos/dawn");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let records = vec![raw(json!({"url": "x", "type": "gallery", "publish": 1}))];
        assert!(matches!(
            normalize(&records, ""),
            Err(BuildError::UnknownType { .. })
        ));
    }

    #[test]
    fn malformed_date_is_an_error() {
        let records = vec![raw(json!({"url": "x", "type": "img", "publish": 1, "date": "01/02/2024"}))];
        assert!(matches!(
            normalize(&records, ""),
            Err(BuildError::InvalidDate { .. })
        ));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let records = vec![raw(json!({"url": "x", "type": "img", "publish": 1}))];
        let page = &normalize(&records, "").unwrap()[0];
        assert_eq!(page.name, "");
        assert_eq!(page.date, None);
        assert!(page.category.is_empty());
        assert!(!page.selected);
        assert!(page.template.is_none());
    }
}
