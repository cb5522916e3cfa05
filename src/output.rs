//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! A summary of the resolved site, printed once validation passes:
//!
//! ```text
//! Site
//!     Title: French Wines
//!     Domain: frenchwines.com
//!     Homepage: cover
//!     Home link: selected → /selected
//!     Duplicate homepage: yes
//! Categories
//!     Visual: bordeaux, burgundy
//!     Article: (none)
//! Special pages: cover, latest, selected, feed
//! Feed
//!     Size: 5
//!     Latest feed: off
//!     Visual: margaux, pomerol
//!     Article: (none)
//! Sidebar: latest, selected, feed
//! Assets
//!     Favicon: static/img/favicon.ico
//!     Avatar: (none)
//!     CSS: static/css/site.css (+1 by type, +0 by url)
//!     JS: (none) (+0 by type, +0 by url)
//! Templates
//!     article → post.article.html
//!     error → 404.html
//! ```
//!
//! ## Build
//!
//! One line per generated page, marker first, then the 404 page and a count:
//!
//! ```text
//! [homepage] Cover → /
//! [specialpage] Latest → /latest/1
//! [img] Margaux → /post/margaux
//! 404 → error.html
//! Generated 3 pages (1 warning)
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::AssetManifest;
use crate::generate::{BuildReport, LogRow};
use crate::site::Site;
use std::fs;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Comma-join a list, or `(none)` when empty.
fn list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn manifest_line(label: &str, manifest: &AssetManifest) -> String {
    let count = |m: &std::collections::BTreeMap<String, Vec<String>>| -> usize {
        m.values().map(Vec::len).sum()
    };
    format!(
        "{}{}: {} (+{} by type, +{} by url)",
        indent(1),
        label,
        list(&manifest.base),
        count(&manifest.by_type),
        count(&manifest.by_url)
    )
}

// ============================================================================
// Check: site summary
// ============================================================================

/// Format the summary of a validated site.
pub fn format_site_summary(site: &Site) -> Vec<String> {
    let config = &site.config;
    let mut lines = Vec::new();

    lines.push("Site".to_string());
    lines.push(format!("{}Title: {}", indent(1), or_none(&config.site.title)));
    lines.push(format!("{}Domain: {}", indent(1), or_none(&config.site.domain)));
    lines.push(format!("{}Homepage: {}", indent(1), config.site.homepage));
    if config.site.homelink.is_empty() {
        lines.push(format!("{}Home link: (root)", indent(1)));
    } else {
        lines.push(format!(
            "{}Home link: {} \u{2192} /{}",
            indent(1),
            config.site.homelink,
            site.homelink
        ));
    }
    lines.push(format!(
        "{}Duplicate homepage: {}",
        indent(1),
        yes_no(config.site.duplicate_home)
    ));

    lines.push("Categories".to_string());
    let keys = |index: &crate::index::CategoryIndex| index.keys().map(str::to_string).collect::<Vec<_>>();
    lines.push(format!("{}Visual: {}", indent(1), list(&keys(&site.visual.categories))));
    lines.push(format!("{}Article: {}", indent(1), list(&keys(&site.article.categories))));

    let special: Vec<&str> = site.special.iter().map(|p| p.url.as_str()).collect();
    lines.push(format!("Special pages: {}", list(&special)));

    lines.push("Feed".to_string());
    lines.push(format!("{}Size: {}", indent(1), config.feed.size));
    lines.push(format!(
        "{}Latest feed: {}",
        indent(1),
        if config.feed.latest_feed { "on" } else { "off" }
    ));
    let urls = |pages: &[crate::types::Page]| pages.iter().map(|p| p.url.clone()).collect::<Vec<_>>();
    lines.push(format!("{}Visual: {}", indent(1), list(&urls(site.visual.feed.as_slice()))));
    lines.push(format!("{}Article: {}", indent(1), list(&urls(site.article.feed.as_slice()))));

    lines.push(format!("Sidebar: {}", list(&config.site.sidebar)));

    lines.push("Assets".to_string());
    lines.push(format!("{}Favicon: {}", indent(1), or_none(&config.site.favicon)));
    lines.push(format!("{}Avatar: {}", indent(1), or_none(&config.site.avatar)));
    lines.push(manifest_line("CSS", &config.css.manifest()));
    lines.push(manifest_line("JS", &config.js));

    lines.push("Templates".to_string());
    for (kind, template) in &config.templates {
        lines.push(format!("{}{} \u{2192} {}", indent(1), kind, template));
    }

    if !config.social.is_empty() {
        lines.push("Social".to_string());
        for (provider, url) in &config.social {
            lines.push(format!("{}{} \u{2192} {}", indent(1), provider, url));
        }
    }

    lines
}

/// Print the site summary to stdout.
pub fn print_site_summary(site: &Site) {
    for line in format_site_summary(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Build: generation listing
// ============================================================================

/// Format the list of generated pages, in render order.
pub fn format_generate_output(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .rows
        .iter()
        .map(|row| format!("[{}] {} \u{2192} {}", row.marker, row.name, row.urlpath))
        .collect();

    if report.error_page.is_some() {
        lines.push("404 \u{2192} error.html".to_string());
    }

    let warnings = report.warnings.len();
    lines.push(format!(
        "Generated {} {} ({} {})",
        report.rows.len(),
        if report.rows.len() == 1 { "page" } else { "pages" },
        warnings,
        if warnings == 1 { "warning" } else { "warnings" }
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &BuildReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Build log
// ============================================================================

const LOG_HEADER: [&str; 9] = [
    "name",
    "urlpath",
    "urlkey",
    "type",
    "marker",
    "template",
    "directory",
    "css",
    "js",
];

/// Tabs and newlines would break the row layout.
fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Render the build log as tab-separated text with a header row.
pub fn format_build_log(rows: &[LogRow]) -> String {
    let mut out = LOG_HEADER.join("\t");
    out.push('\n');
    for row in rows {
        let fields = [
            &row.name,
            &row.urlpath,
            &row.urlkey,
            &row.page_type,
            &row.marker,
            &row.template,
            &row.directory,
            &row.css,
            &row.js,
        ];
        let line: Vec<String> = fields.iter().map(|f| tsv_field(f)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

/// Write the build log to `path`.
pub fn write_build_log(path: &Path, rows: &[LogRow]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_build_log(rows))
}

// ============================================================================
// Tests
// ============================================================================
