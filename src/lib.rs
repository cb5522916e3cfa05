//! # jinjagen
//!
//! A small static site generator for blogs with two kinds of posts: visual
//! posts (images, video) and article posts (long-form text). Content lives in
//! JSON collections, layout lives in Jinja templates, and the output is a
//! directory of plain HTML.
//!
//! # Architecture: Staged Pipeline
//!
//! ```text
//! 1. Load       data/          →  raw records      (JSON collections + site.toml)
//! 2. Prepare    raw records    →  Site              (normalize, validate, index)
//! 3. Resolve    Site + page    →  ResolvedPage      (posts, nav, assets, template)
//! 4. Generate   ResolvedPage   →  output/           (render + write index.html)
//! ```
//!
//! Every check runs before the first file is written. A build either fails
//! with a single [`error::BuildError`] or renders the whole site, returning
//! the non-fatal warnings in its report.
//!
//! # Data Directory
//!
//! ```text
//! data/
//! ├── site.toml                       # Optional config, merged onto defaults
//! ├── content.sections.json           # Section records
//! ├── content.visual.json             # Visual post records
//! ├── content.article.json            # Article post records
//! └── published/
//!     ├── img/, video/                # Files named by visual posts
//!     ├── article/{url}/html/content.html
//!     └── news/content.html           # Optional news snippet
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading, merging onto stock defaults, validation |
//! | [`load`] | Reads the JSON collections, article bodies, and news snippet |
//! | [`types`] | Normalized [`types::Page`] and the values templates see |
//! | [`normalize`] | Raw record → page: publish filter, keywords, urlpath |
//! | [`validate`] | Content checks: fatal errors and [`validate::Warning`]s |
//! | [`index`] | Category → posts, one index per flavor |
//! | [`feed`] | Newest-first feed and curated selection |
//! | [`nav`] | First/prev/next/last arrows within a category |
//! | [`site`] | Runs the checks in order and builds the [`site::Site`] graph |
//! | [`resolve`] | Per-page post lists, nav, assets, and template choice |
//! | [`render`] | The [`render::Renderer`] seam and its minijinja implementation |
//! | [`generate`] | Render phases, template context, output writing |
//! | [`output`] | CLI summaries and the tab-separated build log |
//! | [`error`] | The crate-wide [`error::BuildError`] |
//!
//! # Homepage Aliasing
//!
//! Any published page may be the homepage. Its urlpath becomes empty so it
//! renders at the output root, while `urlpathnonempty` keeps its ordinary
//! path for the optional duplicate render and for links back to it.

pub mod config;
pub mod error;
pub mod feed;
pub mod generate;
pub mod index;
pub mod load;
pub mod nav;
pub mod normalize;
pub mod output;
pub mod render;
pub mod resolve;
pub mod site;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
