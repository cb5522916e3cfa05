//! Category indexing.
//!
//! Maps each category to the posts that declare it, one index per post
//! flavor. A post in several categories is listed under every one of them;
//! the navigation builder is the only place that resolves such overlaps.

use crate::types::Page;
use std::collections::HashMap;

/// Category → posts, in order of first appearance.
///
/// Key order matters: navigation deduplication walks the categories in this
/// order and the first category a post appears under wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    buckets: Vec<(String, Vec<Page>)>,
    positions: HashMap<String, usize>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a post to a category, creating the bucket on first use.
    pub fn insert(&mut self, category: &str, page: Page) {
        match self.positions.get(category) {
            Some(&i) => self.buckets[i].1.push(page),
            None => {
                self.positions
                    .insert(category.to_string(), self.buckets.len());
                self.buckets.push((category.to_string(), vec![page]));
            }
        }
    }

    pub fn get(&self, category: &str) -> Option<&[Page]> {
        self.positions
            .get(category)
            .map(|&i| self.buckets[i].1.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.positions.contains_key(category)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Page])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Build the category index for one flavor of posts.
///
/// Special pages and posts without a category are skipped.
pub fn build_category_index(posts: &[Page]) -> CategoryIndex {
    let mut index = CategoryIndex::new();
    for post in posts.iter().filter(|p| p.is_indexable()) {
        for category in &post.category {
            index.insert(category, post.clone());
        }
    }
    index
}
