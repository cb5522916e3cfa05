//! Navigation chains.
//!
//! Post pages carry `<< < > >>` arrows that walk through the post's category.
//! A post may belong to several categories, but it can only have one set of
//! arrows, so before chaining each post is assigned to the first category it
//! appears under (in index key order). Later memberships are ignored here and
//! nowhere else: the post still shows up on every section page it declares.
//!
//! Boundaries clamp to the ends of the bucket: the first post's `prev` is
//! itself and the last post's `next` is itself.

use crate::index::CategoryIndex;
use crate::types::{NavLinks, Page};
use std::collections::{BTreeMap, HashSet};

/// url key → arrows.
pub type NavChains = BTreeMap<String, NavLinks>;

/// Keep each post only under the first category it appears in.
pub fn dedupe_memberships(index: &CategoryIndex) -> Vec<(&str, Vec<&Page>)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut buckets: Vec<(&str, Vec<&Page>)> = Vec::new();
    for (category, posts) in index.iter() {
        let claimed: Vec<&Page> = posts
            .iter()
            .filter(|p| seen.insert(p.url.as_str()))
            .collect();
        if !claimed.is_empty() {
            buckets.push((category, claimed));
        }
    }
    buckets
}

/// Build arrows for every post in the index.
pub fn build_nav_chains(index: &CategoryIndex) -> NavChains {
    let mut chains = NavChains::new();
    for (_, bucket) in dedupe_memberships(index) {
        chain_bucket(bucket, &mut chains);
    }
    chains
}

/// Build arrows over a single bucket of posts, such as the latest feed.
pub fn build_nav_chain(posts: &[Page]) -> NavChains {
    let mut chains = NavChains::new();
    chain_bucket(posts.iter().collect(), &mut chains);
    chains
}

fn chain_bucket(mut bucket: Vec<&Page>, chains: &mut NavChains) {
    // Stable: posts with the same categories keep their index order.
    bucket.sort_by(|a, b| a.category.cmp(&b.category));
    let (Some(first), Some(last)) = (bucket.first(), bucket.last()) else {
        return;
    };
    for (i, page) in bucket.iter().enumerate() {
        let prev = if i == 0 { first } else { &bucket[i - 1] };
        let next = bucket.get(i + 1).unwrap_or(last);
        chains.insert(
            page.url.clone(),
            NavLinks {
                first: first.urlpath.clone(),
                prev: prev.urlpath.clone(),
                next: next.urlpath.clone(),
                last: last.urlpath.clone(),
            },
        );
    }
}
