//! Feeds and curated subsets.

use crate::types::Page;

/// The `n` most recent dated, non-special posts, newest first.
///
/// Posts sharing a date keep their input order (the sort is stable).
pub fn build_feed(posts: &[Page], n: usize) -> Vec<Page> {
    let mut eligible: Vec<Page> = posts
        .iter()
        .filter(|p| p.date.is_some() && !p.specialpage)
        .cloned()
        .collect();
    eligible.sort_by(|a, b| b.date.cmp(&a.date));
    eligible.truncate(n);
    eligible
}

/// Posts flagged `selected`, in input order.
pub fn select_curated(posts: &[Page]) -> Vec<Page> {
    posts.iter().filter(|p| p.selected).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::post;
    use proptest::prelude::*;

    fn urls(pages: &[Page]) -> Vec<&str> {
        pages.iter().map(|p| p.url.as_str()).collect()
    }

    #[test]
    fn newest_first_and_truncated() {
        let posts = vec![
            post("a", &["travel"], Some("2024-01-01")),
            post("b", &["travel"], Some("2024-02-01")),
        ];
        assert_eq!(urls(&build_feed(&posts, 1)), vec!["b"]);
        assert_eq!(urls(&build_feed(&posts, 5)), vec!["b", "a"]);
    }

    #[test]
    fn undated_and_special_posts_are_excluded() {
        let mut special = post("latest", &[], Some("2030-01-01"));
        special.specialpage = true;
        let posts = vec![special, post("undated", &[], None), post("a", &[], Some("2024-01-01"))];
        assert_eq!(urls(&build_feed(&posts, 5)), vec!["a"]);
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let posts = vec![
            post("x", &[], Some("2024-03-01")),
            post("y", &[], Some("2024-03-01")),
            post("z", &[], Some("2024-04-01")),
            post("w", &[], Some("2024-03-01")),
        ];
        assert_eq!(urls(&build_feed(&posts, 10)), vec!["z", "x", "y", "w"]);
    }

    #[test]
    fn empty_input_is_empty_feed() {
        assert!(build_feed(&[], 5).is_empty());
    }

    #[test]
    fn curated_subset_keeps_order() {
        let mut a = post("a", &[], None);
        let b = post("b", &[], None);
        let mut c = post("c", &[], None);
        a.selected = true;
        c.selected = true;
        assert_eq!(urls(&select_curated(&[a, b, c])), vec!["a", "c"]);
    }

    fn arb_posts() -> impl Strategy<Value = Vec<Page>> {
        prop::collection::vec((0u32..6, any::<bool>(), any::<bool>()), 0..20).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (day, dated, special))| {
                    let date = format!("2024-01-{:02}", day + 1);
                    let mut p = post(&format!("p{i}"), &[], dated.then_some(date.as_str()));
                    p.specialpage = special;
                    p
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn feed_is_idempotent(posts in arb_posts(), n in 0usize..8) {
            let once = build_feed(&posts, n);
            prop_assert_eq!(build_feed(&once, n), once);
        }

        #[test]
        fn feed_is_sorted_and_bounded(posts in arb_posts(), n in 0usize..8) {
            let feed = build_feed(&posts, n);
            prop_assert!(feed.len() <= n);
            prop_assert!(feed.windows(2).all(|w| w[0].date >= w[1].date));
            prop_assert!(feed.iter().all(|p| p.date.is_some() && !p.specialpage));
        }

        #[test]
        fn same_date_posts_keep_relative_order(posts in arb_posts()) {
            let feed = build_feed(&posts, posts.len());
            let position = |url: &str| posts.iter().position(|p| p.url == url);
            for w in feed.windows(2) {
                if w[0].date == w[1].date {
                    prop_assert!(position(&w[0].url) < position(&w[1].url));
                }
            }
        }
    }
}
