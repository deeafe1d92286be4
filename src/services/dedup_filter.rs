use std::collections::HashSet;

use crate::domain::{listing::Listing, subscriber::SeenListings};

#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub new: Vec<Listing>,
    pub updated_seen: SeenListings,
    /// Listings added to the seen set by this run.
    pub recorded: usize,
}

/// Splits candidates into unseen listings and the grown seen set.
///
/// Every candidate is recorded whether or not it ends up being sent. When
/// nothing has been seen yet the subscriber is new: everything is recorded
/// and nothing is returned as new.
pub fn filter_new_listings(candidates: Vec<Listing>, previously_seen: &SeenListings) -> Filtered {
    let first_run = previously_seen.is_empty();
    let mut updated_seen = previously_seen.clone();
    let mut run_keys = HashSet::new();
    let mut new = vec![];
    let mut recorded = 0;

    for listing in candidates {
        let fingerprint = listing.fingerprint();
        if !run_keys.insert(fingerprint.clone()) {
            continue;
        }

        let seen_before = previously_seen.has_seen(&listing);
        if updated_seen.insert(fingerprint) {
            recorded += 1;
        }
        if !first_run && !seen_before {
            new.push(listing);
        }
    }

    if first_run && recorded > 0 {
        log::info!(
            "First run, recorded {} listings without notifying",
            recorded
        );
    }

    Filtered {
        new,
        updated_seen,
        recorded,
    }
}

#[cfg(test)]
mod tests {
    use super::filter_new_listings;
    use crate::domain::{listing::Listing, subscriber::SeenListings};

    fn listing(name: &str) -> Listing {
        Listing {
            title: name.to_string(),
            detail_url: format!("https://e.com/{}", name.to_lowercase()),
            image_url: "https://img/x.jpg".to_string(),
            production_date: "2020".to_string(),
        }
    }

    fn seen_with(listings: &[Listing]) -> SeenListings {
        listings.iter().map(Listing::fingerprint).collect()
    }

    #[test]
    fn first_run_records_everything_and_sends_nothing() {
        let filtered = filter_new_listings(vec![listing("A"), listing("B")], &SeenListings::new());

        assert!(filtered.new.is_empty());
        assert_eq!(filtered.updated_seen.len(), 2);
        assert_eq!(filtered.recorded, 2);
    }

    #[test]
    fn filtering_is_idempotent() {
        let candidates = vec![listing("A"), listing("B"), listing("C")];
        let first = filter_new_listings(candidates.clone(), &SeenListings::new());
        let second = filter_new_listings(candidates, &first.updated_seen);

        assert!(second.new.is_empty());
        assert_eq!(second.updated_seen, first.updated_seen);
        assert_eq!(second.recorded, 0);
    }

    #[test]
    fn only_unseen_listings_are_new_in_order() {
        let prior = seen_with(&[listing("B")]);
        let candidates = vec![listing("C"), listing("B"), listing("A")];

        let filtered = filter_new_listings(candidates, &prior);

        let titles: Vec<&str> = filtered.new.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A"]);
        assert_eq!(filtered.updated_seen.len(), 3);
        assert_eq!(filtered.updated_seen.iter().next(), Some(listing("B").fingerprint().as_str()));
    }

    #[test]
    fn repeated_listing_across_pages_is_new_once() {
        let prior = seen_with(&[listing("Z")]);
        let candidates = vec![listing("A"), listing("B"), listing("A")];

        let filtered = filter_new_listings(candidates, &prior);

        assert_eq!(filtered.new.len(), 2);
        assert_eq!(filtered.recorded, 2);
    }

    #[test]
    fn legacy_caption_keys_still_count_as_seen() {
        let x = listing("X");
        let prior: SeenListings = vec![x.caption()].into_iter().collect();

        let filtered = filter_new_listings(vec![x.clone(), listing("Y")], &prior);

        assert_eq!(filtered.new, vec![listing("Y")]);
        assert!(filtered.updated_seen.contains(&x.caption()));
        assert!(filtered.updated_seen.contains(&x.fingerprint()));
        assert!(filtered.updated_seen.contains(&listing("Y").fingerprint()));
    }
}
