use std::collections::HashSet;

use uuid::Uuid;

use super::listing::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatDestination(pub i64);

/// Read-only snapshot of a user record handed to a search job.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub id: Uuid,
    pub search_url: String,
    pub destination: ChatDestination,
    pub is_search_active: bool,
    pub previously_seen: SeenListings,
}

#[derive(Debug, thiserror::Error)]
#[error("previous ads column is not a JSON array of strings: {0}")]
pub struct SeenListingsError(#[from] serde_json::Error);

/// Ordered, duplicate free sequence of listing keys already recorded for a
/// subscriber. Only ever grows; a reset is an explicit store operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenListings {
    entries: Vec<String>,
    index: HashSet<String>,
}

impl SeenListings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, SeenListingsError> {
        let entries: Vec<String> = serde_json::from_str(raw)?;
        Ok(entries.into_iter().collect())
    }

    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.entries.clone()).to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Returns false when the key was already present.
    pub fn insert(&mut self, key: String) -> bool {
        if self.index.contains(&key) {
            return false;
        }
        self.index.insert(key.clone());
        self.entries.push(key);
        true
    }

    /// A listing counts as seen by fingerprint or by the legacy caption key.
    pub fn has_seen(&self, listing: &Listing) -> bool {
        self.contains(&listing.fingerprint()) || self.contains(&listing.caption())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl FromIterator<String> for SeenListings {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut seen = SeenListings::new();
        for key in iter {
            seen.insert(key);
        }
        seen
    }
}
