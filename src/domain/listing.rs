use sha2::{Digest, Sha256};

/// One classified ad scraped from a search results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    pub detail_url: String,
    pub image_url: String,
    pub production_date: String,
}

impl Listing {
    /// Message body sent to the subscriber. Older workers also used this
    /// exact string as the dedup key, so it must not change shape.
    pub fn caption(&self) -> String {
        format!(
            "Name: {}\nURL: {}\nProduction Date: {}",
            self.title, self.detail_url, self.production_date
        )
    }

    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.detail_url.trim().as_bytes());
        format!("url:{}", hex::encode(hasher.finalize()))
    }
}

/// Listings extracted from a single results page.
///
/// `container_count` is the number of ad containers on the page and is what
/// pagination looks at; `listings` come from the embedded structured data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub page_number: u32,
    pub container_count: usize,
    pub listings: Vec<Listing>,
}

impl PageResult {
    pub fn is_empty(&self) -> bool {
        self.container_count == 0
    }
}
