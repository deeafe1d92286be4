use url::Url;

use crate::domain::listing::PageResult;

use super::{
    listing_extractor::extract_listings,
    page_fetcher::{FetchError, PageFetcher},
};

/// Builds the URL for a given results page.
///
/// The `tag` filter only applies to the first page, so later pages drop it
/// and pin `city_distance` to 0 the way the site's own pager does.
pub fn build_page_url(base: &Url, page: u32) -> Url {
    let first_page = page <= 1;
    let mut pairs: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .filter(|(k, _)| first_page || k != "tag")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !first_page {
        match pairs.iter_mut().find(|(k, _)| k == "city_distance") {
            Some(pair) => pair.1 = "0".to_string(),
            None => pairs.push(("city_distance".to_string(), "0".to_string())),
        }
    }
    pairs.push(("page".to_string(), page.to_string()));

    let mut url = base.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaginationStop {
    /// A page came back without any ads.
    Exhausted,
    PageCapReached,
    FetchFailed(FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub pages: Vec<PageResult>,
    pub stop: PaginationStop,
}

/// Walks result pages one at a time until an empty page, a fetch error or
/// the page cap. Not resumable; start a new one to scrape again.
pub struct Paginator<'a> {
    fetcher: &'a dyn PageFetcher,
    base: Url,
    next_page: u32,
    max_pages: u32,
    stop: Option<PaginationStop>,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, base: Url, max_pages: u32) -> Self {
        Paginator {
            fetcher,
            base,
            next_page: 1,
            max_pages,
            stop: None,
        }
    }

    pub fn stop_reason(&self) -> Option<&PaginationStop> {
        self.stop.as_ref()
    }

    pub async fn next_page(&mut self) -> Option<Result<PageResult, FetchError>> {
        if self.stop.is_some() {
            return None;
        }
        if self.next_page > self.max_pages {
            log::warn!(
                "Reached page cap of {} for {}, stopping",
                self.max_pages,
                self.base
            );
            self.stop = Some(PaginationStop::PageCapReached);
            return None;
        }

        let page = self.next_page;
        let page_url = build_page_url(&self.base, page);
        log::debug!("Fetching results page {}: {}", page, page_url);

        let html_content = match self.fetcher.fetch(page_url.as_str()).await {
            Ok(html_content) => html_content,
            Err(e) => {
                log::error!("Failed to fetch results page {}: {}", page_url, e);
                self.stop = Some(PaginationStop::FetchFailed(e.clone()));
                return Some(Err(e));
            }
        };

        let result = extract_listings(&html_content, page);
        if result.is_empty() {
            self.stop = Some(PaginationStop::Exhausted);
            return None;
        }

        self.next_page += 1;
        Some(Ok(result))
    }

    pub async fn sweep(mut self) -> Sweep {
        let mut pages = vec![];
        while let Some(result) = self.next_page().await {
            if let Ok(page) = result {
                pages.push(page);
            }
        }

        Sweep {
            pages,
            stop: self.stop.unwrap_or(PaginationStop::Exhausted),
        }
    }
}
