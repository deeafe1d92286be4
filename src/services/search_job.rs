use std::sync::Arc;

use url::Url;

use crate::domain::{
    job_outcome::{JobOutcome, JobRun},
    listing::Listing,
    subscriber::Subscriber,
};

use super::{
    dedup_filter::{filter_new_listings, Filtered},
    notification_dispatcher::{dispatch_listings, Notifier},
    page_fetcher::PageFetcher,
    paginator::{PaginationStop, Paginator},
};

enum JobState {
    Idle,
    Fetching(Url),
    Extracted(Vec<Listing>),
    Filtered(Filtered),
    Dispatching(Filtered),
    Done(JobRun),
}

/// One scrape-diff-notify cycle for a subscriber.
///
/// Never fails: every error ends up in the returned [`JobOutcome`]. The
/// caller persists `updated_seen`.
pub struct SearchJob {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    max_pages: u32,
}

impl SearchJob {
    pub fn new(fetcher: Arc<dyn PageFetcher>, notifier: Arc<dyn Notifier>, max_pages: u32) -> Self {
        SearchJob {
            fetcher,
            notifier,
            max_pages,
        }
    }

    pub async fn run(&self, subscriber: &Subscriber) -> JobRun {
        let mut state = JobState::Idle;

        loop {
            state = match state {
                JobState::Idle => self.start(subscriber),
                JobState::Fetching(base) => self.fetch(base).await,
                JobState::Extracted(listings) => {
                    JobState::Filtered(filter_new_listings(listings, &subscriber.previously_seen))
                }
                JobState::Filtered(filtered) => match filtered.new.is_empty() {
                    true => JobState::Done(JobRun {
                        outcome: JobOutcome::NoNewListings {
                            recorded: filtered.recorded,
                        },
                        updated_seen: (filtered.recorded > 0).then_some(filtered.updated_seen),
                    }),
                    false => JobState::Dispatching(filtered),
                },
                JobState::Dispatching(filtered) => self.dispatch(subscriber, filtered).await,
                JobState::Done(run) => return run,
            }
        }
    }

    fn start(&self, subscriber: &Subscriber) -> JobState {
        if !subscriber.is_search_active {
            return JobState::Done(JobRun::unchanged(JobOutcome::Skipped));
        }

        match Url::parse(&subscriber.search_url) {
            Ok(base) => JobState::Fetching(base),
            Err(e) => {
                log::error!(
                    "Subscriber {} has an invalid search url {}: {}",
                    subscriber.id,
                    subscriber.search_url,
                    e
                );
                JobState::Done(JobRun::unchanged(JobOutcome::FetchFailed {
                    reason: format!("invalid search url: {}", e),
                    pages_fetched: 0,
                }))
            }
        }
    }

    async fn fetch(&self, base: Url) -> JobState {
        let sweep = Paginator::new(self.fetcher.as_ref(), base, self.max_pages)
            .sweep()
            .await;

        match sweep.stop {
            PaginationStop::FetchFailed(e) => {
                JobState::Done(JobRun::unchanged(JobOutcome::FetchFailed {
                    reason: e.to_string(),
                    pages_fetched: sweep.pages.len(),
                }))
            }
            PaginationStop::Exhausted | PaginationStop::PageCapReached => {
                let listings: Vec<Listing> = sweep
                    .pages
                    .into_iter()
                    .flat_map(|page| page.listings)
                    .collect();

                match listings.is_empty() {
                    true => JobState::Done(JobRun::unchanged(JobOutcome::NoListingsFound)),
                    false => JobState::Extracted(listings),
                }
            }
        }
    }

    async fn dispatch(&self, subscriber: &Subscriber, filtered: Filtered) -> JobState {
        log::info!(
            "Sending {} new listings to chat {}",
            filtered.new.len(),
            subscriber.destination.0
        );

        let dispatched =
            dispatch_listings(self.notifier.as_ref(), subscriber.destination, filtered.new).await;

        let outcome = match dispatched.failures.is_empty() {
            true => JobOutcome::Sent {
                sent: dispatched.sent,
            },
            false => JobOutcome::PartialSendFailure {
                sent: dispatched.sent,
                failures: dispatched.failures,
            },
        };

        JobState::Done(JobRun {
            outcome,
            updated_seen: Some(filtered.updated_seen),
        })
    }
}
