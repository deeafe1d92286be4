pub mod dedup_filter;
pub mod listing_extractor;
pub mod notification_dispatcher;
pub mod page_fetcher;
pub mod paginator;
pub mod search_job;
pub mod search_scheduler;
pub mod subscriber_store;
pub mod telegram_client;

pub use dedup_filter::{filter_new_listings, Filtered};
pub use listing_extractor::extract_listings;
pub use notification_dispatcher::{
    dispatch_listings, dispatch_texts, Dispatched, Notifier, SendError,
};
pub use page_fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use paginator::{build_page_url, PaginationStop, Paginator, Sweep};
pub use search_job::SearchJob;
pub use search_scheduler::{
    run_subscriber_job, run_sweep, search_scheduler_handler, InFlight, SweepTrigger,
};
pub use subscriber_store::{PgSubscriberStore, SubscriberStore};
pub use telegram_client::{TelegramClient, TELEGRAM_API_URL};
