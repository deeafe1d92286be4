use async_trait::async_trait;

use crate::domain::{job_outcome::SendFailure, listing::Listing, subscriber::ChatDestination};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Outbound messaging transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: ChatDestination, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Default, PartialEq)]
pub struct Dispatched {
    pub sent: usize,
    pub failures: Vec<SendFailure>,
}

/// Sends one message per listing, in order. A failed send is recorded and
/// the rest are still attempted.
pub async fn dispatch_listings(
    notifier: &dyn Notifier,
    destination: ChatDestination,
    listings: Vec<Listing>,
) -> Dispatched {
    let mut dispatched = Dispatched::default();

    for listing in listings {
        match notifier.send(destination, &listing.caption()).await {
            Ok(()) => dispatched.sent += 1,
            Err(e) => {
                log::error!(
                    "Failed to send {} to chat {}: {}",
                    listing.detail_url,
                    destination.0,
                    e
                );
                dispatched.failures.push(SendFailure {
                    listing,
                    reason: e.to_string(),
                });
            }
        }
    }

    dispatched
}

/// Sends already formatted texts, counting failures.
pub async fn dispatch_texts(
    notifier: &dyn Notifier,
    destination: ChatDestination,
    texts: &[String],
) -> (usize, usize) {
    let mut sent = 0;
    let mut failed = 0;

    for text in texts {
        match notifier.send(destination, text).await {
            Ok(()) => sent += 1,
            Err(e) => {
                log::error!("Failed to send message to chat {}: {}", destination.0, e);
                failed += 1;
            }
        }
    }

    (sent, failed)
}
