use super::{listing::Listing, subscriber::SeenListings};

#[derive(Debug, Clone, PartialEq)]
pub struct SendFailure {
    pub listing: Listing,
    pub reason: String,
}

/// Terminal result of one scrape-diff-notify run for a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Search is switched off for this subscriber.
    Skipped,
    FetchFailed {
        reason: String,
        pages_fetched: usize,
    },
    NoListingsFound,
    /// Nothing to send. `recorded` listings were newly added to the seen set
    /// (non-zero on a first run, where everything is recorded silently).
    NoNewListings { recorded: usize },
    Sent { sent: usize },
    PartialSendFailure {
        sent: usize,
        failures: Vec<SendFailure>,
    },
}

/// Outcome plus the seen set the caller has to persist, if it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRun {
    pub outcome: JobOutcome,
    pub updated_seen: Option<SeenListings>,
}

impl JobRun {
    pub fn unchanged(outcome: JobOutcome) -> Self {
        JobRun {
            outcome,
            updated_seen: None,
        }
    }
}
