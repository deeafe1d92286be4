use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time,
};
use uuid::Uuid;

use crate::domain::{job_outcome::JobOutcome, subscriber::Subscriber};

use super::{search_job::SearchJob, subscriber_store::SubscriberStore};

/// Handle for requesting a sweep outside the regular interval.
#[derive(Clone)]
pub struct SweepTrigger {
    pub sender: UnboundedSender<()>,
}

/// Subscriber ids with a job (or a write to their record) in progress.
/// Shared by the scheduler and the worker routes.
#[derive(Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<Uuid>>>,
}

pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl InFlight {
    /// `None` when a job for this subscriber is already running.
    pub fn claim(&self, id: Uuid) -> Option<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.insert(id).then(|| InFlightGuard {
            ids: self.ids.clone(),
            id,
        })
    }

}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

pub async fn search_scheduler_handler(
    store: Arc<dyn SubscriberStore>,
    job: Arc<SearchJob>,
    every: Duration,
    in_flight: InFlight,
    mut trigger_receiver: UnboundedReceiver<()>,
) {
    log::info!("Started search scheduler, sweeping every {:?}", every);

    let mut interval = time::interval(every);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            Some(()) = trigger_receiver.recv() => {
                log::info!("Manual sweep requested");
            }
        }

        run_sweep(store.clone(), job.clone(), &in_flight).await;
    }
}

/// Spawns one job per eligible subscriber, skipping any still running.
pub async fn run_sweep(
    store: Arc<dyn SubscriberStore>,
    job: Arc<SearchJob>,
    in_flight: &InFlight,
) -> Vec<JoinHandle<()>> {
    let subscribers = match store.active_subscribers().await {
        Ok(subscribers) => subscribers,
        Err(e) => {
            log::error!("Failed to load subscribers: {:?}", e);
            return vec![];
        }
    };

    if subscribers.is_empty() {
        log::info!("No users found");
        return vec![];
    }
    log::info!("Processing {} users", subscribers.len());

    let mut handles = vec![];
    for subscriber in subscribers {
        let Some(guard) = in_flight.claim(subscriber.id) else {
            log::warn!(
                "Search for {} is still running, skipping this sweep",
                subscriber.id
            );
            continue;
        };

        let store = store.clone();
        let job = job.clone();
        handles.push(tokio::spawn(async move {
            // The sweep snapshot may predate a job that finished in between.
            match store.subscriber(subscriber.id).await {
                Ok(Some(fresh)) => run_subscriber_job(store.as_ref(), &job, fresh).await,
                Ok(None) => log::info!("User {} is gone, skipping", subscriber.id),
                Err(e) => log::error!("Failed to reload user {}: {:?}", subscriber.id, e),
            }
            drop(guard);
        }));
    }

    handles
}

pub async fn run_subscriber_job(store: &dyn SubscriberStore, job: &SearchJob, subscriber: Subscriber) {
    let run = job.run(&subscriber).await;

    match &run.outcome {
        JobOutcome::FetchFailed { reason, pages_fetched } => log::warn!(
            "Search for {} failed after {} pages: {}",
            subscriber.id,
            pages_fetched,
            reason
        ),
        JobOutcome::PartialSendFailure { sent, failures } => log::warn!(
            "Sent {} ads to {}, {} failed",
            sent,
            subscriber.id,
            failures.len()
        ),
        outcome => log::info!("Search for {} finished: {:?}", subscriber.id, outcome),
    }

    if let Some(seen) = run.updated_seen {
        if let Err(e) = store.save_seen(subscriber.id, &seen).await {
            log::error!("Error persisting previous ads: {:?}", e);
        }
    }
}
