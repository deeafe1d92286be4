use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dal::subscriber_db::{self, SubscriberRow},
    domain::subscriber::{ChatDestination, SeenListings, Subscriber},
};

/// Where subscriber records live. Jobs only ever see snapshots.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn active_subscribers(&self) -> anyhow::Result<Vec<Subscriber>>;

    /// Current record, or `None` when it no longer exists or cannot be searched.
    async fn subscriber(&self, id: Uuid) -> anyhow::Result<Option<Subscriber>>;

    async fn save_seen(&self, id: Uuid, seen: &SeenListings) -> anyhow::Result<()>;

    /// Returns false when no such subscriber exists.
    async fn reset_seen(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        PgSubscriberStore { pool }
    }
}

/// Rows without a url or chat are not searchable and map to `None`.
pub fn subscriber_from_row(row: SubscriberRow) -> Option<Subscriber> {
    let previously_seen = match SeenListings::parse(&row.previous_ads) {
        Ok(seen) => seen,
        Err(e) => {
            log::warn!(
                "Subscriber {} has unreadable previous ads, starting over: {}",
                row.id,
                e
            );
            SeenListings::new()
        }
    };

    Some(Subscriber {
        id: row.id,
        search_url: row.mobili_url?,
        destination: ChatDestination(row.chat_id?),
        is_search_active: row.is_task_active,
        previously_seen,
    })
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn active_subscribers(&self) -> anyhow::Result<Vec<Subscriber>> {
        let rows = subscriber_db::get_task_active_subscribers(&self.pool)
            .await
            .context("Failed to load task active subscribers")?;

        Ok(rows.into_iter().filter_map(subscriber_from_row).collect())
    }

    async fn subscriber(&self, id: Uuid) -> anyhow::Result<Option<Subscriber>> {
        let row = subscriber_db::get_subscriber(&self.pool, id)
            .await
            .with_context(|| format!("Failed to load subscriber {}", id))?;

        Ok(row.and_then(subscriber_from_row))
    }

    async fn save_seen(&self, id: Uuid, seen: &SeenListings) -> anyhow::Result<()> {
        subscriber_db::update_previous_ads(&self.pool, id, &seen.to_json())
            .await
            .with_context(|| format!("Failed to save previous ads for {}", id))?;
        Ok(())
    }

    async fn reset_seen(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = subscriber_db::reset_previous_ads(&self.pool, id)
            .await
            .with_context(|| format!("Failed to reset previous ads for {}", id))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::{subscriber_from_row, SubscriberStore};
    use crate::{
        dal::subscriber_db::SubscriberRow,
        domain::subscriber::{SeenListings, Subscriber},
    };

    #[derive(Default)]
    pub struct MemoryStore {
        pub subscribers: Mutex<Vec<Subscriber>>,
        pub saved: Mutex<HashMap<Uuid, SeenListings>>,
    }

    impl MemoryStore {
        pub fn with(subscribers: Vec<Subscriber>) -> Self {
            MemoryStore {
                subscribers: Mutex::new(subscribers),
                ..Default::default()
            }
        }

        pub fn saved(&self, id: Uuid) -> Option<SeenListings> {
            self.saved.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl SubscriberStore for MemoryStore {
        async fn active_subscribers(&self) -> anyhow::Result<Vec<Subscriber>> {
            Ok(self.subscribers.lock().unwrap().clone())
        }

        async fn subscriber(&self, id: Uuid) -> anyhow::Result<Option<Subscriber>> {
            Ok(self
                .subscribers
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned())
        }

        async fn save_seen(&self, id: Uuid, seen: &SeenListings) -> anyhow::Result<()> {
            if let Some(subscriber) = self
                .subscribers
                .lock()
                .unwrap()
                .iter_mut()
                .find(|s| s.id == id)
            {
                subscriber.previously_seen = seen.clone();
            }
            self.saved.lock().unwrap().insert(id, seen.clone());
            Ok(())
        }

        async fn reset_seen(&self, id: Uuid) -> anyhow::Result<bool> {
            let mut subscribers = self.subscribers.lock().unwrap();
            match subscribers.iter_mut().find(|s| s.id == id) {
                Some(subscriber) => {
                    subscriber.previously_seen = SeenListings::new();
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn row(previous_ads: &str) -> SubscriberRow {
        SubscriberRow {
            id: Uuid::new_v4(),
            mobili_url: Some("https://www.polovniautomobili.com/auto-oglasi/pretraga?brand=baw".to_string()),
            chat_id: Some(99),
            is_task_active: true,
            previous_ads: previous_ads.to_string(),
        }
    }

    #[test]
    fn row_maps_to_subscriber() {
        let subscriber = subscriber_from_row(row(r#"["Name: X\nURL: u\nProduction Date: 2020"]"#)).unwrap();

        assert_eq!(subscriber.destination.0, 99);
        assert!(subscriber.is_search_active);
        assert!(subscriber
            .previously_seen
            .contains("Name: X\nURL: u\nProduction Date: 2020"));
    }

    #[test]
    fn unreadable_previous_ads_start_empty() {
        let subscriber = subscriber_from_row(row("{broken")).unwrap();

        assert!(subscriber.previously_seen.is_empty());
    }

    #[test]
    fn row_without_chat_is_not_searchable() {
        let mut r = row("[]");
        r.chat_id = None;

        assert!(subscriber_from_row(r).is_none());
    }
}
