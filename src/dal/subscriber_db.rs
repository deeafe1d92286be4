use sqlx::{postgres::PgQueryResult, PgPool};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub mobili_url: Option<String>,
    pub chat_id: Option<i64>,
    pub is_task_active: bool,
    pub previous_ads: String,
}

pub async fn get_task_active_subscribers(pool: &PgPool) -> Result<Vec<SubscriberRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"
        select
            id,
            mobili_url,
            chat_id,
            is_task_active,
            previous_ads
        from
            "user"
        where
            is_active = true and
            is_task_active = true and
            mobili_url is not null and
            chat_id is not null
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_subscriber(pool: &PgPool, id: Uuid) -> Result<Option<SubscriberRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"
        select
            id,
            mobili_url,
            chat_id,
            is_active and is_task_active as is_task_active,
            previous_ads
        from
            "user"
        where
            id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_previous_ads(
    pool: &PgPool,
    id: Uuid,
    previous_ads: &str,
) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        update "user" set
            previous_ads = $2
        where
            id = $1
        "#,
    )
    .bind(id)
    .bind(previous_ads)
    .execute(pool)
    .await
}

pub async fn reset_previous_ads(pool: &PgPool, id: Uuid) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        update "user" set
            previous_ads = '[]'
        where
            id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
}
