// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgListener};
use tokio::sync::watch;

use super::{AggregateStore, StatsMutation, subscription::StatsSubscription};
use crate::{error::AppError, models::user_stats::StatsDocument};

/// `NOTIFY` channel carrying the id of the user whose row just changed.
const CHANGE_CHANNEL: &str = "user_stats_changed";

/// Aggregate store on the 'user_stats' table.
#[derive(Clone)]
pub struct PgAggregateStore {
    pool: PgPool,
}

impl PgAggregateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn fetch_document(pool: &PgPool, user_id: &str) -> Result<Option<StatsDocument>, AppError> {
    let doc = sqlx::query_as::<_, StatsDocument>(
        r#"
        SELECT display_name, quizzes, correct, total, streak, last_quiz_day, badges
        FROM user_stats
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(doc)
}

#[async_trait]
impl AggregateStore for PgAggregateStore {
    async fn get(&self, user_id: &str) -> Result<Option<StatsDocument>, AppError> {
        fetch_document(&self.pool, user_id).await
    }

    async fn insert_if_absent(&self, user_id: &str, doc: StatsDocument) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO user_stats
                (user_id, display_name, quizzes, correct, total, streak, last_quiz_day, badges)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&doc.display_name)
        .bind(doc.quizzes)
        .bind(doc.correct)
        .bind(doc.total)
        .bind(doc.streak)
        .bind(&doc.last_quiz_day)
        .bind(doc.badges)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            sqlx::query("SELECT pg_notify($1, $2)")
                .bind(CHANGE_CHANNEL)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn transact(
        &self,
        user_id: &str,
        mutation: StatsMutation<'_>,
    ) -> Result<StatsDocument, AppError> {
        let mut tx = self.pool.begin().await?;

        // Make sure there is a row to lock; concurrent first writes would
        // otherwise both read "absent".
        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let prev = sqlx::query_as::<_, StatsDocument>(
            r#"
            SELECT display_name, quizzes, correct, total, streak, last_quiz_day, badges
            FROM user_stats
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut doc = prev.clone();
        doc.merge(mutation(&prev));

        sqlx::query(
            r#"
            UPDATE user_stats SET
                quizzes = $2,
                correct = $3,
                total = $4,
                streak = $5,
                last_quiz_day = $6,
                badges = $7,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(doc.quizzes)
        .bind(doc.correct)
        .bind(doc.total)
        .bind(doc.streak)
        .bind(&doc.last_quiz_day)
        .bind(doc.badges)
        .execute(&mut *tx)
        .await?;

        // Delivered to listeners only once the transaction commits.
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit stats transaction for {}: {:?}", user_id, e);
            AppError::from(e)
        })?;

        Ok(doc)
    }

    async fn subscribe(&self, user_id: &str) -> Result<StatsSubscription, AppError> {
        // Listen before the first read so no change can slip in between.
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let initial = fetch_document(&self.pool, user_id).await?.unwrap_or_default();
        let (tx, rx) = watch::channel(Ok(initial));

        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let handle = tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) if notification.payload() == user_id => {
                        let next = fetch_document(&pool, &user_id)
                            .await
                            .map(Option::unwrap_or_default);
                        let failed = next.is_err();
                        if tx.send(next).is_err() || failed {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Stats listener for {} stopped: {:?}", user_id, e);
                        let _ = tx.send(Err(AppError::from(e)));
                        break;
                    }
                }
            }
        });

        Ok(StatsSubscription::new(rx, Some(handle)))
    }
}
