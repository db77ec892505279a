// src/stats/repository.rs

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::engine::apply_quiz;
use crate::{
    error::AppError,
    models::user_stats::{StatsDocument, UserStats},
    store::{AggregateStore, StatsSubscription},
};

/// Per-user statistics on top of an aggregate store.
#[derive(Clone)]
pub struct StatsRepository {
    store: Arc<dyn AggregateStore>,
}

impl StatsRepository {
    pub fn new(store: Arc<dyn AggregateStore>) -> Self {
        Self { store }
    }

    /// Creates the user's zero-valued document if it does not exist yet.
    /// Safe to call on every sign-in; existing counters are never touched.
    pub async fn ensure_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<(), AppError> {
        if self.store.get(user_id).await?.is_some() {
            return Ok(());
        }

        let created = self
            .store
            .insert_if_absent(
                user_id,
                StatsDocument::new_profile(display_name.unwrap_or_default()),
            )
            .await?;

        if created {
            tracing::info!("Bootstrapped stats profile for {}", user_id);
        }
        Ok(())
    }

    /// Folds one completed quiz into the user's aggregate, dated today (UTC).
    pub async fn record_quiz(
        &self,
        user_id: &str,
        correct: i64,
        total: i64,
    ) -> Result<UserStats, AppError> {
        self.record_quiz_on(user_id, correct, total, Utc::now().date_naive())
            .await
    }

    /// `record_quiz` with an explicit calendar day.
    pub async fn record_quiz_on(
        &self,
        user_id: &str,
        correct: i64,
        total: i64,
        today: NaiveDate,
    ) -> Result<UserStats, AppError> {
        let mutation = move |prev: &StatsDocument| apply_quiz(prev, correct, total, today);
        let doc = self.store.transact(user_id, &mutation).await.map_err(|e| {
            tracing::error!("Failed to record quiz for {}: {}", user_id, e);
            e
        })?;

        tracing::info!(
            user_id,
            quizzes = doc.quizzes,
            streak = doc.streak,
            badges = doc.badges,
            "quiz recorded"
        );
        Ok(doc.into())
    }

    /// Current aggregate; a user without a document reads as all zeroes.
    pub async fn current(&self, user_id: &str) -> Result<UserStats, AppError> {
        Ok(self.store.get(user_id).await?.unwrap_or_default().into())
    }

    pub async fn subscribe(&self, user_id: &str) -> Result<StatsSubscription, AppError> {
        self.store.subscribe(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAggregateStore;

    fn repo() -> StatsRepository {
        StatsRepository::new(Arc::new(MemoryAggregateStore::new()))
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn concurrent_recordings_are_not_lost() {
        let repo = repo();
        let (a, b) = tokio::join!(
            repo.record_quiz("u1", 1, 1),
            repo.record_quiz("u1", 1, 1)
        );
        a.unwrap();
        b.unwrap();

        let stats = repo.current("u1").await.unwrap();
        assert_eq!(stats.quizzes, 2);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.correct, 2);
    }

    #[tokio::test]
    async fn many_parallel_recordings_add_up() {
        let repo = repo();
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.record_quiz("u1", 3, 5).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = repo.current("u1").await.unwrap();
        assert_eq!(stats.quizzes, 20);
        assert_eq!(stats.correct, 60);
        assert_eq!(stats.total, 100);
        assert_eq!(stats.accuracy_pct, 60);
    }

    #[tokio::test]
    async fn streak_law_over_days() {
        let repo = repo();
        let s = repo.record_quiz_on("u1", 1, 1, day("2024-05-01")).await.unwrap();
        assert_eq!(s.streak, 1);

        let s = repo.record_quiz_on("u1", 1, 1, day("2024-05-01")).await.unwrap();
        assert_eq!(s.streak, 1);

        let s = repo.record_quiz_on("u1", 1, 1, day("2024-05-02")).await.unwrap();
        assert_eq!(s.streak, 2);

        let s = repo.record_quiz_on("u1", 1, 1, day("2024-05-05")).await.unwrap();
        assert_eq!(s.streak, 1);
        assert_eq!(s.last_quiz_day.as_deref(), Some("2024-05-05"));
        assert_eq!(s.quizzes, 4);
    }

    #[tokio::test]
    async fn badges_are_recomputed_on_every_record() {
        let repo = repo();
        let s = repo.record_quiz_on("u1", 1, 1, day("2024-05-01")).await.unwrap();
        // quizzes>=1, accuracy>=50/75/90
        assert_eq!(s.badges, 4);

        let s = repo.record_quiz_on("u1", 0, 9, day("2024-05-01")).await.unwrap();
        // accuracy fell to 10%
        assert_eq!(s.accuracy_pct, 10);
        assert_eq!(s.badges, 1);
    }

    #[tokio::test]
    async fn ensure_profile_is_idempotent_and_preserves_counters() {
        let repo = repo();
        repo.ensure_profile("u1", Some("Ada")).await.unwrap();
        repo.record_quiz("u1", 2, 4).await.unwrap();
        repo.ensure_profile("u1", Some("Someone Else")).await.unwrap();

        let stats = repo.current("u1").await.unwrap();
        assert_eq!(stats.display_name, "Ada");
        assert_eq!(stats.quizzes, 1);
        assert_eq!(stats.correct, 2);
        assert_eq!(stats.streak, 1);
    }

    #[tokio::test]
    async fn record_preserves_display_name() {
        let repo = repo();
        repo.ensure_profile("u1", Some("Grace")).await.unwrap();
        let s = repo.record_quiz("u1", 1, 2).await.unwrap();
        assert_eq!(s.display_name, "Grace");
    }

    #[tokio::test]
    async fn missing_profile_reads_as_zero() {
        let stats = repo().current("nobody").await.unwrap();
        assert_eq!(stats.quizzes, 0);
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.last_quiz_day, None);
    }

    #[tokio::test]
    async fn subscription_follows_recordings() {
        let repo = repo();
        let mut sub = repo.subscribe("u1").await.unwrap();
        assert_eq!(sub.next().await.unwrap().unwrap().quizzes, 0);

        repo.record_quiz("u1", 1, 1).await.unwrap();
        let next = sub.next().await.unwrap().unwrap();
        assert_eq!(next.quizzes, 1);
        assert_eq!(next.streak, 1);
    }
}
