// src/quiz/controller.rs

use std::sync::Arc;

use tokio::sync::watch;

use super::session::{QuizRequest, QuizSession, ReviewItem};
use crate::{
    error::AppError,
    models::{question::Category, user_stats::UserStats},
    stats::StatsRepository,
    trivia::TriviaSource,
};

/// Drives one player's `QuizSession` against a question source.
///
/// Every mutation swaps in a new session value on a watch channel, so readers
/// always see a consistent snapshot and can subscribe to changes.
pub struct QuizController {
    source: Arc<dyn TriviaSource>,
    state: watch::Sender<QuizSession>,
}

impl QuizController {
    pub fn new(source: Arc<dyn TriviaSource>) -> Self {
        let (state, _) = watch::channel(QuizSession::new());
        Self { source, state }
    }

    pub fn snapshot(&self) -> QuizSession {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuizSession> {
        self.state.subscribe()
    }

    /// Runs `op` against the session. Subscribers are only woken when it
    /// succeeds.
    fn update<T>(
        &self,
        op: impl FnOnce(&mut QuizSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut outcome = None;
        self.state.send_if_modified(|session| {
            let result = op(session);
            let changed = result.is_ok();
            outcome = Some(result);
            changed
        });
        outcome.unwrap_or_else(|| {
            Err(AppError::InternalServerError(
                "quiz state update did not run".to_string(),
            ))
        })
    }

    /// Category list, fetched once and cached on the session.
    pub async fn load_categories(&self) -> Result<Vec<Category>, AppError> {
        let cached = self.state.borrow().categories().to_vec();
        if !cached.is_empty() {
            return Ok(cached);
        }

        if !self.update(|s| Ok(s.begin_categories()))? {
            return Err(AppError::Conflict(
                "Categories are already being loaded".to_string(),
            ));
        }

        let result = self.source.fetch_categories().await;
        self.update(|s| {
            s.finish_categories(result.clone());
            Ok(())
        })?;
        result
    }

    /// Fetches a new batch and starts the quiz. On failure the session is left
    /// in `Error` with the message, and the same error is returned.
    pub async fn start(&self, request: QuizRequest) -> Result<QuizSession, AppError> {
        let ticket = self.update(|s| s.begin_load(request))?;
        tracing::info!(
            count = request.count,
            category = ?request.category_id,
            difficulty = ?request.difficulty,
            speed_mode = request.speed_mode,
            "starting quiz"
        );

        let result = self
            .source
            .fetch_questions(request.count, request.category_id, request.difficulty)
            .await;
        let fetch_error = result.as_ref().err().cloned();

        let applied = self.update(|s| Ok(s.finish_load(ticket, result)))?;
        if !applied {
            tracing::debug!("discarding superseded quiz fetch");
            return Ok(self.snapshot());
        }
        if let Some(e) = fetch_error {
            return Err(e);
        }

        let session = self.snapshot();
        match session.error() {
            // the source had nothing for these filters
            Some(message) => Err(AppError::NotFound(message.to_string())),
            None => Ok(session),
        }
    }

    /// Replays the last start request, or the default quiz if there is none.
    pub async fn retry(&self) -> Result<QuizSession, AppError> {
        let request = self.state.borrow().retry_request()?;
        self.start(request).await
    }

    pub fn select_answer(&self, index: usize) -> Result<QuizSession, AppError> {
        self.update(|s| s.select_answer(index))?;
        Ok(self.snapshot())
    }

    /// Returns the new snapshot and whether the quiz just completed.
    pub fn advance(&self) -> Result<(QuizSession, bool), AppError> {
        let completed = self.update(|s| s.advance())?;
        Ok((self.snapshot(), completed))
    }

    pub fn retreat(&self) -> Result<QuizSession, AppError> {
        self.update(|s| s.retreat())?;
        Ok(self.snapshot())
    }

    pub fn reset(&self) -> QuizSession {
        self.state.send_modify(QuizSession::reset);
        self.snapshot()
    }

    pub fn review(&self) -> Result<Vec<ReviewItem>, AppError> {
        self.state.borrow().review()
    }

    /// Records a completed session's outcome into the player's stats, once.
    ///
    /// `Ok(None)` means there was nothing left to record. When the store fails
    /// the outcome stays pending so a later call can try again.
    pub async fn record_outcome(
        &self,
        stats: &StatsRepository,
        user_id: &str,
    ) -> Result<Option<UserStats>, AppError> {
        let Some(claim) = self.update(|s| Ok(s.take_record()))? else {
            return Ok(None);
        };

        match stats
            .record_quiz(user_id, claim.correct as i64, claim.total as i64)
            .await
        {
            Ok(updated) => {
                self.state.send_modify(|s| s.confirm_record(claim));
                Ok(Some(updated))
            }
            Err(e) => {
                tracing::warn!("Quiz outcome for {} kept pending: {}", user_id, e);
                self.state.send_modify(|s| s.release_record(claim));
                Err(e)
            }
        }
    }
}
