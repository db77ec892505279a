// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::DEFAULT_QUESTION_COUNT,
    error::AppError,
    models::{question::Difficulty, user_stats::UserStats},
    quiz::{Phase, QuizController, QuizRegistry, QuizRequest, QuizView, ReviewItem},
    stats::StatsRepository,
    utils::jwt::Claims,
};

/// DTO for starting a quiz. Absent filters mean "any".
#[derive(Debug, Deserialize, Validate)]
pub struct StartQuizRequest {
    pub category_id: Option<i64>,
    pub difficulty: Option<Difficulty>,
    /// The trivia API serves at most 50 questions per call.
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 50, message = "count must be between 1 and 50"))]
    pub count: u32,
    #[serde(default)]
    pub speed_mode: bool,
}

fn default_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub index: usize,
}

/// Response of every step that may finish a quiz.
#[derive(Debug, Serialize)]
pub struct QuizStepResponse {
    pub quiz: QuizView,
    /// Updated aggregate when the completed quiz was recorded by this call.
    pub stats: Option<UserStats>,
    /// Set when recording failed; the outcome stays pending for `/record`.
    pub stats_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub correct_count: usize,
    pub total_questions: usize,
    pub seconds_elapsed: Option<i64>,
    pub items: Vec<ReviewItem>,
}

fn session_for(registry: &QuizRegistry, claims: &Claims) -> Arc<QuizController> {
    registry.session(&claims.sub)
}

/// Records a finished quiz and folds the outcome into the step response.
async fn step_response(
    quiz: &QuizController,
    stats: &StatsRepository,
    claims: &Claims,
) -> QuizStepResponse {
    let (stats, stats_error) = match quiz.record_outcome(stats, &claims.sub).await {
        Ok(updated) => (updated, None),
        Err(e) => (None, Some(e.message().to_string())),
    };
    QuizStepResponse {
        quiz: quiz.snapshot().view(),
        stats,
        stats_error,
    }
}

/// Lists trivia categories (fetched once per session, then cached).
pub async fn get_categories(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let categories = session_for(&registry, &claims).load_categories().await?;
    Ok(Json(categories))
}

/// Current quiz snapshot.
pub async fn get_state(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(session_for(&registry, &claims).snapshot().view()))
}

/// Fetches a question batch and starts the quiz.
///
/// A failed fetch leaves the session in `error`; `/retry` repeats the request.
pub async fn start_quiz(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let request = QuizRequest {
        category_id: req.category_id,
        difficulty: req.difficulty,
        count: req.count,
        speed_mode: req.speed_mode,
    };
    let session = session_for(&registry, &claims).start(request).await?;
    Ok(Json(session.view()))
}

/// Repeats the last start request, or starts the default quiz.
pub async fn retry_quiz(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&registry, &claims).retry().await?;
    Ok(Json(session.view()))
}

pub async fn select_answer(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&registry, &claims).select_answer(req.index)?;
    Ok(Json(session.view()))
}

/// Commits the selection and moves on; finishing the last question records
/// the result in the player's stats.
pub async fn next_question(
    State(registry): State<Arc<QuizRegistry>>,
    State(stats): State<StatsRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = session_for(&registry, &claims);
    let (session, completed) = quiz.advance()?;

    if !completed {
        return Ok(Json(QuizStepResponse {
            quiz: session.view(),
            stats: None,
            stats_error: None,
        }));
    }

    tracing::info!(
        user_id = %claims.sub,
        correct = session.correct_count(),
        total = session.questions().len(),
        "quiz completed"
    );
    Ok(Json(step_response(&quiz, &stats, &claims).await))
}

pub async fn previous_question(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&registry, &claims).retreat()?;
    Ok(Json(session.view()))
}

/// Back to setup; the cached category list is kept.
pub async fn reset_quiz(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(session_for(&registry, &claims).reset().view()))
}

/// Per-question results of the finished quiz, answer key included.
pub async fn review_quiz(
    State(registry): State<Arc<QuizRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = session_for(&registry, &claims);
    let items = quiz.review()?;
    let session = quiz.snapshot();

    Ok(Json(ReviewResponse {
        correct_count: session.correct_count(),
        total_questions: items.len(),
        seconds_elapsed: session.seconds_elapsed(),
        items,
    }))
}

/// Retries recording a completed quiz whose stats write failed earlier.
pub async fn record_result(
    State(registry): State<Arc<QuizRegistry>>,
    State(stats): State<StatsRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = session_for(&registry, &claims);
    if quiz.snapshot().phase() != Phase::Complete {
        return Err(AppError::Conflict(
            "Only a completed quiz can be recorded".to_string(),
        ));
    }
    Ok(Json(step_response(&quiz, &stats, &claims).await))
}
