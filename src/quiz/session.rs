// src/quiz/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT},
    error::AppError,
    models::question::{Category, Difficulty, PublicQuestion, Question},
};

/// Parameters of one quiz fetch, remembered so `retry` can replay it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub category_id: Option<i64>,
    pub difficulty: Option<Difficulty>,
    pub count: u32,
    pub speed_mode: bool,
}

impl Default for QuizRequest {
    fn default() -> Self {
        Self {
            category_id: None,
            difficulty: None,
            count: DEFAULT_QUESTION_COUNT,
            speed_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Active,
    Complete,
    Error,
}

/// Identifies one fetch. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Where a completed session's outcome is on its way into the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordState {
    Pending,
    Claimed,
    Recorded,
}

/// Exclusive right to record one completed session. Settling it only touches
/// the session it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordClaim {
    generation: u64,
    pub correct: usize,
    pub total: usize,
}

/// One run of a quiz, from setup to results.
///
/// Pure state: the fetch itself happens outside, between `begin_load` and
/// `finish_load`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    error: Option<String>,

    categories: Vec<Category>,
    loading_categories: bool,

    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    chosen: Vec<Option<usize>>,
    correct_count: usize,

    speed_mode: bool,
    started_at: Option<DateTime<Utc>>,
    seconds_elapsed: Option<i64>,

    last_request: Option<QuizRequest>,
    generation: u64,
    record: RecordState,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            error: None,
            categories: Vec::new(),
            loading_categories: false,
            questions: Vec::new(),
            current: 0,
            selected: None,
            chosen: Vec::new(),
            correct_count: 0,
            speed_mode: false,
            started_at: None,
            seconds_elapsed: None,
            last_request: None,
            generation: 0,
            record: RecordState::Pending,
        }
    }
}

/// Per-question outcome shown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub question: Question,
    pub chosen: Option<usize>,
    pub is_correct: bool,
}

/// Serializable view of the session for the presentation layer. The answer
/// key of the current question is withheld.
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub phase: Phase,
    pub error: Option<String>,
    pub categories: Vec<Category>,
    pub loading_categories: bool,
    pub question: Option<PublicQuestion>,
    pub current: usize,
    pub total_questions: usize,
    pub selected: Option<usize>,
    pub correct_count: usize,
    pub speed_mode: bool,
    pub seconds_elapsed: Option<i64>,
    pub stats_recorded: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn last_request(&self) -> Option<QuizRequest> {
        self.last_request
    }

    pub fn seconds_elapsed(&self) -> Option<i64> {
        self.seconds_elapsed
    }

    /// Committed answer for question `i`, if any.
    pub fn chosen_at(&self, i: usize) -> Option<usize> {
        self.chosen.get(i).copied().flatten()
    }

    fn require(&self, phase: Phase, op: &str) -> Result<(), AppError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Cannot {} while the quiz is {:?}",
                op, self.phase
            )))
        }
    }

    // ---- loading ----

    /// Enters `Loading` for `request` and remembers it for `retry`.
    /// A load already in flight is superseded.
    pub fn begin_load(&mut self, request: QuizRequest) -> Result<LoadTicket, AppError> {
        if self.phase == Phase::Active {
            return Err(AppError::Conflict(
                "A quiz is already running; reset it first".to_string(),
            ));
        }
        if request.count == 0 || request.count > MAX_QUESTION_COUNT {
            return Err(AppError::BadRequest(format!(
                "Between 1 and {} questions can be requested",
                MAX_QUESTION_COUNT
            )));
        }

        self.generation += 1;
        self.phase = Phase::Loading;
        self.error = None;
        self.last_request = Some(request);
        Ok(LoadTicket(self.generation))
    }

    /// The request `retry` replays: the remembered one, or the default quiz.
    pub fn retry_request(&self) -> Result<QuizRequest, AppError> {
        if self.phase == Phase::Active {
            return Err(AppError::Conflict(
                "Retry is only available before a quiz starts".to_string(),
            ));
        }
        Ok(self.last_request.unwrap_or_default())
    }

    /// Applies a fetch result. Returns `false` when the ticket is stale and the
    /// result was discarded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Question>, AppError>,
    ) -> bool {
        if ticket.0 != self.generation || self.phase != Phase::Loading {
            return false;
        }

        match result {
            Ok(questions) if questions.is_empty() => {
                self.phase = Phase::Error;
                self.error = Some(
                    "No questions are available for the selected options".to_string(),
                );
            }
            Ok(questions) => {
                self.chosen = vec![None; questions.len()];
                self.questions = questions;
                self.current = 0;
                self.selected = None;
                self.correct_count = 0;
                self.speed_mode = self.last_request.map(|r| r.speed_mode).unwrap_or(false);
                self.started_at = Some(Utc::now());
                self.seconds_elapsed = None;
                self.record = RecordState::Pending;
                self.error = None;
                self.phase = Phase::Active;
            }
            Err(e) => {
                self.phase = Phase::Error;
                self.error = Some(e.message().to_string());
            }
        }
        true
    }

    // ---- categories ----

    /// Returns `false` when a category fetch is already running.
    pub fn begin_categories(&mut self) -> bool {
        if self.loading_categories {
            return false;
        }
        self.loading_categories = true;
        self.error = None;
        true
    }

    pub fn finish_categories(&mut self, result: Result<Vec<Category>, AppError>) {
        self.loading_categories = false;
        match result {
            Ok(categories) => self.categories = categories,
            Err(e) => self.error = Some(e.message().to_string()),
        }
    }

    // ---- answering ----

    /// Marks `index` as the pending answer for the current question.
    pub fn select_answer(&mut self, index: usize) -> Result<(), AppError> {
        self.require(Phase::Active, "select an answer")?;
        let answers = self.questions[self.current].answers.len();
        if index >= answers {
            return Err(AppError::BadRequest(format!(
                "Answer index {} is out of range (0..{})",
                index, answers
            )));
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Commits the pending answer and moves on. Returns `true` when this was the
    /// last question and the session is now complete.
    pub fn advance(&mut self) -> Result<bool, AppError> {
        self.require(Phase::Active, "advance")?;

        if let Some(selection) = self.selected {
            self.chosen[self.current] = Some(selection);
        }
        // Recount rather than increment so a revisited question is never
        // counted twice.
        self.correct_count = self.count_correct();

        if self.current + 1 >= self.questions.len() {
            self.phase = Phase::Complete;
            self.seconds_elapsed = self
                .started_at
                .map(|start| (Utc::now() - start).num_seconds().max(0));
            return Ok(true);
        }

        self.current += 1;
        self.selected = self.chosen[self.current];
        Ok(false)
    }

    /// Steps back one question, restoring its committed answer.
    pub fn retreat(&mut self) -> Result<(), AppError> {
        self.require(Phase::Active, "go back")?;
        if self.current == 0 {
            return Err(AppError::Conflict(
                "Already at the first question".to_string(),
            ));
        }
        self.current -= 1;
        self.selected = self.chosen[self.current];
        Ok(())
    }

    fn count_correct(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.chosen)
            .filter(|(q, chosen)| **chosen == Some(q.correct_index))
            .count()
    }

    /// Back to `Idle`. The cached category list survives; anything in flight
    /// is orphaned.
    pub fn reset(&mut self) {
        *self = Self {
            categories: std::mem::take(&mut self.categories),
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    // ---- results ----

    pub fn review(&self) -> Result<Vec<ReviewItem>, AppError> {
        self.require(Phase::Complete, "review answers")?;
        Ok(self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = self.chosen_at(i);
                ReviewItem {
                    question: q.clone(),
                    chosen,
                    is_correct: chosen == Some(q.correct_index),
                }
            })
            .collect())
    }

    /// Claims the outcome of a completed session for recording. Hands out at
    /// most one claim until `release_record` gives it back.
    pub fn take_record(&mut self) -> Option<RecordClaim> {
        if self.phase != Phase::Complete || self.record != RecordState::Pending {
            return None;
        }
        self.record = RecordState::Claimed;
        Some(RecordClaim {
            generation: self.generation,
            correct: self.correct_count,
            total: self.questions.len(),
        })
    }

    fn holds(&self, claim: &RecordClaim) -> bool {
        claim.generation == self.generation
            && self.phase == Phase::Complete
            && self.record == RecordState::Claimed
    }

    /// Marks the claimed outcome as written. Ignored once the session moved on.
    pub fn confirm_record(&mut self, claim: RecordClaim) {
        if self.holds(&claim) {
            self.record = RecordState::Recorded;
        }
    }

    /// Puts back an outcome whose recording failed so it can be retried.
    /// Ignored once the session moved on.
    pub fn release_record(&mut self, claim: RecordClaim) {
        if self.holds(&claim) {
            self.record = RecordState::Pending;
        }
    }

    pub fn view(&self) -> QuizView {
        QuizView {
            phase: self.phase,
            error: self.error.clone(),
            categories: self.categories.clone(),
            loading_categories: self.loading_categories,
            question: match self.phase {
                Phase::Active => self.questions.get(self.current).map(PublicQuestion::from),
                _ => None,
            },
            current: self.current,
            total_questions: self.questions.len(),
            selected: self.selected,
            correct_count: self.correct_count,
            speed_mode: self.speed_mode,
            seconds_elapsed: self.seconds_elapsed,
            stats_recorded: self.phase == Phase::Complete
                && self.record == RecordState::Recorded,
        }
    }
}
