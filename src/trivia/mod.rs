// src/trivia/mod.rs

pub mod client;

use async_trait::async_trait;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::question::{Category, Difficulty, Question, QuestionDto, QuestionResponse},
    utils::html::decode_html,
};

pub use client::OpenTriviaClient;

/// Where quiz content comes from. One-shot calls; retrying is the quiz
/// session's job, not the source's.
#[async_trait]
pub trait TriviaSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<Category>, AppError>;

    /// Fetches up to `count` multiple-choice questions. The batch is either
    /// returned whole or not at all.
    async fn fetch_questions(
        &self,
        count: u32,
        category_id: Option<i64>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, AppError>;
}

/// Open Trivia DB backed question source.
#[derive(Debug, Clone)]
pub struct TriviaRepository {
    api: OpenTriviaClient,
}

impl TriviaRepository {
    pub fn new(api: OpenTriviaClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TriviaSource for TriviaRepository {
    async fn fetch_categories(&self) -> Result<Vec<Category>, AppError> {
        let res = self.api.get_categories().await?;
        Ok(res
            .trivia_categories
            .into_iter()
            .map(|c| Category {
                id: c.id,
                name: decode_html(&c.name),
            })
            .collect())
    }

    async fn fetch_questions(
        &self,
        count: u32,
        category_id: Option<i64>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, AppError> {
        if count == 0 {
            return Err(AppError::BadRequest(
                "At least one question must be requested".to_string(),
            ));
        }

        let res = self.api.get_questions(count, category_id, difficulty).await?;
        let items = accepted_results(res)?;

        if items.len() < count as usize {
            tracing::info!(
                requested = count,
                received = items.len(),
                "trivia API returned fewer questions than requested"
            );
        }

        let mut rng = rand::thread_rng();
        items
            .into_iter()
            .map(|dto| build_question(dto, &mut rng))
            .collect()
    }
}

/// Interprets the API's `response_code` envelope.
///
/// 0 is success and 1 means the pool had too few questions for the filters;
/// both hand back whatever results came with them.
fn accepted_results(res: QuestionResponse) -> Result<Vec<QuestionDto>, AppError> {
    match res.response_code {
        0 | 1 => Ok(res.results),
        5 => Err(AppError::Network(
            "Trivia API rate limit reached, try again in a few seconds".to_string(),
        )),
        2 => Err(AppError::Decode(
            "Trivia API rejected the request parameters".to_string(),
        )),
        code => Err(AppError::Decode(format!(
            "Trivia API responded with code {}",
            code
        ))),
    }
}

/// Decodes one wire question, shuffles its answers once and locates the
/// correct one in the shuffled order.
pub fn build_question<R: Rng + ?Sized>(dto: QuestionDto, rng: &mut R) -> Result<Question, AppError> {
    let prompt = decode_html(&dto.question);
    let category = decode_html(&dto.category);
    let correct = decode_html(&dto.correct_answer);
    let difficulty: Difficulty = dto.difficulty.parse()?;

    let mut answers: Vec<String> = dto
        .incorrect_answers
        .iter()
        .map(|a| decode_html(a))
        .collect();
    answers.push(correct.clone());
    answers.shuffle(rng);

    let correct_index = answers
        .iter()
        .position(|a| *a == correct)
        .ok_or_else(|| AppError::Decode("correct answer lost while shuffling".to_string()))?;

    Ok(Question {
        id: question_id(&category, &prompt),
        category,
        difficulty,
        prompt,
        answers,
        correct_index,
    })
}

/// Name-based UUID over category and prompt: identical questions map to the
/// same id in every batch.
fn question_id(category: &str, prompt: &str) -> String {
    let name = format!("{}\u{1f}{}", category, prompt);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}
