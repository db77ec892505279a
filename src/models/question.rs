// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Difficulty filter accepted by the trivia API. `None` at call sites means "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AppError::Decode(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// A trivia category as listed by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A fully decoded multiple-choice question.
///
/// `answers` were shuffled once when the batch was fetched and never move
/// again; `correct_index` points into that shuffled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Content-derived identifier. Two identical questions share it, so it is
    /// not a uniqueness guarantee.
    pub id: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub answers: Vec<String>,
    pub correct_index: usize,
}

/// DTO for sending a question to the player while the quiz is running
/// (excludes the correct answer).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub answers: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            category: q.category.clone(),
            difficulty: q.difficulty,
            prompt: q.prompt.clone(),
            answers: q.answers.clone(),
        }
    }
}

// ---- wire format of the trivia API ----

/// Body of `GET api.php`.
#[derive(Debug, Deserialize)]
pub struct QuestionResponse {
    pub response_code: i64,
    #[serde(default)]
    pub results: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionDto {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Body of `GET api_category.php`.
#[derive(Debug, Deserialize)]
pub struct CategoryResponse {
    pub trivia_categories: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!(matches!(
            "extreme".parse::<Difficulty>(),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn question_payload_deserializes() {
        let body = r#"{
            "response_code": 0,
            "results": [{
                "category": "Science: Computers",
                "type": "multiple",
                "difficulty": "easy",
                "question": "What does CPU stand for?",
                "correct_answer": "Central Processing Unit",
                "incorrect_answers": ["Central Process Unit", "Computer Personal Unit", "Central Processor Unit"]
            }]
        }"#;
        let parsed: QuestionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response_code, 0);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].kind, "multiple");
        assert_eq!(parsed.results[0].incorrect_answers.len(), 3);
    }

    #[test]
    fn public_question_hides_answer_key() {
        let q = Question {
            id: "q1".into(),
            category: "General".into(),
            difficulty: Difficulty::Medium,
            prompt: "2 + 2?".into(),
            answers: vec!["3".into(), "4".into()],
            correct_index: 1,
        };
        let json = serde_json::to_value(PublicQuestion::from(&q)).unwrap();
        assert!(json.get("correct_index").is_none());
        assert_eq!(json["difficulty"], "medium");
    }
}
