// src/models/user_stats.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::stats::engine::accuracy_pct;

/// Represents one row of the 'user_stats' table: the per-user aggregate document.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatsDocument {
    pub display_name: String,
    pub quizzes: i64,
    pub correct: i64,
    pub total: i64,
    pub streak: i64,
    /// UTC calendar day ("YYYY-MM-DD") of the most recent recorded quiz.
    pub last_quiz_day: Option<String>,
    pub badges: i64,
}

impl StatsDocument {
    /// Zero-valued document for a freshly bootstrapped profile.
    pub fn new_profile(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Merge-set: fields the patch leaves as `None` keep their current value.
    pub fn merge(&mut self, patch: StatsPatch) {
        if let Some(v) = patch.quizzes {
            self.quizzes = v;
        }
        if let Some(v) = patch.correct {
            self.correct = v;
        }
        if let Some(v) = patch.total {
            self.total = v;
        }
        if let Some(v) = patch.streak {
            self.streak = v;
        }
        if let Some(v) = patch.last_quiz_day {
            self.last_quiz_day = Some(v);
        }
        if let Some(v) = patch.badges {
            self.badges = v;
        }
    }
}

/// Partial write against a `StatsDocument`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsPatch {
    pub quizzes: Option<i64>,
    pub correct: Option<i64>,
    pub total: Option<i64>,
    pub streak: Option<i64>,
    pub last_quiz_day: Option<String>,
    pub badges: Option<i64>,
}

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub display_name: String,
    pub quizzes: i64,
    pub correct: i64,
    pub total: i64,
    pub streak: i64,
    pub last_quiz_day: Option<String>,
    pub badges: i64,
    pub accuracy_pct: i64,
}

impl From<StatsDocument> for UserStats {
    fn from(doc: StatsDocument) -> Self {
        Self {
            accuracy_pct: accuracy_pct(doc.correct, doc.total),
            display_name: doc.display_name,
            quizzes: doc.quizzes,
            correct: doc.correct,
            total: doc.total,
            streak: doc.streak,
            last_quiz_day: doc.last_quiz_day,
            badges: doc.badges,
        }
    }
}
