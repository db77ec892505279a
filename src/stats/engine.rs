// src/stats/engine.rs
//
// Pure aggregation rules applied inside the record-quiz transaction.

use chrono::{Days, NaiveDate};

use crate::models::user_stats::{StatsDocument, StatsPatch};

/// Format of `last_quiz_day`.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const QUIZ_MILESTONES: [i64; 3] = [1, 10, 50];
const ACCURACY_MILESTONES: [i64; 3] = [50, 75, 90];
const STREAK_MILESTONES: [i64; 3] = [3, 7, 30];

/// Rounded percentage of correct answers, 0 when nothing was answered.
pub fn accuracy_pct(correct: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as i64
}

/// Number of milestone thresholds reached. Always recomputed, never incremented.
pub fn badge_count(quizzes: i64, accuracy_pct: i64, streak: i64) -> i64 {
    let reached = |value: i64, milestones: &[i64]| {
        milestones.iter().filter(|&&m| value >= m).count() as i64
    };
    reached(quizzes, &QUIZ_MILESTONES)
        + reached(accuracy_pct, &ACCURACY_MILESTONES)
        + reached(streak, &STREAK_MILESTONES)
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Streak after completing a quiz on `today`.
///
/// A previous day that cannot be parsed counts as a broken streak.
pub fn next_streak(last_quiz_day: Option<&str>, prev_streak: i64, today: NaiveDate) -> i64 {
    let Some(last) = last_quiz_day else {
        return 1;
    };
    let Ok(last) = NaiveDate::parse_from_str(last, DAY_FORMAT) else {
        return 1;
    };

    if last == today {
        prev_streak.max(1)
    } else if last.checked_add_days(Days::new(1)) == Some(today) {
        prev_streak + 1
    } else {
        1
    }
}

/// Computes the write for one completed quiz against the previous aggregate.
pub fn apply_quiz(prev: &StatsDocument, correct: i64, total: i64, today: NaiveDate) -> StatsPatch {
    let total = total.max(0);
    let correct = correct.clamp(0, total);

    let new_total = prev.total + total;
    let new_correct = prev.correct + correct;
    let new_quizzes = prev.quizzes + 1;
    let new_streak = next_streak(prev.last_quiz_day.as_deref(), prev.streak, today);
    let badges = badge_count(new_quizzes, accuracy_pct(new_correct, new_total), new_streak);

    StatsPatch {
        quizzes: Some(new_quizzes),
        correct: Some(new_correct),
        total: Some(new_total),
        streak: Some(new_streak),
        last_quiz_day: Some(format_day(today)),
        badges: Some(badges),
    }
}
