// src/quiz/registry.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use super::controller::QuizController;
use crate::trivia::TriviaSource;

/// How long an untouched session is kept before it is dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    controller: Arc<QuizController>,
    last_used: Instant,
}

/// One quiz session per signed-in user, created on first use.
///
/// Sessions nobody touched for `idle_ttl` are evicted on the next lookup,
/// unless a request is still holding them.
pub struct QuizRegistry {
    source: Arc<dyn TriviaSource>,
    idle_ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl QuizRegistry {
    pub fn new(source: Arc<dyn TriviaSource>) -> Self {
        Self::with_idle_ttl(source, DEFAULT_IDLE_TTL)
    }

    pub fn with_idle_ttl(source: Arc<dyn TriviaSource>, idle_ttl: Duration) -> Self {
        Self {
            source,
            idle_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self, user_id: &str) -> Arc<QuizController> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            id == user_id
                || Arc::strong_count(&entry.controller) > 1
                || now.duration_since(entry.last_used) < self.idle_ttl
        });
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "dropped idle quiz sessions");
        }

        let entry = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Entry {
                controller: Arc::new(QuizController::new(self.source.clone())),
                last_used: now,
            });
        entry.last_used = now;
        entry.controller.clone()
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
