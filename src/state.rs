// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::IdentityProvider, config::Config, quiz::QuizRegistry, stats::StatsRepository,
};

/// Everything the handlers need, built once in `main` and injected by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub stats: StatsRepository,
    pub quizzes: Arc<QuizRegistry>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

impl FromRef<AppState> for StatsRepository {
    fn from_ref(state: &AppState) -> Self {
        state.stats.clone()
    }
}

impl FromRef<AppState> for Arc<QuizRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}
