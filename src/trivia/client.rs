// src/trivia/client.rs

use std::time::Duration;

use url::Url;

use crate::{
    error::AppError,
    models::question::{CategoryResponse, Difficulty, QuestionResponse},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin HTTP client for the Open Trivia DB endpoints. Returns wire DTOs only;
/// decoding and shuffling live in `TriviaRepository`.
#[derive(Debug, Clone)]
pub struct OpenTriviaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OpenTriviaClient {
    pub fn new(base_url: Url) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::InternalServerError(e.to_string()))
    }

    /// `GET api_category.php`
    pub async fn get_categories(&self) -> Result<CategoryResponse, AppError> {
        let url = self.endpoint("api_category.php")?;
        tracing::debug!(%url, "fetching trivia categories");

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<CategoryResponse>()
            .await?;

        Ok(body)
    }

    /// `GET api.php?amount&category&difficulty&type=multiple`
    pub async fn get_questions(
        &self,
        amount: u32,
        category: Option<i64>,
        difficulty: Option<Difficulty>,
    ) -> Result<QuestionResponse, AppError> {
        let url = self.endpoint("api.php")?;

        let mut query = vec![("amount", amount.to_string())];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        if let Some(difficulty) = difficulty {
            query.push(("difficulty", difficulty.as_str().to_string()));
        }
        query.push(("type", "multiple".to_string()));

        tracing::debug!(%url, amount, ?category, ?difficulty, "fetching trivia questions");

        let body = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<QuestionResponse>()
            .await?;

        tracing::debug!(
            response_code = body.response_code,
            results = body.results.len(),
            "trivia questions received"
        );
        Ok(body)
    }
}

/// `Url::join` replaces the last path segment unless the base ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
