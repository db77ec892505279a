// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use trivia_master::{
    auth::MemoryIdentityProvider,
    config::Config,
    error::AppError,
    models::user_stats::StatsDocument,
    quiz::QuizRegistry,
    routes,
    state::AppState,
    stats::StatsRepository,
    store::{AggregateStore, MemoryAggregateStore, StatsMutation, StatsSubscription},
    trivia::{OpenTriviaClient, TriviaRepository},
};
use url::Url;

/// Every stub question's correct answer, as the API sends it.
pub const CORRECT_ANSWER_RAW: &str = "Right &amp; true";
/// ...and as the player sees it.
pub const CORRECT_ANSWER: &str = "Right & true";

/// Questions the stub has in stock; larger requests come back short.
pub const STUB_POOL_SIZE: usize = 5;

#[derive(Default)]
pub struct TriviaStub {
    pub failing: AtomicBool,
    pub requests: Mutex<Vec<HashMap<String, String>>>,
}

async fn stub_categories() -> impl IntoResponse {
    Json(json!({
        "trivia_categories": [
            {"id": 9, "name": "General Knowledge"},
            {"id": 18, "name": "Science: Computers"}
        ]
    }))
}

async fn stub_questions(
    State(stub): State<Arc<TriviaStub>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    stub.requests.lock().unwrap().push(params.clone());

    if stub.failing.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }

    let amount: usize = params
        .get("amount")
        .and_then(|a| a.parse().ok())
        .unwrap_or(10);
    let served = amount.min(STUB_POOL_SIZE);
    let difficulty = params
        .get("difficulty")
        .cloned()
        .unwrap_or_else(|| "easy".to_string());

    let results: Vec<_> = (0..served)
        .map(|i| {
            json!({
                "category": "General Knowledge",
                "type": "multiple",
                "difficulty": difficulty,
                "question": format!("Is this question &#039;{}&#039; &quot;easy&quot;?", i),
                "correct_answer": CORRECT_ANSWER_RAW,
                "incorrect_answers": [
                    format!("Wrong {}a", i),
                    format!("Wrong {}b", i),
                    format!("Wrong {}c", i)
                ]
            })
        })
        .collect();

    let code = if served < amount { 1 } else { 0 };
    Json(json!({ "response_code": code, "results": results })).into_response()
}

/// Serves a fake Open Trivia DB on a random port.
pub async fn spawn_trivia_stub() -> (Url, Arc<TriviaStub>) {
    let stub = Arc::new(TriviaStub::default());
    let app = Router::new()
        .route("/api_category.php", get(stub_categories))
        .route("/api.php", get(stub_questions))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    (url, stub)
}

/// Memory store whose transactions can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryAggregateStore,
    pub failing: AtomicBool,
}

#[async_trait]
impl AggregateStore for FlakyStore {
    async fn get(&self, user_id: &str) -> Result<Option<StatsDocument>, AppError> {
        self.inner.get(user_id).await
    }

    async fn insert_if_absent(&self, user_id: &str, doc: StatsDocument) -> Result<bool, AppError> {
        self.inner.insert_if_absent(user_id, doc).await
    }

    async fn transact(
        &self,
        user_id: &str,
        mutation: StatsMutation<'_>,
    ) -> Result<StatsDocument, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Store("transaction aborted".to_string()));
        }
        self.inner.transact(user_id, mutation).await
    }

    async fn subscribe(&self, user_id: &str) -> Result<StatsSubscription, AppError> {
        self.inner.subscribe(user_id).await
    }
}

pub struct TestApp {
    pub address: String,
    pub trivia: Arc<TriviaStub>,
    pub store: Arc<FlakyStore>,
    pub client: reqwest::Client,
}

pub fn test_config(trivia_api_url: Url) -> Config {
    Config {
        trivia_api_url,
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
    }
}

pub fn build_state(trivia_api_url: Url, store: Arc<FlakyStore>) -> AppState {
    let client = OpenTriviaClient::new(trivia_api_url.clone()).unwrap();
    AppState {
        config: test_config(trivia_api_url),
        identity: Arc::new(MemoryIdentityProvider::new()),
        stats: StatsRepository::new(store),
        quizzes: Arc::new(QuizRegistry::new(Arc::new(TriviaRepository::new(client)))),
    }
}

/// Spawns the app on a random port, backed by the trivia stub and in-memory
/// accounts/stats.
pub async fn spawn_app() -> TestApp {
    let (trivia_url, trivia) = spawn_trivia_stub().await;
    let store = Arc::new(FlakyStore::default());
    let app = routes::create_router(build_state(trivia_url, store.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        trivia,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh account and returns its bearer token.
    pub async fn signed_in_user(&self) -> String {
        let email = format!("p_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let register = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({"email": email, "password": password, "display_name": "Tester"}))
            .send()
            .await
            .unwrap();
        assert_eq!(register.status().as_u16(), 201);

        let login = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap();
        login["token"].as_str().unwrap().to_string()
    }

    pub async fn post(&self, token: &str, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Selects the correct answer on the current question, judged by its text.
    pub async fn answer_correctly(&self, token: &str, view: &serde_json::Value) {
        let index = view["question"]["answers"]
            .as_array()
            .unwrap()
            .iter()
            .position(|a| a == CORRECT_ANSWER)
            .expect("correct answer present");
        let res = self
            .post(token, "/api/quiz/select", json!({ "index": index }))
            .await;
        assert_eq!(res.status().as_u16(), 200);
    }

    /// Selects any wrong answer on the current question.
    pub async fn answer_wrongly(&self, token: &str, view: &serde_json::Value) {
        let index = view["question"]["answers"]
            .as_array()
            .unwrap()
            .iter()
            .position(|a| a != CORRECT_ANSWER)
            .unwrap();
        let res = self
            .post(token, "/api/quiz/select", json!({ "index": index }))
            .await;
        assert_eq!(res.status().as_u16(), 200);
    }
}
