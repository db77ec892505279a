// tests/quiz_flow.rs

mod common;

use common::{STUB_POOL_SIZE, spawn_app};
use serde_json::{Value, json};
use std::{sync::atomic::Ordering, time::Duration};

#[tokio::test]
async fn full_quiz_records_stats() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let mut view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 3, "difficulty": "medium"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "active");
    assert_eq!(view["total_questions"], 3);
    assert_eq!(view["question"]["prompt"], "Is this question '0' \"easy\"?");
    assert_eq!(view["question"]["difficulty"], "medium");
    assert!(view["question"].get("correct_index").is_none());

    let mut last = Value::Null;
    for _ in 0..3 {
        app.answer_correctly(&token, &view).await;
        last = app
            .post(&token, "/api/quiz/next", json!({}))
            .await
            .json()
            .await
            .unwrap();
        view = last["quiz"].clone();
    }

    assert_eq!(last["quiz"]["phase"], "complete");
    assert_eq!(last["quiz"]["correct_count"], 3);
    assert_eq!(last["quiz"]["stats_recorded"], true);
    assert_eq!(last["stats_error"], Value::Null);
    assert_eq!(last["stats"]["quizzes"], 1);
    assert_eq!(last["stats"]["correct"], 3);
    assert_eq!(last["stats"]["total"], 3);
    assert_eq!(last["stats"]["streak"], 1);
    assert_eq!(last["stats"]["accuracy_pct"], 100);
    // quizzes >= 1 plus all three accuracy milestones
    assert_eq!(last["stats"]["badges"], 4);

    let stats: Value = app.get(&token, "/api/stats").await.json().await.unwrap();
    assert_eq!(stats["quizzes"], 1);
    assert_eq!(stats["display_name"], "Tester");

    let review: Value = app.get(&token, "/api/quiz/review").await.json().await.unwrap();
    assert_eq!(review["correct_count"], 3);
    assert_eq!(review["total_questions"], 3);
    for item in review["items"].as_array().unwrap() {
        assert_eq!(item["is_correct"], true);
        let idx = item["question"]["correct_index"].as_u64().unwrap() as usize;
        assert_eq!(item["question"]["answers"][idx], common::CORRECT_ANSWER);
    }
}

#[tokio::test]
async fn start_forwards_filters_to_trivia_api() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let res = app
        .post(
            &token,
            "/api/quiz/start",
            json!({"count": 2, "category_id": 18, "difficulty": "hard", "speed_mode": true}),
        )
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let view: Value = res.json().await.unwrap();
    assert_eq!(view["speed_mode"], true);

    let requests = app.trivia.requests.lock().unwrap().clone();
    let last = requests.last().unwrap();
    assert_eq!(last["amount"], "2");
    assert_eq!(last["category"], "18");
    assert_eq!(last["difficulty"], "hard");
    assert_eq!(last["type"], "multiple");
}

#[tokio::test]
async fn short_batches_are_surfaced_not_padded() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 20}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["total_questions"], STUB_POOL_SIZE);
}

#[tokio::test]
async fn invalid_count_is_rejected() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    for count in [0, 51] {
        let res = app
            .post(&token, "/api/quiz/start", json!({ "count": count }))
            .await;
        assert_eq!(res.status().as_u16(), 400);
    }
    assert!(app.trivia.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_start_can_be_retried_verbatim() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    app.trivia.failing.store(true, Ordering::SeqCst);

    let res = app
        .post(
            &token,
            "/api/quiz/start",
            json!({"count": 4, "category_id": 9, "difficulty": "easy"}),
        )
        .await;
    assert_eq!(res.status().as_u16(), 502);

    let state: Value = app.get(&token, "/api/quiz/state").await.json().await.unwrap();
    assert_eq!(state["phase"], "error");
    assert!(state["error"].as_str().is_some());

    app.trivia.failing.store(false, Ordering::SeqCst);
    let view: Value = app
        .post(&token, "/api/quiz/retry", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "active");
    assert_eq!(view["total_questions"], 4);
    assert_eq!(view["error"], Value::Null);

    let requests = app.trivia.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn retry_is_rejected_while_active() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    app.post(&token, "/api/quiz/start", json!({"count": 2})).await;
    let res = app.post(&token, "/api/quiz/retry", json!({})).await;
    assert_eq!(res.status().as_u16(), 409);

    let res = app.post(&token, "/api/quiz/start", json!({"count": 2})).await;
    assert_eq!(res.status().as_u16(), 409);
}

#[tokio::test]
async fn going_back_does_not_double_count() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 2}))
        .await
        .json()
        .await
        .unwrap();
    app.answer_correctly(&token, &view).await;
    let step: Value = app
        .post(&token, "/api/quiz/next", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(step["quiz"]["correct_count"], 1);
    assert_eq!(step["quiz"]["selected"], Value::Null);

    let back: Value = app
        .post(&token, "/api/quiz/previous", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(back["current"], 0);
    assert!(back["selected"].is_u64());

    let step: Value = app
        .post(&token, "/api/quiz/next", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(step["quiz"]["current"], 1);
    assert_eq!(step["quiz"]["correct_count"], 1);

    let res = app.post(&token, "/api/quiz/previous", json!({})).await;
    assert_eq!(res.status().as_u16(), 200);
    let res = app.post(&token, "/api/quiz/previous", json!({})).await;
    assert_eq!(res.status().as_u16(), 409);
}

#[tokio::test]
async fn wrong_and_skipped_answers_are_not_counted() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 2}))
        .await
        .json()
        .await
        .unwrap();
    app.answer_wrongly(&token, &view).await;
    app.post(&token, "/api/quiz/next", json!({})).await;
    // skip the last one entirely
    let done: Value = app
        .post(&token, "/api/quiz/next", json!({}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(done["quiz"]["phase"], "complete");
    assert_eq!(done["quiz"]["correct_count"], 0);
    assert_eq!(done["stats"]["total"], 2);
    assert_eq!(done["stats"]["correct"], 0);
    // only the first-quiz milestone
    assert_eq!(done["stats"]["badges"], 1);
}

#[tokio::test]
async fn out_of_range_selection_is_bad_request() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    app.post(&token, "/api/quiz/start", json!({"count": 1})).await;
    let res = app
        .post(&token, "/api/quiz/select", json!({"index": 4}))
        .await;
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn failed_recording_stays_pending_until_retried() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    app.store.failing.store(true, Ordering::SeqCst);

    let view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 1}))
        .await
        .json()
        .await
        .unwrap();
    app.answer_correctly(&token, &view).await;
    let done: Value = app
        .post(&token, "/api/quiz/next", json!({}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(done["quiz"]["phase"], "complete");
    assert_eq!(done["quiz"]["stats_recorded"], false);
    assert_eq!(done["stats"], Value::Null);
    assert_eq!(done["stats_error"], "transaction aborted");

    let stats: Value = app.get(&token, "/api/stats").await.json().await.unwrap();
    assert_eq!(stats["quizzes"], 0);

    app.store.failing.store(false, Ordering::SeqCst);
    let recorded: Value = app
        .post(&token, "/api/quiz/record", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(recorded["stats"]["quizzes"], 1);
    assert_eq!(recorded["quiz"]["stats_recorded"], true);

    // nothing left to record
    let again: Value = app
        .post(&token, "/api/quiz/record", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["stats"], Value::Null);
    let stats: Value = app.get(&token, "/api/stats").await.json().await.unwrap();
    assert_eq!(stats["quizzes"], 1);
}

#[tokio::test]
async fn live_stats_stream_pushes_updates() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let mut live = app.get(&token, "/api/stats/live").await;
    assert_eq!(live.status().as_u16(), 200);

    let mut received = String::new();
    let first = tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("\"quizzes\":0") {
            let chunk = live.chunk().await.unwrap().expect("stream ended");
            received.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await;
    assert!(first.is_ok(), "no initial snapshot: {}", received);
    assert!(received.contains("event: stats"));

    let view: Value = app
        .post(&token, "/api/quiz/start", json!({"count": 1}))
        .await
        .json()
        .await
        .unwrap();
    app.answer_correctly(&token, &view).await;
    app.post(&token, "/api/quiz/next", json!({})).await;

    let update = tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("\"quizzes\":1") {
            let chunk = live.chunk().await.unwrap().expect("stream ended");
            received.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await;
    assert!(update.is_ok(), "no update pushed: {}", received);
}
