#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use spellbrew_algo::Word;
use tower::ServiceExt;

use spellbrew_backend::config::SchedulingSettings;
use spellbrew_backend::services::Scheduler;
use spellbrew_backend::state::AppState;
use spellbrew_backend::store::{MemoryStore, Store};

pub const USER: &str = "test-user";

pub fn fixture_words(n: i64) -> Vec<Word> {
    (1..=n)
        .map(|id| Word {
            id,
            hebrew: format!("מילה{id}"),
            english: vec![format!("word {id}")],
            transliteration: vec![format!("mila {id}")],
            rank: id,
        })
        .collect()
}

pub async fn create_test_state(words: usize, settings: SchedulingSettings) -> AppState {
    let store = Store::Memory(MemoryStore::new());
    store
        .insert_words(&fixture_words(words as i64))
        .await
        .expect("seed fixture corpus");
    let scheduler = Scheduler::load(store, &settings)
        .await
        .expect("load scheduler");
    AppState::new(scheduler)
}

pub async fn create_test_app() -> Router {
    create_test_app_with(50, SchedulingSettings::default()).await
}

pub async fn create_test_app_with(words: usize, settings: SchedulingSettings) -> Router {
    spellbrew_backend::create_app(create_test_state(words, settings).await)
}

pub fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
