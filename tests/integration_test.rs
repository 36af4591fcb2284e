//! Integration tests for interview-coach.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::{App, web};
use assert_cmd::Command;
use async_trait::async_trait;
use futures_util::StreamExt;
use interview_coach::error::{Error, ModelError, SessionError};
use interview_coach::llm::{ChatModel, Prompt, TokenStream};
use interview_coach::server::{AppState, configure_routes, json_config, sweep_idle_sessions};
use interview_coach::{
    FallbackEmbedder, FixedChunker, Indexer, Orchestrator, QuestionBank, Retriever, SessionStore,
    SqliteStorage, TurnEvent, TurnSettings,
};
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Test models
// ---------------------------------------------------------------------------

/// Replies with fixed fragments and records every prompt it receives.
struct CannedModel {
    fragments: Vec<&'static str>,
    prompts: Mutex<Vec<Prompt>>,
}

impl CannedModel {
    fn new(fragments: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fragments,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> Prompt {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("model was never called")
    }
}

#[async_trait]
impl ChatModel for CannedModel {
    fn model(&self) -> &str {
        "canned"
    }

    async fn stream(&self, prompt: &Prompt) -> interview_coach::Result<TokenStream> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let tokens: Vec<interview_coach::Result<String>> =
            self.fragments.iter().map(|f| Ok((*f).to_string())).collect();
        Ok(Box::pin(futures_util::stream::iter(tokens)))
    }
}

/// Fails every call with a rate-limit error.
struct RateLimitedModel;

#[async_trait]
impl ChatModel for RateLimitedModel {
    fn model(&self) -> &str {
        "limited"
    }

    async fn stream(&self, _prompt: &Prompt) -> interview_coach::Result<TokenStream> {
        Err(ModelError::RateLimited("quota exceeded".to_string()).into())
    }
}

/// Never answers until released.
struct StalledModel {
    release: Arc<Notify>,
}

#[async_trait]
impl ChatModel for StalledModel {
    fn model(&self) -> &str {
        "stalled"
    }

    async fn stream(&self, _prompt: &Prompt) -> interview_coach::Result<TokenStream> {
        self.release.notified().await;
        Ok(Box::pin(futures_util::stream::iter(vec![Ok(
            "late".to_string()
        )])))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn indexer() -> Arc<Indexer> {
    Arc::new(
        Indexer::open(
            Box::new(SqliteStorage::in_memory().expect("in-memory storage")),
            Arc::new(FallbackEmbedder::new(128)),
            FixedChunker::with_size_and_overlap(200, 20),
        )
        .expect("open indexer"),
    )
}

fn orchestrator(model: Arc<dyn ChatModel>, indexer: &Indexer) -> Orchestrator {
    Orchestrator::new(
        model,
        Retriever::new(Arc::clone(indexer.embedder()), Arc::clone(indexer.index())),
        Arc::new(QuestionBank::builtin().expect("built-in bank")),
        TurnSettings::default(),
    )
}

fn app_state(model: Arc<dyn ChatModel>) -> web::Data<AppState> {
    let indexer = indexer();
    web::Data::new(AppState {
        orchestrator: orchestrator(model, &indexer),
        sessions: SessionStore::new(),
        indexer,
        model: "canned".to_string(),
    })
}

fn sse_events(body: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(body)
        .expect("utf-8 body")
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|json| serde_json::from_str(json).expect("event json"))
        .collect()
}

const RESUME: &str = "Built a Spring Boot order service backed by MySQL. \
    Tuned InnoDB indexes and added a Redis cache in front of hot queries.";

// ---------------------------------------------------------------------------
// Conversation flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ask_answer_summary_flow() {
    let indexer = indexer();
    indexer
        .index_text("resume.md", "resume.md", RESUME)
        .await
        .expect("index resume");

    let model = CannedModel::new(vec!["How ", "would you ", "size a Redis cache?"]);
    let orchestrator = orchestrator(model.clone(), &indexer);
    let store = SessionStore::new();
    let session = store.create();

    let question = orchestrator
        .complete_turn(&session, "/ask Redis, MySQL")
        .await
        .expect("ask turn");
    assert_eq!(question, "How would you size a Redis cache?");
    assert_eq!(session.topics(), vec!["Redis", "MySQL"]);
    assert!(model.last_prompt().contains("resume.md"));

    orchestrator
        .complete_turn(&session, "I would measure the working set first.")
        .await
        .expect("answer turn");
    let answer_prompt = model.last_prompt();
    assert!(answer_prompt.contains("Candidate: I would measure the working set first."));

    orchestrator
        .complete_turn(&session, "/summary")
        .await
        .expect("summary turn");
    assert_eq!(session.history().len(), 6);
    assert!(model.last_prompt().contains("technical weaknesses"));
}

#[tokio::test]
async fn test_failed_turn_leaves_history_untouched() {
    let indexer = indexer();
    let orchestrator = orchestrator(Arc::new(RateLimitedModel), &indexer);
    let session = SessionStore::new().create();

    let err = orchestrator
        .complete_turn(&session, "What is a B-tree?")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Model(ModelError::RateLimited(_))));
    assert!(err.is_retryable());
    assert!(session.history().is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_streamed_events_end_with_done() {
    let indexer = indexer();
    let orchestrator = orchestrator(CannedModel::new(vec!["A ", "hash map."]), &indexer);
    let session = SessionStore::new().create();

    let events: Vec<TurnEvent> = orchestrator
        .start_turn(&session, "Explain a hash map")
        .expect("start turn")
        .collect()
        .await;

    assert!(matches!(events.first(), Some(TurnEvent::Context { .. })));
    assert!(matches!(
        events.last(),
        Some(TurnEvent::Done { text }) if text == "A hash map."
    ));
    let tokens = events
        .iter()
        .filter(|e| matches!(e, TurnEvent::Token { .. }))
        .count();
    assert_eq!(tokens, 2);
}

#[tokio::test]
async fn test_second_turn_rejected_while_first_in_flight() {
    let indexer = indexer();
    let release = Arc::new(Notify::new());
    let orchestrator = orchestrator(
        Arc::new(StalledModel {
            release: Arc::clone(&release),
        }),
        &indexer,
    );
    let session = SessionStore::new().create();

    let first = orchestrator
        .start_turn(&session, "first")
        .expect("first turn");
    assert!(matches!(
        orchestrator.start_turn(&session, "second"),
        Err(Error::Session(SessionError::Busy))
    ));

    release.notify_one();
    let events: Vec<TurnEvent> = first.collect().await;
    assert!(matches!(events.last(), Some(TurnEvent::Done { .. })));
    assert_eq!(session.history().len(), 2);
}

// ---------------------------------------------------------------------------
// HTTP API
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_http_chat_round_trip() {
    let state = app_state(CannedModel::new(vec!["Tell me ", "about Spring."]));
    let app = actix_test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure_routes),
    )
    .await;

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post().uri("/api/sessions").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = actix_test::read_body_json(resp).await;
    let id = created["id"].as_str().expect("session id").to_string();

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/sessions/{id}/messages"))
            .set_json(serde_json::json!({ "message": "/ask Spring" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let events = sse_events(&actix_test::read_body(resp).await);
    assert_eq!(events.first().expect("context event")["type"], "context");
    let done = events.last().expect("done event");
    assert_eq!(done["type"], "done");
    assert_eq!(done["text"], "Tell me about Spring.");

    let snapshot: serde_json::Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/sessions/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(snapshot["busy"], false);
    assert_eq!(snapshot["topics"][0], "Spring");
    assert_eq!(snapshot["history"][1]["text"], "Tell me about Spring.");
}

#[actix_web::test]
async fn test_http_errors() {
    let state = app_state(CannedModel::new(vec!["ok"]));
    let app = actix_test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure_routes),
    )
    .await;

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/sessions/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = actix_test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let session = state.sessions.create();
    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/messages", session.id()))
            .set_json(serde_json::json!({ "message": "   " }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/documents")
            .set_json(serde_json::json!({ "name": "resume.pdf", "content": "binary" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/documents")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_http_busy_session_conflict() {
    let release = Arc::new(Notify::new());
    let state = app_state(Arc::new(StalledModel {
        release: Arc::clone(&release),
    }));
    let app = actix_test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;
    let session = state.sessions.create();
    let uri = format!("/api/sessions/{}/messages", session.id());

    let first = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({ "message": "first" }))
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({ "message": "second" }))
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    release.notify_one();
    let events = sse_events(&actix_test::read_body(first).await);
    assert_eq!(events.last().expect("done")["text"], "late");
}

#[actix_web::test]
async fn test_http_documents_and_health() {
    let state = app_state(CannedModel::new(vec!["ok"]));
    let app = actix_test::init_service(
        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .configure(configure_routes),
    )
    .await;

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/documents")
            .set_json(serde_json::json!({ "name": "resume.md", "content": RESUME }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/documents")
            .set_json(serde_json::json!({ "name": "copy.md", "content": RESUME }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let docs: serde_json::Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get().uri("/api/documents").to_request(),
    )
    .await;
    assert_eq!(docs.as_array().map(Vec::len), Some(1));

    let health: serde_json::Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(health["status"], "ok");
    assert!(health["snippets"].as_u64().unwrap() >= 1);

    let resp = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri("/api/documents/resume.md")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.indexer.index().is_empty());

    let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_abandoned_sessions_are_swept() {
    let indexer = indexer();
    let state = web::Data::new(AppState {
        orchestrator: orchestrator(CannedModel::new(vec!["ok"]), &indexer),
        sessions: SessionStore::new().with_idle_timeout(Duration::from_millis(20)),
        indexer,
        model: "canned".to_string(),
    });
    let app = actix_test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;

    for _ in 0..3 {
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/api/sessions").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    assert_eq!(state.sessions.len(), 3);

    let sweeper = tokio::spawn(sweep_idle_sessions(state.clone(), Duration::from_millis(10)));
    tokio::time::sleep(Duration::from_millis(200)).await;
    sweeper.abort();

    assert!(state.sessions.is_empty());
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("interview-coach").expect("binary");
    cmd.current_dir(dir.path())
        .env("INTERVIEW_DB_PATH", dir.path().join("index.db"))
        .env("OPENAI_API_KEY", "sk-test")
        .env("EMBEDDING", "hash")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_serve_without_api_key_fails_fast() {
    let dir = TempDir::new().expect("temp dir");
    cli(&dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PORT")
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_cli_index_list_status_remove() {
    let dir = TempDir::new().expect("temp dir");
    let resume = dir.path().join("resume.md");
    std::fs::write(&resume, RESUME).expect("write resume");

    cli(&dir)
        .args(["index", resume.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed resume.md"));

    cli(&dir)
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"resume.md\""));

    cli(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents:     1"));

    cli(&dir)
        .args(["remove", "resume.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    cli(&dir)
        .args(["remove", "resume.md", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed document: resume.md"));
}

#[test]
fn test_cli_index_rejects_unsupported_file() {
    let dir = TempDir::new().expect("temp dir");
    let pdf = dir.path().join("resume.pdf");
    std::fs::write(&pdf, "%PDF-1.7").expect("write pdf");

    cli(&dir)
        .args(["index", pdf.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported"));
}

#[test]
fn test_cli_json_errors_go_to_stdout() {
    let dir = TempDir::new().expect("temp dir");
    cli(&dir)
        .args(["reset", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"retryable\": false"));
}
