//! HTTP surface tests: a real listener on a free port, driven with reqwest.

use std::sync::Arc;
use std::time::Duration;

use hiring_orchestrator::inference::DisabledInference;
use hiring_orchestrator::sqlite_store::SqliteStore;
use hiring_orchestrator::{config::Config, db, migrate, server};
use hiring_orchestrator_core::inference::ScriptedInference;
use hiring_orchestrator_core::{InferenceClient, Orchestrator};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn start_server(tmp: &TempDir, inference: Arc<dyn InferenceClient>) -> String {
    let cfg: Config = toml::from_str(&format!(
        "[db]\npath = \"{}/hire.sqlite\"\n",
        tmp.path().display()
    ))
    .unwrap();
    let pool = db::connect(&cfg).await.unwrap();
    migrate::apply(&pool).await.unwrap();
    let store = Arc::new(SqliteStore::new(pool, Duration::from_secs(5)));
    let orchestrator = Arc::new(Orchestrator::new(inference, store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server::serve(listener, orchestrator).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, Arc::new(DisabledInference)).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "hiring-orchestrator");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, Arc::new(DisabledInference)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/query", base))
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/query", base))
        .json(&json!({ "text": "missing field" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_handler_failure_is_a_normal_response() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp, Arc::new(DisabledInference)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/query", base))
        .json(&json!({ "query": "Find data scientists in Austin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["query"], "Find data scientists in Austin");
    assert_eq!(body["intent"], "ERROR");
    assert_eq!(body["response"]["agent"], "ERROR_HANDLER");
    assert_eq!(body["response"]["suggestions"].as_array().unwrap().len(), 4);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_detailed_query_returns_full_state() {
    let tmp = TempDir::new().unwrap();
    let inference = ScriptedInference::new()
        .reply("EXTERNAL")
        .reply(r#"[{"name": "Maya Chen", "role": "Data Scientist", "location": "Austin"}]"#);
    let base = start_server(&tmp, Arc::new(inference)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/query/detailed", base))
        .json(&json!({ "query": "Find data scientists in Austin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["request_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["intent"], "EXTERNAL");
    assert_eq!(body["external_result"][0]["name"], "Maya Chen");
    assert_eq!(body["external_result"][0]["source"], "external");
    assert_eq!(body["final_response"]["agent"], "EXTERNAL_SEARCH");
    assert_eq!(body["final_response"]["found_count"], 1);
    assert!(body["local_result"].is_null());
}
