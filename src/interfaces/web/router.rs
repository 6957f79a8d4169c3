use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use super::AppState;
use super::handlers;

pub(crate) fn build_router(state: AppState) -> Router {
    // Permissive CORS: the electron front end talks to us from a file origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/command", post(handlers::process_command))
        .route("/commands", get(handlers::list_commands))
        .route("/history", get(handlers::get_history))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::core::cache::CommandStore;
    use crate::core::cache::embedding::MappedEmbedder;
    use crate::core::exec::SandboxedExecutor;
    use crate::core::llm::LlmProvider;
    use crate::core::nlu::IntentParser;
    use crate::core::orchestrator::CommandAgent;
    use crate::core::synth::ScriptSynthesizer;

    /// Routes generation calls on prompt content: the NLU prompt yields a
    /// fixed intent, the synthesis prompt yields a fixed script.
    struct RoutedLlm;

    #[async_trait]
    impl LlmProvider for RoutedLlm {
        async fn generate(&self, _model: &str, prompt: &str, _temperature: f32) -> Result<String> {
            if prompt.contains("command parser") {
                Ok(r#"{"action": "say_hi"}"#.to_string())
            } else if prompt.contains("script generator") {
                Ok("```bash\n#!/bin/bash\necho hi\n```".to_string())
            } else {
                Err(anyhow!("unexpected prompt"))
            }
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("not used"))
        }
    }

    async fn test_state(tmp: &std::path::Path) -> AppState {
        let llm = Arc::new(RoutedLlm);
        // Only the stored description embeds; intent lookups miss, which
        // forces the synthesis path.
        let mut map = HashMap::new();
        map.insert("say hi please".to_string(), vec![1.0, 0.0, 0.0, 0.0]);
        let store = CommandStore::open(
            &tmp.join("commands.db"),
            Arc::new(MappedEmbedder { map, dim: 4 }),
        )
        .await
        .expect("open store");

        let agent = CommandAgent::new(
            IntentParser::new(llm.clone(), "test-nlu".to_string()),
            store,
            ScriptSynthesizer::new(
                llm,
                "test-coder".to_string(),
                tmp.join("scripts"),
                vec!["echo".to_string()],
            ),
            SandboxedExecutor::new(Duration::from_secs(5)),
            0.85,
        );
        AppState {
            agent: Arc::new(agent),
        }
    }

    async fn json_request(
        app: Router,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let body = match body {
            Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
            None => Body::empty(),
        };
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));
        (status, json)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()).await);
        let (status, json) = json_request(app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "running");
        assert_eq!(json["service"], "lca-backend");
    }

    #[tokio::test]
    async fn command_miss_generates_and_registers() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path()).await;

        let app = build_router(state.clone());
        let (status, json) = json_request(
            app,
            Method::POST,
            "/command",
            Some(serde_json::json!({ "query": "say hi please" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["intent"]["action"], "say_hi");
        assert_eq!(json["generated"], true);
        assert_eq!(json["executed"], false);
        assert!(json["output"].is_null());
        assert!(
            json["script_path"]
                .as_str()
                .unwrap()
                .contains("say_hi_")
        );

        let app = build_router(state);
        let (status, json) = json_request(app, Method::GET, "/commands", None).await;
        assert_eq!(status, StatusCode::OK);
        let commands = json.as_array().expect("array of commands");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["name"], "say_hi");
        assert_eq!(commands[0]["description"], "say hi please");
        assert_eq!(commands[0]["usage_count"], 0);
    }

    #[tokio::test]
    async fn auto_execute_runs_the_generated_script() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()).await);
        let (status, json) = json_request(
            app,
            Method::POST,
            "/command",
            Some(serde_json::json!({ "query": "say hi please", "auto_execute": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["executed"], true);
        assert_eq!(json["output"], "hi");
    }

    #[tokio::test]
    async fn history_records_each_request() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path()).await;

        let app = build_router(state.clone());
        json_request(
            app,
            Method::POST,
            "/command",
            Some(serde_json::json!({ "query": "say hi please" })),
        )
        .await;

        let app = build_router(state);
        let (status, json) = json_request(app, Method::GET, "/history?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = json.as_array().expect("array of history entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["query"], "say hi please");
        assert_eq!(entries[0]["command_name"], "say_hi");
        assert_eq!(entries[0]["executed"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()).await);
        let (status, _) = json_request(app, Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
