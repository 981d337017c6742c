pub mod api;
pub mod simulation;

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(simulation::routes())
        .merge(api::routes())
        .fallback(not_found)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "llm_provider": state.llm.provider_name(),
        "llm_model": state.llm.model(),
        "duration_secs": state.config.simulation.duration_secs,
        "live_sessions": state.sessions.len().await,
    }))
}

async fn not_found() -> (axum::http::StatusCode, Html<String>) {
    let body = r#"<!doctype html>
<html><head><title>404 — Hardball</title>
<style>body{font-family:system-ui;background:#0f0f1a;color:#e0e0e0;display:flex;justify-content:center;align-items:center;height:100vh;margin:0}
.box{text-align:center}
h1{font-size:4rem;color:#6c63ff;margin:0}
p{color:#888;margin:0.5rem 0 1.5rem}
a{color:#6c63ff;text-decoration:none;padding:0.5rem 1rem;border:1px solid #2a2a4a;border-radius:8px}
a:hover{border-color:#6c63ff;background:rgba(108,99,255,0.1)}</style>
</head><body><div class="box"><h1>404</h1><p>This page doesn't exist, or the simulation has been cleared.</p><a href="/">Start a new simulation</a></div></body></html>"#;
    (axum::http::StatusCode::NOT_FOUND, Html(body.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use hardball_core::clock::ManualClock;
    use hardball_core::config::{HardballConfig, LlmConfig};
    use hardball_core::llm::LlmService;
    use http_body_util::BodyExt;

    use crate::AppState;

    /// App state whose LLM points at a closed local port, so every turn
    /// fails with a connection error, and whose clock the test controls.
    pub fn test_app_state() -> (Arc<AppState>, ManualClock) {
        let mut config = HardballConfig::default_config();
        config.llm = LlmConfig {
            provider: "ollama".into(),
            base_url: Some("http://127.0.0.1:1".into()),
            env_var: Some("HARDBALL_TEST_KEY_NEVER_SET".into()),
            ..Default::default()
        };
        let llm = LlmService::from_config(&config.llm).unwrap();
        let clock = ManualClock::default();
        let state = Arc::new(AppState::new(config, llm, Arc::new(clock.clone())));
        (state, clock)
    }

    pub fn test_router(state: Arc<AppState>) -> axum::Router {
        super::router().with_state(state)
    }

    pub async fn body_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_app_state();
        let resp = test_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["llm_provider"], "ollama");
        assert_eq!(json["duration_secs"], 600);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_page() {
        let (state, _) = test_app_state();
        let resp = test_router(state)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("404"));
    }
}
