use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use hardball_core::config;
use hardball_core::error::HardballError;
use hardball_core::model::{NegotiationStyle, Speaker};
use hardball_core::session::{Session, SessionState};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{status_for, turn_error_message, AppError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(setup_page))
        .route("/sessions", post(start_session))
        .route("/sessions/{id}", get(show_session))
        .route("/sessions/{id}/turns", post(submit_turn))
}

// -- Templates --

#[derive(Template)]
#[template(path = "index.html")]
struct SetupTemplate {
    styles: Vec<StyleOption>,
    operator: String,
    error: Option<String>,
    key_configured: bool,
    duration_minutes: u64,
}

struct StyleOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "session.html")]
struct SessionTemplate {
    id: Uuid,
    operator: String,
    style_label: String,
    role: String,
    countdown: String,
    remaining_secs: u64,
    progress_pct: u32,
    active: bool,
    expired: bool,
    notice: String,
    restart_hint: String,
    turns: Vec<TurnView>,
    error: Option<String>,
    draft: String,
}

struct TurnView {
    css: &'static str,
    who: String,
    text: String,
}

// -- Forms --

#[derive(Deserialize)]
pub struct StartForm {
    #[serde(default)]
    operator: String,
    #[serde(default)]
    credential: Option<String>,
    #[serde(default)]
    style: String,
}

#[derive(Deserialize)]
pub struct TurnForm {
    #[serde(default)]
    text: String,
}

// -- Handlers --

async fn setup_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let tmpl = setup_template(&state, NegotiationStyle::default(), String::new(), None);
    Ok(Html(tmpl.render()?))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Form(form): Form<StartForm>,
) -> Result<Response, AppError> {
    let style = NegotiationStyle::from_label_or_default(&form.style);
    let credential = config::resolve_credential(form.credential.as_deref(), &state.config.llm);

    let mut session = Session::with_clock(&state.config.simulation, state.clock.clone());
    match session.start(style, credential.as_deref(), Some(form.operator.as_str())) {
        Ok(()) => {
            let id = state.sessions.insert(session).await;
            Ok(Redirect::to(&format!("/sessions/{id}")).into_response())
        }
        Err(e @ HardballError::Config(_)) => {
            let tmpl = setup_template(&state, style, form.operator, Some(e.to_string()));
            Ok((status_for(&e), Html(tmpl.render()?)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(handle) = state.sessions.get(id).await else {
        return Ok(super::not_found().await.into_response());
    };
    let mut session = handle.lock().await;
    session.tick();
    let tmpl = session_template(&session, None, String::new());
    Ok(Html(tmpl.render()?).into_response())
}

async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Form(form): Form<TurnForm>,
) -> Result<Response, AppError> {
    let Some(handle) = state.sessions.get(id).await else {
        return Ok(super::not_found().await.into_response());
    };
    let mut session = handle.lock().await;

    let result = session
        .submit_user_turn(&form.text, &state.llm)
        .await
        .map(|_| ());

    match result {
        Ok(()) => Ok(Redirect::to(&format!("/sessions/{id}")).into_response()),
        Err(e) => {
            // Keep the draft only when it never made it into the transcript.
            let draft = if e.is_rejection() {
                form.text
            } else {
                String::new()
            };
            let tmpl = session_template(&session, Some(turn_error_message(&e)), draft);
            Ok((status_for(&e), Html(tmpl.render()?)).into_response())
        }
    }
}

// -- Helpers --

fn setup_template(
    state: &AppState,
    selected: NegotiationStyle,
    operator: String,
    error: Option<String>,
) -> SetupTemplate {
    let styles = NegotiationStyle::ALL
        .iter()
        .map(|s| StyleOption {
            value: s.to_string(),
            label: s.label().to_string(),
            selected: *s == selected,
        })
        .collect();

    SetupTemplate {
        styles,
        operator,
        error,
        key_configured: config::resolve_credential(None, &state.config.llm).is_some(),
        duration_minutes: state.config.simulation.duration_secs.div_ceil(60),
    }
}

fn session_template(session: &Session, error: Option<String>, draft: String) -> SessionTemplate {
    let snap = session.snapshot();
    let phrases = session.phrases();
    let operator = snap.operator.clone().unwrap_or_default();

    let turns = snap
        .transcript
        .iter()
        .map(|t| match t.speaker {
            Speaker::User => TurnView {
                css: "user",
                who: operator.clone(),
                text: t.text.clone(),
            },
            Speaker::Counterpart => TurnView {
                css: "counterpart",
                who: "Counterpart".to_string(),
                text: t.text.clone(),
            },
        })
        .collect();

    SessionTemplate {
        id: snap.id,
        operator,
        style_label: snap.style.map(|s| s.label().to_string()).unwrap_or_default(),
        role: snap.counterpart_role.unwrap_or_default(),
        countdown: snap.countdown,
        remaining_secs: snap.remaining_secs,
        progress_pct: (snap.progress * 100.0).round() as u32,
        active: snap.state == SessionState::Active,
        expired: snap.state == SessionState::Expired,
        notice: phrases.expired_notice.to_string(),
        restart_hint: phrases.restart_hint.to_string(),
        turns,
        error,
        draft,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn start(app: &axum::Router, body: &str) -> String {
        let resp = app.clone().oneshot(form_request("/sessions", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        resp.headers()[header::LOCATION].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_setup_page_lists_styles() {
        let (state, _) = test_app_state();
        let resp = test_router(state).oneshot(get_request("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("Yielding / Soft"));
        assert!(html.contains("Analytical / Logical"));
        assert!(html.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_start_without_credential_rerenders_setup() {
        let (state, _) = test_app_state();
        let app = test_router(state.clone());
        let resp = app
            .oneshot(form_request("/sessions", "operator=Ana&credential=&style=competitive"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("API credential is required"));
        assert!(html.contains("value=\"Ana\""));
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_start_without_operator_rerenders_setup() {
        let (state, _) = test_app_state();
        let resp = test_router(state.clone())
            .oneshot(form_request("/sessions", "operator=+&credential=k&style=competitive"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("operator name is required"));
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_start_then_view_session() {
        let (state, _) = test_app_state();
        let app = test_router(state);
        let location = start(&app, "operator=Ana&credential=k&style=Yielding+%2F+Soft").await;
        assert!(location.starts_with("/sessions/"));

        let resp = app.oneshot(get_request(&location)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("Insatiable/Exploitative"));
        assert!(html.contains("10:00"));
        assert!(html.contains("worth my time"));
        assert!(html.contains("<form"));
        // The hidden instruction never reaches the page.
        assert!(!html.contains("MASTER SYSTEM INSTRUCTION"));
    }

    #[tokio::test]
    async fn test_unknown_style_falls_back_to_competitive() {
        let (state, _) = test_app_state();
        let app = test_router(state);
        let location = start(&app, "operator=Ana&credential=k&style=sneaky").await;
        let html = body_string(app.oneshot(get_request(&location)).await.unwrap().into_body()).await;
        assert!(html.contains("Evasive/Passive-aggressive"));
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_line() {
        let (state, _) = test_app_state();
        let app = test_router(state);
        let location = start(&app, "operator=Ana&credential=k&style=competitive").await;

        let resp = app
            .clone()
            .oneshot(form_request(&format!("{location}/turns"), "text=My+best+offer"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("Could not reach the counterpart"));
        // A refused connection is worth retrying.
        assert!(html.contains("send your message again"));
        assert!(html.contains("My best offer"));

        let json_uri = location.replace("/sessions/", "/api/v1/sessions/");
        let resp = app.oneshot(get_request(&json_uri)).await.unwrap();
        let json = body_json(resp.into_body()).await;
        assert_eq!(json["state"], "active");
        let transcript = json["transcript"].as_array().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1]["speaker"], "user");
    }

    #[tokio::test]
    async fn test_session_page_shows_expiry() {
        let (state, clock) = test_app_state();
        let app = test_router(state);
        let location = start(&app, "operator=Ana&credential=k&style=analytical").await;

        clock.advance(Duration::from_secs(601));
        let resp = app.clone().oneshot(get_request(&location)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp.into_body()).await;
        assert!(html.contains("WITHOUT AGREEMENT"));
        assert!(html.contains("00:00"));
        assert!(!html.contains("name=\"text\""));
    }

    #[tokio::test]
    async fn test_turn_after_deadline_is_conflict() {
        let (state, clock) = test_app_state();
        let app = test_router(state);
        let location = start(&app, "operator=Ana&credential=k&style=collaborative").await;

        clock.advance(Duration::from_secs(601));
        let resp = app
            .clone()
            .oneshot(form_request(&format!("{location}/turns"), "text=offer"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let json_uri = location.replace("/sessions/", "/api/v1/sessions/");
        let json = body_json(app.oneshot(get_request(&json_uri)).await.unwrap().into_body()).await;
        assert_eq!(json["state"], "expired");
        assert_eq!(json["transcript"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_is_404() {
        let (state, _) = test_app_state();
        let uri = format!("/sessions/{}", Uuid::now_v7());
        let resp = test_router(state).oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
