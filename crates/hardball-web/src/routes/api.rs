use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use hardball_core::config;
use hardball_core::model::NegotiationStyle;
use hardball_core::personality::all_pairings;
use hardball_core::session::{Session, SessionSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/styles", get(list_styles))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/{id}", get(get_session))
        .route("/api/v1/sessions/{id}/turns", post(submit_turn))
}

// -- Request / response types --

#[derive(Debug, Serialize)]
pub struct StylePairing {
    pub style: NegotiationStyle,
    pub label: &'static str,
    pub counterpart_role: &'static str,
    pub directive: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
    /// Any style label; unknown labels get the competitive pairing.
    #[serde(default)]
    pub style: String,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub reply: String,
    pub session: SessionSnapshot,
}

// -- Handlers --

async fn list_styles(State(state): State<Arc<AppState>>) -> Json<Vec<StylePairing>> {
    let pairings = all_pairings(state.config.simulation.language)
        .into_iter()
        .map(|p| StylePairing {
            style: p.style,
            label: p.style.label(),
            counterpart_role: p.role,
            directive: p.directive,
        })
        .collect();
    Json(pairings)
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let style = NegotiationStyle::from_label_or_default(&req.style);
    let credential = config::resolve_credential(req.credential.as_deref(), &state.config.llm);

    let mut session = Session::with_clock(&state.config.simulation, state.clock.clone());
    session.start(style, credential.as_deref(), req.operator.as_deref())?;
    let snapshot = session.snapshot();
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("session {id} not found")))?;
    let mut session = handle.lock().await;
    session.tick();
    Ok(Json(session.snapshot()))
}

async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("session {id} not found")))?;
    let mut session = handle.lock().await;
    let reply = session
        .submit_user_turn(&req.text, &state.llm)
        .await?
        .text
        .clone();
    Ok(Json(TurnResponse {
        reply,
        session: session.snapshot(),
    }))
}
