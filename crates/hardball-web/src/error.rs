use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use hardball_core::error::HardballError;

/// Application error type that renders as an HTML error page.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("web error: {:#}", self.0);

        let body = format!(
            r#"<!doctype html>
<html><head><title>Error — Hardball</title>
<style>body{{font-family:system-ui;background:#1a1a2e;color:#e0e0e0;display:flex;justify-content:center;align-items:center;height:100vh;margin:0}}
.err{{background:#16213e;padding:2rem;border-radius:8px;border-left:4px solid #e74c3c;max-width:600px}}
h1{{color:#e74c3c;margin-top:0}}pre{{white-space:pre-wrap;color:#aaa}}</style>
</head><body><div class="err"><h1>Something went wrong</h1><pre>{}</pre>
<p><a href="/" style="color:#3498db">Back to setup</a></p></div></body></html>"#,
            html_escape(&format!("{:#}", self.0))
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// JSON API error type for REST endpoints.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<HardballError> for ApiError {
    fn from(err: HardballError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

/// HTTP status for a core error, shared by the HTML and JSON surfaces.
pub fn status_for(err: &HardballError) -> StatusCode {
    match err {
        HardballError::Config(_) | HardballError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        HardballError::SessionIdle
        | HardballError::SessionExpired
        | HardballError::AlreadyStarted => StatusCode::CONFLICT,
        HardballError::Llm(_) | HardballError::Http(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Operator-facing wording for a failed turn.
pub fn turn_error_message(err: &HardballError) -> String {
    if err.is_rejection() {
        return err.to_string();
    }
    let mut msg = format!("Could not reach the counterpart: {err}");
    if err.is_transient() {
        msg.push_str(" (this looks temporary; send your message again)");
    }
    msg
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
