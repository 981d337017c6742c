use thiserror::Error;

#[derive(Debug, Error)]
pub enum HardballError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No simulation is running; start one first")]
    SessionIdle,

    #[error("Time expired: the negotiation ended without agreement")]
    SessionExpired,

    #[error("This simulation has already been started")]
    AlreadyStarted,

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HardballError {
    /// Returns `true` when the error is likely transient and the operator can
    /// simply send the turn again (e.g. HTTP 429/5xx, network timeouts).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Llm(msg) => is_transient_message(msg),
            _ => false,
        }
    }

    /// Returns `true` for errors that mean the turn was refused by the
    /// session itself rather than by the LLM provider.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SessionIdle | Self::SessionExpired | Self::InvalidInput(_)
        )
    }
}

fn is_transient_message(msg: &str) -> bool {
    if let Some(code) = status_code(msg) {
        return matches!(code, 429 | 500 | 502 | 503 | 504 | 529);
    }
    let msg_lower = msg.to_lowercase();
    let patterns = [
        "timeout",
        "timed out",
        "connection refused",
        "connection reset",
        "broken pipe",
        "temporarily unavailable",
        "overloaded",
    ];
    patterns.iter().any(|p| msg_lower.contains(p))
}

/// HTTP status carried by a `"{provider} LLM error {status}: {body}"`
/// message. Numbers inside the body are never read.
fn status_code(msg: &str) -> Option<u16> {
    const MARKER: &str = "LLM error ";
    let rest = &msg[msg.find(MARKER)? + MARKER.len()..];
    rest.get(..3)?.parse().ok()
}

pub type Result<T> = std::result::Result<T, HardballError>;
