//! Timed negotiation sessions.
//!
//! A [`Session`] moves `Idle → Active → Expired`. The countdown is computed
//! from wall-clock timestamps on demand; nothing runs in the background, so
//! expiry is noticed by [`Session::tick`] on every refresh and again inside
//! [`Session::submit_user_turn`] before a turn is accepted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::SimulationConfig;
use crate::error::{HardballError, Result};
use crate::llm::ChatBackend;
use crate::model::{ChatMessage, Language, NegotiationStyle, Turn};
use crate::personality::{build_system_instruction, CounterPersonality, SystemInstruction};
use crate::phrases::Phrasebook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
    Expired,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Opaque provider credential. Never printed.
#[derive(Clone)]
struct Credential(String);

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

pub struct Session {
    id: Uuid,
    state: SessionState,
    language: Language,
    duration: Duration,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    operator: Option<String>,
    personality: Option<CounterPersonality>,
    instruction: Option<SystemInstruction>,
    credential: Option<Credential>,
    /// Visible turns, oldest first.
    transcript: Vec<Turn>,
    /// What the LLM sees: the hidden injection and acknowledgment, the
    /// opening line, then every successful user/model exchange.
    context: Vec<ChatMessage>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("operator", &self.operator)
            .field("started_at", &self.started_at)
            .field("turns", &self.transcript.len())
            .finish()
    }
}

impl Session {
    /// A fresh idle session on the system clock.
    pub fn new(settings: &SimulationConfig) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &SimulationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::now_v7(),
            state: SessionState::Idle,
            language: settings.language,
            duration: settings.duration(),
            created_at: clock.now(),
            started_at: None,
            operator: None,
            personality: None,
            instruction: None,
            credential: None,
            transcript: Vec::new(),
            context: Vec::new(),
            clock,
        }
    }

    /// Start the countdown against the counter-personality for `style`.
    ///
    /// A missing credential or operator name is a configuration error and
    /// leaves the session untouched in `Idle`.
    pub fn start(
        &mut self,
        style: NegotiationStyle,
        credential: Option<&str>,
        operator: Option<&str>,
    ) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(HardballError::AlreadyStarted);
        }

        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                HardballError::Config(
                    "an API credential is required to start a simulation".into(),
                )
            })?;
        let operator = operator
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| {
                HardballError::Config("an operator name is required to start a simulation".into())
            })?;

        let personality = CounterPersonality::for_style(style, self.language);
        let instruction = build_system_instruction(&personality);
        let phrases = Phrasebook::for_language(self.language);
        let now = self.clock.now();

        self.context = vec![
            ChatMessage::user(phrases.injection(instruction.as_str())),
            ChatMessage::model(phrases.acknowledgment),
            ChatMessage::model(phrases.opening_line),
        ];
        self.transcript = vec![Turn::counterpart(phrases.opening_line, now)];
        self.started_at = Some(now);
        self.operator = Some(operator.to_string());
        self.credential = Some(Credential(credential.to_string()));
        self.personality = Some(personality);
        self.instruction = Some(instruction);
        self.state = SessionState::Active;

        tracing::info!(
            session = %self.id,
            operator,
            style = %style,
            role = personality.role,
            duration_secs = self.duration.as_secs(),
            "simulation started"
        );
        Ok(())
    }

    /// Time since the start action. Zero while idle.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => (self.clock.now() - started).to_std().unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }

    /// Countdown left, clamped at zero. An idle session has the whole
    /// duration ahead of it.
    pub fn remaining(&self) -> Duration {
        match self.state {
            SessionState::Idle => self.duration,
            _ => self.duration.saturating_sub(self.elapsed()),
        }
    }

    /// Fraction of the countdown left, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.remaining().as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Re-evaluate the countdown. Returns `true` only on the call that moves
    /// the session from `Active` to `Expired`.
    pub fn tick(&mut self) -> bool {
        if self.state == SessionState::Active && self.remaining().is_zero() {
            self.state = SessionState::Expired;
            tracing::info!(
                session = %self.id,
                turns = self.transcript.len(),
                "simulation expired without agreement"
            );
            return true;
        }
        false
    }

    /// Record the user's line and ask the counterpart for a reply.
    ///
    /// The user's turn stays in the transcript even when the backend fails;
    /// only successful exchanges are added to the LLM context.
    pub async fn submit_user_turn<B: ChatBackend>(
        &mut self,
        text: &str,
        backend: &B,
    ) -> Result<&Turn> {
        self.tick();
        match self.state {
            SessionState::Idle => return Err(HardballError::SessionIdle),
            SessionState::Expired => return Err(HardballError::SessionExpired),
            SessionState::Active => {}
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(HardballError::InvalidInput("message cannot be empty".into()));
        }
        let Some(credential) = self.credential.clone() else {
            return Err(HardballError::SessionIdle);
        };

        self.transcript.push(Turn::user(text, self.clock.now()));

        match backend.reply(&credential.0, &self.context, text).await {
            Ok(reply) => {
                self.context.push(ChatMessage::user(text));
                self.context.push(ChatMessage::model(reply.clone()));
                self.transcript.push(Turn::counterpart(reply, self.clock.now()));
                let last = self.transcript.len() - 1;
                Ok(&self.transcript[last])
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    error = %e,
                    "counterpart reply failed, user turn kept"
                );
                Err(e)
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// The LLM-facing history, including the hidden instruction exchange.
    pub fn hidden_context(&self) -> &[ChatMessage] {
        &self.context
    }

    pub fn personality(&self) -> Option<&CounterPersonality> {
        self.personality.as_ref()
    }

    pub fn instruction(&self) -> Option<&SystemInstruction> {
        self.instruction.as_ref()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Age of the session object on its own clock.
    pub fn age(&self) -> Duration {
        (self.clock.now() - self.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn phrases(&self) -> &'static Phrasebook {
        Phrasebook::for_language(self.language)
    }

    /// Everything a UI needs to draw the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining = self.remaining();
        let phrases = self.phrases();
        SessionSnapshot {
            id: self.id,
            state: self.state,
            operator: self.operator.clone(),
            style: self.personality.map(|p| p.style),
            counterpart_role: self.personality.map(|p| p.role.to_string()),
            remaining_secs: remaining.as_secs(),
            countdown: format_countdown(remaining),
            progress: self.progress(),
            transcript: self.transcript.clone(),
            notice: (self.state == SessionState::Expired)
                .then(|| phrases.expired_notice.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub state: SessionState,
    pub operator: Option<String>,
    pub style: Option<NegotiationStyle>,
    pub counterpart_role: Option<String>,
    pub remaining_secs: u64,
    pub countdown: String,
    pub progress: f64,
    pub transcript: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Render a countdown as `mm:ss`, rounding partial seconds down.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
