//! Core of the Hardball negotiation simulator: the style → counter-personality
//! policy, timed sessions, and the LLM chat providers they talk to.

pub mod clock;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod personality;
pub mod phrases;
pub mod session;
