//! Conversation session management for medichat.
//!
//! A [`ConversationSession`] owns the rendered transcript and the upstream
//! history, and permits at most one remote exchange at a time.  The
//! [`ChatController`] drives a session against an
//! [`LlmProvider`](mc_providers::LlmProvider).

pub mod classify;
pub mod controller;
pub mod scroll;
pub mod session;
pub mod turn;

pub use classify::{classify_error, FailureKind};
pub use controller::{collect_stream, ChatController, ExchangeProgress};
pub use scroll::{scroll_behavior_for, ScrollBehavior, Viewport};
pub use session::{
    ConversationSession, CredentialStatus, ExchangeOutcome, Notice, NoticeLevel,
    PendingExchange, SessionSettings, SessionState,
};
pub use turn::{Turn, TurnRole};
