//! The conversation state machine.
//!
//! ```text
//!            submit(text)                    resolve(outcome)
//!   Idle ───────────────────▶ AwaitingReply ──────────────────▶ Idle
//!     ▲  guard: non-blank,      + user turn                      - pending turn
//!     │  credential present     + pending turn                   + one assistant turn
//!     └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The transcript is what the user sees; the upstream history is what the
//! remote sees.  Only exchanges that ended in a plain success reach the
//! history, so a blocked or failed exchange never pollutes the context of
//! the next request.

use mc_domain::config::{Config, SafetySetting};
use mc_domain::error::{Error, Result};
use mc_domain::message::HistoryMessage;
use mc_domain::stream::is_normal_finish;
use mc_domain::trace::TraceEvent;
use mc_providers::{ChatRequest, ChatResponse};

use crate::classify::{classify_error, FailureKind};
use crate::scroll::{scroll_behavior_for, ScrollBehavior};
use crate::turn::{Turn, TurnIds, TurnRole};

/// Id of the seeded welcome turn.
pub const WELCOME_TURN_ID: &str = "welcome";

/// Text of the typing placeholder.
pub const PENDING_TEXT: &str = "Typing...";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

/// Whether an API key was found at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Present,
    Missing,
}

/// Per-session exchange configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub welcome_message: String,
    /// Sent as the system instruction of every request, never as history.
    pub system_preamble: String,
    pub safety: Vec<SafetySetting>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            welcome_message: config.chat.welcome_message.clone(),
            system_preamble: config.chat.system_preamble.clone(),
            safety: config.llm.safety.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_output_tokens,
            model: Some(config.llm.model.clone()),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// An accepted submission waiting to be sent.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub request: ChatRequest,
}

/// How a remote exchange settled.
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// The call returned.  `text` may still be empty or blocked.
    Reply {
        text: String,
        finish_reason: Option<String>,
    },
    /// The call failed.
    Failed(Error),
}

impl ExchangeOutcome {
    fn is_accepted_reply(&self) -> bool {
        match self {
            Self::Reply {
                text,
                finish_reason,
            } => {
                !text.trim().is_empty() && is_normal_finish(finish_reason.as_deref())
            }
            Self::Failed(_) => false,
        }
    }
}

impl From<Result<ChatResponse>> for ExchangeOutcome {
    fn from(result: Result<ChatResponse>) -> Self {
        match result {
            Ok(resp) => Self::Reply {
                text: resp.content,
                finish_reason: resp.finish_reason,
            },
            Err(e) => Self::Failed(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient notification (toast) for the host to show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The in-flight exchange exists only inside `AwaitingReply`, so a second
/// one cannot be represented.
#[derive(Debug)]
enum Phase {
    Idle,
    AwaitingReply { user_text: String, pending_id: String },
}

/// Owns one conversation: transcript, upstream history, and the single
/// in-flight exchange.
#[derive(Debug)]
pub struct ConversationSession {
    session_id: String,
    settings: SessionSettings,
    credential: CredentialStatus,
    transcript: Vec<Turn>,
    history: Vec<HistoryMessage>,
    phase: Phase,
    notices: Vec<Notice>,
    ids: TurnIds,
}

impl ConversationSession {
    /// Start a session seeded with the welcome turn.
    pub fn new(settings: SessionSettings, credential: CredentialStatus) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let welcome = Turn::new(
            WELCOME_TURN_ID.to_owned(),
            TurnRole::Assistant,
            settings.welcome_message.clone(),
        );

        TraceEvent::SessionStarted {
            session_id: session_id.clone(),
            credential_present: credential == CredentialStatus::Present,
        }
        .emit();

        Self {
            session_id,
            settings,
            credential,
            transcript: vec![welcome],
            history: Vec::new(),
            phase: Phase::Idle,
            notices: Vec::new(),
            ids: TurnIds::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::AwaitingReply { .. } => SessionState::AwaitingReply,
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state() == SessionState::AwaitingReply
    }

    pub fn credential(&self) -> CredentialStatus {
        self.credential
    }

    /// Whether the host should accept input right now.  Permanently false
    /// without a credential.
    pub fn input_enabled(&self) -> bool {
        self.credential == CredentialStatus::Present && !self.is_awaiting_reply()
    }

    /// Snapshot of the transcript for rendering.
    pub fn current_transcript(&self) -> Vec<Turn> {
        self.transcript.clone()
    }

    pub fn transcript_len(&self) -> usize {
        self.transcript.len()
    }

    /// The newest turn, borrowed.
    pub fn last_turn(&self) -> Option<&Turn> {
        self.transcript.last()
    }

    /// Accepted (user, model) pairs, oldest first.
    pub fn upstream_history(&self) -> &[HistoryMessage] {
        &self.history
    }

    /// How the view should move to the newest turn.
    pub fn scroll_behavior(&self) -> ScrollBehavior {
        scroll_behavior_for(&self.transcript)
    }

    /// Drain queued notifications.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ── Transitions ────────────────────────────────────────────────

    /// Submit user input.
    ///
    /// Blank input or a submit while a reply is outstanding is a silent
    /// no-op.  Without a credential the user turn is recorded and answered
    /// immediately with the "not configured" message; nothing is sent.
    /// Otherwise the session moves to `AwaitingReply` and returns the
    /// request to send.
    pub fn submit(&mut self, text: &str) -> Option<PendingExchange> {
        let text = text.trim();
        if text.is_empty() {
            self.reject("blank input");
            return None;
        }
        if self.is_awaiting_reply() {
            self.reject("exchange already in flight");
            return None;
        }

        self.push_turn(TurnRole::User, text);

        if self.credential == CredentialStatus::Missing {
            let kind = FailureKind::MissingCredential;
            self.push_turn(TurnRole::Assistant, kind.user_message());
            self.notify(NoticeLevel::Error, kind.user_message());
            self.reject(kind.as_str());
            return None;
        }

        let pending_id = self.push_turn(TurnRole::Pending, PENDING_TEXT);

        let mut messages = self.history.clone();
        messages.push(HistoryMessage::user(text));
        let request = ChatRequest {
            system: Some(self.settings.system_preamble.clone()),
            messages,
            safety: self.settings.safety.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            model: self.settings.model.clone(),
        };

        TraceEvent::ExchangeStarted {
            session_id: self.session_id.clone(),
            history_messages: self.history.len(),
            user_chars: text.chars().count(),
        }
        .emit();

        self.phase = Phase::AwaitingReply {
            user_text: text.to_owned(),
            pending_id,
        };

        Some(PendingExchange { request })
    }

    /// Settle the outstanding exchange.
    ///
    /// Removes the pending turn and appends exactly one assistant turn.
    /// Ignored when nothing is outstanding.
    pub fn resolve(&mut self, outcome: ExchangeOutcome) {
        let (user_text, pending_id) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingReply {
                user_text,
                pending_id,
            } => (user_text, pending_id),
            Phase::Idle => {
                tracing::warn!(session_id = %self.session_id, "resolve called with no exchange in flight");
                return;
            }
        };

        self.transcript.retain(|t| t.id() != pending_id);

        let accepted = outcome.is_accepted_reply();
        let label = match outcome {
            ExchangeOutcome::Reply { text, .. } if accepted => {
                self.history.push(HistoryMessage::user(user_text));
                self.history.push(HistoryMessage::model(text.clone()));
                self.push_turn(TurnRole::Assistant, text);
                "success"
            }
            ExchangeOutcome::Reply { finish_reason, .. } => {
                tracing::info!(
                    session_id = %self.session_id,
                    finish_reason = finish_reason.as_deref().unwrap_or("none"),
                    "reply empty or filtered"
                );
                let kind = FailureKind::ContentFiltered;
                self.push_turn(TurnRole::Assistant, kind.user_message());
                self.notify(NoticeLevel::Warning, kind.user_message());
                kind.as_str()
            }
            ExchangeOutcome::Failed(err) => {
                let kind = classify_error(&err);
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %err,
                    kind = kind.as_str(),
                    "exchange failed"
                );
                self.push_turn(TurnRole::Assistant, kind.user_message());
                self.notify(NoticeLevel::Error, kind.user_message());
                kind.as_str()
            }
        };

        TraceEvent::ExchangeResolved {
            session_id: self.session_id.clone(),
            outcome: label.to_owned(),
            history_messages: self.history.len(),
            transcript_turns: self.transcript.len(),
        }
        .emit();
    }

    // ── Private helpers ────────────────────────────────────────────

    fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) -> String {
        let id = self.ids.next(role);
        self.transcript.push(Turn::new(id.clone(), role, text));
        id
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push(Notice {
            level,
            message: message.to_owned(),
        });
    }

    fn reject(&self, reason: &str) {
        tracing::debug!(session_id = %self.session_id, reason, "submission not sent");
        TraceEvent::SubmissionRejected {
            session_id: self.session_id.clone(),
            reason: reason.to_owned(),
        }
        .emit();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{
        CONTENT_RESTRICTED_MESSAGE, MISSING_CREDENTIAL_MESSAGE, QUOTA_EXCEEDED_MESSAGE,
    };
    use mc_domain::message::HistoryRole;
    use mc_domain::stream::FINISH_INCOMPLETE;

    fn session() -> ConversationSession {
        ConversationSession::new(SessionSettings::default(), CredentialStatus::Present)
    }

    fn reply(text: &str, reason: Option<&str>) -> ExchangeOutcome {
        ExchangeOutcome::Reply {
            text: text.into(),
            finish_reason: reason.map(str::to_owned),
        }
    }

    fn roles(s: &ConversationSession) -> Vec<TurnRole> {
        s.current_transcript().iter().map(Turn::role).collect()
    }

    fn pending_count(s: &ConversationSession) -> usize {
        s.current_transcript().iter().filter(|t| t.is_pending()).count()
    }

    #[test]
    fn starts_idle_with_welcome_turn() {
        let s = session();
        assert_eq!(s.state(), SessionState::Idle);
        let t = s.current_transcript();
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].id(), WELCOME_TURN_ID);
        assert_eq!(t[0].role(), TurnRole::Assistant);
        assert!(s.upstream_history().is_empty());
        assert!(s.input_enabled());
    }

    #[test]
    fn headache_scenario() {
        let mut s = session();
        let pending = s.submit("I have a headache").unwrap();

        assert_eq!(
            roles(&s),
            vec![TurnRole::Assistant, TurnRole::User, TurnRole::Pending]
        );
        assert_eq!(s.current_transcript()[1].text(), "I have a headache");
        assert_eq!(s.state(), SessionState::AwaitingReply);
        assert!(!s.input_enabled());

        let msgs = &pending.request.messages;
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0], HistoryMessage::user("I have a headache"));

        s.resolve(reply(
            "Possible tension headache; consider a neurologist.",
            Some("stop"),
        ));

        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(
            roles(&s),
            vec![TurnRole::Assistant, TurnRole::User, TurnRole::Assistant]
        );
        assert_eq!(
            s.current_transcript()[2].text(),
            "Possible tension headache; consider a neurologist."
        );
        assert_eq!(
            s.upstream_history(),
            &[
                HistoryMessage::user("I have a headache"),
                HistoryMessage::model("Possible tension headache; consider a neurologist."),
            ]
        );
    }

    #[test]
    fn submits_while_awaiting_are_ignored() {
        let mut s = session();
        s.submit("first").unwrap();
        let before = s.current_transcript();

        for text in ["second", "third", "  fourth  "] {
            assert!(s.submit(text).is_none());
        }

        assert_eq!(s.current_transcript(), before);
        assert_eq!(pending_count(&s), 1);
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut s = session();
        assert!(s.submit("").is_none());
        assert!(s.submit("   \n\t").is_none());
        assert_eq!(s.transcript_len(), 1);
        assert!(s.take_notices().is_empty());
    }

    #[test]
    fn submitted_text_is_trimmed() {
        let mut s = session();
        let pending = s.submit("  fever since Monday \n").unwrap();
        assert_eq!(s.current_transcript()[1].text(), "fever since Monday");
        assert_eq!(pending.request.messages[0].text, "fever since Monday");
    }

    #[test]
    fn request_carries_preamble_outside_history() {
        let mut s = session();
        let pending = s.submit("hello").unwrap();
        let req = pending.request;
        assert_eq!(
            req.system.as_deref(),
            Some(mc_domain::config::DEFAULT_SYSTEM_PREAMBLE)
        );
        assert!(req.messages.iter().all(|m| m.text != req.system.clone().unwrap()));
        assert_eq!(req.safety.len(), 4);
    }

    #[test]
    fn missing_credential_answers_immediately() {
        let mut s = ConversationSession::new(SessionSettings::default(), CredentialStatus::Missing);
        assert!(!s.input_enabled());

        assert!(s.submit("I have a headache").is_none());

        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(pending_count(&s), 0);
        let t = s.current_transcript();
        assert_eq!(t.last().unwrap().role(), TurnRole::Assistant);
        assert_eq!(t.last().unwrap().text(), MISSING_CREDENTIAL_MESSAGE);
        assert!(s.upstream_history().is_empty());

        let notices = s.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(s.take_notices().is_empty());
    }

    #[test]
    fn blocked_reply_is_not_remembered() {
        let mut s = session();
        s.submit("something").unwrap();
        s.resolve(reply("", Some("safety")));

        let last = s.current_transcript().pop().unwrap();
        assert_eq!(last.text(), CONTENT_RESTRICTED_MESSAGE);
        assert!(s.upstream_history().is_empty());
        assert_eq!(pending_count(&s), 0);
        assert_eq!(s.take_notices()[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn non_stop_reason_with_text_is_still_restricted() {
        let mut s = session();
        s.submit("something").unwrap();
        s.resolve(reply("half an answ", Some("length")));
        assert_eq!(
            s.current_transcript().last().unwrap().text(),
            CONTENT_RESTRICTED_MESSAGE
        );
        assert!(s.upstream_history().is_empty());
    }

    #[test]
    fn absent_finish_reason_with_text_is_success() {
        let mut s = session();
        s.submit("q").unwrap();
        s.resolve(reply("a", None));
        assert_eq!(s.upstream_history().len(), 2);
    }

    #[test]
    fn failure_is_classified_and_not_remembered() {
        let mut s = session();
        s.submit("q").unwrap();
        s.resolve(ExchangeOutcome::Failed(Error::Other(
            "429: rate limit exceeded".into(),
        )));

        assert_eq!(
            s.current_transcript().last().unwrap().text(),
            QUOTA_EXCEEDED_MESSAGE
        );
        assert!(s.upstream_history().is_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.input_enabled());
    }

    #[test]
    fn failed_exchange_does_not_pollute_next_request() {
        let mut s = session();
        s.submit("one").unwrap();
        s.resolve(reply("first answer", Some("stop")));
        s.submit("two").unwrap();
        s.resolve(ExchangeOutcome::Failed(Error::Http("network down".into())));

        let pending = s.submit("three").unwrap();
        let texts: Vec<&str> = pending
            .request
            .messages
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(texts, vec!["one", "first answer", "three"]);
        assert_eq!(pending.request.messages[1].role, HistoryRole::Model);
    }

    #[test]
    fn history_counts_only_successes() {
        let mut s = session();
        let outcomes = vec![
            reply("ok 1", Some("stop")),
            reply("", Some("stop")),
            ExchangeOutcome::Failed(Error::Timeout("timed out".into())),
            reply("ok 2", Some("stop")),
            reply("", Some("blocked:safety")),
        ];
        for (i, outcome) in outcomes.into_iter().enumerate() {
            s.submit(&format!("question {i}")).unwrap();
            s.resolve(outcome);
            assert_eq!(pending_count(&s), 0);
        }
        assert_eq!(s.upstream_history().len() / 2, 2);
        // welcome + 5 × (user, assistant)
        assert_eq!(s.transcript_len(), 11);
    }

    #[test]
    fn each_resolution_adds_exactly_one_turn() {
        let mut s = session();
        s.submit("q").unwrap();
        let with_pending = s.transcript_len();
        s.resolve(reply("a", Some("stop")));
        // pending removed, assistant added
        assert_eq!(s.transcript_len(), with_pending);
    }

    #[test]
    fn resolve_when_idle_is_ignored() {
        let mut s = session();
        s.resolve(reply("stray", Some("stop")));
        assert_eq!(s.transcript_len(), 1);
        assert!(s.upstream_history().is_empty());
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut s = session();
        s.submit("q").unwrap();
        assert_eq!(s.current_transcript(), s.current_transcript());
    }

    #[test]
    fn scroll_follows_transcript() {
        let mut s = session();
        assert_eq!(s.scroll_behavior(), ScrollBehavior::Instant);
        s.submit("q").unwrap();
        assert_eq!(s.scroll_behavior(), ScrollBehavior::Instant);
        s.resolve(reply("a", Some("stop")));
        assert_eq!(s.scroll_behavior(), ScrollBehavior::Smooth);
    }

    #[test]
    fn turn_ids_are_unique() {
        let mut s = session();
        for q in ["a", "b", "c"] {
            s.submit(q).unwrap();
            s.resolve(reply("x", Some("stop")));
        }
        let mut ids: Vec<String> = s
            .current_transcript()
            .iter()
            .map(|t| t.id().to_owned())
            .collect();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }

    #[test]
    fn uppercase_stop_is_accepted() {
        let mut s = session();
        s.submit("I have a headache").unwrap();
        s.resolve(reply(
            "Possible tension headache; consider a neurologist.",
            Some("STOP"),
        ));

        assert_eq!(
            s.last_turn().map(Turn::text),
            Some("Possible tension headache; consider a neurologist.")
        );
        assert_eq!(s.upstream_history().len(), 2);
    }

    #[test]
    fn incomplete_stream_is_not_accepted() {
        let mut s = session();
        s.submit("I have a rash").unwrap();
        s.resolve(reply("It could be", Some(FINISH_INCOMPLETE)));

        assert_eq!(
            s.last_turn().map(Turn::text),
            Some(CONTENT_RESTRICTED_MESSAGE)
        );
        assert!(s.upstream_history().is_empty());
    }

    #[test]
    fn last_turn_tracks_the_placeholder() {
        let mut s = session();
        assert_eq!(s.last_turn().map(Turn::id), Some(WELCOME_TURN_ID));

        s.submit("hello").unwrap();
        assert!(s.last_turn().is_some_and(Turn::is_pending));
    }
}
