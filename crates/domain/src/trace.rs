use serde::Serialize;

/// Structured trace events emitted across all medichat crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionStarted {
        session_id: String,
        credential_present: bool,
    },
    SubmissionRejected {
        session_id: String,
        reason: String,
    },
    ExchangeStarted {
        session_id: String,
        history_messages: usize,
        user_chars: usize,
    },
    ExchangeResolved {
        session_id: String,
        outcome: String,
        history_messages: usize,
        transcript_turns: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mc_event");
    }
}
