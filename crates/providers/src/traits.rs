use mc_domain::config::SafetySetting;
use mc_domain::error::Result;
use mc_domain::message::HistoryMessage;
use mc_domain::stream::{is_normal_finish, BoxStream, SafetyRating, StreamEvent, Usage};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Behavioural preamble, sent as the system instruction.
    pub system: Option<String>,
    /// Accepted history followed by the new user message.
    pub messages: Vec<HistoryMessage>,
    /// Content filtering thresholds.
    pub safety: Vec<SafetySetting>,
    /// Sampling temperature (0.0 – 2.0). `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Textual content of the response.  Empty when the reply was blocked.
    pub content: String,
    /// Token usage information.
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// Normalised reason the model stopped generating ("stop", "length",
    /// "safety", ...).  A prompt-level block is reported here too.
    pub finish_reason: Option<String>,
    pub safety_ratings: Vec<SafetyRating>,
}

impl ChatResponse {
    /// True when the model finished normally (or did not say otherwise).
    pub fn finished_normally(&self) -> bool {
        is_normal_finish(self.finish_reason.as_deref())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The remote generative-language service, seen as an opaque
/// request/response boundary.
///
/// Implementations translate between our internal types and the wire
/// format of a provider's HTTP API.  Tests substitute scripted doubles.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Send a chat completion request and return a stream of events.
    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
