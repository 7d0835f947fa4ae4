//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` and `streamGenerateContent` APIs.
//! Auth is via an API key passed as a query parameter (`key={api_key}`).
//! Every request carries the system instruction and the configured safety
//! settings; blocked prompts and filtered candidates come back as an empty
//! reply with a non-`stop` finish reason rather than as an error.

use crate::sse::sse_response_stream;
use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};
use mc_domain::config::LlmConfig;
use mc_domain::error::{Error, Result};
use mc_domain::message::{HistoryMessage, HistoryRole};
use mc_domain::stream::{BoxStream, SafetyRating, StreamEvent, Usage, FINISH_STOP};
use mc_domain::trace::TraceEvent;
use serde_json::Value;
use std::time::{Duration, Instant};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An LLM provider adapter for the Google Gemini API.
pub struct GoogleProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    /// Build a provider with an already-resolved API key.
    pub fn new(cfg: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_model: cfg.model.clone(),
            client,
        })
    }

    /// Resolve the credential from `cfg.auth`, then build the provider.
    ///
    /// Fails with [`Error::Auth`] when no key can be found, before any
    /// network traffic happens.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let key = resolve_api_key(&cfg.auth)?;
        Self::new(cfg, key)
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        )
    }

    fn model_for(&self, req: &ChatRequest) -> String {
        req.model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let raw = resp.text().await.map_err(from_reqwest)?;
        Err(Error::Status {
            provider: self.id.clone(),
            status: status.as_u16(),
            message: extract_error_message(&raw),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request serialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn build_body(req: &ChatRequest) -> Value {
    let contents: Vec<Value> = req.messages.iter().map(message_to_gemini).collect();

    let mut body = serde_json::json!({
        "contents": contents,
    });

    if let Some(system) = req.system.as_deref().filter(|s| !s.trim().is_empty()) {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{"text": system}]
        });
    }

    if !req.safety.is_empty() {
        let settings: Vec<Value> = req
            .safety
            .iter()
            .map(|s| {
                serde_json::json!({
                    "category": s.category.wire_name(),
                    "threshold": s.threshold.wire_name(),
                })
            })
            .collect();
        body["safetySettings"] = Value::Array(settings);
    }

    let mut gen_config = serde_json::Map::new();
    if let Some(temp) = req.temperature {
        gen_config.insert("temperature".into(), serde_json::json!(temp));
    }
    if let Some(max) = req.max_tokens {
        gen_config.insert("maxOutputTokens".into(), serde_json::json!(max));
    }
    if !gen_config.is_empty() {
        body["generationConfig"] = Value::Object(gen_config);
    }

    body
}

fn message_to_gemini(msg: &HistoryMessage) -> Value {
    let role = match msg.role {
        HistoryRole::User => "user",
        HistoryRole::Model => "model",
    };
    serde_json::json!({
        "role": role,
        "parts": [{"text": msg.text}],
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn normalize_finish_reason(raw: &str) -> String {
    match raw {
        "STOP" => FINISH_STOP.to_string(),
        "MAX_TOKENS" => "length".to_string(),
        other => other.to_lowercase(),
    }
}

/// `promptFeedback.blockReason`, set when the prompt itself was refused.
fn prompt_block_reason(body: &Value) -> Option<String> {
    body.get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
        .map(|r| format!("blocked:{}", r.to_lowercase()))
}

fn first_candidate(body: &Value) -> Option<&Value> {
    body.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
}

fn candidate_text(candidate: &Value) -> String {
    candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn parse_safety_ratings(candidate: &Value) -> Vec<SafetyRating> {
    candidate
        .get("safetyRatings")
        .and_then(|r| r.as_array())
        .map(|ratings| {
            ratings
                .iter()
                .filter_map(|r| {
                    Some(SafetyRating {
                        category: r.get("category")?.as_str()?.to_string(),
                        probability: r.get("probability")?.as_str()?.to_string(),
                        blocked: r.get("blocked").and_then(|b| b.as_bool()).unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|t| t.as_u64())
        .unwrap_or(u64::from(prompt) + u64::from(completion)) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

fn parse_gemini_response(body: &Value, model: &str) -> Result<ChatResponse> {
    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    let Some(candidate) = first_candidate(body) else {
        // No candidates is only legitimate when the prompt was blocked.
        let reason = prompt_block_reason(body).ok_or_else(|| Error::Provider {
            provider: "gemini".into(),
            message: "no candidates in response".into(),
        })?;
        return Ok(ChatResponse {
            content: String::new(),
            usage,
            model: model.to_string(),
            finish_reason: Some(reason),
            safety_ratings: Vec::new(),
        });
    };

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(normalize_finish_reason);

    Ok(ChatResponse {
        content: candidate_text(candidate),
        usage,
        model: model.to_string(),
        finish_reason,
        safety_ratings: parse_safety_ratings(candidate),
    })
}

/// Pull `error.message` (and `error.status`) out of a Gemini error body,
/// falling back to the raw text.
fn extract_error_message(raw: &str) -> String {
    let Ok(v) = serde_json::from_str::<Value>(raw) else {
        return raw.trim().to_string();
    };
    let err = v.get("error");
    let message = err
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str());
    let status = err
        .and_then(|e| e.get("status"))
        .and_then(|s| s.as_str());
    match (message, status) {
        (Some(m), Some(s)) => format!("{m} ({s})"),
        (Some(m), None) => m.to_string(),
        _ => raw.trim().to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Streaming helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse a single Gemini streaming SSE data payload.
fn parse_gemini_sse_data(data: &str) -> Vec<Result<StreamEvent>> {
    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::Json(e))],
    };

    if let Some(err) = v.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown stream error")
            .to_string();
        return vec![Ok(StreamEvent::Error { message })];
    }

    let usage = v.get("usageMetadata").and_then(parse_gemini_usage);

    let Some(candidate) = first_candidate(&v) else {
        return match prompt_block_reason(&v) {
            Some(reason) => vec![Ok(StreamEvent::Done {
                usage,
                finish_reason: Some(reason),
            })],
            None => Vec::new(),
        };
    };

    let mut events = Vec::new();

    let text = candidate_text(candidate);
    if !text.is_empty() {
        events.push(Ok(StreamEvent::Token { text }));
    }

    if let Some(fr) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        events.push(Ok(StreamEvent::Done {
            usage,
            finish_reason: Some(normalize_finish_reason(fr)),
        }));
    }

    events
}

/// Redact API key from URL for safe logging.
fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let model = self.model_for(req);
        let url = self.generate_url(&model);
        let body = build_body(req);
        let started = Instant::now();

        tracing::debug!(provider = %self.id, url = %redact_url_key(&url), "google chat request");

        let resp = self.post(&url, &body).await?;
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        let resp_json: Value = serde_json::from_str(&resp_text)?;
        let parsed = parse_gemini_response(&resp_json, &model)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model,
            streaming: false,
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens),
        }
        .emit();

        if !parsed.finished_normally() {
            let blocked: Vec<&str> = parsed
                .safety_ratings
                .iter()
                .filter(|r| r.blocked)
                .map(|r| r.category.as_str())
                .collect();
            tracing::info!(
                provider = %self.id,
                finish_reason = ?parsed.finish_reason,
                ?blocked,
                "reply did not finish normally"
            );
        }

        Ok(parsed)
    }

    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let model = self.model_for(req);
        let url = self.stream_url(&model);
        let body = build_body(req);
        let started = Instant::now();

        tracing::debug!(provider = %self.id, url = %redact_url_key(&url), "google stream request");

        let resp = self.post(&url, &body).await?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model,
            streaming: true,
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: None,
            completion_tokens: None,
        }
        .emit();

        Ok(sse_response_stream(resp, parse_gemini_sse_data))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
