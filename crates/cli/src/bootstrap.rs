//! Wires config into a ready-to-use [`ChatController`].

use std::sync::Arc;

use mc_domain::config::Config;
use mc_domain::error::Error;
use mc_providers::{GoogleProvider, LlmProvider};
use mc_sessions::{ChatController, SessionSettings};

/// Build the remote provider, or `None` when no API key can be resolved.
///
/// A missing key is not fatal: the session starts with input disabled and
/// answers with the "not configured" message instead.
pub fn build_provider(config: &Config) -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    match GoogleProvider::from_config(&config.llm) {
        Ok(provider) => {
            tracing::debug!(
                provider = %config.llm.provider_id,
                model = %config.llm.model,
                "provider ready"
            );
            Ok(Some(Arc::new(provider)))
        }
        Err(Error::Auth(reason)) => {
            tracing::warn!(%reason, "no API key resolved; assistant disabled");
            Ok(None)
        }
        Err(e) => Err(anyhow::anyhow!("initializing provider: {e}")),
    }
}

/// Session settings from config, with an optional model override.
pub fn session_settings(config: &Config, model: Option<String>) -> SessionSettings {
    let mut settings = SessionSettings::from_config(config);
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        settings.model = Some(model);
    }
    settings
}

pub fn build_controller(
    config: &Config,
    model: Option<String>,
    streaming: bool,
) -> anyhow::Result<ChatController> {
    let provider = build_provider(config)?;
    Ok(ChatController::new(
        session_settings(config, model),
        provider,
        streaming,
    ))
}
