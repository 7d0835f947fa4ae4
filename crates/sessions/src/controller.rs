//! Drives a [`ConversationSession`] against a remote provider.
//!
//! `send` holds `&mut self` across the remote call, so the borrow checker
//! rules out a second concurrent exchange on top of the session's own
//! `AwaitingReply` guard.  There is no retry and no cancellation: a call
//! runs until the provider returns or its HTTP timeout fires.

use std::sync::Arc;

use futures_util::StreamExt;
use mc_domain::error::{Error, Result};
use mc_domain::stream::{BoxStream, StreamEvent, FINISH_INCOMPLETE};
use mc_providers::LlmProvider;

use crate::session::{
    ConversationSession, CredentialStatus, ExchangeOutcome, Notice, SessionSettings,
};
use crate::turn::Turn;

/// Progress callbacks emitted while a send is underway.
#[derive(Debug, Clone, Copy)]
pub enum ExchangeProgress<'a> {
    /// The typing placeholder was appended.
    Pending(&'a Turn),
    /// A streamed chunk of the reply arrived.
    Delta(&'a str),
}

pub struct ChatController {
    session: ConversationSession,
    provider: Option<Arc<dyn LlmProvider>>,
    streaming: bool,
}

impl ChatController {
    /// `provider` is `None` when no credential could be resolved; the
    /// session then starts with input disabled.
    pub fn new(
        settings: SessionSettings,
        provider: Option<Arc<dyn LlmProvider>>,
        streaming: bool,
    ) -> Self {
        let credential = if provider.is_some() {
            CredentialStatus::Present
        } else {
            CredentialStatus::Missing
        };
        Self {
            session: ConversationSession::new(settings, credential),
            provider,
            streaming,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.session.take_notices()
    }

    /// Start over with an empty transcript and history.
    pub fn reset(&mut self, settings: SessionSettings) {
        let credential = self.session.credential();
        self.session = ConversationSession::new(settings, credential);
    }

    /// Submit `text`, run the exchange, and resolve it.
    ///
    /// Returns the turns this call appended (the pending placeholder is
    /// gone by then).  Empty when the submission was a no-op.
    pub async fn send<F>(&mut self, text: &str, mut on_progress: F) -> Vec<Turn>
    where
        F: FnMut(ExchangeProgress<'_>),
    {
        let start = self.session.transcript_len();

        let Some(pending) = self.session.submit(text) else {
            return self.session.current_transcript().split_off(start);
        };

        if let Some(turn) = self.session.last_turn() {
            on_progress(ExchangeProgress::Pending(turn));
        }

        let outcome = match &self.provider {
            Some(provider) if self.streaming => {
                match provider.chat_stream(&pending.request).await {
                    Ok(stream) => {
                        collect_stream(provider.provider_id(), stream, |chunk| {
                            on_progress(ExchangeProgress::Delta(chunk))
                        })
                        .await
                    }
                    Err(e) => ExchangeOutcome::Failed(e),
                }
            }
            Some(provider) => provider.chat(&pending.request).await.into(),
            None => ExchangeOutcome::Failed(Error::Auth("no provider configured".into())),
        };

        self.session.resolve(outcome);
        self.session.current_transcript().split_off(start)
    }
}

/// Fold a provider stream into one outcome, forwarding each text chunk.
///
/// The first error (transport or in-band) fails the whole exchange; any
/// text received before it is discarded.  A stream that ends without a
/// `Done` event finishes as [`FINISH_INCOMPLETE`].
pub async fn collect_stream<F>(
    provider_id: &str,
    mut stream: BoxStream<'static, Result<StreamEvent>>,
    mut on_delta: F,
) -> ExchangeOutcome
where
    F: FnMut(&str),
{
    let mut text = String::new();
    let mut finish_reason = Some(FINISH_INCOMPLETE.to_owned());

    while let Some(event) = stream.next().await {
        match event {
            Ok(StreamEvent::Token { text: chunk }) => {
                on_delta(&chunk);
                text.push_str(&chunk);
            }
            Ok(StreamEvent::Done {
                finish_reason: reason,
                ..
            }) => {
                finish_reason = reason;
                break;
            }
            Ok(StreamEvent::Error { message }) => {
                return ExchangeOutcome::Failed(Error::Provider {
                    provider: provider_id.to_owned(),
                    message,
                });
            }
            Err(e) => return ExchangeOutcome::Failed(e),
        }
    }

    ExchangeOutcome::Reply {
        text,
        finish_reason,
    }
}
