//! Incremental reply events.

use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Boxed, sendable stream of reply events.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// Completion reason for a reply the model finished on its own.  Every
/// other reason (length cap, safety block, recitation) is normalised to a
/// different lowercase string.
pub const FINISH_STOP: &str = "stop";

/// Completion reason for a stream that closed before the remote reported
/// one.  Not a normal finish.
pub const FINISH_INCOMPLETE: &str = "incomplete";

/// Whether `reason` means the model finished on its own.
///
/// Case-insensitive, so a raw Gemini `STOP` counts too.  An absent reason
/// is taken at face value.
pub fn is_normal_finish(reason: Option<&str>) -> bool {
    reason.map_or(true, |r| r.eq_ignore_ascii_case(FINISH_STOP))
}

/// One step of a streamed reply.
///
/// A well-formed stream is zero or more `Token`s followed by exactly one
/// `Done`; an `Error` may replace the `Done`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token { text: String },

    Done {
        usage: Option<Usage>,
        /// `None` when the remote omitted it.
        finish_reason: Option<String>,
    },

    /// Reported in-band by the remote.
    Error { message: String },
}

/// Token accounting reported with the final chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Safety verdict for one harm category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    /// `NEGLIGIBLE`, `LOW`, `MEDIUM` or `HIGH`.
    pub probability: String,
    #[serde(default)]
    pub blocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_in_any_case_is_normal() {
        assert!(is_normal_finish(Some("stop")));
        assert!(is_normal_finish(Some("STOP")));
        assert!(is_normal_finish(None));
    }

    #[test]
    fn other_reasons_are_not_normal() {
        assert!(!is_normal_finish(Some("length")));
        assert!(!is_normal_finish(Some("SAFETY")));
        assert!(!is_normal_finish(Some(FINISH_INCOMPLETE)));
    }
}
