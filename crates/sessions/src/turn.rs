//! Transcript entries.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Who a transcript entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    /// Typing placeholder shown while a reply is outstanding.  Never
    /// forwarded upstream.
    Pending,
}

impl TurnRole {
    fn tag(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Pending => "pending",
        }
    }
}

/// One message in the transcript.
///
/// Fields are private: a turn's text cannot change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: String,
    role: TurnRole,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub(crate) fn new(id: String, role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.role == TurnRole::Pending
    }

    /// Local wall-clock time as `HH:MM`, for display next to the bubble.
    pub fn display_time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Mints ordering-preserving turn ids: `{role}-{unix_millis}-{seq}`.
///
/// The sequence number keeps ids unique when two turns land in the same
/// millisecond (a user turn and its pending placeholder always do).
#[derive(Debug, Default)]
pub(crate) struct TurnIds {
    seq: u64,
}

impl TurnIds {
    pub(crate) fn next(&mut self, role: TurnRole) -> String {
        self.seq += 1;
        format!(
            "{}-{}-{}",
            role.tag(),
            Utc::now().timestamp_millis(),
            self.seq
        )
    }
}
