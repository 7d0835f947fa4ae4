use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Assistant turn seeded into every new transcript.
    #[serde(default = "d_welcome")]
    pub welcome_message: String,
    /// Behavioural preamble sent as the system instruction on every request.
    /// Never stored in the upstream history.
    #[serde(default = "d_preamble")]
    pub system_preamble: String,
    /// REPL line-history file.  Defaults to `~/.medichat/chat_history.txt`.
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: d_welcome(),
            system_preamble: d_preamble(),
            history_file: None,
        }
    }
}

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! I'm your Medical AI Assistant. \
Please describe your symptoms, and I'll help identify potential diseases and \
suggest appropriate medical tests.";

pub const DEFAULT_SYSTEM_PREAMBLE: &str = "You are a medical information assistant. \
Help users understand their symptoms, possible conditions, and which medical tests \
or specialists may be relevant. Always state clearly that you are not a doctor, \
that your answers are for informational purposes only, and that they are not a \
diagnosis; encourage the user to consult a qualified healthcare professional, and \
to seek emergency care for severe or sudden symptoms. Politely decline requests \
that are not about health or medicine.";

fn d_welcome() -> String {
    DEFAULT_WELCOME_MESSAGE.into()
}
fn d_preamble() -> String {
    DEFAULT_SYSTEM_PREAMBLE.into()
}
