//! Terminal rendering shared by `chat` and `ask`.

use std::io::Write;

use mc_sessions::{ExchangeProgress, Notice, NoticeLevel, Turn, TurnRole};

const DIM: &str = "\x1B[2m";
const YELLOW: &str = "\x1B[33m";
const RED: &str = "\x1B[31m";
const RESET: &str = "\x1B[0m";

/// One transcript line, e.g. `[14:02] assistant: ...`.
pub(crate) fn print_turn(turn: &Turn) {
    let who = match turn.role() {
        TurnRole::User => "you",
        TurnRole::Assistant => "assistant",
        TurnRole::Pending => return,
    };
    println!("{DIM}[{}]{RESET} {who}: {}", turn.display_time(), turn.text());
}

/// Print notices to stderr, skipping any that repeat `shown`, the text
/// already printed as the reply.
pub(crate) fn print_notices(notices: &[Notice], shown: Option<&str>) {
    for notice in notices.iter().filter(|n| Some(n.message.as_str()) != shown) {
        let color = match notice.level {
            NoticeLevel::Info => DIM,
            NoticeLevel::Warning => YELLOW,
            NoticeLevel::Error => RED,
        };
        eprintln!("{color}! {}{RESET}", notice.message);
    }
}

/// Echoes progress while an exchange runs and remembers what was streamed.
#[derive(Default)]
pub(crate) struct LiveReply {
    streamed: String,
    typing_shown: bool,
}

impl LiveReply {
    pub(crate) fn on_progress(&mut self, progress: ExchangeProgress<'_>) {
        match progress {
            ExchangeProgress::Pending(turn) => {
                eprint!("{DIM}{}{RESET}", turn.text());
                std::io::stderr().flush().ok();
                self.typing_shown = true;
            }
            ExchangeProgress::Delta(chunk) => {
                if self.streamed.is_empty() {
                    self.clear_typing();
                    print!("assistant: ");
                }
                self.streamed.push_str(chunk);
                print!("{chunk}");
                std::io::stdout().flush().ok();
            }
        }
    }

    /// Print the committed reply unless streaming already showed it.
    pub(crate) fn finish(mut self, reply: Option<&Turn>) {
        self.clear_typing();
        let Some(reply) = reply else {
            return;
        };
        if !self.streamed.is_empty() {
            println!();
            if reply.text() == self.streamed {
                return;
            }
            // Streamed text that was later rejected never became a turn.
            eprintln!("{DIM}(partial reply discarded){RESET}");
        }
        print_turn(reply);
    }

    fn clear_typing(&mut self) {
        if std::mem::take(&mut self.typing_shown) {
            // Carriage return + erase line.
            eprint!("\r\x1B[2K");
            std::io::stderr().flush().ok();
        }
    }
}
