//! `medichat chat`: interactive REPL command.
//!
//! Opens a readline loop that submits each line to the session and
//! streams the reply back.  Slash commands cover transcript review and
//! starting over.

use mc_domain::config::Config;
use mc_sessions::{ChatController, TurnRole};

use super::render::{self, LiveReply};
use crate::bootstrap;

/// Shown under the banner; replies are information, not advice.
pub const DISCLAIMER: &str = "Note: this assistant is for information only. \
Always consult a real healthcare professional for medical advice.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(config: Config, model: Option<String>, no_stream: bool) -> anyhow::Result<()> {
    let streaming = config.llm.stream && !no_stream;
    let mut ctl = bootstrap::build_controller(&config, model.clone(), streaming)?;

    // Readline editor with persistent history.
    let history_path = config
        .chat
        .history_file
        .clone()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_default()
                .join(".medichat")
                .join("chat_history.txt")
        });
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Banner goes to stderr; the transcript goes to stdout.
    eprintln!("medichat interactive chat");
    eprintln!("Type /help for commands, Ctrl+D to exit");
    eprintln!("\x1B[2m{DISCLAIMER}\x1B[0m");
    eprintln!();
    print_transcript(&ctl);
    if !ctl.session().input_enabled() {
        eprintln!("\x1B[33mAPI key not configured: replies are disabled.\x1B[0m");
    }

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── Slash commands ────────────────────────────────
                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut ctl, &config, &model) {
                        break;
                    }
                    continue;
                }

                // ── User message → exchange ───────────────────────
                send_message(&mut ctl, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command.  Returns `true` if the REPL should exit.
fn handle_slash_command(
    input: &str,
    ctl: &mut ChatController,
    config: &Config,
    model: &Option<String>,
) -> bool {
    let cmd = input.split_whitespace().next().unwrap_or(input);

    match cmd {
        "/exit" | "/quit" => return true,

        "/history" => print_transcript(ctl),

        "/clear" => {
            // ANSI escape: clear screen and move cursor to top-left.
            eprint!("\x1B[2J\x1B[1;1H");
        }

        "/reset" => {
            ctl.reset(bootstrap::session_settings(config, model.clone()));
            eprintln!("Conversation reset.");
            print_transcript(ctl);
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /history         Show the conversation so far");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /reset           Start a fresh conversation");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(ctl: &mut ChatController, text: &str) {
    let mut live = LiveReply::default();
    let added = ctl.send(text, |p| live.on_progress(p)).await;

    let reply = added.iter().rev().find(|t| t.role() == TurnRole::Assistant);
    live.finish(reply);
    render::print_notices(&ctl.take_notices(), reply.map(|t| t.text()));
    println!();
}

fn print_transcript(ctl: &ChatController) {
    for turn in ctl.session().current_transcript() {
        render::print_turn(&turn);
    }
    println!();
}
