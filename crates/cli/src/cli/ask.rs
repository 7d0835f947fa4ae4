//! `medichat ask`: one-shot question.
//!
//! Runs a single exchange on a fresh session and exits.  Useful for
//! scripting and piping.

use mc_domain::config::Config;
use mc_sessions::TurnRole;

use super::render::{self, LiveReply};
use crate::bootstrap;

/// Send `message` and print the reply.
///
/// Returns `true` when the assistant produced an accepted reply.
pub async fn ask(
    config: Config,
    message: &str,
    model: Option<String>,
    json_output: bool,
) -> anyhow::Result<bool> {
    // JSON output wants the final turns only, so skip streaming.
    let streaming = config.llm.stream && !json_output;
    let mut ctl = bootstrap::build_controller(&config, model, streaming)?;

    let before = ctl.session().upstream_history().len();
    let added = if json_output {
        ctl.send(message, |_| {}).await
    } else {
        let mut live = LiveReply::default();
        let added = ctl.send(message, |p| live.on_progress(p)).await;
        let reply = added.iter().rev().find(|t| t.role() == TurnRole::Assistant);
        live.finish(reply);
        render::print_notices(&ctl.take_notices(), reply.map(|t| t.text()));
        added
    };
    let answered = ctl.session().upstream_history().len() > before;

    if added.is_empty() {
        eprintln!("nothing to send: the message is blank");
    }

    if json_output {
        let out = serde_json::json!({
            "session_id": ctl.session().session_id(),
            "answered": answered,
            "turns": added,
        });
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| anyhow::anyhow!("serializing turns: {e}"))?;
        println!("{json}");
    }

    Ok(answered)
}
