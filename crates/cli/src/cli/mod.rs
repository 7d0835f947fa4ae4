pub mod ask;
pub mod chat;
pub mod config;
mod render;

use std::path::Path;

use clap::{Parser, Subcommand};
use mc_domain::config::Config;

/// medichat: a terminal client for the medical information assistant.
#[derive(Debug, Parser)]
#[command(name = "medichat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive conversation (default when no subcommand is given).
    Chat {
        /// Model override (e.g. "gemini-1.5-pro").
        #[arg(long)]
        model: Option<String>,
        /// Wait for the full reply instead of streaming it.
        #[arg(long)]
        no_stream: bool,
    },
    /// Ask a single question and print the answer.
    Ask {
        /// The question to send.
        message: String,
        /// Model override (e.g. "gemini-1.5-pro").
        #[arg(long)]
        model: Option<String>,
        /// Print the resulting turns as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "MEDICHAT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "medichat.toml";

/// Load the configuration from the path in `MEDICHAT_CONFIG` (or
/// `medichat.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// Parse `path`, falling back to defaults when the file does not exist.
pub fn load_config_from(path: &str) -> anyhow::Result<Config> {
    if !Path::new(path).exists() {
        tracing::debug!(%path, "config file not found, using defaults");
        return Ok(Config::default());
    }

    let raw =
        std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, Config::default().llm.model);
    }

    #[test]
    fn file_overrides_are_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
model = "gemini-1.5-pro"
timeout_ms = 5000

[chat]
welcome_message = "Hi there."
"#
        )
        .unwrap();

        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.llm.timeout_ms, 5000);
        assert_eq!(config.chat.welcome_message, "Hi there.");
        assert!(config.llm.stream);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nmodel = ").unwrap();

        let path = file.path().to_str().unwrap().to_owned();
        let err = load_config_from(&path).unwrap_err().to_string();
        assert!(err.contains("parsing"));
        assert!(err.contains(&path));
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["medichat"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn ask_parses_flags() {
        let cli = Cli::try_parse_from(["medichat", "ask", "I have a cough", "--json"]).unwrap();
        match cli.command {
            Some(Command::Ask { message, json, model }) => {
                assert_eq!(message, "I have a cough");
                assert!(json);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
