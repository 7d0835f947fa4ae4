use clap::Parser;
use tracing_subscriber::EnvFilter;

use mc_cli::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to the interactive chat when no subcommand is given.
        None => {
            init_cli_tracing();
            let (config, _) = mc_cli::cli::load_config()?;
            mc_cli::cli::chat::chat(config, None, false).await
        }
        Some(Command::Chat { model, no_stream }) => {
            init_cli_tracing();
            let (config, _) = mc_cli::cli::load_config()?;
            mc_cli::cli::chat::chat(config, model, no_stream).await
        }
        Some(Command::Ask { message, model, json }) => {
            init_cli_tracing();
            let (config, _) = mc_cli::cli::load_config()?;
            let answered = mc_cli::cli::ask::ask(config, &message, model, json).await?;
            if !answered {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = mc_cli::cli::load_config()?;
            let valid = mc_cli::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = mc_cli::cli::load_config()?;
            mc_cli::cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("medichat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Compact, stderr-only tracing so stdout carries nothing but replies.
///
/// `RUST_LOG=mc_sessions=info` surfaces the exchange lifecycle events.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
