use mc_domain::config::{Config, ConfigSeverity};
use mc_providers::resolve_api_key;

/// Parse and validate the config, printing any issues.
///
/// Also checks that an API key can be resolved, which needs the
/// environment and keychain and so is not part of [`Config::validate`].
/// Returns `false` when errors were found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    let credential = resolve_api_key(&config.llm.auth).err();

    if issues.is_empty() && credential.is_none() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let mut warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }
    if let Some(e) = credential {
        // Missing keys only disable replies, so this stays a warning.
        println!("[WARN] llm.auth: {e}");
        warning_count += 1;
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
///
/// A plaintext `llm.auth.key` is masked.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let mut config = config.clone();
    if config.llm.auth.key.is_some() {
        config.llm.auth.key = Some("********".into());
    }
    let output = toml::to_string_pretty(&config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}
