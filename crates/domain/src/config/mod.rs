mod chat;
mod llm;

pub use chat::*;
pub use llm::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a config validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.  Credential
    /// presence is not checked here; that needs the environment and the
    /// OS keychain, so callers resolve it separately.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.llm.base_url.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        if self.llm.model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.model".into(),
                message: "model must not be empty".into(),
            });
        }

        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.timeout_ms".into(),
                message: "timeout must be greater than 0".into(),
            });
        }

        if let Some(temp) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temp) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "llm.temperature".into(),
                    message: format!("temperature {temp} is outside 0.0..=2.0"),
                });
            }
        }

        if self.llm.safety.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.safety".into(),
                message: "no safety settings configured; provider defaults apply".into(),
            });
        }

        if !self.llm.auth.has_source() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.auth".into(),
                message: "no credential source configured; chat input will be disabled".into(),
            });
        }

        if self.chat.system_preamble.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "chat.system_preamble".into(),
                message: "empty system preamble; replies will not be scoped".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_errors() {
        let issues = Config::default().validate();
        assert!(
            issues.iter().all(|i| i.severity != ConfigSeverity::Error),
            "unexpected errors: {issues:?}"
        );
    }

    #[test]
    fn empty_model_is_an_error() {
        let mut config = Config::default();
        config.llm.model = "  ".into();
        let issues = config.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "llm.model" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn out_of_range_temperature_is_an_error() {
        let mut config = Config::default();
        config.llm.temperature = Some(3.5);
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.field == "llm.temperature"));
    }

    #[test]
    fn missing_auth_source_is_a_warning() {
        let mut config = Config::default();
        config.llm.auth = AuthConfig {
            env: None,
            ..Default::default()
        };
        let issues = config.validate();
        let issue = issues.iter().find(|i| i.field == "llm.auth").unwrap();
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn issue_display_includes_tag_and_field() {
        let issue = ConfigError {
            severity: ConfigSeverity::Error,
            field: "llm.base_url".into(),
            message: "base_url must not be empty".into(),
        };
        assert_eq!(
            issue.to_string(),
            "[ERROR] llm.base_url: base_url must not be empty"
        );
    }
}
