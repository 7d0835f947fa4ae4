//! Transport error mapping and credential resolution.

use mc_domain::config::AuthConfig;
use mc_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeouts map to [`Error::Timeout`]; connection and body failures to
/// [`Error::Http`] with a `network` prefix so they classify as transport
/// problems.  The request URL is stripped first: it carries the API key.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    let e = e.without_url();
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() || e.is_body() {
        Error::Http(format!("network error: {e}"))
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field
/// 4. Keychain headless fallback: env var `{SERVICE}_{ACCOUNT}` uppercased
/// 5. [`Error::Auth`]
///
/// Empty values count as absent, so an exported-but-blank variable still
/// disables the chat input.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(key) = auth.key.as_deref().filter(|k| !k.trim().is_empty()) {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or keychain mode instead"
        );
        return Ok(key.to_owned());
    }

    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) if !secret.trim().is_empty() => return Ok(secret),
            Ok(_) => {
                tracing::warn!(%service, %account, "keychain entry is empty");
            }
            Err(e) => {
                tracing::warn!(
                    %service,
                    %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(env_var) = &auth.env {
        return non_empty_env(env_var).ok_or_else(|| {
            Error::Auth(format!("environment variable '{env_var}' not set or empty"))
        });
    }

    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Some(val) = non_empty_env(&fallback_var) {
            tracing::info!(
                env_var = %fallback_var,
                "API key resolved from keychain headless fallback env var"
            );
            return Ok(val);
        }
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or keychain \
         'service'+'account' under [llm.auth]"
            .into(),
    ))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a secret from the OS keychain.
///
/// Fails on headless systems where no keychain daemon is available.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// Headless fallback env var name for a keychain service/account.
///
/// Example: `("medichat", "gemini-api-key")` → `"MEDICHAT_GEMINI_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_source() -> AuthConfig {
        AuthConfig {
            env: None,
            key: None,
            service: None,
            account: None,
        }
    }

    #[test]
    fn fallback_env_name() {
        assert_eq!(
            keychain_fallback_env_name("medichat", "gemini-api-key"),
            "MEDICHAT_GEMINI_API_KEY"
        );
    }

    #[test]
    fn plaintext_key_wins() {
        let auth = AuthConfig {
            key: Some("plain-123".into()),
            env: Some("MC_TEST_SHOULD_NOT_BE_READ".into()),
            ..no_source()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "plain-123");
    }

    #[test]
    fn blank_plaintext_key_is_ignored() {
        let auth = AuthConfig {
            key: Some("   ".into()),
            ..no_source()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn env_var_is_read() {
        let var = "MC_TEST_RESOLVE_ENV_KEY_4411";
        std::env::set_var(var, "env-secret");
        let auth = AuthConfig {
            env: Some(var.into()),
            ..no_source()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret");
        std::env::remove_var(var);
    }

    #[test]
    fn empty_env_var_counts_as_missing() {
        let var = "MC_TEST_RESOLVE_EMPTY_ENV_4412";
        std::env::set_var(var, "");
        let auth = AuthConfig {
            env: Some(var.into()),
            ..no_source()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains(var));
        std::env::remove_var(var);
    }

    #[test]
    fn nothing_configured() {
        let err = resolve_api_key(&no_source()).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn keychain_headless_fallback() {
        // No keychain daemon in CI, so the lookup fails and the
        // `{SERVICE}_{ACCOUNT}` variable is used.
        let var = "MEDICHAT_TEST_FALLBACK_PROVIDER";
        std::env::set_var(var, "fallback-secret");
        let auth = AuthConfig {
            service: Some("medichat".into()),
            account: Some("test-fallback-provider".into()),
            ..no_source()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "fallback-secret");
        std::env::remove_var(var);
    }
}
