//! Maps remote-call failures onto user-facing messages.

use mc_domain::error::Error;

/// Why an exchange did not produce an accepted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No API key; detected before any call is attempted.
    MissingCredential,
    /// The remote rejected the key.
    InvalidCredential,
    /// Quota or rate limit hit.
    QuotaExceeded,
    /// The remote could not be reached.
    Network,
    /// The call succeeded but the reply was empty or filtered.
    ContentFiltered,
    Unclassified,
}

pub const MISSING_CREDENTIAL_MESSAGE: &str = "API key not configured. \
Set the GEMINI_API_KEY environment variable (or configure [llm.auth]) to enable the assistant.";

pub const INVALID_CREDENTIAL_MESSAGE: &str = "The configured API key was rejected. \
Please check your credentials and try again.";

pub const QUOTA_EXCEEDED_MESSAGE: &str = "API quota exceeded or rate limit reached. \
Please wait a moment and try again.";

pub const NETWORK_MESSAGE: &str = "Network error: unable to reach the AI service. \
Please check your connection and try again.";

pub const CONTENT_RESTRICTED_MESSAGE: &str = "I'm sorry, I can't respond to that because of \
content restrictions. Please rephrase your question.";

pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, something went wrong while processing your \
request. Please try again.";

impl FailureKind {
    /// Text of the assistant turn recorded for this failure.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            Self::InvalidCredential => INVALID_CREDENTIAL_MESSAGE,
            Self::QuotaExceeded => QUOTA_EXCEEDED_MESSAGE,
            Self::Network => NETWORK_MESSAGE,
            Self::ContentFiltered => CONTENT_RESTRICTED_MESSAGE,
            Self::Unclassified => GENERIC_FAILURE_MESSAGE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Network => "network",
            Self::ContentFiltered => "content_filtered",
            Self::Unclassified => "unclassified",
        }
    }
}

const INVALID_KEY_PATTERNS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "invalid api key",
    "permission_denied",
    "unauthenticated",
];

const QUOTA_PATTERNS: &[&str] = &[
    "quota",
    "rate limit",
    "rate-limit",
    "resource_exhausted",
    "resource has been exhausted",
    "too many requests",
];

const NETWORK_PATTERNS: &[&str] = &[
    "network",
    "failed to fetch",
    "connection",
    "timed out",
    "dns",
];

/// Classify a failed exchange.
///
/// HTTP status wins when present; otherwise the error text is matched
/// case-insensitively, and finally the variant decides (transport variants
/// are network failures).
pub fn classify_error(err: &Error) -> FailureKind {
    if let Error::Status { status, .. } = err {
        match status {
            401 | 403 => return FailureKind::InvalidCredential,
            429 => return FailureKind::QuotaExceeded,
            _ => {}
        }
    }

    let text = err.to_string().to_lowercase();
    let mentions = |patterns: &[&str]| patterns.iter().any(|p| text.contains(p));

    if mentions(INVALID_KEY_PATTERNS) {
        return FailureKind::InvalidCredential;
    }
    if mentions(QUOTA_PATTERNS) {
        return FailureKind::QuotaExceeded;
    }

    match err {
        Error::Auth(_) => FailureKind::InvalidCredential,
        Error::Http(_) | Error::Timeout(_) | Error::Io(_) => FailureKind::Network,
        _ if mentions(NETWORK_PATTERNS) => FailureKind::Network,
        _ => FailureKind::Unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: &str) -> Error {
        Error::Status {
            provider: "gemini".into(),
            status: code,
            message: message.into(),
        }
    }

    #[test]
    fn rate_limit_text_is_quota() {
        let err = Error::Other("upstream said: rate limit exceeded".into());
        assert_eq!(classify_error(&err), FailureKind::QuotaExceeded);
        assert_eq!(
            classify_error(&err).user_message(),
            QUOTA_EXCEEDED_MESSAGE
        );
    }

    #[test]
    fn status_429_is_quota() {
        assert_eq!(
            classify_error(&status(429, "slow down")),
            FailureKind::QuotaExceeded
        );
    }

    #[test]
    fn gemini_bad_key_comes_back_as_400() {
        let err = status(
            400,
            "API key not valid. Please pass a valid API key. (INVALID_ARGUMENT)",
        );
        assert_eq!(classify_error(&err), FailureKind::InvalidCredential);
    }

    #[test]
    fn forbidden_is_invalid_credential() {
        assert_eq!(
            classify_error(&status(403, "nope")),
            FailureKind::InvalidCredential
        );
    }

    #[test]
    fn transport_variants_are_network() {
        assert_eq!(
            classify_error(&Error::Timeout("operation timed out".into())),
            FailureKind::Network
        );
        assert_eq!(
            classify_error(&Error::Http("error sending request".into())),
            FailureKind::Network
        );
    }

    #[test]
    fn network_wording_in_other_errors() {
        let err = Error::Other("TypeError: Failed to fetch".into());
        assert_eq!(classify_error(&err), FailureKind::Network);
    }

    #[test]
    fn server_error_falls_back_to_generic() {
        let err = status(500, "Internal error encountered. (INTERNAL)");
        assert_eq!(classify_error(&err), FailureKind::Unclassified);
        assert_eq!(
            FailureKind::Unclassified.user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn messages_are_distinct() {
        let kinds = [
            FailureKind::MissingCredential,
            FailureKind::InvalidCredential,
            FailureKind::QuotaExceeded,
            FailureKind::Network,
            FailureKind::ContentFiltered,
            FailureKind::Unclassified,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }
}
