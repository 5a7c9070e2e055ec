//! Classification of fatal upstream failures by error-message content.
//!
//! The Graph API reports credential and permission problems inside the
//! error body rather than through distinct statuses, so the backfill
//! inspects the rendered message. Only two conditions abort a backfill:
//! an expired/invalid access token (error code 190) and an ad account
//! that never granted `ads_read`/`ads_management` (error code 200).

use std::sync::OnceLock;

use regex::Regex;

/// The two upstream conditions that retrying cannot fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    AccessTokenExpired,
    AdAccountPermission,
}

fn token_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""code"\s*:\s*190\b"#).expect("valid regex"))
}

fn permission_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""code"\s*:\s*200\b"#).expect("valid regex"))
}

/// Returns the fatal kind an upstream error message indicates, if any.
#[must_use]
pub fn classify_fatal(message: &str) -> Option<FatalKind> {
    if message.contains("Session has expired")
        || message.contains("Error validating access token")
        || token_code_pattern().is_match(message)
    {
        return Some(FatalKind::AccessTokenExpired);
    }
    if message.contains("has NOT grant ads_management or ads_read")
        || permission_code_pattern().is_match(message)
    {
        return Some(FatalKind::AdAccountPermission);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_message_is_token_fatal() {
        assert_eq!(
            classify_fatal("Meta API error: status 400: Session has expired on Tuesday"),
            Some(FatalKind::AccessTokenExpired)
        );
    }

    #[test]
    fn token_validation_message_is_token_fatal() {
        assert_eq!(
            classify_fatal("Error validating access token: the user has changed their password"),
            Some(FatalKind::AccessTokenExpired)
        );
    }

    #[test]
    fn code_190_json_is_token_fatal() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","code":190}}"#;
        assert_eq!(classify_fatal(body), Some(FatalKind::AccessTokenExpired));
    }

    #[test]
    fn code_190_with_whitespace_is_token_fatal() {
        assert_eq!(
            classify_fatal(r#"{"error": {"code" : 190}}"#),
            Some(FatalKind::AccessTokenExpired)
        );
    }

    #[test]
    fn missing_grant_message_is_permission_fatal() {
        let body = "The ad account owner has NOT grant ads_management or ads_read permission";
        assert_eq!(classify_fatal(body), Some(FatalKind::AdAccountPermission));
    }

    #[test]
    fn code_200_json_is_permission_fatal() {
        let body = r#"{"error":{"message":"Requires ads_read","code":200}}"#;
        assert_eq!(classify_fatal(body), Some(FatalKind::AdAccountPermission));
    }

    #[test]
    fn transient_errors_are_not_fatal() {
        assert_eq!(classify_fatal("Meta API error: status 503: unavailable"), None);
        assert_eq!(classify_fatal("connection reset by peer"), None);
        assert_eq!(
            classify_fatal(r#"{"error":{"message":"rate limited","code":17}}"#),
            None
        );
    }

    #[test]
    fn code_1900_is_not_misread_as_190() {
        assert_eq!(classify_fatal(r#"{"error":{"code":1900}}"#), None);
    }
}
