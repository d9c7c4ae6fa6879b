//! Validation of untrusted strings before they reach a transport invocation
//!
//! Targets and paths end up inside a remote shell command line, so anything
//! that lets a value break out of its quoting is rejected outright. Nothing
//! is escaped or rewritten here: a value either passes unchanged or the
//! request fails.

use crate::error::ValidationError;

/// Shell metacharacters rejected in both targets and paths
const SHELL_META: &[char] = &[';', '&', '|', '`', '$', '(', ')', '<', '>', '\n', '\r', '\0'];

/// Whether `s` contains any character that can end a shell word or command
pub fn has_shell_meta(s: &str) -> bool {
    s.contains(SHELL_META)
}

/// Validate an SSH target: hostname, `user@host`, or a configured alias.
pub fn validate_target(target: &str) -> Result<&str, ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::EmptyTarget);
    }

    if has_shell_meta(target) || target.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidTarget);
    }

    Ok(target)
}

/// Validate a remote (or identity file) path.
///
/// Whitespace is allowed; escaped quotes are not.
pub fn validate_path(path: &str) -> Result<&str, ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    if has_shell_meta(path) {
        return Err(ValidationError::InvalidPath);
    }

    if path.contains("\\\"") || path.contains("\\'") {
        return Err(ValidationError::EscapedQuote);
    }

    Ok(path)
}

/// Whether `s` fully matches `[A-Za-z0-9_-]+`
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Validate a plan or session identifier; `kind` names it in the error.
pub fn validate_identifier<'a>(
    kind: &'static str,
    id: &'a str,
) -> Result<&'a str, ValidationError> {
    if is_identifier(id) {
        Ok(id)
    } else {
        Err(ValidationError::InvalidIdentifier { kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DANGEROUS: &[&str] = &[";", "&", "|", "`", "$", "(", ")", "<", ">", "\n", "\r", "\0"];

    #[test]
    fn test_target_accepts_hosts_and_aliases() {
        for target in ["localhost", "user@host", "dev-box", "me@10.0.0.5", "lab.example.com"] {
            assert_eq!(validate_target(target), Ok(target));
        }
    }

    #[test]
    fn test_target_rejects_injection() {
        for target in [
            "user@host; rm -rf /",
            "user@host`whoami`",
            "user@host$(id)",
            "user@host|cat /etc/passwd",
        ] {
            assert_eq!(validate_target(target), Err(ValidationError::InvalidTarget));
        }
    }

    #[test]
    fn test_target_rejects_every_metacharacter_and_whitespace() {
        for meta in DANGEROUS.iter().chain(&[" ", "\t"]) {
            let target = format!("user@host{}x", meta);
            assert!(validate_target(&target).is_err(), "accepted {:?}", target);
        }
    }

    #[test]
    fn test_target_empty() {
        assert_eq!(validate_target(""), Err(ValidationError::EmptyTarget));
    }

    #[test]
    fn test_path_accepts_spaces() {
        for path in [
            "/home/user/projects/plan.md",
            "/tmp/test-file_v2.md",
            "/home/user/My Documents/plan.md",
            "relative/dir",
            "~/project",
        ] {
            assert_eq!(validate_path(path), Ok(path));
        }
    }

    #[test]
    fn test_path_rejects_every_metacharacter() {
        for meta in DANGEROUS {
            let path = format!("/tmp/test{}x", meta);
            assert_eq!(validate_path(&path), Err(ValidationError::InvalidPath));
        }
    }

    #[test]
    fn test_path_rejects_injection() {
        for path in [
            "/tmp/test; rm -rf /",
            "/tmp/test`whoami`",
            "/tmp/test$(id)",
            "/tmp/test|cat /etc/passwd",
            "/tmp/test\necho pwned",
        ] {
            let err = validate_path(path).unwrap_err();
            assert!(err.to_string().to_lowercase().contains("invalid"));
        }
    }

    #[test]
    fn test_path_rejects_escaped_quotes() {
        assert_eq!(
            validate_path("/tmp/a\\\"b"),
            Err(ValidationError::EscapedQuote)
        );
        assert_eq!(validate_path("/tmp/a\\'b"), Err(ValidationError::EscapedQuote));
        // Bare quotes are fine, they cannot escape single-quoting
        assert!(validate_path("/tmp/it's").is_ok());
    }

    #[test]
    fn test_path_empty() {
        assert_eq!(validate_path(""), Err(ValidationError::EmptyPath));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("abc123"));
        assert!(is_identifier("plan_2024-01-01"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("../etc/passwd"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("plan.json"));
        assert!(!is_identifier("ü"));

        assert_eq!(validate_identifier("plan_id", "abc"), Ok("abc"));
        assert_eq!(
            validate_identifier("session_id", "x/y"),
            Err(ValidationError::InvalidIdentifier { kind: "session_id" })
        );
    }
}
