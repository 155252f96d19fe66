//! Credential scrubbing for messages shown to the operator.
//!
//! Error chains can carry text from the SSH library, the YAML parser, or the
//! server itself. Everything printed on failure goes through here first.

use lazy_static::lazy_static;
use regex::Regex;

const REDACTED: &str = "<REDACTED>";

lazy_static! {
    /// Patterns for credentials that show up in connection and config errors
    static ref CREDENTIAL_PATTERNS: Vec<(Regex, &'static str)> = vec![
        // password: x, password=x, passwd=x, pwd=x
        (Regex::new(r"(?i)(password|passwd|pwd)\s*[:=]\s*([^\s]+)").unwrap(),
         "$1=<REDACTED_PASSWORD>"),

        // user:pass@ in sftp://, ssh://, scp:// URLs
        (Regex::new(r"(?i)((?:sftp|ssh|scp)://)([^:/@\s]+):([^@\s]+)@").unwrap(),
         "$1$2:<REDACTED_PASS>@"),

        // Basic auth in http URLs
        (Regex::new(r"(https?://)([^:/@\s]+):([^@\s]+)@").unwrap(),
         "$1$2:<REDACTED_PASS>@"),
    ];
}

/// Replace credential-looking substrings with placeholders.
///
/// # Example
///
/// ```
/// use sftp_backup::security::credential_scrubber::scrub_credentials;
///
/// let scrubbed = scrub_credentials("login failed with password=hunter2");
/// assert_eq!(scrubbed, "login failed with password=<REDACTED_PASSWORD>");
/// ```
pub fn scrub_credentials(input: &str) -> String {
    let mut result = input.to_string();

    for (pattern, replacement) in CREDENTIAL_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// Remove every literal occurrence of `secret`, then apply
/// [`scrub_credentials`].
///
/// Used with the configured SFTP password, which may appear verbatim in a
/// message that no pattern would recognise.
pub fn scrub_secret(input: &str, secret: &str) -> String {
    if secret.is_empty() {
        return scrub_credentials(input);
    }
    scrub_credentials(&input.replace(secret, REDACTED))
}

/// Format `context: error` with credentials scrubbed.
pub fn safe_error_message(context: &str, error: &impl std::fmt::Display) -> String {
    let raw_message = format!("{}: {}", context, error);
    scrub_credentials(&raw_message)
}
