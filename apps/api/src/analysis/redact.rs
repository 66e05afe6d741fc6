//! PII Redactor: pattern-based scrubbing of emails, phone numbers and personal
//! profile URLs.
//!
//! Applied to resume text and job descriptions before they are scored, logged or
//! stored. Rules run in order: email, phone, URL. Replacement tokens contain no
//! `@`, digits or scheme, so no later rule (and no second pass) can match them.
//! Personal names are never redacted.

use std::sync::OnceLock;

use regex::Regex;

pub const EMAIL_TOKEN: &str = "[EMAIL_REDACTED]";
pub const PHONE_TOKEN: &str = "[PHONE_REDACTED]";
pub const URL_TOKEN: &str = "[URL_REDACTED]";

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b";

/// Optional country code, optional parenthesized area code, `-` `.` or space
/// separators. The leading group requires a non-word character (or start of
/// text) so digits glued to a word are left alone.
const PHONE_PATTERN: &str =
    r"(^|[^\w])((?:\+\d{1,3}[\-. ]?)?\(?\d{3}\)?[\-. ]?\d{3}[\-. ]?\d{4})\b";

/// Hosts whose URLs point at a person rather than an organisation.
const PROFILE_HOSTS: &[&str] = &[
    "linkedin.com",
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "behance.net",
    "dribbble.com",
    "medium.com",
    "stackoverflow.com",
    "about.me",
    "github.io",
    "portfolio-site.com",
    "personal-blog.com",
];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("valid regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("valid regex"))
}

fn profile_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let hosts: Vec<String> = PROFILE_HOSTS.iter().map(|h| regex::escape(h)).collect();
        let pattern = format!(
            r"(?i)(^|[^\w])(https?://(?:[a-z0-9\-]+\.)*(?:{})(?:[/?#:]\S*|\b))",
            hosts.join("|")
        );
        Regex::new(&pattern).expect("valid regex")
    })
}

/// Redacts PII from optional text. `None` and empty input yield an empty string.
pub fn redact(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.is_empty() => redact_text(t),
        _ => String::new(),
    }
}

pub fn redact_text(text: &str) -> String {
    let without_email = email_re().replace_all(text, EMAIL_TOKEN);
    let without_phone = phone_re().replace_all(&without_email, format!("${{1}}{PHONE_TOKEN}"));
    profile_url_re()
        .replace_all(&without_phone, format!("${{1}}{URL_TOKEN}"))
        .into_owned()
}

/// True if the text carries an email address or an email redaction token.
pub fn contains_email(text: &str) -> bool {
    text.contains(EMAIL_TOKEN) || email_re().is_match(text)
}

/// True if the text carries a phone number or a phone redaction token.
pub fn contains_phone(text: &str) -> bool {
    text.contains(PHONE_TOKEN) || phone_re().is_match(text)
}
