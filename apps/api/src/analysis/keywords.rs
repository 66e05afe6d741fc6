//! Stateless candidate-keyword extraction for free text (job descriptions,
//! resume snippets). Lexical only: tokenise, drop stop words, de-duplicate.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::redact::redact_text;

pub const DEFAULT_KEYWORD_LIMIT: usize = 20;
/// Words of this length or shorter are never keywords.
const MIN_KEYWORD_CHARS: usize = 2;

/// Redaction tokens after punctuation stripping.
const REDACTION_WORDS: &[&str] = &["email_redacted", "phone_redacted", "url_redacted"];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "to", "of", "in", "on",
    "for", "with", "as", "at", "by", "from", "this", "that", "these", "those", "it", "its", "you",
    "your", "he", "she", "his", "her", "we", "our", "they", "their", "be", "been", "being", "have",
    "has", "had", "do", "does", "did", "not", "no", "yes", "can", "will", "would", "should",
    "could", "get", "got", "make", "made", "like", "just", "also", "about", "some", "any", "all",
    "out", "up", "down", "then", "than", "more", "most", "such", "very", "only", "even", "into",
    "over", "under", "through", "after", "before", "where", "when", "why", "how", "who", "what",
    "which", "whom", "upon", "among", "across", "behind", "below", "beside", "between", "beyond",
    "during", "except", "inside", "near", "off", "onto", "outside", "past", "round", "since",
    "until", "within", "without", "via", "vs",
];

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s\-]").expect("valid regex"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Extracts up to `limit` unique candidate keywords in first-seen order.
/// PII is redacted before tokenising, and redaction tokens are never returned.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let redacted = redact_text(text).to_lowercase();
    let cleaned = punctuation_re().replace_all(&redacted, " ");

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS)
        .filter(|w| !stop_words().contains(w) && !REDACTION_WORDS.contains(w))
        .filter(|w| seen.insert(*w))
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// How a resume covers the candidate keywords of a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptionMatch {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub match_rate: u32,
}

/// Compares job-description keywords against resume text. Both inputs are
/// expected to be redacted already.
pub fn match_job_description(resume_text: &str, job_description: &str) -> JobDescriptionMatch {
    let resume_lower = resume_text.to_lowercase();
    let (matched_keywords, missing_keywords): (Vec<String>, Vec<String>) =
        extract_keywords(job_description, DEFAULT_KEYWORD_LIMIT)
            .into_iter()
            .partition(|kw| resume_lower.contains(kw.as_str()));

    let total = matched_keywords.len() + missing_keywords.len();
    let match_rate = if total == 0 {
        0
    } else {
        ((matched_keywords.len() as f64 / total as f64) * 100.0).round() as u32
    };

    JobDescriptionMatch {
        matched_keywords,
        missing_keywords,
        match_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_and_short_words_dropped() {
        let kws = extract_keywords("We are looking for an engineer with Rust and Go", 20);
        assert_eq!(kws, vec!["looking", "engineer", "rust"]);
    }

    #[test]
    fn test_unique_in_first_seen_order() {
        let kws = extract_keywords("Kubernetes, Docker; kubernetes! DOCKER terraform", 20);
        assert_eq!(kws, vec!["kubernetes", "docker", "terraform"]);
    }

    #[test]
    fn test_hyphens_kept() {
        let kws = extract_keywords("problem-solving and cross-functional work", 20);
        assert_eq!(kws, vec!["problem-solving", "cross-functional", "work"]);
    }

    #[test]
    fn test_limit_applied() {
        let text: Vec<String> = (0..50).map(|i| format!("keyword{i}")).collect();
        assert_eq!(extract_keywords(&text.join(" "), 20).len(), 20);
    }

    #[test]
    fn test_pii_never_returned() {
        let kws = extract_keywords(
            "Send resumes to recruiter@acme.com or call 555-123-4567 about backend roles",
            20,
        );
        assert!(kws.iter().all(|k| !k.contains("acme") && !k.contains("555")));
        assert!(kws.iter().all(|k| !k.contains("redacted")));
        assert!(kws.contains(&"backend".to_string()));
    }

    #[test]
    fn test_job_description_match() {
        let result = match_job_description(
            "Built services in Rust and PostgreSQL",
            "Seeking Rust developer experienced with PostgreSQL and Kafka",
        );
        assert_eq!(result.matched_keywords, vec!["rust", "postgresql"]);
        assert!(result.missing_keywords.contains(&"kafka".to_string()));
        assert_eq!(result.match_rate, 33);
    }

    #[test]
    fn test_job_description_match_empty() {
        let result = match_job_description("anything", "");
        assert_eq!(result.match_rate, 0);
        assert!(result.matched_keywords.is_empty());
    }
}
