//! Keyword / Section / Format Analyzer.
//!
//! A pure function of (redacted text, catalog). Three independent sub-analyses
//! run over the lower-cased text:
//! 1. Keywords: case-insensitive substring test per catalog keyword.
//!    score = 100 × matched / catalog size
//! 2. Sections: substring test per required section name.
//!    score = 100 × found / total sections
//! 3. Format: start at 100, subtract fixed penalties, floor at 0.

use serde::{Deserialize, Serialize};

use crate::analysis::catalog::AnalysisCatalog;
use crate::analysis::redact::{contains_email, contains_phone};

pub const MIN_WORDS: usize = 200;
pub const MAX_WORDS: usize = 1000;

const PENALTY_TOO_SHORT: u32 = 10;
const PENALTY_TOO_LONG: u32 = 10;
const PENALTY_PIPES: u32 = 5;
const PENALTY_TABS: u32 = 5;
const PENALTY_NO_EMAIL: u32 = 15;
const PENALTY_NO_PHONE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordHit {
    pub keyword: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFindings {
    pub matched_keywords: Vec<KeywordHit>,
    pub missing_keywords: Vec<KeywordHit>,
    pub found_sections: Vec<String>,
    pub missing_sections: Vec<String>,
    pub format_issues: Vec<String>,
    pub word_count: usize,
    pub keyword_score: u32,
    pub section_score: u32,
    pub format_score: u32,
}

/// Runs all three sub-analyses. Performs no I/O.
pub fn analyze(text: &str, catalog: &AnalysisCatalog) -> AnalysisFindings {
    let lower = text.to_lowercase();

    let (matched_keywords, missing_keywords): (Vec<KeywordHit>, Vec<KeywordHit>) = catalog
        .keywords
        .iter()
        .map(|(category, keyword)| {
            (
                lower.contains(keyword),
                KeywordHit {
                    keyword: keyword.to_string(),
                    category: category.to_string(),
                },
            )
        })
        .fold((Vec::new(), Vec::new()), |(mut hit, mut miss), (found, kw)| {
            if found {
                hit.push(kw);
            } else {
                miss.push(kw);
            }
            (hit, miss)
        });
    let keyword_score = percentage(matched_keywords.len(), catalog.keywords.total_keywords());

    let (found_sections, missing_sections): (Vec<String>, Vec<String>) = catalog
        .sections
        .sections
        .iter()
        .cloned()
        .partition(|section| lower.contains(section.as_str()));
    let section_score = percentage(found_sections.len(), catalog.sections.sections.len());

    let word_count = text.split_whitespace().count();
    let (format_score, format_issues) = assess_format(text, word_count);

    AnalysisFindings {
        matched_keywords,
        missing_keywords,
        found_sections,
        missing_sections,
        format_issues,
        word_count,
        keyword_score,
        section_score,
        format_score,
    }
}

/// Applies the formatting penalties, returning the floored score and one issue
/// string per triggered penalty.
fn assess_format(text: &str, word_count: usize) -> (u32, Vec<String>) {
    let mut penalties = Vec::new();

    if word_count < MIN_WORDS {
        penalties.push((
            PENALTY_TOO_SHORT,
            format!(
                "Resume is too short ({word_count} words). Aim for at least {MIN_WORDS} words."
            ),
        ));
    }
    if word_count > MAX_WORDS {
        penalties.push((
            PENALTY_TOO_LONG,
            format!("Resume is too long ({word_count} words). Keep it under {MAX_WORDS} words."),
        ));
    }
    if text.contains('|') {
        penalties.push((
            PENALTY_PIPES,
            "Vertical bar separators detected. Many ATS parsers misread pipe-delimited layouts."
                .to_string(),
        ));
    }
    if text.contains('\t') {
        penalties.push((
            PENALTY_TABS,
            "Tab characters detected. Use simple line breaks instead of tab-aligned columns."
                .to_string(),
        ));
    }
    if !contains_email(text) {
        penalties.push((
            PENALTY_NO_EMAIL,
            "No email address found. Include a professional email in your contact details."
                .to_string(),
        ));
    }
    if !contains_phone(text) {
        penalties.push((
            PENALTY_NO_PHONE,
            "No phone number found. Include a phone number in your contact details.".to_string(),
        ));
    }

    let total: u32 = penalties.iter().map(|(p, _)| p).sum();
    let issues = penalties.into_iter().map(|(_, issue)| issue).collect();
    (100u32.saturating_sub(total), issues)
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::catalog::KeywordCategory;

    fn small_catalog() -> AnalysisCatalog {
        AnalysisCatalog::new(
            vec![
                KeywordCategory {
                    category: "technical".into(),
                    keywords: vec!["rust".into(), "sql".into(), "docker".into(), "react".into()],
                },
                KeywordCategory {
                    category: "soft_skills".into(),
                    keywords: vec!["teamwork".into()],
                },
            ],
            vec!["experience".into(), "education".into()],
        )
        .unwrap()
    }

    fn filler(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[test]
    fn test_keyword_matching_case_insensitive() {
        let findings = analyze("Expert in RUST and Sql. Loves Teamwork.", &small_catalog());
        let matched: Vec<&str> = findings
            .matched_keywords
            .iter()
            .map(|k| k.keyword.as_str())
            .collect();
        assert_eq!(matched, vec!["rust", "sql", "teamwork"]);
        assert_eq!(findings.missing_keywords.len(), 2);
        assert_eq!(findings.keyword_score, 60);
    }

    #[test]
    fn test_missing_keywords_keep_category() {
        let findings = analyze("nothing relevant", &small_catalog());
        assert!(findings
            .missing_keywords
            .iter()
            .any(|k| k.keyword == "teamwork" && k.category == "soft_skills"));
        assert_eq!(findings.keyword_score, 0);
    }

    #[test]
    fn test_section_score() {
        let findings = analyze("EXPERIENCE\nAcme Corp", &small_catalog());
        assert_eq!(findings.found_sections, vec!["experience"]);
        assert_eq!(findings.missing_sections, vec!["education"]);
        assert_eq!(findings.section_score, 50);
    }

    #[test]
    fn test_keyword_score_monotonic() {
        let catalog = AnalysisCatalog::default();
        let base = "Summary of experience with python.";
        let before = analyze(base, &catalog).keyword_score;
        for (_, keyword) in catalog.keywords.iter() {
            let after = analyze(&format!("{base} {keyword}"), &catalog).keyword_score;
            assert!(after >= before, "adding {keyword} lowered score");
        }
    }

    #[test]
    fn test_format_perfect_score() {
        let text = format!("{} contact test@x.com phone 555-123-4567", filler(250));
        let findings = analyze(&text, &small_catalog());
        assert_eq!(findings.format_score, 100);
        assert!(findings.format_issues.is_empty());
    }

    #[test]
    fn test_format_redaction_tokens_count_as_contact() {
        let text = format!("{} [EMAIL_REDACTED] [PHONE_REDACTED]", filler(250));
        assert_eq!(analyze(&text, &small_catalog()).format_score, 100);
    }

    #[test]
    fn test_format_penalties_accumulate() {
        // short (-10), pipe (-5), tab (-5), no email (-15), no phone (-10)
        let findings = analyze("Skills | Rust\tSQL", &small_catalog());
        assert_eq!(findings.format_score, 55);
        assert_eq!(findings.format_issues.len(), 5);
    }

    #[test]
    fn test_format_too_long() {
        let text = format!("{} a@b.io 555-123-4567", filler(1001));
        let findings = analyze(&text, &small_catalog());
        assert_eq!(findings.format_score, 90);
        assert!(findings.format_issues[0].contains("too long"));
    }

    #[test]
    fn test_word_count_boundaries_not_penalized() {
        // Exactly 200 words including the contact tokens.
        let text = format!("{} a@b.io 555-123-4567", filler(198));
        let findings = analyze(&text, &small_catalog());
        assert_eq!(findings.word_count, 200);
        assert_eq!(findings.format_score, 100);
    }

    #[test]
    fn test_scores_within_bounds() {
        let findings = analyze("", &small_catalog());
        assert!(findings.format_score <= 100);
        assert_eq!(findings.keyword_score, 0);
        assert_eq!(findings.section_score, 0);
    }
}
