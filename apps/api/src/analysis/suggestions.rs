use crate::analysis::analyzer::AnalysisFindings;
use crate::analysis::scoring::ScoreBreakdown;

/// Missing keywords surfaced per category.
const KEYWORDS_PER_CATEGORY: usize = 3;

/// Deterministic improvement advice. Order: sections, keywords by category,
/// format issues, then one line for the overall score band.
pub fn build_suggestions(findings: &AnalysisFindings, breakdown: &ScoreBreakdown) -> Vec<String> {
    let mut suggestions = Vec::new();

    for section in &findings.missing_sections {
        suggestions.push(format!(
            "Add a clearly labelled \"{}\" section so ATS parsers can locate it.",
            title_case(section)
        ));
    }

    // Categories in first-seen order, keywords in catalog order.
    let mut categories: Vec<(&str, Vec<&str>)> = Vec::new();
    for hit in &findings.missing_keywords {
        match categories.iter_mut().find(|(c, _)| *c == hit.category) {
            Some((_, words)) => words.push(hit.keyword.as_str()),
            None => categories.push((hit.category.as_str(), vec![hit.keyword.as_str()])),
        }
    }
    for (category, words) in categories {
        let shown: Vec<&str> = words.into_iter().take(KEYWORDS_PER_CATEGORY).collect();
        suggestions.push(format!(
            "Consider adding relevant {} keywords such as: {}.",
            category.replace('_', " "),
            shown.join(", ")
        ));
    }

    suggestions.extend(findings.format_issues.iter().cloned());

    suggestions.push(
        match breakdown.overall_score {
            80..=100 => "Strong ATS compatibility. Tailor keywords to each job description for best results.",
            60..=79 => "Good foundation. Addressing the items above should noticeably improve your match score.",
            40..=59 => "Moderate ATS compatibility. Focus on missing sections and core keywords first.",
            _ => "Low ATS compatibility. Restructure the resume with standard section headings and a simple single-column layout.",
        }
        .to_string(),
    );

    suggestions
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::KeywordHit;

    fn hit(keyword: &str, category: &str) -> KeywordHit {
        KeywordHit {
            keyword: keyword.into(),
            category: category.into(),
        }
    }

    fn findings() -> AnalysisFindings {
        AnalysisFindings {
            matched_keywords: vec![],
            missing_keywords: vec![
                hit("docker", "technical"),
                hit("leadership", "soft_skills"),
                hit("kubernetes", "technical"),
                hit("graphql", "technical"),
                hit("sql", "technical"),
            ],
            found_sections: vec!["experience".into()],
            missing_sections: vec!["education".into()],
            format_issues: vec!["Tab characters detected.".into()],
            word_count: 120,
            keyword_score: 10,
            section_score: 50,
            format_score: 85,
        }
    }

    fn breakdown(overall: u32) -> ScoreBreakdown {
        ScoreBreakdown {
            keyword_score: 0,
            section_score: 0,
            format_score: 0,
            overall_score: overall,
        }
    }

    #[test]
    fn test_suggestion_order_and_content() {
        let out = build_suggestions(&findings(), &breakdown(45));
        assert_eq!(out.len(), 5);
        assert!(out[0].contains("\"Education\""));
        assert_eq!(
            out[1],
            "Consider adding relevant technical keywords such as: docker, kubernetes, graphql."
        );
        assert!(out[2].contains("soft skills"));
        assert_eq!(out[3], "Tab characters detected.");
        assert!(out[4].starts_with("Moderate"));
    }

    #[test]
    fn test_score_bands() {
        let empty = AnalysisFindings {
            missing_keywords: vec![],
            missing_sections: vec![],
            format_issues: vec![],
            ..findings()
        };
        assert!(build_suggestions(&empty, &breakdown(100))[0].starts_with("Strong"));
        assert!(build_suggestions(&empty, &breakdown(60))[0].starts_with("Good"));
        assert!(build_suggestions(&empty, &breakdown(0))[0].starts_with("Low"));
    }

    #[test]
    fn test_deterministic() {
        let f = findings();
        assert_eq!(
            build_suggestions(&f, &breakdown(70)),
            build_suggestions(&f, &breakdown(70))
        );
    }
}
