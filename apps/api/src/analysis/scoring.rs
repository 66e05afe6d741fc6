use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::AnalysisFindings;

/// Sub-score weights in percent. Must sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword: u32,
    pub section: u32,
    pub format: u32,
}

impl Default for ScoringWeights {
    /// Keyword relevance is the primary ATS signal; structure and format share the rest.
    fn default() -> Self {
        Self {
            keyword: 40,
            section: 30,
            format: 30,
        }
    }
}

/// All sub-scores are reported alongside the composite so a low score can be explained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub keyword_score: u32,
    pub section_score: u32,
    pub format_score: u32,
    pub overall_score: u32,
}

/// Scores findings with the default 40/30/30 weighting.
pub fn score(findings: &AnalysisFindings) -> ScoreBreakdown {
    score_with(findings, &ScoringWeights::default())
}

pub fn score_with(findings: &AnalysisFindings, weights: &ScoringWeights) -> ScoreBreakdown {
    let keyword = findings.keyword_score.min(100);
    let section = findings.section_score.min(100);
    let format = findings.format_score.min(100);
    ScoreBreakdown {
        keyword_score: keyword,
        section_score: section,
        format_score: format,
        overall_score: compute_overall(keyword, section, format, weights),
    }
}

/// `round(0.4k + 0.3s + 0.3f)` in integer arithmetic, halves rounding up.
pub fn compute_overall(keyword: u32, section: u32, format: u32, weights: &ScoringWeights) -> u32 {
    let weighted = weights.keyword * keyword + weights.section * section + weights.format * format;
    ((weighted + 50) / 100).min(100)
}
