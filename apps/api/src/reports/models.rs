use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::analyzer::AnalysisFindings;
use crate::analysis::keywords::JobDescriptionMatch;
use crate::analysis::scoring::ScoreBreakdown;

/// Reports expire this many days after creation.
pub const RETENTION_DAYS: i64 = 60;
pub const MAX_TITLE_CHARS: usize = 255;
pub const DEFAULT_JOB_TITLE: &str = "General Application";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub match_score: u32,
    pub keyword_count: u32,
}

/// Everything the analysis produced. Stored serialized in `report_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub scores: ScoreBreakdown,
    pub findings: AnalysisFindings,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_match: Option<JobDescriptionMatch>,
}

/// A persisted analysis. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(rename = "_id")]
    pub analysis_id: Uuid,
    pub owner_id: Uuid,
    pub resume_title: String,
    pub job_title: String,
    pub analysis_date: DateTime<Utc>,
    pub summary: ReportSummary,
    /// Serialized `ReportData`.
    pub report_data: String,
    pub expires_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Builds a new report dated `now`. Titles are truncated to 255 characters.
    pub fn new(
        owner_id: Uuid,
        resume_title: &str,
        job_title: Option<&str>,
        data: &ReportData,
        now: DateTime<Utc>,
    ) -> serde_json::Result<Self> {
        let job_title = match job_title.map(str::trim) {
            Some(t) if !t.is_empty() => truncate_chars(t, MAX_TITLE_CHARS),
            _ => DEFAULT_JOB_TITLE.to_string(),
        };
        Ok(Self {
            analysis_id: Uuid::new_v4(),
            owner_id,
            resume_title: truncate_chars(resume_title.trim(), MAX_TITLE_CHARS),
            job_title,
            analysis_date: now,
            summary: ReportSummary {
                match_score: data.scores.overall_score,
                keyword_count: data.findings.matched_keywords.len() as u32,
            },
            report_data: serde_json::to_string(data)?,
            expires_at: now + Duration::days(RETENTION_DAYS),
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn data(&self) -> serde_json::Result<ReportData> {
        serde_json::from_str(&self.report_data)
    }

    pub fn listing(&self) -> ReportListing {
        ReportListing {
            analysis_id: self.analysis_id,
            resume_title: self.resume_title.clone(),
            job_title: self.job_title.clone(),
            analysis_date: self.analysis_date,
            summary: self.summary,
        }
    }
}

/// History row: a report without its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListing {
    #[serde(rename = "_id")]
    pub analysis_id: Uuid,
    pub resume_title: String,
    pub job_title: String,
    pub analysis_date: DateTime<Utc>,
    pub summary: ReportSummary,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
