use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::reports::models::{AnalysisReport, ReportListing, ReportSummary};
use crate::reports::store::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct AtsAnalysisRow {
    pub analysis_id: Uuid,
    pub owner_id: Uuid,
    pub resume_title: String,
    pub job_title: String,
    pub analysis_date: DateTime<Utc>,
    pub match_score: i32,
    pub keyword_count: i32,
    pub report_data: String,
    pub expires_at: DateTime<Utc>,
}

/// History projection of `ats_analyses`; `report_data` is never selected.
#[derive(Debug, Clone, FromRow)]
pub struct AtsAnalysisSummaryRow {
    pub analysis_id: Uuid,
    pub resume_title: String,
    pub job_title: String,
    pub analysis_date: DateTime<Utc>,
    pub match_score: i32,
    pub keyword_count: i32,
}

fn summary(match_score: i32, keyword_count: i32) -> Result<ReportSummary, StoreError> {
    Ok(ReportSummary {
        match_score: u32::try_from(match_score)
            .map_err(|_| StoreError::Corrupt(format!("negative match_score {match_score}")))?,
        keyword_count: u32::try_from(keyword_count)
            .map_err(|_| StoreError::Corrupt(format!("negative keyword_count {keyword_count}")))?,
    })
}

impl TryFrom<AtsAnalysisRow> for AnalysisReport {
    type Error = StoreError;

    fn try_from(row: AtsAnalysisRow) -> Result<Self, Self::Error> {
        Ok(AnalysisReport {
            analysis_id: row.analysis_id,
            owner_id: row.owner_id,
            resume_title: row.resume_title,
            job_title: row.job_title,
            analysis_date: row.analysis_date,
            summary: summary(row.match_score, row.keyword_count)?,
            report_data: row.report_data,
            expires_at: row.expires_at,
        })
    }
}

impl TryFrom<AtsAnalysisSummaryRow> for ReportListing {
    type Error = StoreError;

    fn try_from(row: AtsAnalysisSummaryRow) -> Result<Self, Self::Error> {
        Ok(ReportListing {
            analysis_id: row.analysis_id,
            resume_title: row.resume_title,
            job_title: row.job_title,
            analysis_date: row.analysis_date,
            summary: summary(row.match_score, row.keyword_count)?,
        })
    }
}
