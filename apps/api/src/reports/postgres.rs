use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::analysis::{AtsAnalysisRow, AtsAnalysisSummaryRow};
use crate::reports::models::{AnalysisReport, ReportListing};
use crate::reports::store::{ReportStore, StoreError};

/// `ats_analyses` table backend.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn save(&self, report: &AnalysisReport) -> Result<Uuid, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ats_analyses
                (analysis_id, owner_id, resume_title, job_title, analysis_date,
                 match_score, keyword_count, report_data, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(report.analysis_id)
        .bind(report.owner_id)
        .bind(&report.resume_title)
        .bind(&report.job_title)
        .bind(report.analysis_date)
        .bind(report.summary.match_score as i32)
        .bind(report.summary.keyword_count as i32)
        .bind(&report.report_data)
        .bind(report.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(report.analysis_id)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<AnalysisReport>, StoreError> {
        let row: Option<AtsAnalysisRow> = sqlx::query_as(
            "SELECT * FROM ats_analyses WHERE analysis_id = $1 AND owner_id = $2 AND expires_at > NOW()",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnalysisReport::try_from).transpose()
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ReportListing>, StoreError> {
        let rows: Vec<AtsAnalysisSummaryRow> = sqlx::query_as(
            r#"
            SELECT analysis_id, resume_title, job_title, analysis_date, match_score, keyword_count
            FROM ats_analyses
            WHERE owner_id = $1 AND expires_at > NOW()
            ORDER BY analysis_date DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReportListing::try_from).collect()
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM ats_analyses WHERE analysis_id = $1 AND owner_id = $2 AND expires_at > NOW()",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM ats_analyses WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        debug!(rows = result.rows_affected(), "purged expired analyses");
        Ok(result.rows_affected())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
