//! Orchestrates one upload through
//! Validator → Scanner → Extractor → Redactor → Analyzer → Scorer → Store.
//!
//! Each stage either hands its output to the next or aborts the whole run with a
//! `PipelineError`. Nothing is persisted unless every stage succeeds, and raw
//! text never leaves this function unredacted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::analyzer::analyze;
use crate::analysis::catalog::AnalysisCatalog;
use crate::analysis::keywords::match_job_description;
use crate::analysis::redact::redact;
use crate::analysis::scoring::score;
use crate::analysis::suggestions::build_suggestions;
use crate::errors::PipelineError;
use crate::extract::DocumentExtractor;
use crate::intake::scanner::MalwareScanner;
use crate::intake::validation::{
    validate_upload, DocumentKind, UploadedDocument, RESUME_UPLOAD_TYPES,
};
use crate::reports::models::{AnalysisReport, ReportData};
use crate::reports::store::{ReportStore, StoreError};

pub const DEFAULT_RESUME_TITLE: &str = "Uploaded Resume";

pub struct AnalysisRequest {
    pub owner_id: Uuid,
    pub document: UploadedDocument,
    pub resume_title: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    scanner: Arc<dyn MalwareScanner>,
    extractor: DocumentExtractor,
    catalog: Arc<AnalysisCatalog>,
    store: Arc<dyn ReportStore>,
    allowed: &'static [DocumentKind],
}

impl AnalysisPipeline {
    /// Accepts the resume upload types (pdf, doc, docx) by default.
    pub fn new(
        scanner: Arc<dyn MalwareScanner>,
        extractor: DocumentExtractor,
        catalog: Arc<AnalysisCatalog>,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            scanner,
            extractor,
            catalog,
            store,
            allowed: RESUME_UPLOAD_TYPES,
        }
    }

    pub fn with_allowed_types(mut self, allowed: &'static [DocumentKind]) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    pub async fn run_pipeline(&self, req: AnalysisRequest) -> Result<AnalysisReport, PipelineError> {
        let AnalysisRequest {
            owner_id,
            document,
            resume_title,
            job_description,
        } = req;

        // 1. Validate: metadata only, content is not inspected yet.
        let kind = validate_upload(&document, self.allowed)?;

        // 2. Scan before any parser touches the bytes. Scanner errors fail closed.
        info!(
            owner_id = %owner_id,
            scanner = self.scanner.name(),
            bytes = document.bytes.len(),
            security = true,
            "scanning upload"
        );
        let verdict = self.scanner.scan(&document.bytes).await?;
        if verdict.is_infected {
            let details = verdict
                .details
                .unwrap_or_else(|| "unknown signature".to_string());
            warn!(
                owner_id = %owner_id,
                kind = kind.label(),
                bytes = document.bytes.len(),
                details = %details,
                security = true,
                "malware detected in upload"
            );
            return Err(PipelineError::MalwareDetected(details));
        }

        // 3. Extract.
        let raw_text = self
            .extractor
            .extract(document.bytes.clone(), kind.mime())
            .await?;

        // 4. Redact resume and job description before anything else sees them.
        let resume_text = redact(Some(&raw_text));
        drop(raw_text);
        let job_text = job_description
            .as_deref()
            .map(str::trim)
            .filter(|jd| !jd.is_empty())
            .map(|jd| redact(Some(jd)));
        info!(
            owner_id = %owner_id,
            resume_chars = resume_text.chars().count(),
            job_description_chars = job_text.as_ref().map_or(0, |t| t.chars().count()),
            security = true,
            "text redacted"
        );

        // 5-6. Analyze and score.
        let findings = analyze(&resume_text, &self.catalog);
        let breakdown = score(&findings);
        let suggestions = build_suggestions(&findings, &breakdown);
        let job_match = job_text
            .as_deref()
            .map(|jd| match_job_description(&resume_text, jd));

        let data = ReportData {
            scores: breakdown,
            findings,
            suggestions,
            job_match,
        };

        // 7. Persist.
        let title = resume_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| Some(document.filename.trim()).filter(|f| !f.is_empty()))
            .unwrap_or(DEFAULT_RESUME_TITLE);
        let report = AnalysisReport::new(owner_id, title, job_text.as_deref(), &data, Utc::now())
            .map_err(|e| StoreError::Corrupt(format!("could not serialize report: {e}")))?;
        let analysis_id = self.store.save(&report).await?;

        info!(
            owner_id = %owner_id,
            analysis_id = %analysis_id,
            kind = kind.label(),
            overall_score = breakdown.overall_score,
            security = true,
            "analysis report persisted"
        );

        Ok(report)
    }
}
