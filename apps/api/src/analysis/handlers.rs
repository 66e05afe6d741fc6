use axum::{
    async_trait,
    extract::{
        multipart::MultipartError, rejection::JsonRejection, FromRequestParts, Multipart, Path,
        State,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
use crate::analysis::pipeline::AnalysisRequest;
use crate::errors::{AppError, FieldError};
use crate::intake::validation::{UploadedDocument, MAX_UPLOAD_BYTES};
use crate::reports::models::{AnalysisReport, ReportListing, ReportSummary, MAX_TITLE_CHARS};
use crate::state::AppState;

/// Header carrying the authenticated caller's id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

const FILE_FIELDS: &[&str] = &["resumeFile", "file", "resume"];
const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
const MIN_KEYWORD_TEXT_CHARS: usize = 20;
const MAX_KEYWORD_TEXT_CHARS: usize = 10_000;

/// Authenticated caller. Missing or malformed identity is a 401.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(CallerId)
            .ok_or(AppError::Unauthorized)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub message: String,
    pub analysis_id: Uuid,
    pub summary: ReportSummary,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub history: Vec<ReportListing>,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub analysis: AnalysisReport,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct KeywordsRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct KeywordsResponse {
    pub success: bool,
    pub message: String,
    pub keywords: Vec<String>,
}

#[derive(Default)]
struct AnalyzeForm {
    document: Option<UploadedDocument>,
    resume_title: Option<String>,
    job_description: Option<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InvalidUpload(format!(
            "File too large. Maximum size is {} MB.",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ))
    } else {
        AppError::InvalidUpload(err.body_text())
    }
}

async fn read_analyze_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if FILE_FIELDS.contains(&name.as_str()) {
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            form.document = Some(UploadedDocument::new(bytes, mime, filename));
        } else if name == "resumeTitle" {
            form.resume_title = Some(field.text().await.map_err(multipart_error)?);
        } else if name == "jobDescription" {
            form.job_description = Some(field.text().await.map_err(multipart_error)?);
        }
    }
    Ok(form)
}

fn validate_form(form: &AnalyzeForm) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if let Some(title) = &form.resume_title {
        if title.trim().chars().count() > MAX_TITLE_CHARS {
            errors.push(FieldError::new(
                "resumeTitle",
                format!("must be at most {MAX_TITLE_CHARS} characters"),
            ));
        }
    }
    if let Some(jd) = &form.job_description {
        let len = jd.trim().chars().count();
        if len > 0 && len < MIN_JOB_DESCRIPTION_CHARS {
            errors.push(FieldError::new(
                "jobDescription",
                format!("must be at least {MIN_JOB_DESCRIPTION_CHARS} characters"),
            ));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation("Invalid request data.", errors))
    }
}

fn parse_analysis_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::validation(
            "Invalid analysis ID format.",
            vec![FieldError::new("analysisId", "must be a UUID")],
        )
    })
}

/// POST /api/ats/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    CallerId(owner_id): CallerId,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalyzeResponse>), AppError> {
    let mut form = read_analyze_form(multipart).await?;
    let document = form.document.take().ok_or_else(|| {
        warn!(owner_id = %owner_id, "analysis requested without a resume file");
        AppError::InvalidUpload("No resume file uploaded or invalid file type.".to_string())
    })?;
    validate_form(&form)?;

    info!(
        owner_id = %owner_id,
        has_job_description = form.job_description.as_deref().is_some_and(|jd| !jd.trim().is_empty()),
        "starting ATS analysis"
    );

    let report = state
        .pipeline
        .run_pipeline(AnalysisRequest {
            owner_id,
            document,
            resume_title: form.resume_title,
            job_description: form.job_description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            success: true,
            message: "Resume analyzed successfully.".to_string(),
            analysis_id: report.analysis_id,
            summary: report.summary,
        }),
    ))
}

/// GET /api/ats/history
pub async fn handle_history(
    State(state): State<AppState>,
    CallerId(owner_id): CallerId,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = state.store.list_for_owner(owner_id).await?;
    Ok(Json(HistoryResponse {
        success: true,
        count: history.len(),
        history,
    }))
}

/// GET /api/ats/analysis/:analysisId
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    CallerId(owner_id): CallerId,
    Path(raw_id): Path<String>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let id = parse_analysis_id(&raw_id)?;
    let analysis = state
        .store
        .find_by_id(id, owner_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundOrNotOwned(
                "ATS analysis report not found or not authorized.".to_string(),
            )
        })?;

    Ok(Json(AnalysisResponse {
        success: true,
        message: "ATS analysis report retrieved successfully.".to_string(),
        analysis,
    }))
}

/// DELETE /api/ats/analysis/:analysisId
pub async fn handle_delete_analysis(
    State(state): State<AppState>,
    CallerId(owner_id): CallerId,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_analysis_id(&raw_id)?;
    if !state.store.delete(id, owner_id).await? {
        return Err(AppError::NotFoundOrNotOwned(
            "ATS analysis report not found or not authorized for deletion.".to_string(),
        ));
    }

    info!(owner_id = %owner_id, analysis_id = %id, security = true, "analysis report deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "ATS analysis report deleted successfully.".to_string(),
    }))
}

/// POST /api/ats/keywords
/// Stateless: the text is redacted, tokenised and dropped.
pub async fn handle_keywords(
    CallerId(owner_id): CallerId,
    body: Result<Json<KeywordsRequest>, JsonRejection>,
) -> Result<Json<KeywordsResponse>, AppError> {
    let Json(req) = body.map_err(|e| {
        AppError::validation(
            "Invalid input text for keyword extraction.",
            vec![FieldError::new("text", e.body_text())],
        )
    })?;

    let text = req.text.trim();
    let len = text.chars().count();
    if !(MIN_KEYWORD_TEXT_CHARS..=MAX_KEYWORD_TEXT_CHARS).contains(&len) {
        return Err(AppError::validation(
            "Invalid input text for keyword extraction.",
            vec![FieldError::new(
                "text",
                format!(
                    "must be between {MIN_KEYWORD_TEXT_CHARS} and {MAX_KEYWORD_TEXT_CHARS} characters"
                ),
            )],
        ));
    }

    info!(owner_id = %owner_id, text_chars = len, security = true, "extracting keywords from redacted text");
    let keywords = extract_keywords(text, DEFAULT_KEYWORD_LIMIT);

    Ok(Json(KeywordsResponse {
        success: true,
        message: "Keywords extracted successfully.".to_string(),
        keywords,
    }))
}
