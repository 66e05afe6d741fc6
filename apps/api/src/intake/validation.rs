use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Upload ceiling: 5 MiB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Allow-list for the resume upload endpoint.
pub const RESUME_UPLOAD_TYPES: &[DocumentKind] =
    &[DocumentKind::Pdf, DocumentKind::Doc, DocumentKind::Docx];

/// Allow-list for callers that also accept plain-text resumes.
pub const ALL_DOCUMENT_TYPES: &[DocumentKind] = &[
    DocumentKind::Pdf,
    DocumentKind::Doc,
    DocumentKind::Docx,
    DocumentKind::PlainText,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Doc,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Resolves a declared MIME type. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            MIME_PDF => Some(DocumentKind::Pdf),
            MIME_DOC => Some(DocumentKind::Doc),
            MIME_DOCX => Some(DocumentKind::Docx),
            MIME_TEXT => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => MIME_PDF,
            DocumentKind::Doc => MIME_DOC,
            DocumentKind::Docx => MIME_DOCX,
            DocumentKind::PlainText => MIME_TEXT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Doc => "DOC",
            DocumentKind::Docx => "DOCX",
            DocumentKind::PlainText => "TXT",
        }
    }
}

/// A candidate upload. Lives for one pipeline run; the raw bytes are never persisted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Bytes,
    pub mime_type: String,
    pub filename: String,
}

impl UploadedDocument {
    pub fn new(bytes: Bytes, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }
}

/// Checks the declared type and buffered size against the allow-list without
/// reading content.
pub fn validate_upload(
    doc: &UploadedDocument,
    allowed: &[DocumentKind],
) -> Result<DocumentKind, PipelineError> {
    let size = doc.bytes.len();
    if size > MAX_UPLOAD_BYTES {
        return Err(PipelineError::InvalidUpload(format!(
            "File size too large. Maximum {}MB allowed.",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let kind = DocumentKind::from_mime(&doc.mime_type)
        .filter(|k| allowed.contains(k))
        .ok_or_else(|| {
            let labels: Vec<&str> = allowed.iter().map(|k| k.label()).collect();
            PipelineError::InvalidUpload(format!(
                "Invalid file type '{}'. Only {} files are allowed.",
                doc.mime_type,
                labels.join(", ")
            ))
        })?;

    if size == 0 {
        return Err(PipelineError::InvalidUpload(
            "Uploaded file is empty.".to_string(),
        ));
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(len: usize, mime: &str) -> UploadedDocument {
        UploadedDocument::new(Bytes::from(vec![b'a'; len]), mime, "resume")
    }

    #[test]
    fn test_accepts_pdf_under_limit() {
        let kind = validate_upload(&doc(1024, MIME_PDF), RESUME_UPLOAD_TYPES).unwrap();
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn test_accepts_exactly_five_mib() {
        assert!(validate_upload(&doc(MAX_UPLOAD_BYTES, MIME_DOCX), RESUME_UPLOAD_TYPES).is_ok());
    }

    #[test]
    fn test_rejects_oversize() {
        let err = validate_upload(&doc(MAX_UPLOAD_BYTES + 1, MIME_PDF), RESUME_UPLOAD_TYPES)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUpload(ref m) if m.contains("too large")));
    }

    #[test]
    fn test_rejects_image_type() {
        let err = validate_upload(&doc(10, "image/png"), RESUME_UPLOAD_TYPES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUpload(ref m) if m.contains("image/png")));
    }

    #[test]
    fn test_plain_text_depends_on_allow_list() {
        assert!(validate_upload(&doc(10, MIME_TEXT), RESUME_UPLOAD_TYPES).is_err());
        assert_eq!(
            validate_upload(&doc(10, MIME_TEXT), ALL_DOCUMENT_TYPES).unwrap(),
            DocumentKind::PlainText
        );
    }

    #[test]
    fn test_mime_parameters_and_case_ignored() {
        assert_eq!(
            DocumentKind::from_mime("Text/Plain; charset=utf-8"),
            Some(DocumentKind::PlainText)
        );
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = validate_upload(&doc(0, MIME_PDF), RESUME_UPLOAD_TYPES).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUpload(ref m) if m.contains("empty")));
    }
}
