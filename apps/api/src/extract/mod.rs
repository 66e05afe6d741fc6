//! Document Extractor: turns an uploaded binary into normalized plain text.
//!
//! Dispatch is by declared MIME type through `FormatReader` capabilities, so a
//! format backend can be swapped without touching pipeline control flow.
//! Readers run inside `tokio::task::spawn_blocking`: format decoding is CPU-bound
//! and `pdf-extract` may panic on malformed input, which surfaces as a `JoinError`
//! and is mapped like any other reader failure.

pub mod normalize;
pub mod pdf;
pub mod word;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::errors::PipelineError;
use crate::extract::normalize::normalize_text;
use crate::intake::validation::DocumentKind;

/// A format-specific text reader. Errors carry the underlying library message.
pub trait FormatReader: Send + Sync {
    fn read_text(&self, bytes: &[u8]) -> anyhow::Result<String>;
}

/// UTF-8 plain text. A leading byte-order mark is dropped.
pub struct PlainTextReader;

impl FormatReader for PlainTextReader {
    fn read_text(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| anyhow::anyhow!("plain text upload is not valid UTF-8: {e}"))?;
        Ok(text.to_string())
    }
}

#[derive(Clone)]
pub struct DocumentExtractor {
    readers: HashMap<DocumentKind, Arc<dyn FormatReader>>,
}

impl DocumentExtractor {
    /// Extractor with the standard readers for every supported format.
    pub fn standard() -> Self {
        Self::empty()
            .with_reader(DocumentKind::Pdf, Arc::new(pdf::PdfReader))
            .with_reader(DocumentKind::Docx, Arc::new(word::DocxReader))
            .with_reader(DocumentKind::Doc, Arc::new(word::DocReader))
            .with_reader(DocumentKind::PlainText, Arc::new(PlainTextReader))
    }

    pub fn empty() -> Self {
        Self {
            readers: HashMap::new(),
        }
    }

    pub fn with_reader(mut self, kind: DocumentKind, reader: Arc<dyn FormatReader>) -> Self {
        self.readers.insert(kind, reader);
        self
    }

    /// Extracts normalized, non-empty text.
    ///
    /// Unknown MIME types fail with `UnsupportedFormat`; every reader failure and
    /// an empty result fail with `ExtractionFailed`.
    pub async fn extract(&self, bytes: Bytes, mime_type: &str) -> Result<String, PipelineError> {
        let kind = DocumentKind::from_mime(mime_type)
            .ok_or_else(|| PipelineError::UnsupportedFormat(mime_type.to_string()))?;
        let reader = self
            .readers
            .get(&kind)
            .cloned()
            .ok_or_else(|| PipelineError::UnsupportedFormat(mime_type.to_string()))?;

        let raw = tokio::task::spawn_blocking(move || reader.read_text(&bytes))
            .await
            .map_err(|e| PipelineError::ExtractionFailed(format!("document reader crashed: {e}")))?
            .map_err(|e| PipelineError::ExtractionFailed(format!("{e:#}")))?;

        let text = normalize_text(&raw);
        if text.is_empty() {
            return Err(PipelineError::ExtractionFailed(
                "No readable text found in document".to_string(),
            ));
        }

        debug!(
            "Extracted {} chars from {} document",
            text.len(),
            kind.label()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl FormatReader for FailingReader {
        fn read_text(&self, _bytes: &[u8]) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("invalid cross-reference table"))
        }
    }

    struct PanickingReader;

    impl FormatReader for PanickingReader {
        fn read_text(&self, _bytes: &[u8]) -> anyhow::Result<String> {
            panic!("index out of bounds in font decoder")
        }
    }

    #[tokio::test]
    async fn test_plain_text_is_decoded() {
        let extractor = DocumentExtractor::standard();
        let text = extractor
            .extract(Bytes::from_static(b"\xEF\xBB\xBFSummary\r\nRust engineer"), "text/plain")
            .await
            .unwrap();
        assert_eq!(text, "Summary\nRust engineer");
    }

    #[tokio::test]
    async fn test_unknown_mime_is_unsupported() {
        let extractor = DocumentExtractor::standard();
        let err = extractor
            .extract(Bytes::from_static(b"GIF89a"), "image/gif")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ref m) if m == "image/gif"));
    }

    #[tokio::test]
    async fn test_whitespace_only_is_extraction_failed() {
        let extractor = DocumentExtractor::standard();
        let err = extractor
            .extract(Bytes::from_static(b"  \n\t \r\n  "), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_extraction_failed() {
        let extractor = DocumentExtractor::standard();
        let err = extractor
            .extract(Bytes::from_static(b"resume \xFF\xFE text"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(ref m) if m.contains("UTF-8")));
    }

    #[tokio::test]
    async fn test_reader_error_message_is_preserved() {
        let extractor =
            DocumentExtractor::empty().with_reader(DocumentKind::Pdf, Arc::new(FailingReader));
        let err = extractor
            .extract(Bytes::from_static(b"%PDF-1.4"), "application/pdf")
            .await
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::ExtractionFailed(ref m) if m.contains("cross-reference"))
        );
    }

    #[tokio::test]
    async fn test_reader_panic_is_contained() {
        let extractor =
            DocumentExtractor::empty().with_reader(DocumentKind::Pdf, Arc::new(PanickingReader));
        let err = extractor
            .extract(Bytes::from_static(b"%PDF-1.4"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_failed() {
        let extractor = DocumentExtractor::standard();
        let err = extractor
            .extract(Bytes::from_static(b"%PDF-1.4 truncated garbage"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }
}
