//! Shared fixtures for unit and router tests.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analysis::analyzer::{AnalysisFindings, KeywordHit};
use crate::analysis::scoring::ScoreBreakdown;
use crate::extract::FormatReader;
use crate::intake::scanner::{MalwareScanner, ScanError, ScanResult};
use crate::reports::models::{AnalysisReport, ReportData};

/// Minimal OOXML package holding only `word/document.xml`.
pub fn build_docx(document_xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// DOCX whose body is one `<w:p>` per line of `text`.
pub fn docx_from_text(text: &str) -> Vec<u8> {
    let body: String = text
        .lines()
        .map(|line| {
            let escaped = line
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!("<w:p><w:r><w:t xml:space=\"preserve\">{escaped}</w:t></w:r></w:p>")
        })
        .collect();
    build_docx(&format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    ))
}

/// A resume covering every default section, with contact details and exactly
/// six default catalog keywords (python, docker, kubernetes, teamwork,
/// leadership, communication). Between 200 and 1000 words, no pipes or tabs.
pub fn full_resume_text() -> String {
    let filler = "Delivered reliable backend services for logistics customers.\n".repeat(30);
    format!(
        "Jane Doe\n\
         Contact\n\
         Email: jane.doe@example.com\n\
         Phone: (555) 123-4567\n\n\
         Summary\n\
         Backend engineer focused on Python services, Docker images and Kubernetes clusters.\n\n\
         Experience\n\
         Senior Engineer at Acme Logistics, 2019 to 2024.\n\
         {filler}\n\
         Education\n\
         BSc Computer Science, State University.\n\n\
         Skills\n\
         Python, Docker, Kubernetes, teamwork, leadership, communication.\n"
    )
}

pub fn sample_report(owner: Uuid, analysis_date: DateTime<Utc>) -> AnalysisReport {
    let data = ReportData {
        scores: ScoreBreakdown {
            keyword_score: 20,
            section_score: 100,
            format_score: 100,
            overall_score: 68,
        },
        findings: AnalysisFindings {
            matched_keywords: vec![KeywordHit {
                keyword: "python".into(),
                category: "technical".into(),
            }],
            missing_keywords: vec![],
            found_sections: vec!["skills".into()],
            missing_sections: vec![],
            format_issues: vec![],
            word_count: 250,
            keyword_score: 20,
            section_score: 100,
            format_score: 100,
        },
        suggestions: vec![],
        job_match: None,
    };
    AnalysisReport::new(owner, "Sample CV", None, &data, analysis_date).unwrap()
}

/// Scanner that records calls and returns a fixed verdict. `Err` becomes
/// `ScanError::Unavailable`.
pub struct SpyScanner {
    verdict: Result<ScanResult, String>,
    pub calls: AtomicUsize,
}

impl SpyScanner {
    pub fn new(verdict: Result<ScanResult, String>) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn clean() -> Self {
        Self::new(Ok(ScanResult::clean()))
    }
}

#[async_trait]
impl MalwareScanner for SpyScanner {
    async fn scan(&self, _bytes: &[u8]) -> Result<ScanResult, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone().map_err(ScanError::Unavailable)
    }

    fn name(&self) -> &'static str {
        "spy"
    }
}

/// Reader that records calls and returns fixed text.
pub struct SpyReader {
    text: String,
    pub calls: AtomicUsize,
}

impl SpyReader {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FormatReader for SpyReader {
    fn read_text(&self, _bytes: &[u8]) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}
