//! Malware Scanner: pluggable, trait-based content inspection of raw upload bytes.
//!
//! Runs before any format parser touches untrusted content. The pipeline treats a
//! scanner error as a hard failure, never as a clean result.
//!
//! Backends:
//! - `SignatureScanner`: built-in byte-signature engine (default).
//! - `ClamdScanner`: ClamAV daemon over TCP (`zINSTREAM`).
//!
//! `AppState` holds an `Arc<dyn MalwareScanner>`, chosen at startup via `SCANNER_BACKEND`.

use std::time::Duration;

use async_trait::async_trait;
use regex::bytes::RegexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::extract::pdf::looks_like_pdf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub is_infected: bool,
    pub details: Option<String>,
}

impl ScanResult {
    pub fn clean() -> Self {
        Self {
            is_infected: false,
            details: None,
        }
    }

    pub fn infected(details: impl Into<String>) -> Self {
        Self {
            is_infected: true,
            details: Some(details.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected scanner reply: {0}")]
    Protocol(String),

    #[error("scanner I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content scanner capability. Implement this to swap detection engines without
/// touching pipeline control flow.
#[async_trait]
pub trait MalwareScanner: Send + Sync {
    async fn scan(&self, bytes: &[u8]) -> Result<ScanResult, ScanError>;

    /// Short backend label for logs.
    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// SignatureScanner
// ────────────────────────────────────────────────────────────────────────────

const EICAR: &str = r"X5O!P%@AP\[4\\PZX54\(P\^\)7CC\)7\}\$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!\$H\+H\*";

/// (signature name, byte pattern, applies only to PDF content)
const SIGNATURES: &[(&str, &str, bool)] = &[
    ("Eicar-Test-Signature", EICAR, false),
    ("Pdf.ActiveContent.JavaScript", r"(?-u)/JavaScript\b", true),
    ("Pdf.ActiveContent.JS", r"(?-u)/JS[\s/(<\[]", true),
    ("Pdf.ActiveContent.Launch", r"(?-u)/Launch\b", true),
    ("Pdf.EmbeddedFile", r"(?-u)/EmbeddedFile\b", true),
    ("Office.Macro.VbaProject", r"(?-u)vbaProject\.bin", false),
    // OLE directory entry names are UTF-16LE.
    (
        "Office.Macro.VbaStorage",
        r"(?-u)_\x00V\x00B\x00A\x00_\x00P\x00R\x00O\x00J\x00E\x00C\x00T\x00",
        false,
    ),
];

/// Built-in byte-signature scanner. Fast, deterministic, no external service.
pub struct SignatureScanner {
    set: RegexSet,
}

impl SignatureScanner {
    pub fn new() -> Self {
        let set = RegexSet::new(SIGNATURES.iter().map(|(_, pattern, _)| *pattern))
            .expect("built-in signature patterns are valid");
        Self { set }
    }

    fn inspect(&self, bytes: &[u8]) -> ScanResult {
        let is_pdf = looks_like_pdf(bytes);
        let hits: Vec<&str> = self
            .set
            .matches(bytes)
            .into_iter()
            .filter(|&idx| is_pdf || !SIGNATURES[idx].2)
            .map(|idx| SIGNATURES[idx].0)
            .collect();

        if hits.is_empty() {
            ScanResult::clean()
        } else {
            ScanResult::infected(format!("Signatures matched: {}", hits.join(", ")))
        }
    }
}

impl Default for SignatureScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MalwareScanner for SignatureScanner {
    async fn scan(&self, bytes: &[u8]) -> Result<ScanResult, ScanError> {
        Ok(self.inspect(bytes))
    }

    fn name(&self) -> &'static str {
        "signature"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ClamdScanner
// ────────────────────────────────────────────────────────────────────────────

const CLAMD_CHUNK: usize = 64 * 1024;

/// ClamAV daemon client using the `zINSTREAM` command.
pub struct ClamdScanner {
    addr: String,
    timeout: Duration,
}

impl ClamdScanner {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    async fn stream_to_daemon(&self, bytes: &[u8]) -> Result<Vec<u8>, ScanError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| ScanError::Unavailable(format!("connect {}: {e}", self.addr)))?;

        stream.write_all(b"zINSTREAM\0").await?;
        for chunk in bytes.chunks(CLAMD_CHUNK) {
            stream.write_all(&(chunk.len() as u32).to_be_bytes()).await?;
            stream.write_all(chunk).await?;
        }
        stream.write_all(&0u32.to_be_bytes()).await?;
        stream.flush().await?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await?;
        Ok(reply)
    }
}

#[async_trait]
impl MalwareScanner for ClamdScanner {
    async fn scan(&self, bytes: &[u8]) -> Result<ScanResult, ScanError> {
        let reply = tokio::time::timeout(self.timeout, self.stream_to_daemon(bytes))
            .await
            .map_err(|_| {
                ScanError::Unavailable(format!("clamd did not answer within {:?}", self.timeout))
            })??;
        parse_clamd_reply(&reply)
    }

    fn name(&self) -> &'static str {
        "clamd"
    }
}

/// Parses a clamd INSTREAM reply: `stream: OK` or `stream: <Signature> FOUND`.
fn parse_clamd_reply(reply: &[u8]) -> Result<ScanResult, ScanError> {
    let text = String::from_utf8_lossy(reply);
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let body = text.strip_prefix("stream:").map(str::trim).unwrap_or(text);

    if body == "OK" {
        return Ok(ScanResult::clean());
    }
    if let Some(signature) = body.strip_suffix("FOUND") {
        return Ok(ScanResult::infected(format!(
            "Signature matched: {}",
            signature.trim()
        )));
    }
    Err(ScanError::Protocol(text.to_string()))
}
