use crate::extract::FormatReader;

/// Readers tolerate junk before the header, up to this many bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// True when `%PDF` appears within the header window. Shared by `PdfReader` and
/// the signature scanner.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

/// PDF text-layer reader backed by `pdf-extract`. Pages come out in document order.
pub struct PdfReader;

impl FormatReader for PdfReader {
    fn read_text(&self, bytes: &[u8]) -> anyhow::Result<String> {
        if !looks_like_pdf(bytes) {
            anyhow::bail!("missing %PDF header");
        }
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow::anyhow!("PDF parse error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = PdfReader.read_text(b"PK\x03\x04 not a pdf").unwrap_err();
        assert!(err.to_string().contains("%PDF"));
    }

    #[test]
    fn test_looks_like_pdf_window() {
        assert!(looks_like_pdf(b"%PDF-1.7"));
        assert!(looks_like_pdf(b"\r\n\x00junk%PDF-1.4"));
        assert!(!looks_like_pdf(b"PK\x03\x04"));

        let mut late = vec![b' '; HEADER_SEARCH_WINDOW];
        late.extend_from_slice(b"%PDF-1.4");
        assert!(!looks_like_pdf(&late));
    }
}
