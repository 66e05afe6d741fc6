//! Word-format readers.
//!
//! - `DocxReader`: OOXML package, text runs of `word/document.xml` in paragraph order.
//! - `DocReader`: Word 97-2003 binary (OLE compound file), main document text decoded
//!   through the piece table. OOXML packages mislabelled as `.doc` are routed to
//!   `DocxReader`.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::extract::FormatReader;

/// Ceiling on any decompressed part or stream read from a Word upload.
pub const MAX_DOCUMENT_PART_BYTES: u64 = 16 * 1024 * 1024;

/// Reads at most `limit` bytes. Rejects a part whose declared size is over the
/// limit, and one that yields more than the limit whatever its header says.
fn read_capped<R: Read>(reader: R, declared: u64, limit: u64, what: &str) -> Result<Vec<u8>> {
    if declared > limit {
        bail!("{what} is too large ({declared} bytes, limit {limit})");
    }
    let mut buf = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut buf)
        .with_context(|| format!("could not read {what}"))?;
    if buf.len() as u64 > limit {
        bail!("{what} expands past {limit} bytes");
    }
    Ok(buf)
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

pub struct DocxReader;

impl FormatReader for DocxReader {
    fn read_text(&self, bytes: &[u8]) -> Result<String> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).context("not a valid DOCX package")?;
        let part = archive
            .by_name("word/document.xml")
            .context("DOCX package has no word/document.xml")?;
        let declared = part.size();
        let raw = read_capped(part, declared, MAX_DOCUMENT_PART_BYTES, "word/document.xml")?;
        let xml = String::from_utf8(raw).context("word/document.xml is not valid UTF-8")?;
        Ok(document_xml_to_text(&xml))
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(/?)([A-Za-z_][\w:.\-]*)[^>]*?(/?)>").expect("valid regex")
    })
}

/// Walks WordprocessingML markup, keeping only `<w:t>` content plus the breaks
/// and tabs that shape the text. Tab-stop definitions inside `<w:tabs>` are not tabs.
fn document_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut in_tab_stops = false;
    let mut last_end = 0;

    for caps in tag_re().captures_iter(xml) {
        let Some(whole) = caps.get(0) else { continue };
        if in_text {
            out.push_str(&decode_entities(&xml[last_end..whole.start()]));
        }
        last_end = whole.end();

        let closing = !caps[1].is_empty();
        let self_closing = !caps[3].is_empty();
        match (&caps[2], closing) {
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tabs", false) => in_tab_stops = !self_closing,
            ("w:tabs", true) => in_tab_stops = false,
            ("w:tab", false) if !in_tab_stops => out.push('\t'),
            ("w:br", false) | ("w:cr", false) => out.push('\n'),
            ("w:p", true) => out.push('\n'),
            ("w:p", false) if self_closing => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// DOC (Word 97-2003)
// ────────────────────────────────────────────────────────────────────────────

const WORD_IDENT: u16 = 0xA5EC;
const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_TABLE_1: u16 = 0x0200;
/// Index of the fcClx/lcbClx pair within FibRgFcLcb97.
const CLX_PAIR_INDEX: usize = 33;
const PIECE_COMPRESSED: u32 = 0x4000_0000;

pub struct DocReader;

impl FormatReader for DocReader {
    fn read_text(&self, bytes: &[u8]) -> Result<String> {
        if bytes.starts_with(b"PK\x03\x04") {
            return DocxReader.read_text(bytes);
        }

        let mut file = cfb::CompoundFile::open(Cursor::new(bytes))
            .context("not a valid Word 97-2003 document")?;
        let word_stream = read_stream(&mut file, "/WordDocument")?;
        let fib = Fib::parse(&word_stream)?;

        let table_name = if fib.table_1 { "/1Table" } else { "/0Table" };
        let table_stream = read_stream(&mut file, table_name)?;
        let clx = slice(&table_stream, fib.fc_clx as usize, fib.lcb_clx as usize)
            .context("CLX lies outside the table stream")?;

        let pieces = parse_piece_table(clx)?;
        decode_main_text(&word_stream, &pieces, fib.ccp_text as usize)
    }
}

fn read_stream<F: Read + std::io::Seek>(
    file: &mut cfb::CompoundFile<F>,
    path: &str,
) -> Result<Vec<u8>> {
    let stream = file
        .open_stream(path)
        .with_context(|| format!("document has no {path} stream"))?;
    let declared = stream.len();
    read_capped(stream, declared, MAX_DOCUMENT_PART_BYTES, path)
}

/// The File Information Block fields needed to locate the main text.
#[derive(Debug)]
struct Fib {
    table_1: bool,
    ccp_text: u32,
    fc_clx: u32,
    lcb_clx: u32,
}

impl Fib {
    fn parse(stream: &[u8]) -> Result<Self> {
        if read_u16(stream, 0)? != WORD_IDENT {
            bail!("WordDocument stream has an unknown signature");
        }
        let flags = read_u16(stream, 0x0A)?;
        if flags & FLAG_ENCRYPTED != 0 {
            bail!("encrypted Word documents are not supported");
        }

        // FibBase (32 bytes), then csw + FibRgW, cslw + FibRgLw, cbRgFcLcb + FibRgFcLcb.
        let csw = read_u16(stream, 32)? as usize;
        let rg_lw_len_at = 34 + csw * 2;
        let cslw = read_u16(stream, rg_lw_len_at)? as usize;
        let rg_lw = rg_lw_len_at + 2;
        let ccp_text = read_u32(stream, rg_lw + 12)?;
        let rg_fc_lcb = rg_lw + cslw * 4 + 2;
        let clx_at = rg_fc_lcb + CLX_PAIR_INDEX * 8;

        Ok(Self {
            table_1: flags & FLAG_TABLE_1 != 0,
            ccp_text,
            fc_clx: read_u32(stream, clx_at)?,
            lcb_clx: read_u32(stream, clx_at + 4)?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Piece {
    cp_start: u32,
    cp_end: u32,
    fc: u32,
}

/// Skips property runs (Prc) and reads the piece descriptor table (Pcdt).
fn parse_piece_table(clx: &[u8]) -> Result<Vec<Piece>> {
    let mut pos = 0;
    while clx.get(pos) == Some(&0x01) {
        let cb = read_u16(clx, pos + 1)? as usize;
        pos += 3 + cb;
    }
    if clx.get(pos) != Some(&0x02) {
        bail!("piece table not found in CLX");
    }
    let lcb = read_u32(clx, pos + 1)? as usize;
    let plc = slice(clx, pos + 5, lcb).context("piece table is truncated")?;
    if lcb < 4 || (lcb - 4) % 12 != 0 {
        bail!("piece table has an invalid length {lcb}");
    }

    let count = (lcb - 4) / 12;
    let descriptors = (count + 1) * 4;
    (0..count)
        .map(|i| {
            Ok(Piece {
                cp_start: read_u32(plc, i * 4)?,
                cp_end: read_u32(plc, (i + 1) * 4)?,
                fc: read_u32(plc, descriptors + i * 8 + 2)?,
            })
        })
        .collect()
}

fn decode_main_text(stream: &[u8], pieces: &[Piece], ccp_text: usize) -> Result<String> {
    let mut raw = String::new();
    let mut remaining = ccp_text;

    for piece in pieces {
        if remaining == 0 {
            break;
        }
        let chars = (piece.cp_end.saturating_sub(piece.cp_start) as usize).min(remaining);
        remaining -= chars;

        if piece.fc & PIECE_COMPRESSED != 0 {
            let offset = ((piece.fc & !PIECE_COMPRESSED) / 2) as usize;
            let bytes = slice(stream, offset, chars).context("text piece is truncated")?;
            raw.extend(bytes.iter().map(|&b| cp1252_char(b)));
        } else {
            let bytes = slice(stream, piece.fc as usize, chars * 2)
                .context("text piece is truncated")?;
            let units = bytes.chunks_exact(2).map(|u| u16::from_le_bytes([u[0], u[1]]));
            raw.extend(char::decode_utf16(units).map(|r| r.unwrap_or('\u{FFFD}')));
        }
    }

    Ok(strip_word_specials(&raw))
}

/// Maps Word's in-band markers: paragraph/cell ends become newlines and field
/// instructions (between 0x13 and 0x14) are dropped while field results are kept.
fn strip_word_specials(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut field_code_depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '\u{13}' => field_code_depth += 1,
            '\u{14}' => field_code_depth = field_code_depth.saturating_sub(1),
            '\u{15}' => {}
            _ if field_code_depth > 0 => {}
            '\r' | '\u{07}' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            c => out.push(c),
        }
    }
    out
}

fn cp1252_char(b: u8) -> char {
    match b {
        0x80 => '€',
        0x82 => '‚',
        0x84 => '„',
        0x85 => '…',
        0x8B => '‹',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x99 => '™',
        0x9B => '›',
        _ => b as char,
    }
}

fn slice(buf: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    buf.get(start..start.checked_add(len)?)
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16> {
    slice(buf, at, 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .with_context(|| format!("unexpected end of data at offset {at}"))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    slice(buf, at, 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .with_context(|| format!("unexpected end of data at offset {at}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_docx;
    use std::io::Write;

    /// Builds a minimal Word 97 binary: a FIB, one compressed text piece at
    /// offset 1024 of the WordDocument stream, and a CLX in the 0Table stream.
    fn build_doc(text: &str) -> Vec<u8> {
        const TEXT_AT: usize = 1024;
        let csw = 14usize;
        let cslw = 22usize;
        let cb_rg_fc_lcb = 93usize;

        let mut word = vec![0u8; TEXT_AT];
        word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
        word[32..34].copy_from_slice(&(csw as u16).to_le_bytes());
        let rg_lw_len_at = 34 + csw * 2;
        word[rg_lw_len_at..rg_lw_len_at + 2].copy_from_slice(&(cslw as u16).to_le_bytes());
        let rg_lw = rg_lw_len_at + 2;
        word[rg_lw + 12..rg_lw + 16].copy_from_slice(&(text.len() as u32).to_le_bytes());
        let rg_fc_lcb_len_at = rg_lw + cslw * 4;
        word[rg_fc_lcb_len_at..rg_fc_lcb_len_at + 2]
            .copy_from_slice(&(cb_rg_fc_lcb as u16).to_le_bytes());
        let clx_at = rg_fc_lcb_len_at + 2 + CLX_PAIR_INDEX * 8;

        let mut clx = vec![0x02u8];
        clx.extend_from_slice(&16u32.to_le_bytes());
        clx.extend_from_slice(&0u32.to_le_bytes());
        clx.extend_from_slice(&(text.len() as u32).to_le_bytes());
        clx.extend_from_slice(&[0, 0]);
        clx.extend_from_slice(&(PIECE_COMPRESSED | (TEXT_AT as u32 * 2)).to_le_bytes());
        clx.extend_from_slice(&[0, 0]);

        word[clx_at..clx_at + 4].copy_from_slice(&0u32.to_le_bytes());
        word[clx_at + 4..clx_at + 8].copy_from_slice(&(clx.len() as u32).to_le_bytes());
        word.extend_from_slice(text.as_bytes());

        let mut file = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        file.create_stream("/WordDocument")
            .unwrap()
            .write_all(&word)
            .unwrap();
        file.create_stream("/0Table").unwrap().write_all(&clx).unwrap();
        file.flush().unwrap();
        file.into_inner().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_in_order() {
        let xml = r#"<?xml version="1.0"?>
            <w:document><w:body>
              <w:p><w:r><w:t>Summary</w:t></w:r></w:p>
              <w:p><w:r><w:t xml:space="preserve">Rust &amp; Go </w:t></w:r><w:r><w:t>engineer</w:t></w:r></w:p>
            </w:body></w:document>"#;
        let text = DocxReader.read_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "Summary\nRust & Go engineer\n");
    }

    #[test]
    fn test_docx_tab_stops_are_not_tabs() {
        let xml = r#"<w:document><w:body><w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
            <w:r><w:t>Name</w:t><w:tab/><w:t>Role</w:t></w:r></w:p></w:body></w:document>"#;
        let text = DocxReader.read_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "Name\tRole\n");
    }

    #[test]
    fn test_docx_missing_document_part_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("readme.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let err = DocxReader.read_text(&bytes).unwrap_err();
        assert!(format!("{err:#}").contains("word/document.xml"));
    }

    #[test]
    fn test_docx_garbage_fails() {
        assert!(DocxReader.read_text(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_docx_oversized_document_part_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(b"<w:document><w:body><w:p><w:r><w:t>").unwrap();
        let block = vec![b'a'; 1024 * 1024];
        for _ in 0..=MAX_DOCUMENT_PART_BYTES / block.len() as u64 {
            writer.write_all(&block).unwrap();
        }
        writer.write_all(b"</w:t></w:r></w:p></w:body></w:document>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 1024 * 1024);

        let err = DocxReader.read_text(&bytes).unwrap_err();
        assert!(format!("{err:#}").contains("too large"));
    }

    #[test]
    fn test_read_capped_ignores_understated_header() {
        let err = read_capped(&[b'x'; 64][..], 8, 32, "part").unwrap_err();
        assert!(err.to_string().contains("expands past 32"));
        assert_eq!(read_capped(&[b'x'; 32][..], 32, 32, "part").unwrap().len(), 32);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; & c"), "a <b> AB & c");
    }

    #[test]
    fn test_doc_piece_table_text() {
        let bytes = build_doc("Experience\rSenior engineer\r");
        let text = DocReader.read_text(&bytes).unwrap();
        assert_eq!(text, "Experience\nSenior engineer\n");
    }

    #[test]
    fn test_doc_field_codes_dropped() {
        let bytes = build_doc("See \u{13} HYPERLINK \"x\" \u{14}portfolio\u{15} now\r");
        let text = DocReader.read_text(&bytes).unwrap();
        assert_eq!(text, "See portfolio now\n");
    }

    #[test]
    fn test_doc_mislabelled_docx_is_read() {
        let xml = "<w:document><w:body><w:p><w:r><w:t>Skills</w:t></w:r></w:p></w:body></w:document>";
        let text = DocReader.read_text(&build_docx(xml)).unwrap();
        assert_eq!(text, "Skills\n");
    }

    #[test]
    fn test_doc_garbage_fails() {
        assert!(DocReader.read_text(b"\xD0\xCF\x11\xE0 broken").is_err());
    }

    #[test]
    fn test_piece_table_skips_property_runs() {
        let mut clx = vec![0x01, 0x02, 0x00, 0xAA, 0xBB];
        clx.push(0x02);
        clx.extend_from_slice(&16u32.to_le_bytes());
        clx.extend_from_slice(&0u32.to_le_bytes());
        clx.extend_from_slice(&5u32.to_le_bytes());
        clx.extend_from_slice(&[0, 0]);
        clx.extend_from_slice(&2048u32.to_le_bytes());
        clx.extend_from_slice(&[0, 0]);
        let pieces = parse_piece_table(&clx).unwrap();
        assert_eq!(
            pieces,
            vec![Piece {
                cp_start: 0,
                cp_end: 5,
                fc: 2048
            }]
        );
    }
}
