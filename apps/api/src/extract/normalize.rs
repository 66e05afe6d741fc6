use std::sync::OnceLock;

use regex::Regex;

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("valid regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Normalizes extractor output into the shape every format must produce.
///
/// Line breaks (`\r\n`, `\r`, form feed, vertical tab) become `\n`. Tabs are kept
/// because the format heuristics read them as layout signals. Every other control
/// character, the BOM and U+FFFD are dropped. Space runs collapse, trailing spaces
/// are trimmed per line, and more than one blank line collapses to one.
pub fn normalize_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                cleaned.push('\n');
            }
            '\n' | '\u{000B}' | '\u{000C}' | '\u{2028}' | '\u{2029}' => cleaned.push('\n'),
            '\t' => cleaned.push('\t'),
            '\u{00A0}' => cleaned.push(' '),
            '\u{FEFF}' | '\u{FFFD}' => {}
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }

    let collapsed = spaces_re().replace_all(&cleaned, " ");
    let trimmed_lines: Vec<&str> = collapsed.lines().map(|l| l.trim_end_matches(' ')).collect();
    let joined = trimmed_lines.join("\n");
    blank_lines_re()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
