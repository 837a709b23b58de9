//! String repair: multiline joining, embedded unescaped quotes, and
//! backslash fixing for path-like content.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::PreprocessingConfig;

pub(crate) fn repair(text: String, config: &PreprocessingConfig) -> String {
    let mut result = fix_multiline_strings(&text);
    result = fix_unescaped_quotes(&result);
    if config.fix_unescaped_strings {
        result = fix_backslashes(&result);
    }
    result
}

/// Join lines while a string stays open: a line with an odd number of
/// unescaped quotes absorbs following lines (as literal `\n`) until parity
/// is restored.
fn fix_multiline_strings(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        if unescaped_quote_count(line) % 2 == 1 && i + 1 < lines.len() {
            let mut combined = line.to_string();
            let mut j = i + 1;
            let mut closed = false;
            while j < lines.len() {
                combined.push_str("\\n");
                combined.push_str(lines[j].trim());
                if unescaped_quote_count(lines[j]) % 2 == 1 {
                    closed = true;
                    j += 1;
                    break;
                }
                j += 1;
            }
            if closed {
                out.push(combined);
                i = j;
                continue;
            }
            // never re-closed: close the string at end of the first line
            out.push(format!("{}\"", line));
            i += 1;
            continue;
        }
        out.push(line.to_string());
        i += 1;
    }
    out.join("\n")
}

fn unescaped_quote_count(line: &str) -> usize {
    let mut count = 0usize;
    let mut escaped = false;
    for ch in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            count += 1;
        }
    }
    count
}

/// Escape stray `"` characters inside string values. A quote terminates the
/// string only when what follows (after whitespace) is `:`, `,`, `}`, `]`,
/// end of input, or a comment start; any other embedded quote gets escaped.
fn fix_unescaped_quotes(text: &str) -> String {
    if should_skip_quote_fixing(text) {
        return text.to_string();
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 4);
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            out.push('"');
            let (content, next) = rescan_string_content(text, i + 1);
            out.push_str(&content);
            out.push('"');
            i = next;
        } else {
            let ch = text[i..].chars().next().unwrap_or('\0');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

/// Conditions under which quote repair is more likely to harm than help.
fn should_skip_quote_fixing(text: &str) -> bool {
    if text.len() > 50_000 || text.contains("://") || text.contains("\\\"") {
        return true;
    }
    let open_braces = text.matches('{').count() as i64 - text.matches('}').count() as i64;
    let open_brackets = text.matches('[').count() as i64 - text.matches(']').count() as i64;
    open_braces > 0 || open_brackets > 0 || text.contains("}{")
}

/// Scan string content from `from`, escaping quotes that do not terminate.
/// Returns the rebuilt content and the index just past the real close quote.
fn rescan_string_content(text: &str, from: usize) -> (String, usize) {
    let bytes = text.as_bytes();
    let mut content = String::new();
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && i + 1 < bytes.len() {
            content.push('\\');
            let esc = text[i + 1..].chars().next().unwrap_or('\0');
            content.push(esc);
            i += 1 + esc.len_utf8();
            continue;
        }
        if b == b'"' {
            if quote_terminates(text, i) {
                return (content, i + 1);
            }
            content.push_str("\\\"");
            i += 1;
            continue;
        }
        let ch = text[i..].chars().next().unwrap_or('\0');
        content.push(ch);
        i += ch.len_utf8();
    }
    (content, bytes.len())
}

fn quote_terminates(text: &str, quote_at: usize) -> bool {
    let rest = text[quote_at + 1..].trim_start();
    rest.is_empty()
        || rest.starts_with([':', ',', '}', ']'])
        || rest.starts_with("//")
        || rest.starts_with("/*")
}

const PATH_INDICATORS: &[&str] = &[
    "data", "file", "temp", "usr", "var", "home", "program", "windows", "documents", "desktop",
    "downloads", "system", "config", "etc", "bin", "lib", "src", "test", "backup", "log", "cache",
    "tmp",
];

static VALID_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\[\\"/bfnrtu]|\\u[0-9a-fA-F]{4}"#).unwrap());
static DRIVE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s/\\])[a-zA-Z]:").unwrap());
static INVALID_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\(?:[^\\"/bfnrtu]|u[^0-9a-fA-F])"#).unwrap());
static EXTENSION_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9_-]+\.[a-zA-Z0-9]{1,4}$").unwrap());
static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// Double backslashes in strings that look like file paths; in other strings
/// only backslashes that do not form a valid JSON escape are doubled.
fn fix_backslashes(text: &str) -> String {
    DOUBLE_QUOTED
        .replace_all(text, |c: &regex::Captures| {
            let content = &c[1];
            if !content.contains('\\') {
                return c[0].to_string();
            }
            if looks_like_path(content) {
                return format!("\"{}\"", content.replace('\\', "\\\\"));
            }
            if INVALID_ESCAPE.is_match(content) {
                let fixed = escape_invalid_backslashes(content);
                return format!("\"{}\"", fixed);
            }
            c[0].to_string()
        })
        .into_owned()
}

fn looks_like_path(content: &str) -> bool {
    let lower = content.to_ascii_lowercase();
    let has_indicator = PATH_INDICATORS.iter().any(|w| lower.contains(w));
    if VALID_ESCAPE.is_match(content) {
        // valid escapes present: demand strong path evidence
        return has_indicator || DRIVE_LETTER.is_match(content);
    }
    has_indicator
        || DRIVE_LETTER.is_match(content)
        || (content.matches('\\').count() >= 2 && INVALID_ESCAPE.is_match(content))
        || EXTENSION_TAIL.is_match(content.rsplit('\\').next().unwrap_or(content))
}

fn escape_invalid_backslashes(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 4);
    let chars: Vec<char> = content.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '\\' {
            let next = chars.get(i + 1).copied();
            let valid = match next {
                Some('\\') | Some('"') | Some('/') | Some('b') | Some('f') | Some('n')
                | Some('r') | Some('t') => true,
                Some('u') => chars[i + 2..]
                    .iter()
                    .take(4)
                    .filter(|c| c.is_ascii_hexdigit())
                    .count()
                    == 4,
                _ => false,
            };
            if valid {
                out.push('\\');
                if let Some(n) = next {
                    out.push(n);
                    i += 2;
                    continue;
                }
                i += 1;
                continue;
            }
            out.push_str("\\\\");
            i += 1;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
