//! Quote normalization: Unicode quote folding, single-to-double conversion,
//! and quoting of bare keys and values.

use crate::preprocess::scan;

const UNICODE_QUOTES: &[char] = &[
    '\u{00AB}', '\u{00BB}', // « »
    '\u{201C}', '\u{201D}', // “ ”
    '\u{2018}', '\u{2019}', // ‘ ’
    '\u{201A}', '\u{201E}', // ‚ „
    '\u{2039}', '\u{203A}', // ‹ ›
    '\u{300C}', '\u{300D}', // 「 」 (CJK corner brackets)
];

pub(crate) fn normalize(text: &str) -> String {
    let mut result = fold_unicode_quotes(text);
    result = convert_single_quotes(&result);
    result = quote_unquoted_keys(&result);
    result = quote_unquoted_values(&result);
    result
}

fn fold_unicode_quotes(text: &str) -> String {
    if !text.contains(UNICODE_QUOTES) {
        return text.to_string();
    }
    text.chars()
        .map(|c| if UNICODE_QUOTES.contains(&c) { '"' } else { c })
        .collect()
}

/// Convert single-quoted strings to double-quoted when context marks them as
/// JSON values (preceded by `:` `,` `[` `{`, or followed by `:` `,` `]` `}`).
/// Apostrophes inside double-quoted strings are never touched.
fn convert_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut in_double = false;
    while i < bytes.len() {
        let ch = text[i..].chars().next().unwrap_or('\0');
        if ch == '"' && !scan::is_escaped(text, i) {
            in_double = !in_double;
            out.push(ch);
            i += 1;
            continue;
        }
        if !in_double && ch == '\'' && !scan::is_escaped(text, i) && single_quote_is_value(text, i)
        {
            if let Some(close) = find_single_quote_end(text, i) {
                let content = &text[i + 1..close];
                out.push('"');
                out.push_str(&content.replace('"', "\\\""));
                out.push('"');
                i = close + 1;
                continue;
            }
        }
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn find_single_quote_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn single_quote_is_value(text: &str, pos: usize) -> bool {
    if matches!(scan::prev_non_ws(text, pos), Some((_, ':' | ',' | '[' | '{'))) {
        return true;
    }
    // otherwise require a closing quote followed by a structural character
    if let Some(close) = find_single_quote_end(text, pos) {
        if matches!(
            scan::next_non_ws(text, close + 1),
            Some((_, ',' | ']' | '}' | ':'))
        ) {
            return true;
        }
    }
    false
}

/// Wrap identifier-like tokens followed by `:` in double quotes, unless the
/// token is `true`/`false`/`null` or all digits.
fn quote_unquoted_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && (ch.is_alphabetic() || ch == '_') && ident_boundary_before(text, i) {
            if let Some((key_end, colon_at)) = key_candidate(text, i) {
                let key = &text[i..key_end];
                if should_quote_key(key) {
                    out.push('"');
                    out.push_str(key);
                    out.push('"');
                    out.push_str(&text[key_end..colon_at]);
                    skip_until = colon_at;
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

fn ident_boundary_before(text: &str, idx: usize) -> bool {
    !text[..idx]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '"' || c == '\'')
}

/// Returns (end of identifier, index of the colon) when the identifier at
/// `start` is followed by optional whitespace and a colon.
fn key_candidate(text: &str, start: usize) -> Option<(usize, usize)> {
    let mut end = start;
    for (i, ch) in text[start..].char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            end = start + i + ch.len_utf8();
        } else {
            break;
        }
    }
    let (colon_at, next) = scan::next_non_ws(text, end)?;
    if next == ':' {
        Some((end, colon_at))
    } else {
        None
    }
}

fn should_quote_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    !matches!(lower.as_str(), "true" | "false" | "null") && !key.chars().all(|c| c.is_ascii_digit())
}

/// After a `:`, wrap a bare token in quotes unless it is a literal, a number,
/// a structure opener, already quoted, URL-like, or an arithmetic expression.
fn quote_unquoted_values(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        out.push(ch);
        if in_string || ch != ':' {
            continue;
        }
        // timestamp colons sit between digits; leave those alone
        if text[..i].chars().next_back().is_some_and(|c| c.is_ascii_digit())
            && text[i + 1..].chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }
        let Some((value_at, first)) = scan::next_non_ws(text, i + 1) else {
            continue;
        };
        if !starts_bare_value(first) {
            continue;
        }
        let value_end = bare_value_end(text, value_at);
        let value = text[value_at..value_end].trim_end();
        if value.is_empty() || !should_quote_value(value) {
            continue;
        }
        out.push_str(&text[i + 1..value_at]);
        out.push('"');
        out.push_str(value);
        out.push('"');
        skip_until = value_at + value.len();
    }
    out
}

/// Only identifier-like tokens qualify; punctuation is left for the parser
/// (and its recovery modes) to deal with.
fn starts_bare_value(first: char) -> bool {
    first.is_alphabetic() || first == '_'
}

/// Bare values run to the next `,` `]` `}`, quote or newline. Apostrophes
/// are ordinary content here (`{note: don't panic}`).
fn bare_value_end(text: &str, start: usize) -> usize {
    for (i, ch) in text[start..].char_indices() {
        if matches!(ch, ',' | ']' | '}' | '\n' | '\r' | '"') {
            return start + i;
        }
    }
    text.len()
}

fn should_quote_value(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "true" | "false" | "null" | "none" | "yes" | "no" | "undefined"
    ) {
        return false;
    }
    if is_number_like(value) {
        return false;
    }
    if value.contains("://") {
        return false;
    }
    if value.contains('(') && value.contains(')') {
        return false;
    }
    if ["+", "-", "*", "/"]
        .iter()
        .any(|op| value.contains(&format!(" {} ", op)))
    {
        return false;
    }
    true
}

fn is_number_like(value: &str) -> bool {
    if value.parse::<f64>().is_ok() {
        return true;
    }
    matches!(
        value.to_ascii_lowercase().as_str(),
        "nan" | "infinity" | "-infinity" | "+infinity"
    )
}
