//! JavaScript-construct rewriting: wrapper calls, function definitions,
//! non-finite numbers, alternate number bases, regex/template literals,
//! string concatenation and top-level statement unwrapping.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SecurityFault;
use crate::preprocess::scan;
use crate::preprocess::Budget;

/// Wrapper names whose first string argument replaces the whole call.
const VALUE_WRAPPERS: &[&str] = &["Date", "ObjectId", "ISODate", "UUID", "RegExp"];

pub(crate) fn rewrite_constructs(text: String, budget: &mut Budget) -> Result<String, SecurityFault> {
    let mut result = remove_function_definitions(&text);
    result = rewrite_nonfinite_words(&result);
    result = scan::map_outside_strings(&result, |seg| {
        replace_word(seg, "undefined", "null")
    });
    result = rewrite_new_expressions(&result);
    result = unwrap_wrapper_calls(&result);
    result = unwrap_statements(&result);
    result = rewrite_number_bases(&result);
    result = rewrite_regex_literals(&result);
    result = blank_comment_valued_strings(&result);
    result = rewrite_template_literals(&result);
    result = collapse_string_concatenation(result, budget)?;
    result = evaluate_simple_arithmetic(&result);
    result = normalize_extended_numbers(&result);
    Ok(result)
}

/// `function name(args) { body }` → `null`, via balanced paren and brace
/// scans. A `function` word not followed by the full shape is left alone.
fn remove_function_definitions(text: &str) -> String {
    if !text.contains("function") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && ch == 'f' && scan::word_at(text, i, "function") {
            if let Some(end) = skip_function_definition(text, i) {
                out.push_str("null");
                skip_until = end;
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn skip_function_definition(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = start + "function".len();
    // optional name and whitespace
    while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'(' {
        return None;
    }
    i = balanced_end(text, i, b'(', b')')?;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'{' {
        return None;
    }
    balanced_end(text, i, b'{', b'}')
}

/// Byte index just past the closer matching the opener at `open`.
fn balanced_end(text: &str, open: usize, opener: u8, closer: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i = scan::find_string_end(text, i)? + 1;
            continue;
        }
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i + 1);
            }
        }
        i += 1;
    }
    None
}

/// `NaN` → `"NaN"`, `Infinity` → `"Infinity"`, `-Infinity` → `"-Infinity"`,
/// word-boundary respected, string contents untouched.
fn rewrite_nonfinite_words(text: &str) -> String {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string {
            if ch == '-' && scan::word_at(text, i + 1, "Infinity") {
                out.push_str("\"-Infinity\"");
                skip_until = i + 1 + "Infinity".len();
                continue;
            }
            if ch == 'I' && scan::word_at(text, i, "Infinity") {
                out.push_str("\"Infinity\"");
                skip_until = i + "Infinity".len();
                continue;
            }
            if ch == 'N' && scan::word_at(text, i, "NaN") {
                out.push_str("\"NaN\"");
                skip_until = i + "NaN".len();
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn replace_word(segment: &str, word: &str, replacement: &str) -> String {
    if !segment.contains(word) {
        return segment.to_string();
    }
    let mut out = String::with_capacity(segment.len());
    let mut skip_until = 0usize;
    for (i, ch) in segment.char_indices() {
        if i < skip_until {
            continue;
        }
        if scan::word_at(segment, i, word) {
            out.push_str(replacement);
            skip_until = i + word.len();
            continue;
        }
        out.push(ch);
    }
    out
}

/// `new X(…)` → `null`.
fn rewrite_new_expressions(text: &str) -> String {
    if !text.contains("new") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && ch == 'n' && scan::word_at(text, i, "new") {
            let after = i + 3;
            let rest = &text[after..];
            let ws = rest.len() - rest.trim_start().len();
            if ws > 0 {
                let (ident, after_ident) = take_ident(&text[after + ws..]);
                if !ident.is_empty() {
                    let call_at = after + ws + (rest[ws..].len() - after_ident.len());
                    if text[call_at..].starts_with('(') {
                        if let Some(end) = balanced_end(text, call_at, b'(', b')') {
                            out.push_str("null");
                            skip_until = end;
                            continue;
                        }
                    }
                }
            }
        }
        out.push(ch);
    }
    out
}

fn take_ident(s: &str) -> (&str, &str) {
    let mut end = 0usize;
    for (i, ch) in s.char_indices() {
        let ok = if i == 0 {
            ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
        } else {
            ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
        };
        if !ok {
            break;
        }
        end = i + ch.len_utf8();
    }
    (&s[..end], &s[end..])
}

/// Rewrite function-call wrappers:
/// `Date("x")` and friends → `"x"` (bare arguments get quoted, empty calls
/// become `""`), `JSON.parse(x)` / `parseJSON(x)` / bare `parse(x)` → `x`.
fn unwrap_wrapper_calls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && (ch.is_ascii_alphabetic() || ch == '_') && ident_boundary_before(text, i) {
            let (ident, _) = take_ident(&text[i..]);
            if !ident.is_empty() {
                if let Some((replacement, end)) = rewrite_call_at(text, i, ident) {
                    out.push_str(&replacement);
                    skip_until = end;
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
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn rewrite_call_at(text: &str, start: usize, ident: &str) -> Option<(String, usize)> {
    let mut call_name_end = start + ident.len();
    let mut verbatim = false;
    match ident {
        "JSON" if text[call_name_end..].starts_with(".parse") => {
            call_name_end += ".parse".len();
            verbatim = true;
        }
        "parseJSON" => verbatim = true,
        // bare parse(…), but not method calls like foo.parse(…)
        "parse" => {
            let before = scan::prev_non_ws(text, start);
            if matches!(before, Some((_, '.'))) {
                return None;
            }
            verbatim = true;
        }
        name if VALUE_WRAPPERS.contains(&name) => {}
        _ => return None,
    }
    if !text[call_name_end..].starts_with('(') {
        return None;
    }
    let end = balanced_end(text, call_name_end, b'(', b')')?;
    let args = text[call_name_end + 1..end - 1].trim();
    if args.is_empty() {
        return Some(("\"\"".to_string(), end));
    }
    if verbatim {
        return Some((args.to_string(), end));
    }
    // Value wrappers keep only the first argument, quoted.
    let first = first_top_level_arg(args).trim();
    let replacement = if first.starts_with('"') || first.starts_with('\'') {
        first.to_string()
    } else {
        format!("\"{}\"", first)
    };
    Some((replacement, end))
}

fn first_top_level_arg(args: &str) -> &str {
    for (i, ch, in_string) in scan::chars_with_string_state(args) {
        if !in_string && ch == ',' {
            return &args[..i];
        }
    }
    args
}

/// Top-level statement shells: `return EXPR;`, `const|let|var NAME = EXPR;`
/// and JSONP `NAME(EXPR);` all reduce to `EXPR`.
fn unwrap_statements(text: &str) -> String {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("return") {
        if rest.starts_with(char::is_whitespace) {
            s = rest.trim_start();
            s = s.trim_end().trim_end_matches(';').trim_end();
        }
    }
    for kw in ["const", "let", "var"] {
        if scan::word_at(s, 0, kw) {
            let rest = s[kw.len()..].trim_start();
            let (name, after) = take_ident(rest);
            if !name.is_empty() {
                let after = after.trim_start();
                if let Some(expr) = after.strip_prefix('=') {
                    if !expr.starts_with('=') {
                        s = expr.trim_start().trim_end().trim_end_matches(';').trim_end();
                    }
                }
            }
        }
    }
    // JSONP: strip nested ident( … ) shells.
    let mut out = s.to_string();
    loop {
        let trimmed = out.trim();
        let Some(inner) = trim_jsonp(trimmed) else {
            break;
        };
        out = inner.to_string();
    }
    out
}

fn trim_jsonp(s: &str) -> Option<&str> {
    let (ident, after) = take_ident(s);
    if ident.is_empty() || ident == "true" || ident == "false" || ident == "null" {
        return None;
    }
    let after = after.trim_start();
    if !after.starts_with('(') {
        return None;
    }
    let tail = after.trim_end().trim_end_matches(';').trim_end();
    let idx = tail.rfind(')')?;
    Some(&tail[1..idx])
}

static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b0x([0-9a-fA-F]+)\b").unwrap());
static BINARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b0b([01]+)\b").unwrap());
static OCTAL_O: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b0o([0-7]+)\b").unwrap());
static OCTAL_LEGACY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b0([0-7]+)\b").unwrap());

/// Hex always converts; binary and `0o` octal convert; legacy `0NN` octal
/// converts only when the surrounding context is clearly numeric (a colon
/// before, a comma or closer after, and no date/version punctuation nearby).
fn rewrite_number_bases(text: &str) -> String {
    scan::map_outside_strings(text, |seg| {
        let mut s = HEX
            .replace_all(seg, |c: &regex::Captures| {
                i64::from_str_radix(&c[1], 16).map_or_else(|_| c[0].to_string(), |v| v.to_string())
            })
            .into_owned();
        s = BINARY
            .replace_all(&s, |c: &regex::Captures| {
                i64::from_str_radix(&c[1], 2).map_or_else(|_| c[0].to_string(), |v| v.to_string())
            })
            .into_owned();
        s = OCTAL_O
            .replace_all(&s, |c: &regex::Captures| {
                i64::from_str_radix(&c[1], 8).map_or_else(|_| c[0].to_string(), |v| v.to_string())
            })
            .into_owned();
        let owned = s.clone();
        s = OCTAL_LEGACY
            .replace_all(&s, |c: &regex::Captures| {
                let m = c.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
                if legacy_octal_context_ok(&owned, m.0, m.1) {
                    i64::from_str_radix(&c[1], 8)
                        .map_or_else(|_| c[0].to_string(), |v| v.to_string())
                } else {
                    c[0].to_string()
                }
            })
            .into_owned();
        s
    })
}

fn legacy_octal_context_ok(seg: &str, start: usize, end: usize) -> bool {
    let window = window_around(seg, start, end);
    // dates, times, versions and signed values stay untouched
    if window.contains(['-', 'T', '+', 'Z', '.']) {
        return false;
    }
    window.contains(':') && (window.contains(',') || window.contains('}'))
}

/// `/pattern/flags` in value position → `"pattern"`. Value position means
/// the previous significant character is `:`, `,` or `[`.
fn rewrite_regex_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && ch == '/' && !text[i + 1..].starts_with(['/', '*']) {
            let value_position = matches!(scan::prev_non_ws(text, i), Some((_, ':' | ',' | '[')));
            if value_position {
                if let Some((pattern, end)) = read_regex_literal(text, i) {
                    out.push('"');
                    out.push_str(pattern);
                    out.push('"');
                    skip_until = end;
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// Returns the pattern body and the byte index just past the flags.
fn read_regex_literal(text: &str, open: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut i = open + 1;
    let mut escaped = false;
    while i < bytes.len() {
        let b = bytes[i];
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'\n' {
            return None;
        } else if b == b'/' {
            let body = &text[open + 1..i];
            if body.is_empty() {
                return None;
            }
            let mut j = i + 1;
            while j < bytes.len() && matches!(bytes[j], b'g' | b'i' | b'm' | b'u' | b'y') {
                j += 1;
            }
            return Some((body, j));
        }
        i += 1;
    }
    None
}

static COMMENT_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":(\s*)"//[^"]*""#).unwrap());

/// A string value that is itself a line comment becomes an empty string.
fn blank_comment_valued_strings(text: &str) -> String {
    COMMENT_STRING.replace_all(text, ":$1\"\"").into_owned()
}

/// `` `text` `` → `"text"`, `${…}` substitutions preserved verbatim.
fn rewrite_template_literals(text: &str) -> String {
    if !text.contains('`') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if !in_string && ch == '`' {
            if let Some(close_rel) = text[i + 1..].find('`') {
                let body = &text[i + 1..i + 1 + close_rel];
                out.push('"');
                out.push_str(&body.replace('"', "\\\""));
                out.push('"');
                skip_until = i + 1 + close_rel + 1;
                continue;
            }
        }
        out.push(ch);
    }
    out
}

static EXPLICIT_CONCAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')\s*\+\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#,
    )
    .unwrap()
});
static PAREN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\(\s*((?:"(?:[^"\\]|\\.)*"\s*)+)\)"#).unwrap());
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

/// Collapse `"a" + 'b'` chains, Python parenthesized implicit concatenation
/// and adjacent strings in object-value position. Each rescan round is one
/// pipeline iteration; exceeding the cap while still making progress is a
/// `PreprocessingOverflow`.
fn collapse_string_concatenation(text: String, budget: &mut Budget) -> Result<String, SecurityFault> {
    let original = text.clone();
    let mut current = text;
    let mut rounds = 0usize;
    loop {
        if budget.expired() {
            return Ok(original);
        }
        let before = current.clone();

        current = EXPLICIT_CONCAT
            .replace_all(&current, |c: &regex::Captures| {
                let left = c.get(1).or_else(|| c.get(2)).map_or("", |m| m.as_str());
                let right = c.get(3).or_else(|| c.get(4)).map_or("", |m| m.as_str());
                format!("\"{}{}\"", left, right)
            })
            .into_owned();

        current = PAREN_GROUP
            .replace_all(&current, |c: &regex::Captures| {
                let combined: String = QUOTED
                    .captures_iter(&c[1])
                    .map(|q| q[1].to_string())
                    .collect();
                format!("\"{}\"", combined)
            })
            .into_owned();

        current = concatenate_adjacent_value_strings(&current);

        if current == before {
            return Ok(current);
        }
        rounds += 1;
        if rounds > budget.max_iterations() {
            return Err(budget.overflow(rounds));
        }
    }
}

/// Merge `"a" "b"` only when the pair sits in object-value position: a colon
/// in the preceding context, no comma/bracket directly before, and the
/// second string is not itself a key.
fn concatenate_adjacent_value_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if let Some(end1) = scan::find_string_end(text, i) {
                let mut j = end1 + 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() && bytes[j] != b'\n' {
                    j += 1;
                }
                if j < bytes.len() && bytes[j] == b'"' {
                    if let Some(end2) = scan::find_string_end(text, j) {
                        let mut ctx_start = i.saturating_sub(20);
                        while ctx_start > 0 && !text.is_char_boundary(ctx_start) {
                            ctx_start -= 1;
                        }
                        let context = &text[ctx_start..i];
                        let trimmed = context.trim_end();
                        let after2 = scan::next_non_ws(text, end2 + 1).map(|(_, c)| c);
                        if context.contains(':')
                            && !trimmed.ends_with(',')
                            && !trimmed.ends_with('[')
                            && after2 != Some(':')
                        {
                            out.push('"');
                            out.push_str(&text[i + 1..end1]);
                            out.push_str(&text[j + 1..end2]);
                            out.push('"');
                            i = end2 + 1;
                            continue;
                        }
                    }
                }
                out.push_str(&text[i..=end1]);
                i = end1 + 1;
                continue;
            }
        }
        let ch = text[i..].chars().next().unwrap_or('\0');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

static ADDITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*\+\s*(\d+)").unwrap());
static SUBTRACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").unwrap());
static DATE_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// `N + M` / `N - M` between integer literals evaluate, outside strings, and
/// only when the neighborhood does not look like a date, version or regex
/// character class.
fn evaluate_simple_arithmetic(text: &str) -> String {
    scan::map_outside_strings(text, |seg| {
        let after_add = ADDITION.replace_all(seg, |c: &regex::Captures| {
            let m = c.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            let window = window_around(seg, m.0, m.1);
            if window.contains('-') {
                return c[0].to_string();
            }
            match (c[1].parse::<i64>(), c[2].parse::<i64>()) {
                (Ok(a), Ok(b)) => (a + b).to_string(),
                _ => c[0].to_string(),
            }
        });
        let owned = after_add.into_owned();
        SUBTRACTION
            .replace_all(&owned, |c: &regex::Captures| {
                let m = c.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
                let window = window_around(&owned, m.0, m.1);
                if (window.contains('[') && window.contains(']')) || DATE_LIKE.is_match(window) {
                    return c[0].to_string();
                }
                match (c[1].parse::<i64>(), c[2].parse::<i64>()) {
                    (Ok(a), Ok(b)) => (a - b).to_string(),
                    _ => c[0].to_string(),
                }
            })
            .into_owned()
    })
}

fn window_around(seg: &str, start: usize, end: usize) -> &str {
    let mut s = start.saturating_sub(10);
    let mut e = (end + 10).min(seg.len());
    while s > 0 && !seg.is_char_boundary(s) {
        s -= 1;
    }
    while e < seg.len() && !seg.is_char_boundary(e) {
        e += 1;
    }
    &seg[s..e]
}

static VERSION_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+\.\d+\.\d+\.\d+)\b").unwrap());
static PLUS_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(:\s*)\+(\d)").unwrap());
static TRAILING_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\.(\s*[,\]\}])").unwrap());
static BARE_EXPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)[eE](\s*[,\]\}])").unwrap());

/// Extended numeric shapes that strict JSON rejects: four-part versions get
/// quoted, `+N` loses the sign, `42.` drops the dot, `1.5e` gains a zero
/// exponent.
fn normalize_extended_numbers(text: &str) -> String {
    scan::map_outside_strings(text, |seg| {
        let s = VERSION_QUAD.replace_all(seg, "\"$1\"").into_owned();
        let s = PLUS_PREFIX.replace_all(&s, "$1$2").into_owned();
        let s = TRAILING_DOT.replace_all(&s, "$1$2").into_owned();
        BARE_EXPONENT.replace_all(&s, "${1}e0$2").into_owned()
    })
}
