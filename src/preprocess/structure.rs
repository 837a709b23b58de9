//! Structural repair: separators, missing values, sparse arrays, unclosed
//! structures.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::PreprocessingConfig;
use crate::error::SecurityFault;
use crate::preprocess::scan;
use crate::preprocess::Budget;

pub(crate) fn repair(
    text: String,
    config: &PreprocessingConfig,
    budget: &mut Budget,
) -> Result<String, SecurityFault> {
    let mut result = fix_assignment_operators(&text);
    result = fix_structural_syntax(&result);
    result = fix_missing_values(&result);
    result = fix_missing_commas(&result);
    result = fix_missing_colons(&result);
    if config.handle_incomplete_json {
        result = close_incomplete_structures(&result);
    }
    if config.handle_sparse_arrays {
        result = expand_sparse_commas(&result, budget)?;
    }
    // trailing commas go last: sparse expansion can leave `,]` behind
    result = fix_trailing_commas(&result);
    Ok(result)
}

static QUOTED_KEY_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)"(\s*)=(\s*)"#).unwrap());
static BARE_KEY_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z_]\w*)(\s*)=(\s*)([^=<>!])").unwrap());

/// `key = value` → `key: value`, quoted or bare keys, leaving comparison
/// operators alone.
fn fix_assignment_operators(text: &str) -> String {
    if !text.contains('=') {
        return text.to_string();
    }
    let s = QUOTED_KEY_ASSIGN
        .replace_all(text, "\"$1\"$2:$3")
        .into_owned();
    scan::map_outside_strings(&s, |seg| {
        BARE_KEY_ASSIGN.replace_all(seg, "$1$2:$3$4").into_owned()
    })
}

static PAREN_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*:\s*[^()]*)\)").unwrap());
static BRACE_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

/// Parenthesized objects `("k": v)` → `{"k": v}`; brace-wrapped comma lists
/// with no colons (set literals) → arrays. Both only outside strings. A
/// paren group directly after an identifier is a function call, not an
/// object literal, and is left alone.
fn fix_structural_syntax(text: &str) -> String {
    let mut result = text.to_string();
    if result.contains("(\"") && result.contains("\":") {
        let owned = result.clone();
        result = PAREN_OBJECT
            .replace_all(&result, |c: &regex::Captures| {
                let start = c.get(0).map_or(0, |m| m.start());
                let is_call = owned[..start]
                    .chars()
                    .next_back()
                    .is_some_and(|p| p.is_alphanumeric() || p == '_' || p == '$');
                if is_call {
                    c[0].to_string()
                } else {
                    format!("{{{}}}", &c[1])
                }
            })
            .into_owned();
    }
    if result.contains('{') && result.contains(',') {
        result = scan::map_outside_strings(&result, |seg| {
            BRACE_LIST
                .replace_all(seg, |c: &regex::Captures| {
                    let content = &c[1];
                    if !content.contains(':') && content.contains(',') {
                        format!("[{}]", content)
                    } else {
                        c[0].to_string()
                    }
                })
                .into_owned()
        });
    }
    result
}

// the whitespace is captured and re-emitted so newlines (and with them the
// source line numbering) survive the insertion
static EMPTY_BEFORE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\s*)([},])").unwrap());

/// `:` with no value before `,` `}` `]`, end of line or end of input gets an
/// explicit `null`.
fn fix_missing_values(text: &str) -> String {
    let mut result = scan::map_outside_strings(text, |seg| {
        EMPTY_BEFORE_CLOSE
            .replace_all(seg, ": null$1$2")
            .into_owned()
    });
    // dangling colon at end of input
    if trailing_colon_outside_strings(&result) {
        result.push_str(" null");
        return result;
    }
    // colon at end of line with no value on the following lines
    let lines: Vec<&str> = result.split('\n').collect();
    if lines.len() > 1 && lines.iter().any(|l| l.trim_end().ends_with(':')) {
        let mut fixed: Vec<String> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim_end().ends_with(':') && !next_line_has_value(&lines, i) {
                let mut l = line.trim_end().to_string();
                l.push_str(" null");
                fixed.push(l);
            } else {
                fixed.push((*line).to_string());
            }
        }
        return fixed.join("\n");
    }
    result
}

fn trailing_colon_outside_strings(text: &str) -> bool {
    let mut last = None;
    for (_, ch, in_string) in scan::chars_with_string_state(text) {
        if !ch.is_whitespace() {
            last = Some((ch, in_string));
        }
    }
    matches!(last, Some((':', false)))
}

fn next_line_has_value(lines: &[&str], idx: usize) -> bool {
    for line in lines.iter().skip(idx + 1) {
        let next = line.trim();
        if next.is_empty() {
            continue;
        }
        if next.starts_with(['"', '\'', '{', '['])
            || next.starts_with("true")
            || next.starts_with("false")
            || next.starts_with("null")
            || next.starts_with(|c: char| c.is_ascii_digit())
            || next.contains('+')
        {
            return true;
        }
        return false;
    }
    false
}

/// Insert commas where adjacency makes the intent clear: `}` then `{`,
/// `]` then `[`, a closing quote then a next key, and adjacent strings
/// inside arrays. Quote-aware throughout.
fn fix_missing_commas(text: &str) -> String {
    let result = fix_intraline_array_commas(text);
    let mut out = String::with_capacity(result.len() + 8);
    let mut prev: Option<char> = None;
    let mut prev_in_string = false;
    let mut prev_end = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(&result) {
        if !in_string && !ch.is_whitespace() {
            // a quote that was `in_string` and is now behind us closed a string
            let prev_closed_string =
                prev_in_string && matches!(prev, Some('"' | '\''));
            let value_ended = prev_closed_string || matches!(prev, Some('}' | ']'));
            // across a line break any non-structural ending counts as a value
            let line_ended = text_gap_has_newline(&result, prev_end, i)
                && !matches!(prev, Some(',' | '{' | '[' | ':' | '('))
                && prev.is_some();
            if (value_ended || line_ended) && needs_comma(&result, prev_end, i, ch) {
                out.push(',');
            }
        }
        if in_string || !ch.is_whitespace() {
            prev = Some(ch);
            prev_in_string = in_string;
            prev_end = i + ch.len_utf8();
        }
        out.push(ch);
    }
    out
}

fn text_gap_has_newline(text: &str, prev_end: usize, at: usize) -> bool {
    text[prev_end..at].contains('\n')
}

fn needs_comma(text: &str, prev_end: usize, at: usize, ch: char) -> bool {
    match ch {
        '{' | '[' => true,
        '"' => {
            // only when the upcoming string is a key (followed by a colon)
            scan::find_string_end(text, at).is_some_and(|close| {
                matches!(scan::next_non_ws(text, close + 1), Some((_, ':')))
            })
        }
        c if c.is_alphabetic() || c == '_' => {
            // bare key on a following line
            text_gap_has_newline(text, prev_end, at) && bare_key_follows(text, at)
        }
        _ => false,
    }
}

fn bare_key_follows(text: &str, at: usize) -> bool {
    let mut end = at;
    for (i, c) in text[at..].char_indices() {
        if c.is_alphanumeric() || c == '_' {
            end = at + i + c.len_utf8();
        } else {
            break;
        }
    }
    matches!(scan::next_non_ws(text, end), Some((_, ':')))
}

static ARRAY_WITH_ADJACENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[([^\[\]]*"[^"]*"\s+"[^"]*"[^\[\]]*)\]"#).unwrap());
static ADJACENT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"("[^"]*")(\s+)("[^"]*")"#).unwrap());

fn fix_intraline_array_commas(text: &str) -> String {
    if !text.contains('[') {
        return text.to_string();
    }
    ARRAY_WITH_ADJACENT
        .replace_all(text, |c: &regex::Captures| {
            let inner = &c[0];
            if inner.contains(':') {
                return inner.to_string();
            }
            let mut current = inner.to_string();
            // pairs overlap, so rescan until stable
            for _ in 0..10 {
                let next = ADJACENT_PAIR.replace_all(&current, "$1,$2$3").into_owned();
                if next == current {
                    break;
                }
                current = next;
            }
            current
        })
        .into_owned()
}

/// A quoted key followed by a value-start character with no colon between
/// them gets one inserted.
fn fix_missing_colons(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q && !scan::is_escaped(text, i) {
                quote = None;
            }
            push_char(&mut out, text, &mut i);
            continue;
        }
        if b == b'\'' {
            quote = Some(b);
            push_char(&mut out, text, &mut i);
            continue;
        }
        if b == b'"' {
            if let Some(close) = scan::find_string_end(text, i) {
                out.push_str(&text[i..=close]);
                // missing colon: next significant char starts a value
                if let Some((next_at, next)) = scan::next_non_ws(text, close + 1) {
                    let in_key_position = matches!(
                        scan::prev_non_ws(text, i),
                        Some((_, '{' | ',')) | None
                    );
                    if in_key_position
                        && next != ':'
                        && (next == '"' || next == '[' || next == '{'
                            || next.is_alphanumeric()
                            || next == '_')
                    {
                        out.push_str(": ");
                        i = next_at;
                        continue;
                    }
                }
                i = close + 1;
                continue;
            }
            quote = Some(b);
            push_char(&mut out, text, &mut i);
            continue;
        }
        push_char(&mut out, text, &mut i);
    }
    out
}

/// Close whatever the text leaves open: an unterminated string first, then
/// the structure stack in LIFO order.
fn close_incomplete_structures(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return text.to_string();
    }
    // malformed escape tails make string repair ambiguous; leave those alone
    let quote_count = text.matches('"').count();
    if quote_count % 2 != 0 && text.contains('\\') && (text.ends_with("\\\"") || text.contains("\\\"")) {
        return text.to_string();
    }

    let mut result = text.to_string();
    if let Some((open_at, open_quote)) = unclosed_string_start(&result) {
        let close_at = string_content_boundary(&result, open_at + 1);
        result.insert(close_at, open_quote);
    }

    let mut stack: Vec<char> = Vec::new();
    for (_, ch, in_string) in scan::chars_with_string_state(&result) {
        if in_string {
            continue;
        }
        match ch {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }
    while let Some(closer) = stack.pop() {
        result.push(closer);
    }
    result
}

/// Index and quote kind of the string still open at end of text, if any.
fn unclosed_string_start(text: &str) -> Option<(usize, char)> {
    let mut open: Option<(usize, char)> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        let was_escaped = escaped;
        escaped = false;
        match quote {
            Some(q) => {
                if was_escaped {
                    continue;
                }
                if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                    open = None;
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    open = Some((i, ch));
                }
            }
        }
    }
    open
}

/// Where the open string's content plausibly ends: the first structural
/// character, or the first character that does not look like timestamp-ish
/// content.
fn string_content_boundary(text: &str, from: usize) -> usize {
    let mut end = from;
    for (i, ch) in text[from..].char_indices() {
        if matches!(ch, ',' | '\n' | '}' | ']') {
            return from + i;
        }
        if ch.is_alphanumeric() || matches!(ch, ':' | '+' | '-' | 'T' | 'Z' | ' ' | '.') {
            end = from + i + ch.len_utf8();
        } else {
            return from + i;
        }
    }
    end
}

/// Sparse commas: `[,` gains a leading null, runs of commas in arrays become
/// null-filled, doubled commas in objects collapse to one.
fn expand_sparse_commas(text: &str, budget: &mut Budget) -> Result<String, SecurityFault> {
    if !text.contains(',') {
        return Ok(text.to_string());
    }
    if budget.expired() {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut skip_until = 0usize;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if i < skip_until {
            continue;
        }
        if in_string {
            out.push(ch);
            continue;
        }
        match ch {
            '{' | '[' => {
                stack.push(ch);
                out.push(ch);
                if ch == '[' {
                    if let Some((_, ',')) = scan::next_non_ws(text, i + 1) {
                        out.push_str("null");
                    }
                }
            }
            '}' | ']' => {
                stack.pop();
                out.push(ch);
            }
            ',' => {
                let run = comma_run_len(text, i);
                let in_array = stack.last() == Some(&'[');
                if run.count > 1 {
                    if in_array {
                        out.push(',');
                        for _ in 1..run.count {
                            out.push_str("null,");
                        }
                    } else {
                        out.push(',');
                    }
                    // keep the run's newlines so line numbers stay stable
                    for nl in text[i..run.end].chars().filter(|c| *c == '\n') {
                        out.push(nl);
                    }
                    skip_until = run.end;
                } else {
                    out.push(',');
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

struct CommaRun {
    count: usize,
    end: usize,
}

fn comma_run_len(text: &str, first: usize) -> CommaRun {
    let mut count = 1usize;
    let mut end = first + 1;
    loop {
        match scan::next_non_ws(text, end) {
            Some((at, ',')) => {
                count += 1;
                end = at + 1;
            }
            _ => break,
        }
    }
    CommaRun { count, end }
}

/// `, }` and `, ]` lose the comma; the whitespace between stays (line
/// numbers must survive).
fn fix_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if !in_string && ch == ',' {
            if let Some((_, next)) = scan::next_non_ws(text, i + 1) {
                if next == '}' || next == ']' {
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

#[inline]
fn push_char(out: &mut String, text: &str, i: &mut usize) {
    let ch = text[*i..].chars().next().unwrap_or('\0');
    out.push(ch);
    *i += ch.len_utf8();
}
