//! Final literal and whitespace normalization. Runs last because by now the
//! string content is stable and everything outside strings is structural.

use std::sync::LazyLock;

use regex::Regex;

use crate::preprocess::scan;

static PYTHON_TRUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bTrue\b").unwrap());
static PYTHON_FALSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bFalse\b").unwrap());
static NONE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNone\b").unwrap());
static NULL_VARIANTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:NULL|Null)\b").unwrap());
static UNDEFINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:undefined|Undefined|UNDEFINED)\b").unwrap());
static YES_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\byes\b").unwrap());
static NO_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bno\b").unwrap());

/// `True`/`False` → `true`/`false`; `None`/`NULL`/`Null`/`undefined` →
/// `null`; case-insensitive `yes`/`no` → `true`/`false`. Word-boundary
/// respected; string contents untouched.
pub(crate) fn normalize_boolean_null(text: &str) -> String {
    scan::map_outside_strings(text, |seg| {
        let s = PYTHON_TRUE.replace_all(seg, "true").into_owned();
        let s = PYTHON_FALSE.replace_all(&s, "false").into_owned();
        let s = NONE_WORD.replace_all(&s, "null").into_owned();
        let s = NULL_VARIANTS.replace_all(&s, "null").into_owned();
        let s = UNDEFINED.replace_all(&s, "null").into_owned();
        let s = YES_WORD.replace_all(&s, "true").into_owned();
        NO_WORD.replace_all(&s, "false").into_owned()
    })
}

/// Outside strings, collapse runs of spaces/tabs to one space and unpad the
/// structural characters. Newlines survive untouched: token positions (and
/// therefore diagnostics) are computed from this text, so the line count
/// must keep matching the source.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    let collapsed = scan::map_outside_strings(text, |seg| {
        let mut out = String::with_capacity(seg.len());
        let mut pending_ws = false;
        for ch in seg.chars() {
            if ch == '\n' {
                pending_ws = false;
                out.push('\n');
            } else if ch.is_whitespace() {
                pending_ws = true;
            } else {
                if pending_ws && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_ws = false;
                out.push(ch);
            }
        }
        if pending_ws && !out.is_empty() && !out.ends_with('\n') {
            out.push(' ');
        }
        out
    });
    // drop the padding around structural characters
    let mut out = String::with_capacity(collapsed.len());
    let mut pending_space = false;
    for (_, ch, in_string) in scan::chars_with_string_state(&collapsed) {
        if in_string {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
            continue;
        }
        if ch == ' ' {
            pending_space = true;
            continue;
        }
        if ch == '\n' {
            pending_space = false;
            out.push('\n');
            continue;
        }
        if matches!(ch, ':' | ',' | '{' | '}' | '[' | ']') {
            pending_space = false;
            out.push(ch);
            continue;
        }
        if pending_space && !out.is_empty() && !out.ends_with([':', ',', '{', '[', ' ', '\n']) {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out.trim_matches([' ', '\t', '\r']).to_string()
}
