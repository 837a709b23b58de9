//! Quote-aware scanning shared by every preprocessing step.
//!
//! Steps must never mutate text inside string literals by accident; they all
//! consume this module's primitives instead of re-implementing quote
//! tracking.

/// Yields `(byte_index, char, in_string)` for the whole text. A quote opens a
/// string when unescaped; the string closes at the next unescaped quote of
/// the same kind. The opening and closing quotes themselves report
/// `in_string = true`.
pub(crate) fn chars_with_string_state(text: &str) -> impl Iterator<Item = (usize, char, bool)> + '_ {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    text.char_indices().map(move |(i, ch)| {
        let was_escaped = escaped;
        escaped = false;
        match quote {
            Some(q) => {
                if was_escaped {
                    // stay inside
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                    return (i, ch, true); // closing quote still counts as inside
                }
                (i, ch, true)
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    (i, ch, true)
                } else {
                    (i, ch, false)
                }
            }
        }
    })
}

/// Apply `f` to every maximal run of text outside string literals and stitch
/// the result back together with the (verbatim) string literals.
pub(crate) fn map_outside_strings<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut seg_start = 0usize;
    let mut seg_in_string = false;
    let mut flush = |out: &mut String, seg: &str, in_string: bool, f: &mut F| {
        if seg.is_empty() {
            return;
        }
        if in_string {
            out.push_str(seg);
        } else {
            out.push_str(&f(seg));
        }
    };
    for (i, ch, in_string) in chars_with_string_state(text) {
        if in_string != seg_in_string {
            flush(&mut out, &text[seg_start..i], seg_in_string, &mut f);
            seg_start = i;
            seg_in_string = in_string;
        }
        let _ = ch;
    }
    flush(&mut out, &text[seg_start..], seg_in_string, &mut f);
    out
}

/// True when the character at `idx` is preceded by an odd number of
/// backslashes.
pub(crate) fn is_escaped(text: &str, idx: usize) -> bool {
    let mut count = 0usize;
    let bytes = text.as_bytes();
    let mut j = idx;
    while j > 0 && bytes[j - 1] == b'\\' {
        count += 1;
        j -= 1;
    }
    count % 2 == 1
}

/// Byte index of the unescaped closing quote for the string opened at
/// `open` (which must hold `"` or `'`). `None` when the string never closes.
pub(crate) fn find_string_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            return Some(i);
        }
        // skip over multi-byte sequences wholesale
        i += 1;
    }
    None
}

/// True when `text[idx..]` starts the word `word` on clean word boundaries
/// (neither neighbor is alphanumeric or `_`).
pub(crate) fn word_at(text: &str, idx: usize, word: &str) -> bool {
    if !text[idx..].starts_with(word) {
        return false;
    }
    let before_ok = idx == 0
        || !text[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
    let after = idx + word.len();
    let after_ok = !text[after..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    before_ok && after_ok
}

/// Last non-whitespace char before `idx`, with its byte index.
pub(crate) fn prev_non_ws(text: &str, idx: usize) -> Option<(usize, char)> {
    text[..idx]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_whitespace())
}

/// First non-whitespace char at or after `idx`, with its byte index.
pub(crate) fn next_non_ws(text: &str, idx: usize) -> Option<(usize, char)> {
    text[idx..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| (idx + i, c))
}
