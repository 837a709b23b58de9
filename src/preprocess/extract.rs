//! Content extraction: markdown fences, inline code spans, first-structure
//! isolation and trailing-prose removal.

use crate::config::PreprocessingConfig;
use crate::preprocess::scan;

/// Pull JSON out of markdown. The first fenced block wins; failing that, an
/// inline code span whose content starts with `{` or `[`. Server-sent-event
/// `data:` prefixes are stripped first so fenced payloads inside SSE frames
/// still extract.
pub(crate) fn extract_from_markdown(text: &str) -> String {
    let text = strip_stream_prefixes(text);
    if let Some(inner) = fenced_block(&text) {
        return inner.trim().to_string();
    }
    if let Some(inner) = inline_code_span(&text) {
        return inner.to_string();
    }
    text
}

fn strip_stream_prefixes(text: &str) -> String {
    // only streams that actually open with an SSE frame qualify; a bare
    // `data:` key inside an object must survive
    if !text.trim_start().starts_with("data:") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            out.push_str(rest.trim_start());
        } else {
            out.push_str(line);
        }
    }
    out.trim().to_string()
}

/// Inner content of the first ``` fence. An optional `json` / `javascript` /
/// `js` tag (any case) after the opener is consumed along with surrounding
/// spaces and one newline.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let mut body = &text[open + 3..];
    for tag in ["json", "javascript", "js"] {
        if body.len() >= tag.len() && body[..tag.len()].eq_ignore_ascii_case(tag) {
            body = &body[tag.len()..];
            break;
        }
    }
    body = body.trim_start_matches([' ', '\t']);
    if let Some(rest) = body.strip_prefix('\r') {
        body = rest;
    }
    if let Some(rest) = body.strip_prefix('\n') {
        body = rest;
    }
    let close = body.find("```")?;
    Some(&body[..close])
}

fn inline_code_span(text: &str) -> Option<&str> {
    let open = text.find('`')?;
    let close_rel = text[open + 1..].find('`')?;
    let content = text[open + 1..open + 1 + close_rel].trim();
    if content.starts_with('{') || content.starts_with('[') {
        Some(content)
    } else {
        None
    }
}

pub(crate) fn extract_content(text: &str, config: &PreprocessingConfig) -> String {
    let mut result = text.to_string();
    if config.extract_first_json {
        result = extract_first_json(&result);
    }
    if config.remove_trailing_text {
        result = remove_trailing_text(&result);
    }
    result
}

/// Locate the first `{` or `[`, then scan forward with quote-aware depth
/// tracking; when depth returns to zero the balanced substring is the
/// candidate JSON. Anything before the start and after the close is dropped.
/// An unbalanced tail keeps everything from the start.
pub(crate) fn extract_first_json(text: &str) -> String {
    let text = text.trim();
    let Some(start) = text.find(['{', '[']) else {
        return text.to_string();
    };
    let mut stack: Vec<char> = Vec::new();
    for (i, ch, in_string) in scan::chars_with_string_state(&text[start..]) {
        if in_string {
            continue;
        }
        match ch {
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let expected = if ch == '}' { '{' } else { '[' };
                if stack.last() == Some(&expected) {
                    stack.pop();
                    if stack.is_empty() {
                        return text[start..start + i + 1].to_string();
                    }
                } else if stack.is_empty() {
                    break;
                }
            }
            _ => {}
        }
    }
    text[start..].to_string()
}

/// Cut the text after the last position where all opened structures closed.
pub(crate) fn remove_trailing_text(text: &str) -> String {
    let text = text.trim();
    let mut stack: Vec<char> = Vec::new();
    let mut last_balanced: Option<usize> = None;
    for (i, ch, in_string) in scan::chars_with_string_state(text) {
        if in_string {
            continue;
        }
        match ch {
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let expected = if ch == '}' { '{' } else { '[' };
                if stack.last() == Some(&expected) {
                    stack.pop();
                    if stack.is_empty() {
                        last_balanced = Some(i);
                    }
                }
            }
            _ => {}
        }
    }
    match last_balanced {
        Some(end) => text[..=end].to_string(),
        None => text.to_string(),
    }
}
