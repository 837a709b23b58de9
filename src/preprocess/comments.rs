//! Comment stripping with string-literal protection.

use memchr::memchr;

/// Remove `// …` (to end of line, newline kept) and `/* … */` comments.
/// Quotes suspend comment recognition. Removing a block comment inserts a
/// single space only when neither side already has whitespace, so token
/// boundaries survive without gaining spurious separators.
pub(crate) fn remove_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            let was_escaped = escaped;
            escaped = false;
            if !was_escaped {
                if b == b'\\' {
                    escaped = true;
                } else if b == q {
                    quote = None;
                }
            }
            push_char(&mut out, text, &mut i);
            continue;
        }

        if b == b'"' || b == b'\'' {
            quote = Some(b);
            push_char(&mut out, text, &mut i);
            continue;
        }

        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            // line comment: skip to newline, keep the newline itself
            match memchr(b'\n', &bytes[i..]) {
                Some(rel) => i += rel,
                None => i = bytes.len(),
            }
            continue;
        }

        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            let mut j = i + 2;
            loop {
                match memchr(b'*', &bytes[j..]) {
                    Some(rel) if j + rel + 1 < bytes.len() && bytes[j + rel + 1] == b'/' => {
                        j += rel + 2;
                        break;
                    }
                    Some(rel) => j += rel + 1,
                    None => {
                        j = bytes.len();
                        break;
                    }
                }
            }
            // a multi-line comment gives back its newlines so positions in
            // the lines after it keep matching the source
            let newlines = bytes[i..j].iter().filter(|b| **b == b'\n').count();
            if newlines > 0 {
                for _ in 0..newlines {
                    out.push('\n');
                }
            } else {
                let space_before = out.chars().next_back().is_some_and(char::is_whitespace);
                let space_after = j < bytes.len() && (bytes[j] as char).is_ascii_whitespace();
                if !space_before && !space_after {
                    out.push(' ');
                }
            }
            i = j;
            continue;
        }

        push_char(&mut out, text, &mut i);
    }

    out
}

#[inline]
fn push_char(out: &mut String, text: &str, i: &mut usize) {
    let ch = text[*i..].chars().next().unwrap_or('\0');
    out.push(ch);
    *i += ch.len_utf8();
}
