use std::fmt;

use thiserror::Error;

use crate::token::Position;

/// The limit breached by a [`SecurityFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    InputTooLarge,
    StringTooLong,
    NumberTooLong,
    NestingTooDeep,
    TooManyKeys,
    TooManyItems,
    TooManyTotalItems,
    PreprocessingOverflow,
}

impl LimitKind {
    /// The configuration field this limit corresponds to.
    pub fn limit_name(self) -> &'static str {
        match self {
            LimitKind::InputTooLarge => "max_input_size",
            LimitKind::StringTooLong => "max_string_length",
            LimitKind::NumberTooLong => "max_number_length",
            LimitKind::NestingTooDeep => "max_nesting_depth",
            LimitKind::TooManyKeys => "max_object_keys",
            LimitKind::TooManyItems => "max_array_items",
            LimitKind::TooManyTotalItems => "max_total_items",
            LimitKind::PreprocessingOverflow => "max_preprocessing_iterations",
        }
    }
}

/// Non-recoverable resource-limit breach. Bypasses recovery and fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityFault {
    pub kind: LimitKind,
    /// The measured value that breached the limit.
    pub observed: u64,
    /// The configured bound.
    pub limit: u64,
}

impl fmt::Display for SecurityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self.kind {
            LimitKind::InputTooLarge => "input size",
            LimitKind::StringTooLong => "string length",
            LimitKind::NumberTooLong => "number length",
            LimitKind::NestingTooDeep => "nesting depth",
            LimitKind::TooManyKeys => "object key count",
            LimitKind::TooManyItems => "array item count",
            LimitKind::TooManyTotalItems => "total item count",
            LimitKind::PreprocessingOverflow => "preprocessing iteration count",
        };
        write!(
            f,
            "{} {} exceeds limit {} ({})",
            noun,
            self.observed,
            self.limit,
            self.kind.limit_name()
        )
    }
}

impl std::error::Error for SecurityFault {}

/// Classification of a syntactic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    UnexpectedToken,
    UnexpectedEnd,
    UnclosedStructure,
    MissingColon,
    MissingComma,
    InvalidEscape,
    InvalidNumber,
    InvalidKey,
}

/// A syntactic failure in strict (recovery-off) parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: SyntaxKind,
    pub message: String,
    /// 1-based line/column of the offending token; `None` when position
    /// reporting is disabled.
    pub position: Option<Position>,
    /// Source excerpt around the failure with a caret line, when context
    /// reporting is enabled.
    pub context: Option<String>,
    /// Fix-it hints from the suggestion catalog.
    pub suggestions: Vec<&'static str>,
}

impl ParseError {
    pub fn new(kind: SyntaxKind, message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            context: None,
            suggestions: suggestions_for(kind).to_vec(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, "\n{}", ctx)?;
        }
        for s in &self.suggestions {
            write!(f, "\n  hint: {}", s)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Fixed suggestion catalog keyed by error kind.
pub(crate) fn suggestions_for(kind: SyntaxKind) -> &'static [&'static str] {
    match kind {
        SyntaxKind::UnexpectedToken => &[
            "check for missing quotes around strings",
            "check for a stray character before this token",
        ],
        SyntaxKind::UnexpectedEnd => {
            &["the input may be truncated; close open strings and brackets"]
        }
        SyntaxKind::UnclosedStructure => &["add the matching closing brace or bracket"],
        SyntaxKind::MissingColon => &["object keys must be followed by a colon"],
        SyntaxKind::MissingComma => &["separate elements and key-value pairs with commas"],
        SyntaxKind::InvalidEscape => {
            &["use a valid JSON escape: \\n \\t \\r \\b \\f \\\" \\\\ \\/ \\uXXXX"]
        }
        SyntaxKind::InvalidNumber => &["quote the value if it is not a plain decimal number"],
        SyntaxKind::InvalidKey => &[
            "object keys must be strings or identifiers",
            "use quotes around keys with special characters",
        ],
    }
}

/// Top-level decode failure: the drop-in analogue of a strict decoder error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Security(#[from] SecurityFault),
    /// I/O failure while pulling text from a reader.
    #[error("read error: {0}")]
    Io(String),
}

impl DecodeError {
    /// Position of the failure, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            DecodeError::Parse(e) => e.position,
            _ => None,
        }
    }
}

/// Builds caret-context excerpts for error reports from the original input.
pub(crate) struct ErrorReporter<'t> {
    text: &'t str,
    max_context: usize,
}

impl<'t> ErrorReporter<'t> {
    pub(crate) fn new(text: &'t str, max_context: usize) -> Self {
        Self { text, max_context }
    }

    /// Text immediately before/after the given position, each side capped at
    /// half the context budget, newlines flattened to spaces.
    pub(crate) fn context_around(&self, pos: Position) -> (String, String) {
        let offset = self.offset_of(pos);
        let half = self.max_context / 2;
        let mut before_start = offset;
        for (taken, (i, _)) in self.text[..offset].char_indices().rev().enumerate() {
            if taken >= half {
                break;
            }
            before_start = i;
        }
        let after_end = self.text[offset..]
            .char_indices()
            .nth(half)
            .map(|(i, _)| offset + i)
            .unwrap_or(self.text.len());
        let before = self.text[before_start..offset].replace(['\n', '\r'], " ");
        let after = self.text[offset..after_end].replace(['\n', '\r'], " ");
        (before, after)
    }

    /// Render the excerpt-plus-caret block of the user-visible failure format.
    pub(crate) fn caret_block(&self, pos: Position) -> String {
        let (before, after) = self.context_around(pos);
        let mut out = String::with_capacity(before.len() + after.len() + 8);
        out.push_str(&before);
        out.push_str(&after);
        out.push('\n');
        for _ in 0..before.chars().count() {
            out.push(' ');
        }
        out.push('^');
        out
    }

    fn offset_of(&self, pos: Position) -> usize {
        let mut line = 1u32;
        let mut column = 1u32;
        for (i, ch) in self.text.char_indices() {
            if line == pos.line && column == pos.column {
                return i;
            }
            if ch == '\n' {
                // a column past the end of its line clamps to the line end
                // rather than drifting into the rest of the document
                if line == pos.line {
                    return i;
                }
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        self.text.len()
    }
}
