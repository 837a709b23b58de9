//! The preprocessing pipeline: an ordered, closed set of text→text steps
//! that rewrite malformed input into strict-ish JSON.
//!
//! The order is part of the contract — later steps rely on earlier
//! normalizations (wrapper unwrapping must precede quote normalization,
//! sparse-comma expansion must precede trailing-comma removal, literal
//! normalization runs after string content has stabilized).

mod comments;
mod extract;
mod javascript;
mod literals;
mod quotes;
pub(crate) mod scan;
mod strings;
mod structure;

use std::time::{Duration, Instant};

use crate::config::{ParseLimits, PreprocessingConfig};
use crate::error::{LimitKind, SecurityFault};

/// Per-call budget handed to iterative steps: a rescan cap (breach is a
/// [`SecurityFault`] naming `max_preprocessing_iterations`) and a wall-clock
/// deadline (expiry makes the step yield its input unchanged, recorded so
/// callers with a diagnostics channel can report it).
pub(crate) struct Budget {
    max_iterations: usize,
    deadline: Instant,
    timed_out: bool,
}

impl Budget {
    fn new(limits: &ParseLimits) -> Self {
        Self {
            max_iterations: limits.max_preprocessing_iterations,
            deadline: Instant::now() + Duration::from_secs(5),
            timed_out: false,
        }
    }

    pub(crate) fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub(crate) fn expired(&mut self) -> bool {
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return true;
        }
        false
    }

    pub(crate) fn overflow(&self, observed: usize) -> SecurityFault {
        SecurityFault {
            kind: LimitKind::PreprocessingOverflow,
            observed: observed as u64,
            limit: self.max_iterations as u64,
        }
    }
}

/// Preprocessing output plus whether any step hit its wall-clock deadline
/// (and therefore passed its input through unchanged).
pub(crate) struct Preprocessed {
    pub(crate) text: String,
    pub(crate) timed_out: bool,
}

struct Step {
    #[allow(dead_code)]
    name: &'static str,
    enabled: fn(&PreprocessingConfig) -> bool,
    run: fn(String, &PreprocessingConfig, &mut Budget) -> Result<String, SecurityFault>,
}

/// The fixed pipeline. Adding a step means adding a row here; the set is
/// closed by design.
static PIPELINE: &[Step] = &[
    Step {
        name: "markdown-extraction",
        enabled: |c| c.extract_from_markdown,
        run: |t, _, _| Ok(extract::extract_from_markdown(&t)),
    },
    Step {
        name: "content-extraction",
        enabled: |c| c.extract_first_json || c.remove_trailing_text,
        run: |t, c, _| Ok(extract::extract_content(&t, c)),
    },
    Step {
        name: "comment-removal",
        enabled: |c| c.remove_comments,
        run: |t, _, _| Ok(comments::remove_comments(&t)),
    },
    Step {
        name: "javascript-constructs",
        enabled: |c| c.unwrap_function_calls,
        run: |t, _, b| javascript::rewrite_constructs(t, b),
    },
    Step {
        name: "quote-normalization",
        enabled: |c| c.normalize_quotes,
        run: |t, _, _| Ok(quotes::normalize(&t)),
    },
    Step {
        name: "structure-repair",
        enabled: |_| true,
        run: |t, c, b| structure::repair(t, c, b),
    },
    Step {
        name: "string-repair",
        enabled: |_| true,
        run: |t, c, _| Ok(strings::repair(t, c)),
    },
    Step {
        name: "literal-normalization",
        enabled: |c| c.normalize_boolean_null,
        run: |t, _, _| Ok(literals::normalize_boolean_null(&t)),
    },
    Step {
        name: "whitespace-normalization",
        enabled: |_| true,
        run: |t, _, _| Ok(literals::normalize_whitespace(&t)),
    },
];

/// Run every enabled step in order. Pure in (text, config); the wall-clock
/// budget only ever causes a step to return its input unchanged.
pub(crate) fn preprocess(
    text: &str,
    config: &PreprocessingConfig,
    limits: &ParseLimits,
) -> Result<String, SecurityFault> {
    preprocess_reporting(text, config, limits).map(|p| p.text)
}

/// As [`preprocess`], also reporting step timeouts for callers that surface
/// diagnostics.
pub(crate) fn preprocess_reporting(
    text: &str,
    config: &PreprocessingConfig,
    limits: &ParseLimits,
) -> Result<Preprocessed, SecurityFault> {
    let mut budget = Budget::new(limits);
    let mut result = text.to_string();
    for step in PIPELINE {
        if (step.enabled)(config) {
            result = (step.run)(result, config, &mut budget)?;
        }
    }
    Ok(Preprocessed {
        text: result,
        timed_out: budget.timed_out,
    })
}
