//! Permissive JSON parsing: accept text that merely resembles JSON — LLM
//! output, copy-pasted logs, MongoDB exports, JavaScript/Python object
//! literals — and produce a standard value tree.
//!
//! The crate is a drop-in replacement for a strict decoder with three
//! extras: a preprocessing pipeline that rewrites common malformations, a
//! partial-recovery parser that salvages data from inputs it cannot fully
//! parse, and resource limits enforced at every layer.
//!
//! ```
//! use jsonmend::{loads, ParseConfig};
//!
//! let value = loads("{ name: 'Ada', age: 37 }", &ParseConfig::default())?;
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("Ada"));
//! assert_eq!(value.get("age").and_then(|v| v.as_i64()), Some(37));
//! # Ok::<(), jsonmend::DecodeError>(())
//! ```
//!
//! Partial recovery keeps what it can and reports the rest:
//!
//! ```
//! use jsonmend::{parse_partial, ParseConfig, RecoveryLevel};
//!
//! let result = parse_partial(r#"{"a": 1, "b": @, "c": 3}"#,
//!     RecoveryLevel::SkipFields, &ParseConfig::default())?;
//! assert!(result.value.is_some());
//! assert_eq!(result.errors.len(), 1);
//! # Ok::<(), jsonmend::SecurityFault>(())
//! ```

mod config;
mod error;
mod hooks;
mod limits;
mod parser;
mod preprocess;
mod recovery;
mod stream;
mod token;
mod value;

pub use config::{ParseConfig, ParseLimits, PreprocessingConfig};
pub use error::{DecodeError, LimitKind, ParseError, SecurityFault, SyntaxKind};
pub use hooks::Hooks;
pub use recovery::{
    extract_valid_data, parse_partial, parse_with_fallback, Diagnostic, DiagnosticKind,
    PartialParseResult, RecoveryAction, RecoveryLevel, Severity,
};
pub use token::Position;
pub use value::{Map, Value};

use error::ErrorReporter;
use limits::LimitValidator;
use token::Lexer;

// ============================================================================
// Primary API - drop-in strict decoder replacement
// ============================================================================

/// Parse permissive JSON text into a [`Value`].
///
/// Runs the preprocessing pipeline selected by `config.preprocessing`, then
/// the tolerant parser. With `config.fallback` (the default), a syntactic
/// failure is retried with a strict decoder on the preprocessed and then the
/// original text before the error surfaces. Limit breaches surface as
/// [`SecurityFault`]s and are never retried.
///
/// # Examples
///
/// ```
/// use jsonmend::{loads, ParseConfig};
///
/// let v = loads("[1,,3,]", &ParseConfig::default())?;
/// assert_eq!(v.to_string(), "[1,null,3]");
/// # Ok::<(), jsonmend::DecodeError>(())
/// ```
pub fn loads(text: &str, config: &ParseConfig) -> Result<Value, DecodeError> {
    loads_with_hooks(text, &Hooks::default(), config)
}

/// As [`loads`], with transformation hooks applied bottom-up after the parse.
///
/// # Examples
///
/// ```
/// use jsonmend::{loads_with_hooks, Hooks, ParseConfig, Value};
///
/// let double = |n: i64| Value::Integer(n * 2);
/// let hooks = Hooks { parse_int: Some(&double), ..Hooks::default() };
/// let v = loads_with_hooks("{x: 21}", &hooks, &ParseConfig::default())?;
/// assert_eq!(v.get("x").and_then(|v| v.as_i64()), Some(42));
/// # Ok::<(), jsonmend::DecodeError>(())
/// ```
pub fn loads_with_hooks(
    text: &str,
    hooks: &Hooks,
    config: &ParseConfig,
) -> Result<Value, DecodeError> {
    let value = parse_text(text, config)?;
    Ok(hooks.apply(value))
}

/// Parse UTF-8 bytes; the byte-oriented twin of [`loads`].
pub fn loads_bytes(bytes: &[u8], config: &ParseConfig) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::Io(format!("invalid UTF-8 input: {}", e)))?;
    loads(text, config)
}

/// Pull all text from a reader, then parse as [`loads`] would.
///
/// # Examples
///
/// ```no_run
/// use jsonmend::{load, ParseConfig};
/// use std::fs::File;
///
/// let file = File::open("almost.json")?;
/// let value = load(file, &ParseConfig::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load<R: std::io::Read>(reader: R, config: &ParseConfig) -> Result<Value, DecodeError> {
    let content = stream::read_all(reader)?;
    loads(&content, config)
}

/// As [`load`], with transformation hooks.
pub fn load_with_hooks<R: std::io::Read>(
    reader: R,
    hooks: &Hooks,
    config: &ParseConfig,
) -> Result<Value, DecodeError> {
    let content = stream::read_all(reader)?;
    loads_with_hooks(&content, hooks, config)
}

// ============================================================================
// Legacy API
// ============================================================================

/// Legacy entry point taking the behavior flags positionally.
///
/// `aggressive` selects the aggressive preprocessing preset (the
/// conservative one otherwise); the remaining flags map onto
/// [`ParseConfig`] fields.
pub fn parse(
    text: &str,
    fallback: bool,
    duplicate_keys: bool,
    aggressive: bool,
) -> Result<Value, DecodeError> {
    let config = ParseConfig {
        preprocessing: if aggressive {
            PreprocessingConfig::aggressive()
        } else {
            PreprocessingConfig::conservative()
        },
        fallback,
        duplicate_keys,
        ..ParseConfig::default()
    };
    loads(text, &config)
}

// ============================================================================
// Internals
// ============================================================================

fn parse_text(text: &str, config: &ParseConfig) -> Result<Value, DecodeError> {
    let validator = LimitValidator::new(config.limits.clone());
    validator.validate_input_size(text)?;

    if text.len() > config.streaming_threshold {
        return stream::parse_oversized(text, config);
    }

    let preprocessed = preprocess::preprocess(text, &config.preprocessing, &config.limits)?;

    let parse_attempt = (|| -> Result<Value, DecodeError> {
        let tokens = Lexer::new(&preprocessed).tokenize(&validator)?;
        let mut parser = parser::Parser::new(tokens, config);
        if config.include_context {
            parser =
                parser.with_reporter(ErrorReporter::new(&preprocessed, config.max_error_context));
        }
        parser.parse()
    })();

    match parse_attempt {
        Ok(value) => Ok(value),
        // security faults bypass fallback
        Err(DecodeError::Security(fault)) => Err(DecodeError::Security(fault)),
        Err(err) => {
            if config.fallback {
                if let Some(value) = strict_decode(&preprocessed).or_else(|| strict_decode(text)) {
                    return Ok(value);
                }
            }
            Err(err)
        }
    }
}

/// One strict-decoder attempt, used by the fallback path.
#[cfg(feature = "serde")]
fn strict_decode(text: &str) -> Option<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(Value::from)
}

#[cfg(not(feature = "serde"))]
fn strict_decode(_text: &str) -> Option<Value> {
    None
}

#[cfg(test)]
mod tests;
