//! Reader ingestion and the large-input path.
//!
//! The whole value is still produced at once (no incremental yielding); what
//! changes above the streaming threshold is the buffering strategy. A
//! preprocessed sample of the input head is compared byte-for-byte with the
//! raw head: when the pipeline is an identity on the sample, the full
//! rewrite buffer is skipped and the lexer runs over the original text.

use std::io::Read;

use crate::config::ParseConfig;
use crate::error::{DecodeError, ErrorReporter};
use crate::limits::LimitValidator;
use crate::parser::Parser;
use crate::token::Lexer;
use crate::value::Value;

/// Pull all text from the reader, then parse as [`crate::loads`] would.
pub(crate) fn read_all<R: Read>(mut reader: R) -> Result<String, DecodeError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| DecodeError::Io(e.to_string()))?;
    Ok(content)
}

/// Parse an input that exceeds the streaming threshold.
pub(crate) fn parse_oversized(text: &str, config: &ParseConfig) -> Result<Value, DecodeError> {
    let validator = LimitValidator::new(config.limits.clone());
    validator.validate_input_size(text)?;

    if can_lex_directly(text, config) {
        let tokens = Lexer::new(text).tokenize(&validator)?;
        let mut parser = Parser::new(tokens, config);
        if config.include_context {
            parser = parser.with_reporter(ErrorReporter::new(text, config.max_error_context));
        }
        return parser.parse();
    }

    let preprocessed =
        crate::preprocess::preprocess(text, &config.preprocessing, &config.limits)?;
    let tokens = Lexer::new(&preprocessed).tokenize(&validator)?;
    let mut parser = Parser::new(tokens, config);
    let reporter = ErrorReporter::new(&preprocessed, config.max_error_context);
    if config.include_context {
        parser = parser.with_reporter(reporter);
    }
    parser.parse()
}

/// Probe: preprocess a head sample; identity output means the input needs no
/// rewriting and the tolerant lexer can run over the original bytes.
fn can_lex_directly(text: &str, config: &ParseConfig) -> bool {
    let budget = config.streaming_threshold / 10;
    let mut end = budget.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &text[..end];
    match crate::preprocess::preprocess(sample, &config.preprocessing, &config.limits) {
        Ok(processed) => processed == sample,
        Err(_) => false,
    }
}
