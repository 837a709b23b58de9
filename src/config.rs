/// Resource limits enforced during preprocessing, lexing and parsing.
///
/// Every limit breach is a [`SecurityFault`](crate::SecurityFault) naming the
/// limit and the observed value; breaches are never recoverable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum input size in bytes.
    pub max_input_size: usize,
    /// Maximum length of a single string literal, in characters.
    pub max_string_length: usize,
    /// Maximum length of a single number lexeme, in characters.
    pub max_number_length: usize,
    /// Cap on rescan rounds in iterative preprocessing steps
    /// (string-concatenation collapse, sparse-comma expansion).
    pub max_preprocessing_iterations: usize,
    /// Maximum nesting depth of objects/arrays.
    pub max_nesting_depth: u32,
    /// Maximum number of keys in a single object.
    pub max_object_keys: usize,
    /// Maximum number of items in a single array.
    pub max_array_items: usize,
    /// Maximum total values produced across the whole parse.
    pub max_total_items: u64,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_input_size: 10 * 1024 * 1024,
            max_string_length: 1024 * 1024,
            max_number_length: 100,
            max_preprocessing_iterations: 10,
            max_nesting_depth: 100,
            max_object_keys: 10_000,
            max_array_items: 100_000,
            max_total_items: 1_000_000,
        }
    }
}

/// Granular switches for the preprocessing pipeline steps.
///
/// The pipeline order is fixed (see [`crate::preprocess`]); these toggles
/// only decide which steps run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreprocessingConfig {
    /// Pull JSON out of markdown fenced blocks or inline code spans.
    pub extract_from_markdown: bool,
    /// Strip `//`, `/* */` comments outside strings.
    pub remove_comments: bool,
    /// Rewrite JavaScript constructs: `Date(...)`/`ObjectId(...)` wrappers,
    /// `function` definitions, `new X(...)`, regex and template literals,
    /// hex/binary/octal numbers, string concatenation.
    pub unwrap_function_calls: bool,
    /// Locate the first `{`/`[` and keep only the balanced structure from there.
    pub extract_first_json: bool,
    /// Drop prose after the last balanced close.
    pub remove_trailing_text: bool,
    /// Convert Unicode/CJK quotes and single-quoted values to double quotes,
    /// and quote unquoted keys/values.
    pub normalize_quotes: bool,
    /// Normalize `True`/`False`/`None`/`NULL`/`yes`/`no` to JSON literals.
    pub normalize_boolean_null: bool,
    /// Escape stray `"` inside strings and double path-like backslashes.
    pub fix_unescaped_strings: bool,
    /// Append missing closers (strings first, then structures in LIFO order).
    pub handle_incomplete_json: bool,
    /// Expand sparse array commas to `null`s; collapse object double commas.
    pub handle_sparse_arrays: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self::aggressive()
    }
}

impl PreprocessingConfig {
    /// All repair steps on. This is the default.
    pub fn aggressive() -> Self {
        Self {
            extract_from_markdown: true,
            remove_comments: true,
            unwrap_function_calls: true,
            extract_first_json: true,
            remove_trailing_text: true,
            normalize_quotes: true,
            normalize_boolean_null: true,
            fix_unescaped_strings: true,
            handle_incomplete_json: true,
            handle_sparse_arrays: true,
        }
    }

    /// Markdown extraction, comment removal and quote normalization only;
    /// every repair-leaning rewrite stays off.
    pub fn conservative() -> Self {
        Self {
            extract_from_markdown: true,
            remove_comments: true,
            unwrap_function_calls: false,
            extract_first_json: false,
            remove_trailing_text: false,
            normalize_quotes: true,
            normalize_boolean_null: false,
            fix_unescaped_strings: false,
            handle_incomplete_json: false,
            handle_sparse_arrays: false,
        }
    }
}

/// Top-level parse configuration: limits, preprocessing, behavior flags and
/// error-reporting knobs.
#[derive(Clone, Debug)]
pub struct ParseConfig {
    /// Resource limits; see [`ParseLimits`].
    pub limits: ParseLimits,
    /// Preprocessing step switches; see [`PreprocessingConfig`].
    pub preprocessing: PreprocessingConfig,
    /// Retry with a strict decoder (preprocessed text, then original text)
    /// before surfacing a syntactic error. Security faults bypass this.
    pub fallback: bool,
    /// Duplicate object keys: `false` = last occurrence wins,
    /// `true` = values coalesce into an array in source order.
    pub duplicate_keys: bool,
    /// Attach line/column to errors.
    pub include_position: bool,
    /// Attach a source excerpt with a caret to errors.
    pub include_context: bool,
    /// Maximum characters of surrounding text in error context.
    pub max_error_context: usize,
    /// Inputs longer than this many bytes take the chunked-lexer path.
    pub streaming_threshold: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            limits: ParseLimits::default(),
            preprocessing: PreprocessingConfig::default(),
            fallback: true,
            duplicate_keys: false,
            include_position: true,
            include_context: true,
            max_error_context: 50,
            streaming_threshold: 1024 * 1024,
        }
    }
}

impl ParseConfig {
    /// Default configuration with aggressive preprocessing.
    pub fn aggressive() -> Self {
        Self::default()
    }

    /// Conservative preset: markdown/comment/quote normalization only.
    pub fn conservative() -> Self {
        Self {
            preprocessing: PreprocessingConfig::conservative(),
            ..Self::default()
        }
    }
}
