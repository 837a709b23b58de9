use super::*;

// Shared test helpers

fn cfg() -> ParseConfig {
    ParseConfig::default()
}

fn conservative() -> ParseConfig {
    ParseConfig::conservative()
}

/// A config whose preprocessing does as little as possible, so parser and
/// recovery behavior can be observed on raw input.
fn raw_cfg() -> ParseConfig {
    ParseConfig {
        preprocessing: PreprocessingConfig {
            extract_from_markdown: false,
            remove_comments: false,
            unwrap_function_calls: false,
            extract_first_json: false,
            remove_trailing_text: false,
            normalize_quotes: false,
            normalize_boolean_null: false,
            fix_unescaped_strings: false,
            handle_incomplete_json: false,
            handle_sparse_arrays: false,
        },
        fallback: false,
        ..ParseConfig::default()
    }
}

fn obj_get<'v>(v: &'v Value, key: &str) -> &'v Value {
    v.get(key).unwrap_or_else(|| panic!("missing key {}", key))
}

mod hooks_behavior;
mod limits_enforcement;
mod parser_core;
mod preprocess_comments;
mod preprocess_javascript;
mod preprocess_quotes;
mod preprocess_structure;
