//! Error-recovering parser: extracts valid data from malformed token
//! streams, reporting what was skipped, repaired or synthesized.

use crate::config::ParseConfig;
use crate::error::{ErrorReporter, SecurityFault, SyntaxKind};
use crate::limits::LimitValidator;
use crate::parser::{parse_number, FUNCTION_WRAPPERS};
use crate::token::{Lexer, Position, Token, TokenKind};
use crate::value::{Map, Value};

/// How aggressively the parser fabricates or skips values on syntax errors.
/// Ordered: each level admits strictly more repair than the one before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecoveryLevel {
    /// Report everything, repair nothing, synthesize nothing.
    Strict,
    /// Drop malformed object fields; null out malformed array elements.
    SkipFields,
    /// Point-repair known error patterns before falling back to skipping.
    BestEffort,
    /// Best-effort repairs plus placeholders so nothing parseable is lost.
    ExtractAll,
}

/// The repair applied at a recovery site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    AddedQuotes,
    RemovedTrailingComma,
    AddedColon,
    ClosedString,
    InferredValue,
    SkippedField,
    SkippedElement,
    StructureRepaired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Data was lost.
    Error,
    /// Data survived, possibly repaired.
    Warning,
    /// Informational only.
    Info,
}

/// What went wrong (or what was repaired) at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax(SyntaxKind),
    Recovered(RecoveryAction),
    PreprocessingTimeout,
}

/// A structured error or warning produced during partial parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Dot-separated keys with `[i]` array indices, e.g. `users[2].name`.
    pub path: String,
    pub line: u32,
    pub column: u32,
    pub context_before: String,
    pub context_after: String,
    pub recovery_action: Option<RecoveryAction>,
    pub original_lexeme: Option<String>,
    pub recovered_value: Option<Value>,
}

/// Outcome of a recovering parse: whatever data was extracted plus the full
/// account of errors, warnings and repairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialParseResult {
    pub value: Option<Value>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// successful_fields / total_fields × 100; 0 when nothing was counted.
    pub success_rate: f64,
    pub recovery_actions: Vec<RecoveryAction>,
    /// Object members and array elements attempted (plus a lone top-level
    /// scalar).
    pub total_fields: u64,
    pub successful_fields: u64,
}

impl PartialParseResult {
    fn add(&mut self, diag: Diagnostic) {
        if let Some(action) = diag.recovery_action {
            self.recovery_actions.push(action);
        }
        if diag.severity == Severity::Error {
            self.errors.push(diag);
        } else {
            self.warnings.push(diag);
        }
    }

    fn finalize_rate(&mut self) {
        self.success_rate = if self.total_fields == 0 {
            0.0
        } else {
            (self.successful_fields as f64 / self.total_fields as f64) * 100.0
        };
    }
}

enum PathElem {
    Key(String),
    Index(usize),
}

pub(crate) struct PartialParser<'t> {
    tokens: Vec<Token>,
    pos: usize,
    level: RecoveryLevel,
    validator: LimitValidator,
    reporter: Option<ErrorReporter<'t>>,
    path: Vec<PathElem>,
    duplicate_keys: bool,
    result: PartialParseResult,
}

impl<'t> PartialParser<'t> {
    pub(crate) fn new(tokens: Vec<Token>, config: &ParseConfig, level: RecoveryLevel) -> Self {
        Self {
            tokens,
            pos: 0,
            level,
            validator: LimitValidator::new(config.limits.clone()),
            reporter: None,
            path: Vec::new(),
            duplicate_keys: config.duplicate_keys,
            result: PartialParseResult::default(),
        }
    }

    pub(crate) fn with_reporter(mut self, reporter: ErrorReporter<'t>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub(crate) fn parse(mut self) -> Result<PartialParseResult, SecurityFault> {
        self.skip_trivia();
        let was_container = matches!(
            self.current().kind,
            TokenKind::LBrace | TokenKind::LBracket
        );
        let (value, ok) = self.parse_value()?;
        if !was_container {
            // containers count their members; a lone scalar is one field
            self.result.total_fields += 1;
            if ok {
                self.result.successful_fields += 1;
            }
        }
        self.result.value = if ok || value.is_some() {
            value
        } else if self.level == RecoveryLevel::ExtractAll {
            // unparseable top level still yields an empty object
            Some(Value::Object(Map::new()))
        } else {
            None
        };
        self.result.finalize_rate();
        Ok(self.result)
    }

    fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn skip_trivia(&mut self) {
        while matches!(
            self.current().kind,
            TokenKind::Whitespace | TokenKind::Newline
        ) {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn path_string(&self) -> String {
        let mut out = String::new();
        for elem in &self.path {
            match elem {
                PathElem::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                PathElem::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    fn diagnostic(
        &self,
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Diagnostic {
        let position = self.current().position;
        let (before, after) = self
            .reporter
            .as_ref()
            .map(|r| r.context_around(position))
            .unwrap_or_default();
        Diagnostic {
            message: message.into(),
            kind,
            severity,
            path: self.path_string(),
            line: position.line,
            column: position.column,
            context_before: before,
            context_after: after,
            recovery_action: None,
            original_lexeme: None,
            recovered_value: None,
        }
    }

    fn skipping_allowed(&self) -> bool {
        self.level >= RecoveryLevel::SkipFields
    }

    fn repairs_allowed(&self) -> bool {
        self.level >= RecoveryLevel::BestEffort
    }

    /// Consume tokens until a `,`, `}`, `]` or EOF at the current nesting
    /// depth. Structures opened while skipping are balanced before a
    /// recovery point is accepted.
    fn skip_to_recovery_point(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.current().kind {
                TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RBracket => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Comma if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_value(&mut self) -> Result<(Option<Value>, bool), SecurityFault> {
        self.skip_trivia();
        let token = self.current().clone();
        match token.kind {
            TokenKind::String => {
                self.validator
                    .validate_string_length(token.lexeme.chars().count())?;
                self.advance();
                self.validator.count_item()?;
                Ok((Some(Value::String(token.lexeme)), true))
            }
            TokenKind::Number => {
                self.validator
                    .validate_number_length(token.lexeme.chars().count())?;
                self.advance();
                match parse_number(&token.lexeme) {
                    Some(value) => {
                        self.validator.count_item()?;
                        Ok((Some(value), true))
                    }
                    None => {
                        let mut diag = self.diagnostic(
                            DiagnosticKind::Syntax(SyntaxKind::InvalidNumber),
                            Severity::Error,
                            format!("Invalid number format: {}", token.lexeme),
                        );
                        diag.original_lexeme = Some(token.lexeme.clone());
                        if self.repairs_allowed() {
                            diag.severity = Severity::Warning;
                            diag.recovery_action = Some(RecoveryAction::InferredValue);
                            diag.recovered_value = Some(Value::String(token.lexeme.clone()));
                            self.result.add(diag);
                            self.validator.count_item()?;
                            return Ok((Some(Value::String(token.lexeme)), true));
                        }
                        self.result.add(diag);
                        Ok((None, false))
                    }
                }
            }
            TokenKind::Bool => {
                self.advance();
                self.validator.count_item()?;
                Ok((Some(Value::Bool(token.lexeme == "true")), true))
            }
            TokenKind::Null => {
                self.advance();
                self.validator.count_item()?;
                Ok((Some(Value::Null), true))
            }
            TokenKind::Identifier => self.parse_identifier(token),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Eof => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::UnexpectedEnd),
                    Severity::Error,
                    "Unexpected end of input",
                );
                self.result.add(diag);
                Ok((None, false))
            }
            other => {
                let mut diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::UnexpectedToken),
                    Severity::Error,
                    format!("Unexpected token: {:?}", other),
                );
                diag.original_lexeme = Some(token.lexeme.clone());
                self.result.add(diag);
                // leave recovery points for the caller's resync; anything
                // else is consumed so the parse always advances
                let at_recovery_point = matches!(
                    other,
                    TokenKind::Comma | TokenKind::RBrace | TokenKind::RBracket
                );
                if !at_recovery_point || !self.skipping_allowed() {
                    self.advance();
                }
                Ok((None, false))
            }
        }
    }

    fn parse_identifier(&mut self, token: Token) -> Result<(Option<Value>, bool), SecurityFault> {
        self.validator
            .validate_string_length(token.lexeme.chars().count())?;
        self.advance();
        // wrapper calls the preprocessor missed still unwrap here
        if self.current().kind == TokenKind::String
            && FUNCTION_WRAPPERS.contains(&token.lexeme.as_str())
        {
            let inner = self.advance();
            self.validator.count_item()?;
            return Ok((Some(Value::String(inner.lexeme)), true));
        }
        let mut diag = self.diagnostic(
            DiagnosticKind::Syntax(SyntaxKind::UnexpectedToken),
            Severity::Error,
            format!("Unquoted identifier: {}", token.lexeme),
        );
        diag.original_lexeme = Some(token.lexeme.clone());
        if self.repairs_allowed() {
            let recovered = infer_identifier_value(&token.lexeme);
            diag.severity = Severity::Warning;
            diag.recovery_action = Some(RecoveryAction::AddedQuotes);
            diag.recovered_value = Some(recovered.clone());
            self.result.add(diag);
            self.validator.count_item()?;
            return Ok((Some(recovered), true));
        }
        self.result.add(diag);
        Ok((None, false))
    }

    fn parse_object(&mut self) -> Result<(Option<Value>, bool), SecurityFault> {
        self.validator.enter_structure()?;
        self.advance(); // '{'
        self.skip_trivia();

        let mut map = Map::new();
        if self.current().kind == TokenKind::RBrace {
            self.advance();
            self.validator.exit_structure();
            self.validator.count_item()?;
            return Ok((Some(Value::Object(map)), true));
        }

        let mut clean = true;
        loop {
            self.skip_trivia();
            if self.at_end() || self.current().kind == TokenKind::RBrace {
                break;
            }
            if !self.parse_object_pair(&mut map)? {
                clean = false;
            }
            self.validator.validate_object_keys(map.len())?;
            if !self.handle_object_separator()? {
                break;
            }
        }

        if self.current().kind == TokenKind::RBrace {
            self.advance();
            self.validator.exit_structure();
        } else {
            let mut diag = self.diagnostic(
                DiagnosticKind::Syntax(SyntaxKind::UnclosedStructure),
                Severity::Error,
                "Expected '}' to close object",
            );
            if self.repairs_allowed() {
                diag.severity = Severity::Warning;
                diag.recovery_action = Some(RecoveryAction::StructureRepaired);
            }
            self.result.add(diag);
            self.validator.exit_structure();
            clean = false;
        }

        self.validator.count_item()?;
        let map_is_empty = map.is_empty();
        Ok((Some(Value::Object(map)), clean || !map_is_empty))
    }

    /// One `key : value` pair; counts one field. Returns false when the pair
    /// was dropped.
    fn parse_object_pair(&mut self, map: &mut Map) -> Result<bool, SecurityFault> {
        self.result.total_fields += 1;
        self.skip_trivia();
        let key_token = self.current().clone();
        let key = match key_token.kind {
            TokenKind::String | TokenKind::Identifier => {
                if key_token.kind == TokenKind::Identifier {
                    let mut diag = self.diagnostic(
                        DiagnosticKind::Recovered(RecoveryAction::AddedQuotes),
                        Severity::Warning,
                        format!("Unquoted object key: {}", key_token.lexeme),
                    );
                    diag.recovery_action = Some(RecoveryAction::AddedQuotes);
                    diag.recovered_value = Some(Value::String(key_token.lexeme.clone()));
                    self.result.add(diag);
                }
                self.advance();
                key_token.lexeme
            }
            _ => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::InvalidKey),
                    Severity::Error,
                    format!("Expected object key, got {:?}", key_token.kind),
                );
                self.result.add(diag);
                if self.skipping_allowed() {
                    self.skip_to_recovery_point();
                }
                return Ok(false);
            }
        };

        self.path.push(PathElem::Key(key.clone()));
        self.skip_trivia();

        if self.current().kind != TokenKind::Colon {
            let mut diag = self.diagnostic(
                DiagnosticKind::Syntax(SyntaxKind::MissingColon),
                Severity::Error,
                "Expected ':' after object key",
            );
            let next_starts_value = matches!(
                self.current().kind,
                TokenKind::String
                    | TokenKind::Number
                    | TokenKind::Bool
                    | TokenKind::Null
                    | TokenKind::LBrace
                    | TokenKind::LBracket
            );
            if self.repairs_allowed() && next_starts_value {
                diag.severity = Severity::Warning;
                diag.recovery_action = Some(RecoveryAction::AddedColon);
                self.result.add(diag);
                // fall through with the colon assumed
            } else {
                self.result.add(diag);
                self.path.pop();
                self.drop_field(&key);
                if self.skipping_allowed() {
                    self.skip_to_recovery_point();
                }
                return Ok(false);
            }
        } else {
            self.advance();
        }

        let (value, ok) = self.parse_value()?;
        self.path.pop();
        if ok {
            if self.duplicate_keys {
                map.insert_coalescing(key, value.unwrap_or(Value::Null));
            } else {
                map.insert(key, value.unwrap_or(Value::Null));
            }
            self.result.successful_fields += 1;
            Ok(true)
        } else {
            self.drop_field(&key);
            if self.skipping_allowed() {
                self.skip_to_recovery_point();
            }
            Ok(false)
        }
    }

    fn drop_field(&mut self, key: &str) {
        if !self.skipping_allowed() {
            return;
        }
        let mut diag = self.diagnostic(
            DiagnosticKind::Recovered(RecoveryAction::SkippedField),
            Severity::Warning,
            format!("Skipped field: {}", key),
        );
        diag.recovery_action = Some(RecoveryAction::SkippedField);
        self.result.add(diag);
    }

    /// Returns true to continue with the next pair.
    fn handle_object_separator(&mut self) -> Result<bool, SecurityFault> {
        self.skip_trivia();
        match self.current().kind {
            TokenKind::Comma => {
                self.advance();
                self.skip_trivia();
                if self.current().kind == TokenKind::RBrace {
                    if self.repairs_allowed() {
                        let mut diag = self.diagnostic(
                            DiagnosticKind::Recovered(RecoveryAction::RemovedTrailingComma),
                            Severity::Warning,
                            "Trailing comma in object",
                        );
                        diag.recovery_action = Some(RecoveryAction::RemovedTrailingComma);
                        self.result.add(diag);
                    }
                    return Ok(false);
                }
                Ok(true)
            }
            TokenKind::RBrace => Ok(false),
            TokenKind::Eof => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::UnclosedStructure),
                    Severity::Error,
                    "Unexpected end of input in object",
                );
                self.result.add(diag);
                Ok(false)
            }
            other => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::MissingComma),
                    Severity::Error,
                    format!("Expected ',' or '}}' but found {:?}", other),
                );
                self.result.add(diag);
                if self.skipping_allowed() {
                    self.skip_to_recovery_point();
                    if self.current().kind == TokenKind::Comma {
                        self.advance();
                    }
                    return Ok(!self.at_end());
                }
                Ok(false)
            }
        }
    }

    fn parse_array(&mut self) -> Result<(Option<Value>, bool), SecurityFault> {
        self.validator.enter_structure()?;
        self.advance(); // '['
        self.skip_trivia();

        let mut items: Vec<Value> = Vec::new();
        if self.current().kind == TokenKind::RBracket {
            self.advance();
            self.validator.exit_structure();
            self.validator.count_item()?;
            return Ok((Some(Value::Array(items)), true));
        }

        let mut clean = true;
        let mut index = 0usize;
        loop {
            self.skip_trivia();
            if self.at_end() || self.current().kind == TokenKind::RBracket {
                break;
            }
            self.result.total_fields += 1;
            self.path.push(PathElem::Index(index));
            let (value, ok) = self.parse_value()?;
            if ok {
                items.push(value.unwrap_or(Value::Null));
                self.result.successful_fields += 1;
            } else if self.skipping_allowed() {
                // malformed element becomes a null placeholder
                let mut diag = self.diagnostic(
                    DiagnosticKind::Recovered(RecoveryAction::SkippedElement),
                    Severity::Warning,
                    format!("Skipped array element {}", index),
                );
                diag.recovery_action = Some(RecoveryAction::SkippedElement);
                self.result.add(diag);
                self.skip_to_recovery_point();
                items.push(Value::Null);
                clean = false;
            } else {
                clean = false;
            }
            self.path.pop();
            self.validator.validate_array_items(items.len())?;
            index += 1;
            if !self.handle_array_separator()? {
                break;
            }
        }

        if self.current().kind == TokenKind::RBracket {
            self.advance();
            self.validator.exit_structure();
        } else {
            let mut diag = self.diagnostic(
                DiagnosticKind::Syntax(SyntaxKind::UnclosedStructure),
                Severity::Error,
                "Expected ']' to close array",
            );
            if self.repairs_allowed() {
                diag.severity = Severity::Warning;
                diag.recovery_action = Some(RecoveryAction::StructureRepaired);
            }
            self.result.add(diag);
            self.validator.exit_structure();
            clean = false;
        }

        self.validator.count_item()?;
        let items_is_empty = items.is_empty();
        Ok((Some(Value::Array(items)), clean || !items_is_empty))
    }

    fn handle_array_separator(&mut self) -> Result<bool, SecurityFault> {
        self.skip_trivia();
        match self.current().kind {
            TokenKind::Comma => {
                self.advance();
                self.skip_trivia();
                if self.current().kind == TokenKind::RBracket {
                    if self.repairs_allowed() {
                        let mut diag = self.diagnostic(
                            DiagnosticKind::Recovered(RecoveryAction::RemovedTrailingComma),
                            Severity::Warning,
                            "Trailing comma in array",
                        );
                        diag.recovery_action = Some(RecoveryAction::RemovedTrailingComma);
                        self.result.add(diag);
                    }
                    return Ok(false);
                }
                Ok(true)
            }
            TokenKind::RBracket => Ok(false),
            TokenKind::Eof => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::UnclosedStructure),
                    Severity::Error,
                    "Unexpected end of input in array",
                );
                self.result.add(diag);
                Ok(false)
            }
            other => {
                let diag = self.diagnostic(
                    DiagnosticKind::Syntax(SyntaxKind::MissingComma),
                    Severity::Error,
                    format!("Expected ',' or ']' but found {:?}", other),
                );
                self.result.add(diag);
                if self.skipping_allowed() {
                    self.skip_to_recovery_point();
                    if self.current().kind == TokenKind::Comma {
                        self.advance();
                    }
                    return Ok(!self.at_end());
                }
                Ok(false)
            }
        }
    }
}

fn infer_identifier_value(lexeme: &str) -> Value {
    match lexeme.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "none" | "undefined" => Value::Null,
        _ => Value::String(lexeme.to_string()),
    }
}

/// Parse with error recovery: preprocess, lex, and run the recovering
/// parser. Security faults bypass recovery and surface as `Err`.
pub fn parse_partial(
    text: &str,
    level: RecoveryLevel,
    config: &ParseConfig,
) -> Result<PartialParseResult, SecurityFault> {
    let validator = LimitValidator::new(config.limits.clone());
    validator.validate_input_size(text)?;

    let preprocessed =
        crate::preprocess::preprocess_reporting(text, &config.preprocessing, &config.limits)?;
    let timed_out = preprocessed.timed_out;
    let preprocessed = preprocessed.text;
    let had_unclosed_string = has_unclosed_string(&preprocessed);

    let tokens = Lexer::new(&preprocessed).tokenize(&validator)?;

    let reporter = ErrorReporter::new(text, config.max_error_context);
    let parser = PartialParser::new(tokens, config, level).with_reporter(reporter);
    let mut result = parser.parse()?;

    if timed_out {
        result.add(Diagnostic {
            message: "Preprocessing step timed out; its input was used unchanged".to_string(),
            kind: DiagnosticKind::PreprocessingTimeout,
            severity: Severity::Info,
            path: String::new(),
            line: 1,
            column: 1,
            context_before: String::new(),
            context_after: String::new(),
            recovery_action: None,
            original_lexeme: None,
            recovered_value: None,
        });
    }

    if had_unclosed_string && level >= RecoveryLevel::BestEffort {
        let position = end_position(text);
        let reporter = ErrorReporter::new(text, config.max_error_context);
        let (before, after) = reporter.context_around(position);
        result.add(Diagnostic {
            message: "Closed an unterminated string".to_string(),
            kind: DiagnosticKind::Recovered(RecoveryAction::ClosedString),
            severity: Severity::Warning,
            path: String::new(),
            line: position.line,
            column: position.column,
            context_before: before,
            context_after: after,
            recovery_action: Some(RecoveryAction::ClosedString),
            original_lexeme: None,
            recovered_value: None,
        });
    }
    Ok(result)
}

fn end_position(text: &str) -> Position {
    let mut line = 1u32;
    let mut column = 1u32;
    for ch in text.chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position { line, column }
}

fn has_unclosed_string(text: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        let was_escaped = escaped;
        escaped = false;
        match quote {
            Some(q) => {
                if was_escaped {
                    continue;
                }
                if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
            }
        }
    }
    quote.is_some()
}

/// Extract any valid data from malformed input, ignoring the error report.
pub fn extract_valid_data(text: &str, config: &ParseConfig) -> Option<Value> {
    parse_partial(text, RecoveryLevel::ExtractAll, config)
        .ok()
        .and_then(|r| r.value)
}

/// Recovering parse returning `(value, errors)` as a convenience tuple.
pub fn parse_with_fallback(
    text: &str,
    level: RecoveryLevel,
    config: &ParseConfig,
) -> Result<(Option<Value>, Vec<Diagnostic>), SecurityFault> {
    let result = parse_partial(text, level, config)?;
    Ok((result.value, result.errors))
}
