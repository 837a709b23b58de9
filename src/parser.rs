//! Strict (recovery-off) recursive-descent parser over the token stream.

use crate::config::ParseConfig;
use crate::error::{DecodeError, ErrorReporter, ParseError, SyntaxKind};
use crate::limits::LimitValidator;
use crate::token::{Token, TokenKind};
use crate::value::{Map, Value};

/// Wrapper identifiers whose following string token is the real value.
/// A late catch for calls the preprocessor did not rewrite.
pub(crate) const FUNCTION_WRAPPERS: &[&str] = &["Date", "RegExp", "ObjectId", "UUID", "ISODate"];

pub(crate) struct Parser<'t> {
    tokens: Vec<Token>,
    pos: usize,
    config: &'t ParseConfig,
    validator: LimitValidator,
    reporter: Option<ErrorReporter<'t>>,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: Vec<Token>, config: &'t ParseConfig) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        ));
        Self {
            tokens,
            pos: 0,
            config,
            validator: LimitValidator::new(config.limits.clone()),
            reporter: None,
        }
    }

    pub(crate) fn with_reporter(mut self, reporter: ErrorReporter<'t>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub(crate) fn parse(mut self) -> Result<Value, DecodeError> {
        self.skip_trivia();
        self.parse_value()
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

    fn error(&self, kind: SyntaxKind, message: impl Into<String>) -> DecodeError {
        let token = self.current();
        let position = self.config.include_position.then_some(token.position);
        let mut err = ParseError::new(kind, message, position);
        if self.config.include_context {
            if let (Some(reporter), Some(pos)) = (&self.reporter, position) {
                err.context = Some(reporter.caret_block(pos));
            }
        }
        DecodeError::Parse(err)
    }

    fn parse_value(&mut self) -> Result<Value, DecodeError> {
        self.skip_trivia();
        let token = self.current().clone();
        let value = match token.kind {
            TokenKind::String => {
                self.advance();
                Value::String(token.lexeme)
            }
            TokenKind::Number => {
                self.advance();
                parse_number(&token.lexeme)
                    .ok_or_else(|| self.error(SyntaxKind::InvalidNumber, format!("Invalid number: {}", token.lexeme)))?
            }
            TokenKind::Bool => {
                self.advance();
                Value::Bool(token.lexeme == "true")
            }
            TokenKind::Null => {
                self.advance();
                Value::Null
            }
            TokenKind::Identifier => {
                self.advance();
                if self.current().kind == TokenKind::String
                    && FUNCTION_WRAPPERS.contains(&token.lexeme.as_str())
                {
                    let inner = self.advance();
                    Value::String(inner.lexeme)
                } else {
                    // tolerated: a bare identifier is an unquoted string value
                    Value::String(token.lexeme)
                }
            }
            TokenKind::LBrace => self.parse_object()?,
            TokenKind::LBracket => self.parse_array()?,
            TokenKind::Eof => {
                return Err(self.error(SyntaxKind::UnexpectedEnd, "Unexpected end of input"))
            }
            _ => {
                return Err(self.error(
                    SyntaxKind::UnexpectedToken,
                    format!("Unexpected token: {:?}", token.kind),
                ))
            }
        };
        self.validator.count_item()?;
        Ok(value)
    }

    fn parse_object(&mut self) -> Result<Value, DecodeError> {
        self.validator.enter_structure()?;
        self.advance(); // '{'
        self.skip_trivia();

        let mut map = Map::new();
        if self.current().kind == TokenKind::RBrace {
            self.advance();
            self.validator.exit_structure();
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_trivia();
            let key_token = self.current().clone();
            let key = match key_token.kind {
                TokenKind::String | TokenKind::Identifier => {
                    self.advance();
                    key_token.lexeme
                }
                TokenKind::Eof => {
                    return Err(self.error(
                        SyntaxKind::UnclosedStructure,
                        "Unexpected end of input, expected '}' to close object",
                    ))
                }
                _ => return Err(self.error(SyntaxKind::InvalidKey, "Expected object key")),
            };

            self.skip_trivia();
            if self.current().kind != TokenKind::Colon {
                return Err(self.error(SyntaxKind::MissingColon, "Expected ':' after object key"));
            }
            self.advance();

            let value = self.parse_value()?;
            if self.config.duplicate_keys {
                map.insert_coalescing(key, value);
            } else {
                map.insert(key, value);
            }
            self.validator.validate_object_keys(map.len())?;

            self.skip_trivia();
            match self.current().kind {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_trivia();
                    if self.current().kind == TokenKind::RBrace {
                        break; // trailing comma
                    }
                }
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(self.error(
                        SyntaxKind::UnclosedStructure,
                        "Unexpected end of input, expected '}' to close object",
                    ))
                }
                _ => {
                    return Err(self.error(
                        SyntaxKind::MissingComma,
                        "Expected ',' or '}' in object",
                    ))
                }
            }
        }

        self.advance(); // '}'
        self.validator.exit_structure();
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, DecodeError> {
        self.validator.enter_structure()?;
        self.advance(); // '['
        self.skip_trivia();

        let mut items = Vec::new();
        if self.current().kind == TokenKind::RBracket {
            self.advance();
            self.validator.exit_structure();
            return Ok(Value::Array(items));
        }

        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.validator.validate_array_items(items.len())?;

            self.skip_trivia();
            match self.current().kind {
                TokenKind::Comma => {
                    self.advance();
                    self.skip_trivia();
                    if self.current().kind == TokenKind::RBracket {
                        break; // trailing comma
                    }
                }
                TokenKind::RBracket => break,
                TokenKind::Eof => {
                    return Err(self.error(
                        SyntaxKind::UnclosedStructure,
                        "Unexpected end of input, expected ']' to close array",
                    ))
                }
                _ => {
                    return Err(self.error(
                        SyntaxKind::MissingComma,
                        "Expected ',' or ']' in array",
                    ))
                }
            }
        }

        self.advance(); // ']'
        self.validator.exit_structure();
        Ok(Value::Array(items))
    }
}

/// Lexeme → number per the lex-time rule: `.`/`e`/`E` means Float, otherwise
/// Integer with Float fallback for lexemes outside the i64 range. Float
/// overflow becomes infinity rather than an error.
pub(crate) fn parse_number(lexeme: &str) -> Option<Value> {
    if lexeme.is_empty() || lexeme == "-" {
        return None;
    }
    if lexeme.contains(['.', 'e', 'E']) {
        let normalized = if lexeme.starts_with('.') {
            format!("0{}", lexeme)
        } else if let Some(rest) = lexeme.strip_prefix("-.") {
            format!("-0.{}", rest)
        } else {
            lexeme.to_string()
        };
        normalized.parse::<f64>().ok().map(Value::Float)
    } else {
        match lexeme.parse::<i64>() {
            Ok(n) => Some(Value::Integer(n)),
            Err(_) => lexeme.parse::<f64>().ok().map(Value::Float),
        }
    }
}
