//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The parser is a recursive descent parser over declarations only:
//! - This module: Parser struct, token helpers, delimiter skipping
//! - `declarations`: records, enums, typedefs, declarators and attributes
//!
//! Anything reflection does not need (function bodies, initializers, global
//! variables) is skipped by balanced-delimiter scanning instead of parsed.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::frontend::diagnostic::Diagnostic;
use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use rustc_hash::FxHashMap;
use std::mem;
use std::path::Path;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::error(err.message, err.location)
    }
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Identifier recorded as [`Attribute::MarkerMacro`] instead of being
    /// treated as a type name
    pub marker_macro: Option<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            marker_macro: Some("CINSPECT_STRUCT".to_string()),
        }
    }
}

/// Recursive descent parser for C declarations
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) options: ParserOptions,
    pub(crate) unit: TranslationUnit,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Tag name → location of its definition, shared by struct/union/enum
    pub(crate) tag_definitions: FxHashMap<String, SourceLocation>,
    /// Open `extern "C" {` blocks
    pub(crate) linkage_depth: usize,
}

impl Parser {
    pub fn new(
        source: &str,
        path: impl AsRef<Path>,
        options: ParserOptions,
    ) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            options,
            unit: TranslationUnit::new(path.as_ref()),
            diagnostics: Vec::new(),
            tag_definitions: FxHashMap::default(),
            linkage_depth: 0,
        })
    }

    /// Parse the whole translation unit (top-level declarations)
    pub fn parse_translation_unit(&mut self) -> Result<TranslationUnit, ParseError> {
        while !self.is_at_end() {
            self.parse_external_declaration()?;
        }

        if self.linkage_depth > 0 {
            return Err(ParseError {
                message: "Expected '}' to close linkage specification".to_string(),
                location: self.current_location(),
            });
        }

        let path = self.unit.path().to_path_buf();
        Ok(mem::replace(&mut self.unit, TranslationUnit::new(path)))
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    // ===== Helper methods =====

    pub(crate) fn warn(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.diagnostics.push(Diagnostic::warning(message, location));
    }

    pub(crate) fn report_error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.diagnostics.push(Diagnostic::error(message, location));
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: format!("{}, found {}", message.into(), self.peek()),
            location: self.current_location(),
        }
    }

    pub(crate) fn is_marker_macro(&self, name: &str) -> bool {
        self.options.marker_macro.as_deref() == Some(name)
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        mem::discriminant(self.peek()) == mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("Expected '(' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("Expected '}}' {ctx}"),
        )
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("Expected ';' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here("Expected identifier"))
        }
    }

    pub(crate) fn match_identifier(&mut self) -> Option<String> {
        match self.peek_token() {
            Token::Ident(name, _) if !self.is_marker_macro(&name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    /// Index of the delimiter closing the one at `open`
    pub(crate) fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token {
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => depth += 1,
                Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                Token::Eof(_) => return None,
                _ => {}
            }
            if depth == 0 {
                return None;
            }
        }
        None
    }

    /// Consume an opening delimiter and everything up to its closing partner
    pub(crate) fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let open = self.current_location();
        let opener = self.peek().to_string();
        match self.matching_close(self.position) {
            Some(close) => {
                self.position = close + 1;
                Ok(())
            }
            None => Err(ParseError {
                message: format!("Unbalanced {}", opener),
                location: open,
            }),
        }
    }
}
