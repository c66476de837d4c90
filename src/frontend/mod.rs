//! Parsing frontend
//!
//! The reflection core consumes syntax trees through the [`Frontend`] trait:
//! given a path it returns a [`ParsedUnit`] (tree plus non-fatal
//! diagnostics) or a [`ReflectError::ParseFailure`]. [`CFrontend`] is the
//! built-in implementation on top of [`crate::parser`].

pub mod diagnostic;

use crate::parser::ast::TranslationUnit;
use crate::parser::parse::{Parser, ParserOptions};
use crate::reflect::errors::ReflectError;
use diagnostic::Diagnostic;
use log::debug;
use std::fs;
use std::path::Path;

/// A successfully parsed translation unit
#[derive(Debug)]
pub struct ParsedUnit {
    pub unit: TranslationUnit,
    /// Warnings only; any error makes the parse a failure
    pub diagnostics: Vec<Diagnostic>,
}

pub trait Frontend: Sync {
    fn parse(&self, path: &Path) -> Result<ParsedUnit, ReflectError>;
}

/// Declaration-level C frontend
#[derive(Debug, Clone, Default)]
pub struct CFrontend {
    options: ParserOptions,
}

impl CFrontend {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Recognise `name` as the marker macro instead of a type name
    pub fn with_marker_macro(name: impl Into<String>) -> Self {
        Self::new(ParserOptions {
            marker_macro: Some(name.into()),
        })
    }

    /// Parse source text without touching the filesystem; `path` is only
    /// recorded in the unit and in errors
    pub fn parse_source(&self, path: &Path, source: &str) -> Result<ParsedUnit, ReflectError> {
        let failure = |diagnostics| ReflectError::ParseFailure {
            path: path.to_path_buf(),
            diagnostics,
        };

        let mut parser = Parser::new(source, path, self.options.clone())
            .map_err(|e| failure(vec![e.into()]))?;
        let result = parser.parse_translation_unit();
        let mut diagnostics = parser.take_diagnostics();

        let unit = match result {
            Ok(unit) => unit,
            Err(e) => {
                diagnostics.push(e.into());
                return Err(failure(diagnostics));
            }
        };
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(failure(diagnostics));
        }

        debug!(
            "{}: parsed {} declaration(s), {} warning(s)",
            path.display(),
            unit.len(),
            diagnostics.len()
        );
        Ok(ParsedUnit { unit, diagnostics })
    }
}

impl Frontend for CFrontend {
    fn parse(&self, path: &Path) -> Result<ParsedUnit, ReflectError> {
        let source = fs::read_to_string(path).map_err(|e| ReflectError::io(path, e))?;
        self.parse_source(path, &source)
    }
}
