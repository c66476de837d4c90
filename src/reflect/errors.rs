//! Error types for the reflection pipeline
//!
//! Every [`ReflectError`] is fatal for the run: nothing is committed and no
//! retry is attempted. The binary turns each variant into a distinct exit
//! status via [`ReflectError::exit_code`].

use crate::frontend::diagnostic::Diagnostic;
use crate::parser::ast::SourceLocation;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectError {
    /// The frontend could not produce a usable syntax tree
    #[error("failed to parse {}: {}", .path.display(), first_error(.diagnostics))]
    ParseFailure {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    /// A member type has no type tag
    #[error(
        "{}:{location}: field '{field}' of '{aggregate}' has unsupported type '{type_spelling}'",
        .file.display()
    )]
    UnsupportedType {
        aggregate: String,
        field: String,
        type_spelling: String,
        file: PathBuf,
        location: SourceLocation,
    },

    /// A struct-typed member refers to a struct that is not marked for reflection
    #[error(
        "{}:{location}: field '{field}' of '{aggregate}' refers to 'struct {target}', which is not marked for reflection",
        .file.display()
    )]
    UnmarkedDependency {
        aggregate: String,
        field: String,
        target: String,
        file: PathBuf,
        location: SourceLocation,
    },

    /// Nested aggregates contain each other by value
    #[error("cyclic struct dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two generated tables would define the same C symbol
    #[error("generated symbol '{symbol}' is defined for both {first} and {second}")]
    DuplicateSymbol {
        symbol: String,
        first: String,
        second: String,
    },

    /// Two inputs map to the same artifact path
    #[error(
        "{} and {} would both be written to {}",
        .first.display(),
        .second.display(),
        .path.display()
    )]
    DuplicateOutput {
        path: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize descriptors: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReflectError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ReflectError::ParseFailure { .. } => 2,
            ReflectError::UnsupportedType { .. }
            | ReflectError::UnmarkedDependency { .. }
            | ReflectError::DuplicateSymbol { .. } => 3,
            ReflectError::CyclicDependency { .. } => 4,
            ReflectError::Io { .. } | ReflectError::Serialize(_) => 5,
            ReflectError::DuplicateOutput { .. } => 64,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReflectError::Io {
            path: path.into(),
            source,
        }
    }
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    match diagnostics.iter().find(|d| d.is_error()) {
        Some(first) if errors > 1 => format!("{} (and {} more errors)", first, errors - 1),
        Some(first) => first.to_string(),
        None => "no syntax tree produced".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_names_in_order() {
        let err = ReflectError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic struct dependency: A -> B -> A");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_parse_failure_reports_first_error() {
        let err = ReflectError::ParseFailure {
            path: PathBuf::from("a.c"),
            diagnostics: vec![
                Diagnostic::warning("extra ';'", SourceLocation::new(1, 1)),
                Diagnostic::error("duplicate member 'x'", SourceLocation::new(2, 5)),
                Diagnostic::error("redefinition of 'A'", SourceLocation::new(3, 1)),
            ],
        };
        assert_eq!(
            err.to_string(),
            "failed to parse a.c: 2:5: error: duplicate member 'x' (and 1 more errors)"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = ReflectError::UnsupportedType {
            aggregate: "Handler".into(),
            field: "cb".into(),
            type_spelling: "int (*)()".into(),
            file: PathBuf::from("h.c"),
            location: SourceLocation::new(4, 9),
        };
        assert_eq!(
            err.to_string(),
            "h.c:4:9: field 'cb' of 'Handler' has unsupported type 'int (*)()'"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_duplicate_symbol_names_both_owners() {
        let err = ReflectError::DuplicateSymbol {
            symbol: "p_FooFields".into(),
            first: "the fields of 'Foo'".into(),
            second: "the summary of 'FooFields'".into(),
        };
        assert_eq!(
            err.to_string(),
            "generated symbol 'p_FooFields' is defined for both the fields of 'Foo' and the summary of 'FooFields'"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_duplicate_output_is_a_usage_error() {
        let err = ReflectError::DuplicateOutput {
            path: PathBuf::from("out/x_structinfo.c"),
            first: PathBuf::from("a/x.c"),
            second: PathBuf::from("b/x.c"),
        };
        assert_eq!(
            err.to_string(),
            "a/x.c and b/x.c would both be written to out/x_structinfo.c"
        );
        assert_eq!(err.exit_code(), 64);
    }
}
