//! Pull-style traversal over a [`TranslationUnit`]
//!
//! [`TranslationUnit::cursors`] yields every declaration in pre-order:
//! each top-level declaration, followed by the records declared inside it,
//! in source order.

use crate::parser::ast::{Attribute, Decl, DeclId, DeclKind, SourceLocation, TranslationUnit};

/// A read-only handle to one declaration
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    unit: &'a TranslationUnit,
    id: DeclId,
}

impl<'a> Cursor<'a> {
    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn decl(&self) -> &'a Decl {
        self.unit.decl(self.id)
    }

    pub fn kind(&self) -> &'a DeclKind {
        &self.decl().kind
    }

    pub fn spelling(&self) -> Option<&'a str> {
        self.decl().spelling()
    }

    pub fn location(&self) -> SourceLocation {
        self.decl().location
    }

    pub fn attributes(&self) -> &'a [Attribute] {
        self.decl().attributes()
    }

    pub fn parent(&self) -> Option<Cursor<'a>> {
        self.decl().parent.map(|id| Cursor {
            unit: self.unit,
            id,
        })
    }
}

/// Pre-order iterator over all declarations of a unit
pub struct Cursors<'a> {
    unit: &'a TranslationUnit,
    stack: Vec<DeclId>,
}

impl<'a> Iterator for Cursors<'a> {
    type Item = Cursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.unit.decl(id).children.iter().rev().copied());
        Some(Cursor {
            unit: self.unit,
            id,
        })
    }
}

impl TranslationUnit {
    pub fn cursors(&self) -> Cursors<'_> {
        Cursors {
            unit: self,
            stack: self.roots().iter().rev().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse::{Parser, ParserOptions};

    #[test]
    fn test_preorder_visits_nested_records_after_parent() {
        let source = r#"
            struct Outer {
                struct Inner { int a; } inner;
                int b;
            };
            enum Color { RED };
            struct Last { int c; };
        "#;
        let mut parser = Parser::new(source, "t.c", ParserOptions::default()).unwrap();
        let unit = parser.parse_translation_unit().unwrap();

        let names: Vec<_> = unit.cursors().filter_map(|c| c.spelling()).collect();
        assert_eq!(names, vec!["Outer", "Inner", "Color", "Last"]);

        let inner = unit
            .cursors()
            .find(|c| c.spelling() == Some("Inner"))
            .unwrap();
        assert_eq!(inner.parent().and_then(|p| p.spelling()), Some("Outer"));
    }
}
