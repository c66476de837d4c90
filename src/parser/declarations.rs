//! Declaration parsing implementation
//!
//! This module handles the declarations reflection needs:
//!
//! - Record definitions: `struct Name { ... };`, `union Name { ... };`
//! - Enum definitions: `enum Name { A, B = 2 };`
//! - Typedefs, including `typedef struct { ... } Name;`
//! - Declaration specifiers, declarators (pointers, arrays, function
//!   pointers, bit-fields) and GNU attributes
//!
//! # Grammar
//!
//! ```text
//! external_decl ::= typedef_decl | tag_decl | <skipped>
//! tag_decl      ::= specifiers [declarators | function_body] ";"
//! specifiers    ::= (qualifier | storage | type_keyword | tag_spec | typedef_name | attribute)+
//! tag_spec      ::= ("struct" | "union" | "enum") attribute* [identifier] attribute* ["{" body "}"]
//! declarator    ::= "*"* (identifier | "(" "*"* identifier array* ")" params) array*
//! attribute     ::= "__attribute__" "((" item ("," item)* "))" | marker_macro ["()"]
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

/// Result of parsing a declaration-specifier sequence
pub(crate) struct Specifiers {
    pub ty: Type,
    /// Record or enum defined inline by these specifiers
    pub defined: Option<DeclId>,
    /// Attributes with no inline definition to attach to
    pub attributes: Vec<Attribute>,
}

/// Type keywords seen in one specifier sequence
#[derive(Default)]
struct TypeKeywords {
    signed: u8,
    unsigned: u8,
    short: u8,
    long: u8,
    int: u8,
    char: u8,
    float: u8,
    double: u8,
    void: u8,
    bool: u8,
}

impl TypeKeywords {
    fn is_empty(&self) -> bool {
        self.signed
            + self.unsigned
            + self.short
            + self.long
            + self.int
            + self.char
            + self.float
            + self.double
            + self.void
            + self.bool
            == 0
    }

    /// Fold the keyword multiset into a single base type
    fn combine(&self) -> Option<BaseType> {
        if self.signed + self.unsigned > 1 || self.int > 1 || self.short > 1 {
            return None;
        }
        let unsigned = self.unsigned == 1;
        let sign = self.signed + self.unsigned;
        let others = |n: u8| n == 0;

        if self.float == 1 {
            return (self.float == self.count()).then_some(BaseType::Float);
        }
        if self.double == 1 {
            return match (self.long, self.count()) {
                (0, 1) => Some(BaseType::Double),
                (1, 2) => Some(BaseType::LongDouble),
                _ => None,
            };
        }
        if self.void == 1 {
            return (self.count() == 1).then_some(BaseType::Void);
        }
        if self.bool == 1 {
            return (self.count() == 1).then_some(BaseType::Bool);
        }
        if self.char == 1 {
            if !(others(self.short) && others(self.long) && others(self.int)) {
                return None;
            }
            return Some(match (self.signed, self.unsigned) {
                (1, _) => BaseType::SignedChar,
                (_, 1) => BaseType::UnsignedChar,
                _ => BaseType::Char,
            });
        }
        if self.char + self.float + self.double + self.void + self.bool > 0 {
            return None;
        }
        match (self.short, self.long) {
            (1, 0) => Some(BaseType::Short { unsigned }),
            (0, 1) => Some(BaseType::Long { unsigned }),
            (0, 2) => Some(BaseType::LongLong { unsigned }),
            (0, 0) if self.int == 1 || sign == 1 => Some(BaseType::Int { unsigned }),
            _ => None,
        }
    }

    fn count(&self) -> u8 {
        self.signed
            + self.unsigned
            + self.short
            + self.long
            + self.int
            + self.char
            + self.float
            + self.double
            + self.void
            + self.bool
    }
}

impl Parser {
    /// Parse one top-level declaration, or skip it if it declares no tag
    pub(crate) fn parse_external_declaration(&mut self) -> Result<(), ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::Semicolon(loc)) {
            self.warn("extra ';' outside of a function", loc);
            return Ok(());
        }

        // extern "C" { ... } wraps declarations without changing them
        if self.check(&Token::Extern(loc))
            && matches!(self.peek_ahead(1), Some(Token::StringLiteral(_, _)))
            && matches!(self.peek_ahead(2), Some(Token::LBrace(_)))
        {
            self.position += 3;
            self.linkage_depth += 1;
            return Ok(());
        }
        if self.linkage_depth > 0 && self.match_token(&Token::RBrace(loc)) {
            self.linkage_depth -= 1;
            return Ok(());
        }

        if self.match_token(&Token::Typedef(loc)) {
            return self.parse_typedef();
        }

        if !self.declares_tag() {
            return self.skip_declaration();
        }

        let specs = self.parse_declaration_specifiers(None)?;
        if self.match_token(&Token::Semicolon(self.current_location())) {
            if specs.defined.is_none() {
                if let BaseType::Record {
                    kind,
                    name: Some(name),
                } = specs.ty.base
                {
                    self.unit.push(
                        DeclKind::Record(RecordDecl {
                            kind,
                            name: Some(name),
                            fields: None,
                            attributes: specs.attributes,
                            named_by_typedef: false,
                        }),
                        loc,
                        None,
                    );
                }
            }
            return Ok(());
        }

        // Variables of the tag type, or a function returning it
        self.skip_declaration()
    }

    /// Look ahead for a struct/union/enum keyword before the declarator starts
    fn declares_tag(&self) -> bool {
        let mut i = self.position;
        while let Some(token) = self.tokens.get(i) {
            match token {
                Token::Struct(_) | Token::Union(_) | Token::Enum(_) => return true,
                Token::Attribute(_) => match self.matching_close(i + 1) {
                    Some(close) => i = close + 1,
                    None => return false,
                },
                Token::Ident(name, _)
                    if self.is_marker_macro(name)
                        && matches!(self.tokens.get(i + 1), Some(Token::LParen(_))) =>
                {
                    match self.matching_close(i + 1) {
                        Some(close) => i = close + 1,
                        None => return false,
                    }
                }
                Token::Semicolon(_)
                | Token::LBrace(_)
                | Token::LParen(_)
                | Token::LBracket(_)
                | Token::Eq(_)
                | Token::Comma(_)
                | Token::Eof(_) => return false,
                _ => i += 1,
            }
        }
        false
    }

    /// Skip a declaration reflection has no use for: up to and including its
    /// terminating ';', or through the closing brace of a function body
    pub(crate) fn skip_declaration(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Token::Semicolon(_) => {
                    self.advance();
                    return Ok(());
                }
                Token::LBrace(_) => {
                    let is_body = matches!(self.previous(), Token::RParen(_));
                    self.skip_balanced()?;
                    if is_body {
                        return Ok(());
                    }
                }
                Token::LParen(_) | Token::LBracket(_) => self.skip_balanced()?,
                Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) => {
                    return Err(self.error_here("Unexpected closing delimiter"));
                }
                Token::Eof(_) => {
                    return Err(self.error_here("Expected ';' at end of declaration"));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse `typedef specifiers declarator (, declarator)* ;`
    pub(crate) fn parse_typedef(&mut self) -> Result<(), ParseError> {
        let mut specs = self.parse_declaration_specifiers(None)?;
        let anonymous_tag = specs
            .defined
            .filter(|&id| self.unit.decl(id).spelling().is_none());
        let mut first = true;

        loop {
            let (name, mut target, loc) = self.parse_declarator(specs.ty.clone())?;
            let name = name.ok_or_else(|| ParseError {
                message: "Expected identifier in typedef".to_string(),
                location: loc,
            })?;

            // `typedef struct { ... } Name;` gives the record the typedef's name
            if first {
                if let Some(id) = anonymous_tag.filter(|_| target.is_scalar_value()) {
                    self.name_anonymous_tag(id, &name, loc);
                    rename_tag(&mut specs.ty.base, &name);
                    rename_tag(&mut target.base, &name);
                }
            }
            first = false;

            self.unit.push(
                DeclKind::Typedef(TypedefDecl { name, target }),
                loc,
                None,
            );

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_semicolon("after typedef")
    }

    fn name_anonymous_tag(&mut self, id: DeclId, name: &str, loc: SourceLocation) {
        if let Some(previous) = self.tag_definitions.get(name).copied() {
            self.report_error(
                format!(
                    "typedef '{}' names an anonymous type but '{}' is already defined at {}",
                    name, name, previous
                ),
                loc,
            );
            return;
        }
        self.tag_definitions.insert(name.to_string(), loc);

        match &mut self.unit.decl_mut(id).kind {
            DeclKind::Record(r) => {
                r.name = Some(name.to_string());
                r.named_by_typedef = true;
            }
            DeclKind::Enum(e) => e.name = Some(name.to_string()),
            DeclKind::Typedef(_) => {}
        }
    }

    /// Parse declaration specifiers: qualifiers, storage classes, type
    /// keywords, at most one tag specifier or typedef name, and attributes.
    pub(crate) fn parse_declaration_specifiers(
        &mut self,
        parent: Option<DeclId>,
    ) -> Result<Specifiers, ParseError> {
        let start = self.current_location();
        let mut keywords = TypeKeywords::default();
        let mut tagged: Option<(BaseType, Option<DeclId>)> = None;
        let mut typedef_name: Option<(String, SourceLocation)> = None;
        let mut is_const = false;
        let mut attributes = Vec::new();

        loop {
            let loc = self.current_location();
            match self.peek_token() {
                Token::Const(_) => is_const = true,
                Token::Volatile(_)
                | Token::Restrict(_)
                | Token::Static(_)
                | Token::Extern(_)
                | Token::Inline(_)
                | Token::Register(_) => {}
                Token::Attribute(_) => {
                    attributes.extend(self.parse_gnu_attribute()?);
                    continue;
                }
                Token::Ident(name, _) if self.is_marker_macro(&name) => {
                    attributes.push(self.parse_marker_macro());
                    continue;
                }
                Token::Signed(_) => keywords.signed += 1,
                Token::Unsigned(_) => keywords.unsigned += 1,
                Token::Short(_) => keywords.short += 1,
                Token::Long(_) => keywords.long += 1,
                Token::Int(_) => keywords.int += 1,
                Token::Char(_) => keywords.char += 1,
                Token::Float(_) => keywords.float += 1,
                Token::Double(_) => keywords.double += 1,
                Token::Void(_) => keywords.void += 1,
                Token::Bool(_) => keywords.bool += 1,
                token @ (Token::Struct(_) | Token::Union(_) | Token::Enum(_)) => {
                    if tagged.is_some() || !keywords.is_empty() {
                        return Err(ParseError {
                            message: format!("Cannot combine {} with previous type specifier", token),
                            location: loc,
                        });
                    }
                    self.advance();
                    let (base, defined, leftover) = self.parse_tag_specifier(&token, parent)?;
                    attributes.extend(leftover);
                    tagged = Some((base, defined));
                    continue;
                }
                Token::Ident(name, _)
                    if tagged.is_none() && typedef_name.is_none() && keywords.is_empty() =>
                {
                    typedef_name = Some((name, loc));
                }
                _ => break,
            }
            self.advance();
        }

        // A leading identifier next to a real type specifier is an unexpanded macro.
        if tagged.is_some() || !keywords.is_empty() {
            if let Some((name, loc)) = typedef_name.take() {
                self.warn(format!("ignoring unknown specifier '{}'", name), loc);
            }
        }

        let (base, defined) = if let Some((base, defined)) = tagged {
            (base, defined)
        } else if let Some((name, _)) = typedef_name {
            (BaseType::Typedef(name), None)
        } else if keywords.is_empty() {
            return Err(self.error_here("Expected type specifier"));
        } else {
            let base = keywords.combine().ok_or_else(|| ParseError {
                message: "Invalid combination of type specifiers".to_string(),
                location: start,
            })?;
            (base, None)
        };

        if let Some(id) = defined {
            self.attach_attributes(id, std::mem::take(&mut attributes));
        }

        let mut ty = Type::new(base);
        ty.is_const = is_const;
        Ok(Specifiers {
            ty,
            defined,
            attributes,
        })
    }

    fn attach_attributes(&mut self, id: DeclId, attributes: Vec<Attribute>) {
        match &mut self.unit.decl_mut(id).kind {
            DeclKind::Record(r) => r.attributes.extend(attributes),
            DeclKind::Enum(e) => e.attributes.extend(attributes),
            DeclKind::Typedef(_) => {}
        }
    }

    /// Parse the rest of `struct|union|enum [name] [{ body }]`; the keyword
    /// has been consumed. Without a body the attributes are handed back.
    fn parse_tag_specifier(
        &mut self,
        keyword: &Token,
        parent: Option<DeclId>,
    ) -> Result<(BaseType, Option<DeclId>, Vec<Attribute>), ParseError> {
        let loc = self.previous_location();
        let mut attributes = self.parse_attributes()?;
        let name = self.match_identifier();
        attributes.extend(self.parse_attributes()?);

        let record_kind = match keyword {
            Token::Union(_) => Some(RecordKind::Union),
            Token::Enum(_) => None,
            _ => Some(RecordKind::Struct),
        };

        if !self.match_token(&Token::LBrace(self.current_location())) {
            let Some(name) = name else {
                return Err(self.error_here(format!("Expected identifier or '{{' after {}", keyword)));
            };
            let base = match record_kind {
                Some(kind) => BaseType::Record {
                    kind,
                    name: Some(name),
                },
                None => BaseType::Enum(Some(name)),
            };
            return Ok((base, None, attributes));
        }

        if let Some(name) = &name {
            self.register_tag_definition(name, loc);
        }

        let (base, defined) = match record_kind {
            Some(kind) => self.parse_record_body(kind, name, attributes, loc, parent)?,
            None => self.parse_enum_body(name, attributes, loc, parent)?,
        };
        Ok((base, defined, Vec::new()))
    }

    fn register_tag_definition(&mut self, name: &str, loc: SourceLocation) {
        if let Some(previous) = self.tag_definitions.get(name).copied() {
            self.report_error(
                format!("redefinition of '{}' (previous definition at {})", name, previous),
                loc,
            );
        } else {
            self.tag_definitions.insert(name.to_string(), loc);
        }
    }

    /// Parse record members up to and including the closing '}'
    fn parse_record_body(
        &mut self,
        kind: RecordKind,
        name: Option<String>,
        attributes: Vec<Attribute>,
        loc: SourceLocation,
        parent: Option<DeclId>,
    ) -> Result<(BaseType, Option<DeclId>), ParseError> {
        // Pushed before the members so nested records become its children.
        let id = self.unit.push(
            DeclKind::Record(RecordDecl {
                kind,
                name: name.clone(),
                fields: None,
                attributes,
                named_by_typedef: false,
            }),
            loc,
            parent,
        );

        let mut fields = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            self.parse_member_declaration(id, &mut fields)?;
        }
        self.expect_rbrace(&format!("after {} members", kind.keyword()))?;
        let trailing = self.parse_attributes()?;

        if fields.is_empty() && kind == RecordKind::Struct {
            self.warn("empty struct is a GNU extension", loc);
        }

        if let DeclKind::Record(r) = &mut self.unit.decl_mut(id).kind {
            r.fields = Some(fields);
            r.attributes.extend(trailing);
        }

        Ok((BaseType::Record { kind, name }, Some(id)))
    }

    /// Parse one member declaration, which may declare several fields
    fn parse_member_declaration(
        &mut self,
        record: DeclId,
        fields: &mut Vec<Field>,
    ) -> Result<(), ParseError> {
        let loc = self.current_location();
        if self.match_token(&Token::Semicolon(loc)) {
            self.warn("extra ';' inside a struct", loc);
            return Ok(());
        }

        let specs = self.parse_declaration_specifiers(Some(record))?;

        // Nested definition or anonymous member without a declarator
        if self.match_token(&Token::Semicolon(self.current_location())) {
            return Ok(());
        }

        loop {
            let (name, field_type, loc) = self.parse_declarator(specs.ty.clone())?;

            let is_bit_field = self.match_token(&Token::Colon(self.current_location()));
            if is_bit_field {
                self.skip_constant_expression()?;
            }
            self.parse_attributes()?;

            match name {
                Some(name) => {
                    if fields.iter().any(|f| f.name == name) {
                        self.report_error(format!("duplicate member '{}'", name), loc);
                    } else {
                        fields.push(Field {
                            name,
                            field_type,
                            is_bit_field,
                            location: loc,
                        });
                    }
                }
                // Unnamed bit-field used as padding
                None if is_bit_field => {}
                None => return Err(self.error_here("Expected member name")),
            }

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_semicolon("after struct member")
    }

    /// Parse enumerators up to and including the closing '}'
    fn parse_enum_body(
        &mut self,
        name: Option<String>,
        mut attributes: Vec<Attribute>,
        loc: SourceLocation,
        parent: Option<DeclId>,
    ) -> Result<(BaseType, Option<DeclId>), ParseError> {
        let mut enumerators = Vec::new();

        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            enumerators.push(self.expect_identifier()?);
            self.parse_attributes()?;
            if self.match_token(&Token::Eq(self.current_location())) {
                self.skip_constant_expression()?;
            }
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_rbrace("after enumerators")?;
        attributes.extend(self.parse_attributes()?);

        let id = self.unit.push(
            DeclKind::Enum(EnumDecl {
                name: name.clone(),
                enumerators,
                attributes,
            }),
            loc,
            parent,
        );

        Ok((BaseType::Enum(name), Some(id)))
    }

    /// Parse a declarator around `base`; the name is optional so abstract
    /// and unnamed bit-field declarators are accepted
    pub(crate) fn parse_declarator(
        &mut self,
        base: Type,
    ) -> Result<(Option<String>, Type, SourceLocation), ParseError> {
        let mut ty = base;
        ty.pointer_depth += self.parse_pointers();

        if self.match_token(&Token::LParen(self.current_location())) {
            let inner_pointers = self.parse_pointers();
            let loc = self.current_location();
            let name = self.match_identifier();
            let dims = self.parse_array_suffixes()?;
            self.expect_rparen("in declarator")?;

            if self.check(&Token::LParen(self.current_location())) {
                self.skip_balanced()?; // parameter list
                let mut function = Type::new(BaseType::Function(Box::new(ty)));
                function.pointer_depth = inner_pointers;
                function.array_dims = dims;
                return Ok((name, function, loc));
            }

            ty.pointer_depth += inner_pointers;
            ty.array_dims.extend(dims);
            return Ok((name, ty, loc));
        }

        let loc = self.current_location();
        let name = self.match_identifier();
        let dims = self.parse_array_suffixes()?;
        ty.array_dims.extend(dims);

        if self.check(&Token::LParen(self.current_location())) {
            self.skip_balanced()?;
            ty = Type::new(BaseType::Function(Box::new(ty)));
        }

        Ok((name, ty, loc))
    }

    /// Count `*` tokens, skipping qualifiers that follow each one
    fn parse_pointers(&mut self) -> usize {
        let mut depth = 0;
        while self.match_token(&Token::Star(self.current_location())) {
            depth += 1;
            while matches!(
                self.peek(),
                Token::Const(_) | Token::Volatile(_) | Token::Restrict(_)
            ) {
                self.advance();
            }
        }
        depth
    }

    /// Parse `[N]` suffixes; sizes that are not plain integer literals are `None`
    fn parse_array_suffixes(&mut self) -> Result<Vec<Option<usize>>, ParseError> {
        let mut dims = Vec::new();
        while self.check(&Token::LBracket(self.current_location())) {
            let size = match (self.peek_ahead(1), self.peek_ahead(2)) {
                (Some(Token::Number(text, _)), Some(Token::RBracket(_))) => parse_int_literal(text),
                _ => None,
            };
            self.skip_balanced()?;
            dims.push(size);
        }
        Ok(dims)
    }

    /// Skip an expression up to a ',' ';' '}' or ')' at nesting depth zero
    fn skip_constant_expression(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Token::Comma(_) | Token::Semicolon(_) | Token::RBrace(_) | Token::RParen(_) => {
                    return Ok(());
                }
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => self.skip_balanced()?,
                Token::Eof(_) => return Err(self.error_here("Unexpected end of expression")),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse any run of GNU attributes and marker macros
    pub(crate) fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            match self.peek_token() {
                Token::Attribute(_) => attributes.extend(self.parse_gnu_attribute()?),
                Token::Ident(name, _) if self.is_marker_macro(&name) => {
                    attributes.push(self.parse_marker_macro());
                }
                _ => return Ok(attributes),
            }
        }
    }

    /// Parse `__attribute__((item, item(args), ...))`
    fn parse_gnu_attribute(&mut self) -> Result<Vec<Attribute>, ParseError> {
        self.advance(); // consume '__attribute__'
        self.expect_lparen("after '__attribute__'")?;
        self.expect_lparen("after '__attribute__('")?;

        let mut attributes = Vec::new();
        while !self.check(&Token::RParen(self.current_location())) {
            let name = match self.peek_token() {
                Token::Ident(name, _) => name,
                Token::Const(_) => "const".to_string(),
                _ => return Err(self.error_here("Expected attribute name")),
            };
            self.advance();

            let args_start = self.position + 1;
            let has_args = self.check(&Token::LParen(self.current_location()));
            if has_args {
                self.skip_balanced()?;
            }

            let attribute = if matches!(name.as_str(), "annotate" | "__annotate__") && has_args {
                let value: String = self.tokens[args_start..self.position - 1]
                    .iter()
                    .map_while(|t| match t {
                        Token::StringLiteral(s, _) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                Attribute::Annotate(value)
            } else {
                Attribute::Other(name)
            };
            attributes.push(attribute);

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_rparen("to close attribute list")?;
        self.expect_rparen("to close '__attribute__'")?;
        Ok(attributes)
    }

    /// Consume the marker macro, with an optional empty argument list
    fn parse_marker_macro(&mut self) -> Attribute {
        let name = match self.peek_token() {
            Token::Ident(name, _) => name,
            _ => String::new(),
        };
        self.advance();
        if self.check(&Token::LParen(self.current_location()))
            && matches!(self.peek_ahead(1), Some(Token::RParen(_)))
        {
            self.position += 2;
        }
        Attribute::MarkerMacro(name)
    }
}

fn rename_tag(base: &mut BaseType, new_name: &str) {
    match base {
        BaseType::Record { name, .. } => *name = Some(new_name.to_string()),
        BaseType::Enum(name) => *name = Some(new_name.to_string()),
        _ => {}
    }
}

/// Decimal, octal or hex integer literal with optional `u`/`l` suffixes
fn parse_int_literal(text: &str) -> Option<usize> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        usize::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        usize::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::diagnostic::Severity;
    use crate::parser::parse::ParserOptions;

    fn parse_ok(source: &str) -> (TranslationUnit, Vec<crate::frontend::diagnostic::Diagnostic>) {
        let mut parser = Parser::new(source, "test.c", ParserOptions::default()).unwrap();
        let unit = parser.parse_translation_unit().unwrap();
        (unit, parser.take_diagnostics())
    }

    fn record<'a>(unit: &'a TranslationUnit, name: &str) -> &'a RecordDecl {
        unit.cursors()
            .find_map(|c| match c.kind() {
                DeclKind::Record(r) if r.name.as_deref() == Some(name) => Some(r),
                _ => None,
            })
            .unwrap_or_else(|| panic!("record {name} not found"))
    }

    fn field_types(record: &RecordDecl) -> Vec<(String, String)> {
        record
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.field_type.to_string()))
            .collect()
    }

    #[test]
    fn test_specifier_combinations() {
        let (unit, _) = parse_ok(
            "struct S { unsigned a; long int b; unsigned long long c; short int d; \
             signed char e; long double f; const char *g; };",
        );
        let types: Vec<_> = field_types(record(&unit, "S"))
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(
            types,
            vec![
                "unsigned int",
                "long",
                "unsigned long long",
                "short",
                "signed char",
                "long double",
                "const char *",
            ]
        );
    }

    #[test]
    fn test_invalid_specifier_combination() {
        let mut parser =
            Parser::new("struct S { float int x; };", "t.c", ParserOptions::default()).unwrap();
        let err = parser.parse_translation_unit().unwrap_err();
        assert!(err.message.contains("Invalid combination"), "{}", err);
    }

    #[test]
    fn test_multiple_declarators_and_bit_fields() {
        let (unit, _) = parse_ok("struct P { float x, y, *z; unsigned flags : 3, : 5; };");
        assert_eq!(
            field_types(record(&unit, "P")),
            vec![
                ("x".to_string(), "float".to_string()),
                ("y".to_string(), "float".to_string()),
                ("z".to_string(), "float *".to_string()),
                ("flags".to_string(), "unsigned int".to_string()),
            ]
        );
        assert!(record(&unit, "P").fields()[3].is_bit_field);
    }

    #[test]
    fn test_function_pointer_and_array_members() {
        let (unit, _) = parse_ok("struct H { int (*on_event)(int, void *); float m[4][4]; char name[N]; };");
        assert_eq!(
            field_types(record(&unit, "H")),
            vec![
                ("on_event".to_string(), "int (*)()".to_string()),
                ("m".to_string(), "float [4][4]".to_string()),
                ("name".to_string(), "char []".to_string()),
            ]
        );
    }

    #[test]
    fn test_anonymous_typedef_struct_takes_typedef_name() {
        let (unit, _) = parse_ok("typedef struct { float x; } Vec2, *Vec2Ptr;");
        assert!(record(&unit, "Vec2").is_definition());
        assert!(record(&unit, "Vec2").named_by_typedef);

        let typedefs: Vec<_> = unit
            .cursors()
            .filter_map(|c| match c.kind() {
                DeclKind::Typedef(t) => Some((t.name.clone(), t.target.to_string())),
                _ => None,
            })
            .collect();
        assert_eq!(
            typedefs,
            vec![
                ("Vec2".to_string(), "struct Vec2".to_string()),
                ("Vec2Ptr".to_string(), "struct Vec2 *".to_string()),
            ]
        );
    }

    #[test]
    fn test_tagged_typedef_keeps_its_tag() {
        let (unit, _) = parse_ok("typedef struct Tagged { int a; } Tagged;");
        assert!(!record(&unit, "Tagged").named_by_typedef);
    }

    #[test]
    fn test_typedef_function_pointer() {
        let (unit, _) = parse_ok("typedef void (*handler_t)(int);");
        match unit.cursors().next().map(|c| c.kind()) {
            Some(DeclKind::Typedef(t)) => {
                assert_eq!(t.name, "handler_t");
                assert_eq!(t.target.to_string(), "void (*)()");
            }
            other => panic!("Expected typedef, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_macro_and_annotate_attribute() {
        let source = r#"
            struct CINSPECT_STRUCT A { int a; };
            typedef struct __attribute__((packed, annotate("generate_cinspect"))) { int b; } B;
            CINSPECT_STRUCT struct C { int c; };
            struct D { int d; } __attribute__((aligned(8)));
        "#;
        let (unit, diagnostics) = parse_ok(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        assert_eq!(
            record(&unit, "A").attributes,
            vec![Attribute::MarkerMacro("CINSPECT_STRUCT".into())]
        );
        assert_eq!(
            record(&unit, "B").attributes,
            vec![
                Attribute::Other("packed".into()),
                Attribute::Annotate("generate_cinspect".into()),
            ]
        );
        assert_eq!(
            record(&unit, "C").attributes,
            vec![Attribute::MarkerMacro("CINSPECT_STRUCT".into())]
        );
        assert_eq!(
            record(&unit, "D").attributes,
            vec![Attribute::Other("aligned".into())]
        );
    }

    #[test]
    fn test_forward_declaration_keeps_marker() {
        let (unit, diagnostics) = parse_ok("struct CINSPECT_STRUCT Later;\nstruct Later { int a; };");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        let records: Vec<_> = unit
            .cursors()
            .filter_map(|c| match c.kind() {
                DeclKind::Record(r) => Some((r.is_definition(), r.attributes.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            records,
            vec![
                (false, vec![Attribute::MarkerMacro("CINSPECT_STRUCT".into())]),
                (true, vec![]),
            ]
        );
    }

    #[test]
    fn test_enum_definition() {
        let (unit, _) = parse_ok("enum Color { RED, GREEN = 1 << 2, BLUE, };");
        match unit.cursors().next().map(|c| c.kind()) {
            Some(DeclKind::Enum(e)) => {
                assert_eq!(e.name.as_deref(), Some("Color"));
                assert_eq!(e.enumerators, vec!["RED", "GREEN", "BLUE"]);
            }
            other => panic!("Expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_member_and_redefinition_are_errors() {
        let (_, diagnostics) = parse_ok("struct A { int x; float x; };\nstruct A { int y; };");
        let errors: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("duplicate member 'x'"));
        assert!(errors[1].contains("redefinition of 'A'"));
    }

    #[test]
    fn test_empty_struct_warns() {
        let (unit, diagnostics) = parse_ok("struct Empty {};");
        assert!(record(&unit, "Empty").fields().is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("empty struct"));
    }

    #[test]
    fn test_unknown_macro_before_specifier_is_ignored() {
        let (unit, diagnostics) = parse_ok("EXPORT struct A { int a; };");
        assert!(record(&unit, "A").is_definition());
        assert!(diagnostics[0].message.contains("ignoring unknown specifier 'EXPORT'"));
    }

    #[test]
    fn test_parse_int_literal() {
        assert_eq!(parse_int_literal("16"), Some(16));
        assert_eq!(parse_int_literal("0x10u"), Some(16));
        assert_eq!(parse_int_literal("020"), Some(16));
        assert_eq!(parse_int_literal("0"), Some(0));
        assert_eq!(parse_int_literal("1e3"), None);
    }
}
