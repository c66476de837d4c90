//! Lexer (tokenizer) for C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Preprocessor directives (including backslash-continued lines) are skipped
//! rather than evaluated. Numeric literals are kept as raw preprocessing-number
//! text since the declaration parser never needs their value beyond array sizes.

use super::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(String, SourceLocation),
    CharLiteral(String, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Struct(SourceLocation),
    Union(SourceLocation),
    Enum(SourceLocation),
    Typedef(SourceLocation),
    Const(SourceLocation),
    Volatile(SourceLocation),
    Restrict(SourceLocation),
    Signed(SourceLocation),
    Unsigned(SourceLocation),
    Short(SourceLocation),
    Long(SourceLocation),
    Int(SourceLocation),
    Char(SourceLocation),
    Float(SourceLocation),
    Double(SourceLocation),
    Void(SourceLocation),
    Bool(SourceLocation),
    Static(SourceLocation),
    Extern(SourceLocation),
    Inline(SourceLocation),
    Register(SourceLocation),
    Attribute(SourceLocation), // __attribute__

    // Punctuation the declaration grammar inspects
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,
    Star(SourceLocation),      // *
    Eq(SourceLocation),        // =
    Colon(SourceLocation),     // :

    // Every other operator, kept only so it can be skipped
    Punct(&'static str, SourceLocation),

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Number(_, loc)
            | Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Punct(_, loc) => *loc,
            Token::Struct(loc)
            | Token::Union(loc)
            | Token::Enum(loc)
            | Token::Typedef(loc)
            | Token::Const(loc)
            | Token::Volatile(loc)
            | Token::Restrict(loc)
            | Token::Signed(loc)
            | Token::Unsigned(loc)
            | Token::Short(loc)
            | Token::Long(loc)
            | Token::Int(loc)
            | Token::Char(loc)
            | Token::Float(loc)
            | Token::Double(loc)
            | Token::Void(loc)
            | Token::Bool(loc)
            | Token::Static(loc)
            | Token::Extern(loc)
            | Token::Inline(loc)
            | Token::Register(loc)
            | Token::Attribute(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Star(loc)
            | Token::Eq(loc)
            | Token::Colon(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n, _) => write!(f, "number {}", n),
            Token::CharLiteral(c, _) => write!(f, "char literal '{}'", c),
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Struct(_) => write!(f, "'struct'"),
            Token::Union(_) => write!(f, "'union'"),
            Token::Enum(_) => write!(f, "'enum'"),
            Token::Typedef(_) => write!(f, "'typedef'"),
            Token::Const(_) => write!(f, "'const'"),
            Token::Volatile(_) => write!(f, "'volatile'"),
            Token::Restrict(_) => write!(f, "'restrict'"),
            Token::Signed(_) => write!(f, "'signed'"),
            Token::Unsigned(_) => write!(f, "'unsigned'"),
            Token::Short(_) => write!(f, "'short'"),
            Token::Long(_) => write!(f, "'long'"),
            Token::Int(_) => write!(f, "'int'"),
            Token::Char(_) => write!(f, "'char'"),
            Token::Float(_) => write!(f, "'float'"),
            Token::Double(_) => write!(f, "'double'"),
            Token::Void(_) => write!(f, "'void'"),
            Token::Bool(_) => write!(f, "'_Bool'"),
            Token::Static(_) => write!(f, "'static'"),
            Token::Extern(_) => write!(f, "'extern'"),
            Token::Inline(_) => write!(f, "'inline'"),
            Token::Register(_) => write!(f, "'register'"),
            Token::Attribute(_) => write!(f, "'__attribute__'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Punct(p, _) => write!(f, "'{}'", p),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("{location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Multi-character operators, longest first so the scan is greedy
const MULTI_PUNCT: &[&str] = &[
    "<<=", ">>=", "...", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "##",
];

const SINGLE_PUNCT: &[&str] = &[
    "+", "-", "/", "%", "<", ">", "!", "&", "|", "^", "~", ".", "?", "#",
];

/// Lexer for C source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            if self.at_line_start && self.peek() == Some('#') {
                self.skip_preprocessor_directive();
                continue;
            }

            self.at_line_start = false;
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.peek().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        if ch.is_ascii_digit()
            || (ch == '.' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return Ok(self.number_literal(loc));
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.identifier_or_keyword(loc);
        }

        let simple = match ch {
            '(' => Some(Token::LParen(loc)),
            ')' => Some(Token::RParen(loc)),
            '{' => Some(Token::LBrace(loc)),
            '}' => Some(Token::RBrace(loc)),
            '[' => Some(Token::LBracket(loc)),
            ']' => Some(Token::RBracket(loc)),
            ';' => Some(Token::Semicolon(loc)),
            ',' => Some(Token::Comma(loc)),
            ':' => Some(Token::Colon(loc)),
            '*' if self.peek_ahead(1) != Some('=') => Some(Token::Star(loc)),
            '=' if self.peek_ahead(1) != Some('=') => Some(Token::Eq(loc)),
            _ => None,
        };
        if let Some(token) = simple {
            self.advance();
            return Ok(token);
        }

        match ch {
            '"' => {
                self.advance();
                self.string_literal(loc)
            }
            '\'' => {
                self.advance();
                self.char_literal(loc)
            }
            _ => self.punct(loc),
        }
    }

    /// Operators the declaration grammar never inspects
    fn punct(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        for &op in MULTI_PUNCT.iter().chain(SINGLE_PUNCT) {
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_ahead(i) == Some(c));
            if matches {
                for _ in 0..op.len() {
                    self.advance();
                }
                return Ok(Token::Punct(op, loc));
            }
        }

        let ch = self.peek().unwrap_or('\0');
        Err(LexError {
            message: format!("Unexpected character: '{}'", ch),
            location: loc,
        })
    }

    /// Parse string literal; the opening quote has been consumed
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let text = self.quoted_body('"', loc, "string")?;
        Ok(Token::StringLiteral(text, loc))
    }

    /// Parse character literal; the opening quote has been consumed
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let text = self.quoted_body('\'', loc, "character")?;
        Ok(Token::CharLiteral(text, loc))
    }

    fn quoted_body(
        &mut self,
        quote: char,
        loc: SourceLocation,
        what: &str,
    ) -> Result<String, LexError> {
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance();
                return Ok(text);
            }
            if ch == '\n' {
                break;
            }

            self.advance();
            if ch == '\\' {
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: format!("Unexpected end of file in {} literal", what),
                    location: self.current_location(),
                })?;
                match escaped {
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    'r' => text.push('\r'),
                    '0' => text.push('\0'),
                    '\\' | '"' | '\'' => text.push(escaped),
                    // Octal, hex and universal escapes are kept verbatim.
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
            } else {
                text.push(ch);
            }
        }

        Err(LexError {
            message: format!("Unterminated {} literal", what),
            location: loc,
        })
    }

    /// Preprocessing number: digits, letters, '.', '_' and signed exponents
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            let exponent_sign = matches!(ch, '+' | '-')
                && text.ends_with(['e', 'E', 'p', 'P']);
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || exponent_sign {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(text, loc)
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut ident = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Encoding prefixes: L"wide", u8"utf8", U'c'
        if matches!(ident.as_str(), "L" | "u" | "U" | "u8") {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return self.string_literal(loc);
                }
                Some('\'') => {
                    self.advance();
                    return self.char_literal(loc);
                }
                _ => {}
            }
        }

        let token = match ident.as_str() {
            "struct" => Token::Struct(loc),
            "union" => Token::Union(loc),
            "enum" => Token::Enum(loc),
            "typedef" => Token::Typedef(loc),
            "const" => Token::Const(loc),
            "volatile" | "__volatile__" => Token::Volatile(loc),
            "restrict" | "__restrict" | "__restrict__" => Token::Restrict(loc),
            "signed" | "__signed__" => Token::Signed(loc),
            "unsigned" => Token::Unsigned(loc),
            "short" => Token::Short(loc),
            "long" => Token::Long(loc),
            "int" => Token::Int(loc),
            "char" => Token::Char(loc),
            "float" => Token::Float(loc),
            "double" => Token::Double(loc),
            "void" => Token::Void(loc),
            "_Bool" | "bool" => Token::Bool(loc),
            "static" => Token::Static(loc),
            "extern" => Token::Extern(loc),
            "inline" | "__inline" | "__inline__" => Token::Inline(loc),
            "register" => Token::Register(loc),
            "__attribute__" | "__attribute" => Token::Attribute(loc),
            _ => Token::Ident(ident, loc),
        };

        Ok(token)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.advance();
                    self.at_line_start = true;
                }
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.advance();
                }
                // Line splice outside a directive
                Some('\\') if matches!(self.peek_ahead(1), Some('\n')) => {
                    self.advance();
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...), leaving the newline in place
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Skip a preprocessor directive, following backslash continuations
    fn skip_preprocessor_directive(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\\' && self.peek_ahead(1) == Some('\n') {
                self.advance();
                self.advance();
                continue;
            }
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
