//! C declaration parser
//!
//! This module turns C source text into a declaration-level syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: The [`parse::Parser`] and its helpers (tokens → tree)
//! - [`ast`]: Declaration node definitions
//! - [`cursor`]: Pre-order traversal over a parsed unit
//!
//! # Supported C Subset
//!
//! Only what reflection needs is parsed:
//! - `struct`/`union` definitions and forward declarations, `enum`s, `typedef`s
//! - Members with pointers, arrays, bit-fields and function pointers
//! - GNU `__attribute__` lists and the reflection marker macro
//!
//! Function bodies, prototypes, globals and initializers are skipped.
//! Preprocessor lines are dropped by the lexer; nothing is expanded.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser. No external parser generator dependencies.

pub mod ast;
pub mod cursor;
mod declarations;
pub mod lexer;
pub mod parse;
