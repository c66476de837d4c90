//! # Introduction
//!
//! cinspect reads C source, finds the structs marked for reflection and
//! generates static descriptor tables for them. Each table lists a struct's
//! fields with a type tag and, for nested structs, a pointer to the nested
//! table, so a C program can walk the shape of its own data at run time.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → Marker scan → Extractor → Emitter → C / JSON
//! ```
//!
//! 1. [`parser`] tokenises the source and builds a declaration-level tree;
//!    [`frontend`] wraps it behind the [`frontend::Frontend`] trait.
//! 2. [`marker`] picks the declarations carrying the reflection marker.
//! 3. [`reflect`] builds the descriptor graph, orders it so nested structs
//!    come first, and renders it.
//! 4. [`pipeline`] runs the whole chain per file and commits the output
//!    atomically.
//!
//! ## Marking a struct
//!
//! ```c
//! #include "cinspect.h"
//!
//! struct CINSPECT_STRUCT Vec3d { float x, y, z; };
//! struct __attribute__((annotate("generate_cinspect"))) GameObject {
//!     int id;
//!     struct Vec3d position;
//! };
//! ```
//!
//! Supported member types: `int`, `short`, `long` in their signed and
//! unsigned spellings, `float`, `double`, `char *`, enums, and structs that
//! are themselves marked.

pub mod config;
pub mod frontend;
pub mod header;
pub mod marker;
pub mod parser;
pub mod pipeline;
pub mod reflect;
