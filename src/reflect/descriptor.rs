//! Descriptor model: aggregates, their fields, and the graph that owns them
//!
//! A [`DescriptorGraph`] is an arena. Nested-struct edges are [`AggregateId`]
//! handles into it rather than references, so the graph can describe any
//! shape (including the cycles the emitter rejects) without shared ownership.

use crate::parser::ast::SourceLocation;
use crate::reflect::type_tag::TypeTag;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Handle to an aggregate inside its [`DescriptorGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateId(usize);

impl AggregateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One member of a reflected aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    tag: TypeTag,
    nested: Option<AggregateId>,
    location: SourceLocation,
}

impl FieldDescriptor {
    /// `nested` must be present exactly when `tag` is [`TypeTag::Struct`].
    pub(crate) fn new(
        name: impl Into<String>,
        tag: TypeTag,
        nested: Option<AggregateId>,
        location: SourceLocation,
    ) -> Self {
        debug_assert_eq!(tag == TypeTag::Struct, nested.is_some());
        Self {
            name: name.into(),
            tag,
            nested,
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn nested(&self) -> Option<AggregateId> {
        self.nested
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }
}

/// A reflected struct: its name and fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    location: SourceLocation,
    named_by_typedef: bool,
}

impl AggregateDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    /// How C code names the type: `struct Name`, or just `Name` when the
    /// struct is anonymous and only reachable through its typedef
    pub fn c_type(&self) -> String {
        if self.named_by_typedef {
            self.name.clone()
        } else {
            format!("struct {}", self.name)
        }
    }

    /// Nested aggregates in field order; repeats are kept
    pub fn dependencies(&self) -> impl Iterator<Item = AggregateId> + '_ {
        self.fields.iter().filter_map(|f| f.nested)
    }
}

/// Every aggregate extracted from one translation unit, in discovery order
#[derive(Debug, Clone, Default)]
pub struct DescriptorGraph {
    source: PathBuf,
    aggregates: Vec<AggregateDescriptor>,
    by_name: FxHashMap<String, AggregateId>,
}

impl DescriptorGraph {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Path of the translation unit the graph was extracted from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Register an aggregate with no fields yet. Returns the existing id if
    /// the name is already present.
    pub(crate) fn insert(&mut self, name: &str, location: SourceLocation) -> AggregateId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = AggregateId(self.aggregates.len());
        self.aggregates.push(AggregateDescriptor {
            name: name.to_string(),
            fields: Vec::new(),
            location,
            named_by_typedef: false,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub(crate) fn set_named_by_typedef(&mut self, id: AggregateId) {
        self.aggregates[id.0].named_by_typedef = true;
    }

    pub(crate) fn set_fields(&mut self, id: AggregateId, fields: Vec<FieldDescriptor>) {
        self.aggregates[id.0].fields = fields;
    }

    pub fn get(&self, id: AggregateId) -> &AggregateDescriptor {
        &self.aggregates[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<AggregateId> {
        self.by_name.get(name).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = AggregateId> {
        (0..self.aggregates.len()).map(AggregateId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AggregateId, &AggregateDescriptor)> {
        self.aggregates
            .iter()
            .enumerate()
            .map(|(i, a)| (AggregateId(i), a))
    }

    pub fn dependencies(&self, id: AggregateId) -> impl Iterator<Item = AggregateId> + '_ {
        self.get(id).dependencies()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}
