//! AST extractor: syntax tree + interest set → [`DescriptorGraph`]
//!
//! Two passes over [`TranslationUnit::cursors`]:
//!
//! 1. Index every struct definition and typedef in the unit, and register
//!    each interesting struct as a placeholder aggregate in traversal order.
//! 2. Classify every member of each registered aggregate and resolve its
//!    nested reference through the pass 1 index, so a struct may refer to
//!    one defined later in the file.
//!
//! The unit is only read.

use crate::marker::InterestSet;
use crate::parser::ast::{BaseType, DeclId, DeclKind, Field, RecordKind, TranslationUnit, Type};
use crate::reflect::descriptor::{AggregateId, DescriptorGraph, FieldDescriptor};
use crate::reflect::errors::ReflectError;
use crate::reflect::type_tag::TypeTag;
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;

/// Outcome of classifying one member type
#[derive(Debug, Clone, PartialEq, Eq)]
enum Classified {
    Scalar(TypeTag),
    /// Struct by value; the payload is the struct's tag name
    Struct(String),
    Unsupported,
}

struct Extractor<'a> {
    unit: &'a TranslationUnit,
    typedefs: FxHashMap<&'a str, &'a Type>,
    graph: DescriptorGraph,
    /// Registered aggregates and the record each one was built from
    pending: Vec<(AggregateId, DeclId)>,
}

/// Build the descriptor graph for every interesting struct in `unit`
pub fn extract(unit: &TranslationUnit, interest: &InterestSet) -> Result<DescriptorGraph, ReflectError> {
    let mut extractor = Extractor {
        unit,
        typedefs: FxHashMap::default(),
        graph: DescriptorGraph::new(unit.path()),
        pending: Vec::new(),
    };
    extractor.register(interest);
    extractor.resolve()?;
    Ok(extractor.graph)
}

impl<'a> Extractor<'a> {
    fn register(&mut self, interest: &InterestSet) {
        let unit = self.unit;
        for cursor in unit.cursors() {
            let marked = interest.contains(cursor.id());
            match cursor.kind() {
                DeclKind::Typedef(t) => {
                    self.typedefs.insert(t.name.as_str(), &t.target);
                }
                DeclKind::Record(record)
                    if marked && record.kind == RecordKind::Struct && record.is_definition() =>
                {
                    match &record.name {
                        Some(name) => {
                            let id = self.graph.insert(name, cursor.location());
                            if record.named_by_typedef {
                                self.graph.set_named_by_typedef(id);
                            }
                            debug!("registered aggregate '{}' at {}", name, cursor.location());
                            self.pending.push((id, cursor.id()));
                        }
                        None => warn!(
                            "{}:{}: skipping marked anonymous struct",
                            unit.path().display(),
                            cursor.location()
                        ),
                    }
                }
                _ if marked => warn!(
                    "{}:{}: skipping marked declaration '{}': not a struct definition",
                    unit.path().display(),
                    cursor.location(),
                    cursor.spelling().unwrap_or("<anonymous>")
                ),
                _ => {}
            }
        }
    }

    fn resolve(&mut self) -> Result<(), ReflectError> {
        let unit = self.unit;
        let pending = std::mem::take(&mut self.pending);
        for (id, decl) in pending {
            let DeclKind::Record(record) = &unit.decl(decl).kind else {
                continue;
            };
            let fields = record
                .fields()
                .iter()
                .map(|field| self.describe_field(id, field))
                .collect::<Result<Vec<_>, _>>()?;
            self.graph.set_fields(id, fields);
        }
        Ok(())
    }

    fn describe_field(&self, owner: AggregateId, field: &Field) -> Result<FieldDescriptor, ReflectError> {
        let aggregate = self.graph.get(owner).name();
        let descriptor = match self.classify(&field.field_type) {
            Classified::Scalar(tag) => FieldDescriptor::new(&field.name, tag, None, field.location),
            Classified::Struct(target) => {
                let nested = self.graph.lookup(&target).ok_or_else(|| {
                    ReflectError::UnmarkedDependency {
                        aggregate: aggregate.to_string(),
                        field: field.name.clone(),
                        target: target.clone(),
                        file: self.unit.path().to_path_buf(),
                        location: field.location,
                    }
                })?;
                FieldDescriptor::new(&field.name, TypeTag::Struct, Some(nested), field.location)
            }
            Classified::Unsupported => {
                return Err(ReflectError::UnsupportedType {
                    aggregate: aggregate.to_string(),
                    field: field.name.clone(),
                    type_spelling: field.field_type.to_string(),
                    file: self.unit.path().to_path_buf(),
                    location: field.location,
                })
            }
        };
        trace!("{}.{} -> {}", aggregate, field.name, descriptor.tag());
        Ok(descriptor)
    }

    /// Follow typedef names until a non-typedef base or an unknown name,
    /// composing pointer depth, array dimensions and `const` along the way
    fn resolve_typedefs(&self, ty: &Type) -> Type {
        let mut resolved = ty.clone();
        // Bounded so a self-referential chain cannot loop
        for _ in 0..=self.typedefs.len() {
            let BaseType::Typedef(name) = &resolved.base else {
                break;
            };
            let Some(target) = self.typedefs.get(name.as_str()) else {
                break;
            };
            let mut next = (*target).clone();
            next.is_const |= resolved.is_const;
            next.pointer_depth += resolved.pointer_depth;
            let mut dims = std::mem::take(&mut resolved.array_dims);
            dims.extend(next.array_dims);
            next.array_dims = dims;
            resolved = next;
        }
        resolved
    }

    fn classify(&self, ty: &Type) -> Classified {
        let ty = self.resolve_typedefs(ty);
        match &ty.base {
            BaseType::Record {
                kind: RecordKind::Struct,
                name: Some(name),
            } if ty.is_scalar_value() => Classified::Struct(name.clone()),
            BaseType::Enum(_) if ty.is_scalar_value() => Classified::Scalar(TypeTag::Enum),
            BaseType::Record { .. } | BaseType::Enum(_) | BaseType::Function(_) => {
                Classified::Unsupported
            }
            _ => TypeTag::from_type_name(&ty.unqualified_spelling())
                .map_or(Classified::Unsupported, Classified::Scalar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::CFrontend;
    use crate::marker::{scan, MarkerConfig};
    use std::path::Path;

    fn extract_source(source: &str) -> Result<DescriptorGraph, ReflectError> {
        let parsed = CFrontend::default()
            .parse_source(Path::new("x.c"), source)
            .unwrap();
        let interest = scan(&parsed.unit, &MarkerConfig::default());
        extract(&parsed.unit, &interest)
    }

    fn tags(graph: &DescriptorGraph, name: &str) -> Vec<(String, TypeTag)> {
        let id = graph.lookup(name).unwrap();
        graph
            .get(id)
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), f.tag()))
            .collect()
    }

    #[test]
    fn test_game_object_with_forward_reference() {
        let graph = extract_source(
            "struct CINSPECT_STRUCT GameObject { int id; struct Vec3d position; };\n\
             struct CINSPECT_STRUCT Vec3d { float x; float y; float z; };",
        )
        .unwrap();

        assert_eq!(graph.len(), 2);
        let game_object = graph.lookup("GameObject").unwrap();
        let vec3d = graph.lookup("Vec3d").unwrap();
        assert_eq!(graph.get(vec3d).num_fields(), 3);
        assert_eq!(
            tags(&graph, "GameObject"),
            vec![("id".to_string(), TypeTag::Int), ("position".to_string(), TypeTag::Struct)]
        );
        assert_eq!(graph.get(game_object).fields()[1].nested(), Some(vec3d));
        assert_eq!(graph.get(game_object).fields()[0].nested(), None);
    }

    #[test]
    fn test_typedef_chains() {
        let graph = extract_source(
            "typedef struct Vec3d Vec3d;\n\
             typedef char *string;\n\
             typedef const string label_t;\n\
             typedef enum { LOW, HIGH } Level;\n\
             typedef unsigned short u16;\n\
             struct CINSPECT_STRUCT Vec3d { double x; };\n\
             struct CINSPECT_STRUCT Item { Vec3d p; string name; label_t label; Level level; u16 small; int64_t big; };",
        )
        .unwrap();
        assert_eq!(
            tags(&graph, "Item"),
            vec![
                ("p".to_string(), TypeTag::Struct),
                ("name".to_string(), TypeTag::CString),
                ("label".to_string(), TypeTag::CString),
                ("level".to_string(), TypeTag::Enum),
                ("small".to_string(), TypeTag::Short),
                ("big".to_string(), TypeTag::Long),
            ]
        );
    }

    #[test]
    fn test_c_type_follows_how_the_struct_is_named() {
        let graph = extract_source(
            "typedef struct CINSPECT_STRUCT { int a; } Anon;\n\
             typedef struct CINSPECT_STRUCT Tagged { Anon inner; } Tagged;",
        )
        .unwrap();
        let c_type = |name: &str| graph.get(graph.lookup(name).unwrap()).c_type();
        assert_eq!(c_type("Anon"), "Anon");
        assert_eq!(c_type("Tagged"), "struct Tagged");
    }

    #[test]
    fn test_function_pointer_is_unsupported() {
        let err = extract_source("struct CINSPECT_STRUCT Handler { int (*callback)(int); };")
            .unwrap_err();
        match err {
            ReflectError::UnsupportedType {
                aggregate,
                field,
                type_spelling,
                location,
                ..
            } => {
                assert_eq!(aggregate, "Handler");
                assert_eq!(field, "callback");
                assert_eq!(type_spelling, "int (*)()");
                assert_eq!(location.line, 1);
            }
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_other_unsupported_shapes() {
        for member in ["char c;", "int values[4];", "void *data;", "_Bool flag;", "size_t n;"] {
            let source = format!("struct CINSPECT_STRUCT S {{ {member} }};");
            assert!(
                matches!(extract_source(&source), Err(ReflectError::UnsupportedType { .. })),
                "{member}"
            );
        }
    }

    #[test]
    fn test_unmarked_dependency() {
        let err = extract_source(
            "struct Plain { int a; };\nstruct CINSPECT_STRUCT Holder { struct Plain p; };",
        )
        .unwrap_err();
        match err {
            ReflectError::UnmarkedDependency { aggregate, target, location, .. } => {
                assert_eq!(aggregate, "Holder");
                assert_eq!(target, "Plain");
                assert_eq!(location.line, 2);
            }
            other => panic!("Expected UnmarkedDependency, got {:?}", other),
        }

        // Never defined at all
        assert!(matches!(
            extract_source("struct CINSPECT_STRUCT Holder { struct Missing m; };"),
            Err(ReflectError::UnmarkedDependency { .. })
        ));
    }

    #[test]
    fn test_zero_field_aggregate_and_skipped_markers() {
        let graph = extract_source(
            "struct CINSPECT_STRUCT Empty {};\n\
             enum CINSPECT_STRUCT Color { RED };\n\
             union CINSPECT_STRUCT U { int a; float b; };",
        )
        .unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get(graph.lookup("Empty").unwrap()).num_fields(), 0);
    }

    #[test]
    fn test_marked_forward_declaration_is_scanned_then_skipped() {
        let source = "struct CINSPECT_STRUCT Later;\nstruct Later { int a; };";
        let parsed = CFrontend::default()
            .parse_source(Path::new("x.c"), source)
            .unwrap();
        let interest = scan(&parsed.unit, &MarkerConfig::default());

        let marked: Vec<_> = parsed
            .unit
            .cursors()
            .filter(|c| interest.contains(c.id()))
            .map(|c| matches!(c.kind(), DeclKind::Record(r) if !r.is_definition()))
            .collect();
        assert_eq!(marked, vec![true]);

        let graph = extract(&parsed.unit, &interest).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_self_containment_is_an_edge() {
        let graph = extract_source("struct CINSPECT_STRUCT Node { struct Node inner; };").unwrap();
        let node = graph.lookup("Node").unwrap();
        assert_eq!(graph.dependencies(node).collect::<Vec<_>>(), vec![node]);
    }
}
