//! Descriptor emitter: dependency ordering and table layout
//!
//! [`order`] sorts the graph so every nested aggregate comes before the
//! aggregates that contain it. [`layout`] turns that order into an
//! [`Artifact`], the symbol-level model every renderer in
//! [`crate::reflect::render`] print from.

use crate::reflect::descriptor::{AggregateId, DescriptorGraph};
use crate::reflect::errors::ReflectError;
use crate::reflect::type_tag::TypeTag;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Prepended to every generated symbol
    pub prefix: String,
    /// Also emit a NULL-terminated table of every summary
    pub registry: bool,
}

/// Everything one generated file contains, with symbols resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// File name of the translation unit
    pub source: String,
    pub aggregates: Vec<AggregateTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<Registry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateTable {
    pub name: String,
    /// Type spelling for generated C code, e.g. `struct Vec3d`
    pub c_type: String,
    pub summary_symbol: String,
    /// Name of the generated `print_<Name>` function
    pub printer_symbol: String,
    /// `None` for an aggregate without fields
    pub fields_symbol: Option<String>,
    pub fields: Vec<FieldEntry>,
    pub num_fields: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub tag: TypeTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedRef {
    pub name: String,
    pub symbol: String,
    pub printer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registry {
    pub symbol: String,
    pub count_symbol: String,
    /// Summary symbols in emission order
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

struct Frame {
    node: AggregateId,
    deps: Vec<AggregateId>,
    next: usize,
}

impl Frame {
    fn new(graph: &DescriptorGraph, node: AggregateId) -> Self {
        Self {
            node,
            deps: graph.dependencies(node).collect(),
            next: 0,
        }
    }
}

/// Depth-first topological order. Roots are taken in discovery order and
/// each node's dependencies in field order, so the result is deterministic.
pub fn order(graph: &DescriptorGraph) -> Result<Vec<AggregateId>, ReflectError> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut sorted = Vec::with_capacity(graph.len());

    for root in graph.ids() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }
        marks[root.index()] = Mark::Active;
        let mut stack = vec![Frame::new(graph, root)];

        while let Some(frame) = stack.last_mut() {
            let Some(&dep) = frame.deps.get(frame.next) else {
                let node = frame.node;
                stack.pop();
                marks[node.index()] = Mark::Done;
                sorted.push(node);
                continue;
            };
            frame.next += 1;

            match marks[dep.index()] {
                Mark::Done => {}
                Mark::Active => return Err(cycle_error(graph, &stack, dep)),
                Mark::Unvisited => {
                    marks[dep.index()] = Mark::Active;
                    stack.push(Frame::new(graph, dep));
                }
            }
        }
    }

    Ok(sorted)
}

fn cycle_error(graph: &DescriptorGraph, stack: &[Frame], back_edge: AggregateId) -> ReflectError {
    let start = stack
        .iter()
        .position(|f| f.node == back_edge)
        .unwrap_or(0);
    let cycle = stack[start..]
        .iter()
        .map(|f| f.node)
        .chain(std::iter::once(back_edge))
        .map(|id| graph.get(id).name().to_string())
        .collect();
    ReflectError::CyclicDependency { cycle }
}

/// Generated symbols and what defines each, for collision checks
#[derive(Default)]
struct Symbols {
    owners: FxHashMap<String, String>,
}

impl Symbols {
    fn claim(&mut self, symbol: &str, owner: impl FnOnce() -> String) -> Result<(), ReflectError> {
        match self.owners.entry(symbol.to_string()) {
            Entry::Occupied(first) => Err(ReflectError::DuplicateSymbol {
                symbol: symbol.to_string(),
                first: first.get().clone(),
                second: owner(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(owner());
                Ok(())
            }
        }
    }
}

/// Resolve symbols for `order`, which must come from [`order`].
///
/// Fails with [`ReflectError::DuplicateSymbol`] if two tables would share a
/// C name, such as the field array of `Foo` and the summary of `FooFields`.
pub fn layout(
    graph: &DescriptorGraph,
    order: &[AggregateId],
    options: &LayoutOptions,
) -> Result<Artifact, ReflectError> {
    let summary_symbol = |id: AggregateId| format!("{}{}", options.prefix, graph.get(id).name());
    let printer_symbol = |id: AggregateId| format!("{}print_{}", options.prefix, graph.get(id).name());
    let mut symbols = Symbols::default();

    let mut aggregates = Vec::with_capacity(order.len());
    for &id in order {
        let aggregate = graph.get(id);
        let fields: Vec<FieldEntry> = aggregate
            .fields()
            .iter()
            .map(|field| FieldEntry {
                name: field.name().to_string(),
                tag: field.tag(),
                nested: field.nested().map(|nested| NestedRef {
                    name: graph.get(nested).name().to_string(),
                    symbol: summary_symbol(nested),
                    printer: printer_symbol(nested),
                }),
            })
            .collect();
        let table = AggregateTable {
            name: aggregate.name().to_string(),
            c_type: aggregate.c_type(),
            summary_symbol: summary_symbol(id),
            printer_symbol: printer_symbol(id),
            fields_symbol: (!fields.is_empty())
                .then(|| format!("{}{}Fields", options.prefix, aggregate.name())),
            num_fields: fields.len(),
            fields,
        };

        symbols.claim(&table.summary_symbol, || format!("the summary of '{}'", table.name))?;
        if let Some(fields_symbol) = &table.fields_symbol {
            symbols.claim(fields_symbol, || format!("the fields of '{}'", table.name))?;
        }
        symbols.claim(&table.printer_symbol, || format!("the printer of '{}'", table.name))?;
        aggregates.push(table);
    }

    let registry = if options.registry {
        let registry = Registry {
            symbol: format!("{}registry", options.prefix),
            count_symbol: format!("{}registry_len", options.prefix),
            entries: aggregates.iter().map(|a| a.summary_symbol.clone()).collect(),
        };
        symbols.claim(&registry.symbol, || "the registry".to_string())?;
        symbols.claim(&registry.count_symbol, || "the registry length".to_string())?;
        Some(registry)
    } else {
        None
    };

    let source = graph
        .source()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Artifact {
        source,
        aggregates,
        registry,
    })
}

/// Order and lay out the whole graph
pub fn emit(graph: &DescriptorGraph, options: &LayoutOptions) -> Result<Artifact, ReflectError> {
    let sorted = order(graph)?;
    debug!(
        "emission order: {}",
        sorted
            .iter()
            .map(|&id| graph.get(id).name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    layout(graph, &sorted, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;
    use crate::reflect::descriptor::FieldDescriptor;
    use pretty_assertions::assert_eq;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn nested(name: &str, target: AggregateId) -> FieldDescriptor {
        FieldDescriptor::new(name, TypeTag::Struct, Some(target), loc())
    }

    fn scalar(name: &str, tag: TypeTag) -> FieldDescriptor {
        FieldDescriptor::new(name, tag, None, loc())
    }

    fn names(graph: &DescriptorGraph, ids: &[AggregateId]) -> Vec<String> {
        ids.iter().map(|&id| graph.get(id).name().to_string()).collect()
    }

    fn options() -> LayoutOptions {
        LayoutOptions {
            prefix: "t_".to_string(),
            registry: true,
        }
    }

    #[test]
    fn test_dependencies_are_placed_first() {
        let mut graph = DescriptorGraph::new("t.c");
        let game_object = graph.insert("GameObject", loc());
        let vec3d = graph.insert("Vec3d", loc());
        graph.set_fields(
            game_object,
            vec![scalar("id", TypeTag::Int), nested("position", vec3d)],
        );
        graph.set_fields(vec3d, vec![scalar("x", TypeTag::Float)]);

        let sorted = order(&graph).unwrap();
        assert_eq!(names(&graph, &sorted), vec!["Vec3d", "GameObject"]);
    }

    #[test]
    fn test_order_is_deterministic_for_diamonds() {
        // Top -> (Left, Right), Left -> Base, Right -> Base; Lone has no edges
        let mut graph = DescriptorGraph::new("t.c");
        let top = graph.insert("Top", loc());
        let lone = graph.insert("Lone", loc());
        let right = graph.insert("Right", loc());
        let left = graph.insert("Left", loc());
        let base = graph.insert("Base", loc());
        graph.set_fields(top, vec![nested("l", left), nested("r", right)]);
        graph.set_fields(left, vec![nested("b", base)]);
        graph.set_fields(right, vec![nested("b", base), nested("b2", base)]);
        graph.set_fields(lone, vec![scalar("n", TypeTag::Short)]);

        let first = order(&graph).unwrap();
        assert_eq!(
            names(&graph, &first),
            vec!["Base", "Left", "Right", "Top", "Lone"]
        );
        assert_eq!(order(&graph).unwrap(), first);
    }

    #[test]
    fn test_mutual_containment_is_a_cycle() {
        let mut graph = DescriptorGraph::new("t.c");
        let a = graph.insert("A", loc());
        let b = graph.insert("B", loc());
        graph.set_fields(a, vec![nested("b", b)]);
        graph.set_fields(b, vec![nested("a", a)]);

        match order(&graph) {
            Err(ReflectError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["A", "B", "A"]);
            }
            other => panic!("Expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_reports_only_participants() {
        let mut graph = DescriptorGraph::new("t.c");
        let outer = graph.insert("Outer", loc());
        let x = graph.insert("X", loc());
        let y = graph.insert("Y", loc());
        graph.set_fields(outer, vec![nested("x", x)]);
        graph.set_fields(x, vec![nested("y", y)]);
        graph.set_fields(y, vec![nested("x", x)]);

        match order(&graph) {
            Err(ReflectError::CyclicDependency { cycle }) => assert_eq!(cycle, vec!["X", "Y", "X"]),
            other => panic!("Expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_self_containment_is_a_cycle_of_one() {
        let mut graph = DescriptorGraph::new("t.c");
        let node = graph.insert("Node", loc());
        graph.set_fields(node, vec![nested("next", node)]);
        match order(&graph) {
            Err(ReflectError::CyclicDependency { cycle }) => assert_eq!(cycle, vec!["Node", "Node"]),
            other => panic!("Expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_layout_symbols_and_counts() {
        let mut graph = DescriptorGraph::new("dir/scene.c");
        let holder = graph.insert("Holder", loc());
        let empty = graph.insert("Empty", loc());
        graph.set_fields(holder, vec![scalar("name", TypeTag::CString), nested("e", empty)]);

        let artifact = emit(&graph, &options()).unwrap();
        assert_eq!(artifact.source, "scene.c");

        let summaries: Vec<_> = artifact.aggregates.iter().map(|a| a.summary_symbol.as_str()).collect();
        assert_eq!(summaries, vec!["t_Empty", "t_Holder"]);

        let empty_table = &artifact.aggregates[0];
        assert_eq!(empty_table.fields_symbol, None);
        assert_eq!(empty_table.num_fields, 0);

        let holder_table = &artifact.aggregates[1];
        assert_eq!(holder_table.fields_symbol.as_deref(), Some("t_HolderFields"));
        assert_eq!(holder_table.num_fields, holder_table.fields.len());
        assert_eq!(
            holder_table.fields[1].nested,
            Some(NestedRef {
                name: "Empty".to_string(),
                symbol: "t_Empty".to_string(),
                printer: "t_print_Empty".to_string(),
            })
        );

        let registry = artifact.registry.unwrap();
        assert_eq!(registry.symbol, "t_registry");
        assert_eq!(registry.count_symbol, "t_registry_len");
        assert_eq!(registry.entries, vec!["t_Empty", "t_Holder"]);
    }

    #[test]
    fn test_registry_can_be_disabled() {
        let mut graph = DescriptorGraph::new("t.c");
        graph.insert("A", loc());
        let artifact = emit(
            &graph,
            &LayoutOptions {
                registry: false,
                ..options()
            },
        )
        .unwrap();
        assert!(artifact.registry.is_none());
    }

    #[test]
    fn test_fields_array_colliding_with_a_summary_is_rejected() {
        let mut graph = DescriptorGraph::new("t.c");
        let foo = graph.insert("Foo", loc());
        let foo_fields = graph.insert("FooFields", loc());
        graph.set_fields(foo, vec![scalar("a", TypeTag::Int)]);
        graph.set_fields(foo_fields, vec![scalar("b", TypeTag::Int)]);

        match emit(&graph, &options()) {
            Err(ReflectError::DuplicateSymbol { symbol, first, second }) => {
                assert_eq!(symbol, "t_FooFields");
                assert_eq!(first, "the fields of 'Foo'");
                assert_eq!(second, "the summary of 'FooFields'");
            }
            other => panic!("Expected DuplicateSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_named_registry_collides_with_the_registry() {
        let mut graph = DescriptorGraph::new("t.c");
        let registry = graph.insert("registry", loc());
        graph.set_fields(registry, vec![scalar("a", TypeTag::Int)]);

        match emit(&graph, &options()) {
            Err(ReflectError::DuplicateSymbol { symbol, first, second }) => {
                assert_eq!(symbol, "t_registry");
                assert_eq!(first, "the summary of 'registry'");
                assert_eq!(second, "the registry");
            }
            other => panic!("Expected DuplicateSymbol, got {:?}", other),
        }

        let without_registry = LayoutOptions {
            registry: false,
            ..options()
        };
        assert!(emit(&graph, &without_registry).is_ok());
    }
}
