//! Reflection core
//!
//! - [`type_tag`]: the closed vocabulary of field kinds
//! - [`descriptor`]: aggregates, fields and the graph that owns them
//! - [`extract`]: syntax tree + interest set → descriptor graph
//! - [`emit`]: topological order and symbol layout
//! - [`render`]: C, JSON and outline output
//! - [`errors`]: the fatal error kinds of a run

pub mod descriptor;
pub mod emit;
pub mod errors;
pub mod extract;
pub mod render;
pub mod type_tag;

pub use descriptor::{AggregateDescriptor, AggregateId, DescriptorGraph, FieldDescriptor};
pub use emit::{emit, layout, order, Artifact, LayoutOptions};
pub use errors::ReflectError;
pub use extract::extract;
pub use type_tag::TypeTag;
