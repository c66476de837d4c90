//! Text renderers for emitted descriptors
//!
//! - [`CSource`]: the C file a program compiles against `struct_reflect.h`
//! - [`to_json`]: the same artifact as pretty-printed JSON
//! - [`Printers`]: C functions that print a value of each aggregate
//! - [`Outline`]: a human-readable listing of a descriptor graph

use crate::config::OutputFormat;
use crate::reflect::descriptor::DescriptorGraph;
use crate::reflect::emit::{AggregateTable, Artifact, FieldEntry};
use crate::reflect::errors::ReflectError;
use crate::reflect::type_tag::TypeTag;
use std::fmt;

const INDENT: &str = "    ";

/// Render `artifact` in `format`; the output is complete or not produced
pub fn render(artifact: &Artifact, format: OutputFormat, header_include: &str) -> Result<String, ReflectError> {
    match format {
        OutputFormat::C => Ok(CSource::new(artifact, header_include).to_string()),
        OutputFormat::Json => to_json(artifact),
        OutputFormat::Printers => Ok(Printers::new(artifact).to_string()),
    }
}

pub fn to_json(artifact: &Artifact) -> Result<String, ReflectError> {
    let mut json = serde_json::to_string_pretty(artifact)?;
    json.push('\n');
    Ok(json)
}

/// C source for an [`Artifact`]
pub struct CSource<'a> {
    artifact: &'a Artifact,
    header_include: &'a str,
}

impl<'a> CSource<'a> {
    pub fn new(artifact: &'a Artifact, header_include: &'a str) -> Self {
        Self {
            artifact,
            header_include,
        }
    }

    fn write_aggregate(&self, f: &mut fmt::Formatter<'_>, table: &AggregateTable) -> fmt::Result {
        if let Some(fields_symbol) = &table.fields_symbol {
            writeln!(f, "StructFieldInfo {}[] = {{", fields_symbol)?;
            for field in &table.fields {
                writeln!(f, "{INDENT}{{")?;
                writeln!(f, "{INDENT}{INDENT}.name = \"{}\",", field.name)?;
                writeln!(f, "{INDENT}{INDENT}.type = {},", field.tag)?;
                if let Some(nested) = &field.nested {
                    writeln!(f, "{INDENT}{INDENT}.struct_desc = &{},", nested.symbol)?;
                }
                writeln!(f, "{INDENT}}},")?;
            }
            writeln!(f, "}};")?;
            writeln!(f)?;
        }

        writeln!(f, "StructInfo {} = {{", table.summary_symbol)?;
        writeln!(f, "{INDENT}.name = \"{}\",", table.name)?;
        match &table.fields_symbol {
            Some(symbol) => writeln!(f, "{INDENT}.fields = {},", symbol)?,
            None => writeln!(f, "{INDENT}.fields = NULL,")?,
        }
        writeln!(f, "{INDENT}.num_fields = {},", table.num_fields)?;
        writeln!(f, "}};")
    }
}

impl fmt::Display for CSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "/* Generated by cinspect from {}. Do not edit. */",
            self.artifact.source
        )?;
        writeln!(f, "#include \"{}\"", self.header_include)?;

        for table in &self.artifact.aggregates {
            writeln!(f)?;
            self.write_aggregate(f, table)?;
        }

        if let Some(registry) = &self.artifact.registry {
            writeln!(f)?;
            writeln!(f, "const StructInfo *const {}[] = {{", registry.symbol)?;
            for entry in &registry.entries {
                writeln!(f, "{INDENT}&{},", entry)?;
            }
            writeln!(f, "{INDENT}NULL,")?;
            writeln!(f, "}};")?;
            writeln!(f)?;
            writeln!(
                f,
                "const size_t {} = {};",
                registry.count_symbol,
                registry.entries.len()
            )?;
        }
        Ok(())
    }
}

/// `print_<Name>` functions for an [`Artifact`].
///
/// Functions follow emission order, so a nested printer is always defined
/// before its first caller. The file is meant to be included after the
/// struct definitions it prints.
pub struct Printers<'a> {
    artifact: &'a Artifact,
}

impl<'a> Printers<'a> {
    pub fn new(artifact: &'a Artifact) -> Self {
        Self { artifact }
    }

    fn write_printer(&self, f: &mut fmt::Formatter<'_>, table: &AggregateTable) -> fmt::Result {
        writeln!(
            f,
            "void {}(const {} *value, int depth) {{",
            table.printer_symbol, table.c_type
        )?;
        writeln!(f, "{INDENT}printf(\"%*s{} {{\\n\", depth * 2, \"\");", table.name)?;
        if table.fields.is_empty() {
            writeln!(f, "{INDENT}(void)value;")?;
        }
        for field in &table.fields {
            Self::write_field(f, field)?;
        }
        writeln!(f, "{INDENT}printf(\"%*s}}\\n\", depth * 2, \"\");")?;
        writeln!(f, "}}")
    }

    fn write_field(f: &mut fmt::Formatter<'_>, field: &FieldEntry) -> fmt::Result {
        let access = format!("value->{}", field.name);
        let (conversion, argument) = match field.tag {
            TypeTag::Int | TypeTag::Short | TypeTag::Enum => ("%d", format!("(int){access}")),
            TypeTag::Long => ("%lld", format!("(long long){access}")),
            TypeTag::Float | TypeTag::Double => ("%f", format!("(double){access}")),
            TypeTag::CString => ("\\\"%s\\\"", format!("{access} ? {access} : \"(null)\"")),
            TypeTag::Struct => {
                writeln!(
                    f,
                    "{INDENT}printf(\"%*s{}:\\n\", (depth + 1) * 2, \"\");",
                    field.name
                )?;
                return match &field.nested {
                    Some(nested) => writeln!(f, "{INDENT}{}(&{access}, depth + 2);", nested.printer),
                    None => Ok(()),
                };
            }
        };
        writeln!(
            f,
            "{INDENT}printf(\"%*s{}: {}\\n\", (depth + 1) * 2, \"\", {});",
            field.name, conversion, argument
        )
    }
}

impl fmt::Display for Printers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "/* Generated by cinspect from {}. Do not edit. */",
            self.artifact.source
        )?;
        writeln!(f, "#include <stdio.h>")?;

        for table in &self.artifact.aggregates {
            writeln!(f)?;
            self.write_printer(f, table)?;
        }
        Ok(())
    }
}

/// Discovery-order listing of a graph, for `cinspect dump`
pub struct Outline<'a>(pub &'a DescriptorGraph);

impl fmt::Display for Outline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "{}: {} aggregate(s)", graph.source().display(), graph.len())?;
        for (_, aggregate) in graph.iter() {
            writeln!(
                f,
                "struct {} ({}) {} field(s)",
                aggregate.name(),
                aggregate.location(),
                aggregate.num_fields()
            )?;
            for field in aggregate.fields() {
                write!(f, "{INDENT}{}: {}", field.name(), field.tag())?;
                if let Some(nested) = field.nested() {
                    write!(f, " -> {}", graph.get(nested).name())?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
