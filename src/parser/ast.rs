// Declaration-level syntax tree for C translation units

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a declaration inside its [`TranslationUnit`]
pub type DeclId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// `struct` or `union`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
}

impl RecordKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        }
    }
}

/// Base types after the declaration specifiers have been combined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short { unsigned: bool },
    Int { unsigned: bool },
    Long { unsigned: bool },
    LongLong { unsigned: bool },
    Float,
    Double,
    LongDouble,
    Record {
        kind: RecordKind,
        name: Option<String>, // None for anonymous records
    },
    Enum(Option<String>),
    /// A name introduced by `typedef` (or one the frontend never saw declared)
    Typedef(String),
    /// Function type; the payload is the return type
    Function(Box<Type>),
}

impl BaseType {
    fn write_spelling(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unsigned = |u: bool| if u { "unsigned " } else { "" };
        match self {
            BaseType::Void => f.write_str("void"),
            BaseType::Bool => f.write_str("_Bool"),
            BaseType::Char => f.write_str("char"),
            BaseType::SignedChar => f.write_str("signed char"),
            BaseType::UnsignedChar => f.write_str("unsigned char"),
            BaseType::Short { unsigned: u } => write!(f, "{}short", unsigned(*u)),
            BaseType::Int { unsigned: u } => write!(f, "{}int", unsigned(*u)),
            BaseType::Long { unsigned: u } => write!(f, "{}long", unsigned(*u)),
            BaseType::LongLong { unsigned: u } => write!(f, "{}long long", unsigned(*u)),
            BaseType::Float => f.write_str("float"),
            BaseType::Double => f.write_str("double"),
            BaseType::LongDouble => f.write_str("long double"),
            BaseType::Record { kind, name } => match name {
                Some(name) => write!(f, "{} {}", kind.keyword(), name),
                None => write!(f, "{} (anonymous)", kind.keyword()),
            },
            BaseType::Enum(name) => match name {
                Some(name) => write!(f, "enum {}", name),
                None => f.write_str("enum (anonymous)"),
            },
            BaseType::Typedef(name) => f.write_str(name),
            BaseType::Function(ret) => ret.write_spelling(f, false),
        }
    }
}

/// Type representation with const qualifier, pointers, and arrays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub base: BaseType,
    pub is_const: bool,
    pub pointer_depth: usize, // 0 = not pointer, 1 = *, 2 = **, etc.
    pub array_dims: Vec<Option<usize>>, // None when the size is not a plain literal
}

impl Type {
    pub fn new(base: BaseType) -> Self {
        Type {
            base,
            is_const: false,
            pointer_depth: 0,
            array_dims: Vec::new(),
        }
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_pointer(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    pub fn with_array(mut self, size: Option<usize>) -> Self {
        self.array_dims.push(size);
        self
    }

    pub fn is_scalar_value(&self) -> bool {
        self.pointer_depth == 0 && self.array_dims.is_empty()
    }

    /// Spelling with `const` dropped, in the form the type tag vocabulary uses
    /// (`char *`, `unsigned int`, `struct Vec3d`).
    pub fn unqualified_spelling(&self) -> String {
        Spelling {
            ty: self,
            qualified: false,
        }
        .to_string()
    }

    fn write_spelling(&self, f: &mut fmt::Formatter<'_>, qualified: bool) -> fmt::Result {
        if qualified && self.is_const {
            f.write_str("const ")?;
        }
        self.base.write_spelling(f)?;

        if matches!(self.base, BaseType::Function(_)) {
            f.write_str(" (")?;
            for _ in 0..self.pointer_depth {
                f.write_str("*")?;
            }
            write_array_dims(f, &self.array_dims)?;
            return f.write_str(")()");
        }

        if self.pointer_depth > 0 {
            f.write_str(" ")?;
            for _ in 0..self.pointer_depth {
                f.write_str("*")?;
            }
        }
        if !self.array_dims.is_empty() {
            f.write_str(" ")?;
            write_array_dims(f, &self.array_dims)?;
        }
        Ok(())
    }
}

fn write_array_dims(f: &mut fmt::Formatter<'_>, dims: &[Option<usize>]) -> fmt::Result {
    for dim in dims {
        match dim {
            Some(n) => write!(f, "[{}]", n)?,
            None => f.write_str("[]")?,
        }
    }
    Ok(())
}

struct Spelling<'a> {
    ty: &'a Type,
    qualified: bool,
}

impl fmt::Display for Spelling<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ty.write_spelling(f, self.qualified)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_spelling(f, true)
    }
}

/// A declaration-level attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `__attribute__((annotate("value")))`
    Annotate(String),
    /// The configured marker macro, left unexpanded
    MarkerMacro(String),
    /// Any other `__attribute__` entry, by name
    Other(String),
}

/// Record member
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: Type,
    pub is_bit_field: bool,
    pub location: SourceLocation,
}

/// `struct`/`union` declaration; `fields` is `None` for a forward declaration
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub kind: RecordKind,
    pub name: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub attributes: Vec<Attribute>,
    /// Anonymous in the source; `name` came from `typedef struct { ... } Name;`
    pub named_by_typedef: bool,
}

impl RecordDecl {
    pub fn is_definition(&self) -> bool {
        self.fields.is_some()
    }

    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Option<String>,
    pub enumerators: Vec<String>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub struct TypedefDecl {
    pub name: String,
    pub target: Type,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Record(RecordDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub kind: DeclKind,
    pub location: SourceLocation,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
}

impl Decl {
    /// Declared name, if the declaration has one
    pub fn spelling(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Record(r) => r.name.as_deref(),
            DeclKind::Enum(e) => e.name.as_deref(),
            DeclKind::Typedef(t) => Some(&t.name),
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match &self.kind {
            DeclKind::Record(r) => &r.attributes,
            DeclKind::Enum(e) => &e.attributes,
            DeclKind::Typedef(_) => &[],
        }
    }
}

/// One parsed source file: an arena of declarations plus the top-level order
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    path: PathBuf,
    decls: Vec<Decl>,
    roots: Vec<DeclId>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a declaration; nested declarations are linked to their parent.
    pub fn push(
        &mut self,
        kind: DeclKind,
        location: SourceLocation,
        parent: Option<DeclId>,
    ) -> DeclId {
        let id = self.decls.len();
        self.decls.push(Decl {
            kind,
            location,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.decls[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    pub(crate) fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id]
    }

    pub fn roots(&self) -> &[DeclId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
