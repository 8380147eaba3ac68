//! Contract with the external type-checking frontend.
//!
//! The loader, type checker, and SSA builder live outside this crate; the
//! scanner consumes them through the data model defined here. A
//! [`PackageLoader`] produces [`LoadedPackage`]s: the typed syntax plus an
//! optional SSA form for the taint engine.

use crate::ast::{Ast, CommentGroup, NodeId};
use crate::taint::ssa::SsaProgram;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use thiserror::Error;

/// A compact structural type representation.
///
/// This is not a full type system; it carries exactly what the rules
/// inspect: names and packages, pointers, slices, and signatures.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    /// A predeclared type (`string`, `int`, `bool`, `error`, ...).
    Basic(String),
    /// A named type from a package, e.g. `net/http.Request`.
    Named {
        /// Canonical package path; empty for universe-scope names.
        pkg: String,
        /// Type name.
        name: String,
    },
    /// Pointer to another type.
    Ptr(Box<Ty>),
    /// Slice of another type.
    Slice(Box<Ty>),
    /// A function signature.
    Func(Box<Signature>),
    /// A multi-value type (function results).
    Tuple(Vec<Ty>),
    /// Unknown or erroneous type.
    Invalid,
}

impl Ty {
    /// Convenience constructor for a basic type.
    #[must_use]
    pub fn basic(name: &str) -> Self {
        Ty::Basic(name.to_owned())
    }

    /// Convenience constructor for a named type.
    #[must_use]
    pub fn named(pkg: &str, name: &str) -> Self {
        Ty::Named {
            pkg: pkg.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Convenience constructor for a pointer to a named type.
    #[must_use]
    pub fn ptr_to(pkg: &str, name: &str) -> Self {
        Ty::Ptr(Box::new(Ty::named(pkg, name)))
    }

    /// Whether the type is the `error` interface.
    #[must_use]
    pub fn is_error(&self) -> bool {
        match self {
            Ty::Basic(n) => n == "error",
            Ty::Named { pkg, name } => pkg.is_empty() && name == "error",
            _ => false,
        }
    }

    /// Strips one level of pointer indirection, if any.
    #[must_use]
    pub fn deref(&self) -> &Ty {
        match self {
            Ty::Ptr(inner) => inner,
            other => other,
        }
    }

    /// The `pkg.Name` form used in qualified matching; pointers render
    /// with a leading `*`. Returns `None` for unnamed shapes.
    #[must_use]
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Ty::Named { pkg, name } => {
                if pkg.is_empty() {
                    Some(name.clone())
                } else {
                    Some(crate::cache::qualify(pkg, name, false))
                }
            }
            Ty::Ptr(inner) => match inner.as_ref() {
                Ty::Named { pkg, name } => Some(crate::cache::qualify(pkg, name, true)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A function or method signature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    /// Parameter types.
    pub params: Vec<Ty>,
    /// Result types.
    pub results: Vec<Ty>,
    /// Receiver type for methods.
    pub recv: Option<Ty>,
}

impl Signature {
    /// Whether any declared result is the `error` interface.
    #[must_use]
    pub fn returns_error(&self) -> bool {
        self.results.iter().any(Ty::is_error)
    }
}

/// A folded constant value attached to an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// String constant.
    Str(String),
    /// Integer constant.
    Int(i64),
    /// Floating-point constant.
    Float(f64),
    /// Boolean constant.
    Bool(bool),
    /// Character constant.
    Char(char),
}

/// Index of an [`Object`] in a package's object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// A resolved program entity, mirroring the frontend's object model.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// A package name brought into scope by an import.
    PkgName {
        /// Canonical import path.
        path: String,
        /// Local name in this file.
        name: String,
    },
    /// A declared constant.
    Const {
        /// Constant name.
        name: String,
        /// Constant type.
        ty: Ty,
        /// Folded value when the frontend could compute it.
        value: Option<ConstValue>,
    },
    /// A declared variable.
    Var {
        /// Variable name.
        name: String,
        /// Variable type.
        ty: Ty,
    },
    /// A declared function or method.
    Func {
        /// Function name.
        name: String,
        /// Declaring package path; `None` for local closures.
        pkg: Option<String>,
        /// Signature.
        sig: Signature,
    },
    /// A declared type name.
    TypeName {
        /// Declaring package path.
        pkg: Option<String>,
        /// Type name.
        name: String,
    },
    /// A universe-scope builtin (`new`, `make`, `len`, ...).
    Builtin {
        /// Builtin name.
        name: String,
    },
}

impl Object {
    /// The object's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Object::PkgName { name, .. }
            | Object::Const { name, .. }
            | Object::Var { name, .. }
            | Object::Func { name, .. }
            | Object::TypeName {
                name, ..
            }
            | Object::Builtin { name } => name,
        }
    }
}

/// Type and folded-value information for one expression.
#[derive(Debug, Clone)]
pub struct TypeAndValue {
    /// The expression's type.
    pub ty: Ty,
    /// Constant value when the frontend folded one.
    pub value: Option<ConstValue>,
}

/// Per-package type-checker output.
#[derive(Debug, Default, Clone)]
pub struct TypeInfo {
    /// Expression types and folded constants, keyed by node.
    pub types: FxHashMap<NodeId, TypeAndValue>,
    /// Identifier uses resolved to objects.
    pub uses: FxHashMap<NodeId, ObjectId>,
    /// Identifier definitions resolved to objects.
    pub defs: FxHashMap<NodeId, ObjectId>,
    /// The object table.
    pub objects: Vec<Object>,
    /// Declaration site of an object (its `ValueSpec` or `AssignStmt`).
    pub decl_of: FxHashMap<ObjectId, NodeId>,
}

impl TypeInfo {
    /// Registers an object and returns its id.
    pub fn add_object(&mut self, obj: Object) -> ObjectId {
        let id = ObjectId(u32::try_from(self.objects.len()).unwrap_or(u32::MAX));
        self.objects.push(obj);
        id
    }

    /// Returns the object an identifier resolves to (uses, then defs).
    #[must_use]
    pub fn object_of(&self, ident: NodeId) -> Option<&Object> {
        self.uses
            .get(&ident)
            .or_else(|| self.defs.get(&ident))
            .map(|oid| &self.objects[oid.0 as usize])
    }

    /// Returns the object id an identifier resolves to.
    #[must_use]
    pub fn object_id_of(&self, ident: NodeId) -> Option<ObjectId> {
        self.uses.get(&ident).or_else(|| self.defs.get(&ident)).copied()
    }

    /// Returns the type recorded for an expression.
    #[must_use]
    pub fn type_of(&self, node: NodeId) -> Option<&Ty> {
        self.types.get(&node).map(|tv| &tv.ty)
    }

    /// Returns the folded constant value recorded for an expression.
    #[must_use]
    pub fn const_value(&self, node: NodeId) -> Option<&ConstValue> {
        self.types.get(&node).and_then(|tv| tv.value.as_ref())
    }
}

/// A parsed, type-checked source file.
#[derive(Debug, Clone)]
pub struct TypedFile {
    /// File path as reported by the frontend.
    pub path: PathBuf,
    /// Root [`crate::ast::File`] node in the package arena.
    pub root: NodeId,
    /// All comment groups of the file.
    pub comments: Vec<CommentGroup>,
    /// Comment groups attached to nodes, keyed by node id.
    pub comment_map: FxHashMap<NodeId, Vec<usize>>,
    /// Source text, when the frontend kept it in memory.
    pub source: Option<String>,
}

impl TypedFile {
    /// Whether the file is written in the analyzed language.
    #[must_use]
    pub fn is_target_language(&self) -> bool {
        self.path.extension().is_some_and(|e| e == "go")
    }

    /// The comment groups attached to `node`.
    #[must_use]
    pub fn comments_for(&self, node: NodeId) -> Vec<&CommentGroup> {
        self.comment_map
            .get(&node)
            .map(|ids| ids.iter().map(|&i| &self.comments[i]).collect())
            .unwrap_or_default()
    }

    /// Line count of the file, from in-memory source when available.
    #[must_use]
    pub fn line_count(&self, ast: &Ast) -> usize {
        match &self.source {
            Some(src) => src.lines().count(),
            None => ast.span(self.root).end.line as usize,
        }
    }
}

/// A fully loaded, type-checked package.
#[derive(Debug, Clone)]
pub struct TypedPackage {
    /// Canonical package path.
    pub path: String,
    /// Package name.
    pub name: String,
    /// The package's node arena.
    pub ast: Ast,
    /// Files belonging to the package.
    pub files: Vec<TypedFile>,
    /// Type-checker output.
    pub info: TypeInfo,
}

/// A syntax error inside an otherwise loadable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// File the error occurred in.
    pub file: PathBuf,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
    /// Frontend error message.
    pub message: String,
}

/// Failure to load a package.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The package did not build; recorded as a synthetic error and the
    /// scan continues.
    #[error("could not load package {path}: {message}")]
    Build {
        /// Package path that failed.
        path: String,
        /// Frontend diagnostic.
        message: String,
    },
    /// The frontend failed in a way that invalidates the whole scan.
    #[error("fatal frontend error: {0}")]
    Fatal(String),
}

/// Language version reported by the toolchain, e.g. `1.22`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LangVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl LangVersion {
    /// Creates a version from its components.
    #[must_use]
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parses `"1.21"` or `"go1.21"`. Returns `None` on malformed input.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix("go").unwrap_or(s);
        let (major, minor) = s.split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.trim_end_matches(|c: char| !c.is_ascii_digit()).parse().ok()?,
        })
    }
}

/// A package together with its optional SSA form and parse diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedPackage {
    /// The typed package.
    pub pkg: TypedPackage,
    /// SSA form, when the frontend produced one.
    pub ssa: Option<SsaProgram>,
    /// Syntax errors captured while parsing package files.
    pub parse_errors: Vec<ParseError>,
}

/// The external loader service. Implementations are called from worker
/// threads and must be thread-safe.
pub trait PackageLoader: Send + Sync {
    /// Loads and type-checks every package under `path`.
    ///
    /// # Errors
    ///
    /// [`LoadError::Build`] when the package cannot be built (the scan
    /// records it and continues); [`LoadError::Fatal`] to abort the scan.
    fn load(&self, path: &str, include_tests: bool) -> Result<Vec<LoadedPackage>, LoadError>;

    /// The toolchain language version for version-gated rules.
    fn lang_version(&self) -> LangVersion {
        LangVersion::new(1, 22)
    }
}
