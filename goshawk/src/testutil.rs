//! Test support: fluent builders for typed packages and SSA functions.
//!
//! Integration tests assemble the same structures a real frontend would
//! deliver, so scenarios read as small programs: imports, declarations,
//! statements, attached comments.

#![allow(clippy::missing_panics_doc)]

use crate::ast::{
    AssignStmt, Ast, BasicLit, BinOp, BinaryExpr, BlockStmt, CallExpr, CommentGroup,
    CompositeLit, DeclKind, DeferStmt, ExprStmt, File, FuncDecl, GenDecl, Ident, ImportSpec,
    KeyValueExpr, LitKind, Node, NodeId, ParenExpr, Position, RangeStmt, ReturnStmt,
    SelectorExpr, Span, UnOp, UnaryExpr, ValueSpec,
};
use crate::frontend::{
    ConstValue, LangVersion, LoadError, LoadedPackage, Object, ObjectId, PackageLoader,
    Signature, Ty, TypeAndValue, TypeInfo, TypedFile, TypedPackage,
};
use crate::taint::ssa::{
    CallCommon, CalleeRef, Function, SsaProgram, TypeRef, Value, ValueId, ValueKind,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

/// Builds one [`TypedPackage`].
pub struct PackageBuilder {
    ast: Ast,
    info: TypeInfo,
    path: String,
    name: String,
    files: Vec<TypedFile>,
}

impl PackageBuilder {
    /// Starts a package with the given canonical path and name.
    #[must_use]
    pub fn new(path: &str, name: &str) -> Self {
        Self {
            ast: Ast::new(),
            info: TypeInfo::default(),
            path: path.to_owned(),
            name: name.to_owned(),
            files: Vec::new(),
        }
    }

    /// Starts a new file in the package.
    pub fn file(&mut self, path: &str) -> FileBuilder<'_> {
        FileBuilder {
            path: PathBuf::from(path),
            decls: Vec::new(),
            comments: Vec::new(),
            comment_map: FxHashMap::default(),
            scope: FxHashMap::default(),
            line: 1,
            func: None,
            source: None,
            pkg: self,
        }
    }

    /// Finishes the package.
    #[must_use]
    pub fn build(self) -> TypedPackage {
        TypedPackage {
            path: self.path,
            name: self.name,
            ast: self.ast,
            files: self.files,
            info: self.info,
        }
    }

    /// Finishes the package wrapped as a loader result without SSA.
    #[must_use]
    pub fn into_loaded(self) -> LoadedPackage {
        LoadedPackage {
            pkg: self.build(),
            ssa: None,
            parse_errors: Vec::new(),
        }
    }

    /// Finishes the package wrapped as a loader result with SSA.
    #[must_use]
    pub fn into_loaded_with_ssa(self, ssa: SsaProgram) -> LoadedPackage {
        LoadedPackage {
            pkg: self.build(),
            ssa: Some(ssa),
            parse_errors: Vec::new(),
        }
    }
}

/// What closed a nested statement context.
enum BlockCtl {
    Plain,
    Range {
        key: Option<NodeId>,
        value: Option<NodeId>,
        x: NodeId,
    },
}

struct BlockFrame {
    stmts: Vec<NodeId>,
    start_line: u32,
    ctl: BlockCtl,
}

struct FuncFrame {
    name: NodeId,
    start_line: u32,
    blocks: Vec<BlockFrame>,
}

/// Builds one file of a package.
pub struct FileBuilder<'p> {
    pkg: &'p mut PackageBuilder,
    path: PathBuf,
    decls: Vec<NodeId>,
    comments: Vec<CommentGroup>,
    comment_map: FxHashMap<NodeId, Vec<usize>>,
    scope: FxHashMap<String, ObjectId>,
    line: u32,
    func: Option<FuncFrame>,
    source: Option<String>,
}

impl FileBuilder<'_> {
    fn here(&self) -> Span {
        Span::line(self.line, 1)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let span = self.here();
        self.pkg.ast.alloc(node, span)
    }

    fn alloc_spanning(&mut self, node: Node, start_line: u32) -> NodeId {
        let span = Span::new(Position::new(start_line, 1), Position::new(self.line, 1));
        self.pkg.ast.alloc(node, span)
    }

    /// Sets the file's in-memory source text (for snippet assertions).
    pub fn source(&mut self, text: &str) {
        self.source = Some(text.to_owned());
    }

    // ── imports ────────────────────────────────────────────────────────

    /// Adds a plain import.
    pub fn import(&mut self, path: &str) {
        self.import_spec(path, None);
    }

    /// Adds an aliased import.
    pub fn import_alias(&mut self, path: &str, alias: &str) {
        self.import_spec(path, Some(alias));
    }

    /// Adds a blank (init-only) import.
    pub fn import_blank(&mut self, path: &str) {
        self.import_spec(path, Some("_"));
    }

    fn import_spec(&mut self, path: &str, name: Option<&str>) {
        let name_id = name.map(|n| {
            self.alloc(Node::Ident(Ident {
                name: n.to_owned(),
            }))
        });
        let path_id = self.alloc(Node::BasicLit(BasicLit {
            kind: LitKind::String,
            value: path.to_owned(),
        }));
        let spec = self.alloc(Node::ImportSpec(ImportSpec {
            name: name_id,
            path: path_id,
        }));
        let decl = self.alloc(Node::GenDecl(GenDecl {
            kind: DeclKind::Import,
            specs: vec![spec],
        }));
        self.decls.push(decl);
        if name != Some("_") {
            let local = name
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path).to_owned());
            let oid = self.pkg.info.add_object(Object::PkgName {
                path: path.to_owned(),
                name: local.clone(),
            });
            if let Some(nid) = name_id {
                self.pkg.info.defs.insert(nid, oid);
            }
            self.scope.insert(local, oid);
        }
        self.line += 1;
    }

    // ── functions and blocks ───────────────────────────────────────────

    /// Opens a function declaration.
    pub fn begin_func(&mut self, name: &str) {
        let name_id = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        self.func = Some(FuncFrame {
            name: name_id,
            start_line: self.line,
            blocks: vec![BlockFrame {
                stmts: Vec::new(),
                start_line: self.line,
                ctl: BlockCtl::Plain,
            }],
        });
        self.line += 1;
    }

    /// Closes the current function declaration.
    pub fn end_func(&mut self) {
        #[allow(clippy::expect_used)]
        let frame = self.func.take().expect("begin_func not called");
        let body_frame = frame
            .blocks
            .into_iter()
            .next()
            .unwrap_or(BlockFrame {
                stmts: Vec::new(),
                start_line: frame.start_line,
                ctl: BlockCtl::Plain,
            });
        let body = self.alloc_spanning(
            Node::BlockStmt(BlockStmt {
                stmts: body_frame.stmts,
            }),
            body_frame.start_line,
        );
        let decl = self.alloc_spanning(
            Node::FuncDecl(FuncDecl {
                name: frame.name,
                params: Vec::new(),
                body: Some(body),
            }),
            frame.start_line,
        );
        self.decls.push(decl);
        self.line += 1;
    }

    /// Opens a nested block statement.
    pub fn begin_block(&mut self) {
        self.push_frame(BlockCtl::Plain);
    }

    /// Closes the innermost block and returns its node.
    pub fn end_block(&mut self) -> NodeId {
        let frame = self.pop_frame();
        let id = self.alloc_spanning(
            Node::BlockStmt(BlockStmt { stmts: frame.stmts }),
            frame.start_line,
        );
        self.push_stmt_quiet(id);
        self.line += 1;
        id
    }

    /// Opens a `for ... := range x` statement; `key`/`value` declare
    /// loop variables.
    pub fn begin_range(&mut self, key: Option<&str>, value: Option<&str>, x: NodeId) {
        let mut bind = |fb: &mut Self, name: &str| {
            let id = fb.alloc(Node::Ident(Ident {
                name: name.to_owned(),
            }));
            let oid = fb.pkg.info.add_object(Object::Var {
                name: name.to_owned(),
                ty: Ty::Invalid,
            });
            fb.pkg.info.defs.insert(id, oid);
            fb.scope.insert(name.to_owned(), oid);
            id
        };
        let key_id = key.map(|k| bind(self, k));
        let value_id = value.map(|v| bind(self, v));
        self.push_frame(BlockCtl::Range {
            key: key_id,
            value: value_id,
            x,
        });
    }

    /// Closes the innermost range statement and returns its node.
    pub fn end_range(&mut self) -> NodeId {
        let frame = self.pop_frame();
        let BlockCtl::Range { key, value, x } = frame.ctl else {
            #[allow(clippy::panic)]
            {
                panic!("end_range without begin_range");
            }
        };
        let body = self.alloc_spanning(
            Node::BlockStmt(BlockStmt { stmts: frame.stmts }),
            frame.start_line,
        );
        let start = frame.start_line;
        let range = self.alloc_spanning(
            Node::RangeStmt(RangeStmt {
                key,
                value,
                x,
                body,
            }),
            start,
        );
        self.push_stmt_quiet(range);
        self.line += 1;
        range
    }

    fn push_frame(&mut self, ctl: BlockCtl) {
        let line = self.line;
        #[allow(clippy::expect_used)]
        let frame = self.func.as_mut().expect("no open function");
        frame.blocks.push(BlockFrame {
            stmts: Vec::new(),
            start_line: line,
            ctl,
        });
        self.line += 1;
    }

    fn pop_frame(&mut self) -> BlockFrame {
        #[allow(clippy::expect_used)]
        let frame = self.func.as_mut().expect("no open function");
        #[allow(clippy::expect_used)]
        frame.blocks.pop().expect("no open block")
    }

    fn push_stmt_quiet(&mut self, id: NodeId) {
        #[allow(clippy::expect_used)]
        let frame = self.func.as_mut().expect("no open function");
        #[allow(clippy::expect_used)]
        frame.blocks.last_mut().expect("no open block").stmts.push(id);
    }

    fn push_stmt(&mut self, id: NodeId) {
        self.push_stmt_quiet(id);
        self.line += 1;
    }

    // ── statements ─────────────────────────────────────────────────────

    /// Appends an expression statement.
    pub fn stmt(&mut self, expr: NodeId) -> NodeId {
        let id = self.alloc(Node::ExprStmt(ExprStmt { x: expr }));
        self.push_stmt(id);
        id
    }

    /// Appends `name1, name2 := rhs...`, declaring typed variables.
    /// A `_` name declares nothing.
    pub fn define(&mut self, targets: &[(&str, Ty)], rhs: Vec<NodeId>) -> NodeId {
        let mut lhs = Vec::new();
        let mut created = Vec::new();
        for (name, ty) in targets {
            let id = self.alloc(Node::Ident(Ident {
                name: (*name).to_owned(),
            }));
            lhs.push(id);
            if *name != "_" {
                let oid = self.pkg.info.add_object(Object::Var {
                    name: (*name).to_owned(),
                    ty: ty.clone(),
                });
                self.pkg.info.defs.insert(id, oid);
                self.scope.insert((*name).to_owned(), oid);
                created.push(oid);
            }
        }
        let id = self.alloc(Node::AssignStmt(AssignStmt {
            lhs,
            rhs,
            define: true,
        }));
        for oid in created {
            self.pkg.info.decl_of.insert(oid, id);
        }
        self.push_stmt(id);
        id
    }

    /// Appends `name = rhs` over already-declared names.
    pub fn assign(&mut self, names: &[&str], rhs: Vec<NodeId>) -> NodeId {
        let lhs: Vec<NodeId> = names.iter().map(|n| self.ident(n)).collect();
        let id = self.alloc(Node::AssignStmt(AssignStmt {
            lhs,
            rhs,
            define: false,
        }));
        self.push_stmt(id);
        id
    }

    /// Appends a `const name = "value"` declaration.
    pub fn const_str(&mut self, name: &str, value: &str) -> NodeId {
        let ident = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        let lit = self.str_lit(value);
        let spec = self.alloc(Node::ValueSpec(ValueSpec {
            names: vec![ident],
            values: vec![lit],
        }));
        let oid = self.pkg.info.add_object(Object::Const {
            name: name.to_owned(),
            ty: Ty::basic("string"),
            value: Some(ConstValue::Str(value.to_owned())),
        });
        self.pkg.info.defs.insert(ident, oid);
        self.pkg.info.decl_of.insert(oid, spec);
        self.scope.insert(name.to_owned(), oid);
        let decl = self.alloc(Node::GenDecl(GenDecl {
            kind: DeclKind::Const,
            specs: vec![spec],
        }));
        self.finish_decl(decl);
        decl
    }

    /// Appends a `var name = value` declaration with the given type.
    pub fn var_decl(&mut self, name: &str, ty: Ty, value: NodeId) -> NodeId {
        let ident = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        let spec = self.alloc(Node::ValueSpec(ValueSpec {
            names: vec![ident],
            values: vec![value],
        }));
        let oid = self.pkg.info.add_object(Object::Var {
            name: name.to_owned(),
            ty,
        });
        self.pkg.info.defs.insert(ident, oid);
        self.pkg.info.decl_of.insert(oid, spec);
        self.scope.insert(name.to_owned(), oid);
        let decl = self.alloc(Node::GenDecl(GenDecl {
            kind: DeclKind::Var,
            specs: vec![spec],
        }));
        self.finish_decl(decl);
        decl
    }

    fn finish_decl(&mut self, decl: NodeId) {
        if self.func.is_some() {
            self.push_stmt(decl);
        } else {
            self.decls.push(decl);
            self.line += 1;
        }
    }

    /// Appends a `return results...` statement.
    pub fn ret(&mut self, results: Vec<NodeId>) -> NodeId {
        let id = self.alloc(Node::ReturnStmt(ReturnStmt { results }));
        self.push_stmt(id);
        id
    }

    /// Appends a `defer call` statement.
    pub fn defer_call(&mut self, call: NodeId) -> NodeId {
        let id = self.alloc(Node::DeferStmt(DeferStmt { call }));
        self.push_stmt(id);
        id
    }

    // ── expressions ────────────────────────────────────────────────────

    /// A string literal.
    pub fn str_lit(&mut self, value: &str) -> NodeId {
        let id = self.alloc(Node::BasicLit(BasicLit {
            kind: LitKind::String,
            value: value.to_owned(),
        }));
        self.pkg.info.types.insert(
            id,
            TypeAndValue {
                ty: Ty::basic("string"),
                value: Some(ConstValue::Str(value.to_owned())),
            },
        );
        id
    }

    /// An integer literal from its raw token text (`0600`, `0x1f`, ...).
    pub fn int_lit(&mut self, raw: &str) -> NodeId {
        self.alloc(Node::BasicLit(BasicLit {
            kind: LitKind::Int,
            value: raw.to_owned(),
        }))
    }

    /// An identifier; resolves against declared names in scope.
    pub fn ident(&mut self, name: &str) -> NodeId {
        let id = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        if let Some(&oid) = self.scope.get(name) {
            self.pkg.info.uses.insert(id, oid);
        }
        id
    }

    /// Declares a variable object without a syntax node.
    pub fn declare_var(&mut self, name: &str, ty: Ty) -> ObjectId {
        let oid = self.pkg.info.add_object(Object::Var {
            name: name.to_owned(),
            ty,
        });
        self.scope.insert(name.to_owned(), oid);
        oid
    }

    /// Registers the `new` builtin in scope.
    pub fn declare_builtin_new(&mut self) {
        let oid = self.pkg.info.add_object(Object::Builtin {
            name: "new".to_owned(),
        });
        self.scope.insert("new".to_owned(), oid);
    }

    /// Declares a package-level function object in scope.
    pub fn declare_func(&mut self, name: &str, sig: Signature) -> ObjectId {
        let oid = self.pkg.info.add_object(Object::Func {
            name: name.to_owned(),
            pkg: Some(self.pkg.path.clone()),
            sig,
        });
        self.scope.insert(name.to_owned(), oid);
        oid
    }

    /// `x.name`.
    pub fn sel(&mut self, x: NodeId, name: &str) -> NodeId {
        let sel = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        self.alloc(Node::SelectorExpr(SelectorExpr { x, sel }))
    }

    /// `pkg.name` with the package resolved from scope.
    pub fn pkg_sel(&mut self, pkg_local: &str, name: &str) -> NodeId {
        let x = self.ident(pkg_local);
        self.sel(x, name)
    }

    /// `f(args...)`.
    pub fn call(&mut self, func: NodeId, args: Vec<NodeId>) -> NodeId {
        self.alloc(Node::CallExpr(CallExpr { func, args }))
    }

    /// `pkg.name(args...)`.
    pub fn call_pkg(&mut self, pkg_local: &str, name: &str, args: Vec<NodeId>) -> NodeId {
        let func = self.pkg_sel(pkg_local, name);
        self.call(func, args)
    }

    /// `pkg.name(args...)` with the callee's signature registered, so
    /// signature-driven rules resolve it.
    pub fn call_pkg_sig(
        &mut self,
        pkg_local: &str,
        name: &str,
        sig: Signature,
        args: Vec<NodeId>,
    ) -> NodeId {
        let x = self.ident(pkg_local);
        let pkg_path = match self.scope.get(pkg_local) {
            Some(&oid) => match &self.pkg.info.objects[oid.0 as usize] {
                Object::PkgName { path, .. } => Some(path.clone()),
                _ => None,
            },
            None => None,
        };
        let sel = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        let func_obj = self.pkg.info.add_object(Object::Func {
            name: name.to_owned(),
            pkg: pkg_path,
            sig,
        });
        self.pkg.info.uses.insert(sel, func_obj);
        let func = self.alloc(Node::SelectorExpr(SelectorExpr { x, sel }));
        self.call(func, args)
    }

    /// `recv.name(args...)`.
    pub fn method_call(&mut self, recv: NodeId, name: &str, args: Vec<NodeId>) -> NodeId {
        let func = self.sel(recv, name);
        self.call(func, args)
    }

    /// `recv.name(args...)` with the method's signature registered.
    pub fn method_call_sig(
        &mut self,
        recv: NodeId,
        name: &str,
        sig: Signature,
        args: Vec<NodeId>,
    ) -> NodeId {
        let sel = self.alloc(Node::Ident(Ident {
            name: name.to_owned(),
        }));
        let func_obj = self.pkg.info.add_object(Object::Func {
            name: name.to_owned(),
            pkg: None,
            sig,
        });
        self.pkg.info.uses.insert(sel, func_obj);
        let func = self.alloc(Node::SelectorExpr(SelectorExpr { x: recv, sel }));
        self.call(func, args)
    }

    /// `x op y`.
    pub fn binary(&mut self, op: BinOp, x: NodeId, y: NodeId) -> NodeId {
        self.alloc(Node::BinaryExpr(BinaryExpr { op, x, y }))
    }

    /// `(x)`.
    pub fn paren(&mut self, x: NodeId) -> NodeId {
        self.alloc(Node::ParenExpr(ParenExpr { x }))
    }

    /// `&x`.
    pub fn addr_of(&mut self, x: NodeId) -> NodeId {
        self.alloc(Node::UnaryExpr(UnaryExpr { op: UnOp::Amp, x }))
    }

    /// A composite literal whose type the checker resolved to
    /// `pkg_path.ty_name`.
    pub fn composite(&mut self, pkg_path: &str, ty_name: &str, elts: Vec<NodeId>) -> NodeId {
        let id = self.alloc(Node::CompositeLit(CompositeLit { typ: None, elts }));
        self.pkg.info.types.insert(
            id,
            TypeAndValue {
                ty: Ty::named(pkg_path, ty_name),
                value: None,
            },
        );
        id
    }

    /// An untyped composite literal (slice literals in field values).
    pub fn composite_untyped(&mut self, elts: Vec<NodeId>) -> NodeId {
        self.alloc(Node::CompositeLit(CompositeLit { typ: None, elts }))
    }

    /// `key: value` with an identifier key.
    pub fn kv(&mut self, key: &str, value: NodeId) -> NodeId {
        let key_id = self.alloc(Node::Ident(Ident {
            name: key.to_owned(),
        }));
        self.alloc(Node::KeyValueExpr(KeyValueExpr {
            key: key_id,
            value,
        }))
    }

    // ── comments ───────────────────────────────────────────────────────

    /// Attaches a comment group to a node.
    pub fn attach_comment(&mut self, node: NodeId, text: &str) {
        let line = self.pkg.ast.span(node).start.line;
        let idx = self.comments.len();
        self.comments.push(CommentGroup {
            comments: vec![text.to_owned()],
            span: Span::line(line, 1),
        });
        self.comment_map.entry(node).or_default().push(idx);
    }

    /// Adds a file-leading comment (not attached to any node).
    pub fn file_comment(&mut self, text: &str) {
        self.comments.push(CommentGroup {
            comments: vec![text.to_owned()],
            span: Span::line(1, 1),
        });
    }

    /// Finishes the file and registers it with the package.
    pub fn finish(self) {
        let span = Span::new(Position::new(1, 1), Position::new(self.line, 1));
        let name = self.pkg.name.clone();
        let root = self.pkg.ast.alloc(
            Node::File(File {
                package_name: name,
                decls: self.decls,
            }),
            span,
        );
        self.pkg.files.push(TypedFile {
            path: self.path,
            root,
            comments: self.comments,
            comment_map: self.comment_map,
            source: self.source,
        });
    }
}

/// Builds a rule [`crate::rules::Context`] over one file of a built
/// package, the way the engine would.
#[must_use]
pub fn context_for<'a>(
    pkg: &'a TypedPackage,
    file_index: usize,
    config: &'a crate::config::ConfigStore,
) -> crate::rules::Context<'a> {
    let file = &pkg.files[file_index];
    let mut imports = crate::imports::ImportTracker::new();
    if let Node::File(f) = pkg.ast.node(file.root) {
        imports.track_file(&pkg.ast, f);
    }
    crate::rules::Context {
        ast: &pkg.ast,
        info: &pkg.info,
        file,
        pkg_path: &pkg.path,
        pkg_name: &pkg.name,
        imports,
        config,
        lang_version: LangVersion::new(1, 22),
        passed_values: FxHashMap::default(),
    }
}

/// A [`PackageLoader`] serving canned packages by path.
pub struct StubLoader {
    packages: Vec<LoadedPackage>,
    fatal_paths: FxHashSet<String>,
    build_errors: FxHashMap<String, String>,
    version: LangVersion,
}

impl StubLoader {
    /// Creates a loader over the given packages.
    #[must_use]
    pub fn new(packages: Vec<LoadedPackage>) -> Self {
        Self {
            packages,
            fatal_paths: FxHashSet::default(),
            build_errors: FxHashMap::default(),
            version: LangVersion::new(1, 22),
        }
    }

    /// Reports the given language version.
    #[must_use]
    pub fn with_version(mut self, version: LangVersion) -> Self {
        self.version = version;
        self
    }

    /// Makes loading `path` fail fatally.
    #[must_use]
    pub fn with_fatal(mut self, path: &str) -> Self {
        self.fatal_paths.insert(path.to_owned());
        self
    }

    /// Makes loading `path` fail with a build error.
    #[must_use]
    pub fn with_build_error(mut self, path: &str, message: &str) -> Self {
        self.build_errors.insert(path.to_owned(), message.to_owned());
        self
    }
}

impl PackageLoader for StubLoader {
    fn load(&self, path: &str, _include_tests: bool) -> Result<Vec<LoadedPackage>, LoadError> {
        if self.fatal_paths.contains(path) {
            return Err(LoadError::Fatal(format!("frontend crashed on {path}")));
        }
        if let Some(message) = self.build_errors.get(path) {
            return Err(LoadError::Build {
                path: path.to_owned(),
                message: message.clone(),
            });
        }
        Ok(self
            .packages
            .iter()
            .filter(|p| p.pkg.path == path)
            .cloned()
            .collect())
    }

    fn lang_version(&self) -> LangVersion {
        self.version
    }
}

/// Builds one SSA [`Function`]; def-use edges are derived on `finish`.
pub struct SsaFunctionBuilder {
    name: String,
    package: String,
    file: PathBuf,
    params: Vec<ValueId>,
    values: Vec<Value>,
}

impl SsaFunctionBuilder {
    /// Starts a function.
    #[must_use]
    pub fn new(package: &str, name: &str, file: &str) -> Self {
        Self {
            name: name.to_owned(),
            package: package.to_owned(),
            file: PathBuf::from(file),
            params: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, kind: ValueKind, ty: Option<TypeRef>, line: u32) -> ValueId {
        let id = ValueId(u32::try_from(self.values.len()).unwrap_or(u32::MAX));
        let span = (line > 0).then(|| Span::line(line, 1));
        self.values.push(Value {
            kind,
            ty,
            span,
            uses: Vec::new(),
        });
        id
    }

    /// A formal parameter of the given type.
    pub fn param(&mut self, name: &str, ty: TypeRef) -> ValueId {
        let id = self.push(
            ValueKind::Param {
                name: name.to_owned(),
            },
            Some(ty),
            0,
        );
        self.params.push(id);
        id
    }

    /// A constant.
    pub fn constant(&mut self, text: &str) -> ValueId {
        self.push(
            ValueKind::Const {
                text: text.to_owned(),
            },
            None,
            0,
        )
    }

    /// A call instruction at `line`.
    pub fn call(&mut self, callee: CalleeRef, args: Vec<ValueId>, line: u32) -> ValueId {
        self.push(ValueKind::Call(CallCommon { callee, args }), None, line)
    }

    /// A field read.
    pub fn field(&mut self, x: ValueId, name: &str) -> ValueId {
        self.push(
            ValueKind::Field {
                x,
                name: name.to_owned(),
            },
            None,
            0,
        )
    }

    /// A field read carrying the field's reported type.
    pub fn field_typed(&mut self, x: ValueId, name: &str, ty: TypeRef) -> ValueId {
        self.push(
            ValueKind::Field {
                x,
                name: name.to_owned(),
            },
            Some(ty),
            0,
        )
    }

    /// An index read.
    pub fn index(&mut self, x: ValueId, index: ValueId) -> ValueId {
        self.push(ValueKind::Index { x, index }, None, 0)
    }

    /// A phi node.
    pub fn phi(&mut self, edges: Vec<ValueId>) -> ValueId {
        self.push(ValueKind::Phi { edges }, None, 0)
    }

    /// A binary operation.
    pub fn binop(&mut self, x: ValueId, y: ValueId) -> ValueId {
        self.push(ValueKind::BinOp { x, y }, None, 0)
    }

    /// A tuple extraction.
    pub fn extract(&mut self, tuple: ValueId, index: usize) -> ValueId {
        self.push(ValueKind::Extract { tuple, index }, None, 0)
    }

    /// A type conversion.
    pub fn convert(&mut self, x: ValueId) -> ValueId {
        self.push(ValueKind::Convert { x }, None, 0)
    }

    /// Finishes the function, deriving `uses` from operands.
    #[must_use]
    pub fn finish(mut self) -> Function {
        let edges: Vec<(ValueId, ValueId)> = self
            .values
            .iter()
            .enumerate()
            .flat_map(|(i, v)| {
                let user = ValueId(u32::try_from(i).unwrap_or(u32::MAX));
                v.kind.operands().into_iter().map(move |o| (o, user))
            })
            .collect();
        for (def, user) in edges {
            self.values[def.index()].uses.push(user);
        }
        Function {
            name: self.name,
            package: self.package,
            file: self.file,
            params: self.params,
            values: self.values,
        }
    }
}

/// Wraps functions as a program.
#[must_use]
pub fn ssa_program(functions: Vec<Function>) -> SsaProgram {
    SsaProgram { functions }
}
