//! Arena-backed syntax tree for the analyzed Go source.
//!
//! The external frontend hands every file over as nodes in a flat arena;
//! a [`NodeId`] is an index into it. Keying side-tables (types, comments,
//! suppressions) by `NodeId` keeps them plain maps instead of requiring
//! node identity tricks.

use serde::Serialize;
use smallvec::SmallVec;

/// A line/column pair, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

impl Position {
    /// Creates a position from a line/column pair.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The source extent of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    /// First position covered by the node.
    pub start: Position,
    /// Last position covered by the node.
    pub end: Position,
}

impl Span {
    /// Creates a span covering `start..=end`.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A single-line span at `line`, starting at `column`.
    #[must_use]
    pub fn line(line: u32, column: u32) -> Self {
        Self {
            start: Position::new(line, column),
            end: Position::new(line, column),
        }
    }

    /// Whether the span covers the given line.
    #[must_use]
    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the arena index as `usize`.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    /// String literal; the stored value is the cooked (unquoted) text.
    String,
    /// Integer literal; the stored value is the raw token (`0600`, `0x1f`, ...).
    Int,
    /// Floating-point literal.
    Float,
    /// Character (rune) literal; the stored value is the cooked character.
    Char,
}

/// Binary operators the rules care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `&&`
    LAnd,
    /// `||`
    LOr,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// `&` address-of.
    Amp,
    /// `!`
    Not,
    /// `-`
    Neg,
}

/// The kind of declaration a [`GenDecl`] groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `import ( ... )`
    Import,
    /// `const ( ... )`
    Const,
    /// `var ( ... )`
    Var,
}

/// An identifier.
#[derive(Debug, Clone)]
pub struct Ident {
    /// The identifier text.
    pub name: String,
}

/// A literal token.
#[derive(Debug, Clone)]
pub struct BasicLit {
    /// Literal kind.
    pub kind: LitKind,
    /// Literal value; see [`LitKind`] for the stored form.
    pub value: String,
}

/// `x op y`.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    /// Operator.
    pub op: BinOp,
    /// Left operand.
    pub x: NodeId,
    /// Right operand.
    pub y: NodeId,
}

/// `op x`.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    /// Operator.
    pub op: UnOp,
    /// Operand.
    pub x: NodeId,
}

/// `(x)`.
#[derive(Debug, Clone)]
pub struct ParenExpr {
    /// Inner expression.
    pub x: NodeId,
}

/// `x.sel`.
#[derive(Debug, Clone)]
pub struct SelectorExpr {
    /// Receiver or package expression.
    pub x: NodeId,
    /// Selected identifier.
    pub sel: NodeId,
}

/// `*x` in type or expression position.
#[derive(Debug, Clone)]
pub struct StarExpr {
    /// Operand.
    pub x: NodeId,
}

/// `f(args...)`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Callee expression.
    pub func: NodeId,
    /// Argument expressions.
    pub args: Vec<NodeId>,
}

/// `T{elts...}`.
#[derive(Debug, Clone)]
pub struct CompositeLit {
    /// Literal type expression, when spelled out.
    pub typ: Option<NodeId>,
    /// Element expressions ([`KeyValueExpr`] for keyed literals).
    pub elts: Vec<NodeId>,
}

/// `key: value` inside a composite literal.
#[derive(Debug, Clone)]
pub struct KeyValueExpr {
    /// Key expression (an [`Ident`] for struct fields).
    pub key: NodeId,
    /// Value expression.
    pub value: NodeId,
}

/// A single import line.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Alias identifier; `_` marks an init-only import.
    pub name: Option<NodeId>,
    /// Import path literal.
    pub path: NodeId,
}

/// `name [type] = value` inside a const/var declaration.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    /// Declared identifiers.
    pub names: Vec<NodeId>,
    /// Initialiser expressions, parallel to `names` when present.
    pub values: Vec<NodeId>,
}

/// A grouped declaration (`import`, `const`, `var`).
#[derive(Debug, Clone)]
pub struct GenDecl {
    /// What the group declares.
    pub kind: DeclKind,
    /// The contained specs.
    pub specs: Vec<NodeId>,
}

/// A function declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Function name identifier.
    pub name: NodeId,
    /// Parameter identifiers.
    pub params: Vec<NodeId>,
    /// Body block; absent for external declarations.
    pub body: Option<NodeId>,
}

/// `{ stmts... }`.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    /// Contained statements.
    pub stmts: Vec<NodeId>,
}

/// An expression used as a statement.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    /// The expression.
    pub x: NodeId,
}

/// `lhs... = rhs...` or `lhs... := rhs...`.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    /// Left-hand sides.
    pub lhs: Vec<NodeId>,
    /// Right-hand sides.
    pub rhs: Vec<NodeId>,
    /// Whether this is a short variable declaration (`:=`).
    pub define: bool,
}

/// `defer call`.
#[derive(Debug, Clone)]
pub struct DeferStmt {
    /// Deferred call expression.
    pub call: NodeId,
}

/// `return results...`.
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    /// Returned expressions.
    pub results: Vec<NodeId>,
}

/// `if cond { } else { }`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// Condition expression.
    pub cond: NodeId,
    /// Then block.
    pub body: NodeId,
    /// Optional else branch (block or nested if).
    pub els: Option<NodeId>,
}

/// `for key, value := range x { }`.
#[derive(Debug, Clone)]
pub struct RangeStmt {
    /// Key binding, when named.
    pub key: Option<NodeId>,
    /// Value binding, when named.
    pub value: Option<NodeId>,
    /// Ranged-over expression.
    pub x: NodeId,
    /// Loop body block.
    pub body: NodeId,
}

/// A source file: package clause plus top-level declarations.
#[derive(Debug, Clone)]
pub struct File {
    /// Declared package name.
    pub package_name: String,
    /// Top-level declarations in source order.
    pub decls: Vec<NodeId>,
}

/// One syntax node. Every variant carries its children by [`NodeId`].
#[derive(Debug, Clone)]
pub enum Node {
    /// See [`File`].
    File(File),
    /// See [`Ident`].
    Ident(Ident),
    /// See [`BasicLit`].
    BasicLit(BasicLit),
    /// See [`BinaryExpr`].
    BinaryExpr(BinaryExpr),
    /// See [`UnaryExpr`].
    UnaryExpr(UnaryExpr),
    /// See [`ParenExpr`].
    ParenExpr(ParenExpr),
    /// See [`SelectorExpr`].
    SelectorExpr(SelectorExpr),
    /// See [`StarExpr`].
    StarExpr(StarExpr),
    /// See [`CallExpr`].
    CallExpr(CallExpr),
    /// See [`CompositeLit`].
    CompositeLit(CompositeLit),
    /// See [`KeyValueExpr`].
    KeyValueExpr(KeyValueExpr),
    /// See [`ImportSpec`].
    ImportSpec(ImportSpec),
    /// See [`ValueSpec`].
    ValueSpec(ValueSpec),
    /// See [`GenDecl`].
    GenDecl(GenDecl),
    /// See [`FuncDecl`].
    FuncDecl(FuncDecl),
    /// See [`BlockStmt`].
    BlockStmt(BlockStmt),
    /// See [`ExprStmt`].
    ExprStmt(ExprStmt),
    /// See [`AssignStmt`].
    AssignStmt(AssignStmt),
    /// See [`DeferStmt`].
    DeferStmt(DeferStmt),
    /// See [`ReturnStmt`].
    ReturnStmt(ReturnStmt),
    /// See [`IfStmt`].
    IfStmt(IfStmt),
    /// See [`RangeStmt`].
    RangeStmt(RangeStmt),
}

/// Flat discriminant of [`Node`], used to register rules against kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A source file node.
    File,
    /// An identifier.
    Ident,
    /// A literal.
    BasicLit,
    /// A binary expression.
    BinaryExpr,
    /// A unary expression.
    UnaryExpr,
    /// A parenthesised expression.
    ParenExpr,
    /// A selector expression.
    SelectorExpr,
    /// A star expression.
    StarExpr,
    /// A call expression.
    CallExpr,
    /// A composite literal.
    CompositeLit,
    /// A key/value element.
    KeyValueExpr,
    /// An import spec.
    ImportSpec,
    /// A const/var value spec.
    ValueSpec,
    /// A grouped declaration.
    GenDecl,
    /// A function declaration.
    FuncDecl,
    /// A block statement.
    BlockStmt,
    /// An expression statement.
    ExprStmt,
    /// An assignment statement.
    AssignStmt,
    /// A defer statement.
    DeferStmt,
    /// A return statement.
    ReturnStmt,
    /// An if statement.
    IfStmt,
    /// A range statement.
    RangeStmt,
}

impl Node {
    /// Returns the flat kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Ident(_) => NodeKind::Ident,
            Node::BasicLit(_) => NodeKind::BasicLit,
            Node::BinaryExpr(_) => NodeKind::BinaryExpr,
            Node::UnaryExpr(_) => NodeKind::UnaryExpr,
            Node::ParenExpr(_) => NodeKind::ParenExpr,
            Node::SelectorExpr(_) => NodeKind::SelectorExpr,
            Node::StarExpr(_) => NodeKind::StarExpr,
            Node::CallExpr(_) => NodeKind::CallExpr,
            Node::CompositeLit(_) => NodeKind::CompositeLit,
            Node::KeyValueExpr(_) => NodeKind::KeyValueExpr,
            Node::ImportSpec(_) => NodeKind::ImportSpec,
            Node::ValueSpec(_) => NodeKind::ValueSpec,
            Node::GenDecl(_) => NodeKind::GenDecl,
            Node::FuncDecl(_) => NodeKind::FuncDecl,
            Node::BlockStmt(_) => NodeKind::BlockStmt,
            Node::ExprStmt(_) => NodeKind::ExprStmt,
            Node::AssignStmt(_) => NodeKind::AssignStmt,
            Node::DeferStmt(_) => NodeKind::DeferStmt,
            Node::ReturnStmt(_) => NodeKind::ReturnStmt,
            Node::IfStmt(_) => NodeKind::IfStmt,
            Node::RangeStmt(_) => NodeKind::RangeStmt,
        }
    }
}

/// A consecutive run of comments attached to one syntactic position.
#[derive(Debug, Clone)]
pub struct CommentGroup {
    /// Raw comment texts, markers included (`// ...` or `/* ... */`).
    pub comments: Vec<String>,
    /// Extent of the group.
    pub span: Span,
}

/// The node arena for one package.
#[derive(Debug, Default, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    spans: Vec<Span>,
}

impl Ast {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node and returns its id.
    pub fn alloc(&mut self, node: Node, span: Span) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        self.spans.push(span);
        id
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics when `id` was not allocated by this arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the span of `id`.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.index()]
    }

    /// Widens the recorded span of `id` (used when a block is closed).
    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.spans[id.index()] = span;
    }

    /// Number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The identifier text of `id`, when it is an [`Ident`].
    #[must_use]
    pub fn ident_name(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Ident(i) => Some(&i.name),
            _ => None,
        }
    }

    /// The node as a call expression, when it is one.
    #[must_use]
    pub fn as_call(&self, id: NodeId) -> Option<&CallExpr> {
        match self.node(id) {
            Node::CallExpr(c) => Some(c),
            _ => None,
        }
    }

    /// The node as a literal, when it is one.
    #[must_use]
    pub fn as_lit(&self, id: NodeId) -> Option<&BasicLit> {
        match self.node(id) {
            Node::BasicLit(l) => Some(l),
            _ => None,
        }
    }

    /// The node with parentheses stripped.
    #[must_use]
    pub fn unparen(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Node::ParenExpr(p) = self.node(cur) {
            cur = p.x;
        }
        cur
    }

    /// Children of `id` in source order. Drives the engine's walk.
    #[must_use]
    pub fn children(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self.node(id) {
            Node::File(f) => out.extend(f.decls.iter().copied()),
            Node::Ident(_) | Node::BasicLit(_) => {}
            Node::BinaryExpr(b) => {
                out.push(b.x);
                out.push(b.y);
            }
            Node::UnaryExpr(u) => out.push(u.x),
            Node::ParenExpr(p) => out.push(p.x),
            Node::SelectorExpr(s) => {
                out.push(s.x);
                out.push(s.sel);
            }
            Node::StarExpr(s) => out.push(s.x),
            Node::CallExpr(c) => {
                out.push(c.func);
                out.extend(c.args.iter().copied());
            }
            Node::CompositeLit(c) => {
                if let Some(t) = c.typ {
                    out.push(t);
                }
                out.extend(c.elts.iter().copied());
            }
            Node::KeyValueExpr(kv) => {
                out.push(kv.key);
                out.push(kv.value);
            }
            Node::ImportSpec(s) => {
                if let Some(n) = s.name {
                    out.push(n);
                }
                out.push(s.path);
            }
            Node::ValueSpec(v) => {
                out.extend(v.names.iter().copied());
                out.extend(v.values.iter().copied());
            }
            Node::GenDecl(d) => out.extend(d.specs.iter().copied()),
            Node::FuncDecl(f) => {
                out.push(f.name);
                out.extend(f.params.iter().copied());
                if let Some(b) = f.body {
                    out.push(b);
                }
            }
            Node::BlockStmt(b) => out.extend(b.stmts.iter().copied()),
            Node::ExprStmt(e) => out.push(e.x),
            Node::AssignStmt(a) => {
                out.extend(a.lhs.iter().copied());
                out.extend(a.rhs.iter().copied());
            }
            Node::DeferStmt(d) => out.push(d.call),
            Node::ReturnStmt(r) => out.extend(r.results.iter().copied()),
            Node::IfStmt(i) => {
                out.push(i.cond);
                out.push(i.body);
                if let Some(e) = i.els {
                    out.push(e);
                }
            }
            Node::RangeStmt(r) => {
                if let Some(k) = r.key {
                    out.push(k);
                }
                if let Some(v) = r.value {
                    out.push(v);
                }
                out.push(r.x);
                out.push(r.body);
            }
        }
        out
    }
}
