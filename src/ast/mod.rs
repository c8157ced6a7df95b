//! AST module for the mupp expansion engine.
//!
//! This module provides the core syntax-tree types the expander rewrites.
//! The tree models the statement/expression subset of Go that macro
//! expansion has to understand; it is produced by an external front end
//! (deserialized from JSON by the CLI, or built programmatically via
//! [`builder`]) and serialized back to source text by [`crate::emit`].
//!
//! The node set is a closed tagged-variant type: every consumer matches
//! exhaustively, so adding a new shape is a compile-time event for every
//! expander rather than a silently skipped case.
//!
//! All nodes carry a [`Span`] for source tracking; enables better errors
//! and the `file:line` prefixes of the logging expander.

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the source code.
///
/// `line` is the 1-based source line of the node start, as recorded by the
/// front end; zero when the tree was synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    #[serde(default)]
    pub line: u32,
}

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Ident { name: name.into(), span: Span::default() }
    }
}

/// Literal constant kinds, carried with their source rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `&x`
    Addr,
    /// `*x`
    Deref,
    /// `!x`
    Not,
    /// `-x`
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Assignment statement token: `:=` (short variable declaration) or `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Define,
    Assign,
}

/// Type expressions, as they appear in declarations and composite literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A (possibly package-qualified) type name, e.g. `int`, `time.Time`.
    Named(Ident),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Func(Box<FuncType>),
    /// `...T`, only valid as the final parameter type.
    Ellipsis(Box<TypeExpr>),
    /// The empty `interface{}`.
    Interface,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(Ident::new(name))
    }

    /// Returns the underlying type name, looking through one pointer level.
    /// This is the shape method receivers are allowed to take; anything else
    /// is reported by the registry as an unsupported receiver.
    pub fn receiver_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(id) => Some(&id.name),
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Named(id) => Some(&id.name),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One parameter or result group: `a, b int` is a single field with two
/// names. Result fields are commonly unnamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    pub typ: TypeExpr,
}

impl Field {
    pub fn new(names: Vec<Ident>, typ: TypeExpr) -> Self {
        Field { names, typ }
    }

    pub fn unnamed(typ: TypeExpr) -> Self {
        Field { names: vec![], typ }
    }
}

/// A function signature: parameter and result field lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FuncType {
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
}

impl FuncType {
    /// Number of parameters, counting each name in a shared-type group.
    /// An unnamed parameter field still counts as one parameter.
    pub fn param_count(&self) -> usize {
        self.params.iter().map(|f| f.names.len().max(1)).sum()
    }

    /// Number of declared results, counting each name in a shared-type group.
    pub fn result_count(&self) -> usize {
        self.results.iter().map(|f| f.names.len().max(1)).sum()
    }

    /// The type of the last declared result, if any.
    pub fn last_result(&self) -> Option<&TypeExpr> {
        self.results.last().map(|f| &f.typ)
    }
}

/// A call expression. The callee may itself be a call, which is how fluent
/// pipeline chains appear in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub func: Box<Expr>,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// The core expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    Lit {
        kind: LitKind,
        value: String,
        #[serde(default)]
        span: Span,
    },
    Selector {
        expr: Box<Expr>,
        sel: Ident,
        #[serde(default)]
        span: Span,
    },
    Call(CallExpr),
    FuncLit {
        sig: FuncType,
        body: Block,
        #[serde(default)]
        span: Span,
    },
    /// A composite literal, e.g. `[]int{}` or `styp{n}`.
    Composite {
        typ: TypeExpr,
        #[serde(default)]
        elems: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(id) => id.span,
            Expr::Lit { span, .. } => *span,
            Expr::Selector { span, .. } => *span,
            Expr::Call(call) => call.span,
            Expr::FuncLit { span, .. } => *span,
            Expr::Composite { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Index { span, .. } => *span,
        }
    }

    /// Returns the identifier if this expression is a bare name.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_lit(&self) -> bool {
        matches!(self, Expr::Lit { .. })
    }
}

/// A brace-delimited statement sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts, span: Span::default() }
    }
}

/// One `case`/`default` clause of a switch statement. An empty expression
/// list marks the default clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub exprs: Vec<Expr>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

/// The core statement node. This is the granularity at which the walker
/// matches call sites and at which expanders splice replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// `var name typ`
    Var {
        name: Ident,
        typ: TypeExpr,
        #[serde(default)]
        span: Span,
    },
    Return {
        #[serde(default)]
        results: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    If {
        cond: Expr,
        then: Block,
        /// `else` branch: either a Block or another If (else-if chain).
        els: Option<Box<Stmt>>,
        #[serde(default)]
        span: Span,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
        #[serde(default)]
        span: Span,
    },
    /// `for key, value := range expr { ... }`
    Range {
        key: Ident,
        value: Option<Ident>,
        expr: Expr,
        body: Block,
        #[serde(default)]
        span: Span,
    },
    Switch {
        tag: Option<Expr>,
        #[serde(default)]
        cases: Vec<SwitchCase>,
        #[serde(default)]
        span: Span,
    },
    Block(Block),
    /// `x++` / `x--`
    IncDec {
        expr: Expr,
        inc: bool,
        #[serde(default)]
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span(),
            Stmt::Assign { span, .. } => *span,
            Stmt::Var { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::For { span, .. } => *span,
            Stmt::Range { span, .. } => *span,
            Stmt::Switch { span, .. } => *span,
            Stmt::Block(b) => b.span,
            Stmt::IncDec { span, .. } => *span,
        }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    /// Method receiver, absent for plain functions.
    #[serde(default)]
    pub recv: Option<Field>,
    #[serde(default)]
    pub sig: FuncType,
    #[serde(default)]
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// Top-level declarations. Only functions participate in macro expansion;
/// type declarations are carried through for re-emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Func(FuncDecl),
    Type {
        name: Ident,
        typ: TypeExpr,
        #[serde(default)]
        span: Span,
    },
}

/// A single import line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    #[serde(default)]
    pub alias: Option<String>,
    pub path: String,
}

impl Import {
    /// The name the import is referred to by in this file: the explicit
    /// alias, or the last path segment.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(a) => a,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// One parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub package: String,
    /// Path of the unit, relative to the source root where available.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

impl File {
    /// Adds an import for `path` unless one is already present.
    pub fn ensure_import(&mut self, path: &str) {
        if self.imports.iter().any(|im| im.path == path) {
            return;
        }
        self.imports.push(Import { alias: None, path: path.to_string() });
    }
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod builder;
