//! Node constructors for synthesized code.
//!
//! Expanders and the standard macro library build replacement trees with
//! these helpers instead of spelling out struct literals. Synthesized nodes
//! carry default (zero) spans; splices inherit diagnostic positions from the
//! call site they replace.

use super::{
    AssignOp, BinaryOp, Block, CallExpr, Expr, Field, FuncDecl, FuncType, Ident, LitKind, Stmt,
    TypeExpr, UnaryOp,
};

pub fn ident(name: impl Into<String>) -> Ident {
    Ident::new(name)
}

pub fn ident_expr(name: impl Into<String>) -> Expr {
    Expr::Ident(Ident::new(name))
}

/// The untyped nil identifier.
pub fn nil() -> Expr {
    ident_expr("nil")
}

pub fn str_lit(text: &str) -> Expr {
    Expr::Lit {
        kind: LitKind::String,
        value: format!("\"{}\"", text),
        span: Default::default(),
    }
}

pub fn int_lit(n: i64) -> Expr {
    Expr::Lit { kind: LitKind::Int, value: n.to_string(), span: Default::default() }
}

pub fn sel(expr: Expr, name: impl Into<String>) -> Expr {
    Expr::Selector { expr: Box::new(expr), sel: Ident::new(name), span: Default::default() }
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr { func: Box::new(func), args, span: Default::default() })
}

/// `pkg.name(args...)`, the common qualified call shape.
pub fn call_sel(pkg: &str, name: &str, args: Vec<Expr>) -> Expr {
    call(sel(ident_expr(pkg), name), args)
}

pub fn addr(expr: Expr) -> Expr {
    Expr::Unary { op: UnaryOp::Addr, expr: Box::new(expr), span: Default::default() }
}

pub fn deref(expr: Expr) -> Expr {
    Expr::Unary { op: UnaryOp::Deref, expr: Box::new(expr), span: Default::default() }
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span: Default::default() }
}

pub fn index(expr: Expr, idx: Expr) -> Expr {
    Expr::Index { expr: Box::new(expr), index: Box::new(idx), span: Default::default() }
}

pub fn composite(typ: TypeExpr, elems: Vec<Expr>) -> Expr {
    Expr::Composite { typ, elems, span: Default::default() }
}

pub fn func_lit(sig: FuncType, stmts: Vec<Stmt>) -> Expr {
    Expr::FuncLit { sig, body: Block::new(stmts), span: Default::default() }
}

pub fn slice_of(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Slice(Box::new(elem))
}

pub fn ptr_to(typ: TypeExpr) -> TypeExpr {
    TypeExpr::Pointer(Box::new(typ))
}

pub fn map_of(key: TypeExpr, value: TypeExpr) -> TypeExpr {
    TypeExpr::Map(Box::new(key), Box::new(value))
}

pub fn named(name: impl Into<String>) -> TypeExpr {
    TypeExpr::named(name)
}

pub fn field(names: &[&str], typ: TypeExpr) -> Field {
    Field::new(names.iter().map(|n| Ident::new(*n)).collect(), typ)
}

pub fn sig(params: Vec<Field>, results: Vec<Field>) -> FuncType {
    FuncType { params, results }
}

/// `name := rhs`
pub fn define(name: &str, rhs: Expr) -> Stmt {
    Stmt::Assign {
        lhs: vec![ident_expr(name)],
        op: AssignOp::Define,
        rhs: vec![rhs],
        span: Default::default(),
    }
}

pub fn assign(lhs: Vec<Expr>, rhs: Vec<Expr>) -> Stmt {
    Stmt::Assign { lhs, op: AssignOp::Assign, rhs, span: Default::default() }
}

/// `var name typ`
pub fn var_decl(name: &str, typ: TypeExpr) -> Stmt {
    Stmt::Var { name: Ident::new(name), typ, span: Default::default() }
}

pub fn ret(results: Vec<Expr>) -> Stmt {
    Stmt::Return { results, span: Default::default() }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

pub fn if_stmt(cond: Expr, then: Vec<Stmt>) -> Stmt {
    Stmt::If { cond, then: Block::new(then), els: None, span: Default::default() }
}

/// `for key := range expr { ... }` / `for key, value := range expr { ... }`
pub fn range_stmt(key: &str, value: Option<&str>, expr: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::Range {
        key: Ident::new(key),
        value: value.map(Ident::new),
        expr,
        body: Block::new(body),
        span: Default::default(),
    }
}

pub fn func_decl(name: &str, signature: FuncType, stmts: Vec<Stmt>) -> FuncDecl {
    FuncDecl {
        name: Ident::new(name),
        recv: None,
        sig: signature,
        body: Block::new(stmts),
        span: Default::default(),
    }
}

pub fn method_decl(recv_name: &str, recv_typ: TypeExpr, name: &str, signature: FuncType, stmts: Vec<Stmt>) -> FuncDecl {
    FuncDecl {
        name: Ident::new(name),
        recv: Some(Field::new(vec![Ident::new(recv_name)], recv_typ)),
        sig: signature,
        body: Block::new(stmts),
        span: Default::default(),
    }
}
