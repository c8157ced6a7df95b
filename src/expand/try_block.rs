//! Error-wrapping expander.
//!
//! `err := Try_μ(func() error { ... })` becomes an immediately invoked
//! literal in which every error-producing call statement is checked and
//! wrapped with the call's dotted name. Two statement shapes qualify, and
//! the rewrite descends into nested conditionals, loops, and switches to
//! find them:
//!
//! ```text
//! x, _ = f()        // muted assignment, f's last result is error
//! g()               // bare call, g's last result is error
//! ```
//!
//! both become
//!
//! ```text
//! x, err = f()
//! if err != nil {
//!     return fmt.Errorf("f: %w", err)
//! }
//! ```
//!
//! Calls whose signatures the type seam does not know keep their original
//! form; only a known error producer earns a check.

use crate::ast::builder::*;
use crate::ast::{AssignOp, BinaryOp, Block, CallExpr, Expr, Stmt};
use crate::diagnostics::{ErrorContext, ExpandError};
use crate::resolve::{fn_name_from_call, CallChain};

use super::{Expander, Outcome};

const ERR_NAME: &str = "err";

pub(crate) fn expand(
    ex: &mut Expander,
    stmt: &Stmt,
    chain: &CallChain,
) -> Result<Outcome, ExpandError> {
    let Stmt::Assign { lhs, op, span, .. } = stmt else {
        return Err(ExpandError::UnsupportedShape {
            message: "Try_μ result must be assigned to an error variable".to_string(),
            ctx: ErrorContext::with_help(
                stmt.span(),
                "write `err := Try_μ(func() error { ... })`",
            ),
        });
    };
    let args = &chain.args[chain.len() - 1];
    let Some(Expr::FuncLit { sig, body, .. }) = args.first() else {
        log::warn!("Try_μ expects a function literal argument; skipping");
        return Ok(Outcome::Skip);
    };

    let mut stmts = vec![var_decl(ERR_NAME, named("error"))];
    stmts.extend(rewrite_stmts(ex, &body.stmts));
    // the literal's trailing `return nil` now reports the tracked error
    if let Some(Stmt::Return { results, .. }) = stmts.last_mut() {
        if let Some(first) = results.first_mut() {
            *first = ident_expr(ERR_NAME);
        }
    }

    let lit = Expr::FuncLit { sig: sig.clone(), body: Block::new(stmts), span: *span };
    Ok(Outcome::Splice(vec![Stmt::Assign {
        lhs: lhs.clone(),
        op: *op,
        rhs: vec![call(lit, vec![])],
        span: *span,
    }]))
}

/// Applies the error-check rewrite over one statement list, descending into
/// the bodies of nested control flow. An early return synthesized inside a
/// loop or conditional still exits the wrapping literal.
fn rewrite_stmts(ex: &mut Expander, stmts: &[Stmt]) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        let mut stmt = stmt.clone();
        let mut check = None;
        let mut replace = None;
        match &mut stmt {
            Stmt::Assign { lhs, rhs, .. } => {
                if let Some(call_name) = muted_error_call(ex, lhs, rhs) {
                    if let Some(Expr::Ident(last)) = lhs.last_mut() {
                        last.name = ERR_NAME.to_string();
                    }
                    check = Some(if_err_return(&call_name));
                }
            }
            Stmt::Expr(Expr::Call(call_expr)) => {
                if let Some((call_name, results)) = bare_error_call(ex, call_expr) {
                    let mut lhs: Vec<Expr> = vec![ident_expr("_"); results - 1];
                    lhs.push(ident_expr(ERR_NAME));
                    replace = Some(Stmt::Assign {
                        lhs,
                        op: AssignOp::Assign,
                        rhs: vec![Expr::Call(call_expr.clone())],
                        span: call_expr.span,
                    });
                    check = Some(if_err_return(&call_name));
                }
            }
            Stmt::If { then, els, .. } => {
                then.stmts = rewrite_stmts(ex, &then.stmts);
                if let Some(els) = els.as_deref_mut() {
                    rewrite_branch(ex, els);
                }
            }
            Stmt::For { body, .. } | Stmt::Range { body, .. } => {
                body.stmts = rewrite_stmts(ex, &body.stmts);
            }
            Stmt::Switch { cases, .. } => {
                for case in cases {
                    case.stmts = rewrite_stmts(ex, &case.stmts);
                }
            }
            Stmt::Block(block) => {
                block.stmts = rewrite_stmts(ex, &block.stmts);
            }
            _ => {}
        }
        if let Some(replace) = replace {
            stmt = replace;
        }
        out.push(stmt);
        if let Some(check) = check {
            ex.ctx.needs_fmt_import = true;
            out.push(check);
        }
    }
    out
}

/// An `else` arm: a block, or another `if` continuing the chain.
fn rewrite_branch(ex: &mut Expander, stmt: &mut Stmt) {
    match stmt {
        Stmt::If { then, els, .. } => {
            then.stmts = rewrite_stmts(ex, &then.stmts);
            if let Some(els) = els.as_deref_mut() {
                rewrite_branch(ex, els);
            }
        }
        Stmt::Block(block) => {
            block.stmts = rewrite_stmts(ex, &block.stmts);
        }
        _ => {}
    }
}

/// A wrappable assignment: the final left-hand name is `_`, the right-hand
/// side is a single call, and that call's last declared result is `error`.
/// Returns the call's dotted name.
fn muted_error_call(ex: &Expander, lhs: &[Expr], rhs: &[Expr]) -> Option<String> {
    let last = lhs.last()?.as_ident()?;
    if last.name != "_" {
        return None;
    }
    let call = rhs.first()?.as_call()?;
    let call_name = fn_name_from_call(call).ok()?;
    if !ex.types.returns_error(&call_name) {
        return None;
    }
    Some(call_name)
}

/// A wrappable bare call statement: the callee's last declared result is
/// `error`. Returns the call's dotted name and its result count, so the
/// rewrite can blank every result but the error.
fn bare_error_call(ex: &Expander, call_expr: &CallExpr) -> Option<(String, usize)> {
    let call_name = fn_name_from_call(call_expr).ok()?;
    if !ex.types.returns_error(&call_name) {
        return None;
    }
    let results = ex.types.signature_of(&call_name)?.result_count();
    Some((call_name, results))
}

fn if_err_return(call_name: &str) -> Stmt {
    if_stmt(
        binary(BinaryOp::Ne, ident_expr(ERR_NAME), nil()),
        vec![ret(vec![call_sel(
            "fmt",
            "Errorf",
            vec![str_lit(&format!("{call_name}: %w")), ident_expr(ERR_NAME)],
        )])],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit_stmt;

    #[test]
    fn error_check_shape() {
        let text = emit_stmt(&if_err_return("strconv.ParseFloat"));
        assert_eq!(
            text,
            "if err != nil {\n\treturn fmt.Errorf(\"strconv.ParseFloat: %w\", err)\n}\n"
        );
    }
}
