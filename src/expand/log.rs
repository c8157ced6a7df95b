//! Diagnostic logging expander.
//!
//! `Log_μ(">> msg", total)` becomes a `fmt.Printf` whose format string
//! opens with the call site's `path:line ` prefix: literal arguments print
//! as `%v`, anything else prints as `<source>=%#v` with its rendered source
//! text as the label (double quotes swapped for single so the label nests
//! inside the format string).
//!
//! When a line filter is configured, non-matching call sites are rewritten
//! to a no-op stub instead of removed, keeping argument expressions alive
//! for the compiler.

use crate::ast::builder::*;
use crate::ast::{Expr, FuncDecl, LitKind, Stmt, TypeExpr};
use crate::diagnostics::ExpandError;
use crate::emit::render_expr;
use crate::resolve::CallChain;

use super::{Expander, Outcome};

/// Stub the filter swaps in for muted call sites.
pub const LOG_STUB_NAME: &str = "__nooplog_";

pub(crate) fn expand(
    ex: &mut Expander,
    stmt: &Stmt,
    chain: &CallChain,
) -> Result<Outcome, ExpandError> {
    let Stmt::Expr(Expr::Call(call_expr)) = stmt else {
        log::warn!("Log_μ produces no value; skipping call in assignment position");
        return Ok(Outcome::Skip);
    };
    let args = &chain.args[chain.len() - 1];
    if args.is_empty() {
        return Ok(Outcome::Skip);
    }
    let head = chain.head();
    let line = if head.span.line != 0 { head.span.line } else { call_expr.span.line };
    let prefix = format!("{} ", ex.ctx.position(line));

    if let Some(filter) = &ex.ctx.log_filter {
        if !filter.is_match(&prefix) {
            ex.ctx.needs_log_stub = true;
            let stub = call(ident_expr(LOG_STUB_NAME), args.clone());
            return Ok(Outcome::Splice(vec![expr_stmt(stub)]));
        }
    }

    let mut format_str = prefix;
    for arg in args {
        if arg.is_lit() {
            format_str.push_str("%v ");
        } else {
            let label = render_expr(arg).replace('"', "'");
            format_str.push_str(&label);
            format_str.push_str("=%#v ");
        }
    }
    let format_str = format_str.trim_end().to_string();
    let format_lit = Expr::Lit {
        kind: LitKind::String,
        value: format!("\"{format_str}\\n\""),
        span: Default::default(),
    };
    let mut printf_args = vec![format_lit];
    printf_args.extend(args.iter().cloned());
    ex.ctx.needs_fmt_import = true;
    Ok(Outcome::Splice(vec![expr_stmt(call_sel("fmt", "Printf", printf_args))]))
}

/// `func __nooplog_(args ...interface{}) {}`, appended once per file that
/// had a call site muted.
pub(crate) fn noop_log_decl() -> FuncDecl {
    func_decl(
        LOG_STUB_NAME,
        sig(
            vec![field(&["args"], TypeExpr::Ellipsis(Box::new(TypeExpr::Interface)))],
            vec![],
        ),
        vec![],
    )
}
