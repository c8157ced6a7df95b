//! Generic macro inliner.
//!
//! The default expansion for any marker-suffixed call with no special
//! family: copy the declaration body, drop its `return` statements, and
//! overwrite the right-hand sides of the body's parameter-binding
//! assignments with the call-site arguments. The copy is spliced as a block
//! statement, so bindings stay scoped to the expansion.

use crate::ast::{Block, Expr, FuncDecl, Span, Stmt};
use crate::diagnostics::{ErrorContext, ExpandError};
use crate::registry::is_macro_name;
use crate::resolve::CallChain;

use super::{as_block, Expander, Outcome};

pub(crate) fn expand(
    ex: &mut Expander,
    stmt: &Stmt,
    chain: &CallChain,
) -> Result<Outcome, ExpandError> {
    if !matches!(stmt, Stmt::Expr(_)) {
        log::warn!(
            "macro `{}` produces no value; skipping call in assignment position",
            chain.head().name
        );
        return Ok(Outcome::Skip);
    }
    // A chain may hold several macro segments; each expands to its own
    // scoped block, in call order.
    let mut blocks = Vec::new();
    for (seg, args) in chain.idents.iter().zip(chain.args.iter()) {
        if !is_macro_name(&seg.name) {
            continue;
        }
        let Some(decl) = ex.registry.lookup(&seg.name) else {
            log::warn!("macro declaration not found for `{}`", seg.name);
            continue;
        };
        let body = splice_body(&seg.name, decl, args, seg.span)?;
        blocks.push(Stmt::Block(Block::new(body)));
    }
    match blocks.len() {
        0 => Ok(Outcome::Skip),
        1 => Ok(Outcome::Splice(blocks)),
        _ => Ok(Outcome::Splice(vec![as_block(blocks)])),
    }
}

/// Instantiates a macro body for one call: returns are stripped, and the
/// top-level assignment statements, in order, act as parameter slots whose
/// right-hand sides are replaced by the call arguments.
pub(crate) fn splice_body(
    macro_name: &str,
    decl: &FuncDecl,
    args: &[Expr],
    call_span: Span,
) -> Result<Vec<Stmt>, ExpandError> {
    let mut body: Vec<Stmt> = decl
        .body
        .stmts
        .iter()
        .filter(|s| !matches!(s, Stmt::Return { .. }))
        .cloned()
        .collect();
    let mut slots: Vec<&mut Stmt> = body
        .iter_mut()
        .filter(|s| matches!(s, Stmt::Assign { .. }))
        .collect();
    if args.len() > slots.len() {
        return Err(ExpandError::ArgumentCountMismatch {
            macro_name: macro_name.to_string(),
            expected: slots.len(),
            found: args.len(),
            ctx: ErrorContext::with_help(
                call_span,
                "each argument needs a matching assignment at the top of the macro body",
            ),
        });
    }
    for (slot, arg) in slots.iter_mut().zip(args.iter()) {
        let Stmt::Assign { lhs, rhs, .. } = &mut **slot else {
            unreachable!();
        };
        if lhs.len() != 1 {
            return Err(ExpandError::MalformedMacroBody {
                macro_name: macro_name.to_string(),
                message: "parameter binding must assign exactly one name".to_string(),
                ctx: ErrorContext::with_span(call_span),
            });
        }
        *rhs = vec![arg.clone()];
    }
    Ok(body)
}
