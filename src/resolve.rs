//! Call-site resolution: turning a (possibly fluent, nested) call
//! expression into the ordered identifier chain and per-segment argument
//! lists the dispatcher matches against the registry.
//!
//! Resolution is fail-soft by design: most calls in real code are not
//! macros, so any callee shape this module does not understand produces an
//! empty chain and the walker moves on.

use std::collections::HashMap;

use crate::ast::{AssignOp, CallExpr, Expr, Ident, Stmt};
use crate::diagnostics::{ErrorContext, ExpandError};
use crate::registry::is_macro_name;

// ============================================================================
// CALL CHAINS
// ============================================================================

/// The resolved callee of a call expression: ordered identifier segments
/// and, parallel to them, one argument list per segment.
///
/// `NewSeq_μ(xs).Map(f).Ret(&out)` resolves to segments
/// `[NewSeq_μ, Map, Ret]` with argument lists `[[xs], [f], [&out]]`.
#[derive(Debug, Clone, Default)]
pub struct CallChain {
    pub idents: Vec<Ident>,
    pub args: Vec<Vec<Expr>>,
}

impl CallChain {
    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.idents.len()
    }

    /// The leading segment: the macro identifier once any library alias
    /// prefix has been stripped.
    pub fn head(&self) -> &Ident {
        &self.idents[0]
    }

    /// Drops the leading library-alias segment and its (empty) argument
    /// list slot, keeping segments and argument lists parallel.
    pub fn strip_lib_prefix(&mut self) {
        self.idents.remove(0);
        self.args.remove(0);
    }
}

/// Extracts the call chain from a call expression. Unsupported callee
/// shapes (index expressions, literal-only targets) yield an empty chain.
pub fn chain_from_call(call: &CallExpr) -> CallChain {
    let mut chain = CallChain::default();
    if !collect_chain(call, &mut chain) {
        return CallChain::default();
    }
    chain
}

fn collect_chain(call: &CallExpr, chain: &mut CallChain) -> bool {
    match call.func.as_ref() {
        Expr::Ident(id) => {
            chain.idents.push(id.clone());
        }
        Expr::Selector { expr, sel, .. } => {
            match expr.as_ref() {
                Expr::Ident(base) => {
                    chain.idents.push(base.clone());
                    // The qualifier segment owns no argument list; pad so
                    // segment i always pairs with args[i].
                    chain.args.push(Vec::new());
                }
                Expr::Call(inner) => {
                    if !collect_chain(inner, chain) {
                        return false;
                    }
                }
                _ => return false,
            }
            chain.idents.push(sel.clone());
        }
        Expr::Index { .. } => return false,
        // Immediately-invoked function literals are not macro callees; an
        // empty chain makes the walker descend into the body instead.
        Expr::FuncLit { .. } => return false,
        _ => return false,
    }
    chain.args.push(call.args.clone());
    true
}

/// Finds the call expression a statement-level match can expand: either a
/// bare expression statement or the (single) call on an assignment's
/// right-hand side.
pub fn call_in_stmt(stmt: &Stmt) -> Option<&CallExpr> {
    match stmt {
        Stmt::Expr(Expr::Call(call)) => Some(call),
        Stmt::Assign { rhs, .. } => rhs.iter().find_map(Expr::as_call),
        _ => None,
    }
}

/// Renders a callee as its dotted source name, e.g. `pkg.Type.Min`.
/// Used to tag wrapped error messages with the call that produced them.
pub fn fn_name_from_call(call: &CallExpr) -> Result<String, ExpandError> {
    callee_name(&call.func)
}

fn callee_name(expr: &Expr) -> Result<String, ExpandError> {
    match expr {
        Expr::Ident(id) => Ok(id.name.clone()),
        Expr::Selector { expr, sel, .. } => {
            let base = callee_name(expr)?;
            Ok(format!("{}.{}", base, sel.name))
        }
        Expr::Call(inner) => fn_name_from_call(inner),
        other => Err(ExpandError::UnsupportedShape {
            message: format!("cannot name callee of this shape at offset {}", other.span().start),
            ctx: ErrorContext::with_span(other.span()),
        }),
    }
}

// ============================================================================
// LOCAL ALIAS SCOPES
// ============================================================================

/// A local variable bound to a function value, e.g. `l := macro.Log_μ`.
#[derive(Debug, Clone)]
pub struct AliasBinding {
    /// The function identifier on the right-hand side.
    pub target: Ident,
    /// Package qualifier the right-hand side was selected through, if any.
    pub qualifier: Option<String>,
}

/// Scoped symbol table for local macro aliases. One frame per block; the
/// walker pushes on block entry and pops on exit, so lookups see exactly
/// the bindings lexically in scope at the call site.
#[derive(Debug, Default)]
pub struct Scopes {
    frames: Vec<HashMap<String, AliasBinding>>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn resolve(&self, name: &str) -> Option<&AliasBinding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Records alias bindings introduced by an assignment and neutralizes
    /// definitions that reference a macro: the binding's left-hand name is
    /// muted to `_` so no macro identifier survives expansion, and the
    /// statement degrades to a plain assignment once every target is muted.
    ///
    /// Returns whether a macro binding was recorded; the muted definition
    /// still references the macro on its right-hand side, so the caller must
    /// keep the library import alive.
    pub fn record_assign(&mut self, stmt: &mut Stmt) -> bool {
        let Stmt::Assign { lhs, op, rhs, .. } = stmt else {
            return false;
        };
        if lhs.len() != rhs.len() {
            return false;
        }
        let mut bound_macro = false;
        for (target, value) in lhs.iter_mut().zip(rhs.iter()) {
            let Expr::Ident(name) = target else {
                continue;
            };
            if name.name == "_" {
                continue;
            }
            let binding = match value {
                Expr::Ident(id) => AliasBinding { target: id.clone(), qualifier: None },
                Expr::Selector { expr, sel, .. } => match expr.as_ref() {
                    Expr::Ident(base) => AliasBinding {
                        target: sel.clone(),
                        qualifier: Some(base.name.clone()),
                    },
                    _ => continue,
                },
                _ => continue,
            };
            let is_macro = is_macro_name(&binding.target.name);
            if let Some(frame) = self.frames.last_mut() {
                frame.insert(name.name.clone(), binding);
            }
            if is_macro {
                name.name = "_".to_string();
                bound_macro = true;
            }
        }
        if bound_macro
            && lhs
                .iter()
                .all(|e| matches!(e, Expr::Ident(id) if id.name == "_"))
        {
            *op = AssignOp::Assign;
        }
        bound_macro
    }
}
