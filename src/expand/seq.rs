//! Fluent pipeline expander.
//!
//! A chain like `NewSeq_μ(xs).Map(f).Filter(p).Ret(&out)` becomes a single
//! block: one accumulator binding per stage boundary, then one scoped block
//! per stage wired input-accumulator to output-accumulator. Stage blocks
//! still contain the library's loop macros (`Map_μ` and friends); the
//! worklist picks those up when it re-examines the splice.
//!
//! Callback arity is adapted to the loop macros' `(value, index)` calling
//! convention: a unary callback gets an ignored index parameter appended,
//! and a named function is first wrapped in a literal built from its
//! declared signature.

use crate::ast::builder::*;
use crate::ast::{Block, Expr, Field, FuncType, Ident, Stmt, TypeExpr};
use crate::diagnostics::{ErrorContext, ExpandError};
use crate::registry::SEQ_TYPE_SYMBOL;
use crate::resolve::CallChain;

use super::{inline, Expander, Outcome};

/// Stage names with special wiring. Anything else found on the sequence
/// type is treated like `Reduce`: input-only, no new accumulator.
const RET: &str = "Ret";
const REDUCE: &str = "Reduce";
const MAP: &str = "Map";
const FILTER: &str = "Filter";

/// Per-chain expansion state: accumulator declarations synthesized so far
/// and the expanded stage blocks, both in stage order. Lives only while one
/// chain is processed; the splice consumes it.
struct Pipeline {
    setup: Vec<Stmt>,
    stages: Vec<Stmt>,
}

impl Pipeline {
    fn open(ctor_body: Vec<Stmt>) -> Self {
        Pipeline { setup: ctor_body, stages: Vec::new() }
    }

    /// Name of the accumulator the next stage reads from.
    fn input(&self) -> String {
        accumulator(self.setup.len() - 1)
    }

    /// Declares a fresh output accumulator for a stage boundary and returns
    /// its name.
    fn open_accumulator(&mut self, elem: TypeExpr) -> String {
        let name = accumulator(self.setup.len());
        self.setup.push(var_decl(&name, slice_of(elem)));
        name
    }

    fn into_block(mut self) -> Stmt {
        self.setup.extend(self.stages);
        Stmt::Block(Block::new(self.setup))
    }
}

pub(crate) fn expand(
    ex: &mut Expander,
    stmt: &Stmt,
    chain: &CallChain,
) -> Result<Outcome, ExpandError> {
    if !matches!(stmt, Stmt::Expr(_)) {
        log::warn!(
            "pipeline `{}` cannot be assigned; terminate it with Ret or Reduce",
            chain.head().name
        );
        return Ok(Outcome::Skip);
    }
    let head = chain.head();
    if !head.name.starts_with("New") {
        log::warn!("pipeline chain must start with a constructor, got `{}`", head.name);
        return Ok(Outcome::Skip);
    }
    let Some(ctor) = ex.registry.lookup(&head.name) else {
        return Ok(Outcome::Skip);
    };
    // The constructor body binds the source slice to the first accumulator;
    // its statements open the pipeline block.
    let ctor = ctor.clone();
    let setup = inline::splice_body(&head.name, &ctor, &chain.args[0], head.span)?;
    if setup.is_empty() {
        return Err(ExpandError::MalformedMacroBody {
            macro_name: head.name.clone(),
            message: "constructor body binds no accumulator".to_string(),
            ctx: ErrorContext::with_span(head.span),
        });
    }
    let mut pipe = Pipeline::open(setup);

    for i in 1..chain.len() {
        let seg = &chain.idents[i];
        let key = format!("{}.{}", SEQ_TYPE_SYMBOL, seg.name);
        let Some(decl) = ex.registry.lookup(&key) else {
            log::warn!("pipeline method declaration not found: {key}");
            continue;
        };
        let decl = decl.clone();
        let mut args = chain.args[i].clone();
        args.push(ident_expr(pipe.input()));

        if seg.name != RET {
            let fn_id = if seg.name == REDUCE { 1 } else { 0 };
            if args.len() <= fn_id {
                return Err(ExpandError::MalformedMacroBody {
                    macro_name: key,
                    message: format!("stage `{}` is missing its callback argument", seg.name),
                    ctx: ErrorContext::with_span(seg.span),
                });
            }
            let Some(mut fn_sig) = callback_signature(ex, &args[fn_id]) else {
                log::warn!(
                    "cannot resolve callback signature for stage `{}`; pipeline left unexpanded",
                    seg.name
                );
                return Ok(Outcome::Skip);
            };
            let count = fn_sig.param_count();
            if count == 1 || (count == 2 && seg.name == REDUCE) {
                if !matches!(args[fn_id], Expr::FuncLit { .. }) {
                    args[fn_id] = wrap_in_func_lit(args[fn_id].clone(), &fn_sig);
                }
                if let Expr::FuncLit { sig, .. } = &mut args[fn_id] {
                    sig.params.push(field(&["_"], named("int")));
                    fn_sig = sig.clone();
                }
            }
            if seg.name == MAP || seg.name == FILTER {
                let elem = match seg.name.as_str() {
                    MAP => fn_sig.results.first().map(|f| f.typ.clone()),
                    _ => fn_sig.params.first().map(|f| f.typ.clone()),
                };
                let Some(elem) = elem else {
                    return Err(ExpandError::MalformedMacroBody {
                        macro_name: key,
                        message: "callback signature has no element type".to_string(),
                        ctx: ErrorContext::with_span(seg.span),
                    });
                };
                let next = pipe.open_accumulator(elem);
                args.push(addr(ident_expr(next)));
            }
        }
        let body = inline::splice_body(&key, &decl, &args, seg.span)?;
        pipe.stages.push(Stmt::Block(Block::new(body)));
    }

    if pipe.stages.is_empty() {
        return Ok(Outcome::Skip);
    }
    Ok(Outcome::Splice(vec![pipe.into_block()]))
}

fn accumulator(n: usize) -> String {
    format!("seq{n}")
}

/// The callback's signature: read off a literal directly, or looked up by
/// dotted name for plain function references.
fn callback_signature(ex: &Expander, fn_expr: &Expr) -> Option<FuncType> {
    match fn_expr {
        Expr::FuncLit { sig, .. } => Some(sig.clone()),
        other => ex.types.signature_of(&dotted_name(other)?).cloned(),
    }
}

fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(id) => Some(id.name.clone()),
        Expr::Selector { expr, sel, .. } => Some(format!("{}.{}", dotted_name(expr)?, sel.name)),
        _ => None,
    }
}

/// Builds `func(a0 T0, ...) R { return f(a0, ...) }` around a function
/// reference so an index parameter can be appended without changing `f`.
fn wrap_in_func_lit(fn_expr: Expr, fn_sig: &FuncType) -> Expr {
    let mut params = Vec::with_capacity(fn_sig.params.len());
    let mut call_args = Vec::new();
    for (i, param) in fn_sig.params.iter().enumerate() {
        if param.names.is_empty() {
            let name = format!("a{i}");
            call_args.push(ident_expr(&name));
            params.push(Field::new(vec![Ident::new(name)], param.typ.clone()));
        } else {
            for n in &param.names {
                call_args.push(ident_expr(&n.name));
            }
            params.push(param.clone());
        }
    }
    func_lit(
        FuncType { params, results: fn_sig.results.clone() },
        vec![ret(vec![call(fn_expr, call_args)])],
    )
}
