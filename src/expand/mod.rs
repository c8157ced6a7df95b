//! The statement walker and macro-call dispatcher.
//!
//! [`Expander::expand_file`] drives everything: it walks every non-macro
//! function declaration, matches statement-level calls against the registry,
//! and splices in whatever the selected family expander produced. Traversal
//! is a worklist over each block's statement vector; a splice is re-examined
//! at the same index, which is how nested macro calls inside an expansion
//! get their turn without re-entrant tree rewriting.
//!
//! Family selection mirrors registration: a macro whose first result type is
//! the pipeline tag dispatches to the pipeline expander, the two named
//! rewrites dispatch by name, and everything else with the marker suffix
//! goes through the generic inliner.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{Block, Decl, Expr, File, Ident, Stmt};
use crate::context::{Context, DEFAULT_FUEL};
use crate::diagnostics::{ErrorContext, ExpandError};
use crate::registry::{
    is_macro_decl, is_macro_name, MacroRegistry, LOG_SYMBOL, MACRO_LIB_PATH, SEQ_TYPE_SYMBOL,
    TRY_SYMBOL,
};
use crate::resolve::{call_in_stmt, chain_from_call, CallChain, Scopes};
use crate::typeinfo::TypeLookup;

pub mod inline;
pub mod log;
pub mod seq;
pub mod try_block;

/// What the dispatcher decided about one statement.
///
/// There is no partial-failure variant: expanders either decline (leaving
/// the statement untouched) or produce a complete replacement; anything in
/// between surfaces as an [`ExpandError`] and aborts the file.
#[derive(Debug)]
pub enum Outcome {
    /// Not a macro call site, or one this engine deliberately leaves alone.
    Skip,
    /// Replace the current statement with these statements and re-examine
    /// the splice point.
    Splice(Vec<Stmt>),
}

type ExpandFn = fn(&mut Expander<'_>, &Stmt, &CallChain) -> Result<Outcome, ExpandError>;

/// Family expanders keyed by their trigger symbol: the pipeline result-type
/// tag, or the macro name itself for the named rewrites.
static FAMILY_EXPANDERS: Lazy<HashMap<&'static str, ExpandFn>> = Lazy::new(|| {
    HashMap::from([
        (SEQ_TYPE_SYMBOL, seq::expand as ExpandFn),
        (TRY_SYMBOL, try_block::expand as ExpandFn),
        (LOG_SYMBOL, log::expand as ExpandFn),
    ])
});

pub struct Expander<'a> {
    pub registry: &'a MacroRegistry,
    pub types: &'a dyn TypeLookup,
    pub ctx: &'a mut Context,
}

impl<'a> Expander<'a> {
    pub fn new(
        registry: &'a MacroRegistry,
        types: &'a dyn TypeLookup,
        ctx: &'a mut Context,
    ) -> Self {
        Expander { registry, types, ctx }
    }

    /// Expands every macro call site in the file, then applies the file-level
    /// follow-ups the expansions requested: the formatting import when any
    /// rewrite emitted a `fmt` call, the no-op logging stub when the filter
    /// muted a call site, and removal of the macro library import, which no
    /// expanded code references.
    pub fn expand_file(&mut self, file: &mut File) -> Result<(), ExpandError> {
        self.ctx.begin_file(file);
        for decl in &mut file.decls {
            let Decl::Func(fn_decl) = decl else {
                continue;
            };
            if is_macro_decl(fn_decl) {
                continue;
            }
            let mut scopes = Scopes::new();
            self.expand_block(&mut fn_decl.body.stmts, &mut scopes)?;
        }
        if self.ctx.needs_fmt_import {
            file.ensure_import("fmt");
        }
        if self.ctx.lib_alias.is_some() && !self.ctx.keep_lib_import {
            file.imports.retain(|im| im.path != MACRO_LIB_PATH);
        }
        if self.ctx.needs_log_stub {
            file.decls.push(Decl::Func(log::noop_log_decl()));
        }
        Ok(())
    }

    /// Worklist traversal of one statement list. Each statement is matched
    /// once; a splice replaces it in place and processing resumes at the
    /// splice point, so freshly inserted statements are themselves candidates.
    pub fn expand_block(
        &mut self,
        stmts: &mut Vec<Stmt>,
        scopes: &mut Scopes,
    ) -> Result<(), ExpandError> {
        scopes.push();
        let mut i = 0;
        while i < stmts.len() {
            if scopes.record_assign(&mut stmts[i]) {
                self.ctx.keep_lib_import = true;
            }
            match self.dispatch(&stmts[i], scopes)? {
                Outcome::Skip => {
                    self.descend_stmt(&mut stmts[i], scopes)?;
                    i += 1;
                }
                Outcome::Splice(replacement) => {
                    stmts.splice(i..=i, replacement);
                }
            }
        }
        scopes.pop();
        Ok(())
    }

    /// Matches one statement against the registry and runs the selected
    /// family expander. Anything that is not a resolvable macro call site
    /// is a [`Outcome::Skip`], never an error.
    fn dispatch(&mut self, stmt: &Stmt, scopes: &Scopes) -> Result<Outcome, ExpandError> {
        let Some(call) = call_in_stmt(stmt) else {
            return Ok(Outcome::Skip);
        };
        let mut chain = chain_from_call(call);
        if chain.is_empty() {
            return Ok(Outcome::Skip);
        }
        if chain.len() > 1 {
            if let Some(alias) = &self.ctx.lib_alias {
                if &chain.head().name == alias {
                    chain.strip_lib_prefix();
                }
            }
        }
        // A plain name may be a local alias of a macro; substitute the
        // binding's target, keeping the call-site span for diagnostics.
        if !is_macro_name(&chain.head().name) {
            if let Some(binding) = scopes.resolve(&chain.head().name) {
                let span = chain.head().span;
                chain.idents[0] = Ident { name: binding.target.name.clone(), span };
            }
        }
        let mut head = chain.head().name.clone();
        // A head that misses may still be a package qualifier: retry the
        // two-segment qualified key, which covers macro units referenced by
        // package name without an import alias in scope.
        if !self.registry.contains(&head) && chain.len() > 1 {
            let qualified = format!("{}.{}", head, chain.idents[1].name);
            if self.registry.contains(&qualified) {
                chain.strip_lib_prefix();
                head = chain.head().name.clone();
            }
        }
        let Some(decl) = self.registry.lookup(&head) else {
            return Ok(Outcome::Skip);
        };
        if self.ctx.fuel == 0 {
            return Err(ExpandError::RecursionLimit {
                macro_name: head,
                limit: DEFAULT_FUEL,
                ctx: ErrorContext::with_span(call.span),
            });
        }
        let family = decl
            .sig
            .results
            .first()
            .and_then(|f| f.typ.receiver_name())
            .filter(|name| is_macro_name(name));
        let expand_fn = family
            .and_then(|name| FAMILY_EXPANDERS.get(name))
            .or_else(|| FAMILY_EXPANDERS.get(head.as_str()))
            .copied()
            .unwrap_or(inline::expand as ExpandFn);
        let outcome = expand_fn(self, stmt, &chain)?;
        if matches!(outcome, Outcome::Splice(_)) {
            self.ctx.fuel -= 1;
        }
        Ok(outcome)
    }

    /// Walks into a statement the dispatcher skipped, expanding any nested
    /// statement lists it contains.
    fn descend_stmt(&mut self, stmt: &mut Stmt, scopes: &mut Scopes) -> Result<(), ExpandError> {
        match stmt {
            Stmt::Expr(expr) => self.descend_expr(expr, scopes)?,
            Stmt::Assign { lhs, rhs, .. } => {
                for expr in lhs.iter_mut().chain(rhs.iter_mut()) {
                    self.descend_expr(expr, scopes)?;
                }
            }
            Stmt::Var { .. } => {}
            Stmt::Return { results, .. } => {
                for expr in results {
                    self.descend_expr(expr, scopes)?;
                }
            }
            Stmt::If { cond, then, els, .. } => {
                self.descend_expr(cond, scopes)?;
                self.expand_block(&mut then.stmts, scopes)?;
                if let Some(els) = els {
                    self.descend_stmt(els, scopes)?;
                }
            }
            Stmt::For { init, cond, post, body, .. } => {
                if let Some(init) = init {
                    self.descend_stmt(init, scopes)?;
                }
                if let Some(cond) = cond {
                    self.descend_expr(cond, scopes)?;
                }
                if let Some(post) = post {
                    self.descend_stmt(post, scopes)?;
                }
                self.expand_block(&mut body.stmts, scopes)?;
            }
            Stmt::Range { expr, body, .. } => {
                self.descend_expr(expr, scopes)?;
                self.expand_block(&mut body.stmts, scopes)?;
            }
            Stmt::Switch { tag, cases, .. } => {
                if let Some(tag) = tag {
                    self.descend_expr(tag, scopes)?;
                }
                for case in cases {
                    self.expand_block(&mut case.stmts, scopes)?;
                }
            }
            Stmt::Block(block) => self.expand_block(&mut block.stmts, scopes)?,
            Stmt::IncDec { expr, .. } => self.descend_expr(expr, scopes)?,
        }
        Ok(())
    }

    /// Function literal bodies are the one place macro call sites hide
    /// inside expressions; everything else just recurses.
    fn descend_expr(&mut self, expr: &mut Expr, scopes: &mut Scopes) -> Result<(), ExpandError> {
        match expr {
            Expr::Ident(_) | Expr::Lit { .. } => {}
            Expr::Selector { expr, .. } => self.descend_expr(expr, scopes)?,
            Expr::Call(call) => {
                self.descend_expr(&mut call.func, scopes)?;
                for arg in &mut call.args {
                    self.descend_expr(arg, scopes)?;
                }
            }
            Expr::FuncLit { body, .. } => self.expand_block(&mut body.stmts, scopes)?,
            Expr::Composite { elems, .. } => {
                for elem in elems {
                    self.descend_expr(elem, scopes)?;
                }
            }
            Expr::Unary { expr, .. } => self.descend_expr(expr, scopes)?,
            Expr::Binary { lhs, rhs, .. } => {
                self.descend_expr(lhs, scopes)?;
                self.descend_expr(rhs, scopes)?;
            }
            Expr::Index { expr, index, .. } => {
                self.descend_expr(expr, scopes)?;
                self.descend_expr(index, scopes)?;
            }
        }
        Ok(())
    }
}

/// Wraps loose statements in a block statement, the shape every splice uses
/// so expansion-local bindings stay scoped.
pub(crate) fn as_block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block(Block::new(stmts))
}
