//! Source re-emission: serializes a syntax tree back to Go text.
//!
//! Output follows gofmt conventions closely enough to be stable under a
//! follow-up gofmt pass: tab indentation, one statement per line, grouped
//! import block. The logging expander also uses [`render_expr`] to turn an
//! argument sub-tree back into the label text embedded in its format string.

use std::fmt::Write;

use crate::ast::{
    AssignOp, Block, CallExpr, Decl, Expr, Field, File, FuncDecl, FuncType, Import, Stmt,
    SwitchCase, TypeExpr, UnaryOp,
};

/// Serializes a whole compilation unit.
pub fn emit_file(file: &File) -> String {
    let mut w = Emitter::new();
    w.file(file);
    w.out
}

/// Serializes a single statement at zero indentation.
pub fn emit_stmt(stmt: &Stmt) -> String {
    let mut w = Emitter::new();
    w.stmt(stmt);
    w.out
}

/// Renders an expression as a single line of source text.
///
/// Function literals flatten onto one line; this rendering is for
/// diagnostics and logging labels, not for compilable output.
pub fn render_expr(expr: &Expr) -> String {
    let mut w = Emitter::new();
    w.expr(expr);
    let mut flat = String::with_capacity(w.out.len());
    for part in w.out.split_whitespace() {
        if !flat.is_empty() {
            flat.push(' ');
        }
        flat.push_str(part);
    }
    flat
}

struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn new() -> Self {
        Emitter { out: String::new(), indent: 0 }
    }

    fn line(&mut self, text: &str) {
        self.open_line();
        self.out.push_str(text);
        self.newline();
    }

    fn open_line(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    // ------------------------------------------------------------------
    // File level
    // ------------------------------------------------------------------

    fn file(&mut self, file: &File) {
        self.line(&format!("package {}", file.package));
        self.newline();
        if !file.imports.is_empty() {
            self.imports(&file.imports);
            self.newline();
        }
        for (i, decl) in file.decls.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.decl(decl);
        }
    }

    fn imports(&mut self, imports: &[Import]) {
        if imports.len() == 1 && imports[0].alias.is_none() {
            self.line(&format!("import \"{}\"", imports[0].path));
            return;
        }
        self.line("import (");
        self.indent += 1;
        for im in imports {
            match &im.alias {
                Some(alias) => self.line(&format!("{} \"{}\"", alias, im.path)),
                None => self.line(&format!("\"{}\"", im.path)),
            }
        }
        self.indent -= 1;
        self.line(")");
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(f) => self.func_decl(f),
            Decl::Type { name, typ, .. } => {
                self.line(&format!("type {} {}", name.name, type_text(typ)));
            }
        }
    }

    fn func_decl(&mut self, f: &FuncDecl) {
        self.open_line();
        self.out.push_str("func ");
        if let Some(recv) = &f.recv {
            self.out.push('(');
            self.out.push_str(&field_text(recv));
            self.out.push_str(") ");
        }
        self.out.push_str(&f.name.name);
        self.out.push_str(&signature_text(&f.sig));
        self.out.push_str(" {");
        self.newline();
        self.block_body(&f.body);
        self.line("}");
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block_body(&mut self, block: &Block) {
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => {
                self.open_line();
                self.expr(e);
                self.newline();
            }
            Stmt::Assign { lhs, op, rhs, .. } => {
                self.open_line();
                self.expr_list(lhs);
                self.out.push_str(match op {
                    AssignOp::Define => " := ",
                    AssignOp::Assign => " = ",
                });
                self.expr_list(rhs);
                self.newline();
            }
            Stmt::Var { name, typ, .. } => {
                self.line(&format!("var {} {}", name.name, type_text(typ)));
            }
            Stmt::Return { results, .. } => {
                self.open_line();
                self.out.push_str("return");
                if !results.is_empty() {
                    self.out.push(' ');
                    self.expr_list(results);
                }
                self.newline();
            }
            Stmt::If { cond, then, els, .. } => {
                self.open_line();
                self.if_chain(cond, then, els.as_deref());
                self.newline();
            }
            Stmt::For { init, cond, post, body, .. } => {
                self.open_line();
                self.out.push_str("for ");
                if init.is_some() || post.is_some() {
                    if let Some(init) = init {
                        self.inline_simple_stmt(init);
                    }
                    self.out.push_str("; ");
                    if let Some(cond) = cond {
                        self.expr(cond);
                    }
                    self.out.push_str("; ");
                    if let Some(post) = post {
                        self.inline_simple_stmt(post);
                    }
                    self.out.push(' ');
                } else if let Some(cond) = cond {
                    self.expr(cond);
                    self.out.push(' ');
                }
                self.out.push('{');
                self.newline();
                self.block_body(body);
                self.line("}");
            }
            Stmt::Range { key, value, expr, body, .. } => {
                self.open_line();
                self.out.push_str("for ");
                self.out.push_str(&key.name);
                if let Some(v) = value {
                    self.out.push_str(", ");
                    self.out.push_str(&v.name);
                }
                self.out.push_str(" := range ");
                self.expr(expr);
                self.out.push_str(" {");
                self.newline();
                self.block_body(body);
                self.line("}");
            }
            Stmt::Switch { tag, cases, .. } => {
                self.open_line();
                self.out.push_str("switch ");
                if let Some(tag) = tag {
                    self.expr(tag);
                    self.out.push(' ');
                }
                self.out.push('{');
                self.newline();
                for case in cases {
                    self.switch_case(case);
                }
                self.line("}");
            }
            Stmt::Block(b) => {
                self.line("{");
                self.block_body(b);
                self.line("}");
            }
            Stmt::IncDec { expr, inc, .. } => {
                self.open_line();
                self.expr(expr);
                self.out.push_str(if *inc { "++" } else { "--" });
                self.newline();
            }
        }
    }

    /// Emits an if/else-if chain onto the current line.
    fn if_chain(&mut self, cond: &Expr, then: &Block, els: Option<&Stmt>) {
        self.out.push_str("if ");
        self.expr(cond);
        self.out.push_str(" {");
        self.newline();
        self.block_body(then);
        self.open_line();
        self.out.push('}');
        match els {
            None => {}
            Some(Stmt::If { cond, then, els, .. }) => {
                self.out.push_str(" else ");
                self.if_chain(cond, then, els.as_deref());
            }
            Some(Stmt::Block(b)) => {
                self.out.push_str(" else {");
                self.newline();
                self.block_body(b);
                self.open_line();
                self.out.push('}');
            }
            Some(other) => {
                // Anything else is a front-end bug; keep the output parseable.
                self.out.push_str(" else {");
                self.newline();
                self.indent += 1;
                self.stmt(other);
                self.indent -= 1;
                self.open_line();
                self.out.push('}');
            }
        }
    }

    /// Emits init/post clauses of a classic for loop without indentation or
    /// trailing newline.
    fn inline_simple_stmt(&mut self, stmt: &Stmt) {
        let indent = self.indent;
        self.indent = 0;
        let mut text = String::new();
        std::mem::swap(&mut text, &mut self.out);
        self.stmt(stmt);
        std::mem::swap(&mut text, &mut self.out);
        self.indent = indent;
        self.out.push_str(text.trim_end_matches('\n'));
    }

    fn switch_case(&mut self, case: &SwitchCase) {
        self.open_line();
        if case.exprs.is_empty() {
            self.out.push_str("default:");
        } else {
            self.out.push_str("case ");
            self.expr_list(&case.exprs);
            self.out.push(':');
        }
        self.newline();
        self.indent += 1;
        for stmt in &case.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(e);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.out.push_str(&id.name),
            Expr::Lit { value, .. } => self.out.push_str(value),
            Expr::Selector { expr, sel, .. } => {
                self.expr(expr);
                self.out.push('.');
                self.out.push_str(&sel.name);
            }
            Expr::Call(call) => self.call(call),
            Expr::FuncLit { sig, body, .. } => {
                self.out.push_str("func");
                self.out.push_str(&signature_text(sig));
                self.out.push_str(" {");
                self.newline();
                self.block_body(body);
                self.open_line();
                self.out.push('}');
            }
            Expr::Composite { typ, elems, .. } => {
                self.out.push_str(&type_text(typ));
                self.out.push('{');
                self.expr_list(elems);
                self.out.push('}');
            }
            Expr::Unary { op, expr, .. } => {
                self.out.push_str(match op {
                    UnaryOp::Addr => "&",
                    UnaryOp::Deref => "*",
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                });
                self.expr(expr);
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                self.expr(lhs);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(rhs);
            }
            Expr::Index { expr, index, .. } => {
                self.expr(expr);
                self.out.push('[');
                self.expr(index);
                self.out.push(']');
            }
        }
    }

    fn call(&mut self, call: &CallExpr) {
        self.expr(&call.func);
        self.out.push('(');
        self.expr_list(&call.args);
        self.out.push(')');
    }
}

// ----------------------------------------------------------------------
// Type and signature rendering (always single-line)
// ----------------------------------------------------------------------

pub fn type_text(typ: &TypeExpr) -> String {
    match typ {
        TypeExpr::Named(id) => id.name.clone(),
        TypeExpr::Pointer(inner) => format!("*{}", type_text(inner)),
        TypeExpr::Slice(inner) => format!("[]{}", type_text(inner)),
        TypeExpr::Map(k, v) => format!("map[{}]{}", type_text(k), type_text(v)),
        TypeExpr::Func(sig) => format!("func{}", signature_text(sig)),
        TypeExpr::Ellipsis(inner) => format!("...{}", type_text(inner)),
        TypeExpr::Interface => "interface{}".to_string(),
    }
}

fn field_text(field: &Field) -> String {
    let names = field
        .names
        .iter()
        .map(|id| id.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if names.is_empty() {
        type_text(&field.typ)
    } else {
        format!("{} {}", names, type_text(&field.typ))
    }
}

fn signature_text(sig: &FuncType) -> String {
    let params = sig.params.iter().map(field_text).collect::<Vec<_>>().join(", ");
    let mut text = format!("({})", params);
    match sig.results.len() {
        0 => {}
        1 if sig.results[0].names.is_empty() => {
            text.push(' ');
            text.push_str(&type_text(&sig.results[0].typ));
        }
        _ => {
            let results = sig.results.iter().map(field_text).collect::<Vec<_>>().join(", ");
            text.push_str(&format!(" ({})", results));
        }
    }
    text
}
