//! Declaration registry: the catalog of macro-tagged declarations.
//!
//! Populated once per run by scanning the macro-definition compilation
//! unit(s); read-only for the rest of the run. Each declaration is stored
//! under both its bare and its qualified name so call sites can resolve
//! with or without the library prefix.
//!
//! Registry invariant: there is one registry per run, constructed at the
//! entrypoint and passed by reference to every traversal. Never construct a
//! hidden local registry mid-expansion.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{Decl, File, FuncDecl};
use crate::stdlib;

/// Reserved name suffix marking a declaration as a macro definition.
pub const MACRO_SUFFIX: &str = "_μ";

/// Result-type tag of the fluent pipeline family.
pub const SEQ_TYPE_SYMBOL: &str = "seq_μ";

/// Pipeline constructor name.
pub const NEW_SEQ_SYMBOL: &str = "NewSeq_μ";

/// Error-wrapping block executor.
pub const TRY_SYMBOL: &str = "Try_μ";

/// Diagnostic logging macro.
pub const LOG_SYMBOL: &str = "Log_μ";

/// Import path of the bundled macro library.
pub const MACRO_LIB_PATH: &str = "mupp/macro";

/// Package name of the bundled macro library.
pub const MACRO_LIB_NAME: &str = "macro";

pub fn is_macro_name(name: &str) -> bool {
    name.ends_with(MACRO_SUFFIX)
}

/// Whether a declaration defines a macro: the function name, or for methods
/// the receiver type name, carries the marker suffix. Macro definitions are
/// never expanded at their own definition site.
pub fn is_macro_decl(decl: &FuncDecl) -> bool {
    match &decl.recv {
        None => is_macro_name(&decl.name.name),
        Some(recv) => recv
            .typ
            .receiver_name()
            .map(is_macro_name)
            .unwrap_or(false),
    }
}

/// Catalog of macro-tagged declarations, indexed by bare and qualified name.
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    decls: HashMap<String, Arc<FuncDecl>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans a compilation unit's top-level declarations and registers every
    /// macro definition found. Append-only; later registrations of the same
    /// name win, mirroring file scan order.
    ///
    /// A method whose receiver expression has an unsupported shape is a
    /// structural defect in the macro library; it is logged and skipped
    /// rather than aborting the whole scan.
    pub fn register_file(&mut self, file: &File) {
        for decl in &file.decls {
            let Decl::Func(fn_decl) = decl else {
                continue;
            };
            match &fn_decl.recv {
                None => {
                    if !is_macro_name(&fn_decl.name.name) {
                        continue;
                    }
                    let shared = Arc::new(fn_decl.clone());
                    self.decls
                        .insert(format!("{}.{}", file.package, fn_decl.name.name), shared.clone());
                    self.decls.insert(fn_decl.name.name.clone(), shared);
                }
                Some(recv) => {
                    let Some(type_name) = recv.typ.receiver_name() else {
                        log::warn!(
                            "skipping method {}: unhandled receiver shape",
                            fn_decl.name.name
                        );
                        continue;
                    };
                    if !is_macro_name(type_name) {
                        continue;
                    }
                    let shared = Arc::new(fn_decl.clone());
                    self.decls.insert(
                        format!("{}.{}.{}", file.package, type_name, fn_decl.name.name),
                        shared.clone(),
                    );
                    self.decls
                        .insert(format!("{}.{}", type_name, fn_decl.name.name), shared);
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<FuncDecl>> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Returns an iterator over registered names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.decls.keys()
    }
}

/// Builds a registry populated with the bundled macro library.
///
/// # Example
/// ```
/// use mupp::registry::build_default_registry;
/// let registry = build_default_registry();
/// assert!(registry.contains("NewSeq_μ"));
/// ```
pub fn build_default_registry() -> MacroRegistry {
    let mut registry = MacroRegistry::new();
    registry.register_file(&stdlib::macro_lib_file());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;
    use crate::ast::{Field, File, Ident};

    fn lib_file(decls: Vec<crate::ast::Decl>) -> File {
        File { package: "macro".into(), name: "macro/lib.go".into(), imports: vec![], decls }
    }

    #[test]
    fn registers_functions_under_bare_and_qualified_names() {
        let mut registry = MacroRegistry::new();
        let file = lib_file(vec![
            crate::ast::Decl::Func(func_decl("Swap_μ", sig(vec![], vec![]), vec![])),
            crate::ast::Decl::Func(func_decl("NotAMacro", sig(vec![], vec![]), vec![])),
        ]);
        registry.register_file(&file);
        assert!(registry.contains("Swap_μ"));
        assert!(registry.contains("macro.Swap_μ"));
        assert!(!registry.contains("NotAMacro"));
    }

    #[test]
    fn registers_methods_by_receiver_type() {
        let mut registry = MacroRegistry::new();
        let file = lib_file(vec![crate::ast::Decl::Func(method_decl(
            "seq",
            ptr_to(named("seq_μ")),
            "Map",
            sig(vec![field(&["fn"], crate::ast::TypeExpr::Interface)], vec![]),
            vec![],
        ))]);
        registry.register_file(&file);
        assert!(registry.contains("seq_μ.Map"));
        assert!(registry.contains("macro.seq_μ.Map"));
    }

    #[test]
    fn skips_unsupported_receiver_shapes() {
        let mut registry = MacroRegistry::new();
        let mut decl = method_decl("s", named("seq_μ"), "Bad", sig(vec![], vec![]), vec![]);
        decl.recv = Some(Field::new(
            vec![Ident::new("s")],
            slice_of(named("seq_μ")),
        ));
        registry.register_file(&lib_file(vec![crate::ast::Decl::Func(decl)]));
        assert!(registry.is_empty());
    }

    #[test]
    fn default_registry_contains_std_families() {
        let registry = build_default_registry();
        for name in [NEW_SEQ_SYMBOL, TRY_SYMBOL, LOG_SYMBOL, "seq_μ.Map", "seq_μ.Ret", "Map_μ"] {
            assert!(registry.contains(name), "missing {name}");
        }
    }
}
