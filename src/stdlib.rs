//! The bundled macro library, expressed as a syntax tree.
//!
//! These declarations are what user code imports as `mupp/macro`; the
//! registry scans this unit exactly as it would scan a user-supplied macro
//! file. Bodies double as inline templates: the leading assignments of each
//! body are parameter bindings the inliner overwrites with call arguments,
//! and everything after them is the code that survives expansion.
//!
//! `_T` and `_G` are placeholder element types; expansion substitutes real
//! slices and callbacks before the host compiler ever sees them, so the
//! placeholders only matter for macro-library authors reading this file.

use crate::ast::builder::*;
use crate::ast::{Decl, Field, File, FuncType, Stmt, TypeExpr};

/// Builds the macro-definition compilation unit registered by
/// [`crate::registry::build_default_registry`].
pub fn macro_lib_file() -> File {
    let mut decls = vec![
        // type seq_μ []_T and the placeholder types it builds on.
        type_decl("seq_μ", slice_of(named("_T"))),
        type_decl("_T", TypeExpr::Interface),
        type_decl("_G", TypeExpr::Interface),
        type_decl("_RF", fn_type(vec![named("_T"), named("_T"), named("int")], Some(named("_T")))),
        type_decl("_PF", fn_type(vec![named("_T"), named("int")], Some(named("bool")))),
        type_decl("_MF", fn_type(vec![named("_T"), named("int")], Some(named("_T")))),
    ];
    decls.extend(seq_decls());
    decls.extend(try_log_decls());
    decls.extend(convenience_decls());
    File {
        package: "macro".into(),
        name: "mupp/macro/macro.go".into(),
        imports: vec![crate::ast::Import { alias: None, path: "fmt".into() }],
        decls,
    }
}

fn type_decl(name: &str, typ: TypeExpr) -> Decl {
    Decl::Type { name: ident(name), typ, span: Default::default() }
}

fn fn_type(params: Vec<TypeExpr>, result: Option<TypeExpr>) -> TypeExpr {
    TypeExpr::Func(Box::new(FuncType {
        params: params.into_iter().map(Field::unnamed).collect(),
        results: result.into_iter().map(Field::unnamed).collect(),
    }))
}

fn iface() -> TypeExpr {
    TypeExpr::Interface
}

/// `*res = append(*res, elem)`
fn append_into(res: &str, elem: crate::ast::Expr) -> Stmt {
    assign(
        vec![deref(ident_expr(res))],
        vec![call(ident_expr("append"), vec![deref(ident_expr(res)), elem])],
    )
}

// ----------------------------------------------------------------------
// Fluent sequence pipeline: constructor, stages, and loop bodies
// ----------------------------------------------------------------------

fn seq_decls() -> Vec<Decl> {
    let seq_ptr = ptr_to(named("seq_μ"));
    vec![
        // NewSeq_μ constructs a new sequence scope. src must be a slice.
        Decl::Func(func_decl(
            "NewSeq_μ",
            sig(vec![field(&["src"], iface())], vec![Field::unnamed(seq_ptr.clone())]),
            vec![
                define("seq0", composite(slice_of(named("_T")), vec![])),
                ret(vec![addr(composite(named("seq_μ"), vec![ident_expr("seq0")]))]),
            ],
        )),
        // Map applies fn to every element. fn is func(_T[, int]) _T.
        Decl::Func(method_decl(
            "seq",
            seq_ptr.clone(),
            "Map",
            sig(vec![field(&["fn"], iface())], vec![Field::unnamed(seq_ptr.clone())]),
            vec![
                define("f", call(ident_expr("_MF"), vec![nil()])),
                define("in", composite(slice_of(named("_T")), vec![])),
                define("out", addr(composite(slice_of(named("_T")), vec![]))),
                expr_stmt(call(
                    ident_expr("Map_μ"),
                    vec![ident_expr("in"), ident_expr("out"), ident_expr("f")],
                )),
                ret(vec![ident_expr("seq")]),
            ],
        )),
        // Filter keeps elements satisfying fn. fn is func(_T[, int]) bool.
        Decl::Func(method_decl(
            "seq",
            seq_ptr.clone(),
            "Filter",
            sig(vec![field(&["fn"], iface())], vec![Field::unnamed(seq_ptr.clone())]),
            vec![
                define("f", call(ident_expr("_PF"), vec![nil()])),
                define("in", composite(slice_of(named("_T")), vec![])),
                define("out", addr(composite(slice_of(named("_T")), vec![]))),
                expr_stmt(call(
                    ident_expr("Filter_μ"),
                    vec![ident_expr("in"), ident_expr("out"), ident_expr("f")],
                )),
                ret(vec![ident_expr("seq")]),
            ],
        )),
        // Reduce folds the sequence into accum, a pointer to the result.
        // fn is func(_G, _T[, int]) _G.
        Decl::Func(method_decl(
            "seq",
            seq_ptr.clone(),
            "Reduce",
            sig(
                vec![field(&["accum", "fn"], iface())],
                vec![Field::unnamed(seq_ptr.clone())],
            ),
            vec![
                define("out", nil()),
                define("f", call(ident_expr("_RF"), vec![nil()])),
                define("in", composite(slice_of(named("_T")), vec![])),
                expr_stmt(call(
                    ident_expr("Reduce_μ"),
                    vec![ident_expr("in"), ident_expr("out"), ident_expr("f")],
                )),
                ret(vec![ident_expr("seq")]),
            ],
        )),
        // Ret copies the computed sequence into out, a pointer to a slice.
        Decl::Func(method_decl(
            "seq",
            seq_ptr,
            "Ret",
            sig(vec![field(&["out"], iface())], vec![]),
            vec![
                define("output", addr(composite(slice_of(named("_T")), vec![]))),
                define("res", composite(slice_of(named("_T")), vec![])),
                range_stmt(
                    "i",
                    None,
                    ident_expr("res"),
                    vec![append_into("output", index(ident_expr("res"), ident_expr("i")))],
                ),
            ],
        )),
        // Map_μ: in and out are slice values/pointers, fn is func(_T, int) _T.
        Decl::Func(func_decl(
            "Map_μ",
            sig(vec![field(&["in", "out", "fn"], iface())], vec![]),
            vec![
                define("input", composite(slice_of(named("_T")), vec![])),
                define("res", addr(composite(slice_of(named("_T")), vec![]))),
                define("fun", call(ident_expr("_MF"), vec![nil()])),
                range_stmt(
                    "i",
                    None,
                    ident_expr("input"),
                    vec![append_into(
                        "res",
                        call(
                            ident_expr("fun"),
                            vec![index(ident_expr("input"), ident_expr("i")), ident_expr("i")],
                        ),
                    )],
                ),
            ],
        )),
        Decl::Func(func_decl(
            "Filter_μ",
            sig(vec![field(&["in", "out", "fn"], iface())], vec![]),
            vec![
                define("input", composite(slice_of(named("_T")), vec![])),
                define("res", addr(composite(slice_of(named("_T")), vec![]))),
                define("pred", call(ident_expr("_PF"), vec![nil()])),
                range_stmt(
                    "i",
                    Some("v"),
                    ident_expr("input"),
                    vec![if_stmt(
                        call(ident_expr("pred"), vec![ident_expr("v"), ident_expr("i")]),
                        vec![append_into("res", index(ident_expr("input"), ident_expr("i")))],
                    )],
                ),
            ],
        )),
        Decl::Func(func_decl(
            "Reduce_μ",
            sig(vec![field(&["in", "out", "fn"], iface())], vec![]),
            vec![
                define("input", composite(slice_of(named("_T")), vec![])),
                define("accum", nil()),
                define("fun", call(ident_expr("_RF"), vec![nil()])),
                range_stmt(
                    "i",
                    None,
                    ident_expr("input"),
                    vec![assign(
                        vec![deref(ident_expr("accum"))],
                        vec![call(
                            ident_expr("fun"),
                            vec![
                                deref(ident_expr("accum")),
                                index(ident_expr("input"), ident_expr("i")),
                                ident_expr("i"),
                            ],
                        )],
                    )],
                ),
            ],
        )),
    ]
}

// ----------------------------------------------------------------------
// Error wrapping and logging: declaration stubs only. Their rewrites are
// specialized expanders, not body templates.
// ----------------------------------------------------------------------

fn try_log_decls() -> Vec<Decl> {
    vec![
        Decl::Func(func_decl(
            "Try_μ",
            sig(vec![field(&["fn"], iface())], vec![Field::unnamed(named("error"))]),
            vec![ret(vec![nil()])],
        )),
        Decl::Func(func_decl(
            "Log_μ",
            sig(
                vec![field(&["args"], TypeExpr::Ellipsis(Box::new(iface())))],
                vec![],
            ),
            vec![],
        )),
    ]
}

// ----------------------------------------------------------------------
// Convenience macros, expanded by the generic inliner
// ----------------------------------------------------------------------

fn convenience_decls() -> Vec<Decl> {
    vec![
        // PrintSlice_μ prints each element of a slice on its own line.
        Decl::Func(func_decl(
            "PrintSlice_μ",
            sig(vec![field(&["sl"], iface())], vec![]),
            vec![
                define("arg1", composite(slice_of(named("_T")), vec![])),
                range_stmt(
                    "i",
                    None,
                    ident_expr("arg1"),
                    vec![expr_stmt(call_sel(
                        "fmt",
                        "Printf",
                        vec![str_lit("%v\\n"), index(ident_expr("arg1"), ident_expr("i"))],
                    ))],
                ),
            ],
        )),
        // MapKeys_μ collects map keys into *keys.
        Decl::Func(func_decl(
            "MapKeys_μ",
            sig(vec![field(&["keys", "m"], iface())], vec![]),
            vec![
                define("slKeys", addr(composite(slice_of(named("_T")), vec![]))),
                define("dic", composite(map_of(named("_T"), named("_G")), vec![])),
                range_stmt(
                    "k",
                    None,
                    ident_expr("dic"),
                    vec![append_into("slKeys", ident_expr("k"))],
                ),
            ],
        )),
        // MapVals_μ collects map values into *vals.
        Decl::Func(func_decl(
            "MapVals_μ",
            sig(vec![field(&["vals", "m"], iface())], vec![]),
            vec![
                define("slVals", addr(composite(slice_of(named("_T")), vec![]))),
                define("dic", composite(map_of(named("_T"), named("_G")), vec![])),
                range_stmt(
                    "_",
                    Some("v"),
                    ident_expr("dic"),
                    vec![append_into("slVals", ident_expr("v"))],
                ),
            ],
        )),
        // MapToSlice_μ applies f to each (k, v) pair to build *sl.
        Decl::Func(func_decl(
            "MapToSlice_μ",
            sig(vec![field(&["sl", "m", "f"], iface())], vec![]),
            vec![
                define("slice", addr(composite(slice_of(iface()), vec![]))),
                define("dic", composite(map_of(named("_T"), named("_G")), vec![])),
                define("proc", nil()),
                range_stmt(
                    "k",
                    Some("v"),
                    ident_expr("dic"),
                    vec![append_into(
                        "slice",
                        call(ident_expr("proc"), vec![ident_expr("k"), ident_expr("v")]),
                    )],
                ),
            ],
        )),
        // PrintMap_μ prints a map with the default format; expands through
        // PrintMapf_μ, which exercises nested macro expansion.
        Decl::Func(func_decl(
            "PrintMap_μ",
            sig(vec![field(&["m"], iface())], vec![]),
            vec![
                define("arg2", composite(map_of(named("_T"), named("_G")), vec![])),
                expr_stmt(call(
                    ident_expr("PrintMapf_μ"),
                    vec![str_lit("%v : %v\\n"), ident_expr("arg2")],
                )),
            ],
        )),
        Decl::Func(func_decl(
            "PrintMapf_μ",
            sig(
                vec![field(&["f"], named("string")), field(&["m"], iface())],
                vec![],
            ),
            vec![
                define("arg1", str_lit("")),
                define("arg2", composite(map_of(named("_T"), named("_G")), vec![])),
                range_stmt(
                    "k",
                    Some("v"),
                    ident_expr("arg2"),
                    vec![expr_stmt(call_sel(
                        "fmt",
                        "Printf",
                        vec![ident_expr("arg1"), ident_expr("k"), ident_expr("v")],
                    ))],
                ),
            ],
        )),
        // PrintMapKeys_μ prints the provided keys with their values.
        Decl::Func(func_decl(
            "PrintMapKeys_μ",
            sig(vec![field(&["keys", "m"], iface())], vec![]),
            vec![
                define("arg1", composite(slice_of(named("_T")), vec![])),
                define("arg2", composite(map_of(named("_T"), named("_G")), vec![])),
                range_stmt(
                    "i",
                    None,
                    ident_expr("arg1"),
                    vec![expr_stmt(call_sel(
                        "fmt",
                        "Printf",
                        vec![
                            str_lit("%v : %v\\n"),
                            index(ident_expr("arg1"), ident_expr("i")),
                            index(ident_expr("arg2"), index(ident_expr("arg1"), ident_expr("i"))),
                        ],
                    ))],
                ),
            ],
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{is_macro_decl, MACRO_LIB_NAME};

    #[test]
    fn every_declaration_is_macro_tagged() {
        let file = macro_lib_file();
        assert_eq!(file.package, MACRO_LIB_NAME);
        for decl in &file.decls {
            if let Decl::Func(f) = decl {
                assert!(is_macro_decl(f), "{} is not macro-tagged", f.name.name);
            }
        }
    }

    #[test]
    fn emits_as_plausible_go() {
        let text = crate::emit::emit_file(&macro_lib_file());
        assert!(text.starts_with("package macro\n"));
        assert!(text.contains("func NewSeq_μ(src interface{}) *seq_μ {"));
        assert!(text.contains("func (seq *seq_μ) Reduce(accum, fn interface{}) *seq_μ {"));
        assert!(text.contains("for i, v := range input {"));
    }
}
