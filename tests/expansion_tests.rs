//! End-to-end expansion tests: build a tree, expand it against the bundled
//! registry, and check the emitted source text.

use regex::Regex;

use mupp::ast::builder::*;
use mupp::ast::{AssignOp, BinaryOp, Decl, Expr, Field, File, Import, Span, Stmt};
use mupp::emit::emit_file;
use mupp::registry::MACRO_LIB_PATH;
use mupp::{build_default_registry, Context, Expander, ExpandError, NoTypes, SigTable, TypeLookup};

fn source_file(body: Vec<Stmt>) -> File {
    File {
        package: "main".into(),
        name: "app/main.go".into(),
        imports: vec![Import { alias: None, path: MACRO_LIB_PATH.into() }],
        decls: vec![Decl::Func(func_decl("main", sig(vec![], vec![]), body))],
    }
}

fn expand_with(file: &mut File, types: &dyn TypeLookup, filter: Option<&str>) -> String {
    let registry = build_default_registry();
    let filter = filter.map(|f| Regex::new(f).expect("valid filter"));
    let mut ctx = Context::new("", filter);
    Expander::new(&registry, types, &mut ctx)
        .expand_file(file)
        .expect("expansion failed");
    emit_file(file)
}

fn log_call(line: u32, args: Vec<Expr>) -> Stmt {
    let mut log_ident = ident("Log_μ");
    log_ident.span = Span { start: 0, end: 0, line };
    let callee = Expr::Selector {
        expr: Box::new(ident_expr("macro")),
        sel: log_ident,
        span: Span::default(),
    };
    expr_stmt(call(callee, args))
}

#[test]
fn print_slice_inlines_into_scoped_block() {
    let mut file = source_file(vec![expr_stmt(call_sel(
        "macro",
        "PrintSlice_μ",
        vec![ident_expr("cs")],
    ))]);
    let text = expand_with(&mut file, &NoTypes, None);
    assert!(text.contains("arg1 := cs"), "{text}");
    assert!(text.contains("for i := range arg1 {"), "{text}");
    assert!(text.contains("fmt.Printf(\"%v\\n\", arg1[i])"), "{text}");
    assert!(!text.contains("_μ"), "marker survived expansion:\n{text}");
    assert!(!text.contains(MACRO_LIB_PATH), "{text}");
}

#[test]
fn map_keys_collects_into_target() {
    let mut file = source_file(vec![expr_stmt(call_sel(
        "macro",
        "MapKeys_μ",
        vec![addr(ident_expr("countries")), ident_expr("totalByCountry")],
    ))]);
    let text = expand_with(&mut file, &NoTypes, None);
    assert!(text.contains("slKeys := &countries"), "{text}");
    assert!(text.contains("dic := totalByCountry"), "{text}");
    assert!(text.contains("for k := range dic {"), "{text}");
    assert!(text.contains("*slKeys = append(*slKeys, k)"), "{text}");
}

#[test]
fn print_map_expands_through_nested_macro() {
    let mut file = source_file(vec![expr_stmt(call_sel(
        "macro",
        "PrintMap_μ",
        vec![ident_expr("m")],
    ))]);
    let text = expand_with(&mut file, &NoTypes, None);
    assert!(text.contains("arg2 := m"), "{text}");
    assert!(text.contains("arg1 := \"%v : %v\\n\""), "{text}");
    assert!(text.contains("for k, v := range arg2 {"), "{text}");
    assert!(text.contains("fmt.Printf(arg1, k, v)"), "{text}");
    assert!(!text.contains("_μ"), "marker survived expansion:\n{text}");
}

#[test]
fn expanding_already_expanded_output_changes_nothing() {
    let mut file = source_file(vec![expr_stmt(call_sel(
        "macro",
        "PrintSlice_μ",
        vec![ident_expr("cs")],
    ))]);
    let first = expand_with(&mut file, &NoTypes, None);
    let second = expand_with(&mut file, &NoTypes, None);
    assert_eq!(first, second);
}

#[test]
fn surplus_call_arguments_abort_the_file() {
    let mut file = source_file(vec![expr_stmt(call_sel(
        "macro",
        "PrintSlice_μ",
        vec![ident_expr("a"), ident_expr("b")],
    ))]);
    let registry = build_default_registry();
    let mut ctx = Context::new("", None);
    let err = Expander::new(&registry, &NoTypes, &mut ctx)
        .expand_file(&mut file)
        .unwrap_err();
    match err {
        ExpandError::ArgumentCountMismatch { expected, found, .. } => {
            assert_eq!((expected, found), (1, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn log_builds_printf_with_position_prefix() {
    let mut file = source_file(vec![log_call(
        42,
        vec![str_lit(">> Total"), ident_expr("totalCases")],
    )]);
    let text = expand_with(&mut file, &NoTypes, None);
    assert!(
        text.contains(
            "fmt.Printf(\"app/main.go:42 %v totalCases=%#v\\n\", \">> Total\", totalCases)"
        ),
        "{text}"
    );
    assert!(text.contains("import \"fmt\""), "{text}");
    assert!(!text.contains(MACRO_LIB_PATH), "{text}");
}

#[test]
fn log_filter_keeps_matching_sites_and_mutes_the_rest() {
    let mut file = source_file(vec![
        log_call(10, vec![ident_expr("kept")]),
        log_call(99, vec![ident_expr("muted")]),
    ]);
    let text = expand_with(&mut file, &NoTypes, Some("main.go:10"));
    assert!(text.contains("fmt.Printf(\"app/main.go:10 kept=%#v\\n\", kept)"), "{text}");
    assert!(text.contains("__nooplog_(muted)"), "{text}");
    assert!(text.contains("func __nooplog_(args ...interface{}) {"), "{text}");
}

#[test]
fn log_filter_mismatch_emits_no_printf() {
    let mut file = source_file(vec![log_call(7, vec![ident_expr("x")])]);
    let text = expand_with(&mut file, &NoTypes, Some("other_file"));
    assert!(!text.contains("fmt.Printf"), "{text}");
    assert!(text.contains("__nooplog_(x)"), "{text}");
}

#[test]
fn try_wraps_known_error_calls_only() {
    let mut table = SigTable::new();
    table.insert(
        "strconv.ParseFloat",
        sig(
            vec![
                Field::unnamed(named("string")),
                Field::unnamed(named("int")),
            ],
            vec![
                Field::unnamed(named("float64")),
                Field::unnamed(named("error")),
            ],
        ),
    );
    let lit = func_lit(
        sig(vec![], vec![Field::unnamed(named("error"))]),
        vec![
            assign(
                vec![sel(ident_expr("record"), "Lat"), ident_expr("_")],
                vec![call_sel(
                    "strconv",
                    "ParseFloat",
                    vec![index(ident_expr("rec"), int_lit(2)), int_lit(64)],
                )],
            ),
            Stmt::Assign {
                lhs: vec![ident_expr("x"), ident_expr("_")],
                op: AssignOp::Define,
                rhs: vec![call(ident_expr("mystery"), vec![int_lit(1)])],
                span: Span::default(),
            },
            ret(vec![nil()]),
        ],
    );
    let mut file = source_file(vec![define("err", call_sel("macro", "Try_μ", vec![lit]))]);
    let text = expand_with(&mut file, &table, None);

    assert!(text.contains("err := func() error {"), "{text}");
    assert!(text.contains("var err error"), "{text}");
    assert!(
        text.contains("record.Lat, err = strconv.ParseFloat(rec[2], 64)"),
        "{text}"
    );
    assert!(
        text.contains("return fmt.Errorf(\"strconv.ParseFloat: %w\", err)"),
        "{text}"
    );
    // a call with no known signature keeps its muted form
    assert!(text.contains("x, _ := mystery(1)"), "{text}");
    assert!(text.contains("return err"), "{text}");
    assert!(text.contains("}()"), "{text}");
    assert!(text.contains("import \"fmt\""), "{text}");
}

#[test]
fn try_wraps_calls_nested_in_control_flow() {
    let mut table = SigTable::new();
    table.insert(
        "strconv.ParseFloat",
        sig(
            vec![Field::unnamed(named("string")), Field::unnamed(named("int"))],
            vec![Field::unnamed(named("float64")), Field::unnamed(named("error"))],
        ),
    );
    let parse = assign(
        vec![sel(ident_expr("record"), "Lat"), ident_expr("_")],
        vec![call_sel(
            "strconv",
            "ParseFloat",
            vec![index(ident_expr("rec"), int_lit(2)), int_lit(64)],
        )],
    );
    let lit = func_lit(
        sig(vec![], vec![Field::unnamed(named("error"))]),
        vec![
            if_stmt(
                binary(
                    BinaryOp::Gt,
                    call(ident_expr("len"), vec![ident_expr("rec")]),
                    int_lit(2),
                ),
                vec![parse],
            ),
            ret(vec![nil()]),
        ],
    );
    let mut file = source_file(vec![define("err", call_sel("macro", "Try_μ", vec![lit]))]);
    let text = expand_with(&mut file, &table, None);

    assert!(text.contains("if len(rec) > 2 {"), "{text}");
    assert!(
        text.contains("record.Lat, err = strconv.ParseFloat(rec[2], 64)"),
        "{text}"
    );
    assert!(
        text.contains("return fmt.Errorf(\"strconv.ParseFloat: %w\", err)"),
        "{text}"
    );
    assert!(text.contains("return err"), "{text}");
}

#[test]
fn try_wraps_bare_error_calls() {
    let mut table = SigTable::new();
    table.insert("out.Close", sig(vec![], vec![Field::unnamed(named("error"))]));
    table.insert(
        "strconv.ParseFloat",
        sig(
            vec![Field::unnamed(named("string")), Field::unnamed(named("int"))],
            vec![Field::unnamed(named("float64")), Field::unnamed(named("error"))],
        ),
    );
    let lit = func_lit(
        sig(vec![], vec![Field::unnamed(named("error"))]),
        vec![
            expr_stmt(call_sel("out", "Close", vec![])),
            expr_stmt(call_sel(
                "strconv",
                "ParseFloat",
                vec![ident_expr("s"), int_lit(64)],
            )),
            expr_stmt(call(ident_expr("cleanup"), vec![])),
            ret(vec![nil()]),
        ],
    );
    let mut file = source_file(vec![define("err", call_sel("macro", "Try_μ", vec![lit]))]);
    let text = expand_with(&mut file, &table, None);

    assert!(text.contains("err = out.Close()"), "{text}");
    assert!(text.contains("return fmt.Errorf(\"out.Close: %w\", err)"), "{text}");
    // every result but the error is blanked
    assert!(text.contains("_, err = strconv.ParseFloat(s, 64)"), "{text}");
    assert!(
        text.contains("return fmt.Errorf(\"strconv.ParseFloat: %w\", err)"),
        "{text}"
    );
    // a call with no known signature stays a bare statement
    assert!(text.contains("cleanup()"), "{text}");
    assert!(!text.contains("err = cleanup()"), "{text}");
}

#[test]
fn try_outside_assignment_is_an_error() {
    let lit = func_lit(
        sig(vec![], vec![Field::unnamed(named("error"))]),
        vec![ret(vec![nil()])],
    );
    let mut file = source_file(vec![expr_stmt(call_sel("macro", "Try_μ", vec![lit]))]);
    let registry = build_default_registry();
    let mut ctx = Context::new("", None);
    let err = Expander::new(&registry, &NoTypes, &mut ctx)
        .expand_file(&mut file)
        .unwrap_err();
    assert!(matches!(err, ExpandError::UnsupportedShape { .. }), "{err}");
}

#[test]
fn macro_calls_inside_function_literals_expand() {
    let lit = func_lit(
        sig(vec![], vec![]),
        vec![expr_stmt(call_sel("macro", "PrintSlice_μ", vec![ident_expr("xs")]))],
    );
    let mut file = source_file(vec![define("worker", lit)]);
    let text = expand_with(&mut file, &NoTypes, None);
    assert!(text.contains("arg1 := xs"), "{text}");
    assert!(!text.contains("_μ"), "{text}");
}
