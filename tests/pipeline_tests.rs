//! Pipeline expansion tests: fluent Map/Filter/Reduce/Ret chains down to
//! emitted loops.

use mupp::ast::builder::*;
use mupp::ast::{BinaryOp, Decl, Expr, Field, File, Import, Stmt};
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

fn expand_with(file: &mut File, types: &dyn TypeLookup) -> String {
    let registry = build_default_registry();
    let mut ctx = Context::new("", None);
    Expander::new(&registry, types, &mut ctx)
        .expand_file(file)
        .expect("expansion failed");
    emit_file(file)
}

/// `recv.name(args...)`
fn stage(recv: Expr, name: &str, args: Vec<Expr>) -> Expr {
    call(sel(recv, name), args)
}

fn unary_lit(param: &str, param_typ: &str, result_typ: &str, body: Vec<Stmt>) -> Expr {
    func_lit(
        sig(
            vec![field(&[param], named(param_typ))],
            vec![Field::unnamed(named(result_typ))],
        ),
        body,
    )
}

#[test]
fn map_filter_chain_expands_to_staged_loops() {
    // macro.NewSeq_μ(fseq).
    //     Map(func(v float64) float64 { return v + 1 }).
    //     Filter(func(v float64) bool { return v < 300 }).
    //     Map(ftoa).
    //     Map(func(v string, i int) styp { return styp{len(v) + i} }).
    //     Ret(&out)
    let add_one = unary_lit(
        "v",
        "float64",
        "float64",
        vec![ret(vec![binary(BinaryOp::Add, ident_expr("v"), int_lit(1))])],
    );
    let below_300 = unary_lit(
        "v",
        "float64",
        "bool",
        vec![ret(vec![binary(BinaryOp::Lt, ident_expr("v"), int_lit(300))])],
    );
    let to_styp = func_lit(
        sig(
            vec![field(&["v"], named("string")), field(&["i"], named("int"))],
            vec![Field::unnamed(named("styp"))],
        ),
        vec![ret(vec![composite(
            named("styp"),
            vec![binary(
                BinaryOp::Add,
                call(ident_expr("len"), vec![ident_expr("v")]),
                ident_expr("i"),
            )],
        )])],
    );
    let chain = stage(
        stage(
            stage(
                stage(
                    stage(
                        call_sel("macro", "NewSeq_μ", vec![ident_expr("fseq")]),
                        "Map",
                        vec![add_one],
                    ),
                    "Filter",
                    vec![below_300],
                ),
                "Map",
                vec![ident_expr("ftoa")],
            ),
            "Map",
            vec![to_styp],
        ),
        "Ret",
        vec![addr(ident_expr("out"))],
    );

    let mut table = SigTable::new();
    table.insert(
        "ftoa",
        sig(
            vec![Field::unnamed(named("float64"))],
            vec![Field::unnamed(named("string"))],
        ),
    );

    let mut file = source_file(vec![expr_stmt(chain)]);
    let text = expand_with(&mut file, &table);

    // one accumulator per stage boundary, typed by the callbacks
    assert!(text.contains("seq0 := fseq"), "{text}");
    assert!(text.contains("var seq1 []float64"), "{text}");
    assert!(text.contains("var seq2 []float64"), "{text}");
    assert!(text.contains("var seq3 []string"), "{text}");
    assert!(text.contains("var seq4 []styp"), "{text}");
    assert_eq!(text.matches("var seq").count(), 4, "{text}");

    // unary callbacks gain an ignored index parameter
    assert!(text.contains("f := func(v float64, _ int) float64 {"), "{text}");
    assert!(text.contains("f := func(v float64, _ int) bool {"), "{text}");
    // a named function is wrapped from its declared signature
    assert!(text.contains("f := func(a0 float64, _ int) string {"), "{text}");
    assert!(text.contains("return ftoa(a0)"), "{text}");
    // a binary callback already matches the calling convention
    assert!(text.contains("f := func(v string, i int) styp {"), "{text}");

    // stages are wired accumulator to accumulator
    assert!(text.contains("in := seq0"), "{text}");
    assert!(text.contains("out := &seq1"), "{text}");
    assert!(text.contains("in := seq3"), "{text}");
    assert!(text.contains("out := &seq4"), "{text}");

    // the library loops were themselves expanded
    assert!(text.contains("*res = append(*res, fun(input[i], i))"), "{text}");
    assert!(text.contains("if pred(v, i) {"), "{text}");
    assert!(text.contains("*res = append(*res, input[i])"), "{text}");

    // Ret copies into the caller's slice through the pointer argument
    assert!(text.contains("output := &out"), "{text}");
    assert!(text.contains("res := seq4"), "{text}");
    assert!(text.contains("*output = append(*output, res[i])"), "{text}");

    assert!(!text.contains("_μ"), "marker survived expansion:\n{text}");
    assert!(!text.contains(MACRO_LIB_PATH), "{text}");
}

#[test]
fn reduce_folds_through_accumulator_pointer() {
    // macro.NewSeq_μ(xs).Reduce(&total, func(acc, v int) int { return acc + v })
    let fold = func_lit(
        sig(
            vec![field(&["acc", "v"], named("int"))],
            vec![Field::unnamed(named("int"))],
        ),
        vec![ret(vec![binary(BinaryOp::Add, ident_expr("acc"), ident_expr("v"))])],
    );
    let chain = stage(
        call_sel("macro", "NewSeq_μ", vec![ident_expr("xs")]),
        "Reduce",
        vec![addr(ident_expr("total")), fold],
    );
    let mut file = source_file(vec![expr_stmt(chain)]);
    let text = expand_with(&mut file, &NoTypes);

    assert!(text.contains("seq0 := xs"), "{text}");
    assert!(text.contains("out := &total"), "{text}");
    assert!(text.contains("f := func(acc, v int, _ int) int {"), "{text}");
    assert!(text.contains("in := seq0"), "{text}");
    assert!(text.contains("accum := out"), "{text}");
    assert!(text.contains("*accum = fun(*accum, input[i], i)"), "{text}");
    // Reduce writes through the pointer; no new accumulator is declared
    assert!(!text.contains("var seq"), "{text}");
    assert!(!text.contains("_μ"), "{text}");
}

#[test]
fn chained_reduces_share_the_input_accumulator() {
    let first = func_lit(
        sig(
            vec![field(&["acc", "v"], named("int"))],
            vec![Field::unnamed(named("int"))],
        ),
        vec![ret(vec![binary(BinaryOp::Add, ident_expr("acc"), ident_expr("v"))])],
    );
    let second = func_lit(
        sig(
            vec![field(&["acc", "v"], named("int"))],
            vec![Field::unnamed(named("int"))],
        ),
        vec![ret(vec![binary(BinaryOp::Mul, ident_expr("acc"), ident_expr("v"))])],
    );
    let chain = stage(
        stage(
            call_sel("macro", "NewSeq_μ", vec![ident_expr("xs")]),
            "Reduce",
            vec![addr(ident_expr("sum")), first],
        ),
        "Reduce",
        vec![addr(ident_expr("product")), second],
    );
    let mut file = source_file(vec![expr_stmt(chain)]);
    let text = expand_with(&mut file, &NoTypes);

    assert!(text.contains("out := &sum"), "{text}");
    assert!(text.contains("out := &product"), "{text}");
    // both folds read the constructor's accumulator
    assert_eq!(text.matches("in := seq0").count(), 2, "{text}");
}

#[test]
fn bodyless_constructor_is_a_malformed_macro() {
    let mut registry = build_default_registry();
    registry.register_file(&File {
        package: "macro".into(),
        name: "macro/empty.go".into(),
        imports: vec![],
        decls: vec![Decl::Func(func_decl(
            "NewEmpty_μ",
            sig(
                vec![field(&["src"], mupp::ast::TypeExpr::Interface)],
                vec![Field::unnamed(ptr_to(named("seq_μ")))],
            ),
            vec![ret(vec![nil()])],
        ))],
    });
    let chain = stage(
        call_sel("macro", "NewEmpty_μ", vec![]),
        "Ret",
        vec![addr(ident_expr("out"))],
    );
    let mut file = source_file(vec![expr_stmt(chain)]);
    let mut ctx = Context::new("", None);
    let err = Expander::new(&registry, &NoTypes, &mut ctx)
        .expand_file(&mut file)
        .unwrap_err();
    assert!(matches!(err, ExpandError::MalformedMacroBody { .. }), "{err}");
}

#[test]
fn unknown_callback_signature_leaves_pipeline_untouched() {
    let chain = stage(
        stage(
            call_sel("macro", "NewSeq_μ", vec![ident_expr("xs")]),
            "Map",
            vec![ident_expr("unknownFn")],
        ),
        "Ret",
        vec![addr(ident_expr("out"))],
    );
    let mut file = source_file(vec![expr_stmt(chain)]);
    let text = expand_with(&mut file, &NoTypes);
    assert!(text.contains("NewSeq_μ(xs)"), "{text}");
    assert!(!text.contains("seq0"), "{text}");
}
