//! Labels and goto

use super::harness::*;

#[test]
fn test_backward_goto_loops() {
    // var i = 0; top: i++; if (i < 3) goto top; i
    expect_int(
        vec![
            var("i", Some(int(0))),
            label("top"),
            expr_stmt(unary(UnaryOp::PostInc, id("i"))),
            if_(binary(BinaryOp::Lesser, id("i"), int(3)), goto("top"), None),
            expr_stmt(id("i")),
        ],
        3,
    );
}

#[test]
fn test_forward_goto_skips_code() {
    let (_, log) = run(vec![
        goto("done"),
        expr_stmt(call(id("skipped"), vec![])),
        label("done"),
        expr_stmt(call(id("reached"), vec![])),
    ]);
    assert_eq!(log, vec!["reached"]);
}

#[test]
fn test_goto_out_of_try() {
    // try { goto out; } catch { } skipped(); out: reached();
    let (outcome, log) = run(vec![
        try_(block(vec![goto("out")]), vec![catch(None, None, block(vec![]))], None),
        expr_stmt(call(id("skipped"), vec![])),
        label("out"),
        expr_stmt(call(id("reached"), vec![])),
    ]);
    assert!(matches!(outcome, Outcome::Return(_)));
    assert_eq!(log, vec!["reached"]);
}

#[test]
fn test_goto_into_try_is_rejected() {
    let error = compile_error(vec![
        goto("inside"),
        try_(block(vec![label("inside")]), vec![catch(None, None, block(vec![]))], None),
    ]);
    assert!(matches!(error, risse_compiler::CompileError::JumpIntoDeeperBlock { .. }));
}

#[test]
fn test_bind_all_labels_is_idempotent() {
    use risse_compiler::{CompileOptions, Compiler};

    let root = top_level(vec![
        var("i", Some(int(0))),
        label("top"),
        expr_stmt(unary(UnaryOp::PostInc, id("i"))),
        if_(binary(BinaryOp::Lesser, id("i"), int(3)), goto("top"), None),
    ]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(&root).expect("compile failed");
    let before = compiler.program().live_statement_count();
    compiler.bind_all_labels().expect("rebinding failed");
    assert_eq!(compiler.program().live_statement_count(), before);
    assert!(compiler.program().verify().is_ok());
}
