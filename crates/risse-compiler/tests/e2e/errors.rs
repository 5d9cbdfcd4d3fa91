//! Compile errors

use super::harness::*;
use risse_ast::FuncCallArg;
use risse_compiler::{compile, error_code, CompileError, CompileOptions, ErrorKind};

#[test]
fn test_duplicate_default() {
    let error = compile_error(vec![switch(int(1), vec![default_case(), default_case()])]);
    assert!(matches!(error, CompileError::DuplicateDefault { .. }));
    assert_eq!(error.to_string(), "cannot place multiple 'default' in a switch");
}

#[test]
fn test_case_outside_switch() {
    let error = compile_error(vec![case(int(1))]);
    assert_eq!(error.to_string(), "cannot place 'case' out of switch");
    let error = compile_error(vec![default_case()]);
    assert_eq!(error.to_string(), "cannot place 'default' out of switch");
}

#[test]
fn test_too_many_arguments() {
    let args: Vec<Node> = (0..31).map(int).collect();
    let error = compile_error(vec![expr_stmt(call(id("f"), args))]);
    assert!(matches!(
        error,
        CompileError::TooManyArguments {
            what: "function arguments",
            limit: 30,
            ..
        }
    ));

    let params: Vec<_> = (0..31).map(|i| param(&format!("p{}", i), None)).collect();
    let error = compile_error(vec![func(Some("f"), params, vec![])]);
    assert!(matches!(error, CompileError::TooManyArguments { .. }));
}

#[test]
fn test_argument_limit_capped_by_expand_mask() {
    let options = CompileOptions {
        max_arguments: 40,
        ..CompileOptions::default()
    };
    let mut args: Vec<FuncCallArg> = (0..32).map(|i| arg(int(i))).collect();
    args.push(expand_arg(Some(id("rest"))));
    let root = top_level(vec![expr_stmt(call_with(id("f"), args, false, vec![]))]);
    let error = compile(&root, &options).unwrap_err();
    assert!(matches!(
        error,
        CompileError::TooManyArguments {
            what: "function arguments",
            limit: 32,
            ..
        }
    ));
}

#[test]
fn test_undefined_label() {
    let error = compile_error(vec![goto("nowhere")]);
    assert!(matches!(error, CompileError::UndefinedLabel { ref label, .. } if label == "nowhere"));
}

#[test]
fn test_duplicate_label() {
    let error = compile_error(vec![label("a"), label("a")]);
    assert!(matches!(error, CompileError::DuplicateLabel { .. }));
}

#[test]
fn test_labels_do_not_cross_functions() {
    let error = compile_error(vec![label("outer"), func(Some("f"), vec![], vec![goto("outer")])]);
    assert!(matches!(error, CompileError::UndefinedLabel { .. }));
}

#[test]
fn test_misplaced_break_and_continue() {
    let error = compile_error(vec![break_(None)]);
    assert_eq!(error.to_string(), "cannot place 'break' here");
    let error = compile_error(vec![continue_(None)]);
    assert_eq!(error.to_string(), "cannot place 'continue' here");
}

#[test]
fn test_break_does_not_cross_function() {
    let error = compile_error(vec![while_(
        boolean(true),
        block(vec![func(Some("g"), vec![], vec![break_(None)])]),
    )]);
    assert!(matches!(error, CompileError::MisplacedJump { keyword: "break", .. }));
}

#[test]
fn test_continue_with_value_in_loop() {
    let error = compile_error(vec![while_(boolean(true), block(vec![continue_(Some(int(1)))]))]);
    assert!(matches!(error, CompileError::JumpWithValue { keyword: "continue", .. }));
}

#[test]
fn test_super_outside_class() {
    let error = compile_error(vec![expr_stmt(super_())]);
    assert!(matches!(error, CompileError::SuperUnavailable { .. }));
}

#[test]
fn test_not_assignable() {
    let error = compile_error(vec![expr_stmt(assign(int(1), int(2)))]);
    assert_eq!(error.to_string(), "Writable expression required at left side of '='");

    let error = compile_error(vec![expr_stmt(unary(UnaryOp::PostInc, int(1)))]);
    assert!(matches!(error, CompileError::NotAssignable { .. }));

    let error = compile_error(vec![expr_stmt(assign(array(vec![Some(int(1))]), id("v")))]);
    assert_eq!(error.to_string(), "Writable expression required at array index 0");
}

#[test]
fn test_not_deletable() {
    let error = compile_error(vec![expr_stmt(unary(UnaryOp::Delete, int(1)))]);
    assert!(matches!(error, CompileError::NotDeletable { .. }));
}

#[test]
fn test_no_collapsed_arguments() {
    let error = compile_error(vec![expr_stmt(call_with(id("f"), vec![expand_arg(None)], false, vec![]))]);
    assert!(matches!(error, CompileError::NoCollapsedArguments { .. }));
}

#[test]
fn test_error_kinds_and_codes() {
    let error = compile_error(vec![goto("nowhere")]);
    assert_eq!(error.kind(), ErrorKind::Structural);
    assert_eq!(error_code(&error).as_str().len(), 5);

    let error = compile_error(vec![expr_stmt(super_())]);
    assert_eq!(error.kind(), ErrorKind::Semantic);
}
