//! if, ?: and the short-circuit operators

use super::harness::*;

#[test]
fn test_if_yields_then_value() {
    expect_int(
        vec![expr_stmt(if_(
            boolean(true),
            block(vec![expr_stmt(int(1))]),
            Some(block(vec![expr_stmt(int(2))])),
        ))],
        1,
    );
}

#[test]
fn test_if_yields_else_value() {
    expect_int(
        vec![expr_stmt(if_(
            boolean(false),
            block(vec![expr_stmt(int(1))]),
            Some(block(vec![expr_stmt(int(2))])),
        ))],
        2,
    );
}

#[test]
fn test_if_without_else_yields_void() {
    expect_value(
        vec![expr_stmt(if_(boolean(false), block(vec![expr_stmt(int(1))]), None))],
        Val::Void,
    );
}

#[test]
fn test_if_merges_assignments() {
    // var x = 0; if (c) x = 5; else x = 7; x
    let program = |c: bool| {
        vec![
            var("x", Some(int(0))),
            if_(
                boolean(c),
                expr_stmt(assign(id("x"), int(5))),
                Some(expr_stmt(assign(id("x"), int(7)))),
            ),
            expr_stmt(id("x")),
        ]
    };
    expect_int(program(true), 5);
    expect_int(program(false), 7);
}

#[test]
fn test_trinary() {
    expect_int(
        vec![
            var("a", Some(int(3))),
            expr_stmt(trinary(binary(BinaryOp::Greater, id("a"), int(2)), int(10), int(20))),
        ],
        10,
    );
}

#[test]
fn test_logical_and_or() {
    expect_value(
        vec![expr_stmt(binary(BinaryOp::LogAnd, boolean(true), boolean(false)))],
        Val::Bool(false),
    );
    expect_value(
        vec![expr_stmt(binary(BinaryOp::LogOr, boolean(false), boolean(true)))],
        Val::Bool(true),
    );
    expect_value(
        vec![expr_stmt(binary(BinaryOp::LogAnd, int(1), int(2)))],
        Val::Bool(true),
    );
}

#[test]
fn test_short_circuit_skips_right_operand() {
    let (outcome, log) = run(vec![expr_stmt(binary(
        BinaryOp::LogAnd,
        boolean(false),
        call(id("never"), vec![]),
    ))]);
    assert_eq!(outcome, Outcome::Return(Val::Bool(false)));
    assert!(log.is_empty());

    let (_, log) = run(vec![expr_stmt(binary(
        BinaryOp::LogOr,
        boolean(false),
        call(id("called"), vec![]),
    ))]);
    assert_eq!(log, vec!["called"]);
}

#[test]
fn test_short_circuit_exit_has_three_way_phi() {
    let program = compile_script(vec![
        var("a", Some(boolean(true))),
        var("b", Some(boolean(false))),
        expr_stmt(binary(BinaryOp::LogAnd, id("a"), id("b"))),
    ]);
    let root = program.root_form().unwrap();
    let exit = program.find_block(root, "logand_exit").expect("no exit block");
    assert_eq!(program.block(exit).preds().len(), 3);
    let phi = program
        .block(exit)
        .statements()
        .iter()
        .map(|s| program.statement(*s))
        .find(|s| s.code() == OpCode::Phi)
        .expect("no phi in the exit block");
    assert_eq!(phi.used().len(), 3);
}

#[test]
fn test_logical_and_assignment() {
    expect_value(
        vec![
            var("a", Some(boolean(true))),
            expr_stmt(binary(BinaryOp::AssignLogAnd, id("a"), boolean(false))),
            expr_stmt(id("a")),
        ],
        Val::Bool(false),
    );
}

#[test]
fn test_compound_assignment_and_swap() {
    // var a = 1; var b = 2; a <-> b; a += 10; a * 10 + b
    expect_int(
        vec![
            var("a", Some(int(1))),
            var("b", Some(int(2))),
            expr_stmt(binary(BinaryOp::Swap, id("a"), id("b"))),
            expr_stmt(binary(BinaryOp::AssignAdd, id("a"), int(10))),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(BinaryOp::Mul, id("a"), int(10)),
                id("b"),
            )),
        ],
        121,
    );
}

#[test]
fn test_increment_forms() {
    // var i = 5; var a = i++; var b = ++i; a * 100 + b
    expect_int(
        vec![
            var("i", Some(int(5))),
            var("a", Some(unary(UnaryOp::PostInc, id("i")))),
            var("b", Some(unary(UnaryOp::PreInc, id("i")))),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(BinaryOp::Mul, id("a"), int(100)),
                id("b"),
            )),
        ],
        507,
    );
}
