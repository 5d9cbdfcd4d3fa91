//! Calls with callback blocks
//!
//! Host functions call each block with 0, 1 and 2 and return the last
//! value a block produced.

use super::harness::*;

fn each(blocks: Vec<Node>) -> Node {
    call_with(id("each"), vec![], false, blocks)
}

fn block_fn(body: Vec<Node>) -> Node {
    func(None, vec![param("x", None)], body)
}

#[test]
fn test_block_value_is_call_result() {
    expect_int(
        vec![expr_stmt(each(vec![block_fn(vec![expr_stmt(binary(
            BinaryOp::Add,
            id("x"),
            int(1),
        ))])]))],
        3,
    );
}

#[test]
fn test_continue_leaves_block_with_value() {
    expect_int(
        vec![expr_stmt(each(vec![block_fn(vec![continue_(Some(binary(
            BinaryOp::Mul,
            id("x"),
            int(2),
        )))])]))],
        4,
    );
}

#[test]
fn test_break_leaves_the_call() {
    let (outcome, log) = run(vec![
        expr_stmt(each(vec![block_fn(vec![break_(Some(int(7)))])])),
    ]);
    assert_eq!(outcome, Outcome::Return(Val::Int(7)));
    assert_eq!(log, vec!["each"]);
}

#[test]
fn test_return_from_block_returns_enclosing_function() {
    // function f() { each() { |x| return 5; }; return 1; } f()
    expect_int(
        vec![
            func(
                Some("f"),
                vec![],
                vec![
                    expr_stmt(each(vec![block_fn(vec![return_(Some(int(5)))])])),
                    return_(Some(int(1))),
                ],
            ),
            expr_stmt(call(id("f"), vec![])),
        ],
        5,
    );
}

#[test]
fn test_block_shares_enclosing_variables() {
    // var total = 0; each() { |x| total += x; } total
    expect_int(
        vec![
            var("total", Some(int(0))),
            expr_stmt(each(vec![block_fn(vec![expr_stmt(binary(
                BinaryOp::AssignAdd,
                id("total"),
                id("x"),
            ))])])),
            expr_stmt(id("total")),
        ],
        3,
    );
}

#[test]
fn test_exception_in_block_propagates() {
    let (outcome, _) = run(vec![expr_stmt(each(vec![block_fn(vec![throw_(Some(int(1)))])]))]);
    assert_eq!(outcome, Outcome::Throw(Val::Int(1)));
}

#[test]
fn test_break_from_block_inside_loop() {
    // var n = 0; while (n < 3) { n++; each() { |x| break; } } n
    expect_int(
        vec![
            var("n", Some(int(0))),
            while_(
                binary(BinaryOp::Lesser, id("n"), int(3)),
                block(vec![
                    expr_stmt(unary(UnaryOp::PostInc, id("n"))),
                    expr_stmt(each(vec![block_fn(vec![break_(None)])])),
                ]),
            ),
            expr_stmt(id("n")),
        ],
        3,
    );
}

#[test]
fn test_callback_form_flags() {
    let program = compile_script(vec![expr_stmt(each(vec![block_fn(vec![])]))]);
    let root = program.root_form().unwrap();
    let child = program.form(root).children()[0];
    let form = program.form(child);
    assert!(form.is_callback());
    assert!(!form.can_return());
    assert!(!form.uses_parent_frame());
    assert!(form.try_id().is_some());

    let codes = opcodes_of(&program, "toplevel");
    assert!(codes.contains(&OpCode::FuncCallBlock));
    assert!(codes.contains(&OpCode::CatchBranch));
}
