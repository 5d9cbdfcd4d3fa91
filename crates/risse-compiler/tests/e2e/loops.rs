//! while, do-while and for

use super::harness::*;

fn inc(name: &str) -> Node {
    unary(UnaryOp::PostInc, id(name))
}

fn lt(name: &str, limit: i64) -> Node {
    binary(BinaryOp::Lesser, id(name), int(limit))
}

#[test]
fn test_break_with_value() {
    expect_int(
        vec![expr_stmt(while_(boolean(true), block(vec![break_(Some(int(42)))])))],
        42,
    );
}

#[test]
fn test_loop_not_entered_yields_void() {
    expect_value(
        vec![expr_stmt(while_(boolean(false), block(vec![expr_stmt(int(1))])))],
        Val::Void,
    );
}

#[test]
fn test_loop_value_resets_on_condition_check() {
    // the last iteration evaluates 1, then the failing check resets it
    expect_value(
        vec![
            var("i", Some(int(0))),
            expr_stmt(while_(lt("i", 2), block(vec![expr_stmt(inc("i")), expr_stmt(int(1))]))),
        ],
        Val::Void,
    );
}

#[test]
fn test_valueless_break_yields_void() {
    expect_value(
        vec![expr_stmt(while_(
            boolean(true),
            block(vec![expr_stmt(int(7)), break_(None)]),
        ))],
        Val::Void,
    );
}

#[test]
fn test_while_sum() {
    // var i = 0; var s = 0; while (i < 5) { s += i; i++; } s
    expect_int(
        vec![
            var("i", Some(int(0))),
            var("s", Some(int(0))),
            while_(
                lt("i", 5),
                block(vec![
                    expr_stmt(binary(BinaryOp::AssignAdd, id("s"), id("i"))),
                    expr_stmt(inc("i")),
                ]),
            ),
            expr_stmt(id("s")),
        ],
        10,
    );
}

#[test]
fn test_do_while_runs_once() {
    expect_int(
        vec![
            var("n", Some(int(0))),
            do_while(block(vec![expr_stmt(inc("n"))]), boolean(false)),
            expr_stmt(id("n")),
        ],
        1,
    );
}

#[test]
fn test_for_with_continue() {
    // var s = 0; for (var i = 0; i < 5; i++) { if (i == 2) continue; s += i; } s
    expect_int(
        vec![
            var("s", Some(int(0))),
            for_(
                Some(var("i", Some(int(0)))),
                Some(lt("i", 5)),
                Some(inc("i")),
                block(vec![
                    if_(binary(BinaryOp::Equal, id("i"), int(2)), continue_(None), None),
                    expr_stmt(binary(BinaryOp::AssignAdd, id("s"), id("i"))),
                ]),
            ),
            expr_stmt(id("s")),
        ],
        8,
    );
}

#[test]
fn test_for_without_condition_leaves_by_break() {
    // var n = 0; for (;;) { if (n == 3) break; n++; } n
    expect_int(
        vec![
            var("n", Some(int(0))),
            for_(
                None,
                None,
                None,
                block(vec![
                    if_(binary(BinaryOp::Equal, id("n"), int(3)), break_(None), None),
                    expr_stmt(inc("n")),
                ]),
            ),
            expr_stmt(id("n")),
        ],
        3,
    );
}

#[test]
fn test_nested_loops_break_innermost() {
    // var c = 0; var i = 0;
    // while (i < 3) { i++; while (true) { c++; break; } }
    // c
    expect_int(
        vec![
            var("c", Some(int(0))),
            var("i", Some(int(0))),
            while_(
                lt("i", 3),
                block(vec![
                    expr_stmt(inc("i")),
                    while_(boolean(true), block(vec![expr_stmt(inc("c")), break_(None)])),
                ]),
            ),
            expr_stmt(id("c")),
        ],
        3,
    );
}

#[test]
fn test_for_initializer_is_scoped() {
    let program = compile_script(vec![for_(
        Some(var("i", Some(int(0)))),
        Some(lt("i", 1)),
        Some(inc("i")),
        block(vec![]),
    )]);
    let root = program.root_form().unwrap();
    assert!(!program.form(root).namespace().contains("i"));
}
