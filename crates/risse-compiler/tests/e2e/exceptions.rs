//! try/catch/finally, throw and synchronized

use super::harness::*;

fn log_call(name: &str) -> Node {
    expr_stmt(call(id(name), vec![]))
}

#[test]
fn test_try_value_without_throw() {
    expect_int(
        vec![try_(
            block(vec![expr_stmt(int(1))]),
            vec![catch(Some("e"), None, block(vec![expr_stmt(int(2))]))],
            None,
        )],
        1,
    );
}

#[test]
fn test_catch_receives_thrown_value() {
    expect_int(
        vec![try_(
            block(vec![throw_(Some(int(3)))]),
            vec![catch(
                Some("e"),
                None,
                block(vec![expr_stmt(binary(BinaryOp::Add, id("e"), int(1)))]),
            )],
            None,
        )],
        4,
    );
}

#[test]
fn test_try_body_writes_parent_variable() {
    // var x = 1; try { x = 2; } catch (e) { } x
    expect_int(
        vec![
            var("x", Some(int(1))),
            try_(
                block(vec![expr_stmt(assign(id("x"), int(2)))]),
                vec![catch(Some("e"), None, block(vec![]))],
                None,
            ),
            expr_stmt(id("x")),
        ],
        2,
    );
}

#[test]
fn test_try_body_reads_parent_variable() {
    // var x = 20; var y = 0; try { y = x + 1; } catch { } y
    expect_int(
        vec![
            var("x", Some(int(20))),
            var("y", Some(int(0))),
            try_(
                block(vec![expr_stmt(assign(id("y"), binary(BinaryOp::Add, id("x"), int(1))))]),
                vec![catch(None, None, block(vec![]))],
                None,
            ),
            expr_stmt(id("y")),
        ],
        21,
    );
}

#[test]
fn test_conditional_catch_clauses() {
    // try { throw 5; } catch (e) if (e == 1) { 10 } catch (e) if (e == 5) { 50 }
    let clause = |value: i64, result: i64| {
        catch(
            Some("e"),
            Some(binary(BinaryOp::Equal, id("e"), int(value))),
            block(vec![expr_stmt(int(result))]),
        )
    };
    expect_int(
        vec![try_(block(vec![throw_(Some(int(5)))]), vec![clause(1, 10), clause(5, 50)], None)],
        50,
    );
}

#[test]
fn test_unmatched_exception_is_rethrown() {
    let (outcome, _) = run(vec![try_(
        block(vec![throw_(Some(int(5)))]),
        vec![catch(Some("e"), Some(boolean(false)), block(vec![]))],
        None,
    )]);
    assert_eq!(outcome, Outcome::Throw(Val::Int(5)));
}

#[test]
fn test_rethrow_inside_catch() {
    let (outcome, _) = run(vec![try_(
        block(vec![throw_(Some(string("boom")))]),
        vec![catch(Some("e"), None, block(vec![throw_(None)]))],
        None,
    )]);
    assert_eq!(outcome, Outcome::Throw(Val::Str("boom".to_string())));
}

#[test]
fn test_finally_runs_once_on_throw() {
    let (outcome, log) = run(vec![try_(
        block(vec![throw_(Some(int(9)))]),
        vec![],
        Some(block(vec![log_call("f")])),
    )]);
    assert_eq!(outcome, Outcome::Throw(Val::Int(9)));
    assert_eq!(log, vec!["f"]);
}

#[test]
fn test_finally_keeps_try_value() {
    let (outcome, log) = run(vec![try_(
        block(vec![expr_stmt(int(1))]),
        vec![],
        Some(block(vec![log_call("f")])),
    )]);
    assert_eq!(outcome, Outcome::Return(Val::Int(1)));
    assert_eq!(log, vec!["f"]);
}

#[test]
fn test_finally_after_catch() {
    // try { a(); throw 1; } catch (e) { b(); } finally { f(); }
    let (outcome, log) = run(vec![try_(
        block(vec![log_call("a"), throw_(Some(int(1)))]),
        vec![catch(Some("e"), None, block(vec![log_call("b")]))],
        Some(block(vec![log_call("f")])),
    )]);
    assert!(matches!(outcome, Outcome::Return(_)));
    assert_eq!(log, vec!["a", "b", "f"]);
}

#[test]
fn test_finally_runs_when_catch_throws() {
    let (outcome, log) = run(vec![try_(
        block(vec![throw_(Some(int(1)))]),
        vec![catch(Some("e"), None, block(vec![throw_(Some(int(2)))]))],
        Some(block(vec![log_call("f")])),
    )]);
    assert_eq!(outcome, Outcome::Throw(Val::Int(2)));
    assert_eq!(log, vec!["f"]);
}

#[test]
fn test_break_out_of_try_runs_finally() {
    // while (true) { try { break; } finally { f(); } } 5
    let (outcome, log) = run(vec![
        while_(
            boolean(true),
            block(vec![try_(block(vec![break_(None)]), vec![], Some(block(vec![log_call("f")])))]),
        ),
        expr_stmt(int(5)),
    ]);
    assert_eq!(outcome, Outcome::Return(Val::Int(5)));
    assert_eq!(log, vec!["f"]);
}

#[test]
fn test_continue_out_of_try() {
    // var i = 0; var s = 0;
    // while (i < 4) { i++; try { if (i == 2) continue; s += i; } catch { } }
    // s
    expect_int(
        vec![
            var("i", Some(int(0))),
            var("s", Some(int(0))),
            while_(
                binary(BinaryOp::Lesser, id("i"), int(4)),
                block(vec![
                    expr_stmt(unary(UnaryOp::PostInc, id("i"))),
                    try_(
                        block(vec![
                            if_(binary(BinaryOp::Equal, id("i"), int(2)), continue_(None), None),
                            expr_stmt(binary(BinaryOp::AssignAdd, id("s"), id("i"))),
                        ]),
                        vec![catch(None, None, block(vec![]))],
                        None,
                    ),
                ]),
            ),
            expr_stmt(id("s")),
        ],
        8,
    );
}

#[test]
fn test_finally_label_in_every_copy() {
    // var n = 0; try { a(); } catch (e) { } finally { again: n++; if (n < 2) goto again; } n
    let (outcome, log) = run(vec![
        var("n", Some(int(0))),
        try_(
            block(vec![log_call("a")]),
            vec![catch(Some("e"), None, block(vec![]))],
            Some(block(vec![
                label("again"),
                expr_stmt(unary(UnaryOp::PostInc, id("n"))),
                if_(binary(BinaryOp::Lesser, id("n"), int(2)), goto("again"), None),
            ])),
        ),
        expr_stmt(id("n")),
    ]);
    assert_eq!(outcome, Outcome::Return(Val::Int(2)));
    assert_eq!(log, vec!["a"]);
}

#[test]
fn test_finally_label_on_exit_path() {
    // var n = 0; while (true) { try { break; } finally { again: n++; if (n < 3) goto again; } } n
    expect_int(
        vec![
            var("n", Some(int(0))),
            while_(
                boolean(true),
                block(vec![try_(
                    block(vec![break_(None)]),
                    vec![],
                    Some(block(vec![
                        label("again"),
                        expr_stmt(unary(UnaryOp::PostInc, id("n"))),
                        if_(binary(BinaryOp::Lesser, id("n"), int(3)), goto("again"), None),
                    ])),
                )]),
            ),
            expr_stmt(id("n")),
        ],
        3,
    );
}

#[test]
fn test_break_from_finally_after_continue() {
    // var i = 0; while (true) { try { i++; continue; } finally { if (i >= 3) break; } } i
    expect_int(
        vec![
            var("i", Some(int(0))),
            while_(
                boolean(true),
                block(vec![try_(
                    block(vec![expr_stmt(unary(UnaryOp::PostInc, id("i"))), continue_(None)]),
                    vec![],
                    Some(block(vec![if_(
                        binary(BinaryOp::GreaterOrEqual, id("i"), int(3)),
                        break_(None),
                        None,
                    )])),
                )]),
            ),
            expr_stmt(id("i")),
        ],
        3,
    );
}

#[test]
fn test_continue_from_finally_after_break() {
    // var i = 0; var s = 0;
    // while (i < 3) { i++; try { break; } finally { s += i; continue; } } s
    expect_int(
        vec![
            var("i", Some(int(0))),
            var("s", Some(int(0))),
            while_(
                binary(BinaryOp::Lesser, id("i"), int(3)),
                block(vec![
                    expr_stmt(unary(UnaryOp::PostInc, id("i"))),
                    try_(
                        block(vec![break_(None)]),
                        vec![],
                        Some(block(vec![
                            expr_stmt(binary(BinaryOp::AssignAdd, id("s"), id("i"))),
                            continue_(None),
                        ])),
                    ),
                ]),
            ),
            expr_stmt(id("s")),
        ],
        6,
    );
}

#[test]
fn test_return_through_nested_finally() {
    // function g() { try { try { return 1; } finally { a(); } } finally { b(); } }
    // g()
    let (outcome, log) = run(vec![
        func(
            Some("g"),
            vec![],
            vec![try_(
                block(vec![try_(
                    block(vec![return_(Some(int(1)))]),
                    vec![],
                    Some(block(vec![log_call("a")])),
                )]),
                vec![],
                Some(block(vec![log_call("b")])),
            )],
        ),
        expr_stmt(call(id("g"), vec![])),
    ]);
    assert_eq!(outcome, Outcome::Return(Val::Int(1)));
    assert_eq!(log, vec!["a", "b"]);
}

#[test]
fn test_try_finally_structure() {
    let program = compile_script(vec![try_(
        block(vec![throw_(Some(int(1)))]),
        vec![],
        Some(block(vec![log_call("f")])),
    )]);
    let root = program.root_form().unwrap();
    let try_form = program.form(root).children()[0];
    assert!(program.form(try_form).uses_parent_frame());
    assert!(!program.form(try_form).can_return());
    assert!(program.form(try_form).try_id().is_some());

    let codes = opcodes_of(&program, "toplevel");
    assert!(codes.contains(&OpCode::TryFuncCall));
    assert!(codes.contains(&OpCode::CatchBranch));
    assert!(codes.contains(&OpCode::GetExitTryValue));
    // the finally body runs on the normal and the rethrow path
    let calls = codes.iter().filter(|c| **c == OpCode::FuncCall).count();
    assert_eq!(calls, 2);
}

#[test]
fn test_synchronized_runs_body() {
    let (outcome, log) = run(vec![synchronized(
        call(id("lock"), vec![]),
        block(vec![log_call("work"), expr_stmt(int(3))]),
    )]);
    assert_eq!(outcome, Outcome::Return(Val::Int(3)));
    assert_eq!(log, vec!["lock", "work"]);
}
