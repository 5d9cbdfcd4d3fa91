//! switch, case and default

use super::harness::*;

fn log_call(name: &str) -> Node {
    expr_stmt(call(id(name), vec![]))
}

fn sample(value: i64) -> Vec<Node> {
    // switch (value) { case 1: a(); case 2: b(); break; default: d(); case 3: c(); }
    vec![switch(
        int(value),
        vec![
            case(int(1)),
            log_call("a"),
            case(int(2)),
            log_call("b"),
            break_(None),
            default_case(),
            log_call("d"),
            case(int(3)),
            log_call("c"),
        ],
    )]
}

#[test]
fn test_case_falls_through_until_break() {
    let (_, log) = run(sample(1));
    assert_eq!(log, vec!["a", "b"]);
}

#[test]
fn test_later_case_matches() {
    let (_, log) = run(sample(2));
    assert_eq!(log, vec!["b"]);
    let (_, log) = run(sample(3));
    assert_eq!(log, vec!["c"]);
}

#[test]
fn test_default_taken_when_nothing_matches() {
    // default falls through into the next case body
    let (_, log) = run(sample(9));
    assert_eq!(log, vec!["d", "c"]);
}

#[test]
fn test_no_match_without_default_skips_body() {
    let (_, log) = run(vec![switch(int(5), vec![case(int(1)), log_call("a")])]);
    assert!(log.is_empty());
}

#[test]
fn test_reference_evaluated_once() {
    let (_, log) = run(vec![switch(
        call(id("subject"), vec![]),
        vec![case(int(1)), log_call("a"), case(int(2)), log_call("b")],
    )]);
    assert_eq!(log, vec!["subject"]);
}

#[test]
fn test_switch_value_survives_break() {
    // a valueless break keeps the last evaluated value
    expect_int(
        vec![expr_stmt(switch(
            int(1),
            vec![case(int(1)), expr_stmt(int(11)), break_(None)],
        ))],
        11,
    );
}

#[test]
fn test_case_writes_reach_the_exit() {
    // var r = 0; switch (2) { case 1: r = 1; break; case 2: r = 2; } r
    expect_int(
        vec![
            var("r", Some(int(0))),
            switch(
                int(2),
                vec![
                    case(int(1)),
                    expr_stmt(assign(id("r"), int(1))),
                    break_(None),
                    case(int(2)),
                    expr_stmt(assign(id("r"), int(2))),
                ],
            ),
            expr_stmt(id("r")),
        ],
        2,
    );
}
