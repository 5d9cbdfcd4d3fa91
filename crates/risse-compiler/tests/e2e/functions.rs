//! Function, property and class declarations

use super::harness::*;

fn add(a: Node, b: Node) -> Node {
    binary(BinaryOp::Add, a, b)
}

#[test]
fn test_function_call_returns_value() {
    expect_int(
        vec![
            func(Some("sum"), vec![param("a", None), param("b", None)], vec![return_(Some(add(id("a"), id("b"))))]),
            expr_stmt(call(id("sum"), vec![int(2), int(3)])),
        ],
        5,
    );
}

#[test]
fn test_default_parameter() {
    let program = |args: Vec<Node>| {
        vec![
            func(
                Some("f"),
                vec![param("a", None), param("b", Some(int(10)))],
                vec![return_(Some(add(id("a"), id("b"))))],
            ),
            expr_stmt(call(id("f"), args)),
        ]
    };
    expect_int(program(vec![int(1)]), 11);
    expect_int(program(vec![int(1), int(2)]), 3);
}

#[test]
fn test_function_without_return_yields_void() {
    expect_value(
        vec![
            func(Some("f"), vec![], vec![expr_stmt(int(1))]),
            expr_stmt(call(id("f"), vec![])),
        ],
        Val::Void,
    );
}

#[test]
fn test_closure_shares_captured_variable() {
    // var c = 0; function inc() { c++; } inc(); inc(); c
    let program = compile_script(vec![
        var("c", Some(int(0))),
        func(Some("inc"), vec![], vec![expr_stmt(unary(UnaryOp::PostInc, id("c")))]),
        expr_stmt(call(id("inc"), vec![])),
        expr_stmt(call(id("inc"), vec![])),
        expr_stmt(id("c")),
    ]);
    let root = program.root_form().unwrap();
    let function = program.form(root).function();
    let shared: Vec<&str> = program.function(function).shared_variables().collect();
    assert_eq!(shared.len(), 1);
    assert!(shared[0].starts_with("c#"));

    let mut eval = Evaluator::new(&program);
    assert_eq!(eval.run_form(root, &[], None), Outcome::Return(Val::Int(2)));
}

#[test]
fn test_inner_function_is_nested_function() {
    let program = compile_script(vec![func(
        Some("outer"),
        vec![],
        vec![func(Some("inner"), vec![], vec![])],
    )]);
    let levels: Vec<u32> = program.functions().map(|f| program.function(f).nest_level()).collect();
    assert_eq!(levels, vec![0, 1, 2]);
    let root = program.root_form().unwrap();
    let group = program.function(program.form(root).function()).group();
    assert_eq!(program.group(group).functions().len(), 3);
}

#[test]
fn test_anonymous_function_value() {
    // var f = function (x) { return x * 3; }; f(4)
    let program = compile_script(vec![
        var(
            "f",
            Some(func(None, vec![param("x", None)], vec![return_(Some(binary(BinaryOp::Mul, id("x"), int(3))))])),
        ),
        expr_stmt(call(id("f"), vec![int(4)])),
    ]);
    let codes = opcodes_of(&program, "toplevel");
    assert!(codes.contains(&OpCode::DefineLazyBlock));
    assert!(!codes.contains(&OpCode::DSetAttrib));
    let mut eval = Evaluator::new(&program);
    let root = program.root_form().unwrap();
    assert_eq!(eval.run_form(root, &[], None), Outcome::Return(Val::Int(12)));
}

#[test]
fn test_property_declaration() {
    let program = compile_script(vec![property(
        "size",
        Some(vec![return_(Some(int(1)))]),
        Some(("v", vec![expr_stmt(id("v"))])),
    )]);
    let names: Vec<&str> = program.forms().map(|f| program.form(f).name()).collect();
    assert!(names.iter().any(|n| n.starts_with("getter size")));
    assert!(names.iter().any(|n| n.starts_with("setter size")));
    let codes = opcodes_of(&program, "toplevel");
    assert!(codes.contains(&OpCode::DefineProperty));
    assert!(codes.contains(&OpCode::DSetAttrib));
}

#[test]
fn test_class_gets_default_constructor() {
    let program = compile_script(vec![class(Some("Point"), None, vec![])]);
    let roots = program.roots();
    assert_eq!(roots.len(), 2);
    let body = roots[1];
    assert!(program.form(body).name().starts_with("class Point"));
    let names: Vec<&str> = program.forms().map(|f| program.form(f).name()).collect();
    assert!(names.iter().any(|n| n.starts_with("function initialize")));

    let codes = opcodes_of(&program, "toplevel");
    assert!(codes.contains(&OpCode::DefineClass));
}

#[test]
fn test_declared_constructor_is_kept() {
    let program = compile_script(vec![class(
        Some("Point"),
        None,
        vec![func(Some("initialize"), vec![param("x", None)], vec![])],
    )]);
    let constructors = program
        .forms()
        .filter(|f| program.form(*f).name().starts_with("function initialize"))
        .count();
    assert_eq!(constructors, 1);
}

#[test]
fn test_super_inside_class_body() {
    let program = compile_script(vec![class(
        Some("Child"),
        Some(id("Base")),
        vec![func(Some("m"), vec![], vec![return_(Some(super_()))])],
    )]);
    assert!(program.verify().is_ok());
}

#[test]
fn test_collapsed_arguments_are_forwarded() {
    // function f(*) { g(*); }
    let program = compile_script(vec![func(
        Some("f"),
        vec![rest_param("")],
        vec![expr_stmt(call_with(id("g"), vec![expand_arg(None)], false, vec![]))],
    )]);
    let call = program
        .forms()
        .flat_map(|f| program.form(f).blocks().to_vec())
        .flat_map(|b| program.block(b).statements().to_vec())
        .map(|s| program.statement(s))
        .find(|s| s.code() == OpCode::FuncCall)
        .expect("no call");
    assert_eq!(call.call_flags().map(|f| f.expanded), Some(1));
}
