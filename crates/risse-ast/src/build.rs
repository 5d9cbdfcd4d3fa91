//! Node constructors.
//!
//! Every constructor produces a node with the synthetic (all-zero) span; use
//! [`Node::at`] to attach a real position.

use crate::attribute::DeclAttribute;
use crate::node::*;
use crate::span::Span;
use crate::value::Value;

fn node(kind: NodeKind) -> Node {
    Node::new(kind, Span::default())
}

fn boxed(n: Node) -> Box<Node> {
    Box::new(n)
}

// Factors

pub fn constant(value: Value) -> Node {
    node(NodeKind::Factor(Factor::Constant(value)))
}

pub fn int(v: i64) -> Node {
    constant(Value::Integer(v))
}

pub fn real(v: f64) -> Node {
    constant(Value::Real(v))
}

pub fn string(v: &str) -> Node {
    constant(Value::String(v.to_string()))
}

pub fn boolean(v: bool) -> Node {
    constant(Value::Boolean(v))
}

pub fn void() -> Node {
    constant(Value::Void)
}

pub fn null() -> Node {
    constant(Value::Null)
}

pub fn this() -> Node {
    node(NodeKind::Factor(Factor::This))
}

pub fn super_() -> Node {
    node(NodeKind::Factor(Factor::Super))
}

pub fn global() -> Node {
    node(NodeKind::Factor(Factor::Global))
}

pub fn id(name: &str) -> Node {
    node(NodeKind::Id(name.to_string()))
}

// Expressions

/// `object.name`
pub fn member(object: Node, name: &str) -> Node {
    node(NodeKind::MemberSel(MemberSel {
        object: boxed(object),
        member: boxed(string(name)),
        access: MemberAccess::Direct,
    }))
}

/// `object[key]`
pub fn index(object: Node, key: Node) -> Node {
    node(NodeKind::MemberSel(MemberSel {
        object: boxed(object),
        member: boxed(key),
        access: MemberAccess::Indirect,
    }))
}

pub fn unary(op: UnaryOp, operand: Node) -> Node {
    node(NodeKind::Unary(Unary {
        op,
        operand: boxed(operand),
    }))
}

pub fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    node(NodeKind::Binary(Binary {
        op,
        lhs: boxed(lhs),
        rhs: boxed(rhs),
    }))
}

pub fn assign(target: Node, value: Node) -> Node {
    binary(BinaryOp::Assign, target, value)
}

pub fn trinary(condition: Node, then_branch: Node, else_branch: Node) -> Node {
    node(NodeKind::Trinary(Trinary {
        condition: boxed(condition),
        then_branch: boxed(then_branch),
        else_branch: boxed(else_branch),
    }))
}

pub fn array(items: Vec<Option<Node>>) -> Node {
    node(NodeKind::Array(items))
}

pub fn dict(pairs: Vec<(Node, Node)>) -> Node {
    node(NodeKind::Dict(
        pairs
            .into_iter()
            .map(|(key, value)| DictPair { key, value })
            .collect(),
    ))
}

pub fn regexp(pattern: &str, flags: &str) -> Node {
    node(NodeKind::RegExp(RegExp {
        pattern: pattern.to_string(),
        flags: flags.to_string(),
    }))
}

/// `callee(args...)` with plain positional arguments.
pub fn call(callee: Node, args: Vec<Node>) -> Node {
    node(NodeKind::FuncCall(FuncCall {
        callee: boxed(callee),
        args: args.into_iter().map(arg).collect(),
        omit: false,
        create_new: false,
        blocks: Vec::new(),
    }))
}

/// A call from explicit parts.
pub fn call_with(callee: Node, args: Vec<FuncCallArg>, omit: bool, blocks: Vec<Node>) -> Node {
    node(NodeKind::FuncCall(FuncCall {
        callee: boxed(callee),
        args,
        omit,
        create_new: false,
        blocks,
    }))
}

/// `new callee(args...)`
pub fn new_(callee: Node, args: Vec<Node>) -> Node {
    let mut n = call(callee, args);
    if let NodeKind::FuncCall(c) = &mut n.kind {
        c.create_new = true;
    }
    n
}

pub fn arg(value: Node) -> FuncCallArg {
    FuncCallArg {
        span: value.span,
        value: Some(value),
        expand: false,
    }
}

/// An omitted argument (`f(a,,b)`).
pub fn omitted_arg() -> FuncCallArg {
    FuncCallArg {
        span: Span::default(),
        value: None,
        expand: false,
    }
}

/// `*value`, or the anonymous rest argument `*` for `None`.
pub fn expand_arg(value: Option<Node>) -> FuncCallArg {
    FuncCallArg {
        span: value.as_ref().map(|v| v.span).unwrap_or_default(),
        value,
        expand: true,
    }
}

// Statements

pub fn top_level(body: Vec<Node>) -> Node {
    node(NodeKind::Context(Context {
        kind: ContextKind::TopLevel,
        name: String::new(),
        body,
    }))
}

pub fn block(body: Vec<Node>) -> Node {
    node(NodeKind::Context(Context {
        kind: ContextKind::Block,
        name: String::new(),
        body,
    }))
}

pub fn expr_stmt(expr: Node) -> Node {
    let span = expr.span;
    Node::new(NodeKind::ExprStmt(Some(boxed(expr))), span)
}

pub fn empty_stmt() -> Node {
    node(NodeKind::ExprStmt(None))
}

/// `var name = init;`
pub fn var(name: &str, init: Option<Node>) -> Node {
    var_with(DeclAttribute::default(), vec![(name, init)])
}

pub fn var_with(attribute: DeclAttribute, pairs: Vec<(&str, Option<Node>)>) -> Node {
    node(NodeKind::VarDecl(VarDecl {
        attribute,
        pairs: pairs
            .into_iter()
            .map(|(name, init)| VarDeclPair {
                span: init.as_ref().map(|i| i.span).unwrap_or_default(),
                name: name.to_string(),
                init: init.map(boxed),
            })
            .collect(),
    }))
}

pub fn if_(condition: Node, then_branch: Node, else_branch: Option<Node>) -> Node {
    node(NodeKind::If(If {
        condition: boxed(condition),
        then_branch: boxed(then_branch),
        else_branch: else_branch.map(boxed),
    }))
}

pub fn while_(condition: Node, body: Node) -> Node {
    node(NodeKind::While(While {
        condition: boxed(condition),
        body: boxed(body),
        skip_first_check: false,
    }))
}

pub fn do_while(body: Node, condition: Node) -> Node {
    node(NodeKind::While(While {
        condition: boxed(condition),
        body: boxed(body),
        skip_first_check: true,
    }))
}

pub fn for_(init: Option<Node>, condition: Option<Node>, iterator: Option<Node>, body: Node) -> Node {
    node(NodeKind::For(For {
        init: init.map(boxed),
        condition: condition.map(boxed),
        iterator: iterator.map(boxed),
        body: boxed(body),
    }))
}

pub fn return_(value: Option<Node>) -> Node {
    node(NodeKind::Return(value.map(boxed)))
}

pub fn throw_(value: Option<Node>) -> Node {
    node(NodeKind::Throw(value.map(boxed)))
}

pub fn break_(value: Option<Node>) -> Node {
    node(NodeKind::Break(value.map(boxed)))
}

pub fn continue_(value: Option<Node>) -> Node {
    node(NodeKind::Continue(value.map(boxed)))
}

pub fn debugger() -> Node {
    node(NodeKind::Debugger)
}

pub fn label(name: &str) -> Node {
    node(NodeKind::Label(name.to_string()))
}

pub fn goto(name: &str) -> Node {
    node(NodeKind::Goto(name.to_string()))
}

pub fn switch(object: Node, body: Vec<Node>) -> Node {
    node(NodeKind::Switch(Switch {
        object: boxed(object),
        body: boxed(block(body)),
    }))
}

pub fn case(value: Node) -> Node {
    node(NodeKind::Case(Some(boxed(value))))
}

pub fn default_case() -> Node {
    node(NodeKind::Case(None))
}

pub fn try_(body: Node, catches: Vec<Catch>, finally: Option<Node>) -> Node {
    node(NodeKind::Try(Try {
        body: boxed(body),
        catches,
        finally: finally.map(boxed),
    }))
}

pub fn catch(name: Option<&str>, condition: Option<Node>, body: Node) -> Catch {
    Catch {
        span: body.span,
        name: name.map(str::to_string),
        condition: condition.map(boxed),
        body: boxed(body),
    }
}

pub fn synchronized(object: Node, body: Node) -> Node {
    node(NodeKind::Synchronized(Synchronized {
        object: boxed(object),
        body: boxed(body),
    }))
}

// Declarations

pub fn param(name: &str, init: Option<Node>) -> FuncDeclArg {
    FuncDeclArg {
        span: Span::default(),
        name: name.to_string(),
        init: init.map(boxed),
        collapse: false,
    }
}

/// `*name`, or the anonymous rest parameter `*` for an empty name.
pub fn rest_param(name: &str) -> FuncDeclArg {
    FuncDeclArg {
        span: Span::default(),
        name: name.to_string(),
        init: None,
        collapse: true,
    }
}

pub fn func(name: Option<&str>, args: Vec<FuncDeclArg>, body: Vec<Node>) -> Node {
    node(NodeKind::FuncDecl(FuncDecl {
        name: name.map(str::to_string),
        attribute: DeclAttribute::default(),
        args,
        body: boxed(top_level(body)),
    }))
}

pub fn property(name: &str, getter: Option<Vec<Node>>, setter: Option<(&str, Vec<Node>)>) -> Node {
    node(NodeKind::PropDecl(PropDecl {
        name: name.to_string(),
        attribute: DeclAttribute::default(),
        getter: getter.map(|body| boxed(top_level(body))),
        setter: setter.map(|(arg, body)| PropSetter {
            arg: arg.to_string(),
            body: boxed(top_level(body)),
        }),
    }))
}

pub fn class(name: Option<&str>, superclass: Option<Node>, body: Vec<Node>) -> Node {
    node(NodeKind::ClassDecl(ClassDecl {
        name: name.map(str::to_string),
        attribute: DeclAttribute::default(),
        superclass: superclass.map(boxed),
        body: boxed(top_level(body)),
    }))
}
