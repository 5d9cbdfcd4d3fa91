//! Fragments the compiler fabricates itself.

use crate::build;
use crate::node::{FuncCallArg, MemberAccess, MemberSel, Node, NodeKind};
use crate::span::Span;

/// Name of the constructor method looked up on class bodies.
pub const CONSTRUCTOR_NAME: &str = "initialize";

/// `this.name`, the fallback for an identifier that is not a local variable.
pub fn access_on_this(name: &str, span: Span) -> Node {
    let sel = MemberSel {
        object: Box::new(build::this().at(span)),
        member: Box::new(build::string(name).at(span)),
        access: MemberAccess::Direct,
    };
    Node::new(NodeKind::MemberSel(sel), span)
}

/// `global.Object`, the superclass of a class declared without one.
pub fn default_superclass(span: Span) -> Node {
    build::member(build::global().at(span), "Object").at(span)
}

/// `function initialize() { super.initialize(...); }`
pub fn default_constructor(span: Span) -> Node {
    let target = build::member(build::super_().at(span), CONSTRUCTOR_NAME).at(span);
    let forward = build::call_with(target, Vec::<FuncCallArg>::new(), true, Vec::new()).at(span);
    build::func(
        Some(CONSTRUCTOR_NAME),
        Vec::new(),
        vec![build::expr_stmt(forward)],
    )
    .at(span)
}

/// True when a class body already declares a constructor at its top level.
pub fn declares_constructor(body: &Node) -> bool {
    match &body.kind {
        NodeKind::Context(ctx) => ctx
            .body
            .iter()
            .any(|n| n.declared_member_name() == Some(CONSTRUCTOR_NAME)),
        _ => false,
    }
}
