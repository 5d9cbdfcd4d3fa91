//! Indented textual dump of a syntax tree.

use crate::node::*;
use std::fmt::Write;

/// Render `node` and its subtree, one node per line.
pub fn dump(node: &Node) -> String {
    let mut output = String::new();
    dump_node(&mut output, node, 0);
    output
}

fn dump_node(output: &mut String, node: &Node, depth: usize) {
    let prefix = "  ".repeat(depth);
    let detail = detail(node);
    if detail.is_empty() {
        writeln!(output, "{}{} @{}", prefix, node.type_name(), node.span).unwrap();
    } else {
        writeln!(output, "{}{} {} @{}", prefix, node.type_name(), detail, node.span).unwrap();
    }
    for child in node.children() {
        dump_node(output, child, depth + 1);
    }
}

fn detail(node: &Node) -> String {
    match &node.kind {
        NodeKind::Context(c) => format!("{:?}", c.kind),
        NodeKind::Factor(Factor::Constant(v)) => v.to_string(),
        NodeKind::Factor(f) => format!("{:?}", f),
        NodeKind::VarDecl(d) => {
            let names: Vec<_> = d.pairs.iter().map(|p| p.name.as_str()).collect();
            let attr = d.attribute.to_string();
            if attr.is_empty() {
                names.join(", ")
            } else {
                format!("{} {}", attr, names.join(", "))
            }
        }
        NodeKind::MemberSel(m) => format!("{:?}", m.access),
        NodeKind::Id(name) | NodeKind::Label(name) | NodeKind::Goto(name) => name.clone(),
        NodeKind::Unary(u) => u.op.as_str().to_string(),
        NodeKind::Binary(b) => b.op.as_str().to_string(),
        NodeKind::RegExp(r) => format!("/{}/{}", r.pattern, r.flags),
        NodeKind::While(w) if w.skip_first_check => "do".to_string(),
        NodeKind::Case(None) => "default".to_string(),
        NodeKind::Try(t) => {
            let catches: Vec<_> = t
                .catches
                .iter()
                .map(|c| c.name.clone().unwrap_or_else(|| "_".to_string()))
                .collect();
            format!("catch({}){}", catches.join(", "), if t.finally.is_some() { " finally" } else { "" })
        }
        NodeKind::FuncCall(c) => {
            let mut flags = Vec::new();
            if c.create_new {
                flags.push("new".to_string());
            }
            if c.omit {
                flags.push("...".to_string());
            }
            flags.push(format!("args={}", c.args.len()));
            if !c.blocks.is_empty() {
                flags.push(format!("blocks={}", c.blocks.len()));
            }
            flags.join(" ")
        }
        NodeKind::FuncDecl(f) => {
            let args: Vec<_> = f
                .args
                .iter()
                .map(|a| if a.collapse { format!("*{}", a.name) } else { a.name.clone() })
                .collect();
            format!("{}({})", f.name.as_deref().unwrap_or("anonymous"), args.join(", "))
        }
        NodeKind::PropDecl(p) => p.name.clone(),
        NodeKind::ClassDecl(c) => c.name.clone().unwrap_or_else(|| "anonymous".to_string()),
        _ => String::new(),
    }
}
