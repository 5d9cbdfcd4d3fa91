//! Risse abstract syntax tree
//!
//! The closed set of syntax nodes handed to the SSA lowering stage. Nodes are
//! produced by an external parser (or deserialized from JSON) and are only
//! read afterwards; the few synthetic fragments the compiler needs are built
//! through [`synth`].

pub mod attribute;
pub mod build;
pub mod dump;
pub mod node;
pub mod span;
pub mod synth;
pub mod value;

pub use attribute::{Access, DeclAttribute, Mutability};
pub use node::*;
pub use span::Span;
pub use value::Value;

/// Parse an AST from its JSON form.
pub fn from_json(text: &str) -> Result<Node, serde_json::Error> {
    serde_json::from_str(text)
}

/// Serialize an AST to pretty-printed JSON.
pub fn to_json(node: &Node) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node)
}
