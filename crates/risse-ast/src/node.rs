//! AST node definitions
//!
//! Every construct of the language is one [`NodeKind`] variant. A [`Node`]
//! owns its children; there are no parent links, consumers walk the tree from
//! the root.

use crate::attribute::DeclAttribute;
use crate::span::Span;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A syntax node with its source position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Context(Context),
    ExprStmt(Option<Box<Node>>),
    Factor(Factor),
    VarDecl(VarDecl),
    MemberSel(MemberSel),
    Id(String),
    Unary(Unary),
    Binary(Binary),
    Trinary(Trinary),
    Array(Vec<Option<Node>>),
    Dict(Vec<DictPair>),
    RegExp(RegExp),
    If(If),
    While(While),
    For(For),
    Return(Option<Box<Node>>),
    Throw(Option<Box<Node>>),
    Break(Option<Box<Node>>),
    Continue(Option<Box<Node>>),
    Debugger,
    Label(String),
    Goto(String),
    Switch(Switch),
    /// `case expr:`; `None` is `default:`.
    Case(Option<Box<Node>>),
    Try(Try),
    Synchronized(Synchronized),
    FuncCall(FuncCall),
    FuncDecl(FuncDecl),
    PropDecl(PropDecl),
    ClassDecl(ClassDecl),
}

// ============================================================================
// Statement lists
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextKind {
    /// The outermost statement list of a script, function or class body.
    TopLevel,
    /// A `{ ... }` block; opens its own variable scope.
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub kind: ContextKind,
    #[serde(default)]
    pub name: String,
    pub body: Vec<Node>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Factor {
    Constant(Value),
    This,
    Super,
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    #[serde(default)]
    pub attribute: DeclAttribute,
    pub pairs: Vec<VarDeclPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclPair {
    pub span: Span,
    pub name: String,
    pub init: Option<Box<Node>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberAccess {
    /// `obj.name`
    Direct,
    /// `obj[expr]`
    Indirect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSel {
    pub object: Box<Node>,
    pub member: Box<Node>,
    pub access: MemberAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    LogNot,
    BitNot,
    Plus,
    Minus,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Delete,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::LogNot => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::PreInc => "++x",
            UnaryOp::PreDec => "--x",
            UnaryOp::PostInc => "x++",
            UnaryOp::PostDec => "x--",
            UnaryOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Comma,
    Assign,
    AssignBitAnd,
    AssignBitOr,
    AssignBitXor,
    AssignSub,
    AssignAdd,
    AssignMod,
    AssignDiv,
    AssignIdiv,
    AssignMul,
    AssignLogOr,
    AssignLogAnd,
    AssignRBitShift,
    AssignLShift,
    AssignRShift,
    Swap,
    LogOr,
    LogAnd,
    BitOr,
    BitXor,
    BitAnd,
    NotEqual,
    Equal,
    DiscNotEqual,
    DiscEqual,
    Lesser,
    Greater,
    LesserOrEqual,
    GreaterOrEqual,
    RBitShift,
    LShift,
    RShift,
    Mod,
    Div,
    Idiv,
    Mul,
    Add,
    Sub,
    IncontextOf,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Comma => ",",
            Assign => "=",
            AssignBitAnd => "&=",
            AssignBitOr => "|=",
            AssignBitXor => "^=",
            AssignSub => "-=",
            AssignAdd => "+=",
            AssignMod => "%=",
            AssignDiv => "/=",
            AssignIdiv => "\\=",
            AssignMul => "*=",
            AssignLogOr => "||=",
            AssignLogAnd => "&&=",
            AssignRBitShift => ">>>=",
            AssignLShift => "<<=",
            AssignRShift => ">>=",
            Swap => "<->",
            LogOr => "||",
            LogAnd => "&&",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            NotEqual => "!=",
            Equal => "==",
            DiscNotEqual => "!==",
            DiscEqual => "===",
            Lesser => "<",
            Greater => ">",
            LesserOrEqual => "<=",
            GreaterOrEqual => ">=",
            RBitShift => ">>>",
            LShift => "<<",
            RShift => ">>",
            Mod => "%",
            Div => "/",
            Idiv => "\\",
            Mul => "*",
            Add => "+",
            Sub => "-",
            IncontextOf => "incontextof",
        }
    }

    /// The plain operator a compound assignment applies, if this is one.
    pub fn compound_base(&self) -> Option<BinaryOp> {
        use BinaryOp::*;
        Some(match self {
            AssignBitAnd => BitAnd,
            AssignBitOr => BitOr,
            AssignBitXor => BitXor,
            AssignSub => Sub,
            AssignAdd => Add,
            AssignMod => Mod,
            AssignDiv => Div,
            AssignIdiv => Idiv,
            AssignMul => Mul,
            AssignLogOr => LogOr,
            AssignLogAnd => LogAnd,
            AssignRBitShift => RBitShift,
            AssignLShift => LShift,
            AssignRShift => RShift,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub op: BinaryOp,
    pub lhs: Box<Node>,
    pub rhs: Box<Node>,
}

/// `cond ? then : else`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trinary {
    pub condition: Box<Node>,
    pub then_branch: Box<Node>,
    pub else_branch: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictPair {
    pub key: Node,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegExp {
    pub pattern: String,
    #[serde(default)]
    pub flags: String,
}

// ============================================================================
// Control flow
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub condition: Box<Node>,
    pub then_branch: Box<Node>,
    pub else_branch: Option<Box<Node>>,
}

/// `while (cond) body`, or `do body while (cond)` when `skip_first_check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct While {
    pub condition: Box<Node>,
    pub body: Box<Node>,
    #[serde(default)]
    pub skip_first_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct For {
    pub init: Option<Box<Node>>,
    pub condition: Option<Box<Node>>,
    pub iterator: Option<Box<Node>>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub object: Box<Node>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Try {
    pub body: Box<Node>,
    #[serde(default)]
    pub catches: Vec<Catch>,
    pub finally: Option<Box<Node>>,
}

/// `catch (name if condition) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    pub span: Span,
    pub name: Option<String>,
    pub condition: Option<Box<Node>>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synchronized {
    pub object: Box<Node>,
    pub body: Box<Node>,
}

// ============================================================================
// Calls and declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncCall {
    pub callee: Box<Node>,
    #[serde(default)]
    pub args: Vec<FuncCallArg>,
    /// `f(...)`: forward the caller's own arguments.
    #[serde(default)]
    pub omit: bool,
    /// `new f()`
    #[serde(default)]
    pub create_new: bool,
    /// Trailing callback blocks; each is a [`NodeKind::FuncDecl`].
    #[serde(default)]
    pub blocks: Vec<Node>,
}

/// One call argument. `value: None` is an omitted argument (`f(a,,b)`), or
/// with `expand` set, the anonymous rest argument (`f(*)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncCallArg {
    pub span: Span,
    pub value: Option<Node>,
    #[serde(default)]
    pub expand: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Option<String>,
    #[serde(default)]
    pub attribute: DeclAttribute,
    #[serde(default)]
    pub args: Vec<FuncDeclArg>,
    pub body: Box<Node>,
}

/// A formal parameter; `collapse` marks the rest parameter (`*name` or a
/// bare `*` when `name` is empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDeclArg {
    pub span: Span,
    pub name: String,
    pub init: Option<Box<Node>>,
    #[serde(default)]
    pub collapse: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDecl {
    pub name: String,
    #[serde(default)]
    pub attribute: DeclAttribute,
    pub getter: Option<Box<Node>>,
    pub setter: Option<PropSetter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSetter {
    pub arg: String,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Option<String>,
    #[serde(default)]
    pub attribute: DeclAttribute,
    pub superclass: Option<Box<Node>>,
    pub body: Box<Node>,
}

// ============================================================================
// Structural accessors
// ============================================================================

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { span, kind }
    }

    /// Replace the span, keeping the node.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Context(_) => "Context",
            NodeKind::ExprStmt(_) => "ExprStmt",
            NodeKind::Factor(_) => "Factor",
            NodeKind::VarDecl(_) => "VarDecl",
            NodeKind::MemberSel(_) => "MemberSel",
            NodeKind::Id(_) => "Id",
            NodeKind::Unary(_) => "Unary",
            NodeKind::Binary(_) => "Binary",
            NodeKind::Trinary(_) => "Trinary",
            NodeKind::Array(_) => "Array",
            NodeKind::Dict(_) => "Dict",
            NodeKind::RegExp(_) => "RegExp",
            NodeKind::If(_) => "If",
            NodeKind::While(_) => "While",
            NodeKind::For(_) => "For",
            NodeKind::Return(_) => "Return",
            NodeKind::Throw(_) => "Throw",
            NodeKind::Break(_) => "Break",
            NodeKind::Continue(_) => "Continue",
            NodeKind::Debugger => "Debugger",
            NodeKind::Label(_) => "Label",
            NodeKind::Goto(_) => "Goto",
            NodeKind::Switch(_) => "Switch",
            NodeKind::Case(_) => "Case",
            NodeKind::Try(_) => "Try",
            NodeKind::Synchronized(_) => "Synchronized",
            NodeKind::FuncCall(_) => "FuncCall",
            NodeKind::FuncDecl(_) => "FuncDecl",
            NodeKind::PropDecl(_) => "PropDecl",
            NodeKind::ClassDecl(_) => "ClassDecl",
        }
    }

    /// Direct children in source order. Absent optional children are skipped.
    pub fn children(&self) -> Vec<&Node> {
        fn opt<'a>(out: &mut Vec<&'a Node>, node: &'a Option<Box<Node>>) {
            if let Some(n) = node {
                out.push(n);
            }
        }

        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Context(c) => out.extend(c.body.iter()),
            NodeKind::ExprStmt(e)
            | NodeKind::Return(e)
            | NodeKind::Throw(e)
            | NodeKind::Break(e)
            | NodeKind::Continue(e)
            | NodeKind::Case(e) => opt(&mut out, e),
            NodeKind::Factor(_)
            | NodeKind::Id(_)
            | NodeKind::RegExp(_)
            | NodeKind::Debugger
            | NodeKind::Label(_)
            | NodeKind::Goto(_) => {}
            NodeKind::VarDecl(d) => {
                for pair in &d.pairs {
                    opt(&mut out, &pair.init);
                }
            }
            NodeKind::MemberSel(m) => {
                out.push(&m.object);
                out.push(&m.member);
            }
            NodeKind::Unary(u) => out.push(&u.operand),
            NodeKind::Binary(b) => {
                out.push(&b.lhs);
                out.push(&b.rhs);
            }
            NodeKind::Trinary(t) => {
                out.push(&t.condition);
                out.push(&t.then_branch);
                out.push(&t.else_branch);
            }
            NodeKind::Array(items) => out.extend(items.iter().flatten()),
            NodeKind::Dict(pairs) => {
                for pair in pairs {
                    out.push(&pair.key);
                    out.push(&pair.value);
                }
            }
            NodeKind::If(i) => {
                out.push(&i.condition);
                out.push(&i.then_branch);
                opt(&mut out, &i.else_branch);
            }
            NodeKind::While(w) => {
                out.push(&w.condition);
                out.push(&w.body);
            }
            NodeKind::For(f) => {
                opt(&mut out, &f.init);
                opt(&mut out, &f.condition);
                opt(&mut out, &f.iterator);
                out.push(&f.body);
            }
            NodeKind::Switch(s) => {
                out.push(&s.object);
                out.push(&s.body);
            }
            NodeKind::Try(t) => {
                out.push(&t.body);
                for catch in &t.catches {
                    opt(&mut out, &catch.condition);
                    out.push(&catch.body);
                }
                opt(&mut out, &t.finally);
            }
            NodeKind::Synchronized(s) => {
                out.push(&s.object);
                out.push(&s.body);
            }
            NodeKind::FuncCall(c) => {
                out.push(&c.callee);
                out.extend(c.args.iter().filter_map(|a| a.value.as_ref()));
                out.extend(c.blocks.iter());
            }
            NodeKind::FuncDecl(f) => {
                for arg in &f.args {
                    opt(&mut out, &arg.init);
                }
                out.push(&f.body);
            }
            NodeKind::PropDecl(p) => {
                opt(&mut out, &p.getter);
                if let Some(setter) = &p.setter {
                    out.push(&setter.body);
                }
            }
            NodeKind::ClassDecl(c) => {
                opt(&mut out, &c.superclass);
                out.push(&c.body);
            }
        }
        out
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index).copied()
    }

    /// The largest end offset in this subtree, as a zero-length span.
    pub fn end_position(&self) -> Span {
        let mut end = self.span.end_point();
        for child in self.children() {
            let child_end = child.end_position();
            if child_end.end > end.end {
                end = child_end;
            }
        }
        end
    }

    /// Name this node binds as a member of `this` when declared, if any.
    pub fn declared_member_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::FuncDecl(f) => f.name.as_deref(),
            NodeKind::PropDecl(p) => Some(&p.name),
            NodeKind::ClassDecl(c) => c.name.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    #[test]
    fn test_children_follow_source_order() {
        let node = if_(id("a"), int(1), Some(int(2)));
        let names: Vec<_> = node.children().iter().map(|n| n.type_name()).collect();
        assert_eq!(names, vec!["Id", "Factor", "Factor"]);
        assert_eq!(node.child_count(), 3);
        assert!(node.child(3).is_none());
    }

    #[test]
    fn test_end_position_reaches_deepest_child() {
        let inner = int(7).at(Span::new(30, 34, 3, 2));
        let outer = expr_stmt(inner).at(Span::new(0, 10, 1, 1));
        assert_eq!(outer.end_position().end, 34);
    }

    #[test]
    fn test_compound_base() {
        assert_eq!(BinaryOp::AssignAdd.compound_base(), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::AssignLogAnd.compound_base(), Some(BinaryOp::LogAnd));
        assert_eq!(BinaryOp::Add.compound_base(), None);
    }
}
