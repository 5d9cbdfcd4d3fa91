//! SSA statements

use super::ids::{BlockId, FormId, StmtId, VarId};
use super::opcode::OpCode;
use risse_ast::{DeclAttribute, Span, Value};

/// Argument layout of a call statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallFlags {
    /// `f(...)`: the caller's own arguments are forwarded.
    pub omitted: bool,
    /// Bit `i` set: positional argument `i` is expanded (`*arg`).
    pub expanded: u32,
    /// Trailing operands that are callback blocks.
    pub block_count: u32,
    /// `new f(...)`
    pub create_new: bool,
}

/// Where [`SsaProgram::insert_statement`](super::SsaProgram) puts a
/// statement inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    Head,
    /// After the leading φ statements.
    AfterPhi,
    /// Before the trailing branch statement, if any.
    BeforeBranch,
    Tail,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub(crate) span: Span,
    pub(crate) code: OpCode,
    pub(crate) block: BlockId,
    pub(crate) declared: Option<VarId>,
    pub(crate) used: Vec<VarId>,
    pub(crate) targets: Vec<Option<BlockId>>,
    pub(crate) removed: bool,
    pub(crate) value: Option<Value>,
    pub(crate) name: Option<String>,
    pub(crate) index: Option<u32>,
    pub(crate) try_id: Option<u32>,
    pub(crate) call: Option<CallFlags>,
    pub(crate) attribute: Option<DeclAttribute>,
    pub(crate) defined_form: Option<FormId>,
}

impl Statement {
    pub(crate) fn new(span: Span, code: OpCode, block: BlockId) -> Self {
        Statement {
            span,
            code,
            block,
            declared: None,
            used: Vec::new(),
            targets: Vec::new(),
            removed: false,
            value: None,
            name: None,
            index: None,
            try_id: None,
            call: None,
            attribute: None,
            defined_form: None,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn code(&self) -> OpCode {
        self.code
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn declared(&self) -> Option<VarId> {
        self.declared
    }

    pub fn used(&self) -> &[VarId] {
        &self.used
    }

    /// Branch targets; `None` for a target not wired yet.
    pub fn targets(&self) -> &[Option<BlockId>] {
        &self.targets
    }

    /// Whether this statement was deleted from its block.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn try_id(&self) -> Option<u32> {
        self.try_id
    }

    pub fn call_flags(&self) -> Option<CallFlags> {
        self.call
    }

    pub fn attribute(&self) -> Option<&DeclAttribute> {
        self.attribute.as_ref()
    }

    /// The nested form a `DefineLazyBlock`/`DefineClass` statement stands for.
    pub fn defined_form(&self) -> Option<FormId> {
        self.defined_form
    }
}
