//! AST to SSA lowering
//!
//! Every node is lowered in two phases. `prepare` evaluates whatever
//! addresses the node (the object and member of a member select, the name a
//! plain identifier resolves to); `read` and `write` then load from or store
//! to that address. Compound assignment and increment/decrement prepare
//! once and both read and write, so the addressing sub-expressions run
//! exactly once.

mod control_flow;
mod decl;
mod expr;
mod stmt;
mod try_catch;

use crate::compiler::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::{FormId, OpCode, VarId};
use risse_ast::{synth, MemberAccess, Node, NodeKind, Span, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrepareMode {
    Read,
    Write,
    ReadWrite,
}

/// What `prepare` found out about a node.
#[derive(Debug, Clone)]
pub(crate) enum Prepared {
    /// Nothing to evaluate ahead; the node does all its work in `read`.
    None,
    /// A variable visible from the current form.
    Local(String),
    Member {
        object: VarId,
        member: VarId,
        indirect: bool,
    },
}

impl Compiler {
    pub(crate) fn generate(&mut self, form: FormId, node: &Node) -> CompileResult<Option<VarId>> {
        let prepared = self.prepare(form, node, PrepareMode::Read)?;
        self.read(form, node, &prepared)
    }

    /// Like [`generate`](Self::generate), with void standing in for nodes
    /// that yield nothing.
    pub(crate) fn generate_value(&mut self, form: FormId, node: &Node) -> CompileResult<VarId> {
        match self.generate(form, node)? {
            Some(value) => Ok(value),
            None => self.program.add_constant(form, node.span, Value::Void),
        }
    }

    pub(crate) fn generate_write(&mut self, form: FormId, node: &Node, value: VarId) -> CompileResult<bool> {
        let prepared = self.prepare(form, node, PrepareMode::Write)?;
        self.write(form, node, &prepared, value)
    }

    pub(crate) fn prepare(&mut self, form: FormId, node: &Node, mode: PrepareMode) -> CompileResult<Prepared> {
        match &node.kind {
            NodeKind::Id(name) => {
                if self.program.ns_is_available(form, name) {
                    Ok(Prepared::Local(name.clone()))
                } else {
                    let fallback = synth::access_on_this(name, node.span);
                    self.prepare(form, &fallback, mode)
                }
            }
            NodeKind::MemberSel(sel) => {
                let object = self.generate_value(form, &sel.object)?;
                let member = self.generate_value(form, &sel.member)?;
                Ok(Prepared::Member {
                    object,
                    member,
                    indirect: sel.access == MemberAccess::Indirect,
                })
            }
            NodeKind::Array(items) if mode != PrepareMode::Read => {
                for (index, item) in items.iter().enumerate() {
                    if item.as_ref().is_some_and(|item| !is_writable(item)) {
                        return Err(CompileError::not_assignable(
                            format!("at array index {}", index),
                            node.span,
                        ));
                    }
                }
                Ok(Prepared::None)
            }
            NodeKind::Dict(pairs) if mode != PrepareMode::Read => {
                for (index, pair) in pairs.iter().enumerate() {
                    if !is_writable(&pair.value) {
                        return Err(CompileError::not_assignable(
                            format!("at value of dictionary element index {}", index),
                            node.span,
                        ));
                    }
                }
                Ok(Prepared::None)
            }
            _ => Ok(Prepared::None),
        }
    }

    pub(crate) fn read(&mut self, form: FormId, node: &Node, prepared: &Prepared) -> CompileResult<Option<VarId>> {
        let span = node.span;
        match prepared {
            Prepared::Local(name) => {
                return match self.program.ns_read(form, span, name)? {
                    Some(value) => Ok(Some(value)),
                    None => Err(CompileError::internal(format!("variable '{}' vanished", name), span)),
                };
            }
            Prepared::Member {
                object,
                member,
                indirect,
            } => {
                let code = if *indirect { OpCode::IGet } else { OpCode::DGet };
                return self
                    .program
                    .add_variable_with_statement(form, span, code, &[*object, *member])
                    .map(Some);
            }
            Prepared::None => {}
        }

        match &node.kind {
            NodeKind::Context(ctx) => self.lower_context(form, span, ctx),
            NodeKind::ExprStmt(expr) => self.lower_expr_stmt(form, expr.as_deref()),
            NodeKind::Factor(factor) => self.lower_factor(form, span, factor).map(Some),
            NodeKind::VarDecl(decl) => self.lower_var_decl(form, decl),
            NodeKind::Unary(unary) => self.lower_unary(form, span, unary).map(Some),
            NodeKind::Binary(binary) => self.lower_binary(form, span, binary).map(Some),
            NodeKind::Trinary(t) => self
                .lower_conditional(form, span, &t.condition, &t.then_branch, Some(&*t.else_branch), "cond")
                .map(Some),
            NodeKind::Array(items) => self.lower_array(form, span, items).map(Some),
            NodeKind::Dict(pairs) => self.lower_dict(form, span, pairs).map(Some),
            NodeKind::RegExp(regexp) => self.lower_regexp(form, span, regexp).map(Some),
            NodeKind::If(i) => self
                .lower_conditional(form, span, &i.condition, &i.then_branch, i.else_branch.as_deref(), "if")
                .map(Some),
            NodeKind::While(w) => self.lower_while(form, span, w).map(Some),
            NodeKind::For(f) => self.lower_for(form, span, f).map(Some),
            NodeKind::Return(value) => self.lower_return(form, span, value.as_deref()),
            NodeKind::Throw(value) => self.lower_throw(form, span, value.as_deref()),
            NodeKind::Break(value) => self.lower_break(form, span, value.as_deref()),
            NodeKind::Continue(value) => self.lower_continue(form, span, value.as_deref()),
            NodeKind::Debugger => {
                self.program.add_statement(form, span, OpCode::Debugger, &[])?;
                Ok(None)
            }
            NodeKind::Label(name) => self.lower_label(form, span, name),
            NodeKind::Goto(name) => self.lower_goto(form, span, name),
            NodeKind::Switch(switch) => self.lower_switch(form, span, switch).map(Some),
            NodeKind::Case(value) => self.lower_case(form, span, value.as_deref()),
            NodeKind::Try(t) => self.lower_try(form, span, t).map(Some),
            NodeKind::Synchronized(sync) => self.lower_synchronized(form, span, sync).map(Some),
            NodeKind::FuncCall(call) => self.lower_call(form, span, call),
            NodeKind::FuncDecl(decl) => self.lower_func_decl(form, span, decl).map(Some),
            NodeKind::PropDecl(decl) => self.lower_prop_decl(form, span, decl).map(Some),
            NodeKind::ClassDecl(decl) => self.lower_class_decl(form, span, decl).map(Some),
            NodeKind::Id(_) | NodeKind::MemberSel(_) => {
                Err(CompileError::internal("identifier read without preparation", span))
            }
        }
    }

    /// Store `value` into the prepared target. False when the node cannot
    /// be assigned to.
    pub(crate) fn write(&mut self, form: FormId, node: &Node, prepared: &Prepared, value: VarId) -> CompileResult<bool> {
        let span = node.span;
        match prepared {
            Prepared::Local(name) => self.program.ns_write(form, span, name, value),
            Prepared::Member {
                object,
                member,
                indirect,
            } => {
                let code = if *indirect { OpCode::ISet } else { OpCode::DSet };
                self.program.add_statement(form, span, code, &[*object, *member, value])?;
                Ok(true)
            }
            Prepared::None => match &node.kind {
                NodeKind::Array(items) => {
                    self.destructure_array(form, span, items, value)?;
                    Ok(true)
                }
                NodeKind::Dict(pairs) => {
                    self.destructure_dict(form, span, pairs, value)?;
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }

    /// Evaluate `node` in a scope of its own.
    pub(crate) fn generate_scoped(&mut self, form: FormId, node: &Node) -> CompileResult<Option<VarId>> {
        self.program.forms[form.index()].namespace.push();
        let value = self.generate(form, node)?;
        self.program.forms[form.index()].namespace.pop();
        Ok(value)
    }

    pub(crate) fn void(&mut self, form: FormId, span: Span) -> CompileResult<VarId> {
        self.program.add_constant(form, span, Value::Void)
    }
}

/// Whether a node can stand on the left of an assignment.
fn is_writable(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Id(_) | NodeKind::MemberSel(_) | NodeKind::Array(_) | NodeKind::Dict(_)
    )
}
