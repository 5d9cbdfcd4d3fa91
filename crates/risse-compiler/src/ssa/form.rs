//! SSA forms
//!
//! A form is one lowering region with its own CFG: a function body, a try
//! or synchronized body, a callback block or a class body. Forms nest; a
//! form that cannot return on its own leaves through `ExitTryException`,
//! which the enclosing form catches with the `CatchBranch` of the call that
//! ran it.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::ids::{BlockId, FormId, FunctionId, StmtId, VarId};
use super::namespace::{LocalNamespace, NamespaceParent};
use super::opcode::OpCode;
use super::statement::{InsertPoint, Statement};
use super::SsaProgram;
use crate::error::{CompileError, CompileResult};
use risse_ast::{Node, Span, Value};

/// Name of the per-form variable holding the last evaluated value.
pub(crate) const LAST_VALUE: &str = "_";

/// Exit label used for `return` leaving a nested form.
pub(crate) const RETURN_LABEL: &str = "@return";

/// Targets of a `CatchBranch` before the per-label ones.
pub(crate) const FIXED_CATCH_TARGETS: u32 = 2;

/// An enclosing `break` or `continue` target.
#[derive(Debug, Clone)]
pub(crate) struct JumpInfo {
    pub(crate) label: String,
    /// Blocks that jump to the label once it is bound.
    pub(crate) pending: Vec<(BlockId, Span)>,
    /// The target is a callback call rather than a loop.
    pub(crate) is_block: bool,
    /// A `break` without a value resets the last evaluated value to void.
    pub(crate) non_value_sets_void: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct SwitchInfo {
    pub(crate) reference: VarId,
    /// The statement whose fall-through edge still has to reach the next
    /// case test.
    pub(crate) last_stmt: StmtId,
    pub(crate) default_block: Option<BlockId>,
}

/// Non-local exits caught by one `CatchBranch`.
#[derive(Debug, Clone, Default)]
pub(crate) struct CatchBranchInfo {
    pub(crate) stmt: Option<StmtId>,
    pub(crate) result: Option<VarId>,
    pub(crate) finally: Option<Node>,
    /// Exit labels; label `i` is target `i + 2` of the statement.
    pub(crate) labels: Vec<String>,
    /// Labels whose target blocks exist already.
    pub(crate) wired: usize,
    /// Enclosing break and continue targets, put back for the finally
    /// copies lowered once the loops are done.
    pub(crate) break_target: Option<(FormId, JumpInfo)>,
    pub(crate) continue_target: Option<(FormId, JumpInfo)>,
}

#[derive(Debug, Clone)]
pub struct SsaForm {
    pub(crate) name: String,
    pub(crate) function: FunctionId,
    pub(crate) parent: Option<FormId>,
    pub(crate) children: Vec<FormId>,
    pub(crate) use_parent_frame: bool,
    pub(crate) can_return: bool,
    pub(crate) is_callback: bool,
    /// Exits leaving this form stop at the parent to run a finally clause.
    pub(crate) has_finally: bool,
    pub(crate) try_id: Option<u32>,
    pub(crate) catch_branches: BTreeMap<u32, CatchBranchInfo>,
    pub(crate) namespace: LocalNamespace,
    pub(crate) entry: BlockId,
    pub(crate) current: BlockId,
    pub(crate) blocks: Vec<BlockId>,
    pub(crate) break_info: Option<JumpInfo>,
    pub(crate) continue_info: Option<JumpInfo>,
    pub(crate) switch_info: Option<SwitchInfo>,
    /// The exception a bare `throw;` rethrows.
    pub(crate) catch_value: Option<VarId>,
}

impl SsaForm {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn parent(&self) -> Option<FormId> {
        self.parent
    }

    pub fn children(&self) -> &[FormId] {
        &self.children
    }

    pub fn uses_parent_frame(&self) -> bool {
        self.use_parent_frame
    }

    pub fn can_return(&self) -> bool {
        self.can_return
    }

    pub fn is_callback(&self) -> bool {
        self.is_callback
    }

    pub fn try_id(&self) -> Option<u32> {
        self.try_id
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn namespace(&self) -> &LocalNamespace {
        &self.namespace
    }
}

impl SsaProgram {
    /// Create a form with its entry block and its last-value variable.
    pub(crate) fn create_form(
        &mut self,
        function: FunctionId,
        parent: Option<FormId>,
        name: String,
        use_parent_frame: bool,
        can_return: bool,
        span: Span,
    ) -> CompileResult<FormId> {
        let id = FormId::new(self.forms.len() as u32);
        let mut namespace = LocalNamespace::new();
        namespace.parent = parent.map(NamespaceParent::Form);
        self.forms.push(SsaForm {
            name,
            function,
            parent,
            children: Vec::new(),
            use_parent_frame,
            can_return,
            is_callback: false,
            has_finally: false,
            try_id: None,
            catch_branches: BTreeMap::new(),
            namespace,
            entry: BlockId::new(0),
            current: BlockId::new(0),
            blocks: Vec::new(),
            break_info: None,
            continue_info: None,
            switch_info: None,
            catch_value: None,
        });
        let entry = self.new_block(id, "entry", span)?;
        let form = &mut self.forms[id.index()];
        form.entry = entry;
        form.current = entry;
        if let Some(parent) = parent {
            self.forms[parent.index()].children.push(id);
        }
        self.functions[function.index()].forms.push(id);

        let void = self.add_constant(id, span, Value::Void)?;
        self.ns_add(id, span, LAST_VALUE, None)?;
        self.ns_write(id, span, LAST_VALUE, void)?;

        debug!(form = %self.forms[id.index()].name, %function, can_return, use_parent_frame, "form created");
        Ok(id)
    }

    /// Close the current block and continue in a fresh one. Names of the new
    /// block resolve through φ statements.
    pub(crate) fn create_new_block(&mut self, form: FormId, base_name: &str, span: Span) -> CompileResult<BlockId> {
        let current = self.forms[form.index()].current;
        let snapshot = self.forms[form.index()].namespace.clone();
        self.blocks[current.index()].snapshot = Some(snapshot);
        self.forms[form.index()].namespace.mark_to_create_phi();
        let block = self.new_block(form, base_name, span)?;
        self.forms[form.index()].current = block;
        Ok(block)
    }

    /// Like [`create_new_block`](Self::create_new_block), but the new block
    /// continues from `namespace` instead of the current one.
    pub(crate) fn create_new_block_with_namespace(
        &mut self,
        form: FormId,
        base_name: &str,
        mut namespace: LocalNamespace,
        span: Span,
    ) -> CompileResult<BlockId> {
        let current = self.forms[form.index()].current;
        if self.blocks[current.index()].snapshot.is_none() {
            let snapshot = self.forms[form.index()].namespace.clone();
            self.blocks[current.index()].snapshot = Some(snapshot);
        }
        namespace.mark_to_create_phi();
        self.forms[form.index()].namespace = namespace;
        let block = self.new_block(form, base_name, span)?;
        self.forms[form.index()].current = block;
        Ok(block)
    }

    pub(crate) fn new_statement(&mut self, span: Span, code: OpCode, block: BlockId) -> StmtId {
        let id = StmtId::new(self.statements.len() as u32);
        let mut stmt = Statement::new(span, code, block);
        stmt.targets = match code {
            OpCode::Jump => vec![None],
            OpCode::Branch | OpCode::CatchBranch => vec![None, None],
            _ => Vec::new(),
        };
        self.statements.push(stmt);
        id
    }

    pub(crate) fn add_used(&mut self, stmt: StmtId, var: VarId) {
        self.statements[stmt.index()].used.push(var);
        self.variables[var.index()].uses.push(stmt);
    }

    pub(crate) fn set_declared(&mut self, stmt: StmtId, var: VarId) {
        self.statements[stmt.index()].declared = Some(var);
        self.variables[var.index()].declared = Some(stmt);
    }

    /// Append a statement to `block`. Opcodes that declare a value get a
    /// fresh temporary.
    pub(crate) fn add_statement_to_block(
        &mut self,
        block: BlockId,
        point: InsertPoint,
        span: Span,
        code: OpCode,
        used: &[VarId],
    ) -> CompileResult<(StmtId, Option<VarId>)> {
        let form = self.blocks[block.index()].form;
        let stmt = self.new_statement(span, code, block);
        for &var in used {
            self.add_used(stmt, var);
        }
        self.insert_statement(block, stmt, point);
        let declared = if code.declares_value() {
            let var = self.new_variable(form, span, None)?;
            self.set_declared(stmt, var);
            Some(var)
        } else {
            None
        };
        Ok((stmt, declared))
    }

    /// Append a statement to the form's current block.
    pub(crate) fn add_statement(
        &mut self,
        form: FormId,
        span: Span,
        code: OpCode,
        used: &[VarId],
    ) -> CompileResult<(StmtId, Option<VarId>)> {
        let current = self.forms[form.index()].current;
        self.add_statement_to_block(current, InsertPoint::Tail, span, code, used)
    }

    pub(crate) fn add_variable_with_statement(
        &mut self,
        form: FormId,
        span: Span,
        code: OpCode,
        used: &[VarId],
    ) -> CompileResult<VarId> {
        let (_, var) = self.add_statement(form, span, code, used)?;
        var.ok_or_else(|| CompileError::internal(format!("{} declares no value", code), span))
    }

    pub(crate) fn add_constant(&mut self, form: FormId, span: Span, value: Value) -> CompileResult<VarId> {
        let (stmt, var) = self.add_statement(form, span, OpCode::AssignConstant, &[])?;
        self.statements[stmt.index()].value = Some(value);
        var.ok_or_else(|| CompileError::internal("AssignConstant declares no value", span))
    }

    /// φ with explicit operands at the head of the current block, one per
    /// predecessor in predecessor order.
    pub(crate) fn add_explicit_phi(&mut self, form: FormId, span: Span, operands: &[VarId]) -> CompileResult<VarId> {
        let current = self.forms[form.index()].current;
        if self.blocks[current.index()].preds.len() != operands.len() {
            return Err(CompileError::internal(
                format!(
                    "phi with {} operands in a block with {} predecessors",
                    operands.len(),
                    self.blocks[current.index()].preds.len()
                ),
                span,
            ));
        }
        let (_, var) = self.add_statement_to_block(current, InsertPoint::AfterPhi, span, OpCode::Phi, operands)?;
        var.ok_or_else(|| CompileError::internal("Phi declares no value", span))
    }

    pub(crate) fn new_jump_info(&mut self, span: Span, is_block: bool, non_value_sets_void: bool) -> CompileResult<JumpInfo> {
        let n = self.unique_number(span)?;
        Ok(JumpInfo {
            label: format!("@break_or_continue_{}", n),
            pending: Vec::new(),
            is_block,
            non_value_sets_void,
        })
    }

    /// Bind `info`'s label to `target` and queue its pending jumps.
    pub(crate) fn bind_jump_info(&mut self, form: FormId, info: JumpInfo, target: BlockId, span: Span) -> CompileResult<()> {
        let function = self.forms[form.index()].function;
        self.add_label_map(function, &info.label, target, span)?;
        for (source, jump_span) in info.pending {
            self.add_pending_label_jump(function, source, &info.label, jump_span);
        }
        Ok(())
    }

    /// Allocate the `CatchBranch` target index for exit `label` leaving
    /// through the child form with `try_id`.
    pub(crate) fn add_exit_try_branch_target_label(&mut self, form: FormId, try_id: u32, label: &str) -> u32 {
        let info = self.forms[form.index()].catch_branches.entry(try_id).or_default();
        match info.labels.iter().position(|l| l == label) {
            Some(index) => index as u32,
            None => {
                info.labels.push(label.to_string());
                (info.labels.len() - 1) as u32
            }
        }
    }

    /// The nearest enclosing form that can return.
    pub(crate) fn return_target(&self, form: FormId) -> Option<FormId> {
        let mut current = Some(form);
        while let Some(f) = current {
            if self.forms[f.index()].can_return {
                return Some(f);
            }
            current = self.forms[f.index()].parent;
        }
        None
    }

    /// The form that catches an exit from `from` towards the enclosing form
    /// `target`, and the try id the exit raises. The exit stops early at a
    /// form whose child on the way has a finally clause.
    pub(crate) fn exit_route(&self, from: FormId, target: FormId, span: Span) -> CompileResult<(FormId, u32)> {
        let mut child = from;
        loop {
            let form = &self.forms[child.index()];
            let parent = match form.parent {
                Some(parent) if !form.can_return => parent,
                _ => return Err(CompileError::JumpIntoDeeperBlock { span }),
            };
            if parent == target || form.has_finally {
                let try_id = form
                    .try_id
                    .ok_or_else(|| CompileError::internal(format!("form '{}' has no try id", form.name), span))?;
                return Ok((parent, try_id));
            }
            child = parent;
        }
    }

    /// Append `ExitTryException(value)` to `block`, leaving towards `target`
    /// under `label`.
    pub(crate) fn add_exit_try(
        &mut self,
        block: BlockId,
        span: Span,
        value: VarId,
        target: FormId,
        label: &str,
    ) -> CompileResult<()> {
        let from = self.blocks[block.index()].form;
        let (catcher, try_id) = self.exit_route(from, target, span)?;
        let index = self.add_exit_try_branch_target_label(catcher, try_id, label) + FIXED_CATCH_TARGETS;
        let (stmt, _) = self.add_statement_to_block(block, InsertPoint::Tail, span, OpCode::ExitTryException, &[value])?;
        let stmt = &mut self.statements[stmt.index()];
        stmt.try_id = Some(try_id);
        stmt.index = Some(index);
        trace!(label, try_id, index, "non-local exit");
        Ok(())
    }

    pub(crate) fn add_return_statement(&mut self, form: FormId, span: Span, value: VarId) -> CompileResult<()> {
        if self.forms[form.index()].can_return {
            self.add_statement(form, span, OpCode::Return, &[value])?;
            self.create_new_block(form, "disconnected_by_return", span)?;
            return Ok(());
        }
        let target = self
            .return_target(form)
            .ok_or_else(|| CompileError::internal("no enclosing form can return", span))?;
        let current = self.forms[form.index()].current;
        self.add_exit_try(current, span, value, target, RETURN_LABEL)?;
        self.create_new_block(form, "disconnected_by_return_by_exception", span)?;
        Ok(())
    }

    /// The nearest form holding a break (or continue) target, not crossing
    /// a form that can return.
    fn find_jump_target(&self, form: FormId, continue_: bool) -> Option<FormId> {
        let mut current = form;
        loop {
            let f = &self.forms[current.index()];
            let info = if continue_ { &f.continue_info } else { &f.break_info };
            if info.is_some() {
                return Some(current);
            }
            if f.can_return {
                return None;
            }
            current = f.parent?;
        }
    }

    /// The break (or continue) target enclosing `form`, without its
    /// pending jumps.
    pub(crate) fn enclosing_jump_info(&self, form: FormId, continue_: bool) -> Option<(FormId, JumpInfo)> {
        let target = self.find_jump_target(form, continue_)?;
        let f = &self.forms[target.index()];
        let info = if continue_ { f.continue_info.as_ref() } else { f.break_info.as_ref() }?;
        Some((
            target,
            JumpInfo {
                pending: Vec::new(),
                ..info.clone()
            },
        ))
    }

    pub(crate) fn jump_info_mut(&mut self, form: FormId, continue_: bool) -> &mut Option<JumpInfo> {
        let f = &mut self.forms[form.index()];
        if continue_ {
            &mut f.continue_info
        } else {
            &mut f.break_info
        }
    }

    pub(crate) fn add_break_statement(&mut self, form: FormId, span: Span, value: Option<VarId>) -> CompileResult<()> {
        let Some(target) = self.find_jump_target(form, false) else {
            return Err(CompileError::MisplacedJump { keyword: "break", span });
        };
        let (label, sets_void) = match &self.forms[target.index()].break_info {
            Some(info) => (info.label.clone(), info.non_value_sets_void),
            None => return Err(CompileError::internal("break target vanished", span)),
        };

        let value = match value {
            Some(value) => Some(value),
            None if sets_void => Some(self.add_constant(form, span, Value::Void)?),
            None => None,
        };

        if target == form {
            if let Some(value) = value {
                self.ns_write(form, span, LAST_VALUE, value)?;
            }
            let current = self.forms[form.index()].current;
            if let Some(info) = self.forms[form.index()].break_info.as_mut() {
                info.pending.push((current, span));
            }
            self.create_new_block(form, "disconnected_by_break", span)?;
            return Ok(());
        }

        let value = match value {
            Some(value) => value,
            None => self.read_last_value(form, span)?,
        };
        let current = self.forms[form.index()].current;
        self.add_exit_try(current, span, value, target, &label)?;
        self.create_new_block(form, "disconnected_by_break_by_exception", span)?;
        Ok(())
    }

    pub(crate) fn add_continue_statement(&mut self, form: FormId, span: Span, value: Option<VarId>) -> CompileResult<()> {
        let Some(target) = self.find_jump_target(form, true) else {
            return Err(CompileError::MisplacedJump {
                keyword: "continue",
                span,
            });
        };
        let (label, is_block) = match &self.forms[target.index()].continue_info {
            Some(info) => (info.label.clone(), info.is_block),
            None => return Err(CompileError::internal("continue target vanished", span)),
        };
        if value.is_some() && !is_block {
            return Err(CompileError::JumpWithValue {
                keyword: "continue",
                span,
            });
        }

        if target == form {
            if is_block {
                // leaves the callback with its value
                let value = match value {
                    Some(value) => value,
                    None => self.add_constant(form, span, Value::Void)?,
                };
                self.add_statement(form, span, OpCode::Return, &[value])?;
            } else {
                let current = self.forms[form.index()].current;
                if let Some(info) = self.forms[form.index()].continue_info.as_mut() {
                    info.pending.push((current, span));
                }
            }
            self.create_new_block(form, "disconnected_by_continue", span)?;
            return Ok(());
        }

        let value = match value {
            Some(value) => value,
            None => self.add_constant(form, span, Value::Void)?,
        };
        let current = self.forms[form.index()].current;
        self.add_exit_try(current, span, value, target, &label)?;
        self.create_new_block(form, "disconnected_by_continue_by_exception", span)?;
        Ok(())
    }

    pub(crate) fn read_last_value(&mut self, form: FormId, span: Span) -> CompileResult<VarId> {
        self.ns_read(form, span, LAST_VALUE)?
            .ok_or_else(|| CompileError::internal("last evaluated value is not declared", span))
    }

    pub(crate) fn write_last_value(&mut self, form: FormId, span: Span, value: VarId) -> CompileResult<()> {
        if self.ns_write(form, span, LAST_VALUE, value)? {
            Ok(())
        } else {
            Err(CompileError::internal("last evaluated value is not declared", span))
        }
    }

    /// Create a lazy block nested in `form` and emit its `DefineLazyBlock`.
    ///
    /// A real function gets its own frame and shares captured variables;
    /// otherwise the block runs in the parent's frame through `access_map`.
    pub(crate) fn create_lazy_block(
        &mut self,
        form: FormId,
        span: Span,
        base_name: &str,
        is_real_function: bool,
        access_map: Option<super::ids::AccessMapId>,
    ) -> CompileResult<(FormId, VarId)> {
        let n = self.unique_number(span)?;
        let name = format!("{} {}", base_name, n);
        let parent_function = self.forms[form.index()].function;
        let function = if is_real_function {
            let group = self.functions[parent_function.index()].group;
            self.new_function(group, Some(parent_function))
        } else {
            parent_function
        };

        let child = self.create_form(function, Some(form), name.clone(), !is_real_function, is_real_function, span)?;
        self.forms[child.index()].namespace.access_map = access_map;

        let mut used = Vec::new();
        if let Some(map) = access_map {
            used.push(self.access_maps[map.index()].variable);
        }
        let (stmt, var) = self.add_statement(form, span, OpCode::DefineLazyBlock, &used)?;
        let stmt = &mut self.statements[stmt.index()];
        stmt.name = Some(name);
        stmt.defined_form = Some(child);
        let var = var.ok_or_else(|| CompileError::internal("DefineLazyBlock declares no value", span))?;
        Ok((child, var))
    }

    /// A form's body ended with `value`; leave it.
    pub(crate) fn add_final_return(&mut self, form: FormId, span: Span, value: Option<VarId>) -> CompileResult<()> {
        let value = match value {
            Some(value) => value,
            None => self.add_constant(form, span, Value::Void)?,
        };
        self.add_statement(form, span, OpCode::Return, &[value])?;
        Ok(())
    }
}
