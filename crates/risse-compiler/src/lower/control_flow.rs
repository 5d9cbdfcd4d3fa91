//! Branches, short-circuit operators, loops and switch

use std::mem;

use crate::compiler::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::form::{JumpInfo, SwitchInfo};
use crate::ssa::{BlockId, FormId, OpCode, StmtId, VarId};
use risse_ast::{BinaryOp, For, Node, Span, Switch, Value, While};

impl Compiler {
    /// `if`/`?:`. Both arms meet in an exit block whose φ is the value of
    /// the construct; a missing else arm yields void.
    pub(crate) fn lower_conditional(
        &mut self,
        form: FormId,
        span: Span,
        condition: &Node,
        then_branch: &Node,
        else_branch: Option<&Node>,
        base: &str,
    ) -> CompileResult<VarId> {
        let cond = self.generate_value(form, condition)?;
        let (branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[cond])?;
        let branch_block = self.current_block(form);

        let true_block = self.program.create_new_block(form, &format!("{}_true", base), span)?;
        self.program.set_target(branch, 0, true_block, span)?;
        let true_value = match self.generate_scoped(form, then_branch)? {
            Some(value) => value,
            None => self.void(form, span)?,
        };
        let (true_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;

        let namespace = self.program.block_namespace(branch_block).clone();
        let false_block = self
            .program
            .create_new_block_with_namespace(form, &format!("{}_false", base), namespace, span)?;
        self.program.set_target(branch, 1, false_block, span)?;
        let false_value = match else_branch {
            Some(node) => match self.generate_scoped(form, node)? {
                Some(value) => value,
                None => self.void(form, span)?,
            },
            None => self.void(form, span)?,
        };
        let (false_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;

        let exit = self.program.create_new_block(form, &format!("{}_exit", base), span)?;
        self.program.set_target(true_jump, 0, exit, span)?;
        self.program.set_target(false_jump, 0, exit, span)?;
        self.program.add_explicit_phi(form, span, &[true_value, false_value])
    }

    pub(crate) fn lower_short_circuit(
        &mut self,
        form: FormId,
        span: Span,
        op: BinaryOp,
        lhs: &Node,
        rhs: &Node,
    ) -> CompileResult<VarId> {
        let left = self.generate_value(form, lhs)?;
        self.lower_short_circuit_from(form, span, op, left, rhs)
    }

    /// `&&`/`||` with the left operand already evaluated. Three paths reach
    /// the exit: the short-circuit one, and the right operand being true or
    /// false. Each carries a boolean constant into the φ.
    pub(crate) fn lower_short_circuit_from(
        &mut self,
        form: FormId,
        span: Span,
        op: BinaryOp,
        left: VarId,
        rhs: &Node,
    ) -> CompileResult<VarId> {
        let (base, short_value) = match op {
            BinaryOp::LogAnd => ("logand", false),
            BinaryOp::LogOr => ("logor", true),
            _ => {
                return Err(CompileError::internal(
                    format!("'{}' is not a short-circuit operator", op.as_str()),
                    span,
                ))
            }
        };
        // slot of the first branch that evaluates the right operand
        let rhs_slot = if short_value { 1 } else { 0 };

        let (left_branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[left])?;
        let left_block = self.current_block(form);
        let rhs_block = self.program.create_new_block(form, &format!("{}_rhs", base), span)?;
        self.program.set_target(left_branch, rhs_slot, rhs_block, span)?;
        let right = self.generate_value(form, rhs)?;
        let (right_branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[right])?;
        let right_block = self.current_block(form);

        let mut jumps = Vec::with_capacity(3);
        let mut values = Vec::with_capacity(3);

        let namespace = self.program.block_namespace(left_block).clone();
        let block = self
            .program
            .create_new_block_with_namespace(form, &format!("{}_short", base), namespace, span)?;
        self.program.set_target(left_branch, 1 - rhs_slot, block, span)?;
        values.push(self.program.add_constant(form, span, Value::Boolean(short_value))?);
        jumps.push(self.program.add_statement(form, span, OpCode::Jump, &[])?.0);

        for (slot, result) in [(0usize, true), (1usize, false)] {
            let namespace = self.program.block_namespace(right_block).clone();
            let block = self
                .program
                .create_new_block_with_namespace(form, &format!("{}_{}", base, result), namespace, span)?;
            self.program.set_target(right_branch, slot, block, span)?;
            values.push(self.program.add_constant(form, span, Value::Boolean(result))?);
            jumps.push(self.program.add_statement(form, span, OpCode::Jump, &[])?.0);
        }

        let exit = self.program.create_new_block(form, &format!("{}_exit", base), span)?;
        for jump in jumps {
            self.program.set_target(jump, 0, exit, span)?;
        }
        self.program.add_explicit_phi(form, span, &values)
    }

    /// `while` and `do ... while`. The loop yields the last evaluated value,
    /// which is reset to void before every condition check.
    pub(crate) fn lower_while(&mut self, form: FormId, span: Span, w: &While) -> CompileResult<VarId> {
        let (saved_break, saved_continue) = self.enter_loop(form, span)?;

        let (entry_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        let cond_block = self.program.create_new_block(form, "while_cond", span)?;
        self.reset_last_value(form, span)?;
        let cond = self.generate_value(form, &w.condition)?;
        let (branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[cond])?;
        let cond_end = self.current_block(form);

        let body_block = self.program.create_new_block(form, "while_body", span)?;
        self.program.set_target(branch, 0, body_block, span)?;
        let entry_target = if w.skip_first_check { body_block } else { cond_block };
        self.program.set_target(entry_jump, 0, entry_target, span)?;
        self.generate_scoped(form, &w.body)?;
        let (back, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        self.program.set_target(back, 0, cond_block, span)?;

        let namespace = self.program.block_namespace(cond_end).clone();
        let exit = self
            .program
            .create_new_block_with_namespace(form, "while_exit", namespace, span)?;
        self.program.set_target(branch, 1, exit, span)?;

        self.leave_loop(form, span, (saved_break, saved_continue), exit, cond_block)?;
        self.program.read_last_value(form, span)
    }

    /// `for`. The initializer lives in a scope of its own; `continue` runs
    /// the iterator before the next condition check.
    pub(crate) fn lower_for(&mut self, form: FormId, span: Span, f: &For) -> CompileResult<VarId> {
        self.program.forms[form.index()].namespace.push();
        if let Some(init) = &f.init {
            self.generate(form, init)?;
        }
        let saved = self.enter_loop(form, span)?;

        let (entry_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        let cond_block = self.program.create_new_block(form, "for_cond", span)?;
        self.program.set_target(entry_jump, 0, cond_block, span)?;
        self.reset_last_value(form, span)?;
        let (cond_stmt, _) = match &f.condition {
            Some(condition) => {
                let cond = self.generate_value(form, condition)?;
                self.program.add_statement(form, span, OpCode::Branch, &[cond])?
            }
            None => self.program.add_statement(form, span, OpCode::Jump, &[])?,
        };
        let cond_end = self.current_block(form);

        let body_block = self.program.create_new_block(form, "for_body", span)?;
        self.program.set_target(cond_stmt, 0, body_block, span)?;
        self.generate_scoped(form, &f.body)?;
        let (body_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;

        let continue_target = match &f.iterator {
            Some(iterator) => {
                let iter_block = self.program.create_new_block(form, "for_iter", span)?;
                self.program.set_target(body_jump, 0, iter_block, span)?;
                self.generate(form, iterator)?;
                let (iter_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
                self.program.set_target(iter_jump, 0, cond_block, span)?;
                iter_block
            }
            None => {
                self.program.set_target(body_jump, 0, cond_block, span)?;
                cond_block
            }
        };

        let exit = if f.condition.is_some() {
            let namespace = self.program.block_namespace(cond_end).clone();
            let exit = self
                .program
                .create_new_block_with_namespace(form, "for_exit", namespace, span)?;
            self.program.set_target(cond_stmt, 1, exit, span)?;
            exit
        } else {
            // only `break` leaves a loop without condition
            self.program.create_new_block(form, "for_exit", span)?
        };

        self.leave_loop(form, span, saved, exit, continue_target)?;
        let value = self.program.read_last_value(form, span)?;
        self.program.forms[form.index()].namespace.pop();
        Ok(value)
    }

    pub(crate) fn lower_switch(&mut self, form: FormId, span: Span, switch: &Switch) -> CompileResult<VarId> {
        let reference = self.generate_value(form, &switch.object)?;
        // a valueless break keeps the last evaluated value
        let info = self.program.new_jump_info(span, false, false)?;
        let saved_break = mem::replace(&mut self.program.forms[form.index()].break_info, Some(info));

        let (first, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        let saved_switch = mem::replace(
            &mut self.program.forms[form.index()].switch_info,
            Some(SwitchInfo {
                reference,
                last_stmt: first,
                default_block: None,
            }),
        );
        self.program.create_new_block(form, "disconnected_by_switch", span)?;

        self.generate_scoped(form, &switch.body)?;
        let (end_jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        let exit = self.program.create_new_block(form, "switch_exit", span)?;
        self.program.set_target(end_jump, 0, exit, span)?;

        let info = mem::replace(&mut self.program.forms[form.index()].switch_info, saved_switch)
            .ok_or_else(|| CompileError::internal("switch info vanished", span))?;
        // no case matched
        let fallback = info.default_block.unwrap_or(exit);
        let slot = self.miss_slot(info.last_stmt);
        self.program.set_target(info.last_stmt, slot, fallback, span)?;

        let info = mem::replace(&mut self.program.forms[form.index()].break_info, saved_break);
        if let Some(info) = info {
            self.program.bind_jump_info(form, info, exit, span)?;
        }
        self.program.read_last_value(form, span)
    }

    /// `case value:` extends the test chain; `default:` only records its
    /// block. The previous clause body falls through into this one's.
    pub(crate) fn lower_case(&mut self, form: FormId, span: Span, value: Option<&Node>) -> CompileResult<Option<VarId>> {
        let Some(info) = self.program.forms[form.index()].switch_info.clone() else {
            return Err(CompileError::CaseOutsideSwitch {
                keyword: if value.is_some() { "case" } else { "default" },
                span,
            });
        };

        let (fall, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        match value {
            Some(value) => {
                // keeps the scopes of the switch body; values flow in from
                // the test chain only
                let test_block = self.program.create_new_block(form, "switch_case", span)?;
                let slot = self.miss_slot(info.last_stmt);
                self.program.set_target(info.last_stmt, slot, test_block, span)?;

                let target = self.generate_value(form, value)?;
                let equal = self
                    .program
                    .add_variable_with_statement(form, span, OpCode::DiscEqual, &[info.reference, target])?;
                let (branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[equal])?;

                let body = self.program.create_new_block(form, "switch_case_body", span)?;
                self.program.set_target(branch, 0, body, span)?;
                self.program.set_target(fall, 0, body, span)?;
                if let Some(info) = self.program.forms[form.index()].switch_info.as_mut() {
                    info.last_stmt = branch;
                }
            }
            None => {
                if info.default_block.is_some() {
                    return Err(CompileError::DuplicateDefault { span });
                }
                let body = self.program.create_new_block(form, "switch_default", span)?;
                self.program.set_target(fall, 0, body, span)?;
                if let Some(info) = self.program.forms[form.index()].switch_info.as_mut() {
                    info.default_block = Some(body);
                }
            }
        }
        Ok(None)
    }

    /// Target slot taken when the chain statement does not match: a plain
    /// jump has one, a case test branches out on false.
    fn miss_slot(&self, stmt: StmtId) -> usize {
        match self.program.statements[stmt.index()].code {
            OpCode::Branch => 1,
            _ => 0,
        }
    }

    fn current_block(&self, form: FormId) -> BlockId {
        self.program.forms[form.index()].current
    }

    fn reset_last_value(&mut self, form: FormId, span: Span) -> CompileResult<()> {
        let void = self.void(form, span)?;
        self.program.write_last_value(form, span, void)
    }

    fn enter_loop(&mut self, form: FormId, span: Span) -> CompileResult<SavedLoop> {
        let break_info = self.program.new_jump_info(span, false, true)?;
        let continue_info = self.program.new_jump_info(span, false, true)?;
        let f = &mut self.program.forms[form.index()];
        Ok((
            mem::replace(&mut f.break_info, Some(break_info)),
            mem::replace(&mut f.continue_info, Some(continue_info)),
        ))
    }

    /// Restore the enclosing loop and bind this one's break and continue
    /// sites.
    fn leave_loop(
        &mut self,
        form: FormId,
        span: Span,
        saved: SavedLoop,
        break_target: BlockId,
        continue_target: BlockId,
    ) -> CompileResult<()> {
        let f = &mut self.program.forms[form.index()];
        let break_info = mem::replace(&mut f.break_info, saved.0);
        let continue_info = mem::replace(&mut f.continue_info, saved.1);
        if let Some(info) = break_info {
            self.program.bind_jump_info(form, info, break_target, span)?;
        }
        if let Some(info) = continue_info {
            self.program.bind_jump_info(form, info, continue_target, span)?;
        }
        Ok(())
    }
}

type SavedLoop = (Option<JumpInfo>, Option<JumpInfo>);
