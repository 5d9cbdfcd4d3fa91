//! Protected regions: try/catch/finally and synchronized
//!
//! The protected body becomes a lazy block run by `TryFuncCall` (or `Sync`).
//! The `CatchBranch` after the call goes to target 0 when the block returned
//! normally, to target 1 when it threw, and to target `N + 2` for the exit
//! label `N` of a non-local exit leaving the block. The exit targets are
//! only created once the whole program is lowered.
//!
//! A finally clause is run on every path out of the construct: the try with
//! its catch clauses is wrapped in an outer protected region without catch
//! clauses, whose normal path, rethrow path and exit targets each run the
//! finally body.

use tracing::debug;

use crate::compiler::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::{FormId, OpCode, StmtId, VarId};
use risse_ast::{Catch, Node, NodeKind, Span, Synchronized, Try};

impl Compiler {
    pub(crate) fn lower_try(&mut self, form: FormId, span: Span, t: &Try) -> CompileResult<VarId> {
        match (t.finally.as_deref(), t.catches.is_empty()) {
            (None, _) => {
                let (try_id, result) = self.lower_protected(form, span, &t.body, OpCode::TryFuncCall, None, false)?;
                self.emit_catch_dispatch(form, span, try_id, result, &t.catches, None)?;
            }
            (Some(finally), true) => {
                let (try_id, result) = self.lower_protected(form, span, &t.body, OpCode::TryFuncCall, None, true)?;
                self.emit_catch_dispatch(form, span, try_id, result, &[], Some(finally))?;
            }
            (Some(finally), false) => {
                let inner = Node::new(
                    NodeKind::Try(Try {
                        body: t.body.clone(),
                        catches: t.catches.clone(),
                        finally: None,
                    }),
                    span,
                );
                let (try_id, result) = self.lower_protected(form, span, &inner, OpCode::TryFuncCall, None, true)?;
                self.emit_catch_dispatch(form, span, try_id, result, &[], Some(finally))?;
            }
        }
        self.program.read_last_value(form, span)
    }

    pub(crate) fn lower_synchronized(&mut self, form: FormId, span: Span, sync: &Synchronized) -> CompileResult<VarId> {
        let object = self.generate_value(form, &sync.object)?;
        let (try_id, result) = self.lower_protected(form, span, &sync.body, OpCode::Sync, Some(object), false)?;
        self.emit_catch_dispatch(form, span, try_id, result, &[], None)?;
        self.program.read_last_value(form, span)
    }

    /// Lower `body` as a lazy block in the parent's frame and run it with
    /// `code`. Returns the try id of the region and the call's result.
    fn lower_protected(
        &mut self,
        form: FormId,
        span: Span,
        body: &Node,
        code: OpCode,
        extra: Option<VarId>,
        has_finally: bool,
    ) -> CompileResult<(u32, VarId)> {
        let map = self.program.create_access_map(form, span)?;
        let try_id = self.program.new_try_id(form);
        let base = if code == OpCode::Sync { "synchronized block" } else { "try block" };
        let (child, lazy) = self.program.create_lazy_block(form, span, base, false, Some(map))?;
        {
            let c = &mut self.program.forms[child.index()];
            c.try_id = Some(try_id);
            c.has_finally = has_finally;
        }

        let value = self.generate(child, body)?;
        self.program.add_final_return(child, body.end_position(), value)?;

        self.program.list_variables_for_lazy_block(form, span, map)?;
        let mut used = vec![lazy];
        used.extend(extra);
        let (stmt, result) = self.program.add_statement(form, span, code, &used)?;
        self.program.statements[stmt.index()].try_id = Some(try_id);
        let result = result.ok_or_else(|| CompileError::internal(format!("{} declares no value", code), span))?;
        self.program.cleanup_access_map(form, span, map)?;
        debug!(form = %self.program.forms[form.index()].name, try_id, has_finally, "protected region lowered");
        Ok((try_id, result))
    }

    /// Emit the `CatchBranch` for `result` and the normal and exception
    /// paths behind it. Both continue in a join block which becomes the
    /// form's current block; the value of the construct is then in `_`.
    pub(crate) fn emit_catch_dispatch(
        &mut self,
        form: FormId,
        span: Span,
        try_id: u32,
        result: VarId,
        catches: &[Catch],
        finally: Option<&Node>,
    ) -> CompileResult<()> {
        let (branch, _) = self.program.add_statement(form, span, OpCode::CatchBranch, &[result])?;
        let branch_block = self.program.statements[branch.index()].block;
        let (break_target, continue_target) = match finally {
            Some(_) => (
                self.program.enclosing_jump_info(form, false),
                self.program.enclosing_jump_info(form, true),
            ),
            None => (None, None),
        };
        {
            let info = self.program.forms[form.index()]
                .catch_branches
                .entry(try_id)
                .or_default();
            info.stmt = Some(branch);
            info.result = Some(result);
            info.finally = finally.cloned();
            info.break_target = break_target;
            info.continue_target = continue_target;
        }
        let mut joins: Vec<StmtId> = Vec::new();

        // returned normally
        let exit_block = self.program.create_new_block(form, "try_exit", span)?;
        self.program.set_target(branch, 0, exit_block, span)?;
        self.program.write_last_value(form, span, result)?;
        if let Some(finally) = finally {
            self.lower_finally(form, finally)?;
            self.program.write_last_value(form, span, result)?;
        }
        joins.push(self.program.add_statement(form, span, OpCode::Jump, &[])?.0);

        // threw
        let namespace = self.program.block_namespace(branch_block).clone();
        let catch_block = self
            .program
            .create_new_block_with_namespace(form, "try_catch", namespace, span)?;
        self.program.set_target(branch, 1, catch_block, span)?;
        let exception = self
            .program
            .add_variable_with_statement(form, span, OpCode::GetExitTryValue, &[result])?;

        let saved_catch_value = self.program.forms[form.index()].catch_value.replace(exception);
        let mut caught = false;
        for catch in catches {
            if self.lower_catch_clause(form, catch, exception, finally, &mut joins)? {
                caught = true;
                break;
            }
        }
        self.program.forms[form.index()].catch_value = saved_catch_value;

        if !caught {
            if let Some(finally) = finally {
                self.lower_finally(form, finally)?;
            }
            self.program.add_statement(form, span, OpCode::Throw, &[exception])?;
        }

        let end = self.program.create_new_block(form, "try_end", span)?;
        for jump in joins {
            self.program.set_target(jump, 0, end, span)?;
        }
        Ok(())
    }

    /// One catch clause. Returns true when the clause catches
    /// unconditionally, which ends the chain.
    fn lower_catch_clause(
        &mut self,
        form: FormId,
        catch: &Catch,
        exception: VarId,
        finally: Option<&Node>,
        joins: &mut Vec<StmtId>,
    ) -> CompileResult<bool> {
        let span = catch.span;
        self.program.forms[form.index()].namespace.push();
        if let Some(name) = &catch.name {
            self.program.ns_add(form, span, name, None)?;
            self.program.ns_write(form, span, name, exception)?;
        }

        let test = match &catch.condition {
            Some(condition) => {
                let cond = self.generate_value(form, condition)?;
                let (branch, _) = self.program.add_statement(form, span, OpCode::Branch, &[cond])?;
                let test_block = self.program.statements[branch.index()].block;
                let body = self.program.create_new_block(form, "catch_body", span)?;
                self.program.set_target(branch, 0, body, span)?;
                Some((branch, test_block))
            }
            None => None,
        };

        self.generate(form, &catch.body)?;
        if let Some(finally) = finally {
            let value = self.program.read_last_value(form, span)?;
            self.lower_finally(form, finally)?;
            self.program.write_last_value(form, span, value)?;
        }
        joins.push(self.program.add_statement(form, span, OpCode::Jump, &[])?.0);

        let Some((branch, test_block)) = test else {
            self.program.forms[form.index()].namespace.pop();
            return Ok(true);
        };
        // the next clause is tested where this one's condition failed
        let namespace = self.program.block_namespace(test_block).clone();
        let next = self
            .program
            .create_new_block_with_namespace(form, "catch_next", namespace, span)?;
        self.program.set_target(branch, 1, next, span)?;
        self.program.forms[form.index()].namespace.pop();
        Ok(false)
    }

    /// A finally body, in a scope of its own. Every copy gets its own
    /// labels.
    pub(crate) fn lower_finally(&mut self, form: FormId, finally: &Node) -> CompileResult<()> {
        let scoped = self.push_label_scope(finally);
        let result = self.generate_scoped(form, finally);
        if scoped {
            self.label_scopes.pop();
        }
        result.map(|_| ())
    }
}
