//! Label binding and exit-try wiring

use rustc_hash::FxHashSet;
use tracing::debug;

use super::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::form::{CatchBranchInfo, FIXED_CATCH_TARGETS, LAST_VALUE, RETURN_LABEL};
use crate::ssa::{FormId, FunctionId, InsertPoint, OpCode};
use risse_ast::{Node, NodeKind, Span};

/// The labels one finally copy declares. Inside the copy they are renamed
/// apart from the other copies of the same body.
#[derive(Debug)]
pub(crate) struct LabelScope {
    declared: FxHashSet<String>,
    copy: u32,
}

impl Compiler {
    /// The label map key of `name` at the current point of lowering.
    pub(crate) fn scoped_label(&self, name: &str) -> String {
        self.label_scopes
            .iter()
            .rev()
            .find(|scope| scope.declared.contains(name))
            .map_or_else(|| name.to_string(), |scope| format!("{}%finally{}", name, scope.copy))
    }

    /// Open the label scope of a finally copy. False when `body` declares
    /// no label and nothing was pushed.
    pub(crate) fn push_label_scope(&mut self, body: &Node) -> bool {
        let mut declared = FxHashSet::default();
        collect_labels(body, &mut declared);
        if declared.is_empty() {
            return false;
        }
        self.label_scopes.push(LabelScope {
            declared,
            copy: self.finally_copies,
        });
        self.finally_copies += 1;
        true
    }

    /// Resolve every pending label jump. Calling it again without new
    /// jumps changes nothing.
    pub fn bind_all_labels(&mut self) -> CompileResult<()> {
        let functions: Vec<FunctionId> = self.program.functions().collect();
        for function in functions.into_iter().rev() {
            self.bind_labels(function)?;
        }
        Ok(())
    }

    fn bind_labels(&mut self, function: FunctionId) -> CompileResult<()> {
        let pending = std::mem::take(&mut self.program.functions[function.index()].pending_jumps);
        for jump in pending {
            let source_form = self.program.blocks[jump.source.index()].form;
            let target = self
                .program
                .lookup_label(source_form, &jump.label)
                .ok_or_else(|| CompileError::UndefinedLabel {
                    label: jump.label.clone(),
                    span: jump.span,
                })?;
            let target_form = self.program.blocks[target.index()].form;

            if target_form == source_form {
                let (stmt, _) =
                    self.program
                        .add_statement_to_block(jump.source, InsertPoint::Tail, jump.span, OpCode::Jump, &[])?;
                self.program.set_target(stmt, 0, target, jump.span)?;
            } else {
                let value = self
                    .program
                    .ns_read_in_block(jump.source, jump.span, LAST_VALUE)?
                    .ok_or_else(|| CompileError::internal("last evaluated value is not declared", jump.span))?;
                self.program
                    .add_exit_try(jump.source, jump.span, value, target_form, &jump.label)?;
            }
            debug!(label = %jump.label, %function, local = target_form == source_form, "label bound");
        }
        Ok(())
    }

    /// Create the blocks behind every exit label not wired yet. Returns
    /// whether anything was added.
    pub(crate) fn add_pending_catch_targets(&mut self) -> CompileResult<bool> {
        let mut progressed = false;
        let forms: Vec<FormId> = self.program.forms().collect();
        for form in forms.into_iter().rev() {
            let try_ids: Vec<u32> = self.program.forms[form.index()]
                .catch_branches
                .iter()
                .filter(|(_, info)| info.wired < info.labels.len())
                .map(|(id, _)| *id)
                .collect();
            for try_id in try_ids {
                self.add_catch_branch_targets(form, try_id)?;
                progressed = true;
            }
        }
        Ok(progressed)
    }

    /// One block per exit label of the catch branch for `try_id`: fetch the
    /// carried value, run the finally clause, then return or jump on.
    fn add_catch_branch_targets(&mut self, form: FormId, try_id: u32) -> CompileResult<()> {
        let Some(info) = self.program.forms[form.index()].catch_branches.get(&try_id).cloned() else {
            return Ok(());
        };
        let (stmt, result) = match (info.stmt, info.result) {
            (Some(stmt), Some(result)) => (stmt, result),
            _ => {
                return Err(CompileError::internal(
                    format!("exit through try {} without a catch branch", try_id),
                    Span::default(),
                ))
            }
        };
        let span = self.program.statements[stmt.index()].span;
        let branch_block = self.program.statements[stmt.index()].block;
        let function = self.program.forms[form.index()].function;

        for (index, label) in info.labels.iter().enumerate().skip(info.wired) {
            let is_return = label == RETURN_LABEL;
            let namespace = self.program.block_namespace(branch_block).clone();
            let base = if is_return { "return_by_exception" } else { "goto_by_exception" };
            let block = self
                .program
                .create_new_block_with_namespace(form, base, namespace, span)?;
            self.program
                .set_target(stmt, index + FIXED_CATCH_TARGETS as usize, block, span)?;
            let value = self
                .program
                .add_variable_with_statement(form, span, OpCode::GetExitTryValue, &[result])?;
            if let Some(finally) = &info.finally {
                self.lower_late_finally(form, finally, &info)?;
            }

            if is_return {
                self.program.add_return_statement(form, span, value)?;
            } else {
                self.program.write_last_value(form, span, value)?;
                let current = self.program.forms[form.index()].current;
                self.program.add_pending_label_jump(function, current, label, span);
                self.program.create_new_block(form, "disconnected_by_goto", span)?;
            }
            debug!(form = %self.program.forms[form.index()].name, try_id, label = %label, "exit target wired");
        }

        if let Some(entry) = self.program.forms[form.index()].catch_branches.get_mut(&try_id) {
            entry.wired = info.labels.len();
        }
        Ok(())
    }

    /// A finally copy lowered after the loops around the construct were
    /// closed. Their break and continue targets are put back while the copy
    /// is lowered; jumps to them are queued against the bound labels.
    fn lower_late_finally(&mut self, form: FormId, finally: &Node, info: &CatchBranchInfo) -> CompileResult<()> {
        let mut saved = Vec::new();
        for (continue_, target) in [(false, &info.break_target), (true, &info.continue_target)] {
            if let Some((target_form, jump)) = target {
                let previous = self.program.jump_info_mut(*target_form, continue_).replace(jump.clone());
                saved.push((*target_form, continue_, previous));
            }
        }

        let result = self.lower_finally(form, finally);

        for (target_form, continue_, previous) in saved.into_iter().rev() {
            let slot = self.program.jump_info_mut(target_form, continue_);
            let Some(jump) = std::mem::replace(slot, previous) else {
                continue;
            };
            let function = self.program.forms[target_form.index()].function;
            for (source, span) in jump.pending {
                self.program.add_pending_label_jump(function, source, &jump.label, span);
            }
        }
        result
    }
}

fn collect_labels(node: &Node, out: &mut FxHashSet<String>) {
    if let NodeKind::Label(name) = &node.kind {
        out.insert(name.clone());
    }
    for child in node.children() {
        collect_labels(child, out);
    }
}
