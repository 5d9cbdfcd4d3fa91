//! Post-lowering passes

use tracing::debug;

use crate::ssa::{BlockId, OpCode, SsaProgram, StmtId, VarId};

impl SsaProgram {
    /// Turn local accesses of captured variables into shared-storage
    /// accesses (`ReadVar` → `Read`, `WriteVar` → `Write`).
    pub(crate) fn promote_shared_variables(&mut self) {
        let mut promoted = 0usize;
        for function in 0..self.functions.len() {
            if self.functions[function].shared.is_empty() {
                continue;
            }
            let blocks: Vec<BlockId> = self.functions[function]
                .forms
                .iter()
                .flat_map(|f| self.forms[f.index()].blocks.iter().copied())
                .collect();
            for block in blocks {
                let statements = self.blocks[block.index()].statements.clone();
                for stmt in statements {
                    let s = &self.statements[stmt.index()];
                    let code = match s.code {
                        OpCode::ReadVar => OpCode::Read,
                        OpCode::WriteVar => OpCode::Write,
                        _ => continue,
                    };
                    let Some(name) = s.name.clone() else { continue };
                    if !self.functions[function].shared.contains(&name) {
                        continue;
                    }
                    let (span, value) = (s.span, s.used.first().copied());
                    let replacement = self.new_statement(span, code, block);
                    self.statements[replacement.index()].name = Some(name);
                    if code == OpCode::Write {
                        if let Some(value) = value {
                            self.add_used(replacement, value);
                        }
                    }
                    self.replace_statement(stmt, replacement);
                    promoted += 1;
                }
            }
        }
        debug!(promoted, "shared variables promoted");
    }

    /// Remove every φ whose operands are all one variable (or the φ itself),
    /// repeating until none is left.
    pub(crate) fn eliminate_trivial_phis(&mut self) {
        let mut removed = 0usize;
        loop {
            let mut changed = false;
            for index in 0..self.statements.len() {
                let stmt = StmtId::new(index as u32);
                let s = &self.statements[index];
                if s.removed || s.code != OpCode::Phi {
                    continue;
                }
                let Some(var) = s.declared else { continue };
                if let Some(replacement) = trivial_operand(var, &s.used) {
                    self.replace_uses(var, replacement);
                    self.delete_statement(stmt);
                    changed = true;
                    removed += 1;
                }
            }
            if !changed {
                break;
            }
        }
        debug!(removed, "trivial phis eliminated");
    }

    fn replace_uses(&mut self, var: VarId, replacement: VarId) {
        let uses = std::mem::take(&mut self.variables[var.index()].uses);
        for user in uses {
            for operand in self.statements[user.index()].used.iter_mut().filter(|u| **u == var) {
                *operand = replacement;
            }
            if !self.variables[replacement.index()].uses.contains(&user) {
                self.variables[replacement.index()].uses.push(user);
            }
        }
    }
}

/// The single operand other than `var` itself, if there is exactly one.
fn trivial_operand(var: VarId, operands: &[VarId]) -> Option<VarId> {
    let mut unique = None;
    for &operand in operands {
        if operand == var {
            continue;
        }
        match unique {
            None => unique = Some(operand),
            Some(u) if u == operand => {}
            Some(_) => return None,
        }
    }
    unique
}
