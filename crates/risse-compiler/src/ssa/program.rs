//! The SSA program: arenas for everything one compilation builds

use rustc_hash::FxHashSet;

use super::access_map::AccessMap;
use super::block::Block;
use super::form::SsaForm;
use super::ids::*;
use super::namespace::{base_name, LocalNamespace};
use super::opcode::OpCode;
use super::statement::Statement;
use super::variable::Variable;
use crate::compiler::function::{CompilerFunction, FunctionGroup};
use crate::error::{CompileError, CompileResult};
use risse_ast::Span;

/// Largest internal serial number; names and versions are unique below it.
pub const MAX_UNIQUE_NUMBER: u32 = 1 << 30;

#[derive(Debug, Clone, Default)]
pub struct SsaProgram {
    pub(crate) forms: Vec<SsaForm>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) statements: Vec<Statement>,
    pub(crate) variables: Vec<Variable>,
    pub(crate) access_maps: Vec<AccessMap>,
    pub(crate) functions: Vec<CompilerFunction>,
    pub(crate) groups: Vec<FunctionGroup>,
    pub(crate) binding: Option<LocalNamespace>,
    pub(crate) roots: Vec<FormId>,
    unique: u32,
}

impl SsaProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unique_number(&mut self, span: Span) -> CompileResult<u32> {
        if self.unique >= MAX_UNIQUE_NUMBER {
            return Err(CompileError::NumberExhausted { span });
        }
        let n = self.unique;
        self.unique += 1;
        Ok(n)
    }

    #[cfg(test)]
    pub(crate) fn set_unique_number(&mut self, n: u32) {
        self.unique = n;
    }

    /// A new version; `numbered` is the numbered name for named variables.
    pub(crate) fn new_variable(&mut self, form: FormId, span: Span, numbered: Option<&str>) -> CompileResult<VarId> {
        let version = self.unique_number(span)?;
        let id = VarId::new(self.variables.len() as u32);
        self.variables.push(Variable {
            name: numbered.map(|n| base_name(n).to_string()),
            numbered_name: numbered.map(str::to_string),
            version,
            form,
            declared: None,
            uses: Vec::new(),
        });
        Ok(id)
    }

    pub fn form(&self, id: FormId) -> &SsaForm {
        &self.forms[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn statement(&self, id: StmtId) -> &Statement {
        &self.statements[id.index()]
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn access_map(&self, id: AccessMapId) -> &AccessMap {
        &self.access_maps[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &CompilerFunction {
        &self.functions[id.index()]
    }

    pub fn group(&self, id: FunctionGroupId) -> &FunctionGroup {
        &self.groups[id.index()]
    }

    pub fn forms(&self) -> impl Iterator<Item = FormId> {
        (0..self.forms.len() as u32).map(FormId::new)
    }

    pub fn functions(&self) -> impl Iterator<Item = FunctionId> {
        (0..self.functions.len() as u32).map(FunctionId::new)
    }

    pub fn groups(&self) -> impl Iterator<Item = FunctionGroupId> {
        (0..self.groups.len() as u32).map(FunctionGroupId::new)
    }

    /// Top-level forms, one per compiled unit or class body.
    pub fn roots(&self) -> &[FormId] {
        &self.roots
    }

    /// The form of the first compiled unit.
    pub fn root_form(&self) -> Option<FormId> {
        self.roots.first().copied()
    }

    pub fn binding(&self) -> Option<&LocalNamespace> {
        self.binding.as_ref()
    }

    /// Number of statements still placed in blocks.
    pub fn live_statement_count(&self) -> usize {
        self.statements.iter().filter(|s| !s.removed).count()
    }

    /// The form's block reached first by `name` prefix, in creation order.
    pub fn find_block(&self, form: FormId, prefix: &str) -> Option<BlockId> {
        self.forms[form.index()]
            .blocks
            .iter()
            .copied()
            .find(|b| self.blocks[b.index()].name.starts_with(prefix))
    }

    /// Blocks reachable from the form's entry, in depth-first preorder.
    pub fn reachable_blocks(&self, form: FormId) -> Vec<BlockId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![self.forms[form.index()].entry];
        while let Some(block) = stack.pop() {
            if !seen.insert(block) {
                continue;
            }
            order.push(block);
            for &succ in self.blocks[block.index()].succs.iter().rev() {
                if !seen.contains(&succ) {
                    stack.push(succ);
                }
            }
        }
        order
    }

    /// Check the structural invariants of the finished program: edge
    /// symmetry, single assignment, recorded uses, φ arity and dominance of
    /// definitions.
    pub fn verify(&self) -> CompileResult<()> {
        for (index, block) in self.blocks.iter().enumerate() {
            let id = BlockId::new(index as u32);
            let broken = |message: String| {
                let span = block
                    .statements
                    .first()
                    .map(|s| self.statements[s.index()].span)
                    .unwrap_or_default();
                CompileError::internal(format!("block {}: {}", block.name, message), span)
            };

            // edge symmetry, counting duplicates
            for &pred in &block.preds {
                let forward = self.blocks[pred.index()].succs.iter().filter(|s| **s == id).count();
                let backward = block.preds.iter().filter(|p| **p == pred).count();
                if forward != backward {
                    return Err(broken(format!("edge from {} is not symmetric", self.blocks[pred.index()].name)));
                }
            }

            let mut targets: Vec<BlockId> = Vec::new();
            let mut in_phis = true;
            for (position, &stmt_id) in block.statements.iter().enumerate() {
                let stmt = &self.statements[stmt_id.index()];
                if stmt.removed || stmt.block != id {
                    return Err(broken(format!("statement {} is misplaced", stmt_id)));
                }
                if stmt.code.is_branch() && position + 1 != block.statements.len() {
                    return Err(broken(format!("{} is not the last statement", stmt.code)));
                }
                if stmt.code == OpCode::Phi {
                    if !in_phis {
                        return Err(broken("phi after an ordinary statement".to_string()));
                    }
                    if stmt.used.len() != block.preds.len() {
                        return Err(broken(format!(
                            "phi has {} operands for {} predecessors",
                            stmt.used.len(),
                            block.preds.len()
                        )));
                    }
                } else {
                    in_phis = false;
                }
                if let Some(var) = stmt.declared {
                    if self.variables[var.index()].declared != Some(stmt_id) {
                        return Err(broken(format!("{} is declared twice", var)));
                    }
                }
                for &var in &stmt.used {
                    if !self.variables[var.index()].uses.contains(&stmt_id) {
                        return Err(broken(format!("use of {} by {} is not recorded", var, stmt_id)));
                    }
                    if self.variables[var.index()].declared.is_none() {
                        return Err(broken(format!("{} is used but never declared", var)));
                    }
                }
                for target in &stmt.targets {
                    match target {
                        Some(target) => targets.push(*target),
                        None => return Err(broken(format!("{} has an unset target", stmt.code))),
                    }
                }
            }

            let mut succs = block.succs.clone();
            succs.sort_unstable();
            targets.sort_unstable();
            if succs != targets {
                return Err(broken("successors differ from branch targets".to_string()));
            }
        }
        for form in self.forms() {
            self.verify_dominance(form)?;
        }
        Ok(())
    }
}
