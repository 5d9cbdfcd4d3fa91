//! Basic blocks and CFG edges

use tracing::trace;

use super::ids::{BlockId, FormId, StmtId, VarId};
use super::namespace::LocalNamespace;
use super::opcode::OpCode;
use super::statement::InsertPoint;
use super::SsaProgram;
use crate::error::{CompileError, CompileResult};
use risse_ast::Span;

/// A basic block.
///
/// Predecessors and successors are multisets: a `Branch` whose two targets
/// are the same block contributes two edges.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) name: String,
    pub(crate) form: FormId,
    pub(crate) statements: Vec<StmtId>,
    pub(crate) preds: Vec<BlockId>,
    pub(crate) succs: Vec<BlockId>,
    /// The namespace as it was when the block was closed.
    pub(crate) snapshot: Option<LocalNamespace>,
}

impl Block {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn form(&self) -> FormId {
        self.form
    }

    pub fn statements(&self) -> &[StmtId] {
        &self.statements
    }

    pub fn preds(&self) -> &[BlockId] {
        &self.preds
    }

    pub fn succs(&self) -> &[BlockId] {
        &self.succs
    }

    pub fn is_closed(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl SsaProgram {
    pub(crate) fn new_block(&mut self, form: FormId, base_name: &str, span: Span) -> CompileResult<BlockId> {
        let n = self.unique_number(span)?;
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block {
            name: format!("{}_{}", base_name, n),
            form,
            statements: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
            snapshot: None,
        });
        self.forms[form.index()].blocks.push(id);
        trace!(block = %self.blocks[id.index()].name, "block created");
        Ok(id)
    }

    pub(crate) fn insert_statement(&mut self, block: BlockId, stmt: StmtId, point: InsertPoint) {
        let position = {
            let statements = &self.blocks[block.index()].statements;
            match point {
                InsertPoint::Head => 0,
                InsertPoint::Tail => statements.len(),
                InsertPoint::AfterPhi => statements
                    .iter()
                    .position(|s| self.statements[s.index()].code != OpCode::Phi)
                    .unwrap_or(statements.len()),
                InsertPoint::BeforeBranch => match statements.last() {
                    Some(last) if self.statements[last.index()].code.is_branch() => statements.len() - 1,
                    _ => statements.len(),
                },
            }
        };
        self.statements[stmt.index()].block = block;
        self.blocks[block.index()].statements.insert(position, stmt);
    }

    /// Unlink a statement from its block and from the use lists of its
    /// operands.
    pub(crate) fn delete_statement(&mut self, stmt: StmtId) {
        let block = self.statements[stmt.index()].block;
        self.blocks[block.index()].statements.retain(|s| *s != stmt);
        let used = std::mem::take(&mut self.statements[stmt.index()].used);
        for var in used {
            self.remove_use(var, stmt);
        }
        self.statements[stmt.index()].removed = true;
    }

    /// Put `new` in the place of `old`. The variable `old` declared moves to
    /// `new`; `old` is deleted.
    pub(crate) fn replace_statement(&mut self, old: StmtId, new: StmtId) {
        let block = self.statements[old.index()].block;
        if let Some(slot) = self.blocks[block.index()].statements.iter_mut().find(|s| **s == old) {
            *slot = new;
        }
        self.statements[new.index()].block = block;
        if let Some(var) = self.statements[old.index()].declared.take() {
            self.set_declared(new, var);
        }
        let used = std::mem::take(&mut self.statements[old.index()].used);
        for var in used {
            self.remove_use(var, old);
        }
        self.statements[old.index()].removed = true;
    }

    fn remove_use(&mut self, var: VarId, stmt: StmtId) {
        let uses = &mut self.variables[var.index()].uses;
        if let Some(pos) = uses.iter().position(|s| *s == stmt) {
            uses.remove(pos);
        }
    }

    /// Add the edge `pred → block`. Every leading named φ of `block` gets
    /// the operand for the new edge right away.
    pub(crate) fn add_pred(&mut self, block: BlockId, pred: BlockId, span: Span) -> CompileResult<()> {
        self.blocks[block.index()].preds.push(pred);
        self.blocks[pred.index()].succs.push(block);

        let phis: Vec<StmtId> = self.blocks[block.index()]
            .statements
            .iter()
            .copied()
            .take_while(|s| self.statements[s.index()].code == OpCode::Phi)
            .collect();
        for phi in phis {
            let Some(var) = self.statements[phi.index()].declared else {
                continue;
            };
            let Some(n_name) = self.variables[var.index()].numbered_name.clone() else {
                return Err(CompileError::internal(
                    "cannot add a predecessor to a block with an anonymous phi",
                    span,
                ));
            };
            let operand = match self.make_phi_function(pred, span, &n_name, true)? {
                Some((_, operand)) => operand,
                None => {
                    return Err(CompileError::OutOfScope {
                        name: super::namespace::base_name(&n_name).to_string(),
                        span,
                    })
                }
            };
            self.add_used(phi, operand);
        }
        Ok(())
    }

    /// Remove one `pred → block` edge along with the matching φ operands.
    pub(crate) fn delete_pred(&mut self, block: BlockId, pred: BlockId) {
        let Some(index) = self.blocks[block.index()].preds.iter().position(|p| *p == pred) else {
            return;
        };
        self.blocks[block.index()].preds.remove(index);
        let succs = &mut self.blocks[pred.index()].succs;
        if let Some(pos) = succs.iter().position(|s| *s == block) {
            succs.remove(pos);
        }

        let phis: Vec<StmtId> = self.blocks[block.index()]
            .statements
            .iter()
            .copied()
            .take_while(|s| self.statements[s.index()].code == OpCode::Phi)
            .collect();
        for phi in phis {
            if index < self.statements[phi.index()].used.len() {
                let var = self.statements[phi.index()].used.remove(index);
                self.remove_use(var, phi);
            }
        }
    }

    /// Point target `slot` of a branch statement at `target`.
    pub(crate) fn set_target(&mut self, stmt: StmtId, slot: usize, target: BlockId, span: Span) -> CompileResult<()> {
        let source = self.statements[stmt.index()].block;
        let targets = &mut self.statements[stmt.index()].targets;
        if targets.len() <= slot {
            targets.resize(slot + 1, None);
        }
        if let Some(old) = targets[slot].replace(target) {
            self.delete_pred(old, source);
        }
        self.add_pred(target, source, span)
    }

    pub(crate) fn last_statement(&self, block: BlockId) -> Option<StmtId> {
        self.blocks[block.index()].statements.last().copied()
    }

    /// Whether the block already ends with a branch statement.
    pub(crate) fn is_terminated(&self, block: BlockId) -> bool {
        self.last_statement(block)
            .is_some_and(|s| self.statements[s.index()].code.is_branch())
    }
}
