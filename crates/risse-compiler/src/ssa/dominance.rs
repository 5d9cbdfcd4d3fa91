//! Dominators of a form's control-flow graph
//!
//! Computed with the iterative algorithm of Cooper, Harvey and Kennedy over
//! the blocks reachable from the form's entry. Unreachable blocks (the
//! `disconnected_by_*` ones) are outside the tree.

use rustc_hash::{FxHashMap, FxHashSet};

use super::ids::{BlockId, FormId};
use super::opcode::OpCode;
use super::program::SsaProgram;
use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// Reverse postorder position of every reachable block.
    order: FxHashMap<BlockId, usize>,
    /// Immediate dominator, by reverse postorder position. The entry is its
    /// own.
    idom: Vec<usize>,
}

impl DominatorTree {
    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.order.contains_key(&block)
    }

    /// Whether every path from the entry to `b` passes `a`. False when
    /// either block is unreachable.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        let (Some(&a), Some(&b)) = (self.order.get(&a), self.order.get(&b)) else {
            return false;
        };
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            if current == 0 {
                return false;
            }
            current = self.idom[current];
        }
    }
}

fn intersect(idom: &[Option<usize>], mut a: usize, mut b: usize) -> usize {
    while a != b {
        while a > b {
            a = idom[a].unwrap_or(0);
        }
        while b > a {
            b = idom[b].unwrap_or(0);
        }
    }
    a
}

impl SsaProgram {
    fn postorder(&self, entry: BlockId) -> Vec<BlockId> {
        let mut seen = FxHashSet::default();
        let mut post = Vec::new();
        let mut stack = vec![(entry, 0usize)];
        seen.insert(entry);
        while let Some(&(block, next)) = stack.last() {
            match self.blocks[block.index()].succs.get(next) {
                Some(&succ) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    if seen.insert(succ) {
                        stack.push((succ, 0));
                    }
                }
                None => {
                    post.push(block);
                    stack.pop();
                }
            }
        }
        post
    }

    pub fn dominators(&self, form: FormId) -> DominatorTree {
        let mut rpo = self.postorder(self.forms[form.index()].entry);
        rpo.reverse();
        let order: FxHashMap<BlockId, usize> = rpo.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        let mut idom: Vec<Option<usize>> = vec![None; rpo.len()];
        idom[0] = Some(0);
        let mut changed = true;
        while changed {
            changed = false;
            for (i, block) in rpo.iter().enumerate().skip(1) {
                let mut candidate: Option<usize> = None;
                for pred in &self.blocks[block.index()].preds {
                    let Some(&p) = order.get(pred) else { continue };
                    if idom[p].is_none() {
                        continue;
                    }
                    candidate = Some(match candidate {
                        None => p,
                        Some(current) => intersect(&idom, p, current),
                    });
                }
                if candidate.is_some() && candidate != idom[i] {
                    idom[i] = candidate;
                    changed = true;
                }
            }
        }

        DominatorTree {
            order,
            idom: idom.into_iter().map(|d| d.unwrap_or(0)).collect(),
        }
    }

    /// Every use in a reachable block is dominated by its definition. A φ
    /// operand must be available at the end of its predecessor. Values of
    /// other forms reach a form only through named accesses and are not
    /// checked here.
    pub(crate) fn verify_dominance(&self, form: FormId) -> CompileResult<()> {
        let tree = self.dominators(form);
        for &block_id in &self.forms[form.index()].blocks {
            if !tree.is_reachable(block_id) {
                continue;
            }
            let block = &self.blocks[block_id.index()];
            for (position, &stmt_id) in block.statements.iter().enumerate() {
                let stmt = &self.statements[stmt_id.index()];
                for (operand, &var) in stmt.used.iter().enumerate() {
                    let Some(def) = self.variables[var.index()].declared else {
                        continue;
                    };
                    let def_block = self.statements[def.index()].block;
                    if self.blocks[def_block.index()].form != form {
                        continue;
                    }
                    let dominated = if stmt.code == OpCode::Phi {
                        match block.preds.get(operand) {
                            Some(&pred) if tree.is_reachable(pred) => tree.dominates(def_block, pred),
                            _ => true,
                        }
                    } else if def_block == block_id {
                        block.statements[..position].contains(&def)
                    } else {
                        tree.dominates(def_block, block_id)
                    };
                    if !dominated {
                        return Err(CompileError::internal(
                            format!(
                                "block {}: {} is used by {} where its definition does not dominate",
                                block.name, var, stmt_id
                            ),
                            stmt.span,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
