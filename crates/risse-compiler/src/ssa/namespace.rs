//! Local namespaces and φ insertion
//!
//! A namespace is a stack of scopes. Each scope maps a source name to its
//! numbered name (`x#12`, one per declaration) and the numbered name to the
//! SSA version currently holding its value. A version of `None` means "not
//! known in this block yet": the first read resolves it through the block's
//! predecessors and inserts φ statements on the way.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::ids::{AccessMapId, BlockId, FormId, StmtId, VarId};
use super::opcode::OpCode;
use super::statement::InsertPoint;
use super::SsaProgram;
use crate::error::{CompileError, CompileResult};
use risse_ast::Span;

#[derive(Debug, Clone, Default)]
struct Scope {
    aliases: FxHashMap<String, String>,
    variables: FxHashMap<String, Option<VarId>>,
}

/// Where a namespace looks for names it does not hold itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceParent {
    Form(FormId),
    /// The eval-binding namespace of the compilation unit.
    Binding,
}

#[derive(Debug, Clone)]
pub struct LocalNamespace {
    scopes: Vec<Scope>,
    pub(crate) parent: Option<NamespaceParent>,
    pub(crate) access_map: Option<AccessMapId>,
}

impl Default for LocalNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalNamespace {
    pub fn new() -> Self {
        LocalNamespace {
            scopes: vec![Scope::default()],
            parent: None,
            access_map: None,
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn parent(&self) -> Option<NamespaceParent> {
        self.parent
    }

    pub(crate) fn add(&mut self, name: &str, numbered: String, var: Option<VarId>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.aliases.insert(name.to_string(), numbered.clone());
            scope.variables.insert(numbered, var);
        }
    }

    /// Look `name` up from the innermost scope outwards. With `numbered`
    /// set, `name` is a numbered name. Returns the numbered name and the
    /// current version.
    pub fn find(&self, name: &str, numbered: bool) -> Option<(String, Option<VarId>)> {
        for scope in self.scopes.iter().rev() {
            if numbered {
                if let Some(var) = scope.variables.get(name) {
                    return Some((name.to_string(), *var));
                }
            } else if let Some(n) = scope.aliases.get(name) {
                let var = scope.variables.get(n).copied().flatten();
                return Some((n.clone(), var));
            }
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name, false).is_some()
    }

    /// Record `var` as the current version of the numbered name.
    pub(crate) fn set(&mut self, numbered: &str, var: VarId) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.variables.get_mut(numbered) {
                *slot = Some(var);
                return true;
            }
        }
        false
    }

    /// Forget every version; used when a new block starts.
    pub(crate) fn mark_to_create_phi(&mut self) {
        for scope in &mut self.scopes {
            for var in scope.variables.values_mut() {
                *var = None;
            }
        }
    }

    /// Visible source names, innermost scope first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for scope in self.scopes.iter().rev() {
            let mut local: Vec<&str> = scope.aliases.keys().map(String::as_str).collect();
            local.sort_unstable();
            for name in local {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// `x#12` → `x`
pub(crate) fn base_name(numbered: &str) -> &str {
    numbered.rsplit_once('#').map(|(base, _)| base).unwrap_or(numbered)
}

impl SsaProgram {
    /// Namespace valid at the end of `block`: its snapshot once the block is
    /// closed, the form's live namespace while it is current.
    pub(crate) fn block_namespace(&self, block: BlockId) -> &LocalNamespace {
        let b = &self.blocks[block.index()];
        match &b.snapshot {
            Some(ns) => ns,
            None => &self.forms[b.form.index()].namespace,
        }
    }

    pub(crate) fn block_namespace_mut(&mut self, block: BlockId) -> &mut LocalNamespace {
        let form = self.blocks[block.index()].form;
        match &mut self.blocks[block.index()].snapshot {
            Some(ns) => ns,
            None => &mut self.forms[form.index()].namespace,
        }
    }

    /// Declare `name` in the innermost scope of the form's live namespace.
    pub(crate) fn ns_add(&mut self, form: FormId, span: Span, name: &str, var: Option<VarId>) -> CompileResult<String> {
        let n = self.unique_number(span)?;
        let numbered = format!("{}#{}", name, n);
        self.forms[form.index()].namespace.add(name, numbered.clone(), var);
        Ok(numbered)
    }

    /// Whether `name` resolves as a variable here or in any enclosing
    /// namespace.
    pub(crate) fn ns_is_available(&self, form: FormId, name: &str) -> bool {
        let mut ns = &self.forms[form.index()].namespace;
        loop {
            if ns.contains(name) {
                return true;
            }
            match ns.parent {
                Some(NamespaceParent::Form(parent)) => ns = &self.forms[parent.index()].namespace,
                Some(NamespaceParent::Binding) => {
                    return self.binding.as_ref().is_some_and(|b| b.contains(name));
                }
                None => return false,
            }
        }
    }

    /// Current version of `name` at the end of `block`, inserting φ
    /// statements where it is not known yet. `None` if the block's
    /// namespace does not hold the name.
    pub(crate) fn make_phi_function(
        &mut self,
        block: BlockId,
        span: Span,
        name: &str,
        numbered: bool,
    ) -> CompileResult<Option<(String, VarId)>> {
        let Some((n_name, var)) = self.block_namespace(block).find(name, numbered) else {
            return Ok(None);
        };
        let var = match var {
            Some(var) => var,
            None => self.add_phi_function_to_blocks(block, span, &n_name)?,
        };
        Ok(Some((n_name, var)))
    }

    fn add_phi_function_to_blocks(&mut self, block: BlockId, span: Span, n_name: &str) -> CompileResult<VarId> {
        let mut work: Vec<(BlockId, StmtId)> = Vec::new();
        let var = self.add_phi_function(block, span, n_name, &mut work)?;

        while let Some((pred, phi)) = work.pop() {
            let operand = match self.block_namespace(pred).find(n_name, true) {
                None => {
                    return Err(CompileError::OutOfScope {
                        name: base_name(n_name).to_string(),
                        span,
                    })
                }
                Some((_, Some(v))) => v,
                Some((_, None)) => self.add_phi_function(pred, span, n_name, &mut work)?,
            };
            self.add_used(phi, operand);
        }
        Ok(var)
    }

    /// φ for `n_name` at the head of `block`; its operands are queued on
    /// `work` one per predecessor, in predecessor order.
    fn add_phi_function(
        &mut self,
        block: BlockId,
        span: Span,
        n_name: &str,
        work: &mut Vec<(BlockId, StmtId)>,
    ) -> CompileResult<VarId> {
        let form = self.blocks[block.index()].form;
        let stmt = self.new_statement(span, OpCode::Phi, block);
        self.insert_statement(block, stmt, InsertPoint::Head);
        let var = self.new_variable(form, span, Some(n_name))?;
        self.set_declared(stmt, var);
        // visible before the operands resolve, so loops terminate
        self.block_namespace_mut(block).set(n_name, var);
        trace!(block = %self.blocks[block.index()].name, var = n_name, "phi inserted");

        for &pred in self.blocks[block.index()].preds.iter().rev() {
            work.push((pred, stmt));
        }
        Ok(var)
    }

    /// Emit a read of `name` in the form's current block.
    pub(crate) fn ns_read(&mut self, form: FormId, span: Span, name: &str) -> CompileResult<Option<VarId>> {
        let current = self.forms[form.index()].current;
        self.ns_read_at(form, current, InsertPoint::Tail, span, name)
    }

    /// Emit a read of a local `name` into a (possibly closed) block.
    pub(crate) fn ns_read_in_block(&mut self, block: BlockId, span: Span, name: &str) -> CompileResult<Option<VarId>> {
        let form = self.blocks[block.index()].form;
        self.ns_read_at(form, block, InsertPoint::BeforeBranch, span, name)
    }

    fn ns_read_at(
        &mut self,
        form: FormId,
        block: BlockId,
        point: InsertPoint,
        span: Span,
        name: &str,
    ) -> CompileResult<Option<VarId>> {
        if let Some((n_name, var)) = self.make_phi_function(block, span, name, false)? {
            let (stmt, tmp) = self.add_statement_to_block(block, point, span, OpCode::ReadVar, &[var])?;
            self.statements[stmt.index()].name = Some(n_name);
            return Ok(tmp);
        }

        let ns = &self.forms[form.index()].namespace;
        let Some(parent) = ns.parent else {
            return Ok(None);
        };
        let should_share = ns.access_map.is_none();
        let Some(n_name) = self.access_from_child(parent, name, false, should_share, form)? else {
            return Ok(None);
        };
        let (code, stmt_name) = if should_share {
            (OpCode::Read, n_name)
        } else {
            (OpCode::ParentRead, name.to_string())
        };
        let (stmt, var) = self.add_statement_to_block(block, point, span, code, &[])?;
        self.statements[stmt.index()].name = Some(stmt_name);
        Ok(var)
    }

    /// Emit a write of `value` to `name`. Returns false when the name is not
    /// a variable anywhere.
    pub(crate) fn ns_write(&mut self, form: FormId, span: Span, name: &str, value: VarId) -> CompileResult<bool> {
        if let Some((n_name, _)) = self.forms[form.index()].namespace.find(name, false) {
            let current = self.forms[form.index()].current;
            let stmt = self.new_statement(span, OpCode::WriteVar, current);
            self.add_used(stmt, value);
            self.insert_statement(current, stmt, InsertPoint::Tail);
            let var = self.new_variable(form, span, Some(&n_name))?;
            self.set_declared(stmt, var);
            self.statements[stmt.index()].name = Some(n_name.clone());
            self.forms[form.index()].namespace.set(&n_name, var);
            return Ok(true);
        }

        let ns = &self.forms[form.index()].namespace;
        let Some(parent) = ns.parent else {
            return Ok(false);
        };
        let should_share = ns.access_map.is_none();
        let Some(n_name) = self.access_from_child(parent, name, true, should_share, form)? else {
            return Ok(false);
        };
        let (code, stmt_name) = if should_share {
            (OpCode::Write, n_name)
        } else {
            (OpCode::ParentWrite, name.to_string())
        };
        let (stmt, _) = self.add_statement(form, span, code, &[value])?;
        self.statements[stmt.index()].name = Some(stmt_name);
        Ok(true)
    }

    /// Resolve an access to `name` coming from the namespace of `child`.
    ///
    /// A variable reached without crossing an access map is marked shared in
    /// its owning function; otherwise the access is recorded in the access
    /// map of every lazy block on the way. Returns the numbered name.
    fn access_from_child(
        &mut self,
        ns: NamespaceParent,
        name: &str,
        write: bool,
        should_share: bool,
        child: FormId,
    ) -> CompileResult<Option<String>> {
        let form = match ns {
            NamespaceParent::Binding => {
                return Ok(self
                    .binding
                    .as_ref()
                    .and_then(|b| b.find(name, false))
                    .map(|(n_name, _)| n_name));
            }
            NamespaceParent::Form(form) => form,
        };

        if let Some((n_name, _)) = self.forms[form.index()].namespace.find(name, false) {
            if should_share {
                let function = self.forms[form.index()].function;
                self.share_variable(function, &n_name);
            } else {
                self.record_access(child, name, write);
            }
            return Ok(Some(n_name));
        }

        let ns = &self.forms[form.index()].namespace;
        let Some(parent) = ns.parent else {
            return Ok(None);
        };
        let share_further = should_share || ns.access_map.is_none();
        let found = self.access_from_child(parent, name, write, share_further, form)?;
        if found.is_some() && !should_share {
            self.record_access(child, name, write);
        }
        Ok(found)
    }

    fn record_access(&mut self, child: FormId, name: &str, write: bool) {
        if let Some(map) = self.forms[child.index()].namespace.access_map {
            self.access_maps[map.index()].set_used(name, write);
        }
    }
}
