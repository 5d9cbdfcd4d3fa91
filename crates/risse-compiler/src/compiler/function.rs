//! Functions and function groups
//!
//! A function is one runtime frame. Its forms are the function body plus
//! every try/synchronized body that runs in the same frame. Functions
//! compiled together (a top level and everything nested in it, or one class
//! body) form a group.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::ssa::{BlockId, FormId, FunctionGroupId, FunctionId, SsaProgram};
use risse_ast::Span;

/// A `goto` (or bound break/continue) waiting for its label.
#[derive(Debug, Clone)]
pub(crate) struct PendingJump {
    pub(crate) source: BlockId,
    pub(crate) label: String,
    pub(crate) span: Span,
}

#[derive(Debug, Clone)]
pub struct CompilerFunction {
    pub(crate) group: FunctionGroupId,
    pub(crate) parent: Option<FunctionId>,
    pub(crate) nest_level: u32,
    pub(crate) forms: Vec<FormId>,
    pub(crate) labels: FxHashMap<String, BlockId>,
    pub(crate) pending_jumps: Vec<PendingJump>,
    /// Numbered names captured by nested functions.
    pub(crate) shared: BTreeSet<String>,
}

impl CompilerFunction {
    pub fn group(&self) -> FunctionGroupId {
        self.group
    }

    pub fn parent(&self) -> Option<FunctionId> {
        self.parent
    }

    pub fn nest_level(&self) -> u32 {
        self.nest_level
    }

    pub fn forms(&self) -> &[FormId] {
        &self.forms
    }

    pub fn shared_variables(&self) -> impl Iterator<Item = &str> {
        self.shared.iter().map(String::as_str)
    }

    pub fn label(&self, name: &str) -> Option<BlockId> {
        self.labels.get(name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionGroup {
    pub(crate) name: String,
    pub(crate) class_name: Option<String>,
    pub(crate) functions: Vec<FunctionId>,
    next_try_id: u32,
}

impl FunctionGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }
}

impl SsaProgram {
    pub(crate) fn new_group(&mut self, name: String, class_name: Option<String>) -> FunctionGroupId {
        let id = FunctionGroupId::new(self.groups.len() as u32);
        self.groups.push(FunctionGroup {
            name,
            class_name,
            functions: Vec::new(),
            next_try_id: 0,
        });
        id
    }

    pub(crate) fn new_function(&mut self, group: FunctionGroupId, parent: Option<FunctionId>) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        let nest_level = parent.map_or(0, |p| self.functions[p.index()].nest_level + 1);
        self.functions.push(CompilerFunction {
            group,
            parent,
            nest_level,
            forms: Vec::new(),
            labels: FxHashMap::default(),
            pending_jumps: Vec::new(),
            shared: BTreeSet::new(),
        });
        self.groups[group.index()].functions.push(id);
        id
    }

    /// A fresh try id, unique within the group of `form`.
    pub(crate) fn new_try_id(&mut self, form: FormId) -> u32 {
        let function = self.forms[form.index()].function;
        let group = &mut self.groups[self.functions[function.index()].group.index()];
        let id = group.next_try_id;
        group.next_try_id += 1;
        id
    }

    pub(crate) fn share_variable(&mut self, function: FunctionId, numbered: &str) {
        if self.functions[function.index()].shared.insert(numbered.to_string()) {
            debug!(%function, variable = numbered, "variable shared");
        }
    }

    pub(crate) fn add_label_map(&mut self, function: FunctionId, label: &str, block: BlockId, span: Span) -> CompileResult<()> {
        let labels = &mut self.functions[function.index()].labels;
        if labels.contains_key(label) {
            return Err(CompileError::DuplicateLabel {
                label: label.to_string(),
                span,
            });
        }
        labels.insert(label.to_string(), block);
        Ok(())
    }

    pub(crate) fn add_pending_label_jump(&mut self, function: FunctionId, source: BlockId, label: &str, span: Span) {
        self.functions[function.index()].pending_jumps.push(PendingJump {
            source,
            label: label.to_string(),
            span,
        });
    }

    /// Look a label up from `form` outwards, through callback and try
    /// bodies but not past the enclosing real function.
    pub(crate) fn lookup_label(&self, form: FormId, label: &str) -> Option<BlockId> {
        let mut current = form;
        loop {
            let f = &self.forms[current.index()];
            if let Some(block) = self.functions[f.function.index()].labels.get(label) {
                return Some(*block);
            }
            if f.can_return {
                return None;
            }
            current = f.parent?;
        }
    }
}
