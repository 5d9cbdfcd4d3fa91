//! Statement lowering

use crate::compiler::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::{FormId, OpCode, VarId};
use risse_ast::{Context, ContextKind, Node, Span, VarDecl};

impl Compiler {
    /// A statement list. Yields the last evaluated value.
    pub(crate) fn lower_context(&mut self, form: FormId, span: Span, ctx: &Context) -> CompileResult<Option<VarId>> {
        let scoped = ctx.kind == ContextKind::Block;
        if scoped {
            self.program.forms[form.index()].namespace.push();
        }
        for node in &ctx.body {
            self.generate(form, node)?;
        }
        if scoped {
            self.program.forms[form.index()].namespace.pop();
        }
        self.program.read_last_value(form, span).map(Some)
    }

    pub(crate) fn lower_expr_stmt(&mut self, form: FormId, expr: Option<&Node>) -> CompileResult<Option<VarId>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        let Some(value) = self.generate(form, expr)? else {
            return Ok(None);
        };
        self.program.write_last_value(form, expr.span, value)?;
        Ok(Some(value))
    }

    pub(crate) fn lower_var_decl(&mut self, form: FormId, decl: &VarDecl) -> CompileResult<Option<VarId>> {
        for pair in &decl.pairs {
            let value = match &pair.init {
                Some(init) => self.generate_value(form, init)?,
                None => self.void(form, pair.span)?,
            };
            self.program.ns_add(form, pair.span, &pair.name, None)?;
            self.program.ns_write(form, pair.span, &pair.name, value)?;
        }
        Ok(None)
    }

    pub(crate) fn lower_return(&mut self, form: FormId, span: Span, value: Option<&Node>) -> CompileResult<Option<VarId>> {
        let value = match value {
            Some(node) => self.generate_value(form, node)?,
            None => self.void(form, span)?,
        };
        self.program.add_return_statement(form, span, value)?;
        Ok(None)
    }

    /// `throw;` inside a catch clause rethrows the caught value.
    pub(crate) fn lower_throw(&mut self, form: FormId, span: Span, value: Option<&Node>) -> CompileResult<Option<VarId>> {
        let value = match (value, self.program.forms[form.index()].catch_value) {
            (Some(node), _) => self.generate_value(form, node)?,
            (None, Some(caught)) => caught,
            (None, None) => self.void(form, span)?,
        };
        self.program.add_statement(form, span, OpCode::Throw, &[value])?;
        self.program.create_new_block(form, "disconnected_by_throw", span)?;
        Ok(None)
    }

    pub(crate) fn lower_break(&mut self, form: FormId, span: Span, value: Option<&Node>) -> CompileResult<Option<VarId>> {
        let value = match value {
            Some(node) => Some(self.generate_value(form, node)?),
            None => None,
        };
        self.program.add_break_statement(form, span, value)?;
        Ok(None)
    }

    pub(crate) fn lower_continue(&mut self, form: FormId, span: Span, value: Option<&Node>) -> CompileResult<Option<VarId>> {
        let value = match value {
            Some(node) => Some(self.generate_value(form, node)?),
            None => None,
        };
        self.program.add_continue_statement(form, span, value)?;
        Ok(None)
    }

    pub(crate) fn lower_label(&mut self, form: FormId, span: Span, name: &str) -> CompileResult<Option<VarId>> {
        let (jump, _) = self.program.add_statement(form, span, OpCode::Jump, &[])?;
        let block = self.program.create_new_block(form, name, span)?;
        self.program.set_target(jump, 0, block, span)?;
        let function = self.program.forms[form.index()].function;
        let label = self.scoped_label(name);
        self.program
            .add_label_map(function, &label, block, span)
            .map_err(|e| match e {
                CompileError::DuplicateLabel { span, .. } => CompileError::DuplicateLabel {
                    label: name.to_string(),
                    span,
                },
                e => e,
            })?;
        Ok(None)
    }

    pub(crate) fn lower_goto(&mut self, form: FormId, span: Span, name: &str) -> CompileResult<Option<VarId>> {
        let function = self.program.forms[form.index()].function;
        let current = self.program.forms[form.index()].current;
        let label = self.scoped_label(name);
        self.program.add_pending_label_jump(function, current, &label, span);
        self.program.create_new_block(form, "disconnected_by_goto", span)?;
        Ok(None)
    }
}
