//! Expression lowering

use super::{PrepareMode, Prepared};
use crate::compiler::{Compiler, SUPER_NAME};
use crate::error::{CompileError, CompileResult};
use crate::ssa::{CallFlags, FormId, OpCode, VarId};
use risse_ast::{Binary, BinaryOp, DictPair, Factor, FuncCall, Node, NodeKind, RegExp, Span, Unary, UnaryOp, Value};

/// Name the anonymous rest parameter `*` is bound to.
pub(crate) const COLLAPSE_NAME: &str = "*";

impl Compiler {
    pub(crate) fn lower_factor(&mut self, form: FormId, span: Span, factor: &Factor) -> CompileResult<VarId> {
        match factor {
            Factor::Constant(value) => self.program.add_constant(form, span, value.clone()),
            Factor::This => self.program.add_variable_with_statement(form, span, OpCode::AssignThis, &[]),
            Factor::Global => self.program.add_variable_with_statement(form, span, OpCode::AssignGlobal, &[]),
            Factor::Super => self
                .program
                .ns_read(form, span, SUPER_NAME)?
                .ok_or(CompileError::SuperUnavailable { span }),
        }
    }

    pub(crate) fn lower_unary(&mut self, form: FormId, span: Span, unary: &Unary) -> CompileResult<VarId> {
        match unary.op {
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let prepared = self.prepare(form, &unary.operand, PrepareMode::ReadWrite)?;
                let original = match self.read(form, &unary.operand, &prepared)? {
                    Some(value) => value,
                    None => self.void(form, span)?,
                };
                let one = self.program.add_constant(form, span, Value::Integer(1))?;
                let code = match unary.op {
                    UnaryOp::PreInc | UnaryOp::PostInc => OpCode::Add,
                    _ => OpCode::Sub,
                };
                let updated = self.program.add_variable_with_statement(form, span, code, &[original, one])?;
                if !self.write(form, &unary.operand, &prepared, updated)? {
                    return Err(CompileError::not_assignable(
                        "against increment/decrement operator",
                        unary.operand.span,
                    ));
                }
                Ok(match unary.op {
                    UnaryOp::PreInc | UnaryOp::PreDec => updated,
                    _ => original,
                })
            }
            UnaryOp::Delete => {
                let NodeKind::MemberSel(_) = &unary.operand.kind else {
                    return Err(CompileError::NotDeletable { span });
                };
                match self.prepare(form, &unary.operand, PrepareMode::Read)? {
                    Prepared::Member {
                        object,
                        member,
                        indirect,
                    } => {
                        let code = if indirect { OpCode::IDelete } else { OpCode::DDelete };
                        self.program.add_variable_with_statement(form, span, code, &[object, member])
                    }
                    _ => Err(CompileError::NotDeletable { span }),
                }
            }
            op => {
                let code = OpCode::from_unary(op)
                    .ok_or_else(|| CompileError::internal(format!("no opcode for '{}'", op.as_str()), span))?;
                let operand = self.generate_value(form, &unary.operand)?;
                self.program.add_variable_with_statement(form, span, code, &[operand])
            }
        }
    }

    pub(crate) fn lower_binary(&mut self, form: FormId, span: Span, binary: &Binary) -> CompileResult<VarId> {
        let (lhs, rhs) = (&*binary.lhs, &*binary.rhs);
        match binary.op {
            BinaryOp::Assign => {
                let value = self.generate_value(form, rhs)?;
                if !self.generate_write(form, lhs, value)? {
                    return Err(CompileError::not_assignable("at left side of '='", lhs.span));
                }
                Ok(value)
            }
            BinaryOp::Comma => {
                self.generate(form, lhs)?;
                self.generate_value(form, rhs)
            }
            BinaryOp::Swap => {
                let left = self.prepare(form, lhs, PrepareMode::ReadWrite)?;
                let right = self.prepare(form, rhs, PrepareMode::ReadWrite)?;
                let left_value = self.read_prepared(form, lhs, &left)?;
                let right_value = self.read_prepared(form, rhs, &right)?;
                if !self.write(form, lhs, &left, right_value)? {
                    return Err(CompileError::not_assignable("at left side of '<->'", lhs.span));
                }
                if !self.write(form, rhs, &right, left_value)? {
                    return Err(CompileError::not_assignable("at right side of '<->'", rhs.span));
                }
                Ok(right_value)
            }
            BinaryOp::LogAnd | BinaryOp::LogOr => self.lower_short_circuit(form, span, binary.op, lhs, rhs),
            BinaryOp::AssignLogAnd | BinaryOp::AssignLogOr => {
                let prepared = self.prepare(form, lhs, PrepareMode::ReadWrite)?;
                let left_value = self.read_prepared(form, lhs, &prepared)?;
                let op = if binary.op == BinaryOp::AssignLogAnd {
                    BinaryOp::LogAnd
                } else {
                    BinaryOp::LogOr
                };
                let result = self.lower_short_circuit_from(form, span, op, left_value, rhs)?;
                if !self.write(form, lhs, &prepared, result)? {
                    return Err(CompileError::not_assignable(
                        format!("at left side of '{}'", binary.op.as_str()),
                        lhs.span,
                    ));
                }
                Ok(result)
            }
            op => {
                if let Some(base) = op.compound_base() {
                    let code = OpCode::from_binary(base)
                        .ok_or_else(|| CompileError::internal(format!("no opcode for '{}'", base.as_str()), span))?;
                    let prepared = self.prepare(form, lhs, PrepareMode::ReadWrite)?;
                    let left_value = self.read_prepared(form, lhs, &prepared)?;
                    let right_value = self.generate_value(form, rhs)?;
                    let result = self
                        .program
                        .add_variable_with_statement(form, span, code, &[left_value, right_value])?;
                    if !self.write(form, lhs, &prepared, result)? {
                        return Err(CompileError::not_assignable(
                            format!("at left side of '{}'", op.as_str()),
                            lhs.span,
                        ));
                    }
                    return Ok(result);
                }
                let code = OpCode::from_binary(op)
                    .ok_or_else(|| CompileError::internal(format!("no opcode for '{}'", op.as_str()), span))?;
                let left_value = self.generate_value(form, lhs)?;
                let right_value = self.generate_value(form, rhs)?;
                self.program
                    .add_variable_with_statement(form, span, code, &[left_value, right_value])
            }
        }
    }

    fn read_prepared(&mut self, form: FormId, node: &Node, prepared: &Prepared) -> CompileResult<VarId> {
        match self.read(form, node, prepared)? {
            Some(value) => Ok(value),
            None => self.void(form, node.span),
        }
    }

    /// `new Array`, reserved to its length, filled by index.
    pub(crate) fn lower_array(&mut self, form: FormId, span: Span, items: &[Option<Node>]) -> CompileResult<VarId> {
        let array = self.program.add_variable_with_statement(form, span, OpCode::AssignNewArray, &[])?;
        if items.is_empty() {
            return Ok(array);
        }
        let reserve = self.program.add_constant(form, span, Value::String("reserve".to_string()))?;
        let method = self.program.add_variable_with_statement(form, span, OpCode::DGet, &[array, reserve])?;
        let length = self.program.add_constant(form, span, Value::Integer(items.len() as i64))?;
        let (call, _) = self.program.add_statement(form, span, OpCode::FuncCall, &[method, length])?;
        self.program.statements[call.index()].call = Some(CallFlags::default());

        for (index, item) in items.iter().enumerate() {
            let value = match item {
                Some(item) => self.generate_value(form, item)?,
                None => self.void(form, span)?,
            };
            let key = self.program.add_constant(form, span, Value::Integer(index as i64))?;
            self.program.add_statement(form, span, OpCode::ISet, &[array, key, value])?;
        }
        Ok(array)
    }

    pub(crate) fn lower_dict(&mut self, form: FormId, span: Span, pairs: &[DictPair]) -> CompileResult<VarId> {
        let dict = self.program.add_variable_with_statement(form, span, OpCode::AssignNewDict, &[])?;
        for pair in pairs {
            let key = self.generate_value(form, &pair.key)?;
            let value = self.generate_value(form, &pair.value)?;
            self.program.add_statement(form, span, OpCode::ISet, &[dict, key, value])?;
        }
        Ok(dict)
    }

    pub(crate) fn lower_regexp(&mut self, form: FormId, span: Span, regexp: &RegExp) -> CompileResult<VarId> {
        let pattern = self.program.add_constant(form, span, Value::String(regexp.pattern.clone()))?;
        let flags = self.program.add_constant(form, span, Value::String(regexp.flags.clone()))?;
        self.program
            .add_variable_with_statement(form, span, OpCode::AssignNewRegExp, &[pattern, flags])
    }

    /// `[a, , b] = value` assigns `value[0]` and `value[2]`.
    pub(crate) fn destructure_array(
        &mut self,
        form: FormId,
        span: Span,
        items: &[Option<Node>],
        value: VarId,
    ) -> CompileResult<()> {
        for (index, item) in items.iter().enumerate() {
            let Some(item) = item else { continue };
            let key = self.program.add_constant(form, span, Value::Integer(index as i64))?;
            let element = self.program.add_variable_with_statement(form, span, OpCode::IGet, &[value, key])?;
            if !self.generate_write(form, item, element)? {
                return Err(CompileError::not_assignable(format!("at array index {}", index), item.span));
            }
        }
        Ok(())
    }

    /// `%[k: a] = value` assigns `value[k]` to `a`.
    pub(crate) fn destructure_dict(&mut self, form: FormId, span: Span, pairs: &[DictPair], value: VarId) -> CompileResult<()> {
        for (index, pair) in pairs.iter().enumerate() {
            let key = self.generate_value(form, &pair.key)?;
            let element = self.program.add_variable_with_statement(form, span, OpCode::IGet, &[value, key])?;
            if !self.generate_write(form, &pair.value, element)? {
                return Err(CompileError::not_assignable(
                    format!("at value of dictionary element index {}", index),
                    pair.value.span,
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn lower_call(&mut self, form: FormId, span: Span, call: &FuncCall) -> CompileResult<Option<VarId>> {
        // expanded arguments are flagged in a 32-bit mask
        let max_arguments = self.options.max_arguments.min(u32::BITS as usize);
        if call.args.len() > max_arguments {
            return Err(CompileError::TooManyArguments {
                what: "function arguments",
                limit: max_arguments,
                span,
            });
        }
        if call.blocks.len() > self.options.max_block_arguments {
            return Err(CompileError::TooManyArguments {
                what: "block arguments",
                limit: self.options.max_block_arguments,
                span,
            });
        }

        let callee = self.generate_value(form, &call.callee)?;
        let mut used = vec![callee];
        let mut flags = CallFlags {
            omitted: call.omit,
            expanded: 0,
            block_count: call.blocks.len() as u32,
            create_new: call.create_new,
        };
        for (index, arg) in call.args.iter().enumerate() {
            let value = match (&arg.value, arg.expand) {
                (Some(value), _) => self.generate_value(form, value)?,
                (None, false) => self.void(form, arg.span)?,
                (None, true) => self
                    .program
                    .ns_read(form, arg.span, COLLAPSE_NAME)?
                    .ok_or(CompileError::NoCollapsedArguments { span: arg.span })?,
            };
            if arg.expand {
                flags.expanded |= 1 << index;
            }
            used.push(value);
        }

        if call.blocks.is_empty() {
            let code = if call.create_new { OpCode::New } else { OpCode::FuncCall };
            let (stmt, value) = self.program.add_statement(form, span, code, &used)?;
            self.program.statements[stmt.index()].call = Some(flags);
            return Ok(value);
        }

        // `break` inside a callback leaves the whole call
        let try_id = self.program.new_try_id(form);
        let info = self.program.new_jump_info(span, true, true)?;
        let saved = self.program.forms[form.index()].break_info.replace(info);

        for block in &call.blocks {
            let closure = self.lower_callback(form, block, try_id)?;
            used.push(closure);
        }
        let (stmt, result) = self.program.add_statement(form, span, OpCode::FuncCallBlock, &used)?;
        let s = &mut self.program.statements[stmt.index()];
        s.call = Some(flags);
        s.try_id = Some(try_id);
        let result = result.ok_or_else(|| CompileError::internal("FuncCallBlock declares no value", span))?;
        self.emit_catch_dispatch(form, span, try_id, result, &[], None)?;

        let info = std::mem::replace(&mut self.program.forms[form.index()].break_info, saved);
        if let Some(info) = info {
            let exit = self.program.forms[form.index()].current;
            self.program.bind_jump_info(form, info, exit, span)?;
        }
        self.program.read_last_value(form, span).map(Some)
    }

    /// A callback block: a closure that cannot return by itself. `continue`
    /// leaves the block with a value, `break` and `return` leave through the
    /// call's catch branch.
    fn lower_callback(&mut self, form: FormId, node: &Node, try_id: u32) -> CompileResult<VarId> {
        let span = node.span;
        let NodeKind::FuncDecl(decl) = &node.kind else {
            return Err(CompileError::internal("callback block is not a function", span));
        };
        let (child, closure) = self.program.create_lazy_block(form, span, "callback block", true, None)?;
        {
            let c = &mut self.program.forms[child.index()];
            c.can_return = false;
            c.is_callback = true;
            c.try_id = Some(try_id);
        }
        let info = self.program.new_jump_info(span, true, true)?;
        self.program.forms[child.index()].continue_info = Some(info);

        self.lower_params(child, decl)?;
        let value = self.generate(child, &decl.body)?;
        self.program.add_final_return(child, span, value)?;

        // a `continue` from a nested try lands here with its value in `_`
        let info = self.program.forms[child.index()].continue_info.take();
        let landing = self.program.create_new_block(child, "block_continue", span)?;
        if let Some(info) = info {
            self.program.bind_jump_info(child, info, landing, span)?;
        }
        let value = self.program.read_last_value(child, span)?;
        self.program.add_statement(child, span, OpCode::Return, &[value])?;
        Ok(closure)
    }
}
