//! Function, property and class declarations

use super::expr::COLLAPSE_NAME;
use crate::compiler::Compiler;
use crate::error::{CompileError, CompileResult};
use crate::ssa::{FormId, OpCode, VarId};
use risse_ast::{synth, ClassDecl, DeclAttribute, FuncDecl, PropDecl, Span, Value};

impl Compiler {
    /// Bind the formal parameters of `decl` in the function form `child`.
    ///
    /// A parameter with a default value is replaced by the default when the
    /// caller passed void: `param === void ? init : param`.
    pub(crate) fn lower_params(&mut self, child: FormId, decl: &FuncDecl) -> CompileResult<()> {
        if decl.args.len() > self.options.max_arguments {
            let span = decl.args.last().map_or(decl.body.span, |a| a.span);
            return Err(CompileError::TooManyArguments {
                what: "function arguments",
                limit: self.options.max_arguments,
                span,
            });
        }

        for (index, arg) in decl.args.iter().enumerate() {
            let span = arg.span;
            let (stmt, param) = self.program.add_statement(child, span, OpCode::AssignParam, &[])?;
            let param = param.ok_or_else(|| CompileError::internal("AssignParam declares no value", span))?;
            let s = &mut self.program.statements[stmt.index()];
            s.index = Some(index as u32);
            if arg.collapse {
                s.name = Some(COLLAPSE_NAME.to_string());
            }

            let value = match &arg.init {
                Some(init) => {
                    let void = self.void(child, span)?;
                    let is_void = self
                        .program
                        .add_variable_with_statement(child, span, OpCode::DiscEqual, &[param, void])?;
                    let (branch, _) = self.program.add_statement(child, span, OpCode::Branch, &[is_void])?;
                    let init_block = self.program.create_new_block(child, "param_init", span)?;
                    self.program.set_target(branch, 0, init_block, span)?;
                    let init_value = self.generate_value(child, init)?;
                    let (jump, _) = self.program.add_statement(child, span, OpCode::Jump, &[])?;

                    let subst_block = self.program.create_new_block(child, "param_subst", span)?;
                    self.program.set_target(branch, 1, subst_block, span)?;
                    self.program.set_target(jump, 0, subst_block, span)?;
                    self.program.add_explicit_phi(child, span, &[param, init_value])?
                }
                None => param,
            };

            let name = if arg.collapse && arg.name.is_empty() {
                COLLAPSE_NAME
            } else {
                arg.name.as_str()
            };
            self.program.ns_add(child, span, name, None)?;
            self.program.ns_write(child, span, name, value)?;
        }
        Ok(())
    }

    pub(crate) fn lower_func_decl(&mut self, form: FormId, span: Span, decl: &FuncDecl) -> CompileResult<VarId> {
        let base = match &decl.name {
            Some(name) => format!("function {}", name),
            None => "anonymous function".to_string(),
        };
        let (child, closure) = self.program.create_lazy_block(form, span, &base, true, None)?;
        self.lower_params(child, decl)?;
        self.generate(child, &decl.body)?;
        self.program.add_final_return(child, decl.body.end_position(), None)?;

        if let Some(name) = &decl.name {
            self.store_member_on_this(form, span, name, closure, decl.attribute)?;
        }
        Ok(closure)
    }

    /// `property name { getter { ... } setter (v) { ... } }`
    pub(crate) fn lower_prop_decl(&mut self, form: FormId, span: Span, decl: &PropDecl) -> CompileResult<VarId> {
        let getter = match &decl.getter {
            Some(body) => {
                let base = format!("getter {}", decl.name);
                let (child, closure) = self.program.create_lazy_block(form, span, &base, true, None)?;
                self.generate(child, body)?;
                self.program.add_final_return(child, body.end_position(), None)?;
                closure
            }
            None => self.void(form, span)?,
        };
        let setter = match &decl.setter {
            Some(setter) => {
                let base = format!("setter {}", decl.name);
                let (child, closure) = self.program.create_lazy_block(form, span, &base, true, None)?;
                let (stmt, param) = self.program.add_statement(child, span, OpCode::AssignParam, &[])?;
                self.program.statements[stmt.index()].index = Some(0);
                let param = param.ok_or_else(|| CompileError::internal("AssignParam declares no value", span))?;
                self.program.ns_add(child, span, &setter.arg, None)?;
                self.program.ns_write(child, span, &setter.arg, param)?;
                self.generate(child, &setter.body)?;
                self.program.add_final_return(child, setter.body.end_position(), None)?;
                closure
            }
            None => self.void(form, span)?,
        };

        let property = self
            .program
            .add_variable_with_statement(form, span, OpCode::DefineProperty, &[getter, setter])?;
        self.store_member_on_this(form, span, &decl.name, property, decl.attribute)?;
        Ok(property)
    }

    /// The class body becomes a function group of its own; the enclosing
    /// form only defines the class from its superclass.
    pub(crate) fn lower_class_decl(&mut self, form: FormId, span: Span, decl: &ClassDecl) -> CompileResult<VarId> {
        let superclass = match &decl.superclass {
            Some(node) => self.generate_value(form, node)?,
            None => self.generate_value(form, &synth::default_superclass(span))?,
        };
        let body = self.lower_class_body(span, &decl.body, decl.name.as_deref())?;
        self.program.roots.push(body);
        let group_name = self.program.forms[body.index()].name.clone();

        let (stmt, class) = self.program.add_statement(form, span, OpCode::DefineClass, &[superclass])?;
        let s = &mut self.program.statements[stmt.index()];
        s.name = Some(group_name);
        s.defined_form = Some(body);
        let class = class.ok_or_else(|| CompileError::internal("DefineClass declares no value", span))?;

        if let Some(name) = &decl.name {
            self.store_member_on_this(form, span, name, class, decl.attribute)?;
        }
        Ok(class)
    }

    /// `this.name = value`, carrying the declaration attribute.
    fn store_member_on_this(
        &mut self,
        form: FormId,
        span: Span,
        name: &str,
        value: VarId,
        attribute: DeclAttribute,
    ) -> CompileResult<()> {
        let this = self.program.add_variable_with_statement(form, span, OpCode::AssignThis, &[])?;
        let key = self.program.add_constant(form, span, Value::String(name.to_string()))?;
        let (stmt, _) = self.program.add_statement(form, span, OpCode::DSetAttrib, &[this, key, value])?;
        self.program.statements[stmt.index()].attribute = Some(attribute);
        Ok(())
    }
}
