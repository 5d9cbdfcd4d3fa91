//! Compiler orchestration
//!
//! [`Compiler`] owns the [`SsaProgram`] being built. A compilation lowers
//! the root node into a fresh top-level form, then completes the program:
//! pending label jumps are bound, the targets of non-local exits are wired
//! (which may lower finally clauses and queue new jumps, so the two steps
//! repeat until nothing is left), shared variables are promoted and trivial
//! φ statements removed.

pub mod function;
mod labels;
mod passes;

use tracing::{debug, info_span};

use crate::error::CompileResult;
use crate::options::CompileOptions;
use crate::ssa::{FormId, LocalNamespace, NamespaceParent, OpCode, SsaProgram};
use risse_ast::{synth, Node, Span};

pub use function::{CompilerFunction, FunctionGroup};
pub(crate) use labels::LabelScope;

/// Name the class body binds its superclass to.
pub(crate) const SUPER_NAME: &str = "super";

pub struct Compiler {
    pub(crate) program: SsaProgram,
    pub(crate) options: CompileOptions,
    /// Labels of the finally copies being lowered, innermost last.
    pub(crate) label_scopes: Vec<LabelScope>,
    pub(crate) finally_copies: u32,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            program: SsaProgram::new(),
            options,
            label_scopes: Vec::new(),
            finally_copies: 0,
        }
    }

    /// Compile as `eval` does: `names` are variables of the enclosing
    /// binding, visible to the top level as shared variables.
    pub fn with_binding<I, S>(mut self, names: I) -> CompileResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut binding = LocalNamespace::new();
        for name in names {
            let n = self.program.unique_number(Span::default())?;
            let name = name.as_ref();
            binding.add(name, format!("{}#{}", name, n), None);
        }
        self.program.binding = Some(binding);
        Ok(self)
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn program(&self) -> &SsaProgram {
        &self.program
    }

    pub fn into_program(self) -> SsaProgram {
        self.program
    }

    /// Lower a top-level program and complete it. Returns the top-level
    /// form.
    pub fn compile(&mut self, root: &Node) -> CompileResult<FormId> {
        let _span = info_span!("compile", node = root.type_name()).entered();
        let span = root.span;

        let group = self.program.new_group("toplevel".to_string(), None);
        let function = self.program.new_function(group, None);
        let form = self
            .program
            .create_form(function, None, "toplevel".to_string(), false, true, span)?;
        if self.program.binding.is_some() {
            let ns = &mut self.program.forms[form.index()].namespace;
            ns.parent = Some(NamespaceParent::Binding);
            ns.push();
        }
        self.program.roots.push(form);

        let value = self.generate(form, root)?;
        let need_result = self.options.need_result || self.options.is_expression;
        self.program
            .add_final_return(form, span, if need_result { value } else { None })?;

        self.complete()?;
        self.finish()?;
        Ok(form)
    }

    /// Compile a class body on its own, as the function group of class
    /// `name`. The body receives its superclass as parameter 0.
    pub fn compile_class(&mut self, body: &Node, name: Option<&str>) -> CompileResult<FormId> {
        let _span = info_span!("compile_class", name = name.unwrap_or("anonymous")).entered();
        let form = self.lower_class_body(body.span, body, name)?;
        self.program.roots.push(form);
        self.complete()?;
        self.finish()?;
        Ok(form)
    }

    pub(crate) fn lower_class_body(&mut self, span: Span, body: &Node, name: Option<&str>) -> CompileResult<FormId> {
        let n = self.program.unique_number(span)?;
        let group_name = format!("class {} {}", name.unwrap_or("anonymous"), n);
        let group = self.program.new_group(group_name.clone(), name.map(str::to_string));
        let function = self.program.new_function(group, None);
        let form = self.program.create_form(function, None, group_name, false, true, span)?;

        let (stmt, superclass) = self.program.add_statement(form, span, OpCode::AssignParam, &[])?;
        self.program.statements[stmt.index()].index = Some(0);
        if let Some(superclass) = superclass {
            self.program.ns_add(form, span, SUPER_NAME, None)?;
            self.program.ns_write(form, span, SUPER_NAME, superclass)?;
        }

        if !synth::declares_constructor(body) {
            self.generate(form, &synth::default_constructor(span))?;
        }
        self.generate(form, body)?;
        self.program.add_final_return(form, span, None)?;
        Ok(form)
    }

    /// Bind labels and wire non-local exits until neither has work left.
    pub fn complete(&mut self) -> CompileResult<()> {
        let mut rounds = 0;
        loop {
            self.bind_all_labels()?;
            rounds += 1;
            if !self.add_pending_catch_targets()? {
                break;
            }
        }
        debug!(rounds, "program completed");
        Ok(())
    }

    fn finish(&mut self) -> CompileResult<()> {
        self.program.promote_shared_variables();
        self.program.eliminate_trivial_phis();
        if self.options.verify {
            self.program.verify()?;
        }
        Ok(())
    }
}

/// Compile `root` with `options` and hand back the finished program.
pub fn compile(root: &Node, options: &CompileOptions) -> CompileResult<SsaProgram> {
    let mut compiler = Compiler::new(options.clone());
    compiler.compile(root)?;
    Ok(compiler.into_program())
}
