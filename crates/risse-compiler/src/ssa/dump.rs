//! Human-readable SSA listings and a JSON summary for tooling

use serde::Serialize;
use std::fmt::Write;

use super::ids::{BlockId, FormId, StmtId, VarId};
use super::opcode::OpCode;
use super::SsaProgram;

impl SsaProgram {
    /// Every form, in creation order.
    pub fn dump(&self) -> String {
        let mut output = String::new();
        for form in self.forms() {
            output.push_str(&self.dump_form(form));
            writeln!(output).unwrap();
        }
        output
    }

    pub fn dump_form(&self, form: FormId) -> String {
        let f = self.form(form);
        let mut output = String::new();
        write!(output, "; form {} ({})", f.name, f.function).unwrap();
        if let Some(parent) = f.parent {
            write!(output, " parent: {}", self.form(parent).name).unwrap();
        }
        writeln!(output).unwrap();
        for &block in &f.blocks {
            output.push_str(&self.dump_block(block));
        }
        output
    }

    pub fn dump_block(&self, block: BlockId) -> String {
        let b = self.block(block);
        let mut output = String::new();
        write!(output, "*{}", b.name).unwrap();
        if !b.preds.is_empty() {
            let preds: Vec<String> = b.preds.iter().map(|p| format!("*{}", self.block(*p).name)).collect();
            write!(output, " // pred: {}", preds.join(", ")).unwrap();
        }
        writeln!(output).unwrap();
        for &stmt in &b.statements {
            writeln!(output, "{}", self.dump_statement(stmt)).unwrap();
        }
        output
    }

    fn var_name(&self, var: VarId) -> String {
        self.variable(var).qualified_name()
    }

    fn target_name(&self, target: Option<BlockId>) -> String {
        match target {
            Some(block) => format!("*{}", self.block(block).name),
            None => "*?".to_string(),
        }
    }

    pub fn dump_statement(&self, stmt: StmtId) -> String {
        let s = self.statement(stmt);
        let used: Vec<String> = s.used.iter().map(|v| self.var_name(*v)).collect();
        let decl = s.declared.map(|v| format!("{} = ", self.var_name(v))).unwrap_or_default();

        match s.code {
            OpCode::Phi => format!("{}PHI({})", decl, used.join(", ")),
            OpCode::Jump => format!("goto {}", self.target_name(s.targets.first().copied().flatten())),
            OpCode::Branch => format!(
                "if {} then {} else {}",
                used.first().map(String::as_str).unwrap_or("?"),
                self.target_name(s.targets.first().copied().flatten()),
                self.target_name(s.targets.get(1).copied().flatten()),
            ),
            OpCode::CatchBranch => {
                let mut line = format!("catch branch {}", used.first().map(String::as_str).unwrap_or("?"));
                for (i, target) in s.targets.iter().enumerate() {
                    let label = match i {
                        0 => "exit".to_string(),
                        1 => "catch".to_string(),
                        n => n.to_string(),
                    };
                    write!(line, " {}:{}", label, self.target_name(*target)).unwrap();
                }
                line
            }
            OpCode::AssignConstant => {
                let value = s.value.as_ref().map(|v| v.to_string()).unwrap_or_default();
                format!("{}{}", decl, value)
            }
            _ => {
                let mut args: Vec<String> = Vec::new();
                if let Some(name) = &s.name {
                    args.push(format!("{:?}", name));
                }
                if let Some(index) = s.index {
                    args.push(index.to_string());
                }
                let rest = used.iter().skip(1).enumerate().map(|(i, u)| match s.call {
                    Some(flags) if i < 32 && flags.expanded & (1 << i) != 0 => format!("*{}", u),
                    _ => u.clone(),
                });
                args.extend(rest);
                if s.call.is_some_and(|flags| flags.omitted) {
                    args.push("...".to_string());
                }
                let receiver = used.first().map(|u| format!("{}.", u)).unwrap_or_default();
                let mut line = format!("{}{}{}({})", decl, receiver, s.code.mnemonic(), args.join(", "));
                if let Some(try_id) = s.try_id {
                    write!(line, " try:{}", try_id).unwrap();
                }
                if let Some(attribute) = &s.attribute {
                    if !attribute.is_default() {
                        write!(line, " [{}]", attribute).unwrap();
                    }
                }
                line
            }
        }
    }

    pub fn summary(&self) -> ProgramSummary {
        let forms = self
            .forms()
            .map(|id| {
                let f = self.form(id);
                let function = self.function(f.function);
                FormSummary {
                    id: id.as_u32(),
                    name: f.name.clone(),
                    function: f.function.as_u32(),
                    parent: f.parent.map(|p| p.as_u32()),
                    nest_level: function.nest_level,
                    can_return: f.can_return,
                    uses_parent_frame: f.use_parent_frame,
                    is_callback: f.is_callback,
                    blocks: f.blocks.len(),
                    reachable_blocks: self.reachable_blocks(id).len(),
                    statements: f.blocks.iter().map(|b| self.block(*b).statements.len()).sum(),
                    shared_variables: function.shared.iter().cloned().collect(),
                }
            })
            .collect();
        ProgramSummary {
            forms,
            functions: self.functions.len(),
            groups: self.groups.iter().map(|g| g.name.clone()).collect(),
            statements: self.live_statement_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramSummary {
    pub forms: Vec<FormSummary>,
    pub functions: usize,
    pub groups: Vec<String>,
    pub statements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSummary {
    pub id: u32,
    pub name: String,
    pub function: u32,
    pub parent: Option<u32>,
    pub nest_level: u32,
    pub can_return: bool,
    pub uses_parent_frame: bool,
    pub is_callback: bool,
    pub blocks: usize,
    pub reachable_blocks: usize,
    pub statements: usize,
    pub shared_variables: Vec<String>,
}
