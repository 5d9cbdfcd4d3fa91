//! `risse ssa`: lower an AST and print the SSA dump or a JSON summary.

use clap::ValueEnum;
use risse_compiler::SsaProgram;

use super::session::{lower, CompileArgs};
use crate::output::StyledOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SsaFormat {
    Text,
    Json,
}

pub fn execute(
    args: &CompileArgs,
    format: SsaFormat,
    form: Option<&str>,
    out: &mut StyledOutput,
) -> anyhow::Result<bool> {
    let Some(program) = lower(args, out)? else {
        return Ok(false);
    };
    match format {
        SsaFormat::Text => print!("{}", render_text(&program, form)),
        SsaFormat::Json => println!("{}", serde_json::to_string_pretty(&program.summary())?),
    }
    Ok(true)
}

/// The whole dump, or only the forms whose name starts with `prefix`.
pub fn render_text(program: &SsaProgram, prefix: Option<&str>) -> String {
    match prefix {
        None => program.dump(),
        Some(prefix) => program
            .forms()
            .filter(|id| program.form(*id).name().starts_with(prefix))
            .map(|id| program.dump_form(id))
            .collect(),
    }
}
