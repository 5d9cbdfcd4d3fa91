//! `risse check`: lower and verify without printing the SSA.

use super::session::{lower, CompileArgs};
use crate::output::StyledOutput;

pub fn execute(args: &CompileArgs, out: &mut StyledOutput) -> anyhow::Result<bool> {
    let Some(program) = lower(args, out)? else {
        return Ok(false);
    };
    let summary = program.summary();
    out.success("ok");
    out.plain(&format!(": {}", args.file.display()));
    out.dim(&format!(
        " ({} forms, {} functions, {} statements)",
        summary.forms.len(),
        summary.functions,
        summary.statements
    ));
    out.newline();
    Ok(true)
}
