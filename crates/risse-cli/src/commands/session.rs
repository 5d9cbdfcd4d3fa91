//! Loading an AST, resolving options and reporting compile errors; shared
//! by every subcommand that lowers.

use anyhow::Context;
use clap::{Args, ValueEnum};
use risse_ast::Node;
use risse_compiler::diagnostic::create_files;
use risse_compiler::{error_code, CompileError, CompileOptions, Compiler, Diagnostic, SsaProgram};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::StyledOutput;

/// Options file picked up from the working directory.
pub const DEFAULT_CONFIG: &str = "risse.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// JSON-serialized AST
    pub file: PathBuf,
    /// Options file (defaults to ./risse.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Source text the AST was parsed from, used to render diagnostics
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Return void from the top level instead of the last value
    #[arg(long)]
    pub no_result: bool,
    /// Compile the root as a single expression (eval mode)
    #[arg(long)]
    pub expression: bool,
    /// Skip the structural check of the finished SSA
    #[arg(long)]
    pub no_verify: bool,
    /// Variable of the enclosing eval binding (repeatable)
    #[arg(long = "binding", value_name = "NAME")]
    pub bindings: Vec<String>,
    /// Compile the root as the body of class NAME
    #[arg(long, value_name = "NAME")]
    pub class: Option<String>,
    /// How compile errors are printed
    #[arg(long, value_enum, default_value = "text")]
    pub error_format: ErrorFormat,
}

pub fn load_ast(path: &Path) -> anyhow::Result<Node> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    risse_ast::from_json(&text).with_context(|| format!("{} is not a valid AST", path.display()))
}

/// The options file, then command-line flags on top of it.
pub fn resolve_options(args: &CompileArgs) -> anyhow::Result<CompileOptions> {
    let default_config = Path::new(DEFAULT_CONFIG);
    let mut options = match &args.config {
        Some(path) => CompileOptions::from_file(path).with_context(|| format!("in {}", path.display()))?,
        None if default_config.exists() => {
            CompileOptions::from_file(default_config).with_context(|| format!("in {}", DEFAULT_CONFIG))?
        }
        None => CompileOptions::default(),
    };
    if args.no_result {
        options.need_result = false;
    }
    if args.expression {
        options.is_expression = true;
    }
    if args.no_verify {
        options.verify = false;
    }
    Ok(options)
}

pub fn compile(root: &Node, args: &CompileArgs, options: CompileOptions) -> Result<SsaProgram, CompileError> {
    let mut compiler = Compiler::new(options);
    if !args.bindings.is_empty() {
        compiler = compiler.with_binding(&args.bindings)?;
    }
    match &args.class {
        Some(name) => compiler.compile_class(root, Some(name.as_str()))?,
        None => compiler.compile(root)?,
    };
    Ok(compiler.into_program())
}

/// Lower the AST named by `args`. A compile error is reported and gives
/// `None`; I/O and option problems are errors.
pub fn lower(args: &CompileArgs, out: &mut StyledOutput) -> anyhow::Result<Option<SsaProgram>> {
    let root = load_ast(&args.file)?;
    let options = resolve_options(args)?;
    debug!(?options, file = %args.file.display(), "lowering");
    match compile(&root, args, options) {
        Ok(program) => Ok(Some(program)),
        Err(error) => {
            report(&error, args, out)?;
            Ok(None)
        }
    }
}

fn report(error: &CompileError, args: &CompileArgs, out: &mut StyledOutput) -> anyhow::Result<()> {
    let source = match &args.source {
        Some(path) => Some((
            path,
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
        )),
        None => None,
    };

    match (args.error_format, source) {
        (ErrorFormat::Text, Some((path, text))) => {
            let files = create_files(path, text);
            Diagnostic::from_compile_error(error, 0).emit_to(out.stderr_stream(), &files)?;
        }
        (ErrorFormat::Json, Some((path, text))) => {
            let files = create_files(path, text);
            println!("{}", Diagnostic::from_compile_error(error, 0).to_json(&files)?);
        }
        // without the source text only the recorded position is known
        (ErrorFormat::Text, None) => {
            let span = error.span();
            out.stderr_error(&format!("error[{}]", error_code(error).as_str()));
            out.stderr_plain(&format!(": {}\n  --> {}:{}\n", error, args.file.display(), span));
        }
        (ErrorFormat::Json, None) => {
            let span = error.span();
            let json = serde_json::json!({
                "code": error_code(error).as_str(),
                "severity": "error",
                "message": error.to_string(),
                "line": span.line,
                "column": span.column,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
