//! Risse developer CLI
//!
//! Reads ASTs handed over as JSON by an external parser, lowers them to SSA
//! and prints the result: the AST dump, the SSA dump, a JSON summary, or
//! the diagnostics of a failed compilation.

mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use commands::session::CompileArgs;
use commands::ssa::SsaFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "risse")]
#[command(about = "Risse AST to SSA lowering tools", long_about = None)]
#[command(version)]
struct Cli {
    /// When to use colors: auto, always or never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an AST
    Ast {
        /// JSON-serialized AST
        file: PathBuf,
        /// Print normalized JSON instead of the tree dump
        #[arg(long)]
        json: bool,
    },

    /// Lower an AST and print its SSA forms
    Ssa {
        #[command(flatten)]
        args: CompileArgs,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: SsaFormat,
        /// Only dump forms whose name starts with this prefix
        #[arg(long)]
        form: Option<String>,
    },

    /// Lower and verify an AST without printing it
    Check {
        #[command(flatten)]
        args: CompileArgs,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let mut out = output::StyledOutput::new(output::resolve_color_choice(cli.color.as_deref()));

    let succeeded = match cli.command {
        Commands::Ast { file, json } => {
            commands::ast::execute(&file, json)?;
            true
        }
        Commands::Ssa { args, format, form } => commands::ssa::execute(&args, format, form.as_deref(), &mut out)?,
        Commands::Check { args } => commands::check::execute(&args, &mut out)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
