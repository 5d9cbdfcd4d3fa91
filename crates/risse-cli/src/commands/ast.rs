//! `risse ast`: print an AST as an indented tree or normalized JSON.

use std::path::Path;

use super::session::load_ast;

pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    let root = load_ast(file)?;
    if json {
        println!("{}", risse_ast::to_json(&root)?);
    } else {
        print!("{}", risse_ast::dump::dump(&root));
    }
    Ok(())
}
