//! Subcommand implementations

pub mod ast;
pub mod check;
pub mod session;
pub mod ssa;
