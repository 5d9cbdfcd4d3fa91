//! Risse compiler - AST to SSA lowering
//!
//! This crate lowers a Risse AST into SSA forms: control-flow graphs of
//! basic blocks whose statements assign every variable exactly once.
//! Closures, try bodies and synchronized bodies become nested forms; exits
//! that cross a form boundary travel as exit-try exceptions caught by the
//! enclosing form.

pub mod compiler;
pub mod diagnostic;
pub mod error;
mod lower;
pub mod options;
pub mod ssa;

pub use compiler::{compile, Compiler, CompilerFunction, FunctionGroup};
pub use diagnostic::{error_code, Diagnostic, ErrorCode};
pub use error::{CompileError, CompileResult, ErrorKind};
pub use options::{CompileOptions, OptionsError};
pub use ssa::{BlockId, FormId, OpCode, SsaProgram, StmtId, VarId};
