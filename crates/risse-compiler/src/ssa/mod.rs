//! SSA data model
//!
//! Forms, blocks, statements and variables live in the arenas of
//! [`SsaProgram`] and refer to each other by index. The graph primitives are
//! spread over the submodules as `impl SsaProgram` blocks.

mod access_map;
mod block;
mod dominance;
mod dump;
pub(crate) mod form;
mod ids;
pub(crate) mod namespace;
mod opcode;
mod program;
mod statement;
mod variable;

pub use access_map::{AccessFlags, AccessMap};
pub use block::Block;
pub use dominance::DominatorTree;
pub use dump::{FormSummary, ProgramSummary};
pub use form::SsaForm;
pub use ids::{AccessMapId, BlockId, FormId, FunctionGroupId, FunctionId, StmtId, VarId};
pub use namespace::{LocalNamespace, NamespaceParent};
pub use opcode::OpCode;
pub use program::{SsaProgram, MAX_UNIQUE_NUMBER};
pub use statement::{CallFlags, InsertPoint, Statement};
pub use variable::Variable;
