//! Arena indices
//!
//! Everything the lowering builds lives in the arenas of
//! [`SsaProgram`](super::SsaProgram); cross references are these indices.

use serde::Serialize;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn as_u32(&self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// An SSA form (one lowering region: function body, try body, ...)
    FormId,
    "form"
);
arena_id!(BlockId, "bb");
arena_id!(StmtId, "s");
arena_id!(VarId, "v");
arena_id!(AccessMapId, "map");
arena_id!(
    /// A function: one frame, possibly several forms
    FunctionId,
    "fn"
);
arena_id!(FunctionGroupId, "group");
