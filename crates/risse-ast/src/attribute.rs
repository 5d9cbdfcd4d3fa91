//! Declaration attributes (`const`, `static`, `private`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    Var,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Public,
    Internal,
    Private,
}

/// Attributes attached to a declaration. Unset fields inherit the runtime
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclAttribute {
    pub mutability: Option<Mutability>,
    pub access: Option<Access>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_synchronized: bool,
    #[serde(default)]
    pub is_override: bool,
}

impl DeclAttribute {
    pub fn is_default(&self) -> bool {
        *self == DeclAttribute::default()
    }

    pub fn constant() -> Self {
        DeclAttribute {
            mutability: Some(Mutability::Const),
            ..Default::default()
        }
    }
}

impl fmt::Display for DeclAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = Vec::new();
        match self.access {
            Some(Access::Public) => words.push("public"),
            Some(Access::Internal) => words.push("internal"),
            Some(Access::Private) => words.push("private"),
            None => {}
        }
        if self.is_static {
            words.push("static");
        }
        if self.is_synchronized {
            words.push("synchronized");
        }
        if self.is_override {
            words.push("override");
        }
        match self.mutability {
            Some(Mutability::Const) => words.push("const"),
            Some(Mutability::Var) => words.push("var"),
            None => {}
        }
        write!(f, "{}", words.join(" "))
    }
}
