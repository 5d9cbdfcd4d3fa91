//! SSA variables

use super::ids::{FormId, StmtId};

/// One SSA version of a value.
///
/// Named variables carry the source name and its numbered form (`x#12`, unique
/// per declaration); temporaries carry neither.
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) name: Option<String>,
    pub(crate) numbered_name: Option<String>,
    pub(crate) version: u32,
    pub(crate) form: FormId,
    pub(crate) declared: Option<StmtId>,
    pub(crate) uses: Vec<StmtId>,
}

impl Variable {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn numbered_name(&self) -> Option<&str> {
        self.numbered_name.as_deref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn form(&self) -> FormId {
        self.form
    }

    /// The statement that defines this variable.
    pub fn declared_by(&self) -> Option<StmtId> {
        self.declared
    }

    pub fn uses(&self) -> &[StmtId] {
        &self.uses
    }

    pub fn is_temporary(&self) -> bool {
        self.numbered_name.is_none()
    }

    /// `x#12@40` for named variables, `_tmp@40` for temporaries.
    pub fn qualified_name(&self) -> String {
        match &self.numbered_name {
            Some(n) => format!("{}@{}", n, self.version),
            None => format!("_tmp@{}", self.version),
        }
    }
}
