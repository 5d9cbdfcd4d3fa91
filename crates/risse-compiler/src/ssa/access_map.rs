//! Access maps
//!
//! A lazy block that runs in its parent's frame (a try body, a synchronized
//! body) reaches the parent's variables through an access map. The parent
//! fills the map before the call (`ChildWrite`), the block uses
//! `ParentRead`/`ParentWrite`, and the parent copies written values back
//! afterwards (`ChildRead`).

use std::collections::BTreeMap;

use super::ids::{AccessMapId, FormId, VarId};
use super::opcode::OpCode;
use super::SsaProgram;
use crate::error::{CompileError, CompileResult};
use risse_ast::Span;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFlags {
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone)]
pub struct AccessMap {
    pub(crate) form: FormId,
    pub(crate) variable: VarId,
    pub(crate) entries: BTreeMap<String, AccessFlags>,
}

impl AccessMap {
    /// The form that owns the map (the parent side).
    pub fn form(&self) -> FormId {
        self.form
    }

    pub fn variable(&self) -> VarId {
        self.variable
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, AccessFlags)> {
        self.entries.iter().map(|(name, flags)| (name.as_str(), *flags))
    }

    pub(crate) fn set_used(&mut self, name: &str, write: bool) {
        let flags = self.entries.entry(name.to_string()).or_default();
        if write {
            flags.write = true;
        } else {
            flags.read = true;
        }
    }
}

impl SsaProgram {
    /// Emit `DefineAccessMap` in the form's current block.
    pub(crate) fn create_access_map(&mut self, form: FormId, span: Span) -> CompileResult<AccessMapId> {
        let variable = self.add_variable_with_statement(form, span, OpCode::DefineAccessMap, &[])?;
        let id = AccessMapId::new(self.access_maps.len() as u32);
        self.access_maps.push(AccessMap {
            form,
            variable,
            entries: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Copy the parent's current values into the map before the block runs.
    ///
    /// Written names are passed in as well, so a block that leaves a
    /// variable untouched on some path hands the old value back.
    pub(crate) fn list_variables_for_lazy_block(&mut self, form: FormId, span: Span, map: AccessMapId) -> CompileResult<()> {
        let map_var = self.access_maps[map.index()].variable;
        let names: Vec<String> = self.access_maps[map.index()].entries.keys().cloned().collect();
        for name in names {
            let Some(value) = self.ns_read(form, span, &name)? else {
                return Err(CompileError::internal(
                    format!("variable '{}' recorded in an access map is not visible", name),
                    span,
                ));
            };
            let (stmt, _) = self.add_statement(form, span, OpCode::ChildWrite, &[map_var, value])?;
            self.statements[stmt.index()].name = Some(name);
        }
        Ok(())
    }

    /// Copy the values the block wrote back into the parent's namespace and
    /// close the map.
    pub(crate) fn cleanup_access_map(&mut self, form: FormId, span: Span, map: AccessMapId) -> CompileResult<()> {
        let map_var = self.access_maps[map.index()].variable;
        let written: Vec<String> = self.access_maps[map.index()]
            .entries
            .iter()
            .filter(|(_, flags)| flags.write)
            .map(|(name, _)| name.clone())
            .collect();
        for name in written {
            let (stmt, value) = self.add_statement(form, span, OpCode::ChildRead, &[map_var])?;
            self.statements[stmt.index()].name = Some(name.clone());
            let value = value.ok_or_else(|| CompileError::internal("ChildRead declares nothing", span))?;
            if !self.ns_write(form, span, &name, value)? {
                return Err(CompileError::internal(
                    format!("variable '{}' recorded in an access map is not writable", name),
                    span,
                ));
            }
        }
        self.add_statement(form, span, OpCode::EndAccessMap, &[map_var])?;
        Ok(())
    }
}
