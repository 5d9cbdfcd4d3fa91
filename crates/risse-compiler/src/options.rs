//! Compiler options
//!
//! Options can be built in code or read from the `[compiler]` table of a
//! `risse.toml` file:
//!
//! ```toml
//! [compiler]
//! need_result = true
//! max_arguments = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default limit for positional and block arguments of one call.
pub const DEFAULT_MAX_ARGUMENTS: usize = 30;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse options: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid options: {0}")]
    ValidationError(String),
}

/// Knobs of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// The top level returns its last evaluated value instead of void.
    pub need_result: bool,
    /// The unit is a single expression (eval mode).
    pub is_expression: bool,
    /// Maximum positional arguments of one call.
    pub max_arguments: usize,
    /// Maximum callback blocks of one call.
    pub max_block_arguments: usize,
    /// Check the structural SSA invariants once lowering is complete.
    pub verify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            need_result: true,
            is_expression: false,
            max_arguments: DEFAULT_MAX_ARGUMENTS,
            max_block_arguments: DEFAULT_MAX_ARGUMENTS,
            verify: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    compiler: CompileOptions,
}

impl CompileOptions {
    /// Read options from a `risse.toml` file.
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Read options from `risse.toml` contents.
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        let file: OptionsFile = toml::from_str(content)?;
        file.compiler.validate()?;
        Ok(file.compiler)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        // expand flags of one call are kept in a 32-bit mask
        if self.max_arguments == 0 || self.max_arguments > 32 {
            return Err(OptionsError::ValidationError(format!(
                "max_arguments must be between 1 and 32, got {}",
                self.max_arguments
            )));
        }
        if self.max_block_arguments == 0 {
            return Err(OptionsError::ValidationError(
                "max_block_arguments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
