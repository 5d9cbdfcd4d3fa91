//! Compilation errors
//!
//! Every error is fatal to the compilation unit being lowered and carries the
//! span of the node that caused it.

use risse_ast::Span;
use serde::Serialize;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Broad category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Misplaced or malformed control structure.
    Structural,
    /// Well-formed but meaningless construct.
    Semantic,
    /// A broken compiler invariant.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("cannot place multiple 'default' in a switch")]
    DuplicateDefault { span: Span },

    #[error("cannot place '{keyword}' out of switch")]
    CaseOutsideSwitch { keyword: &'static str, span: Span },

    #[error("Too many {what} (max {limit})")]
    TooManyArguments {
        what: &'static str,
        limit: usize,
        span: Span,
    },

    #[error("label '{label}' is not defined")]
    UndefinedLabel { label: String, span: Span },

    #[error("label '{label}' is already defined")]
    DuplicateLabel { label: String, span: Span },

    #[error("cannot jump into deeper try/synchronized/callback block")]
    JumpIntoDeeperBlock { span: Span },

    #[error("cannot place '{keyword}' here")]
    MisplacedJump { keyword: &'static str, span: Span },

    #[error("cannot {keyword} here with a value")]
    JumpWithValue { keyword: &'static str, span: Span },

    #[error("too large source code; compiler internal number exhausted")]
    NumberExhausted { span: Span },

    #[error("'super' is not available here")]
    SuperUnavailable { span: Span },

    #[error("Writable expression required {place}")]
    NotAssignable { place: String, span: Span },

    #[error("Deletable expression required")]
    NotDeletable { span: Span },

    #[error("No anonymous collapsed arguments defined in this method")]
    NoCollapsedArguments { span: Span },

    #[error("local variable '{name}' is from out of scope")]
    OutOfScope { name: String, span: Span },

    #[error("Internal compiler error: {message}")]
    Internal { message: String, span: Span },
}

impl CompileError {
    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        CompileError::Internal {
            message: message.into(),
            span,
        }
    }

    pub fn not_assignable(place: impl Into<String>, span: Span) -> Self {
        CompileError::NotAssignable {
            place: place.into(),
            span,
        }
    }

    /// Position of the offending node.
    pub fn span(&self) -> Span {
        use CompileError::*;
        match self {
            DuplicateDefault { span }
            | CaseOutsideSwitch { span, .. }
            | TooManyArguments { span, .. }
            | UndefinedLabel { span, .. }
            | DuplicateLabel { span, .. }
            | JumpIntoDeeperBlock { span }
            | MisplacedJump { span, .. }
            | JumpWithValue { span, .. }
            | NumberExhausted { span }
            | SuperUnavailable { span }
            | NotAssignable { span, .. }
            | NotDeletable { span }
            | NoCollapsedArguments { span }
            | OutOfScope { span, .. }
            | Internal { span, .. } => *span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use CompileError::*;
        match self {
            DuplicateDefault { .. }
            | CaseOutsideSwitch { .. }
            | TooManyArguments { .. }
            | UndefinedLabel { .. }
            | DuplicateLabel { .. }
            | JumpIntoDeeperBlock { .. }
            | MisplacedJump { .. }
            | JumpWithValue { .. }
            | NumberExhausted { .. } => ErrorKind::Structural,
            SuperUnavailable { .. }
            | NotAssignable { .. }
            | NotDeletable { .. }
            | NoCollapsedArguments { .. }
            | OutOfScope { .. } => ErrorKind::Semantic,
            Internal { .. } => ErrorKind::Internal,
        }
    }
}
