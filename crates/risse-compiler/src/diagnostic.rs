//! Diagnostic reporting for compile errors
//!
//! Wraps a [`CompileError`] into a `codespan-reporting` diagnostic that can be
//! rendered to a terminal or serialized to JSON for tools.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use risse_ast::Span;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CompileError;

/// Error code for a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(Severity::Error).with_message(message),
            code: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self.inner = self.inner.with_code(code.0);
        self
    }

    /// Add the primary label. Synthetic spans have no source text and are
    /// left unlabelled.
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        if span.is_synthetic() {
            return self;
        }
        let label = Label::primary(file_id, span.start as usize..span.end as usize).with_message(message);
        self.inner.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Build the diagnostic for a compile error in file `file_id`.
    pub fn from_compile_error(error: &CompileError, file_id: usize) -> Self {
        use CompileError::*;

        let diag = Diagnostic::error(error.to_string()).with_code(error_code(error));
        match error {
            DuplicateDefault { span } => diag
                .with_primary_label(file_id, *span, "second 'default' here")
                .with_note("a switch may contain at most one 'default' clause"),
            CaseOutsideSwitch { span, .. } => diag.with_primary_label(file_id, *span, "not inside a switch"),
            TooManyArguments { limit, span, .. } => diag
                .with_primary_label(file_id, *span, "argument list too long")
                .with_note(format!("at most {} are allowed", limit)),
            UndefinedLabel { span, .. } => diag.with_primary_label(file_id, *span, "jump to unknown label"),
            DuplicateLabel { span, .. } => diag.with_primary_label(file_id, *span, "label redefined here"),
            JumpIntoDeeperBlock { span } => diag
                .with_primary_label(file_id, *span, "target is inside a nested block")
                .with_note("jumps may only leave try/synchronized/callback blocks, never enter them"),
            MisplacedJump { span, .. } => diag.with_primary_label(file_id, *span, "no enclosing target"),
            JumpWithValue { span, .. } => diag.with_primary_label(file_id, *span, "value not allowed"),
            NumberExhausted { span } => diag.with_primary_label(file_id, *span, "here"),
            SuperUnavailable { span } => diag
                .with_primary_label(file_id, *span, "no superclass in scope")
                .with_note("'super' is only bound inside class bodies"),
            NotAssignable { span, .. } => diag.with_primary_label(file_id, *span, "cannot be assigned to"),
            NotDeletable { span } => diag.with_primary_label(file_id, *span, "cannot be deleted"),
            NoCollapsedArguments { span } => diag.with_primary_label(file_id, *span, "no '*' parameter declared"),
            OutOfScope { span, .. } => diag.with_primary_label(file_id, *span, "variable not visible on this path"),
            Internal { span, .. } => diag
                .with_primary_label(file_id, *span, "while lowering this node")
                .with_note("this is a compiler bug"),
        }
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer, files)
    }

    /// Emit the diagnostic to an arbitrary terminal writer
    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files, &self.inner)
    }

    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// 1-indexed
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: Option<String>,
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Error code for a compile error: `E4xxx` structural, `E5xxx` semantic,
/// `E9xxx` internal.
pub fn error_code(error: &CompileError) -> ErrorCode {
    use CompileError::*;

    match error {
        DuplicateDefault { .. } => ErrorCode("E4001"),
        CaseOutsideSwitch { .. } => ErrorCode("E4002"),
        TooManyArguments { .. } => ErrorCode("E4003"),
        UndefinedLabel { .. } => ErrorCode("E4004"),
        DuplicateLabel { .. } => ErrorCode("E4005"),
        JumpIntoDeeperBlock { .. } => ErrorCode("E4006"),
        MisplacedJump { .. } => ErrorCode("E4007"),
        JumpWithValue { .. } => ErrorCode("E4008"),
        NumberExhausted { .. } => ErrorCode("E4009"),
        SuperUnavailable { .. } => ErrorCode("E5001"),
        NotAssignable { .. } => ErrorCode("E5002"),
        NotDeletable { .. } => ErrorCode("E5003"),
        NoCollapsedArguments { .. } => ErrorCode("E5004"),
        OutOfScope { .. } => ErrorCode("E5005"),
        Internal { .. } => ErrorCode("E9001"),
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}
