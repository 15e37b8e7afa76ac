// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use std::fmt;

use serde_json::json;

use crate::report::underline_span;

/// Line processing status returned by the first-pass dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Ok,
    NothingDone,
    Error,
}

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    Assembler,
    Cli,
    Directive,
    Instruction,
    Io,
    Label,
    Preprocess,
    Symbol,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// Severity level for diagnostics. Only errors advance the error counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A diagnostic message with a stable code, location, and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) code: String,
    pub(crate) severity: Severity,
    pub(crate) error: AsmError,
    pub(crate) file: String,
    pub(crate) line: u32,
    pub(crate) column: usize,
    pub(crate) col_start: usize,
    pub(crate) col_end: usize,
    pub(crate) source: Option<String>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, severity: Severity, error: AsmError) -> Self {
        Self {
            code: code.into(),
            severity,
            error,
            file: String::new(),
            line: 1,
            column: 1,
            col_start: 0,
            col_end: 0,
            source: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_location(mut self, line: u32, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_span(mut self, col_start: usize, col_end: usize) -> Self {
        self.col_start = col_start;
        self.col_end = col_end;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn span(&self) -> (usize, usize) {
        (self.col_start, self.col_end)
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    /// Render as `file:line:col: severity: [code] message`, followed by the
    /// offending source line and a caret underline when a span is present.
    pub fn format(&self) -> String {
        let sev = match self.severity {
            Severity::Info => "info",
            Severity::Error => "error",
        };
        let file = if self.file.is_empty() {
            "<input>"
        } else {
            self.file.as_str()
        };
        let mut out = format!(
            "{file}:{}:{}: {sev}: [{}] {}",
            self.line,
            self.column,
            self.code,
            self.error.message()
        );
        if let Some(source) = &self.source {
            if !source.is_empty() && self.col_start > 0 && self.col_end >= self.col_start {
                out.push('\n');
                out.push_str(&underline_span(source, self.col_start, self.col_end));
            }
        }
        out
    }

    /// Render as a single JSON object (one line per diagnostic in the
    /// JSON diagnostics sink).
    pub fn to_json(&self) -> serde_json::Value {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Error => "error",
        };
        json!({
            "code": self.code,
            "severity": severity,
            "file": self.file,
            "line": self.line,
            "column": self.column,
            "col_start": self.col_start,
            "col_end": self.col_end,
            "message": self.error.message(),
            "source": self.source,
        })
    }
}

/// Collecting reporter threaded through every stage of one translation unit.
///
/// Append-only: stages push diagnostics and read the error counter; the
/// caller drains the collected diagnostics into the run report.
#[derive(Debug)]
pub struct Reporter {
    file: String,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
}

impl Reporter {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            diagnostics: Vec::new(),
            errors: 0,
        }
    }

    /// Name of the file diagnostics are currently attributed to.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = file.into();
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.errors += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(
        &mut self,
        kind: AsmErrorKind,
        code: &str,
        line: u32,
        column: usize,
        source: Option<&str>,
        col_start: usize,
        col_end: usize,
        message: String,
    ) {
        let diagnostic = Diagnostic::new(code, Severity::Error, AsmError::new(kind, message))
            .with_file(self.file.clone())
            .with_location(line, column)
            .with_span(col_start, col_end)
            .with_source(source.map(str::to_string));
        self.report(diagnostic);
    }

    pub fn info(
        &mut self,
        kind: AsmErrorKind,
        code: &str,
        line: u32,
        column: usize,
        source: Option<&str>,
        col_start: usize,
        col_end: usize,
        message: String,
    ) {
        let diagnostic = Diagnostic::new(code, Severity::Info, AsmError::new(kind, message))
            .with_file(self.file.clone())
            .with_location(line, column)
            .with_span(col_start, col_end)
            .with_source(source.map(str::to_string));
        self.report(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Report from assembling one input stem.
#[derive(Debug)]
pub struct RunReport {
    stem: String,
    diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(stem: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            stem: stem.into(),
            diagnostics,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

/// Error from a run that could not produce per-stem reports.
#[derive(Debug)]
pub struct RunError {
    error: AsmError,
}

impl RunError {
    pub fn new(error: AsmError) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {}
