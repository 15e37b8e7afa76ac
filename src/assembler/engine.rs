// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! First-pass driver: per-line label handling, statement classification,
//! and dispatch into the directive parsers and the instruction encoder.

use crate::core::error::{AsmErrorKind, LineStatus, Reporter};
use crate::core::opcodes::{is_reserved_name, match_statement, DirectiveKind, Statement};
use crate::core::symbol_table::{EntryList, ExternList, SymbolKind, SymbolTable};
use crate::core::text_utils::{is_alpha_num_label, is_register_name, strip_comment, MAX_NAME_LEN};
use crate::core::words::{CodeImage, DataImage, IC_INIT, OB_WORD_LIMIT};

use super::{directives, instruction};

/// Assembly state for one translation unit: the symbol table, both images,
/// the entry/extern lists, and the IC/DC counters.
pub struct Assembler {
    pub symbols: SymbolTable,
    pub code: CodeImage,
    pub data: DataImage,
    pub entries: EntryList,
    pub externs: ExternList,
    pub ic: u32,
    pub dc: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            code: CodeImage::new(),
            data: DataImage::new(),
            entries: EntryList::new(),
            externs: ExternList::new(),
            ic: IC_INIT,
            dc: 0,
        }
    }

    /// First pass over the expanded source. Errors accumulate in the
    /// reporter; processing continues past per-line failures so one run
    /// surfaces as many diagnostics as possible.
    pub fn pass1(&mut self, lines: &[String], reporter: &mut Reporter) {
        let mut line_no: u32 = 0;
        for line in lines {
            line_no += 1;
            self.process_line(line, line_no, reporter);
        }

        let total = (self.ic - IC_INIT) + self.dc;
        if total > OB_WORD_LIMIT {
            reporter.error(
                AsmErrorKind::Assembler,
                "AS_SUM_GE_LIMIT",
                line_no.max(1),
                1,
                None,
                0,
                0,
                format!(
                    "(IC - {IC_INIT}) + DC = {total} words; must not exceed {OB_WORD_LIMIT}"
                ),
            );
        }
    }

    fn process_line(&mut self, line: &str, line_no: u32, reporter: &mut Reporter) -> LineStatus {
        let code = strip_comment(line);
        let bytes = code.as_bytes();

        let mut cursor = 0;
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if cursor >= bytes.len() {
            return LineStatus::NothingDone;
        }

        // Optional `LABEL:` prefix.
        let mut label: Option<&str> = None;
        let mut token_end = cursor;
        while token_end < bytes.len()
            && !bytes[token_end].is_ascii_whitespace()
            && bytes[token_end] != b':'
        {
            token_end += 1;
        }
        if token_end < bytes.len() && bytes[token_end] == b':' {
            let candidate = &code[cursor..token_end];
            if !self.validate_label(candidate, cursor, line, line_no, reporter) {
                return LineStatus::Error;
            }
            if self.symbols.entry(candidate).is_some() {
                reporter.error(
                    AsmErrorKind::Label,
                    "AS020",
                    line_no,
                    cursor + 1,
                    Some(line),
                    cursor + 1,
                    token_end,
                    format!("duplicate label '{candidate}'"),
                );
                // The statement is still processed so later errors surface.
            } else {
                label = Some(candidate);
            }
            cursor = token_end + 1;
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
        }

        // Statement head token: mnemonic or directive.
        let head_start = cursor;
        let mut head_end = cursor;
        while head_end < bytes.len()
            && !bytes[head_end].is_ascii_whitespace()
            && bytes[head_end] != b','
            && bytes[head_end] != b'['
        {
            head_end += 1;
        }
        let head = &code[head_start..head_end];

        let Some(statement) = match_statement(head) else {
            let (col_start, col_end) = if head.is_empty() {
                (head_start + 1, head_start + 1)
            } else {
                (head_start + 1, head_end)
            };
            let message = if head.is_empty() {
                "unknown or missing mnemonic/directive".to_string()
            } else {
                format!("unknown mnemonic or directive '{head}'")
            };
            reporter.error(
                AsmErrorKind::Assembler,
                "AS002",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_end,
                message,
            );
            return LineStatus::Error;
        };

        // Register the label before encoding: code labels take the current
        // IC, data labels the projected IC + DC. Labels on .entry/.extern
        // lines are ignored.
        if let Some(name) = label {
            match statement {
                Statement::Instruction(_) => {
                    self.symbols.add(name, self.ic, SymbolKind::Code);
                }
                Statement::Directive(
                    DirectiveKind::Data | DirectiveKind::String | DirectiveKind::Mat,
                ) => {
                    self.symbols.add(name, self.ic + self.dc, SymbolKind::Data);
                }
                Statement::Directive(DirectiveKind::Entry | DirectiveKind::Extern) => {}
            }
        }

        match statement {
            Statement::Instruction(op) => instruction::encode_instruction(
                op,
                code,
                line,
                head_end,
                &mut self.ic,
                &mut self.code,
                reporter,
                line_no,
            ),
            Statement::Directive(DirectiveKind::Data) => directives::parse_data(
                code,
                line,
                head_end,
                self.ic,
                &mut self.dc,
                &mut self.data,
                reporter,
                line_no,
            ),
            Statement::Directive(DirectiveKind::String) => directives::parse_string(
                code,
                line,
                head_end,
                self.ic,
                &mut self.dc,
                &mut self.data,
                reporter,
                line_no,
            ),
            Statement::Directive(DirectiveKind::Mat) => directives::parse_mat(
                code,
                line,
                head_end,
                self.ic,
                &mut self.dc,
                &mut self.data,
                reporter,
                line_no,
            ),
            Statement::Directive(kind @ (DirectiveKind::Entry | DirectiveKind::Extern)) => {
                directives::parse_symbol_directive(
                    kind,
                    code,
                    line,
                    head_end,
                    &mut self.entries,
                    &mut self.externs,
                    reporter,
                    line_no,
                )
            }
        }
    }

    /// Validate a label candidate, reporting the first failing rule.
    fn validate_label(
        &self,
        name: &str,
        offset: usize,
        line: &str,
        line_no: u32,
        reporter: &mut Reporter,
    ) -> bool {
        let col_start = offset + 1;
        let col_end = col_start + name.len().saturating_sub(1);
        if name.is_empty() {
            reporter.error(
                AsmErrorKind::Label,
                "AS001",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_start,
                "empty label before ':'".to_string(),
            );
            return false;
        }
        if name.len() > MAX_NAME_LEN {
            reporter.error(
                AsmErrorKind::Label,
                "AS001",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_end,
                format!("label too long (max {MAX_NAME_LEN} chars)"),
            );
            return false;
        }
        if !is_alpha_num_label(name) {
            reporter.error(
                AsmErrorKind::Label,
                "AS001",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_end,
                format!("invalid label name '{name}' (must start with a letter and be alphanumeric)"),
            );
            return false;
        }
        if is_reserved_name(name) && !is_register_name(name) {
            reporter.error(
                AsmErrorKind::Label,
                "AS015",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_end,
                format!("label name '{name}' is a reserved mnemonic/directive"),
            );
            return false;
        }
        if is_register_name(name) {
            reporter.error(
                AsmErrorKind::Label,
                "AS016",
                line_no,
                col_start,
                Some(line),
                col_start,
                col_end,
                format!("label name '{name}' conflicts with a register name"),
            );
            return false;
        }
        true
    }
}
