// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction encoding: operand splitting, addressing-mode detection,
//! rule validation, and machine-word emission.

use crate::core::error::{AsmErrorKind, LineStatus, Reporter};
use crate::core::opcodes::{mask_to_csv, mode_allowed, opcode_rule, AddrMode, Opcode};
use crate::core::text_utils::register_id;
use crate::core::tokenizer::{parse_matrix_operand, MatrixErrorKind, MatrixParseError};
use crate::core::words::{Are, CodeImage};

/// Immediate literal range.
const IMM_MIN: i64 = -128;
const IMM_MAX: i64 = 127;

/// Byte range of an operand token within the line.
#[derive(Debug, Clone, Copy)]
struct OperandToken {
    start: usize,
    end: usize,
}

impl OperandToken {
    fn text<'a>(&self, code: &'a str) -> &'a str {
        &code[self.start..self.end]
    }
}

fn trim_token(code: &str, mut start: usize, mut end: usize) -> Option<OperandToken> {
    let bytes = code.as_bytes();
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if start < end {
        Some(OperandToken { start, end })
    } else {
        None
    }
}

/// Split the operand tail at the single top-level comma. Commas inside
/// matrix brackets do not split; more than one top-level comma yields zero
/// operands, surfacing as an operand-count error.
fn split_operands(
    code: &str,
    start: usize,
) -> (u8, Option<OperandToken>, Option<OperandToken>) {
    let bytes = code.as_bytes();
    let mut comma_count = 0;
    let mut split_at = None;
    let mut cursor = start;
    while cursor < bytes.len() {
        match bytes[cursor] {
            b'[' => match code[cursor + 1..].find(']') {
                Some(close) => cursor += close + 2,
                None => break,
            },
            b',' => {
                if split_at.is_none() {
                    split_at = Some(cursor);
                }
                comma_count += 1;
                cursor += 1;
            }
            _ => cursor += 1,
        }
    }
    if comma_count > 1 {
        return (0, None, None);
    }

    match split_at {
        None => match trim_token(code, start, code.len()) {
            Some(token) => (1, Some(token), None),
            None => (0, None, None),
        },
        Some(comma) => {
            let left = trim_token(code, start, comma);
            let right = trim_token(code, comma + 1, code.len());
            match (left, right) {
                (Some(left), Some(right)) => (2, Some(left), Some(right)),
                _ => (0, None, None),
            }
        }
    }
}

/// Addressing mode of an operand token.
fn addr_mode_of(token: &str) -> AddrMode {
    if token.starts_with('#') {
        return AddrMode::Immediate;
    }
    if register_id(token).is_some() {
        return AddrMode::Register;
    }
    if parse_matrix_operand(token).is_ok() {
        return AddrMode::Matrix;
    }
    // Bracketed but malformed: classify as matrix so the matrix parser
    // reports the precise failure instead of a vague direct-mode error.
    if token.contains('[') {
        return AddrMode::Matrix;
    }
    AddrMode::Direct
}

/// Parse an immediate literal `#<signed decimal>` into the 8-bit range.
fn parse_imm8(token: &str) -> Option<i64> {
    let body = token.strip_prefix('#')?;
    let digits = body.trim_end();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    if (IMM_MIN..=IMM_MAX).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn report_whole_line(
    reporter: &mut Reporter,
    code: &str,
    line: &str,
    line_no: u32,
    message: String,
) {
    let end = line.len().max(1);
    reporter.error(
        AsmErrorKind::Instruction,
        code,
        line_no,
        1,
        Some(line),
        1,
        end,
        message,
    );
}

/// Validate the operand count and per-slot addressing modes against the
/// opcode rule table. A count mismatch reports a single error and aborts
/// mode checking to avoid cascades.
fn validate_modes(
    op: Opcode,
    operand_count: u8,
    src_mode: Option<AddrMode>,
    dst_mode: Option<AddrMode>,
    line: &str,
    reporter: &mut Reporter,
    line_no: u32,
) -> bool {
    let rule = opcode_rule(op);

    if operand_count < rule.min_ops || operand_count > rule.max_ops {
        report_whole_line(
            reporter,
            "AS003",
            line,
            line_no,
            format!(
                "wrong operand count for '{}' (got {}, expected {})",
                rule.name, operand_count, rule.min_ops
            ),
        );
        return false;
    }

    let mut ok = true;
    if let Some(mode) = src_mode {
        if !mode_allowed(rule.src_mask, mode) {
            report_whole_line(
                reporter,
                "AS022",
                line,
                line_no,
                format!(
                    "illegal addressing mode for source of '{}' (allowed: {})",
                    rule.name,
                    mask_to_csv(rule.src_mask)
                ),
            );
            ok = false;
        }
    }
    if let Some(mode) = dst_mode {
        if !mode_allowed(rule.dst_mask, mode) {
            report_whole_line(
                reporter,
                "AS022",
                line,
                line_no,
                format!(
                    "illegal addressing mode for destination of '{}' (allowed: {})",
                    rule.name,
                    mask_to_csv(rule.dst_mask)
                ),
            );
            ok = false;
        }
    }
    ok
}

/// Map a matrix parse failure to its diagnostic, anchored at the operand's
/// position within the line.
fn report_matrix_error(
    err: MatrixParseError,
    token: OperandToken,
    line: &str,
    reporter: &mut Reporter,
    line_no: u32,
) {
    let base = token.start + 1;
    let (code, col_start, col_end, message) = match err.kind {
        MatrixErrorKind::NoBrackets => (
            "AS110",
            base,
            base,
            "matrix operand must be of form LABEL[rI][rJ]".to_string(),
        ),
        MatrixErrorKind::EmptyLabel => (
            "AS110",
            base,
            base,
            "missing label before '[' in matrix operand".to_string(),
        ),
        MatrixErrorKind::LabelTooLong => (
            "AS020",
            base,
            base + err.end,
            "label too long (max 31 chars)".to_string(),
        ),
        MatrixErrorKind::EmptyIndex => (
            "AS111",
            base + err.start,
            base + err.end,
            "invalid index format: empty '[]'".to_string(),
        ),
        MatrixErrorKind::InvalidRegister => (
            "AS114",
            base + err.start,
            base + err.end,
            "invalid register in index (expected r0..r7)".to_string(),
        ),
        MatrixErrorKind::NonRegister => (
            "AS113",
            base + err.start,
            base + err.end,
            "non-register used as matrix index (expected r0..r7)".to_string(),
        ),
        MatrixErrorKind::JunkBetweenBrackets => (
            "AS112",
            base + err.start,
            base + err.end,
            "invalid index format between brackets (expected ...][...)".to_string(),
        ),
    };
    reporter.error(
        AsmErrorKind::Instruction,
        code,
        line_no,
        col_start,
        Some(line),
        col_start,
        col_end,
        message,
    );
}

/// Emit the extra word(s) for one operand. `is_source` selects the nibble
/// for a sole register operand.
fn emit_operand(
    token: OperandToken,
    mode: AddrMode,
    is_source: bool,
    code: &str,
    line: &str,
    ic: &mut u32,
    image: &mut CodeImage,
    reporter: &mut Reporter,
    line_no: u32,
) -> LineStatus {
    let text = token.text(code);
    match mode {
        AddrMode::Immediate => {
            let Some(value) = parse_imm8(text) else {
                report_whole_line(
                    reporter,
                    "AS023",
                    line,
                    line_no,
                    format!("invalid immediate literal '{text}' (expect #number)"),
                );
                return LineStatus::Error;
            };
            image.push_word(ic, value as u8, Are::Absolute, None);
        }
        AddrMode::Direct => {
            image.push_word(ic, 0, Are::Absolute, Some(text.to_string()));
        }
        AddrMode::Register => {
            let Some(reg) = register_id(text) else {
                report_whole_line(
                    reporter,
                    "AS023",
                    line,
                    line_no,
                    format!("invalid register '{text}'"),
                );
                return LineStatus::Error;
            };
            let payload = if is_source { reg << 4 } else { reg };
            image.push_word(ic, payload, Are::Absolute, None);
        }
        AddrMode::Matrix => match parse_matrix_operand(text) {
            Ok(matrix) => {
                image.push_word(ic, 0, Are::Absolute, Some(matrix.label.to_string()));
                let payload = (matrix.row_reg << 4) | matrix.col_reg;
                image.push_word(ic, payload, Are::Absolute, None);
            }
            Err(err) => {
                report_matrix_error(err, token, line, reporter, line_no);
                return LineStatus::Error;
            }
        },
    }
    LineStatus::Ok
}

/// Encode one instruction line (label already stripped) into 1..3 machine
/// words.
pub(super) fn encode_instruction(
    op: Opcode,
    code: &str,
    line: &str,
    arg_start: usize,
    ic: &mut u32,
    image: &mut CodeImage,
    reporter: &mut Reporter,
    line_no: u32,
) -> LineStatus {
    let (operand_count, first, second) = split_operands(code, arg_start);

    let (src_token, dst_token, src_mode, dst_mode) = match (first, second) {
        (Some(src), Some(dst)) => (
            Some(src),
            Some(dst),
            Some(addr_mode_of(src.text(code))),
            Some(addr_mode_of(dst.text(code))),
        ),
        // A single operand occupies the destination slot.
        (Some(dst), None) => (None, Some(dst), None, Some(addr_mode_of(dst.text(code)))),
        _ => (None, None, None, None),
    };

    if !validate_modes(op, operand_count, src_mode, dst_mode, line, reporter, line_no) {
        return LineStatus::Error;
    }

    let src_bits = src_mode.map_or(0, AddrMode::bits);
    let dst_bits = dst_mode.map_or(0, AddrMode::bits);
    let first_payload = (op.value() << 4) | (src_bits << 2) | dst_bits;
    image.push_word(ic, first_payload, Are::Absolute, None);

    // Register-pair packing: both operands in one extra word, source in the
    // high nibble.
    if let (Some(src), Some(dst), Some(AddrMode::Register), Some(AddrMode::Register)) =
        (src_token, dst_token, src_mode, dst_mode)
    {
        let registers = (register_id(src.text(code)), register_id(dst.text(code)));
        let (Some(src_reg), Some(dst_reg)) = registers else {
            report_whole_line(
                reporter,
                "AS023",
                line,
                line_no,
                "invalid register in 'rS,rD' pair".to_string(),
            );
            return LineStatus::Error;
        };
        image.push_word(ic, (src_reg << 4) | dst_reg, Are::Absolute, None);
        return LineStatus::Ok;
    }

    if let (Some(token), Some(mode)) = (src_token, src_mode) {
        let status = emit_operand(token, mode, true, code, line, ic, image, reporter, line_no);
        if status == LineStatus::Error {
            return status;
        }
    }
    if let (Some(token), Some(mode)) = (dst_token, dst_mode) {
        let status = emit_operand(token, mode, false, code, line, ic, image, reporter, line_no);
        if status == LineStatus::Error {
            return status;
        }
    }
    LineStatus::Ok
}
