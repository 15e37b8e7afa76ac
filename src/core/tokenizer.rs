// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Matrix operand parsing.
//!
//! A matrix operand has the form `LABEL[rX][rY]`. The parser reports the
//! specific failure together with a byte range inside the operand so the
//! caller can map it onto source columns.

use crate::core::text_utils::MAX_NAME_LEN;

/// How a candidate register slice failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisterValidity {
    Valid,
    /// Does not even start with `r`/`R`.
    NotRegister,
    /// Register-like but malformed (`r8`, `r12`, `rx`).
    BadRegister,
}

/// Parser error kinds for matrix operands, each mapped to a distinct
/// diagnostic code by the instruction encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixErrorKind {
    /// Operand lacks a full `[..][..]` pair.
    NoBrackets,
    /// Nothing before the first `[`.
    EmptyLabel,
    /// Base label exceeds the name limit.
    LabelTooLong,
    /// Empty `[]` index.
    EmptyIndex,
    /// Register-like but invalid index (`r8`, `r12`).
    InvalidRegister,
    /// Index text is not a register token at all.
    NonRegister,
    /// Non-whitespace between `]` and `[`.
    JunkBetweenBrackets,
}

/// Failed parse: kind plus the inclusive byte range of the offending text,
/// relative to the start of the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixParseError {
    pub kind: MatrixErrorKind,
    pub start: usize,
    pub end: usize,
}

/// Successful parse of `LABEL[rX][rY]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixOperand<'a> {
    pub label: &'a str,
    pub row_reg: u8,
    pub col_reg: u8,
}

fn validate_register_slice(slice: &str) -> RegisterValidity {
    let bytes = slice.as_bytes();
    if bytes.is_empty() {
        return RegisterValidity::NotRegister;
    }
    if bytes[0] == b'r' || bytes[0] == b'R' {
        if bytes.len() == 2 && (b'0'..=b'7').contains(&bytes[1]) {
            return RegisterValidity::Valid;
        }
        return RegisterValidity::BadRegister;
    }
    RegisterValidity::NotRegister
}

/// Trim ASCII whitespace from a byte range within `text`, returning the
/// trimmed range.
fn trim_range(text: &str, mut start: usize, mut end: usize) -> (usize, usize) {
    let bytes = text.as_bytes();
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

fn index_register(
    text: &str,
    open: usize,
    close: usize,
) -> Result<u8, MatrixParseError> {
    let (start, end) = trim_range(text, open + 1, close);
    if start >= end {
        return Err(MatrixParseError {
            kind: MatrixErrorKind::EmptyIndex,
            start: open,
            end: close,
        });
    }
    let slice = &text[start..end];
    match validate_register_slice(slice) {
        RegisterValidity::Valid => Ok(slice.as_bytes()[1] - b'0'),
        RegisterValidity::BadRegister => Err(MatrixParseError {
            kind: MatrixErrorKind::InvalidRegister,
            start,
            end: end - 1,
        }),
        RegisterValidity::NotRegister => Err(MatrixParseError {
            kind: MatrixErrorKind::NonRegister,
            start,
            end: end - 1,
        }),
    }
}

/// Parse a matrix operand token of the form `LABEL[rX][rY]`.
///
/// Bracket discovery first, then label checks, then per-index register
/// validation, then the `][` gap check, mirroring the order in which a
/// reader scans the operand left to right.
pub fn parse_matrix_operand(operand: &str) -> Result<MatrixOperand<'_>, MatrixParseError> {
    let no_brackets = MatrixParseError {
        kind: MatrixErrorKind::NoBrackets,
        start: 0,
        end: 0,
    };

    let b1 = operand.find('[').ok_or(no_brackets)?;
    let b2 = b1 + 1 + operand[b1 + 1..].find(']').ok_or(no_brackets)?;
    let b3 = b2 + 1 + operand[b2 + 1..].find('[').ok_or(no_brackets)?;
    let b4 = b3 + 1 + operand[b3 + 1..].find(']').ok_or(no_brackets)?;

    let label = &operand[..b1];
    if label.is_empty() {
        return Err(MatrixParseError {
            kind: MatrixErrorKind::EmptyLabel,
            start: 0,
            end: 0,
        });
    }
    if label.len() > MAX_NAME_LEN {
        return Err(MatrixParseError {
            kind: MatrixErrorKind::LabelTooLong,
            start: 0,
            end: b1 - 1,
        });
    }

    let row_reg = index_register(operand, b1, b2)?;

    let gap = &operand[b2 + 1..b3];
    if !gap.chars().all(|c| c.is_ascii_whitespace()) {
        return Err(MatrixParseError {
            kind: MatrixErrorKind::JunkBetweenBrackets,
            start: b2 + 1,
            end: b3 - 1,
        });
    }

    let col_reg = index_register(operand, b3, b4)?;

    Ok(MatrixOperand {
        label,
        row_reg,
        col_reg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_operand() {
        let m = parse_matrix_operand("M1[r2][r7]").expect("parse");
        assert_eq!(m.label, "M1");
        assert_eq!(m.row_reg, 2);
        assert_eq!(m.col_reg, 7);
    }

    #[test]
    fn accepts_whitespace_inside_brackets() {
        let m = parse_matrix_operand("TAB[ r0 ][ r1 ]").expect("parse");
        assert_eq!((m.row_reg, m.col_reg), (0, 1));
    }

    #[test]
    fn rejects_missing_brackets() {
        let err = parse_matrix_operand("LABEL[r1]").unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::NoBrackets);
    }

    #[test]
    fn rejects_empty_label() {
        let err = parse_matrix_operand("[r1][r2]").unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::EmptyLabel);
    }

    #[test]
    fn rejects_overlong_label() {
        let name = "A".repeat(32);
        let err = parse_matrix_operand(&format!("{name}[r1][r2]")).unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::LabelTooLong);
    }

    #[test]
    fn rejects_empty_index() {
        let err = parse_matrix_operand("M[][r2]").unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::EmptyIndex);
        assert_eq!(err.start, 1);
    }

    #[test]
    fn distinguishes_bad_register_from_non_register() {
        let bad = parse_matrix_operand("M[r8][r1]").unwrap_err();
        assert_eq!(bad.kind, MatrixErrorKind::InvalidRegister);
        let bad12 = parse_matrix_operand("M[r1][r12]").unwrap_err();
        assert_eq!(bad12.kind, MatrixErrorKind::InvalidRegister);
        let non = parse_matrix_operand("M[x][r1]").unwrap_err();
        assert_eq!(non.kind, MatrixErrorKind::NonRegister);
    }

    #[test]
    fn rejects_junk_between_brackets() {
        let err = parse_matrix_operand("M[r1]x[r2]").unwrap_err();
        assert_eq!(err.kind, MatrixErrorKind::JunkBetweenBrackets);
        assert_eq!(err.start, 5);
    }
}
