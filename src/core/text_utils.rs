// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Small lexical helpers shared by the preprocessor and both passes.

/// Maximum characters in a label or macro name.
pub const MAX_NAME_LEN: usize = 31;

/// Line comment delimiter.
pub const COMMENT_CHAR: char = ';';

/// Strip a `;` comment, returning the code portion.
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_CHAR) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// First whitespace-delimited token of a line, or `""` when the line is
/// blank.
pub fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Case-insensitive ASCII equality, used for mnemonics and directives.
/// Symbol names stay case-sensitive.
pub fn ieq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Register name of the form `r0`..`r7` (also `R0`..`R7`), exactly two
/// characters.
pub fn is_register_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && (bytes[0] == b'r' || bytes[0] == b'R') && (b'0'..=b'7').contains(&bytes[1])
}

/// Register id for a register token, or `None` when the token is not one.
pub fn register_id(s: &str) -> Option<u8> {
    if is_register_name(s) {
        Some(s.as_bytes()[1] - b'0')
    } else {
        None
    }
}

/// Letter-led, alphanumeric-only identifier (label syntax; underscores are
/// allowed in macro names only).
pub fn is_alpha_num_label(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric())
}

/// Macro name syntax: starts with a letter, then letters, digits, or
/// underscores.
pub fn is_valid_macro_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
