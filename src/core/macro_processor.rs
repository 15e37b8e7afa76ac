// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Macro preprocessor: `mcro <name>` .. `mcroend` blocks.
//!
//! Reads `<stem>.as`, stores macro bodies, substitutes invocations, and
//! writes the expanded source to `<stem>.am`. The output is written to
//! `<stem>.am.tmp` and renamed on success, so a failed run leaves any
//! pre-existing `.am` untouched.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};

use crate::core::error::{AsmErrorKind, Reporter};
use crate::core::opcodes::is_reserved_name;
use crate::core::text_utils::{first_token, is_valid_macro_name, MAX_NAME_LEN};

/// Maximum printable characters per source line.
pub const MAX_LINE_LEN: usize = 80;

/// Maximum lines per source file.
pub const MAX_SOURCE_LINES: u32 = 10_000;

/// One macro definition: name plus verbatim (trimmed) body lines.
#[derive(Debug)]
struct Macro {
    name: String,
    body: Vec<String>,
}

/// Macro definitions for a single translation unit. Lives only for the
/// duration of preprocessing.
#[derive(Debug, Default)]
struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    fn find(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    fn add(&mut self, name: &str) -> usize {
        self.macros.push(Macro {
            name: name.to_string(),
            body: Vec::new(),
        });
        self.macros.len() - 1
    }
}

/// Validate a macro name extracted from a `mcro` line, reporting the first
/// failing rule. The checks run in a fixed order so each malformed name
/// yields one stable code.
fn validate_macro_name(
    name: &str,
    table: &MacroTable,
    reporter: &mut Reporter,
    line_no: u32,
    line: &str,
) -> bool {
    let line_end = line.len().max(1);
    if name.len() > MAX_NAME_LEN {
        reporter.error(
            AsmErrorKind::Preprocess,
            "MC004",
            line_no,
            1,
            Some(line),
            1,
            line_end,
            format!("macro name too long (max {MAX_NAME_LEN})"),
        );
        return false;
    }
    if !is_valid_macro_name(name) {
        reporter.error(
            AsmErrorKind::Preprocess,
            "MC005",
            line_no,
            1,
            Some(line),
            1,
            line_end,
            "invalid macro name syntax".to_string(),
        );
        return false;
    }
    if is_reserved_name(name) || name == "mcro" || name == "mcroend" {
        reporter.error(
            AsmErrorKind::Preprocess,
            "MC006",
            line_no,
            1,
            Some(line),
            1,
            line_end,
            format!("macro name '{name}' is reserved"),
        );
        return false;
    }
    if table.find(name).is_some() {
        reporter.error(
            AsmErrorKind::Preprocess,
            "MC007",
            line_no,
            1,
            Some(line),
            1,
            line_end,
            format!("macro '{name}' already defined"),
        );
        return false;
    }
    true
}

/// Run the macro preprocessor for one input stem.
///
/// On success `<stem>.am` holds the expanded source. On failure the temp
/// file is removed and any pre-existing `<stem>.am` is left as it was.
pub fn preprocess_stem(stem: &str, reporter: &mut Reporter) -> Result<(), ()> {
    let file_as = format!("{stem}.as");
    let file_am = format!("{stem}.am");
    let tmp_am = format!("{stem}.am.tmp");

    reporter.set_file(&file_as);

    let input = match File::open(&file_as) {
        Ok(file) => file,
        Err(_) => {
            reporter.error(
                AsmErrorKind::Io,
                "MC009",
                1,
                1,
                None,
                0,
                0,
                format!("failed to open '{file_as}' for reading"),
            );
            return Err(());
        }
    };
    let output = match File::create(&tmp_am) {
        Ok(file) => file,
        Err(_) => {
            reporter.error(
                AsmErrorKind::Io,
                "MC009",
                1,
                1,
                None,
                0,
                0,
                format!("failed to create temporary '{tmp_am}'"),
            );
            return Err(());
        }
    };
    let mut out = BufWriter::new(output);

    let start_errs = reporter.error_count();
    let mut table = MacroTable::default();
    let mut current: Option<usize> = None;
    let mut line_no: u32 = 0;
    let mut write_failed = false;

    for read in BufReader::new(input).lines() {
        let raw = match read {
            Ok(raw) => raw,
            Err(_) => {
                reporter.error(
                    AsmErrorKind::Io,
                    "MC009",
                    line_no + 1,
                    1,
                    None,
                    0,
                    0,
                    format!("read error in '{file_as}'"),
                );
                break;
            }
        };
        line_no += 1;

        if line_no > MAX_SOURCE_LINES {
            reporter.error(
                AsmErrorKind::Preprocess,
                "MC010",
                line_no,
                1,
                Some(raw.as_str()),
                1,
                raw.len().max(1),
                format!("file exceeds maximum lines ({MAX_SOURCE_LINES})"),
            );
        }

        let trimmed = raw.trim().to_string();
        if raw.len() > MAX_LINE_LEN {
            let ctx: &str = if trimmed.is_empty() { &raw } else { &trimmed };
            reporter.error(
                AsmErrorKind::Preprocess,
                "MC001",
                line_no,
                1,
                Some(ctx),
                1,
                ctx.len().max(1),
                format!("line exceeds maximum length ({MAX_LINE_LEN} chars)"),
            );
            continue;
        }
        let token = first_token(&trimmed);

        if let Some(index) = current {
            if token == "mcroend" {
                let rest = &trimmed["mcroend".len()..];
                let pad = rest.len() - rest.trim_start().len();
                if !rest.trim_start().is_empty() {
                    let col = "mcroend".len() + pad + 1;
                    reporter.error(
                        AsmErrorKind::Preprocess,
                        "MC008",
                        line_no,
                        1,
                        Some(trimmed.as_str()),
                        col,
                        trimmed.len(),
                        "extraneous text after 'mcroend'".to_string(),
                    );
                }
                current = None;
            } else {
                table.macros[index].body.push(trimmed);
            }
            continue;
        }

        // `mcroXYZ` glued to the keyword.
        if trimmed.starts_with("mcro") && token != "mcro" && token != "mcroend" {
            let underline_end = trimmed.len().min(4).max(1);
            reporter.error(
                AsmErrorKind::Preprocess,
                "MC002",
                line_no,
                1,
                Some(trimmed.as_str()),
                1,
                underline_end,
                "missing space after 'mcro' before macro name".to_string(),
            );
            continue;
        }

        if token == "mcro" {
            let name = trimmed["mcro".len()..].trim();
            if name.is_empty() {
                reporter.error(
                    AsmErrorKind::Preprocess,
                    "MC003",
                    line_no,
                    1,
                    Some(trimmed.as_str()),
                    1,
                    trimmed.len().max(1),
                    "macro name is missing after 'mcro'".to_string(),
                );
                continue;
            }
            if !validate_macro_name(name, &table, reporter, line_no, &trimmed) {
                continue;
            }
            current = Some(table.add(name));
            continue;
        }

        if !token.is_empty() {
            if let Some(invoked) = table.find(token) {
                for body_line in &invoked.body {
                    if writeln!(out, "{body_line}").is_err() {
                        write_failed = true;
                    }
                }
                continue;
            }
        }

        if writeln!(out, "{trimmed}").is_err() {
            write_failed = true;
        }
    }

    if current.is_some() {
        reporter.error(
            AsmErrorKind::Preprocess,
            "MC_UNTERMINATED_MACRO",
            line_no,
            1,
            None,
            0,
            0,
            "unterminated macro: missing 'mcroend'".to_string(),
        );
    }

    if write_failed || out.flush().is_err() {
        reporter.error(
            AsmErrorKind::Io,
            "MC009",
            line_no.max(1),
            1,
            None,
            0,
            0,
            format!("failed to write temporary '{tmp_am}'"),
        );
    }
    drop(out);

    if reporter.error_count() > start_errs {
        let _ = fs::remove_file(&tmp_am);
        return Err(());
    }

    let _ = fs::remove_file(&file_am);
    if fs::rename(&tmp_am, &file_am).is_err() {
        reporter.error(
            AsmErrorKind::Io,
            "MC_FILE_RENAME",
            1,
            1,
            None,
            0,
            0,
            format!("failed to rename '{tmp_am}' -> '{file_am}'"),
        );
        let _ = fs::remove_file(&tmp_am);
        return Err(());
    }

    Ok(())
}
