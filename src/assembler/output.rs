// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Output emitters: `.ob`, `.ent` (when entries exist), and `.ext` (when
//! some extern has a recorded usage). All addresses and words are printed
//! as base-4 letters.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::core::error::{AsmErrorKind, Reporter};
use crate::core::words::{
    code_word_letters, data_word_letters, to_base4_letters, to_base4_letters_min, IC_INIT,
    OB_ADDR_WIDTH, OB_WORD_LIMIT,
};

use super::engine::Assembler;

fn report_io(reporter: &mut Reporter, code: &str, message: String) {
    reporter.error(AsmErrorKind::Io, code, 1, 1, None, 0, 0, message);
}

/// Write `<stem>.ob`: a header with the minimum-width code/data word counts,
/// then width-4 addresses and five-letter words, code first, data after.
fn write_ob(stem: &str, asm: &Assembler, reporter: &mut Reporter) -> Result<(), ()> {
    let code_words = asm.ic - IC_INIT;
    let data_words = asm.dc;
    let total_words = code_words + data_words;

    // The object must fit both the address width and the hard word limit.
    let width_capacity: u32 = (1 << (2 * OB_ADDR_WIDTH as u32)) - 1;
    let max_allowed = width_capacity.min(OB_WORD_LIMIT);
    if total_words > max_allowed {
        report_io(
            reporter,
            "AS_OB_TOO_LONG",
            format!(
                "object has {total_words} words (code {code_words} + data {data_words}) but limit is {max_allowed}"
            ),
        );
        return Err(());
    }

    let path = format!("{stem}.ob");
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(_) => {
            report_io(
                reporter,
                "AS_FILE_OPEN",
                format!("failed to open output file '{path}' for writing"),
            );
            return Err(());
        }
    };
    let mut out = BufWriter::new(file);

    let mut write = || -> std::io::Result<()> {
        writeln!(
            out,
            "{}\t{}",
            to_base4_letters_min(code_words),
            to_base4_letters_min(data_words)
        )?;
        for word in asm.code.words() {
            writeln!(
                out,
                "{} {}",
                to_base4_letters(word.address, OB_ADDR_WIDTH),
                code_word_letters(word.payload, word.are)
            )?;
        }
        for word in asm.data.words() {
            writeln!(
                out,
                "{} {}",
                to_base4_letters(word.address, OB_ADDR_WIDTH),
                data_word_letters(word.value)
            )?;
        }
        out.flush()
    };
    if write().is_err() {
        report_io(
            reporter,
            "AS_FILE_OPEN",
            format!("failed to write output file '{path}'"),
        );
        return Err(());
    }
    Ok(())
}

/// Write `<stem>.ent`, one `name address` line per entry. Skipped when no
/// entries were declared.
fn write_ent(stem: &str, asm: &Assembler, reporter: &mut Reporter) -> Result<(), ()> {
    if asm.entries.is_empty() {
        return Ok(());
    }
    let path = format!("{stem}.ent");
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(_) => {
            report_io(
                reporter,
                "AS423",
                format!("cannot create output file '{path}'"),
            );
            return Err(());
        }
    };
    let mut out = BufWriter::new(file);
    let mut write = || -> std::io::Result<()> {
        for record in asm.entries.records() {
            writeln!(
                out,
                "{} {}",
                record.name,
                to_base4_letters(record.address, OB_ADDR_WIDTH)
            )?;
        }
        out.flush()
    };
    if write().is_err() {
        report_io(reporter, "AS423", format!("cannot write output file '{path}'"));
        return Err(());
    }
    Ok(())
}

/// Write `<stem>.ext`, one `name address` line per recorded usage. Skipped
/// when no extern was ever referenced.
fn write_ext(stem: &str, asm: &Assembler, reporter: &mut Reporter) -> Result<(), ()> {
    if !asm.externs.has_usages() {
        return Ok(());
    }
    let path = format!("{stem}.ext");
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(_) => {
            report_io(
                reporter,
                "AS421",
                format!("cannot create output file '{path}'"),
            );
            return Err(());
        }
    };
    let mut out = BufWriter::new(file);
    let mut write = || -> std::io::Result<()> {
        for record in asm.externs.records() {
            for usage in &record.usages {
                writeln!(
                    out,
                    "{} {}",
                    record.name,
                    to_base4_letters(*usage, OB_ADDR_WIDTH)
                )?;
            }
        }
        out.flush()
    };
    if write().is_err() {
        report_io(reporter, "AS421", format!("cannot write output file '{path}'"));
        return Err(());
    }
    Ok(())
}

/// Emit all output artifacts for a stem.
pub(super) fn write_outputs(stem: &str, asm: &Assembler, reporter: &mut Reporter) -> Result<(), ()> {
    write_ob(stem, asm, reporter)?;
    write_ent(stem, asm, reporter)?;
    write_ext(stem, asm, reporter)?;
    Ok(())
}
