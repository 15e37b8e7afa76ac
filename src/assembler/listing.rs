// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing output: symbol table, both images, and the entry/extern lists,
//! printed after a successful assembly when `--listing` is given.

use std::io::Write;

use crate::core::symbol_table::SymbolKind;
use crate::core::words::{code_word_letters, data_word_letters, Are, IC_INIT};

use super::engine::Assembler;

fn kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Code => "code",
        SymbolKind::Data => "data",
        SymbolKind::External => "extern",
        SymbolKind::Entry => "entry",
    }
}

fn are_letter(are: Are) -> char {
    match are {
        Are::Absolute => 'A',
        Are::External => 'E',
        Are::Relocatable => 'R',
    }
}

/// Writer for the post-assembly listing.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, stem: &str, asm: &Assembler) -> std::io::Result<()> {
        writeln!(self.out, "LISTING FOR {stem}")?;

        writeln!(self.out, "\nSYMBOLS")?;
        if asm.symbols.is_empty() {
            writeln!(self.out, "(none)")?;
        } else {
            writeln!(self.out, "NAME                             VALUE  KIND")?;
            for symbol in asm.symbols.entries() {
                writeln!(
                    self.out,
                    "{:<31}  {:>5}  {}",
                    symbol.name,
                    symbol.value,
                    kind_name(symbol.kind)
                )?;
            }
        }

        writeln!(self.out, "\nCODE IMAGE")?;
        writeln!(self.out, "ADDR  WORD   ARE  SYMBOL")?;
        for word in asm.code.words() {
            writeln!(
                self.out,
                "{:>4}  {}  {}    {}",
                word.address,
                code_word_letters(word.payload, word.are),
                are_letter(word.are),
                word.symbol_ref.as_deref().unwrap_or("-")
            )?;
        }

        writeln!(self.out, "\nDATA IMAGE")?;
        writeln!(self.out, "ADDR  WORD   VALUE")?;
        for word in asm.data.words() {
            writeln!(
                self.out,
                "{:>4}  {}  {:>5}",
                word.address,
                data_word_letters(word.value),
                word.value
            )?;
        }

        if !asm.entries.is_empty() {
            writeln!(self.out, "\nENTRIES")?;
            for record in asm.entries.records() {
                writeln!(self.out, "{} -> {}", record.name, record.address)?;
            }
        }
        if asm.externs.has_usages() {
            writeln!(self.out, "\nEXTERNS")?;
            for record in asm.externs.records() {
                for usage in &record.usages {
                    writeln!(self.out, "{} used at {}", record.name, usage)?;
                }
            }
        }

        writeln!(
            self.out,
            "\nCode words: {}  Data words: {}",
            asm.ic - IC_INIT,
            asm.dc
        )
    }
}
