// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Second pass: patch symbol references in the code image, record extern
//! usage sites, and complete entry addresses.

use crate::core::error::{AsmErrorKind, Reporter};
use crate::core::words::Are;

use super::engine::Assembler;

const PAYLOAD_MASK: u32 = 0xFF;

/// Resolve every code word that carries a symbol reference.
///
/// Symbol table hit: payload takes the symbol's value, ARE becomes
/// Relocatable. Extern hit: payload 0, ARE External, and the word's address
/// is appended to the extern's usage list. A reference matching neither is
/// left untouched; pass one already surfaced the underlying problem.
pub(super) fn resolve_symbols(asm: &mut Assembler) {
    let Assembler {
        symbols,
        code,
        externs,
        ..
    } = asm;

    for word in code.words_mut() {
        let Some(name) = word.symbol_ref.as_deref() else {
            continue;
        };
        if let Some(symbol) = symbols.entry(name) {
            word.payload = (symbol.value & PAYLOAD_MASK) as u8;
            word.are = Are::Relocatable;
        } else if externs.record_usage(name, word.address) {
            word.payload = 0;
            word.are = Are::External;
        }
    }
}

/// Fill each entry record's address from the symbol table. An entry naming
/// an undefined or extern symbol is an error.
pub(super) fn complete_entries(asm: &mut Assembler, reporter: &mut Reporter) {
    let Assembler {
        symbols,
        entries,
        externs,
        ..
    } = asm;

    for record in entries.records_mut() {
        if let Some(symbol) = symbols.entry(&record.name) {
            record.address = symbol.value;
        } else if externs.contains(&record.name) {
            reporter.error(
                AsmErrorKind::Symbol,
                "AS017",
                record.line,
                1,
                None,
                0,
                0,
                format!("entry symbol '{}' is declared .extern", record.name),
            );
        } else {
            reporter.error(
                AsmErrorKind::Symbol,
                "AS017",
                record.line,
                1,
                None,
                0,
                0,
                format!("entry symbol '{}' is not defined", record.name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Reporter;
    use crate::core::symbol_table::SymbolKind;
    use crate::core::words::{Are, IC_INIT};

    fn assembled(source: &[&str]) -> (Assembler, Reporter) {
        let lines: Vec<String> = source.iter().map(|s| s.to_string()).collect();
        let mut asm = Assembler::new();
        let mut reporter = Reporter::new("t.am");
        asm.pass1(&lines, &mut reporter);
        assert_eq!(reporter.error_count(), 0, "pass 1 must be clean");
        (asm, reporter)
    }

    #[test]
    fn known_symbols_resolve_relocatable() {
        let (mut asm, _) = assembled(&["MAIN: mov LOOP, r1", "LOOP: stop"]);
        resolve_symbols(&mut asm);
        let word = &asm.code.words()[1];
        assert_eq!(word.are, Are::Relocatable);
        // LOOP sits at IC 103: first word + symbol word + register word.
        assert_eq!(u32::from(word.payload), asm.symbols.entry("LOOP").unwrap().value);
    }

    #[test]
    fn extern_references_record_usage_sites() {
        let (mut asm, _) = assembled(&[".extern W", "mov W, r1", "cmp W, W"]);
        resolve_symbols(&mut asm);
        let words = asm.code.words();
        // mov: first word at 100, W word at 101, r1 word at 102.
        assert_eq!(words[1].payload, 0);
        assert_eq!(words[1].are, Are::External);
        let usages = &asm.externs.records()[0].usages;
        assert_eq!(usages, &vec![101, 104, 105]);
    }

    #[test]
    fn unmatched_references_stay_untouched() {
        let (mut asm, _) = assembled(&["mov GHOST, r1"]);
        resolve_symbols(&mut asm);
        let word = &asm.code.words()[1];
        assert_eq!(word.payload, 0);
        assert_eq!(word.are, Are::Absolute);
        assert_eq!(word.symbol_ref.as_deref(), Some("GHOST"));
    }

    #[test]
    fn entries_take_symbol_addresses() {
        let (mut asm, mut reporter) = assembled(&[".entry MAIN", "MAIN: stop", "D: .data 1", ".entry D"]);
        resolve_symbols(&mut asm);
        complete_entries(&mut asm, &mut reporter);
        assert_eq!(reporter.error_count(), 0);
        let records = asm.entries.records();
        assert_eq!(records[0].address, IC_INIT);
        assert_eq!(records[1].address, asm.symbols.entry("D").unwrap().value);
        assert_eq!(asm.symbols.entry("D").unwrap().kind, SymbolKind::Data);
    }

    #[test]
    fn entry_of_undefined_symbol_is_an_error() {
        let (mut asm, mut reporter) = assembled(&[".entry NOWHERE", "stop"]);
        complete_entries(&mut asm, &mut reporter);
        assert_eq!(reporter.diagnostics()[0].code(), "AS017");
    }

    #[test]
    fn entry_of_extern_symbol_is_an_error() {
        let (mut asm, mut reporter) = assembled(&[".extern W", ".entry W", "stop"]);
        complete_entries(&mut asm, &mut reporter);
        let diag = &reporter.diagnostics()[0];
        assert_eq!(diag.code(), "AS017");
        assert!(diag.message().contains(".extern"));
        assert_eq!(diag.line(), 2);
    }

    #[test]
    fn resolved_words_do_not_land_in_extern_lists() {
        let (mut asm, _) = assembled(&[".extern W", "KNOWN: mov KNOWN, r1"]);
        resolve_symbols(&mut asm);
        assert!(!asm.externs.has_usages());
        assert_eq!(asm.code.words()[1].are, Are::Relocatable);
    }
}
