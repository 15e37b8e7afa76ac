// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Run orchestration: per-stem pipeline sequencing (preprocess, pass one,
//! pass two, emitters) with full isolation between stems.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::core::error::{AsmErrorKind, Reporter, RunReport};
use crate::core::macro_processor::preprocess_stem;

use super::cli::CliConfig;
use super::engine::Assembler;
use super::listing::ListingWriter;
use super::{output, second_pass};

/// Assemble every stem in the configuration. Each stem runs to completion
/// (or failure) before the next; no state is shared between stems.
pub fn run_with_cli(config: &CliConfig) -> Vec<RunReport> {
    config
        .stems
        .iter()
        .map(|stem| run_one(stem, config))
        .collect()
}

fn progress(quiet: bool, message: String) {
    if !quiet {
        println!("{message}");
    }
}

/// Assemble one stem: `<stem>.as` -> `<stem>.am` -> outputs.
fn run_one(stem: &str, config: &CliConfig) -> RunReport {
    let quiet = config.quiet;
    let mut reporter = Reporter::new(format!("{stem}.as"));

    if preprocess_stem(stem, &mut reporter).is_err() {
        reporter.error(
            AsmErrorKind::Assembler,
            "AS101",
            1,
            1,
            None,
            0,
            0,
            format!("macro processing failed for '{stem}'"),
        );
        return RunReport::new(stem, reporter.take_diagnostics());
    }
    progress(quiet, format!("Macro processing completed successfully for {stem}."));

    let file_am = format!("{stem}.am");
    reporter.set_file(&file_am);
    let lines = match read_lines(&file_am) {
        Ok(lines) => lines,
        Err(()) => {
            reporter.error(
                AsmErrorKind::Io,
                "AS040",
                1,
                1,
                None,
                0,
                0,
                format!("cannot open source file '{file_am}'"),
            );
            return RunReport::new(stem, reporter.take_diagnostics());
        }
    };

    let mut asm = Assembler::new();
    asm.pass1(&lines, &mut reporter);

    // Pass two only runs on a clean first pass.
    if reporter.error_count() == 0 {
        second_pass::resolve_symbols(&mut asm);
        second_pass::complete_entries(&mut asm, &mut reporter);
        if reporter.error_count() == 0 && output::write_outputs(stem, &asm, &mut reporter).is_ok() {
            progress(quiet, format!("Assembly completed successfully for {stem}."));
            if config.listing {
                let _ = ListingWriter::new(io::stdout().lock()).write(stem, &asm);
            }
        }
    }

    if reporter.error_count() > 0 {
        reporter.error(
            AsmErrorKind::Assembler,
            "AS102",
            1,
            1,
            None,
            0,
            0,
            format!("assembly failed for '{stem}'"),
        );
    }

    RunReport::new(stem, reporter.take_diagnostics())
}

fn read_lines(path: &str) -> Result<Vec<String>, ()> {
    let file = File::open(path).map_err(|_| ())?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line.map_err(|_| ())?);
    }
    Ok(lines)
}
