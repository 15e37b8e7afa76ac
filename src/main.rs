// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for quadforge.

use std::fs::OpenOptions;
use std::io::{self, Write};

use clap::Parser;

use quadforge::assembler::cli::{validate_cli, Cli, DiagnosticsSinkConfig};
use quadforge::assembler::run_with_cli;
use quadforge::core::error::Diagnostic;

struct DiagnosticsSink {
    writer: Box<dyn Write>,
    json: bool,
}

impl DiagnosticsSink {
    fn from_config(config: &DiagnosticsSinkConfig, json: bool) -> io::Result<Self> {
        let writer: Box<dyn Write> = match config {
            DiagnosticsSinkConfig::Stdout => Box::new(io::stdout()),
            DiagnosticsSinkConfig::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?;
                Box::new(file)
            }
        };
        Ok(Self { writer, json })
    }

    fn emit(&mut self, diagnostic: &Diagnostic) {
        let rendered = if self.json {
            diagnostic.to_json().to_string()
        } else {
            diagnostic.format()
        };
        let _ = writeln!(self.writer, "{rendered}");
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut sink = match DiagnosticsSink::from_config(&config.diagnostics_sink, config.json_diagnostics)
    {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("Failed to open diagnostics sink: {err}");
            std::process::exit(1);
        }
    };

    let reports = run_with_cli(&config);
    let mut any_errors = false;
    for report in &reports {
        for diagnostic in report.diagnostics() {
            sink.emit(diagnostic);
        }
        if report.error_count() > 0 {
            any_errors = true;
        }
    }

    std::process::exit(if any_errors { 1 } else { 0 });
}
