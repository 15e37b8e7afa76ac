// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface and validated run configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::core::error::{AsmError, AsmErrorKind, RunError};

/// Assembler for a 10-bit word architecture with base-4 letter object
/// output.
#[derive(Parser, Debug)]
#[command(name = "quadforge", version, about)]
pub struct Cli {
    /// Input stems; each `<stem>.as` is assembled into `<stem>.ob` (and
    /// `.ent`/`.ext` when applicable). A trailing `.as` is stripped.
    pub stems: Vec<String>,

    /// Suppress per-stage progress lines on stdout.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a symbol-table and image listing after a successful assembly.
    #[arg(long)]
    pub listing: bool,

    /// Emit diagnostics as JSON lines instead of text.
    #[arg(long)]
    pub json_diagnostics: bool,

    /// Write diagnostics to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub diagnostics_file: Option<PathBuf>,
}

/// Where diagnostics are routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticsSinkConfig {
    Stdout,
    File(PathBuf),
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub stems: Vec<String>,
    pub quiet: bool,
    pub listing: bool,
    pub json_diagnostics: bool,
    pub diagnostics_sink: DiagnosticsSinkConfig,
}

/// Validate the parsed CLI. An empty invocation is an error, matching the
/// non-zero exit contract.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, RunError> {
    if cli.stems.is_empty() {
        return Err(RunError::new(AsmError::new(
            AsmErrorKind::Cli,
            "usage: quadforge <stem> [<stem> ...]",
        )));
    }
    let stems = cli
        .stems
        .iter()
        .map(|stem| match stem.strip_suffix(".as") {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => stem.clone(),
        })
        .collect();
    let diagnostics_sink = match &cli.diagnostics_file {
        Some(path) => DiagnosticsSinkConfig::File(path.clone()),
        None => DiagnosticsSinkConfig::Stdout,
    };
    Ok(CliConfig {
        stems,
        quiet: cli.quiet,
        listing: cli.listing,
        json_diagnostics: cli.json_diagnostics,
        diagnostics_sink,
    })
}
