// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pipeline tests: whole-stem runs from `.as` source to output files.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assembler::cli::{validate_cli, Cli, CliConfig, DiagnosticsSinkConfig};
use crate::assembler::run_with_cli;
use crate::core::error::RunReport;
use crate::core::words::from_base4_letters;

use clap::Parser;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_stem(tag: &str) -> String {
    let mut dir = std::env::temp_dir();
    let pid = std::process::id();
    let counter = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.push(format!("quadforge-run-{pid}-{counter}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir.push(tag);
    dir.to_string_lossy().into_owned()
}

fn config_for(stem: &str) -> CliConfig {
    CliConfig {
        stems: vec![stem.to_string()],
        quiet: true,
        listing: false,
        json_diagnostics: false,
        diagnostics_sink: DiagnosticsSinkConfig::Stdout,
    }
}

fn assemble(tag: &str, source: &str) -> (String, RunReport) {
    let stem = temp_stem(tag);
    fs::write(format!("{stem}.as"), source).expect("write source");
    let mut reports = run_with_cli(&config_for(&stem));
    (stem, reports.remove(0))
}

fn read(path: String) -> String {
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing output file {path}"))
}

fn codes(report: &RunReport) -> Vec<String> {
    report
        .diagnostics()
        .iter()
        .map(|d| d.code().to_string())
        .collect()
}

#[test]
fn single_stop_produces_minimal_object() {
    let (stem, report) = assemble("s1", "STOP: stop\n");
    assert_eq!(report.error_count(), 0, "codes: {:?}", codes(&report));
    let ob = read(format!("{stem}.ob"));
    // Header: one code word, zero data words; body: stop at address 100.
    assert_eq!(ob, "b\ta\nbcba ddaaa\n");
    assert!(!Path::new(&format!("{stem}.ent")).exists());
    assert!(!Path::new(&format!("{stem}.ext")).exists());
}

#[test]
fn data_only_program_lands_at_ic_init() {
    let (stem, report) = assemble("s2", "A: .data 1, -1\n");
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    assert_eq!(ob, "a\tc\nbcba aaaab\nbcbb ddddd\n");
}

#[test]
fn string_emits_terminated_bytes() {
    let (stem, report) = assemble("s3", ".string \"ab\"\n");
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    let lines: Vec<&str> = ob.lines().collect();
    assert_eq!(lines[0], "a\td");
    let values: Vec<u32> = lines[1..]
        .iter()
        .map(|line| from_base4_letters(line.split(' ').nth(1).unwrap()).unwrap())
        .collect();
    assert_eq!(values, vec![97, 98, 0]);
}

#[test]
fn matrix_initializer_fills_with_zeros() {
    let (stem, report) = assemble("s4", ".mat [2][2] 1,2\n");
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    let values: Vec<u32> = ob
        .lines()
        .skip(1)
        .map(|line| from_base4_letters(line.split(' ').nth(1).unwrap()).unwrap())
        .collect();
    assert_eq!(values, vec![1, 2, 0, 0]);
}

#[test]
fn register_pair_is_packed_into_two_words() {
    let (stem, report) = assemble("s5", "mov r1, r2\n");
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    let lines: Vec<&str> = ob.lines().collect();
    assert_eq!(lines.len(), 3);
    // First word 0x0F, then the packed register word 0x12, both absolute.
    assert_eq!(from_base4_letters(lines[1].split(' ').nth(1).unwrap()), Some(0x0F << 2));
    assert_eq!(from_base4_letters(lines[2].split(' ').nth(1).unwrap()), Some(0x12 << 2));
}

#[test]
fn extern_usage_is_recorded_and_encoded() {
    let (stem, report) = assemble("s6", ".extern W\nmov W, r1\n");
    assert_eq!(report.error_count(), 0);
    let ext = read(format!("{stem}.ext"));
    // The W operand word sits at address 101.
    assert_eq!(ext, "W bcbb\n");
    let ob = read(format!("{stem}.ob"));
    let w_line = ob.lines().nth(2).unwrap();
    // payload 0, ARE external.
    assert_eq!(from_base4_letters(w_line.split(' ').nth(1).unwrap()), Some(1));
}

#[test]
fn entries_are_completed_and_emitted() {
    let source = ".entry MAIN\nMAIN: mov r1, r2\nD: .data 7\n.entry D\n";
    let (stem, report) = assemble("entries", source);
    assert_eq!(report.error_count(), 0, "codes: {:?}", codes(&report));
    let ent = read(format!("{stem}.ent"));
    // MAIN at 100 (bcba), D at IC_final + 0 = 102 (bcbc).
    assert_eq!(ent, "MAIN bcba\nD bcbc\n");
}

#[test]
fn macros_expand_before_pass_one() {
    let source = "\
mcro setup
mov r1, r2
inc r3
mcroend
setup
stop
";
    let (stem, report) = assemble("macro", source);
    assert_eq!(report.error_count(), 0, "codes: {:?}", codes(&report));
    let am = read(format!("{stem}.am"));
    assert_eq!(am, "mov r1, r2\ninc r3\nstop\n");
    let ob = read(format!("{stem}.ob"));
    // 2 + 2 + 1 code words.
    assert_eq!(ob.lines().next(), Some("bb\ta"));
}

#[test]
fn relocatable_references_resolve_to_symbol_addresses() {
    let source = "MAIN: jmp END\nEND: stop\n";
    let (stem, report) = assemble("reloc", source);
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    let lines: Vec<&str> = ob.lines().collect();
    // jmp first word (100), END reference (101), stop (102).
    let reference = from_base4_letters(lines[2].split(' ').nth(1).unwrap()).unwrap();
    // END = 102, ARE relocatable: 102 << 2 | 2.
    assert_eq!(reference, (102 << 2) | 2);
}

#[test]
fn failed_stem_produces_no_object_and_stage_code() {
    let (stem, report) = assemble("fail", "mov r1\n");
    assert!(report.error_count() > 0);
    let all = codes(&report);
    assert!(all.contains(&"AS003".to_string()));
    assert_eq!(all.last().unwrap(), "AS102");
    assert!(!Path::new(&format!("{stem}.ob")).exists());
}

#[test]
fn preprocessor_failure_reports_stage_code_and_stops() {
    let (stem, report) = assemble("ppfail", "mcro mov\nmcroend\nstop\n");
    assert!(report.error_count() > 0);
    let all = codes(&report);
    assert_eq!(all, vec!["MC006", "AS101"]);
    assert!(!Path::new(&format!("{stem}.am")).exists());
    assert!(!Path::new(&format!("{stem}.ob")).exists());
}

#[test]
fn missing_input_reports_open_failure() {
    let stem = temp_stem("missing");
    let mut reports = run_with_cli(&config_for(&stem));
    let report = reports.remove(0);
    let all = codes(&report);
    assert_eq!(all, vec!["MC009", "AS101"]);
}

#[test]
fn oversized_program_yields_no_object() {
    let mut source = String::new();
    for _ in 0..130 {
        source.push_str("mov r1, r2\n");
    }
    let (stem, report) = assemble("oversize", &source);
    assert!(codes(&report).contains(&"AS_SUM_GE_LIMIT".to_string()));
    assert!(!Path::new(&format!("{stem}.ob")).exists());
}

#[test]
fn entry_of_undefined_symbol_fails_the_stem() {
    let (stem, report) = assemble("badentry", ".entry GHOST\nstop\n");
    assert!(codes(&report).contains(&"AS017".to_string()));
    assert!(!Path::new(&format!("{stem}.ob")).exists());
    assert!(!Path::new(&format!("{stem}.ent")).exists());
}

#[test]
fn stems_are_isolated_from_each_other() {
    let good = temp_stem("iso-good");
    let bad = temp_stem("iso-bad");
    fs::write(format!("{good}.as"), "stop\n").expect("write");
    fs::write(format!("{bad}.as"), "bogus\n").expect("write");
    let config = CliConfig {
        stems: vec![bad.clone(), good.clone()],
        quiet: true,
        listing: false,
        json_diagnostics: false,
        diagnostics_sink: DiagnosticsSinkConfig::Stdout,
    };
    let reports = run_with_cli(&config);
    assert!(reports[0].error_count() > 0);
    assert_eq!(reports[1].error_count(), 0);
    assert!(Path::new(&format!("{good}.ob")).exists());
    assert!(!Path::new(&format!("{bad}.ob")).exists());
}

#[test]
fn reports_carry_per_stem_diagnostics_for_the_sink() {
    let (_, report) = assemble("diag", "X: .data 999\n");
    let diag = report
        .diagnostics()
        .iter()
        .find(|d| d.code() == "AS312")
        .expect("range diagnostic");
    assert!(diag.file().ends_with(".am"));
    assert_eq!(diag.line(), 1);
    let rendered = diag.format();
    assert!(rendered.contains("error: [AS312]"));
    assert!(rendered.contains("^"));
}

#[test]
fn cli_round_trip_strips_extension_and_validates() {
    let cli = Cli::try_parse_from(["quadforge", "-q", "prog.as"]).expect("parse");
    let config = validate_cli(&cli).expect("validate");
    assert_eq!(config.stems, vec!["prog"]);
    assert!(config.quiet);
}

#[test]
fn address_monotonicity_holds_across_code_and_data() {
    let source = "MAIN: mov r1, r2\nstop\nLIST: .data 1,2,3\n";
    let (stem, report) = assemble("mono", source);
    assert_eq!(report.error_count(), 0);
    let ob = read(format!("{stem}.ob"));
    let addrs: Vec<u32> = ob
        .lines()
        .skip(1)
        .map(|line| from_base4_letters(line.split(' ').next().unwrap()).unwrap())
        .collect();
    // Code words 100..102, then data words 103..105: strictly increasing.
    for pair in addrs.windows(2) {
        assert!(pair[1] == pair[0] + 1, "addresses not consecutive: {addrs:?}");
    }
    assert_eq!(addrs[0], 100);
}
