// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for flowforge.

use std::io::{self, Write};

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use flowforge::assembler::cli::{validate_cli, Cli, OutputFormat};
use flowforge::core::error::{Diagnostic, Severity};

fn init_tracing(verbose: bool) {
    let default = if verbose { "flowforge=debug" } else { "flowforge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn format_diagnostic_line(
    diag: &Diagnostic,
    source_lines: Option<&[String]>,
    use_color: bool,
    format: OutputFormat,
) -> String {
    if format == OutputFormat::Json {
        json!({
            "code": diag.code(),
            "severity": diag.severity().as_str(),
            "message": diag.message(),
            "file": diag.file(),
            "line": diag.line(),
            "col_start": diag.column(),
        })
        .to_string()
    } else if source_lines.is_some_and(|lines| !lines.is_empty()) && diag.line() > 0 {
        diag.format_with_context(source_lines, use_color)
    } else {
        match diag.file() {
            Some(file) => format!("{file}:{}", diag.format()),
            None => diag.format(),
        }
    }
}

fn emit_diagnostics(
    diagnostics: &[Diagnostic],
    source_lines: &[String],
    format: OutputFormat,
) {
    let use_color = std::env::var("NO_COLOR").is_err();
    let mut stderr = io::stderr().lock();
    for diag in diagnostics {
        let line = format_diagnostic_line(diag, Some(source_lines), use_color, format);
        let _ = writeln!(stderr, "{line}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            emit_diagnostics(err.diagnostics(), err.source_lines(), cli.format);
            std::process::exit(1);
        }
    };

    match flowforge::assembler::run_with_config(&config) {
        Ok(report) => {
            if config.quiet {
                return;
            }
            let warnings: Vec<Diagnostic> = report
                .diagnostics()
                .iter()
                .filter(|diag| diag.severity() == Severity::Warning)
                .cloned()
                .collect();
            emit_diagnostics(&warnings, report.source_lines(), config.output_format);
        }
        Err(err) => {
            emit_diagnostics(err.diagnostics(), err.source_lines(), config.output_format);
            std::process::exit(1);
        }
    }
}
