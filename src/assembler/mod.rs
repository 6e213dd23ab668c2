// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Driving layer: feeds source lines to a [`FlowCompiler`] in order and turns
//! failures into diagnostics.

pub mod cli;
pub mod source;

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::core::codestream::CodeStream;
use crate::core::error::{Diagnostic, FlowError, Severity};
use crate::flow::{FlowCompiler, FlowConfig};
use crate::registry_defaults::build_default_registry;

use cli::CliConfig;
use source::{parse_line, SourceError, SourceErrorKind, Statement};

const CODE_UNKNOWN_CPU: &str = "flw106";
const CODE_IO: &str = "flw107";
const CODE_CLI: &str = "flw108";

/// Settings for one [`assemble_source`] run.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub cpu: String,
    pub flow: FlowConfig,
    /// File name attached to diagnostics.
    pub file: Option<String>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            cpu: "z80".to_string(),
            flow: FlowConfig::default(),
            file: None,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct AssembleReport {
    code: CodeStream,
    diagnostics: Vec<Diagnostic>,
    source_lines: Arc<Vec<String>>,
}

impl AssembleReport {
    pub fn code(&self) -> &CodeStream {
        &self.code
    }

    pub fn into_code(self) -> CodeStream {
        self.code
    }

    /// Warnings produced along the way.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }
}

/// Error from a failed run. The last diagnostic is the fatal one.
#[derive(Debug)]
pub struct AssembleFailure {
    diagnostics: Vec<Diagnostic>,
    source_lines: Arc<Vec<String>>,
}

impl AssembleFailure {
    pub fn new(diagnostics: Vec<Diagnostic>, source_lines: impl Into<Arc<Vec<String>>>) -> Self {
        Self {
            diagnostics,
            source_lines: source_lines.into(),
        }
    }

    pub(crate) fn cli(message: impl Into<String>) -> Self {
        let diag = Diagnostic::new(0, Severity::Error, message).with_code(CODE_CLI);
        Self::new(vec![diag], Vec::new())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn error(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .rev()
            .find(|d| d.severity() == Severity::Error)
    }
}

impl fmt::Display for AssembleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(diag) => f.write_str(diag.message()),
            None => f.write_str("compilation failed"),
        }
    }
}

impl std::error::Error for AssembleFailure {}

/// Compile `source` line by line, stopping at the first error.
pub fn assemble_source(
    source: &str,
    options: &AssembleOptions,
) -> Result<AssembleReport, AssembleFailure> {
    let source_lines: Arc<Vec<String>> =
        Arc::new(source.lines().map(ToString::to_string).collect());
    let file = options.file.clone();
    let fail = |diag: Diagnostic, mut earlier: Vec<Diagnostic>| {
        earlier.push(diag.with_file(file.clone()));
        AssembleFailure::new(earlier, Arc::clone(&source_lines))
    };

    let registry = build_default_registry();
    let Some(encoder) = registry.resolve(&options.cpu) else {
        let diag = Diagnostic::new(
            0,
            Severity::Error,
            format!(
                "unknown CPU '{}' (supported: {})",
                options.cpu,
                registry.cpu_name_list().join(", ")
            ),
        )
        .with_code(CODE_UNKNOWN_CPU);
        return Err(fail(diag, Vec::new()));
    };
    tracing::debug!(
        cpu = encoder.cpu_id().as_str(),
        family = encoder.family_id().as_str(),
        "compiling"
    );

    let mut flow = FlowCompiler::new(encoder, options.flow);
    for (idx, text) in source_lines.iter().enumerate() {
        let line = idx as u32 + 1;
        flow.set_line(line);
        let outcome = parse_line(text)
            .map_err(|err| source_diagnostic(line, &err))
            .and_then(|statement| {
                apply_statement(&mut flow, statement, line).map_err(|err| line_diagnostic(&err))
            });
        if let Err(diag) = outcome {
            return Err(fail(diag, warning_diagnostics(&flow, &file)));
        }
    }

    let warnings = warning_diagnostics(&flow, &file);
    match flow.finish() {
        Ok(code) => Ok(AssembleReport {
            code,
            diagnostics: warnings,
            source_lines: Arc::clone(&source_lines),
        }),
        Err(err) => Err(fail(Diagnostic::from(&err), warnings)),
    }
}

/// Read, compile and write the outputs selected by `config`.
pub fn run_with_config(config: &CliConfig) -> Result<AssembleReport, AssembleFailure> {
    let file = config.input_path.to_string_lossy().to_string();
    let source = fs::read_to_string(&config.input_path)
        .map_err(|err| io_failure(&file, format!("cannot read {file}: {err}")))?;
    let options = AssembleOptions {
        cpu: config.cpu.clone(),
        flow: FlowConfig {
            origin: config.origin,
            control_depth: config.depth,
            loop_depth: config.depth,
        },
        file: Some(file.clone()),
    };
    let report = assemble_source(&source, &options)?;

    if let Some(path) = &config.hex_path {
        write_output(path, |out| report.code().write_hex(out, config.go_addr))
            .map_err(|msg| io_failure(&file, msg))?;
    }
    if let Some(path) = &config.bin_path {
        write_output(path, |out| report.code().write_bin(out))
            .map_err(|msg| io_failure(&file, msg))?;
    }
    Ok(report)
}

fn apply_statement(
    flow: &mut FlowCompiler,
    statement: Statement,
    line: u32,
) -> Result<(), LineError> {
    match statement {
        Statement::Empty => Ok(()),
        Statement::Org(origin) => {
            if flow.set_origin(origin) {
                Ok(())
            } else {
                Err(LineError::Source(
                    line,
                    SourceError::new(
                        SourceErrorKind::Misplaced,
                        1,
                        ".org must come before any emitted code or open construct",
                    ),
                ))
            }
        }
        Statement::Bytes(bytes) => flow.emit(&bytes).map(|_| ()).map_err(LineError::Flow),
        Statement::Flow(op) => flow.apply(op).map_err(LineError::Flow),
    }
}

enum LineError {
    Source(u32, SourceError),
    Flow(FlowError),
}

fn line_diagnostic(err: &LineError) -> Diagnostic {
    match err {
        LineError::Source(line, err) => source_diagnostic(*line, err),
        LineError::Flow(err) => Diagnostic::from(err),
    }
}

fn source_diagnostic(line: u32, err: &SourceError) -> Diagnostic {
    Diagnostic::new(line, Severity::Error, err.message.clone())
        .with_code(err.code())
        .with_column(Some(err.column))
}

fn warning_diagnostics(flow: &FlowCompiler, file: &Option<String>) -> Vec<Diagnostic> {
    flow.warnings()
        .iter()
        .map(|warning| Diagnostic::from(warning).with_file(file.clone()))
        .collect()
}

fn write_output<F>(path: &Path, write: F) -> Result<(), String>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path)
        .map_err(|err| format!("cannot create {}: {err}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .map_err(|err| format!("cannot write {}: {err}", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote output");
    Ok(())
}

fn io_failure(file: &str, message: String) -> AssembleFailure {
    let diag = Diagnostic::new(0, Severity::Error, message)
        .with_code(CODE_IO)
        .with_file(Some(file.to_string()));
    AssembleFailure::new(vec![diag], Vec::new())
}
