// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, warnings and diagnostics for flow compilation.

use std::fmt;

use thiserror::Error;

use crate::core::construct::Construct;
use crate::core::cpu::EncodeError;

/// Which of the two patch stacks an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Control,
    Loop,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackKind::Control => f.write_str("control"),
            StackKind::Loop => f.write_str("loop"),
        }
    }
}

/// Categories of flow compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowErrorKind {
    #[error("{stack} stack overflow: nesting deeper than {capacity} levels")]
    StackOverflow { stack: StackKind, capacity: usize },
    #[error("{stack} stack underflow")]
    StackUnderflow { stack: StackKind },
    #[error("{stack} stack has no entry {index} below the top (depth {depth})")]
    DepthOutOfRange {
        stack: StackKind,
        index: usize,
        depth: usize,
    },
    #[error("{construct} without matching {expected}")]
    UnmatchedClose {
        construct: Construct,
        expected: &'static str,
    },
    #[error(
        "{count} unresolved forward reference(s) at end of input{}",
        opened_by_suffix(.opened_by)
    )]
    UnresolvedReferenceAtEnd {
        count: usize,
        opened_by: Option<Construct>,
    },
    #[error("{construct} outside of any loop")]
    InvalidBreakContinue { construct: Construct },
    #[error("{construct} is never closed")]
    UnclosedConstruct { construct: Construct },
    #[error("code runs past the 16-bit address space (${address:05X})")]
    AddressOverflow { address: u32 },
    #[error("patch at ${address:04X} lies beyond the cursor at ${here:04X}")]
    PatchBeyondCursor { address: u16, here: u32 },
    #[error("no outstanding operand reservation at ${address:04X}")]
    InvalidPatch { address: u16 },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

fn opened_by_suffix(opened_by: &Option<Construct>) -> String {
    match opened_by {
        Some(construct) => format!(" (innermost opened by {construct})"),
        None => String::new(),
    }
}

impl FlowErrorKind {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            FlowErrorKind::StackOverflow { .. } => "flw201",
            FlowErrorKind::StackUnderflow { .. } => "flw202",
            FlowErrorKind::DepthOutOfRange { .. } => "flw203",
            FlowErrorKind::UnmatchedClose { .. } => "flw204",
            FlowErrorKind::UnresolvedReferenceAtEnd { .. } => "flw205",
            FlowErrorKind::InvalidBreakContinue { .. } => "flw206",
            FlowErrorKind::UnclosedConstruct { .. } => "flw207",
            FlowErrorKind::AddressOverflow { .. } => "flw301",
            FlowErrorKind::PatchBeyondCursor { .. } => "flw302",
            FlowErrorKind::InvalidPatch { .. } => "flw303",
            FlowErrorKind::Encode(_) => "flw401",
        }
    }
}

/// A flow failure tied to the source line of the offending construct.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct FlowError {
    kind: FlowErrorKind,
    line: u32,
}

impl FlowError {
    pub fn new(kind: FlowErrorKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn kind(&self) -> &FlowErrorKind {
        &self.kind
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Non-fatal findings recorded while compiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowWarningKind {
    /// A `.forever` loop with no break or exit test.
    EndlessLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowWarning {
    pub kind: FlowWarningKind,
    pub line: u32,
}

impl FlowWarning {
    pub fn code(&self) -> &'static str {
        match self.kind {
            FlowWarningKind::EndlessLoop => "flw501",
        }
    }
}

impl fmt::Display for FlowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FlowWarningKind::EndlessLoop => {
                f.write_str("loop closed by .forever has no exit; it never terminates")
            }
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) code: String,
    pub(crate) severity: Severity,
    pub(crate) message: String,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            code: "flw001".to_string(),
            severity,
            message: message.into(),
            file: None,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {} [{}] - {}",
            self.line,
            self.severity.label(),
            self.code,
            self.message
        )
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = self.severity.label();
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev} [{}]", self.line, self.code),
            None => format!("{}: {sev} [{}]", self.line, self.code),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');
        for line in build_context_lines(self.line, self.column, lines, use_color) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("{sev}: {}", self.message));
        out
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&FlowError> for Diagnostic {
    fn from(err: &FlowError) -> Self {
        Diagnostic::new(err.line(), Severity::Error, err.kind().to_string()).with_code(err.code())
    }
}

impl From<&FlowWarning> for Diagnostic {
    fn from(warning: &FlowWarning) -> Self {
        Diagnostic::new(warning.line, Severity::Warning, warning.to_string())
            .with_code(warning.code())
    }
}

/// Source line `line_num` with the gutter, plus a caret line under the
/// column when colour is off.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    use_color: bool,
) -> Vec<String> {
    let text = line_num
        .checked_sub(1)
        .and_then(|idx| lines?.get(idx as usize));
    let Some(text) = text else {
        return vec![format!("{line_num:>5} | <source unavailable>")];
    };
    let mut out = vec![format!(
        "{line_num:>5} | {}",
        highlight_line(text, column, use_color)
    )];
    if !use_color {
        if let Some(pad) = caret_offset(text, column) {
            out.push(format!("{:>5} | {}^", "", " ".repeat(pad)));
        }
    }
    out
}

/// Colour the character at 1-based byte `column` (as reported by the line
/// parser). Past the end of the line a red caret is appended instead.
pub fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let Some(idx) = column.and_then(|col| col.checked_sub(1)) else {
        return line.to_string();
    };
    if !use_color {
        return line.to_string();
    }
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    match line.get(idx..).and_then(|tail| tail.chars().next()) {
        Some(ch) => {
            let after = idx + ch.len_utf8();
            format!("{}{RED}{ch}{RESET}{}", &line[..idx], &line[after..])
        }
        None => format!("{line}{RED}^{RESET}"),
    }
}

/// Display width before the caret for `column`, clamped to the line end.
fn caret_offset(line: &str, column: Option<usize>) -> Option<usize> {
    let idx = column?.checked_sub(1)?;
    let head = line.get(..idx.min(line.len())).unwrap_or(line);
    Some(head.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_error_display_carries_line() {
        let err = FlowError::new(
            FlowErrorKind::UnmatchedClose {
                construct: Construct::EndIf,
                expected: ".if",
            },
            14,
        );
        assert_eq!(err.to_string(), "line 14: .endif without matching .if");
        assert_eq!(err.code(), "flw204");
    }

    #[test]
    fn unresolved_reference_mentions_opening_construct() {
        let kind = FlowErrorKind::UnresolvedReferenceAtEnd {
            count: 2,
            opened_by: Some(Construct::Switch),
        };
        assert_eq!(
            kind.to_string(),
            "2 unresolved forward reference(s) at end of input (innermost opened by .switch)"
        );
        let bare = FlowErrorKind::UnresolvedReferenceAtEnd {
            count: 1,
            opened_by: None,
        };
        assert_eq!(
            bare.to_string(),
            "1 unresolved forward reference(s) at end of input"
        );
    }

    #[test]
    fn encode_errors_convert_transparently() {
        let kind: FlowErrorKind = EncodeError::new("DJNZ out of range").into();
        assert_eq!(kind.to_string(), "DJNZ out of range");
        assert_eq!(kind.code(), "flw401");
    }

    #[test]
    fn diagnostic_format_includes_line_and_severity() {
        let err = FlowError::new(
            FlowErrorKind::InvalidBreakContinue {
                construct: Construct::Break,
            },
            3,
        );
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.format(), "3: ERROR [flw206] - .break outside of any loop");
    }

    #[test]
    fn format_with_context_highlights_column() {
        let diag = Diagnostic::new(2, Severity::Error, "unknown condition 'q'")
            .with_code("flw102")
            .with_file(Some("demo.fs".to_string()))
            .with_column(Some(5));
        let lines = vec![".do".to_string(), ".if q".to_string()];
        let rendered = diag.format_with_context(Some(&lines[..]), false);
        let expected = [
            "demo.fs:2: ERROR [flw102]",
            "    2 | .if q",
            "      |     ^",
            "ERROR: unknown condition 'q'",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn context_lines_fall_back_when_source_missing() {
        let empty: Vec<String> = Vec::new();
        let lines = build_context_lines(9, None, Some(&empty[..]), false);
        assert_eq!(lines, vec!["    9 | <source unavailable>".to_string()]);
    }

    #[test]
    fn highlight_line_colors_the_column() {
        assert_eq!(
            highlight_line("abc", Some(2), true),
            "a\x1b[31mb\x1b[0mc".to_string()
        );
        assert_eq!(
            highlight_line("abc", Some(9), true),
            "abc\x1b[31m^\x1b[0m".to_string()
        );
        assert_eq!(highlight_line("abc", Some(2), false), "abc".to_string());
    }

    #[test]
    fn plain_context_puts_a_caret_under_the_column() {
        let lines = vec!["  .while xx".to_string()];
        assert_eq!(
            build_context_lines(1, Some(10), Some(&lines[..]), false),
            vec![
                "    1 |   .while xx".to_string(),
                "      |          ^".to_string(),
            ]
        );
        assert_eq!(
            build_context_lines(1, None, Some(&lines[..]), false),
            vec!["    1 |   .while xx".to_string()]
        );
        assert_eq!(
            build_context_lines(1, Some(20), Some(&lines[..]), false)[1],
            "      |            ^".to_string()
        );
    }

    #[test]
    fn warnings_become_warning_diagnostics() {
        let warning = FlowWarning {
            kind: FlowWarningKind::EndlessLoop,
            line: 6,
        };
        let diag = Diagnostic::from(&warning);
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(diag.code(), "flw501");
    }
}
