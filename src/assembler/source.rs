// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line parser for the flow source dialect.
//!
//! One statement per line, `;` starts a comment, directive keywords are
//! case-insensitive. Columns in errors are 1-based.

use thiserror::Error;

use crate::core::construct::Construct;
use crate::core::encoder::Condition;
use crate::flow::FlowOp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Empty,
    Org(u16),
    Bytes(Vec<u8>),
    Flow(FlowOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    UnknownDirective,
    BadCondition,
    BadNumber,
    Operand,
    Misplaced,
}

impl SourceErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            SourceErrorKind::UnknownDirective => "flw101",
            SourceErrorKind::BadCondition => "flw102",
            SourceErrorKind::BadNumber => "flw103",
            SourceErrorKind::Operand => "flw104",
            SourceErrorKind::Misplaced => "flw105",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub column: usize,
    pub message: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, column: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            column,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

pub fn parse_line(line: &str) -> Result<Statement, SourceError> {
    let text = match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let start = text.len() - text.trim_start().len();
    let text = text.trim_end();
    if start >= text.len() {
        return Ok(Statement::Empty);
    }
    let body = &text[start..];
    let Some(directive) = body.strip_prefix('.') else {
        return Err(SourceError::new(
            SourceErrorKind::UnknownDirective,
            start + 1,
            "expected a directive",
        ));
    };

    let word_len = directive
        .find(char::is_whitespace)
        .unwrap_or(directive.len());
    let word = &directive[..word_len];
    let rest = &directive[word_len..];
    let operand_col = start + 2 + word_len + (rest.len() - rest.trim_start().len());
    let operand = rest.trim();

    match word.to_ascii_lowercase().as_str() {
        "org" => {
            let value = parse_number(operand).ok_or_else(|| bad_number(operand, operand_col))?;
            let origin = u16::try_from(value).map_err(|_| {
                SourceError::new(
                    SourceErrorKind::BadNumber,
                    operand_col,
                    format!("origin ${value:X} is outside the 16-bit address space"),
                )
            })?;
            Ok(Statement::Org(origin))
        }
        "byte" | "db" => parse_bytes(operand, operand_col).map(Statement::Bytes),
        _ => {
            let construct = Construct::from_keyword(word).ok_or_else(|| {
                SourceError::new(
                    SourceErrorKind::UnknownDirective,
                    start + 1,
                    format!("unknown directive '.{word}'"),
                )
            })?;
            parse_construct(construct, operand, operand_col).map(Statement::Flow)
        }
    }
}

fn parse_construct(
    construct: Construct,
    operand: &str,
    column: usize,
) -> Result<FlowOp, SourceError> {
    let cond = match (construct.takes_condition(), operand.is_empty()) {
        (true, true) => {
            return Err(SourceError::new(
                SourceErrorKind::Operand,
                column,
                format!("{construct} requires a condition"),
            ))
        }
        (false, false) => {
            return Err(SourceError::new(
                SourceErrorKind::Operand,
                column,
                format!("{construct} takes no operand"),
            ))
        }
        (true, false) => Some(
            operand
                .parse::<Condition>()
                .map_err(|msg| SourceError::new(SourceErrorKind::BadCondition, column, msg))?,
        ),
        (false, true) => None,
    };
    FlowOp::new(construct, cond).ok_or_else(|| {
        SourceError::new(
            SourceErrorKind::Operand,
            column,
            format!("invalid operand for {construct}"),
        )
    })
}

fn parse_bytes(operand: &str, column: usize) -> Result<Vec<u8>, SourceError> {
    if operand.is_empty() {
        return Err(SourceError::new(
            SourceErrorKind::Operand,
            column,
            "expected at least one byte value",
        ));
    }
    let mut values = Vec::new();
    let mut offset = 0;
    for item in operand.split(',') {
        let lead = item.len() - item.trim_start().len();
        let item_col = column + offset + lead;
        let token = item.trim();
        let value = parse_number(token).ok_or_else(|| bad_number(token, item_col))?;
        let byte = u8::try_from(value).map_err(|_| {
            SourceError::new(
                SourceErrorKind::BadNumber,
                item_col,
                format!("byte value {token} is out of range"),
            )
        })?;
        values.push(byte);
        offset += item.len() + 1;
    }
    Ok(values)
}

fn bad_number(token: &str, column: usize) -> SourceError {
    let message = if token.is_empty() {
        "expected a number".to_string()
    } else {
        format!("invalid number '{token}'")
    };
    SourceError::new(SourceErrorKind::BadNumber, column, message)
}

/// Parse decimal, `$hex`, `0xhex` or `%binary`.
pub fn parse_number(text: &str) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix('$') {
        (hex, 16)
    } else if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix('%') {
        (bin, 2)
    } else {
        (text, 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}
