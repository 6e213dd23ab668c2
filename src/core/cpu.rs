// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU identifiers and the encode error type.
//!
//! Family and CPU modules define their own identifiers and expose them through
//! the encoder registry at runtime; nothing here names a concrete processor.

use thiserror::Error;

/// Identifier for a CPU family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuFamily(&'static str);

impl CpuFamily {
    /// Create a new CPU family identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Identifier for a CPU type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuType(&'static str);

impl CpuType {
    /// Create a new CPU type identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Error returned by branch encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EncodeError {
    pub message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn unsupported_condition(cpu: CpuType, condition: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "condition '{condition}' has no branch form on {}",
            cpu.as_str()
        ))
    }

    pub fn out_of_range(mnemonic: &str, at: u16, target: u16) -> Self {
        Self::new(format!(
            "{mnemonic} at ${at:04X} cannot reach ${target:04X}"
        ))
    }
}
