// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Branch encoding boundary.
//!
//! The flow compilers never build instruction bytes themselves. They ask a
//! [`BranchEncoder`] for the three shapes they need:
//!
//! - a short conditional branch that skips exactly one unconditional branch,
//! - an unconditional branch with a 16-bit absolute operand,
//! - the target's counted decrement-and-branch-if-nonzero form.

use std::fmt;
use std::str::FromStr;

use crate::core::cpu::{CpuFamily, CpuType, EncodeError};

/// Width in bytes of every patchable branch operand.
pub const OPERAND_WIDTH: u16 = 2;

/// Byte order of 16-bit operands on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn word_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

/// Flag condition tested by a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Zero,
    NotZero,
    Carry,
    NoCarry,
    Plus,
    Minus,
    ParityEven,
    ParityOdd,
    Overflow,
    NoOverflow,
}

impl Condition {
    pub const ALL: [Condition; 10] = [
        Condition::Zero,
        Condition::NotZero,
        Condition::Carry,
        Condition::NoCarry,
        Condition::Plus,
        Condition::Minus,
        Condition::ParityEven,
        Condition::ParityOdd,
        Condition::Overflow,
        Condition::NoOverflow,
    ];

    /// The condition with opposite polarity.
    pub fn negate(self) -> Self {
        match self {
            Condition::Zero => Condition::NotZero,
            Condition::NotZero => Condition::Zero,
            Condition::Carry => Condition::NoCarry,
            Condition::NoCarry => Condition::Carry,
            Condition::Plus => Condition::Minus,
            Condition::Minus => Condition::Plus,
            Condition::ParityEven => Condition::ParityOdd,
            Condition::ParityOdd => Condition::ParityEven,
            Condition::Overflow => Condition::NoOverflow,
            Condition::NoOverflow => Condition::Overflow,
        }
    }

    /// Canonical lowercase mnemonic.
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Zero => "z",
            Condition::NotZero => "nz",
            Condition::Carry => "c",
            Condition::NoCarry => "nc",
            Condition::Plus => "p",
            Condition::Minus => "m",
            Condition::ParityEven => "pe",
            Condition::ParityOdd => "po",
            Condition::Overflow => "v",
            Condition::NoOverflow => "nv",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cond = match s.trim().to_ascii_lowercase().as_str() {
            "z" | "eq" => Condition::Zero,
            "nz" | "ne" => Condition::NotZero,
            "c" | "cs" => Condition::Carry,
            "nc" | "cc" => Condition::NoCarry,
            "p" | "pl" => Condition::Plus,
            "m" | "mi" => Condition::Minus,
            "pe" => Condition::ParityEven,
            "po" => Condition::ParityOdd,
            "v" | "vs" => Condition::Overflow,
            "nv" | "vc" => Condition::NoOverflow,
            other => return Err(format!("unknown condition '{other}'")),
        };
        Ok(cond)
    }
}

/// Encodes the branch shapes used by the flow compilers.
///
/// Implementations are stateless; addresses are passed in so relative forms
/// can compute displacements.
pub trait BranchEncoder: Send + Sync {
    fn cpu_id(&self) -> CpuType;

    fn family_id(&self) -> CpuFamily;

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::Little
    }

    /// Length of the short conditional branch for `cond`.
    fn conditional_len(&self, cond: Condition) -> Result<u16, EncodeError>;

    /// Short branch placed at `at`, taken to `target` when `cond` holds.
    fn conditional_branch(
        &self,
        cond: Condition,
        at: u16,
        target: u16,
    ) -> Result<Vec<u8>, EncodeError>;

    /// Length of the unconditional branch.
    fn branch_len(&self) -> u16;

    /// Offset of the 16-bit operand inside the unconditional branch.
    fn branch_operand_offset(&self) -> u16;

    fn unconditional_branch(&self, target: u16) -> Vec<u8>;

    /// Counted decrement-and-branch-if-nonzero placed at `at`, looping to `anchor`.
    fn counted_branch(&self, at: u16, anchor: u16) -> Result<Vec<u8>, EncodeError>;
}

/// Signed 8-bit displacement from the end of an `len`-byte instruction at `at`.
pub fn relative_displacement(
    mnemonic: &str,
    at: u16,
    len: u16,
    target: u16,
) -> Result<u8, EncodeError> {
    let next = i32::from(at) + i32::from(len);
    let delta = i32::from(target) - next;
    i8::try_from(delta)
        .map(|d| d as u8)
        .map_err(|_| EncodeError::out_of_range(mnemonic, at, target))
}
