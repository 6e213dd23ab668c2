// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 6502 branch encoder: `Bcc e`, `JMP nn`, and `DEX ; BNE e` for counted loops.

use crate::core::cpu::{CpuFamily, CpuType, EncodeError};
use crate::core::encoder::{relative_displacement, BranchEncoder, Condition};

use super::{CPU_6502, FAMILY_ID};

const OP_JMP_ABS: u8 = 0x4C;
const OP_DEX: u8 = 0xCA;
const OP_BNE: u8 = 0xD0;

fn branch_opcode(cond: Condition) -> Option<u8> {
    match cond {
        Condition::Plus => Some(0x10),
        Condition::Minus => Some(0x30),
        Condition::NoOverflow => Some(0x50),
        Condition::Overflow => Some(0x70),
        Condition::NoCarry => Some(0x90),
        Condition::Carry => Some(0xB0),
        Condition::NotZero => Some(0xD0),
        Condition::Zero => Some(0xF0),
        Condition::ParityEven | Condition::ParityOdd => None,
    }
}

/// Branch encoder for the 6502 and 65C02.
#[derive(Debug, Clone, Copy)]
pub struct M6502Encoder {
    cpu: CpuType,
}

impl Default for M6502Encoder {
    fn default() -> Self {
        Self::new(CPU_6502)
    }
}

impl M6502Encoder {
    pub fn new(cpu: CpuType) -> Self {
        Self { cpu }
    }

    fn opcode(&self, cond: Condition) -> Result<u8, EncodeError> {
        branch_opcode(cond).ok_or_else(|| EncodeError::unsupported_condition(self.cpu, cond))
    }
}

impl BranchEncoder for M6502Encoder {
    fn cpu_id(&self) -> CpuType {
        self.cpu
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn conditional_len(&self, cond: Condition) -> Result<u16, EncodeError> {
        self.opcode(cond).map(|_| 2)
    }

    fn conditional_branch(
        &self,
        cond: Condition,
        at: u16,
        target: u16,
    ) -> Result<Vec<u8>, EncodeError> {
        let opcode = self.opcode(cond)?;
        let disp = relative_displacement("Bcc", at, 2, target)?;
        Ok(vec![opcode, disp])
    }

    fn branch_len(&self) -> u16 {
        3
    }

    fn branch_operand_offset(&self) -> u16 {
        1
    }

    fn unconditional_branch(&self, target: u16) -> Vec<u8> {
        let [lo, hi] = target.to_le_bytes();
        vec![OP_JMP_ABS, lo, hi]
    }

    fn counted_branch(&self, at: u16, anchor: u16) -> Result<Vec<u8>, EncodeError> {
        let disp = relative_displacement("BNE", at.wrapping_add(1), 2, anchor)?;
        Ok(vec![OP_DEX, OP_BNE, disp])
    }
}
