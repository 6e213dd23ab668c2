// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Z80 branch encoder.
//!
//! Skip branches use `JR cc,e` where the Z80 has it (NZ, Z, NC, C) and fall
//! back to the 8080 `JP cc,nn` for the parity and sign conditions. Counted
//! loops use `DJNZ`, which only reaches -126..+129 bytes.

use crate::core::cpu::{CpuFamily, CpuType, EncodeError};
use crate::core::encoder::{relative_displacement, BranchEncoder, Condition};
use crate::families::intel8080::{jump_conditional_opcode, FAMILY_ID, OP_JMP};

use super::CPU_ID;

const OP_DJNZ: u8 = 0x10;

fn jr_opcode(cond: Condition) -> Option<u8> {
    match cond {
        Condition::NotZero => Some(0x20),
        Condition::Zero => Some(0x28),
        Condition::NoCarry => Some(0x30),
        Condition::Carry => Some(0x38),
        _ => None,
    }
}

/// Branch encoder for the Zilog Z80.
#[derive(Debug, Clone, Copy, Default)]
pub struct Z80Encoder;

impl BranchEncoder for Z80Encoder {
    fn cpu_id(&self) -> CpuType {
        CPU_ID
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn conditional_len(&self, cond: Condition) -> Result<u16, EncodeError> {
        if jr_opcode(cond).is_some() {
            return Ok(2);
        }
        jump_conditional_opcode(cond)
            .map(|_| 3)
            .ok_or_else(|| EncodeError::unsupported_condition(CPU_ID, cond))
    }

    fn conditional_branch(
        &self,
        cond: Condition,
        at: u16,
        target: u16,
    ) -> Result<Vec<u8>, EncodeError> {
        if let Some(opcode) = jr_opcode(cond) {
            let disp = relative_displacement("JR", at, 2, target)?;
            return Ok(vec![opcode, disp]);
        }
        let opcode = jump_conditional_opcode(cond)
            .ok_or_else(|| EncodeError::unsupported_condition(CPU_ID, cond))?;
        let [lo, hi] = target.to_le_bytes();
        Ok(vec![opcode, lo, hi])
    }

    fn branch_len(&self) -> u16 {
        3
    }

    fn branch_operand_offset(&self) -> u16 {
        1
    }

    fn unconditional_branch(&self, target: u16) -> Vec<u8> {
        let [lo, hi] = target.to_le_bytes();
        vec![OP_JMP, lo, hi]
    }

    fn counted_branch(&self, at: u16, anchor: u16) -> Result<Vec<u8>, EncodeError> {
        let disp = relative_displacement("DJNZ", at, 2, anchor)?;
        Ok(vec![OP_DJNZ, disp])
    }
}
