// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 6809 branch encoder. Operands are big-endian.

use crate::core::cpu::{CpuFamily, CpuType, EncodeError};
use crate::core::encoder::{relative_displacement, BranchEncoder, ByteOrder, Condition};

use super::{CPU_ID, FAMILY_ID};

const OP_JMP_EXT: u8 = 0x7E;
const OP_DECB: u8 = 0x5A;
const OP_BNE: u8 = 0x26;

fn branch_opcode(cond: Condition) -> Option<u8> {
    match cond {
        Condition::NoCarry => Some(0x24),
        Condition::Carry => Some(0x25),
        Condition::NotZero => Some(0x26),
        Condition::Zero => Some(0x27),
        Condition::NoOverflow => Some(0x28),
        Condition::Overflow => Some(0x29),
        Condition::Plus => Some(0x2A),
        Condition::Minus => Some(0x2B),
        Condition::ParityEven | Condition::ParityOdd => None,
    }
}

/// Branch encoder for the Motorola 6809.
#[derive(Debug, Clone, Copy, Default)]
pub struct M6809Encoder;

impl BranchEncoder for M6809Encoder {
    fn cpu_id(&self) -> CpuType {
        CPU_ID
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::Big
    }

    fn conditional_len(&self, cond: Condition) -> Result<u16, EncodeError> {
        branch_opcode(cond)
            .map(|_| 2)
            .ok_or_else(|| EncodeError::unsupported_condition(CPU_ID, cond))
    }

    fn conditional_branch(
        &self,
        cond: Condition,
        at: u16,
        target: u16,
    ) -> Result<Vec<u8>, EncodeError> {
        let opcode = branch_opcode(cond)
            .ok_or_else(|| EncodeError::unsupported_condition(CPU_ID, cond))?;
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
        let [hi, lo] = target.to_be_bytes();
        vec![OP_JMP_EXT, hi, lo]
    }

    fn counted_branch(&self, at: u16, anchor: u16) -> Result<Vec<u8>, EncodeError> {
        let disp = relative_displacement("BNE", at.wrapping_add(1), 2, anchor)?;
        Ok(vec![OP_DECB, OP_BNE, disp])
    }
}
