// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Intel 8080/8085 branch encoder.
//!
//! The 8080 has no relative branches, so the skip branch is an absolute
//! `Jcc nn` and the counted loop is `DCR B ; JNZ nn`.

use crate::core::cpu::{CpuFamily, CpuType, EncodeError};
use crate::core::encoder::{BranchEncoder, Condition};

use super::{jump_conditional_opcode, CPU_8080, FAMILY_ID, OP_JMP};

const OP_DCR_B: u8 = 0x05;
const OP_JNZ: u8 = 0xC2;

/// Branch encoder for the Intel 8080 and 8085.
#[derive(Debug, Clone, Copy)]
pub struct Intel8080Encoder {
    cpu: CpuType,
}

impl Default for Intel8080Encoder {
    fn default() -> Self {
        Self::new(CPU_8080)
    }
}

impl Intel8080Encoder {
    pub fn new(cpu: CpuType) -> Self {
        Self { cpu }
    }
}

impl BranchEncoder for Intel8080Encoder {
    fn cpu_id(&self) -> CpuType {
        self.cpu
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn conditional_len(&self, cond: Condition) -> Result<u16, EncodeError> {
        jump_conditional_opcode(cond)
            .map(|_| 3)
            .ok_or_else(|| EncodeError::unsupported_condition(self.cpu, cond))
    }

    fn conditional_branch(
        &self,
        cond: Condition,
        _at: u16,
        target: u16,
    ) -> Result<Vec<u8>, EncodeError> {
        let opcode = jump_conditional_opcode(cond)
            .ok_or_else(|| EncodeError::unsupported_condition(self.cpu, cond))?;
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

    fn counted_branch(&self, _at: u16, anchor: u16) -> Result<Vec<u8>, EncodeError> {
        let [lo, hi] = anchor.to_le_bytes();
        Ok(vec![OP_DCR_B, OP_JNZ, lo, hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::intel8080::CPU_8085;

    #[test]
    fn skip_branch_is_absolute_jcc() {
        let enc = Intel8080Encoder::default();
        assert_eq!(enc.conditional_len(Condition::Zero), Ok(3));
        assert_eq!(
            enc.conditional_branch(Condition::Zero, 0x0100, 0x0106),
            Ok(vec![0xCA, 0x06, 0x01])
        );
    }

    #[test]
    fn overflow_has_no_8080_form() {
        let enc = Intel8080Encoder::new(CPU_8085);
        let err = enc.conditional_len(Condition::Overflow).unwrap_err();
        assert_eq!(err.message, "condition 'v' has no branch form on 8085");
    }

    #[test]
    fn counted_loop_decrements_b() {
        let enc = Intel8080Encoder::default();
        assert_eq!(
            enc.counted_branch(0x2000, 0x1234),
            Ok(vec![0x05, 0xC2, 0x34, 0x12])
        );
        assert_eq!(enc.unconditional_branch(0xBEEF), vec![0xC3, 0xEF, 0xBE]);
    }
}
