// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Intel 8080 family (8080, 8085; Z80 shares the condition encoding).

mod encoder;

pub use encoder::Intel8080Encoder;

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::encoder::Condition;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("intel8080");
pub const CPU_8080: CpuType = CpuType::new("8080");
pub const CPU_8085: CpuType = CpuType::new("8085");

/// `JMP nn`.
pub const OP_JMP: u8 = 0xC3;

/// 3-bit condition field shared by `Jcc`, `Ccc` and `Rcc` on the 8080 family.
pub fn condition_code(cond: Condition) -> Option<u8> {
    match cond {
        Condition::NotZero => Some(0),
        Condition::Zero => Some(1),
        Condition::NoCarry => Some(2),
        Condition::Carry => Some(3),
        Condition::ParityOdd => Some(4),
        Condition::ParityEven => Some(5),
        Condition::Plus => Some(6),
        Condition::Minus => Some(7),
        Condition::Overflow | Condition::NoOverflow => None,
    }
}

/// `Jcc nn` opcode for `cond`.
pub fn jump_conditional_opcode(cond: Condition) -> Option<u8> {
    condition_code(cond).map(|cc| 0xC2 | (cc << 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_jump_opcodes_match_the_8080_table() {
        let expected = [
            (Condition::NotZero, 0xC2),
            (Condition::Zero, 0xCA),
            (Condition::NoCarry, 0xD2),
            (Condition::Carry, 0xDA),
            (Condition::ParityOdd, 0xE2),
            (Condition::ParityEven, 0xEA),
            (Condition::Plus, 0xF2),
            (Condition::Minus, 0xFA),
        ];
        for (cond, opcode) in expected {
            assert_eq!(jump_conditional_opcode(cond), Some(opcode), "{cond}");
        }
        assert_eq!(jump_conditional_opcode(Condition::Overflow), None);
    }
}
