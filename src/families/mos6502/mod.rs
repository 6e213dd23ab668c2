// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 family (6502, 65C02).

mod encoder;

pub use encoder::M6502Encoder;

use crate::core::cpu::{CpuFamily, CpuType};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("mos6502");
pub const CPU_6502: CpuType = CpuType::new("6502");
pub const CPU_65C02: CpuType = CpuType::new("65c02");
