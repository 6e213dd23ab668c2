// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Zilog Z80 CPU support module.

mod encoder;

pub use encoder::Z80Encoder;

use crate::core::cpu::CpuType;

pub const CPU_ID: CpuType = CpuType::new("z80");
