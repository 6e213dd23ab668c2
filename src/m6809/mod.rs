// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 6809 CPU support module.

mod encoder;

pub use encoder::M6809Encoder;

use crate::core::cpu::{CpuFamily, CpuType};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("motorola6809");
pub const CPU_ID: CpuType = CpuType::new("6809");
