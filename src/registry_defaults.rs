// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Default encoder registry shared by the library driver and the CLI.

use crate::core::registry::EncoderRegistry;
use crate::families::intel8080::{Intel8080Encoder, CPU_8080, CPU_8085};
use crate::families::mos6502::{M6502Encoder, CPU_6502, CPU_65C02};
use crate::m6809::M6809Encoder;
use crate::z80::Z80Encoder;

/// Build the canonical default registry.
pub fn build_default_registry() -> EncoderRegistry {
    let mut registry = EncoderRegistry::new();
    registry.register(CPU_8080.as_str(), &["i8080", "intel8080"], || {
        Box::new(Intel8080Encoder::new(CPU_8080))
    });
    registry.register(CPU_8085.as_str(), &["i8085"], || {
        Box::new(Intel8080Encoder::new(CPU_8085))
    });
    registry.register(crate::z80::CPU_ID.as_str(), &["zilog"], || Box::new(Z80Encoder));
    registry.register(CPU_6502.as_str(), &["m6502", "mos6502"], || {
        Box::new(M6502Encoder::new(CPU_6502))
    });
    registry.register(CPU_65C02.as_str(), &["m65c02", "w65c02"], || {
        Box::new(M6502Encoder::new(CPU_65C02))
    });
    registry.register(crate::m6809::CPU_ID.as_str(), &["m6809"], || {
        Box::new(M6809Encoder)
    });
    registry
}
