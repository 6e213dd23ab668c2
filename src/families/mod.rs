// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU family encoders.
//!
//! Family modules hold the branch encodings shared by a group of related
//! CPUs; CPU-specific variants live in their own top-level modules.

pub mod intel8080;
pub mod mos6502;
