// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing the flow compiler, its encoders and the driver.
pub mod assembler;
pub mod core;
pub mod families;
pub mod flow;
pub mod m6809;
pub mod registry_defaults;
pub mod z80;
