// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared building blocks: code stream, patch stacks, encoder boundary and
//! diagnostics.

pub mod codestream;
pub mod construct;
pub mod cpu;
pub mod encoder;
pub mod error;
pub mod patch_stack;
pub mod registry;
