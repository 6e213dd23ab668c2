// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Branch emission shared by the control and loop compilers.

use crate::core::codestream::CodeStream;
use crate::core::cpu::EncodeError;
use crate::core::encoder::{BranchEncoder, Condition, OPERAND_WIDTH};
use crate::core::error::FlowErrorKind;
use crate::core::patch_stack::ForwardRef;

/// Borrowed view of a code stream together with the encoder for its target.
pub struct Emitter<'a> {
    code: &'a mut CodeStream,
    encoder: &'a dyn BranchEncoder,
}

impl<'a> Emitter<'a> {
    pub fn new(code: &'a mut CodeStream, encoder: &'a dyn BranchEncoder) -> Self {
        Self { code, encoder }
    }

    /// Address of the next emitted byte; fails once the address space is full.
    pub fn here(&self) -> Result<u16, FlowErrorKind> {
        self.code.next_address()
    }

    /// Emit `branch-if-cond over the next instruction` followed by an
    /// unconditional branch with a reserved operand.
    ///
    /// When `cond` holds control skips the unconditional branch; otherwise it
    /// lands on it and goes wherever the reserved operand is later patched.
    pub fn skip_pair(&mut self, cond: Condition) -> Result<ForwardRef, FlowErrorKind> {
        let at = self.here()?;
        let cond_len = self.encoder.conditional_len(cond)?;
        let target = u32::from(at) + u32::from(cond_len) + u32::from(self.encoder.branch_len());
        let target = u16::try_from(target)
            .map_err(|_| FlowErrorKind::AddressOverflow { address: target })?;
        let bytes = self.encoder.conditional_branch(cond, at, target)?;
        if bytes.len() != usize::from(cond_len) {
            return Err(EncodeError::new(format!(
                "conditional branch on '{cond}' encoded as {} bytes, expected {cond_len}",
                bytes.len()
            ))
            .into());
        }
        self.code.emit(&bytes)?;
        self.forward_branch()
    }

    /// Emit an unconditional branch whose operand is reserved for a later patch.
    pub fn forward_branch(&mut self) -> Result<ForwardRef, FlowErrorKind> {
        let branch = self.here()?;
        let bytes = self.encoder.unconditional_branch(0);
        let offset = usize::from(self.encoder.branch_operand_offset());
        let end = offset + usize::from(OPERAND_WIDTH);
        let (head, tail) = match (bytes.get(..offset), bytes.get(end..)) {
            (Some(head), Some(tail)) => (head, tail),
            _ => {
                return Err(EncodeError::new(format!(
                    "branch encoding of {} bytes has no operand at offset {offset}",
                    bytes.len()
                ))
                .into())
            }
        };
        self.code.emit(head)?;
        let operand = self.code.reserve_operand()?;
        self.code.emit(tail)?;
        Ok(ForwardRef { branch, operand })
    }

    /// Emit an unconditional branch to a known address.
    pub fn branch_to(&mut self, target: u16) -> Result<u16, FlowErrorKind> {
        let bytes = self.encoder.unconditional_branch(target);
        self.code.emit(&bytes)
    }

    /// Emit the target's decrement-and-branch-if-nonzero back to `anchor`.
    pub fn counted_branch(&mut self, anchor: u16) -> Result<u16, FlowErrorKind> {
        let bytes = self.encoder.counted_branch(self.here()?, anchor)?;
        self.code.emit(&bytes)
    }

    /// Patch a forward reference to `target`.
    pub fn resolve(&mut self, fwd: ForwardRef, target: u16) -> Result<(), FlowErrorKind> {
        self.code.patch_operand(fwd.operand, target)
    }
}
