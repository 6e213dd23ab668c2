// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Bounded stack of pending control addresses.
//!
//! Each slot stores the addresses it needs as named fields fixed at emission
//! time: a forward reference knows both its branch instruction and the
//! operand to patch, an anchor knows the address later code branches back to.

use crate::core::error::{FlowErrorKind, StackKind};

/// Default nesting capacity of each patch stack.
pub const DEFAULT_STACK_CAPACITY: usize = 12;

/// An emitted unconditional branch whose operand is still a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardRef {
    /// Address of the branch instruction itself (chain-through target).
    pub branch: u16,
    /// Address of the 2-byte operand awaiting its target.
    pub operand: u16,
}

/// What a slot is waiting for, used to check bracket matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    IfBranch,
    ElseBranch,
    SwitchExit,
    CaseTest,
    LoopEntry,
    LoopExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    /// Unresolved forward reference.
    Forward(ForwardRef),
    /// Resolved address available for backward branches.
    Anchor(u16),
}

/// One patch stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSlot {
    pub role: SlotRole,
    pub target: SlotTarget,
    /// Source line of the construct that created the slot.
    pub line: u32,
}

impl PatchSlot {
    pub fn forward(role: SlotRole, fwd: ForwardRef, line: u32) -> Self {
        Self {
            role,
            target: SlotTarget::Forward(fwd),
            line,
        }
    }

    pub fn anchor(addr: u16, line: u32) -> Self {
        Self {
            role: SlotRole::LoopEntry,
            target: SlotTarget::Anchor(addr),
            line,
        }
    }

    pub fn forward_ref(&self) -> Option<ForwardRef> {
        match self.target {
            SlotTarget::Forward(fwd) => Some(fwd),
            SlotTarget::Anchor(_) => None,
        }
    }

    pub fn anchor_addr(&self) -> Option<u16> {
        match self.target {
            SlotTarget::Anchor(addr) => Some(addr),
            SlotTarget::Forward(_) => None,
        }
    }
}

/// Bounded LIFO of [`PatchSlot`]s that fails loudly at both ends.
#[derive(Debug, Clone)]
pub struct PatchStack {
    kind: StackKind,
    capacity: usize,
    slots: Vec<PatchSlot>,
}

impl PatchStack {
    pub fn new(kind: StackKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fail with `StackOverflow` if one more push would exceed capacity.
    pub fn ensure_room(&self) -> Result<(), FlowErrorKind> {
        if self.slots.len() >= self.capacity {
            return Err(FlowErrorKind::StackOverflow {
                stack: self.kind,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, slot: PatchSlot) -> Result<(), FlowErrorKind> {
        self.ensure_room()?;
        self.slots.push(slot);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<PatchSlot, FlowErrorKind> {
        self.slots.pop().ok_or(self.underflow())
    }

    pub fn top(&self) -> Result<PatchSlot, FlowErrorKind> {
        self.slots.last().copied().ok_or(self.underflow())
    }

    /// Replace the top slot in place; returns the slot it displaced.
    pub fn set_top(&mut self, slot: PatchSlot) -> Result<PatchSlot, FlowErrorKind> {
        let underflow = self.underflow();
        let top = self.slots.last_mut().ok_or(underflow)?;
        Ok(std::mem::replace(top, slot))
    }

    /// The slot `k` levels below the top (`nth(0)` is the top).
    pub fn nth(&self, k: usize) -> Result<PatchSlot, FlowErrorKind> {
        let depth = self.slots.len();
        if k >= depth {
            return Err(FlowErrorKind::DepthOutOfRange {
                stack: self.kind,
                index: k,
                depth,
            });
        }
        Ok(self.slots[depth - 1 - k])
    }

    /// Slots from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &PatchSlot> {
        self.slots.iter()
    }

    fn underflow(&self) -> FlowErrorKind {
        FlowErrorKind::StackUnderflow { stack: self.kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fwd(branch: u16) -> ForwardRef {
        ForwardRef {
            branch,
            operand: branch + 1,
        }
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut stack = PatchStack::new(StackKind::Control, 4);
        stack
            .push(PatchSlot::forward(SlotRole::IfBranch, fwd(0x10), 1))
            .unwrap();
        stack.push(PatchSlot::anchor(0x20, 2)).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap().anchor_addr(), Some(0x20));
        assert_eq!(stack.pop().unwrap().forward_ref(), Some(fwd(0x10)));
        assert!(stack.is_empty());
    }

    #[test]
    fn overflow_is_reported_not_dropped() {
        let mut stack = PatchStack::new(StackKind::Loop, 2);
        stack.push(PatchSlot::anchor(1, 1)).unwrap();
        stack.push(PatchSlot::anchor(2, 2)).unwrap();
        let err = stack.push(PatchSlot::anchor(3, 3)).unwrap_err();
        assert_eq!(
            err,
            FlowErrorKind::StackOverflow {
                stack: StackKind::Loop,
                capacity: 2
            }
        );
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top().unwrap().anchor_addr(), Some(2));
    }

    #[test]
    fn empty_stack_underflows_on_every_read() {
        let mut stack = PatchStack::new(StackKind::Control, DEFAULT_STACK_CAPACITY);
        let underflow = FlowErrorKind::StackUnderflow {
            stack: StackKind::Control,
        };
        assert_eq!(stack.pop().unwrap_err(), underflow);
        assert_eq!(stack.top().unwrap_err(), underflow);
        assert_eq!(
            stack.set_top(PatchSlot::anchor(0, 0)).unwrap_err(),
            underflow
        );
    }

    #[test]
    fn set_top_keeps_depth_and_returns_previous() {
        let mut stack = PatchStack::new(StackKind::Control, 4);
        stack.push(PatchSlot::anchor(0x40, 1)).unwrap();
        stack
            .push(PatchSlot::forward(SlotRole::IfBranch, fwd(0x50), 2))
            .unwrap();
        let old = stack
            .set_top(PatchSlot::forward(SlotRole::ElseBranch, fwd(0x60), 2))
            .unwrap();
        assert_eq!(old.role, SlotRole::IfBranch);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top().unwrap().role, SlotRole::ElseBranch);
        assert_eq!(stack.nth(1).unwrap().anchor_addr(), Some(0x40));
    }

    #[test]
    fn nth_counts_from_the_top() {
        let mut stack = PatchStack::new(StackKind::Loop, 4);
        for addr in [1u16, 2, 3] {
            stack.push(PatchSlot::anchor(addr, 0)).unwrap();
        }
        assert_eq!(stack.nth(0).unwrap().anchor_addr(), Some(3));
        assert_eq!(stack.nth(2).unwrap().anchor_addr(), Some(1));
        assert_eq!(
            stack.nth(3).unwrap_err(),
            FlowErrorKind::DepthOutOfRange {
                stack: StackKind::Loop,
                index: 3,
                depth: 3
            }
        );
    }
}
