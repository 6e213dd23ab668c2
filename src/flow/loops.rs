// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Loop constructs on the loop stack.
//!
//! An open loop is an anchor slot, optionally topped by one pending-exit
//! slot. Exit tests and breaks never add a second exit slot: they chain
//! through the live exit branch, so a loop needs exactly one final patch.

use crate::core::construct::Construct;
use crate::core::encoder::Condition;
use crate::core::error::{FlowErrorKind, StackKind};
use crate::core::patch_stack::{ForwardRef, PatchSlot, PatchStack, SlotRole};
use crate::flow::emitter::Emitter;

/// The innermost open loop: its anchor address and live exit, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenLoop {
    anchor: u16,
    exit: Option<ForwardRef>,
}

#[derive(Debug, Clone)]
pub struct LoopCompiler {
    stack: PatchStack,
}

impl LoopCompiler {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: PatchStack::new(StackKind::Loop, capacity),
        }
    }

    pub fn stack(&self) -> &PatchStack {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn do_open(&mut self, out: &Emitter<'_>, line: u32) -> Result<(), FlowErrorKind> {
        self.stack.push(PatchSlot::anchor(out.here()?, line))
    }

    /// Exit test: stay in the loop while `cond` holds.
    pub fn while_cond(
        &mut self,
        out: &mut Emitter<'_>,
        cond: Condition,
        line: u32,
    ) -> Result<(), FlowErrorKind> {
        self.exit_test(out, Construct::While, cond, line)
    }

    /// Exit test: leave the loop once `cond` holds.
    pub fn until_cond(
        &mut self,
        out: &mut Emitter<'_>,
        cond: Condition,
        line: u32,
    ) -> Result<(), FlowErrorKind> {
        self.exit_test(out, Construct::Until, cond.negate(), line)
    }

    pub fn end_do(&mut self, out: &mut Emitter<'_>) -> Result<bool, FlowErrorKind> {
        self.close(out, Construct::EndDo, |out, anchor| out.branch_to(anchor))
    }

    /// Close with an unconditional backward branch. Returns whether the loop
    /// had any exit.
    pub fn forever(&mut self, out: &mut Emitter<'_>) -> Result<bool, FlowErrorKind> {
        self.close(out, Construct::Forever, |out, anchor| out.branch_to(anchor))
    }

    /// Close with the target's decrement-and-branch-if-nonzero.
    pub fn counted_loop(&mut self, out: &mut Emitter<'_>) -> Result<bool, FlowErrorKind> {
        self.close(out, Construct::Loop, |out, anchor| out.counted_branch(anchor))
    }

    pub fn break_loop(&mut self, out: &mut Emitter<'_>, line: u32) -> Result<(), FlowErrorKind> {
        let open = self.innermost().ok_or(FlowErrorKind::InvalidBreakContinue {
            construct: Construct::Break,
        })?;
        match open.exit {
            Some(exit) => {
                out.branch_to(exit.branch)?;
            }
            None => {
                self.stack.ensure_room()?;
                let exit = out.forward_branch()?;
                self.stack
                    .push(PatchSlot::forward(SlotRole::LoopExit, exit, line))?;
            }
        }
        Ok(())
    }

    pub fn continue_loop(&mut self, out: &mut Emitter<'_>) -> Result<(), FlowErrorKind> {
        let invalid = FlowErrorKind::InvalidBreakContinue {
            construct: Construct::Continue,
        };
        let mut k = 0;
        let anchor = loop {
            let slot = self.stack.nth(k).map_err(|_| invalid.clone())?;
            if let Some(anchor) = slot.anchor_addr() {
                break anchor;
            }
            k += 1;
        };
        out.branch_to(anchor)?;
        Ok(())
    }

    fn exit_test(
        &mut self,
        out: &mut Emitter<'_>,
        construct: Construct,
        stay: Condition,
        line: u32,
    ) -> Result<(), FlowErrorKind> {
        let open = self.innermost().ok_or(FlowErrorKind::UnmatchedClose {
            construct,
            expected: ".do",
        })?;
        if open.exit.is_none() {
            self.stack.ensure_room()?;
        }
        let exit = out.skip_pair(stay)?;
        let slot = PatchSlot::forward(SlotRole::LoopExit, exit, line);
        match open.exit {
            Some(previous) => {
                // Earlier exits now run through this branch.
                out.resolve(previous, exit.branch)?;
                self.stack.set_top(slot)?;
            }
            None => self.stack.push(slot)?,
        }
        Ok(())
    }

    fn close<F>(
        &mut self,
        out: &mut Emitter<'_>,
        construct: Construct,
        branch_back: F,
    ) -> Result<bool, FlowErrorKind>
    where
        F: FnOnce(&mut Emitter<'_>, u16) -> Result<u16, FlowErrorKind>,
    {
        let open = self.innermost().ok_or(FlowErrorKind::UnmatchedClose {
            construct,
            expected: ".do",
        })?;
        if open.exit.is_some() {
            self.stack.pop()?;
        }
        branch_back(out, open.anchor)?;
        if let Some(exit) = open.exit {
            let here = out.here()?;
            out.resolve(exit, here)?;
        }
        self.stack.pop()?;
        Ok(open.exit.is_some())
    }

    fn innermost(&self) -> Option<OpenLoop> {
        let top = self.stack.top().ok()?;
        match top.role {
            SlotRole::LoopEntry => Some(OpenLoop {
                anchor: top.anchor_addr()?,
                exit: None,
            }),
            SlotRole::LoopExit => {
                let below = self.stack.nth(1).ok()?;
                Some(OpenLoop {
                    anchor: below.anchor_addr()?,
                    exit: top.forward_ref(),
                })
            }
            _ => None,
        }
    }
}
