// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Branch and dispatch constructs: `.if/.else/.endif` and
//! `.switch/.case/.endcase/.endswitch`.
//!
//! Every open construct owns exactly one live slot on the control stack. An
//! `.else` transfers the `.if` obligation to its own branch in place, and each
//! `.endcase` chains through the switch's single exit branch instead of
//! taking a slot of its own.

use crate::core::construct::Construct;
use crate::core::encoder::Condition;
use crate::core::error::{FlowErrorKind, StackKind};
use crate::core::patch_stack::{ForwardRef, PatchSlot, PatchStack, SlotRole};
use crate::flow::emitter::Emitter;

#[derive(Debug, Clone)]
pub struct ControlCompiler {
    stack: PatchStack,
}

impl ControlCompiler {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: PatchStack::new(StackKind::Control, capacity),
        }
    }

    pub fn stack(&self) -> &PatchStack {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn if_open(
        &mut self,
        out: &mut Emitter<'_>,
        cond: Condition,
        line: u32,
    ) -> Result<(), FlowErrorKind> {
        self.stack.ensure_room()?;
        let fwd = out.skip_pair(cond)?;
        self.stack
            .push(PatchSlot::forward(SlotRole::IfBranch, fwd, line))
    }

    pub fn else_branch(&mut self, out: &mut Emitter<'_>, line: u32) -> Result<(), FlowErrorKind> {
        let pending = self.expect_top(Construct::Else, &[SlotRole::IfBranch], ".if")?;
        let skip_else = out.forward_branch()?;
        let here = out.here()?;
        out.resolve(pending, here)?;
        self.stack
            .set_top(PatchSlot::forward(SlotRole::ElseBranch, skip_else, line))?;
        Ok(())
    }

    pub fn end_if(&mut self, out: &mut Emitter<'_>) -> Result<(), FlowErrorKind> {
        let pending = self.expect_top(
            Construct::EndIf,
            &[SlotRole::IfBranch, SlotRole::ElseBranch],
            ".if",
        )?;
        let here = out.here()?;
        out.resolve(pending, here)?;
        self.stack.pop()?;
        Ok(())
    }

    pub fn switch_open(&mut self, out: &mut Emitter<'_>, line: u32) -> Result<(), FlowErrorKind> {
        self.stack.ensure_room()?;
        // Fall-through enters the first case test, not the exit branch.
        let over_exit = out.forward_branch()?;
        let exit = out.forward_branch()?;
        let here = out.here()?;
        out.resolve(over_exit, here)?;
        self.stack
            .push(PatchSlot::forward(SlotRole::SwitchExit, exit, line))
    }

    pub fn case_test(
        &mut self,
        out: &mut Emitter<'_>,
        cond: Condition,
        line: u32,
    ) -> Result<(), FlowErrorKind> {
        self.expect_top(Construct::Case, &[SlotRole::SwitchExit], ".switch")?;
        self.stack.ensure_room()?;
        let next_case = out.skip_pair(cond)?;
        self.stack
            .push(PatchSlot::forward(SlotRole::CaseTest, next_case, line))
    }

    pub fn end_case(&mut self, out: &mut Emitter<'_>) -> Result<(), FlowErrorKind> {
        let next_case = self.expect_top(Construct::EndCase, &[SlotRole::CaseTest], ".case")?;
        let exit = self
            .stack
            .nth(1)
            .ok()
            .filter(|slot| slot.role == SlotRole::SwitchExit)
            .and_then(|slot| slot.forward_ref())
            .ok_or(FlowErrorKind::UnmatchedClose {
                construct: Construct::EndCase,
                expected: ".switch",
            })?;
        out.branch_to(exit.branch)?;
        let here = out.here()?;
        out.resolve(next_case, here)?;
        self.stack.pop()?;
        Ok(())
    }

    pub fn end_switch(&mut self, out: &mut Emitter<'_>) -> Result<(), FlowErrorKind> {
        let exit = self.expect_top(Construct::EndSwitch, &[SlotRole::SwitchExit], ".switch")?;
        let here = out.here()?;
        out.resolve(exit, here)?;
        self.stack.pop()?;
        Ok(())
    }

    /// The top slot's forward reference, provided its role is one of `roles`.
    fn expect_top(
        &self,
        construct: Construct,
        roles: &[SlotRole],
        expected: &'static str,
    ) -> Result<ForwardRef, FlowErrorKind> {
        self.stack
            .top()
            .ok()
            .filter(|slot| roles.contains(&slot.role))
            .and_then(|slot| slot.forward_ref())
            .ok_or(FlowErrorKind::UnmatchedClose {
                construct,
                expected,
            })
    }
}
