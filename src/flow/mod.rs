// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Single-pass structured flow compiler.
//!
//! A [`FlowCompiler`] owns one compilation unit: the code stream, the branch
//! encoder for the target and two independent patch stacks, one for
//! `.if/.switch` constructs and one for loops. Constructs are compiled in
//! call order with no look-ahead; forward branches are reserved and patched
//! once their target is reached.

pub mod control;
pub mod emitter;
pub mod loops;

use crate::core::codestream::CodeStream;
use crate::core::construct::Construct;
use crate::core::encoder::{BranchEncoder, Condition};
use crate::core::error::{FlowError, FlowErrorKind, FlowWarning, FlowWarningKind};
use crate::core::patch_stack::{PatchSlot, SlotRole, DEFAULT_STACK_CAPACITY};

use control::ControlCompiler;
use emitter::Emitter;
use loops::LoopCompiler;

/// Origin and stack capacities for one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    pub origin: u16,
    pub control_depth: usize,
    pub loop_depth: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            origin: 0,
            control_depth: DEFAULT_STACK_CAPACITY,
            loop_depth: DEFAULT_STACK_CAPACITY,
        }
    }
}

/// One construct invocation with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOp {
    If(Condition),
    Else,
    EndIf,
    Switch,
    Case(Condition),
    EndCase,
    EndSwitch,
    Do,
    While(Condition),
    Until(Condition),
    EndDo,
    Forever,
    Loop,
    Break,
    Continue,
}

impl FlowOp {
    /// Build an op from a construct keyword; `cond` must be present exactly
    /// when the construct takes one.
    pub fn new(construct: Construct, cond: Option<Condition>) -> Option<Self> {
        let op = match (construct, cond) {
            (Construct::If, Some(cond)) => FlowOp::If(cond),
            (Construct::Case, Some(cond)) => FlowOp::Case(cond),
            (Construct::While, Some(cond)) => FlowOp::While(cond),
            (Construct::Until, Some(cond)) => FlowOp::Until(cond),
            (Construct::Else, None) => FlowOp::Else,
            (Construct::EndIf, None) => FlowOp::EndIf,
            (Construct::Switch, None) => FlowOp::Switch,
            (Construct::EndCase, None) => FlowOp::EndCase,
            (Construct::EndSwitch, None) => FlowOp::EndSwitch,
            (Construct::Do, None) => FlowOp::Do,
            (Construct::EndDo, None) => FlowOp::EndDo,
            (Construct::Forever, None) => FlowOp::Forever,
            (Construct::Loop, None) => FlowOp::Loop,
            (Construct::Break, None) => FlowOp::Break,
            (Construct::Continue, None) => FlowOp::Continue,
            _ => return None,
        };
        Some(op)
    }

    pub fn construct(self) -> Construct {
        match self {
            FlowOp::If(_) => Construct::If,
            FlowOp::Else => Construct::Else,
            FlowOp::EndIf => Construct::EndIf,
            FlowOp::Switch => Construct::Switch,
            FlowOp::Case(_) => Construct::Case,
            FlowOp::EndCase => Construct::EndCase,
            FlowOp::EndSwitch => Construct::EndSwitch,
            FlowOp::Do => Construct::Do,
            FlowOp::While(_) => Construct::While,
            FlowOp::Until(_) => Construct::Until,
            FlowOp::EndDo => Construct::EndDo,
            FlowOp::Forever => Construct::Forever,
            FlowOp::Loop => Construct::Loop,
            FlowOp::Break => Construct::Break,
            FlowOp::Continue => Construct::Continue,
        }
    }
}

pub struct FlowCompiler {
    code: CodeStream,
    encoder: Box<dyn BranchEncoder>,
    control: ControlCompiler,
    loops: LoopCompiler,
    line: u32,
    warnings: Vec<FlowWarning>,
}

impl FlowCompiler {
    pub fn new(encoder: Box<dyn BranchEncoder>, config: FlowConfig) -> Self {
        Self {
            code: CodeStream::new(config.origin, encoder.byte_order()),
            encoder,
            control: ControlCompiler::new(config.control_depth),
            loops: LoopCompiler::new(config.loop_depth),
            line: 0,
            warnings: Vec::new(),
        }
    }

    /// Source line attributed to subsequent constructs and errors.
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn here(&self) -> u16 {
        self.code.here()
    }

    /// Move the origin. Only possible before anything has been emitted and
    /// while no construct is open, since open slots hold absolute addresses.
    pub fn set_origin(&mut self, origin: u16) -> bool {
        if !self.code.is_empty() || self.control.depth() != 0 || self.loops.depth() != 0 {
            return false;
        }
        self.code = CodeStream::new(origin, self.encoder.byte_order());
        true
    }

    pub fn encoder(&self) -> &dyn BranchEncoder {
        self.encoder.as_ref()
    }

    pub fn code(&self) -> &CodeStream {
        &self.code
    }

    pub fn control_depth(&self) -> usize {
        self.control.depth()
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.depth()
    }

    pub fn warnings(&self) -> &[FlowWarning] {
        &self.warnings
    }

    /// Append plain (non-flow) bytes.
    pub fn emit(&mut self, bytes: &[u8]) -> Result<u16, FlowError> {
        let line = self.line;
        self.code
            .emit(bytes)
            .map_err(|kind| FlowError::new(kind, line))
    }

    pub fn if_open(&mut self, cond: Condition) -> Result<(), FlowError> {
        self.with_control(Construct::If, |control, out, line| {
            control.if_open(out, cond, line)
        })
    }

    pub fn else_branch(&mut self) -> Result<(), FlowError> {
        self.with_control(Construct::Else, |control, out, line| {
            control.else_branch(out, line)
        })
    }

    pub fn end_if(&mut self) -> Result<(), FlowError> {
        self.with_control(Construct::EndIf, |control, out, _| control.end_if(out))
    }

    pub fn switch_open(&mut self) -> Result<(), FlowError> {
        self.with_control(Construct::Switch, |control, out, line| {
            control.switch_open(out, line)
        })
    }

    pub fn case_test(&mut self, cond: Condition) -> Result<(), FlowError> {
        self.with_control(Construct::Case, |control, out, line| {
            control.case_test(out, cond, line)
        })
    }

    pub fn end_case(&mut self) -> Result<(), FlowError> {
        self.with_control(Construct::EndCase, |control, out, _| control.end_case(out))
    }

    pub fn end_switch(&mut self) -> Result<(), FlowError> {
        self.with_control(Construct::EndSwitch, |control, out, _| {
            control.end_switch(out)
        })
    }

    pub fn do_open(&mut self) -> Result<(), FlowError> {
        self.with_loops(Construct::Do, |loops, out, line| loops.do_open(out, line))
    }

    pub fn while_cond(&mut self, cond: Condition) -> Result<(), FlowError> {
        self.with_loops(Construct::While, |loops, out, line| {
            loops.while_cond(out, cond, line)
        })
    }

    pub fn until_cond(&mut self, cond: Condition) -> Result<(), FlowError> {
        self.with_loops(Construct::Until, |loops, out, line| {
            loops.until_cond(out, cond, line)
        })
    }

    pub fn end_do(&mut self) -> Result<(), FlowError> {
        self.with_loops(Construct::EndDo, |loops, out, _| loops.end_do(out))
            .map(|_| ())
    }

    /// Close the innermost loop with an unconditional backward branch.
    ///
    /// A loop closed this way with no `.while`, `.until` or `.break` never
    /// terminates; that is recorded as a warning rather than an error.
    pub fn forever(&mut self) -> Result<(), FlowError> {
        let had_exit = self.with_loops(Construct::Forever, |loops, out, _| loops.forever(out))?;
        if !had_exit {
            let warning = FlowWarning {
                kind: FlowWarningKind::EndlessLoop,
                line: self.line,
            };
            tracing::debug!(line = self.line, code = warning.code(), "{warning}");
            self.warnings.push(warning);
        }
        Ok(())
    }

    pub fn counted_loop(&mut self) -> Result<(), FlowError> {
        self.with_loops(Construct::Loop, |loops, out, _| loops.counted_loop(out))
            .map(|_| ())
    }

    pub fn break_loop(&mut self) -> Result<(), FlowError> {
        self.with_loops(Construct::Break, |loops, out, line| {
            loops.break_loop(out, line)
        })
    }

    pub fn continue_loop(&mut self) -> Result<(), FlowError> {
        self.with_loops(Construct::Continue, |loops, out, _| loops.continue_loop(out))
    }

    pub fn apply(&mut self, op: FlowOp) -> Result<(), FlowError> {
        match op {
            FlowOp::If(cond) => self.if_open(cond),
            FlowOp::Else => self.else_branch(),
            FlowOp::EndIf => self.end_if(),
            FlowOp::Switch => self.switch_open(),
            FlowOp::Case(cond) => self.case_test(cond),
            FlowOp::EndCase => self.end_case(),
            FlowOp::EndSwitch => self.end_switch(),
            FlowOp::Do => self.do_open(),
            FlowOp::While(cond) => self.while_cond(cond),
            FlowOp::Until(cond) => self.until_cond(cond),
            FlowOp::EndDo => self.end_do(),
            FlowOp::Forever => self.forever(),
            FlowOp::Loop => self.counted_loop(),
            FlowOp::Break => self.break_loop(),
            FlowOp::Continue => self.continue_loop(),
        }
    }

    /// End the compilation unit.
    ///
    /// Fails if any reserved operand was never patched or any construct is
    /// still open; the error carries the line of the innermost open construct.
    pub fn finish(self) -> Result<CodeStream, FlowError> {
        let innermost = self
            .control
            .stack()
            .iter()
            .chain(
                self.loops
                    .stack()
                    .iter()
                    .filter(|slot| slot.role == SlotRole::LoopEntry),
            )
            .max_by_key(|slot| slot.line)
            .copied();
        let unresolved = self.code.unresolved_count();
        let kind = match innermost {
            _ if unresolved > 0 => FlowErrorKind::UnresolvedReferenceAtEnd {
                count: unresolved,
                opened_by: innermost.map(opened_by),
            },
            Some(slot) => FlowErrorKind::UnclosedConstruct {
                construct: opened_by(slot),
            },
            None => {
                tracing::debug!(
                    bytes = self.code.len(),
                    patches = self.code.patch_count(),
                    "flow compilation finished"
                );
                return Ok(self.code);
            }
        };
        let line = innermost.map_or(self.line, |slot| slot.line);
        Err(FlowError::new(kind, line))
    }

    fn with_control<F>(&mut self, construct: Construct, op: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut ControlCompiler, &mut Emitter<'_>, u32) -> Result<(), FlowErrorKind>,
    {
        let line = self.line;
        let mut out = Emitter::new(&mut self.code, self.encoder.as_ref());
        op(&mut self.control, &mut out, line).map_err(|kind| FlowError::new(kind, line))?;
        tracing::debug!(
            %construct,
            line,
            here = self.code.here(),
            depth = self.control.depth(),
            "control construct"
        );
        Ok(())
    }

    fn with_loops<T, F>(&mut self, construct: Construct, op: F) -> Result<T, FlowError>
    where
        F: FnOnce(&mut LoopCompiler, &mut Emitter<'_>, u32) -> Result<T, FlowErrorKind>,
    {
        let line = self.line;
        let mut out = Emitter::new(&mut self.code, self.encoder.as_ref());
        let value =
            op(&mut self.loops, &mut out, line).map_err(|kind| FlowError::new(kind, line))?;
        tracing::debug!(
            %construct,
            line,
            here = self.code.here(),
            depth = self.loops.depth(),
            "loop construct"
        );
        Ok(value)
    }
}

fn opened_by(slot: PatchSlot) -> Construct {
    match slot.role {
        SlotRole::IfBranch => Construct::If,
        SlotRole::ElseBranch => Construct::Else,
        SlotRole::SwitchExit => Construct::Switch,
        SlotRole::CaseTest => Construct::Case,
        SlotRole::LoopEntry | SlotRole::LoopExit => Construct::Do,
    }
}
