//! Stepping state machine.
//!
//! Every step operation issues exactly one backend step command. If the backend reports that
//! the step is still in progress and target stopped only at tracepoints in the middle of a step,
//! the session keeps resuming the target until the step is completed, an awaited breakpoint
//! is hit or target stops for another reason (a regular breakpoint, a halt).

use crate::debugger::rpc::api::{AsmInstruction, Breakpoint, DebuggerState, Location};
use crate::debugger::rpc::continuation::ContinueDirection;
use crate::debugger::rpc::CommandName;
use crate::debugger::{notify_stop, Debugger, Error};
use crate::{muted_error, weak_error};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum StepOperation {
    #[strum(serialize = "next")]
    Next,
    #[strum(serialize = "step")]
    Step,
    #[strum(serialize = "stepout")]
    StepOut,
    #[strum(serialize = "step-instruction")]
    StepInstruction,
    #[strum(serialize = "reverse next")]
    ReverseNext,
    #[strum(serialize = "reverse step")]
    ReverseStep,
    #[strum(serialize = "reverse stepout")]
    ReverseStepOut,
    #[strum(serialize = "reverse step-instruction")]
    ReverseStepInstruction,
}

impl StepOperation {
    fn command(self) -> CommandName {
        match self {
            StepOperation::Next => CommandName::Next,
            StepOperation::Step => CommandName::Step,
            StepOperation::StepOut => CommandName::StepOut,
            StepOperation::StepInstruction => CommandName::StepInstruction,
            StepOperation::ReverseNext => CommandName::ReverseNext,
            StepOperation::ReverseStep => CommandName::ReverseStep,
            StepOperation::ReverseStepOut => CommandName::ReverseStepOut,
            StepOperation::ReverseStepInstruction => CommandName::ReverseStepInstruction,
        }
    }

    fn is_reverse(self) -> bool {
        matches!(
            self,
            StepOperation::ReverseNext
                | StepOperation::ReverseStep
                | StepOperation::ReverseStepOut
                | StepOperation::ReverseStepInstruction
        )
    }

    fn is_instruction(self) -> bool {
        matches!(
            self,
            StepOperation::StepInstruction | StepOperation::ReverseStepInstruction
        )
    }
}

/// A function call on the current source line.
#[derive(Debug, Clone, PartialEq)]
pub struct StepIntoCall {
    /// Callee name.
    pub name: String,
    /// Call instruction.
    pub instruction: AsmInstruction,
}

impl StepIntoCall {
    /// Address of the call instruction.
    pub fn pc(&self) -> u64 {
        self.instruction.loc.pc
    }

    /// Textual representation of the call.
    pub fn expr(&self) -> &str {
        &self.instruction.text
    }
}

/// Select call instructions located at `current` source line, at or after current pc.
fn calls_at_line(instructions: Vec<AsmInstruction>, current: &Location) -> Vec<StepIntoCall> {
    instructions
        .into_iter()
        .filter(|inst| {
            inst.loc.file == current.file
                && inst.loc.line == current.line
                && inst.loc.pc >= current.pc
                && is_call(inst)
        })
        .map(|inst| StepIntoCall {
            name: inst
                .dest_loc
                .as_ref()
                .and_then(|dest| dest.function_name())
                .unwrap_or_default()
                .to_string(),
            instruction: inst,
        })
        .collect()
}

/// Call mnemonics of supported architectures (amd64, 386, arm64, ppc64le, riscv64).
const CALL_MNEMONICS: &[&str] = &["call", "callq", "bl", "blr", "jal", "jalr"];

fn is_call(inst: &AsmInstruction) -> bool {
    let mnemonic = inst
        .text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    inst.dest_loc.is_some() && CALL_MNEMONICS.contains(&mnemonic.as_str())
}

fn is_hit(state: &DebuggerState, id: i64) -> bool {
    state.stopped_at().any(|bp| bp.id == id)
}

impl Debugger {
    /// Step program, proceeding through subroutine calls.
    pub fn step_over(&mut self) -> Result<(), Error> {
        self.step(StepOperation::Next)
    }

    /// Step program until it reaches a different source line, entering subroutine calls.
    pub fn step_into(&mut self) -> Result<(), Error> {
        self.step(StepOperation::Step)
    }

    /// Run until the current function returns.
    pub fn step_out(&mut self) -> Result<(), Error> {
        self.step(StepOperation::StepOut)
    }

    /// Execute a single machine instruction.
    pub fn step_instruction(&mut self) -> Result<(), Error> {
        self.step(StepOperation::StepInstruction)
    }

    /// Execute a step backward, target must be a recording.
    pub fn step_reverse(&mut self, op: StepOperation) -> Result<(), Error> {
        if !op.is_reverse() {
            return Err(Error::InvalidArgument(format!("{op} is not a reverse step")));
        }
        self.step(op)
    }

    fn step(&mut self, op: StepOperation) -> Result<(), Error> {
        let result = self.do_step(op, None).map(|_| ());
        self.observe_exit(result)
    }

    fn do_step(&mut self, op: StepOperation, awaited: Option<i64>) -> Result<DebuggerState, Error> {
        let state = self.client.step_command(op.command())?;
        self.report_stop(&state)?;
        if op.is_instruction() {
            return Ok(state);
        }
        self.continue_until_complete(op, state, awaited)
    }

    /// Resume target while a step operation is in progress.
    fn continue_until_complete(
        &mut self,
        op: StepOperation,
        mut state: DebuggerState,
        awaited: Option<i64>,
    ) -> Result<DebuggerState, Error> {
        let direction = if op.is_reverse() {
            ContinueDirection::Congruent
        } else {
            ContinueDirection::Forward
        };
        let stop_on_next_breakpoint = self.config.stop_on_next_breakpoint;
        let hooks = self.hooks.as_ref();
        let selection = &mut self.selection;

        let completed = |state: &DebuggerState| {
            awaited.map(|id| is_hit(state, id)).unwrap_or(false)
                || !state.next_in_progress
                || stop_on_next_breakpoint
                || !state.is_tracepoint_only()
        };

        let mut stream = self.client.continue_stream(direction);
        while !completed(&state) {
            debug!(target: "debugger", "reconcile {op}, awaited breakpoint: {awaited:?}");

            let element = loop {
                if let Some(element) = stream.next() {
                    break element;
                }
                stream = self.client.continue_stream(direction);
            };
            state = element?;
            hooks.on_notice(&format!("breakpoint hit during {op}, continuing..."));
            notify_stop(selection, hooks, &state)?;
        }

        Ok(state)
    }

    /// Return calls at the current line that are not executed yet.
    pub fn step_into_calls(&mut self) -> Result<Vec<StepIntoCall>, Error> {
        let state = self.state()?;
        if self.selection.goroutine_id < 0 {
            return Err(Error::NoSelectedGoroutine);
        }
        let current = match (&state.selected_goroutine, &state.current_thread) {
            (Some(g), _) => g.current_loc.clone(),
            (None, Some(thread)) => Location {
                pc: thread.pc,
                file: thread.file.clone(),
                line: thread.line,
                function: thread.function.clone(),
                ..Default::default()
            },
            (None, None) => return Err(Error::NoProcess),
        };

        let instructions = self
            .client
            .disassemble_pc(self.selection.scope(), current.pc)?;
        Ok(calls_at_line(instructions, &current))
    }

    /// Step into the last call of the current line, plain step if there is no call.
    pub fn step_into_last(&mut self) -> Result<(), Error> {
        let last = muted_error!(self.step_into_calls(), "step into calls:")
            .and_then(|mut calls| calls.pop());
        match last {
            Some(call) => self.step_into_call(&call),
            None => self.step_into(),
        }
    }

    /// Step into a call of the current line selected by callee name.
    pub fn step_into_named(&mut self, name: &str) -> Result<(), Error> {
        let call = self
            .step_into_calls()?
            .into_iter()
            .find(|call| call.name == name)
            .ok_or_else(|| Error::CallNotFound(name.to_string()))?;
        self.step_into_call(&call)
    }

    /// Step into a specific call at the current line.
    ///
    /// A temporary breakpoint, limited to the current goroutine and frame, is set at the call
    /// instruction and `next` is used to reach it. The breakpoint is always removed.
    /// If it is hit, a plain step enters the callee.
    pub fn step_into_call(&mut self, call: &StepIntoCall) -> Result<(), Error> {
        let result = self.do_step_into_call(call);
        self.observe_exit(result)
    }

    fn do_step_into_call(&mut self, call: &StepIntoCall) -> Result<(), Error> {
        let goroutine_id = self.selection.goroutine_id;
        if goroutine_id < 0 {
            return Err(Error::NoSelectedGoroutine);
        }
        let stack = self.client.stacktrace(goroutine_id, 1, None)?;
        let frame = stack.first().ok_or(Error::EmptyStacktrace)?;

        let temporary = self.client.create_breakpoint(Breakpoint {
            addr: call.pc(),
            cond: format!(
                "(runtime.curg.goid == {goroutine_id}) && (runtime.frameoff == {})",
                frame.frame_offset
            ),
            ..Default::default()
        })?;
        debug!(target: "debugger", "temporary breakpoint {} at {:#x}", temporary.id, call.pc());

        let result = self.do_step(StepOperation::Next, Some(temporary.id));
        weak_error!(
            self.client.clear_breakpoint(temporary.id),
            "clear temporary breakpoint:"
        );

        if is_hit(&result?, temporary.id) {
            self.do_step(StepOperation::Step, None)?;
        }
        Ok(())
    }
}
