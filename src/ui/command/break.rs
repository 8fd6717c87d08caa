use crate::debugger::breakpoint::SetBreakpointOutcome;
use crate::debugger::rpc::api::Breakpoint;
use crate::debugger::{BreakpointIntent, ClearedBreakpoint, Debugger, Error};
use crate::ui::command;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { spec: String, tracepoint: bool },
    Clear(String),
    List,
    Condition { target: String, cond: String },
}

pub enum ExecutionResult {
    New {
        created: Vec<Breakpoint>,
        errors: Vec<Error>,
    },
    Scheduled,
    Removed(ClearedBreakpoint),
    Dump {
        live: Vec<Breakpoint>,
        /// Breakpoints that wait for a process: scheduled requests and frozen breakpoints.
        pending: Vec<BreakpointIntent>,
    },
    Amended(Breakpoint),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: &Command) -> command::CommandResult<ExecutionResult> {
        let result = match cmd {
            Command::Add { spec, tracepoint } => {
                match self.dbg.set_breakpoint(spec, *tracepoint)? {
                    SetBreakpointOutcome::Scheduled => ExecutionResult::Scheduled,
                    SetBreakpointOutcome::Created { created, errors } => {
                        ExecutionResult::New { created, errors }
                    }
                }
            }
            Command::Clear(target) => ExecutionResult::Removed(self.dbg.clear_breakpoint(target)?),
            Command::List => {
                let live = if self.dbg.selection().has_process() {
                    self.dbg.breakpoints()?
                } else {
                    vec![]
                };
                let pending = self
                    .dbg
                    .breakpoint_intents()
                    .into_iter()
                    .filter(|intent| !matches!(intent, BreakpointIntent::Live { .. }))
                    .collect();
                ExecutionResult::Dump { live, pending }
            }
            Command::Condition { target, cond } => {
                ExecutionResult::Amended(self.dbg.amend_condition(target, cond)?)
            }
        };
        Ok(result)
    }
}
