use crate::config::DefaultStep;
use crate::debugger::{Debugger, StepIntoCall};
use crate::ui::command;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Behaves as `First` or `Last` depending on configuration.
    Default,
    First,
    Last,
    List,
    Call(String),
}

pub enum ExecutionResult {
    Done,
    Calls(Vec<StepIntoCall>),
}

/// Step program until it reaches a different source line, entering subroutine calls.
pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: &Command) -> command::CommandResult<ExecutionResult> {
        let cmd = match cmd {
            Command::Default => match self.dbg.config().default_step {
                DefaultStep::First => &Command::First,
                DefaultStep::Last => &Command::Last,
            },
            cmd => cmd,
        };

        match cmd {
            Command::Default | Command::First => self.dbg.step_into()?,
            Command::Last => self.dbg.step_into_last()?,
            Command::List => return Ok(ExecutionResult::Calls(self.dbg.step_into_calls()?)),
            Command::Call(name) => self.dbg.step_into_named(name)?,
        }
        Ok(ExecutionResult::Done)
    }
}
