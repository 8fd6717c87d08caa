use crate::debugger::process::restart_args;
use crate::debugger::{Debugger, RestartOutcome};
use crate::ui::command;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Restart with `[--] [args]` for a live process, or from a position for a recording.
    Restart(String),
    Rebuild,
}

pub enum ExecutionResult {
    Restarted(RestartOutcome),
    /// Recording restarted from a position (an empty position means the beginning).
    Rewound(String),
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
            Command::Restart(args) if self.dbg.is_recorded()? => {
                self.dbg.restart_from(args)?;
                ExecutionResult::Rewound(args.trim().to_string())
            }
            Command::Restart(args) => {
                ExecutionResult::Restarted(self.dbg.restart(restart_args(args))?)
            }
            Command::Rebuild => ExecutionResult::Restarted(self.dbg.rebuild()?),
        };
        Ok(result)
    }
}
