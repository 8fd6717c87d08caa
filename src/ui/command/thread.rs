use crate::debugger::rpc::api::DebuggerState;
use crate::debugger::{Debugger, Selection};
use crate::ui::command;

pub enum ExecutionResult {
    Current(Selection),
    BroughtIntoFocus(DebuggerState),
}

/// Goroutine and thread selection.
pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle_goroutine(&mut self, id: Option<i64>) -> command::CommandResult<ExecutionResult> {
        match id {
            None => {
                self.dbg.state()?;
                Ok(ExecutionResult::Current(self.dbg.selection()))
            }
            Some(id) => Ok(ExecutionResult::BroughtIntoFocus(
                self.dbg.switch_goroutine(id)?,
            )),
        }
    }

    pub fn handle_thread(&mut self, id: Option<i64>) -> command::CommandResult<ExecutionResult> {
        match id {
            None => {
                self.dbg.state()?;
                Ok(ExecutionResult::Current(self.dbg.selection()))
            }
            Some(id) => Ok(ExecutionResult::BroughtIntoFocus(self.dbg.switch_thread(id)?)),
        }
    }
}
