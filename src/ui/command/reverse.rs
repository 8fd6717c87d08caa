use crate::debugger::{Debugger, StepOperation};
use crate::ui::command;

/// Step a recording backward.
pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, op: StepOperation) -> command::CommandResult<()> {
        Ok(self.dbg.step_reverse(op)?)
    }
}
