use crate::debugger::Debugger;
use crate::ui::command;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Stop the target.
    Halt,
    /// Abandon a step operation that is in progress.
    CancelNext,
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: Command) -> command::CommandResult<()> {
        match cmd {
            Command::Halt => self.dbg.interrupt()?,
            Command::CancelNext => self.dbg.cancel_next()?,
        }
        Ok(())
    }
}
