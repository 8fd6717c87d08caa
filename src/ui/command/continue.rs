use crate::debugger::Debugger;
use crate::ui::command;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Forward,
    /// Run a recording backward.
    Rewind,
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
            Command::Forward => self.dbg.continue_debugee()?,
            Command::Rewind => self.dbg.rewind()?,
        }
        Ok(())
    }
}
