use crate::debugger::rpc::api::Checkpoint;
use crate::debugger::Debugger;
use crate::ui::command;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(Option<String>),
    List,
    Clear(i64),
}

pub enum ExecutionResult {
    Created(i64),
    List(Vec<Checkpoint>),
    Cleared(i64),
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
            Command::Create(label) => {
                ExecutionResult::Created(self.dbg.checkpoint(label.as_deref())?)
            }
            Command::List => ExecutionResult::List(self.dbg.checkpoints()?),
            Command::Clear(id) => {
                self.dbg.clear_checkpoint(*id)?;
                ExecutionResult::Cleared(*id)
            }
        };
        Ok(result)
    }
}
