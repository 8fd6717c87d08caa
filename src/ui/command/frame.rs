use crate::debugger::rpc::api::Stackframe;
use crate::debugger::Debugger;
use crate::ui::command;

pub enum ExecutionResult {
    /// Index of the selected frame.
    Current(i64),
    BroughtIntoFocus(i64, Stackframe),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, num: Option<i64>) -> command::CommandResult<ExecutionResult> {
        match num {
            None => Ok(ExecutionResult::Current(self.dbg.selection().frame)),
            Some(num) => {
                let frame = self.dbg.switch_frame(num)?;
                Ok(ExecutionResult::BroughtIntoFocus(num, frame))
            }
        }
    }
}
