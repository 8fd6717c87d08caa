use crate::debugger::rpc::api::Stackframe;
use crate::debugger::Debugger;
use crate::ui::command;

const DEFAULT_DEPTH: i64 = 10;

pub struct Handler<'a> {
    dbg: &'a Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, depth: Option<i64>) -> command::CommandResult<Vec<Stackframe>> {
        let depth = depth.unwrap_or(DEFAULT_DEPTH);
        if depth <= 0 {
            return Err(command::CommandError::Parsing(format!(
                "invalid stack depth {depth}"
            )));
        }
        Ok(self.dbg.stacktrace(depth)?)
    }
}
