use crate::debugger::rpc::api::Variable;
use crate::debugger::Debugger;
use crate::ui::command;

pub struct Handler<'a> {
    dbg: &'a Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    /// Evaluate expression in the selected goroutine and frame.
    pub fn handle_print(&self, expr: &str) -> command::CommandResult<Variable> {
        Ok(self.dbg.eval(expr)?)
    }

    /// Execute `<variable> = <value>`.
    pub fn handle_set(&self, assignment: &str) -> command::CommandResult<()> {
        Ok(self.dbg.set_variable(assignment)?)
    }
}
