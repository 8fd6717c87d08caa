//! An interface to a debugging session.
//! This is the most preferred way to use a session functional from UI layer.
//!
//! Contains commands and corresponding command handlers. Command is a some sort of request to
//! the session that define an action and a list of input arguments. Command handler validate
//! command, define what exactly session must to do and return result of it.

pub mod backtrace;
pub mod r#break;
pub mod checkpoint;
pub mod r#continue;
pub mod frame;
pub mod interrupt;
pub mod parser;
pub mod restart;
pub mod reverse;
pub mod step_instruction;
pub mod step_into;
pub mod step_out;
pub mod step_over;
pub mod thread;
pub mod variables;

use crate::debugger::{Error, StepOperation};

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error("command not available: {0}")]
    NoSuchCommand(String),
    #[error("exit requested")]
    ExitRequested,
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Breakpoint(r#break::Command),
    Restart(restart::Command),
    Continue(r#continue::Command),
    Checkpoint(checkpoint::Command),
    StepInto(step_into::Command),
    StepInstruction,
    StepOver,
    StepOut,
    Reverse(StepOperation),
    Interrupt(interrupt::Command),
    Print(String),
    Set(String),
    Goroutine(Option<i64>),
    Thread(Option<i64>),
    Frame(Option<i64>),
    Backtrace(Option<i64>),
    SkipInput,
    Help {
        command: Option<String>,
        reason: Option<String>,
    },
}

/// Turns input lines into commands.
///
/// An empty line repeats the verb of the last recognized command, without arguments.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_verb: Option<&'static str>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verb that an empty line repeats.
    pub fn last_verb(&self) -> Option<&'static str> {
        self.last_verb
    }

    pub fn dispatch(&mut self, input: &str) -> CommandResult<Command> {
        let input = input.trim();
        if input.is_empty() {
            return match self.last_verb {
                Some(verb) => Command::parse(verb),
                None => Ok(Command::SkipInput),
            };
        }

        let word = input.split_whitespace().next().unwrap_or_default();
        let verb = parser::find_verb(word)?;
        self.last_verb = Some(verb);
        Command::parse(input)
    }
}
