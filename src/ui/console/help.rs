use crate::ui::command::parser;
use crate::ui::command::CommandError;
use itertools::Itertools;

pub const HELP_HELP: &str = "\
Prints the help message.

    help [command]

Type \"help\" followed by the name of a command for more information about it.";

pub const HELP_BREAK: &str = "\
Sets a breakpoint.

    break [name] <linespec>

Linespec is a location accepted by the backend: <file>:<line>, <function>, *<address>, +<offset>, etc.
Without a running process the breakpoint is set after the next restart.";

pub const HELP_TRACE: &str = "\
Set tracepoint.

    trace [name] <linespec>

A tracepoint is a breakpoint that does not stop the execution of the program, instead when the tracepoint is hit a notification is displayed.

See also: \"help cond\" and \"help clear\"";

pub const HELP_CLEAR: &str = "\
Deletes breakpoint.

    clear <breakpoint name or id>";

pub const HELP_BREAKPOINTS: &str = "\
Print out info for active breakpoints, breakpoints that wait for a restart are listed too.";

pub const HELP_CONDITION: &str = "\
Set breakpoint condition.

    condition <breakpoint name or id> [boolean expression]

Specifies that the breakpoint or tracepoint should break only if the boolean expression is true.
An empty expression removes the condition.";

pub const HELP_RESTART: &str = "\
Restart process.

    restart [--] [args]

For recordings a checkpoint can be optionally specified.
For live processes any argument to restart will be used as argument to the program, use:

    restart --

To clear the arguments passed to the program.
Breakpoints are moved into the new process.";

pub const HELP_REBUILD: &str = "\
Rebuild the target executable and restart it, breakpoints are moved into the new process.";

pub const HELP_CONTINUE: &str = "Run until breakpoint or program termination.";

pub const HELP_REWIND: &str = "Run backwards until breakpoint or program termination.";

pub const HELP_CHECKPOINT: &str = "\
Creates a checkpoint at the current position.

    checkpoint [where]";

pub const HELP_CHECKPOINTS: &str = "Print out info for existing checkpoints.";

pub const HELP_CLEAR_CHECKPOINT: &str = "\
Deletes checkpoint.

    clear-checkpoint <id>";

pub const HELP_STEP: &str = "\
Single step through program.

    step [-list|-first|-last|name]

Specify a name to step into one specific function call. Use the -list option for all the function calls on the current line.

Option -first will step into the first function call of the line, -last will step into the last call of the line. When called without arguments step will use -first as default, but this can be changed using config.";

pub const HELP_STEP_INSTRUCTION: &str = "Single step a single cpu instruction.";

pub const HELP_NEXT: &str = "Step over to next source line.";

pub const HELP_STEP_OUT: &str = "Step out of the current function.";

pub const HELP_REVERSE: &str = "\
Reverses the execution of the target program for the command specified.

    rev next|step|stepout|step-instruction

Available only for recordings.";

pub const HELP_CANCEL_NEXT: &str = "Cancels the next operation currently in progress.";

pub const HELP_INTERRUPT: &str = "Interrupts execution.";

pub const HELP_PRINT: &str = "\
Evaluate an expression.

    print <expression>";

pub const HELP_SET: &str = "\
Changes the value of a variable.

    set <variable> = <value>

Only numerical variables and pointers can be changed.";

pub const HELP_GOROUTINE: &str = "\
Shows or changes current goroutine.

    goroutine [id]";

pub const HELP_THREAD: &str = "\
Shows or switches to the specified thread.

    thread [id]";

pub const HELP_FRAME: &str = "\
Shows or changes current stack frame, expressions are evaluated in this frame.

    frame [index]";

pub const HELP_STACK: &str = "\
Print stack trace of the current goroutine.

    stack [depth]";

pub const HELP_EXIT: &str = "Exit the debugger.";

fn help_message(verb: &str) -> &'static str {
    match verb {
        parser::HELP_COMMAND => HELP_HELP,
        parser::BREAK_COMMAND => HELP_BREAK,
        parser::TRACE_COMMAND => HELP_TRACE,
        parser::CLEAR_COMMAND => HELP_CLEAR,
        parser::BREAKPOINTS_COMMAND => HELP_BREAKPOINTS,
        parser::CONDITION_COMMAND => HELP_CONDITION,
        parser::RESTART_COMMAND => HELP_RESTART,
        parser::REBUILD_COMMAND => HELP_REBUILD,
        parser::CONTINUE_COMMAND => HELP_CONTINUE,
        parser::REWIND_COMMAND => HELP_REWIND,
        parser::CHECKPOINT_COMMAND => HELP_CHECKPOINT,
        parser::CHECKPOINTS_COMMAND => HELP_CHECKPOINTS,
        parser::CLEAR_CHECKPOINT_COMMAND => HELP_CLEAR_CHECKPOINT,
        parser::STEP_COMMAND => HELP_STEP,
        parser::STEP_INSTRUCTION_COMMAND => HELP_STEP_INSTRUCTION,
        parser::NEXT_COMMAND => HELP_NEXT,
        parser::STEP_OUT_COMMAND => HELP_STEP_OUT,
        parser::REVERSE_COMMAND => HELP_REVERSE,
        parser::CANCEL_NEXT_COMMAND => HELP_CANCEL_NEXT,
        parser::INTERRUPT_COMMAND => HELP_INTERRUPT,
        parser::PRINT_COMMAND => HELP_PRINT,
        parser::SET_COMMAND => HELP_SET,
        parser::GOROUTINE_COMMAND => HELP_GOROUTINE,
        parser::THREAD_COMMAND => HELP_THREAD,
        parser::FRAME_COMMAND => HELP_FRAME,
        parser::STACK_COMMAND => HELP_STACK,
        _ => HELP_EXIT,
    }
}

/// List of all commands with aliases and a short description.
pub fn help_overview() -> String {
    let entries = parser::COMMANDS
        .iter()
        .map(|names| {
            let title = match names.split_first() {
                Some((name, [])) => name.to_string(),
                Some((name, aliases)) => format!("{name} (alias: {})", aliases.join(" | ")),
                None => String::new(),
            };
            let summary = help_message(names[0]).lines().next().unwrap_or_default();
            (title, summary)
        })
        .collect::<Vec<_>>();
    let width = entries.iter().map(|(title, _)| title.len()).max().unwrap_or_default();

    let list = entries
        .iter()
        .map(|(title, summary)| format!("    {title:<width$}  {summary}"))
        .join("\n");
    format!(
        "The following commands are available:\n{list}\nType help followed by a command for full documentation."
    )
}

/// Full help for a command or an alias, overview if command is not set.
pub fn help_for_command(command: Option<&str>) -> Result<String, CommandError> {
    let Some(command) = command else {
        return Ok(help_overview());
    };
    parser::COMMANDS
        .iter()
        .find(|names| names.contains(&command))
        .map(|names| help_message(names[0]).to_string())
        .ok_or_else(|| CommandError::NoSuchCommand(command.to_string()))
}
