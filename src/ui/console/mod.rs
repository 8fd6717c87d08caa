use crate::config::{Config, UiConfig};
use crate::debugger::rpc::api::Breakpoint;
use crate::debugger::{
    BreakpointIntent, ClearedBreakpoint, Debugger, Error, Interrupter, RestartOutcome,
};
use crate::ui::command::r#break::ExecutionResult as BreakpointResult;
use crate::ui::command::restart::ExecutionResult as RestartResult;
use crate::ui::command::{
    backtrace, checkpoint, frame, interrupt, r#break, r#continue, restart, reverse,
    step_instruction, step_into, step_out, step_over, thread, variables, Command, CommandError,
    CommandResult, Dispatcher,
};
use crate::ui::console::editor::{create_editor, lock_completer, CommandCompleter, RLHelper};
use crate::ui::console::help::help_for_command;
use crate::ui::console::hook::{render_stack, render_stop_context, TerminalHook};
use crate::ui::console::print::style::{ErrorView, KeywordView};
use crate::ui::console::print::{
    breakpoint_action, breakpoint_location, breakpoint_title, pending_breakpoint, ExternalPrinter,
};
use crate::ui::console::variable::render_variable;
use crate::weak_error;
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{mpsc, Arc, Mutex, Once};
use std::thread as std_thread;

mod editor;
mod help;
pub mod hook;
pub mod print;
mod variable;

const WELCOME_TEXT: &str = r#"
GoStalker greets
Type 'help' for list of commands.
"#;
const PROMT: &str = "(gs) ";

type GSEditor = Editor<RLHelper, DefaultHistory>;

pub struct AppBuilder {
    config: UiConfig,
}

impl AppBuilder {
    pub fn new(config: UiConfig) -> Self {
        Self { config }
    }

    /// Install terminal hook into the session and prepare line editor.
    pub fn build(self, mut debugger: Debugger) -> anyhow::Result<TerminalApplication> {
        let (control_tx, control_rx) = mpsc::sync_channel::<Control>(0);
        let mut editor = create_editor(PROMT)?;

        debugger.set_hook(TerminalHook::new(ExternalPrinter::new(&mut editor)?));

        let history = self.config.save_history.then(Config::history_path).flatten();
        if let Some(ref path) = history {
            if let Some(dir) = path.parent() {
                weak_error!(std::fs::create_dir_all(dir), "history directory:");
            }
            if editor.load_history(path).is_err() {
                info!(target: "debugger", "no history loaded from {path:?}");
            }
        }

        Ok(TerminalApplication {
            debugger,
            editor,
            history,
            control_tx,
            control_rx,
        })
    }
}

enum Control {
    /// New command from user received
    Cmd(String),
    /// Terminate application
    Terminate,
}

pub struct TerminalApplication {
    debugger: Debugger,
    editor: GSEditor,
    history: Option<PathBuf>,
    control_tx: SyncSender<Control>,
    control_rx: Receiver<Control>,
}

pub static LOGGER_ONCE: Once = Once::new();
pub static HELLO_ONCE: Once = Once::new();

impl TerminalApplication {
    pub fn run(mut self) -> anyhow::Result<()> {
        LOGGER_ONCE.call_once(|| {
            env_logger::init();
        });

        let completer = match self.editor.helper() {
            Some(helper) => Arc::clone(&helper.completer),
            None => anyhow::bail!("line editor helper not installed"),
        };

        let mut app_loop = AppLoop {
            printer: ExternalPrinter::new(&mut self.editor)?,
            interrupter: self.debugger.interrupter(),
            debugger: self.debugger,
            control_rx: self.control_rx,
            completer,
            dispatcher: Dispatcher::new(),
        };
        app_loop.update_completer_breakpoints();

        let mut editor = self.editor;
        let history = self.history;
        let control_tx = self.control_tx;
        let interrupter = app_loop.interrupter.clone();
        std_thread::spawn(move || {
            HELLO_ONCE.call_once(|| {
                println!("{WELCOME_TEXT}");
            });

            loop {
                match editor.readline(PROMT) {
                    Ok(input) => {
                        if !input.trim().is_empty() {
                            _ = editor.add_history_entry(&input);
                            if let Some(ref path) = history {
                                weak_error!(editor.append_history(path), "save history:");
                            }
                        }
                        if control_tx.send(Control::Cmd(input)).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) if interrupter.is_running() => {
                        weak_error!(interrupter.halt(), "halt:");
                    }
                    Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                        _ = control_tx.send(Control::Terminate);
                        break;
                    }
                    Err(err) => {
                        println!("error: {:#}", err);
                        _ = control_tx.send(Control::Terminate);
                        break;
                    }
                }
            }
        });

        app_loop.run();

        Ok(())
    }
}

struct AppLoop {
    debugger: Debugger,
    interrupter: Interrupter,
    control_rx: Receiver<Control>,
    printer: ExternalPrinter,
    completer: Arc<Mutex<CommandCompleter>>,
    dispatcher: Dispatcher,
}

impl AppLoop {
    fn yes(&self, question: &str) -> bool {
        self.printer.print(question);

        match self.control_rx.recv() {
            Ok(Control::Cmd(cmd)) => {
                let cmd = cmd.trim().to_lowercase();
                cmd == "y" || cmd == "yes"
            }
            Ok(Control::Terminate) | Err(_) => false,
        }
    }

    fn update_completer_breakpoints(&self) {
        let names = self
            .debugger
            .breakpoint_intents()
            .into_iter()
            .filter_map(|intent| match intent {
                BreakpointIntent::Live { frozen, .. } | BreakpointIntent::Frozen(frozen) => {
                    Some(frozen.template.name)
                }
                BreakpointIntent::Scheduled(_) => None,
            });
        lock_completer(&self.completer).replace_breakpoint_hints(names);
    }

    fn print_breakpoint(&self, bp: &Breakpoint, action: &str) {
        self.printer.print(breakpoint_action(bp, action));
    }

    fn print_restart_outcome(&self, outcome: &RestartOutcome) {
        for bp in outcome.scheduled.iter().chain(outcome.restored.iter()) {
            self.print_breakpoint(bp, "set");
        }
        for err in &outcome.errors {
            self.printer
                .print(ErrorView::from(format!("Could not restore breakpoint: {err}")));
        }
    }

    fn handle_command(&mut self, cmd: &str) -> CommandResult<()> {
        match self.dispatcher.dispatch(cmd)? {
            Command::SkipInput => {}
            Command::Help { reason, command } => {
                if let Some(reason) = reason {
                    self.printer.print(reason);
                }
                self.printer.print(help_for_command(command.as_deref())?);
            }
            Command::Breakpoint(bp_cmd) => {
                let result = r#break::Handler::new(&mut self.debugger).handle(&bp_cmd)?;
                match result {
                    BreakpointResult::New { created, errors } => {
                        created.iter().for_each(|bp| self.print_breakpoint(bp, "set"));
                        for err in errors {
                            self.printer
                                .print(ErrorView::from(format!("Could not create breakpoint: {err}")));
                        }
                    }
                    BreakpointResult::Scheduled => {
                        self.printer.print("Breakpoint will be set on restart")
                    }
                    BreakpointResult::Removed(ClearedBreakpoint::Live(bp)) => {
                        self.print_breakpoint(&bp, "cleared")
                    }
                    BreakpointResult::Removed(ClearedBreakpoint::Pending(intent)) => {
                        if let Some(pending) = pending_breakpoint(&intent) {
                            self.printer.print(format!("Cleared: {pending}"));
                        }
                    }
                    BreakpointResult::Amended(bp) => {
                        if bp.cond.is_empty() {
                            self.printer
                                .print(format!("{} condition removed", breakpoint_title(&bp)));
                        } else {
                            self.printer.print(format!(
                                "{} condition set: {}",
                                breakpoint_title(&bp),
                                bp.cond
                            ));
                        }
                    }
                    BreakpointResult::Dump { live, pending } => {
                        for bp in live {
                            self.printer.print(format!(
                                "{} {} (hits total: {})",
                                breakpoint_title(&bp),
                                breakpoint_location(&bp),
                                bp.total_hit_count
                            ));
                            if !bp.cond.is_empty() {
                                self.printer.print(format!("\tcond {}", bp.cond));
                            }
                        }
                        pending
                            .iter()
                            .filter_map(pending_breakpoint)
                            .for_each(|line| self.printer.print(line));
                    }
                }
                self.update_completer_breakpoints();
            }
            Command::Restart(restart_cmd) => {
                let result = restart::Handler::new(&mut self.debugger).handle(&restart_cmd)?;
                match result {
                    RestartResult::Restarted(outcome) => self.print_restart_outcome(&outcome),
                    RestartResult::Rewound(position) if position.is_empty() => {
                        self.printer.print("Rewound to the beginning of the recording")
                    }
                    RestartResult::Rewound(position) => {
                        self.printer.print(format!("Rewound to {position}"))
                    }
                }
                self.update_completer_breakpoints();
            }
            Command::Continue(cmd) => r#continue::Handler::new(&mut self.debugger).handle(cmd)?,
            Command::Checkpoint(cmd) => {
                match checkpoint::Handler::new(&mut self.debugger).handle(&cmd)? {
                    checkpoint::ExecutionResult::Created(id) => {
                        self.printer.print(format!("Checkpoint c{id} created."))
                    }
                    checkpoint::ExecutionResult::List(list) => {
                        self.printer.print("Checkpoints:");
                        for cp in list {
                            self.printer
                                .print(format!("c{}\t{}\t{}", cp.id, cp.when, cp.r#where));
                        }
                    }
                    checkpoint::ExecutionResult::Cleared(id) => {
                        self.printer.print(format!("Checkpoint c{id} cleared."))
                    }
                }
            }
            Command::StepInto(cmd) => {
                match step_into::Handler::new(&mut self.debugger).handle(&cmd)? {
                    step_into::ExecutionResult::Done => {}
                    step_into::ExecutionResult::Calls(calls) => {
                        for call in calls {
                            self.printer.print(format!(
                                "{}\t{}",
                                KeywordView::from(&call.name),
                                call.expr()
                            ));
                        }
                    }
                }
            }
            Command::StepInstruction => {
                step_instruction::Handler::new(&mut self.debugger).handle()?
            }
            Command::StepOver => step_over::Handler::new(&mut self.debugger).handle()?,
            Command::StepOut => step_out::Handler::new(&mut self.debugger).handle()?,
            Command::Reverse(op) => reverse::Handler::new(&mut self.debugger).handle(op)?,
            Command::Interrupt(cmd) => interrupt::Handler::new(&mut self.debugger).handle(cmd)?,
            Command::Print(expr) => {
                let var = variables::Handler::new(&self.debugger).handle_print(&expr)?;
                self.printer.print(render_variable(&var, ""));
            }
            Command::Set(assignment) => {
                variables::Handler::new(&self.debugger).handle_set(&assignment)?
            }
            Command::Goroutine(id) => {
                match thread::Handler::new(&mut self.debugger).handle_goroutine(id)? {
                    thread::ExecutionResult::Current(selection) => self.printer.print(format!(
                        "Goroutine {}",
                        KeywordView::from(selection.goroutine_id)
                    )),
                    thread::ExecutionResult::BroughtIntoFocus(state) => {
                        let goroutine = state
                            .selected_goroutine
                            .as_ref()
                            .map(|g| g.id)
                            .or(id)
                            .unwrap_or(-1);
                        self.printer
                            .print(format!("Switched to goroutine {}", KeywordView::from(goroutine)));
                        render_stop_context(&state)
                            .into_iter()
                            .for_each(|line| self.printer.print(line));
                    }
                }
            }
            Command::Thread(id) => {
                match thread::Handler::new(&mut self.debugger).handle_thread(id)? {
                    thread::ExecutionResult::Current(selection) => match selection.thread_id {
                        Some(id) => self
                            .printer
                            .print(format!("Thread {}", KeywordView::from(id))),
                        None => self.printer.print("No current thread available"),
                    },
                    thread::ExecutionResult::BroughtIntoFocus(state) => {
                        if let Some(thread) = state.current_thread.as_ref() {
                            self.printer.print(format!(
                                "Switched to thread {}",
                                KeywordView::from(thread.id)
                            ));
                        }
                        render_stop_context(&state)
                            .into_iter()
                            .for_each(|line| self.printer.print(line));
                    }
                }
            }
            Command::Frame(num) => match frame::Handler::new(&mut self.debugger).handle(num)? {
                frame::ExecutionResult::Current(num) => {
                    self.printer.print(format!("Frame {}", KeywordView::from(num)))
                }
                frame::ExecutionResult::BroughtIntoFocus(num, stackframe) => {
                    render_stack(std::slice::from_ref(&stackframe), "", None)
                        .into_iter()
                        .for_each(|line| self.printer.print(line));
                    self.printer
                        .print(format!("Frame {} selected", KeywordView::from(num)));
                }
            },
            Command::Backtrace(depth) => {
                let stack = backtrace::Handler::new(&self.debugger).handle(depth)?;
                let selected = self.debugger.selection().frame;
                render_stack(&stack, "", Some(selected))
                    .into_iter()
                    .for_each(|line| self.printer.print(line));
            }
        }

        Ok(())
    }

    /// Detach from backend before exit. Process is killed if it was started by backend,
    /// an attached process is killed only on user confirmation.
    fn shutdown(&mut self, ask: bool) {
        let attached = weak_error!(
            self.debugger.client().attached_to_existing_process(),
            "attached to existing process:"
        )
        .unwrap_or(false);
        let kill = match (attached, ask) {
            (false, _) => true,
            (true, true) => self.yes("Would you like to kill the process? (y or n)"),
            (true, false) => false,
        };
        if let Err(e) = self.debugger.detach(kill) {
            warn!(target: "debugger", "detach: {e:#}");
        }
    }

    fn run(mut self) {
        loop {
            let Ok(action) = self.control_rx.recv() else {
                break;
            };

            match action {
                Control::Cmd(command) => {
                    if let Err(e) = self.handle_command(&command) {
                        match e {
                            CommandError::ExitRequested => {
                                self.shutdown(true);
                                break;
                            }
                            CommandError::Parsing(_) | CommandError::NoSuchCommand(_) => {
                                self.printer.print(ErrorView::from(e));
                            }
                            CommandError::Handle(ref err) if err.is_fatal() => {
                                self.printer.print(ErrorView::from("shutdown debugger"));
                                self.printer
                                    .print(ErrorView::from(format!("fatal debugger error: {e:#}")));
                                break;
                            }
                            CommandError::Handle(ref err) if err.is_process_exited() => {
                                self.printer.print(err);
                            }
                            CommandError::Handle(Error::Hook(ref err)) => {
                                warn!(target: "debugger", "event hook: {err:#}");
                            }
                            CommandError::Handle(_) => {
                                self.printer
                                    .print(ErrorView::from(format!("Command failed: {e}")));
                            }
                        }
                    }
                }
                Control::Terminate => {
                    self.shutdown(false);
                    break;
                }
            }
        }
    }
}
