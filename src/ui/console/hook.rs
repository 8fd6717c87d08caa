use crate::debugger::rpc::api::{DebuggerState, Location, Stackframe, Thread};
use crate::debugger::EventHook;
use crate::ui::console::print::style::{AddressView, FunctionNameView, KeywordView};
use crate::ui::console::print::{ExternalPrinter, SourcePlace};
use crate::ui::console::variable::{render_variable, render_variable_singleline};

const OPTIMIZED_FUNCTION_WARNING: &str = "Warning: debugging optimized function";

pub struct TerminalHook {
    printer: ExternalPrinter,
}

impl TerminalHook {
    pub fn new(printer: ExternalPrinter) -> Self {
        Self { printer }
    }
}

impl EventHook for TerminalHook {
    fn on_stop(&self, state: &DebuggerState) -> anyhow::Result<()> {
        self.printer.print_lines(render_stop_context(state));
        Ok(())
    }

    fn on_notice(&self, message: &str) {
        self.printer.print(message);
    }

    fn on_exit(&self, pid: i64, status: i64) {
        self.printer.print(format!(
            "Process {} has exited with status {status}",
            KeywordView::from(pid)
        ));
    }

    fn on_process_install(&self, pid: i64) {
        self.printer
            .print(format!("Process restarted with PID {}", KeywordView::from(pid)));
    }
}

/// Render stop context: threads stopped at breakpoints first, then the current thread.
pub fn render_stop_context(state: &DebuggerState) -> Vec<String> {
    let mut lines = vec![];
    let current_id = state.current_thread.as_ref().map(|t| t.id);

    for thread in &state.threads {
        if Some(thread.id) != current_id && thread.breakpoint.is_some() {
            render_thread_context(&mut lines, thread);
        }
    }

    match &state.current_thread {
        None => lines.push("No current thread available".to_string()),
        Some(thread) if thread.file.is_empty() => {
            let pc = AddressView::from(format!("{:#x}", thread.pc));
            lines.push(format!("Stopped at: {pc}"));
        }
        Some(thread) => render_thread_context(&mut lines, thread),
    }
    lines
}

fn render_thread_context(lines: &mut Vec<String>, thread: &Thread) {
    let fn_name = FunctionNameView::from(thread.function_name());
    let place = SourcePlace {
        file: &thread.file,
        line: thread.line,
    };
    let pc = AddressView::from(format!("{:#x}", thread.pc));
    let optimized = thread.function.as_ref().map(|f| f.optimized).unwrap_or(false);

    let Some(bp) = &thread.breakpoint else {
        lines.push(format!("> {fn_name}() {place} (PC: {pc})"));
        if optimized {
            lines.push(OPTIMIZED_FUNCTION_WARNING.to_string());
        }
        render_return_values(lines, thread);
        return;
    };

    let info = thread.breakpoint_info.as_ref();
    let args = match info {
        Some(info) if bp.load_args.is_some() => info
            .arguments
            .iter()
            .map(|arg| format!("{}={}", arg.name, render_variable_singleline(arg)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    };
    let bp_name = if bp.name.is_empty() {
        String::new()
    } else {
        format!("[{}] ", bp.name)
    };
    let hits = match bp.hit_count.get(&thread.goroutine_id.to_string()) {
        Some(count) => format!(
            "hits goroutine({}):{count} total:{}",
            thread.goroutine_id, bp.total_hit_count
        ),
        None => format!("hits total:{}", bp.total_hit_count),
    };
    lines.push(format!(
        "> {bp_name}{fn_name}({args}) {place} ({hits}) (PC: {pc})"
    ));
    if optimized {
        lines.push(OPTIMIZED_FUNCTION_WARNING.to_string());
    }
    render_return_values(lines, thread);

    let Some(info) = info else {
        return;
    };
    if let Some(goroutine) = &info.goroutine {
        lines.push(format!("\tGoroutine {}:", goroutine.id));
        lines.push(format!("\t\tRuntime: {}", format_location(&goroutine.current_loc)));
        lines.push(format!("\t\tUser: {}", format_location(&goroutine.user_current_loc)));
    }
    for var in info.variables.iter().chain(info.locals.iter()) {
        lines.push(format!("    {}: {}", var.name, render_variable(var, "\t")));
    }
    if !info.stacktrace.is_empty() {
        lines.push("    Stack:".to_string());
        lines.extend(render_stack(&info.stacktrace, "        ", None));
    }
}

fn render_return_values(lines: &mut Vec<String>, thread: &Thread) {
    if thread.return_values.is_empty() {
        return;
    }
    lines.push("Values returned:".to_string());
    for var in &thread.return_values {
        lines.push(format!("\t{}: {}", var.name, render_variable(var, "\t")));
    }
    lines.push(String::new());
}

fn format_location(loc: &Location) -> String {
    format!(
        "{} at {} ({:#x})",
        loc.function_name().unwrap_or_default(),
        SourcePlace {
            file: &loc.file,
            line: loc.line
        },
        loc.pc
    )
}

/// Render stack frames, two lines per frame. Frame `selected` is marked with `*`.
pub fn render_stack(stack: &[Stackframe], indent: &str, selected: Option<i64>) -> Vec<String> {
    let width = stack.len().saturating_sub(1).to_string().len();
    let location_indent = " ".repeat(width + 2);

    stack
        .iter()
        .enumerate()
        .flat_map(|(num, frame)| {
            let mark = if selected == Some(num as i64) { "*" } else { " " };
            let loc = &frame.location;
            let mut frame_lines = vec![
                format!(
                    "{indent}{mark}{num:>width$}  {} in {}",
                    AddressView::from(format!("{:#018x}", loc.pc)),
                    FunctionNameView::from(loc.function_name()),
                ),
                format!(
                    "{indent} {location_indent}at {}",
                    SourcePlace {
                        file: &loc.file,
                        line: loc.line
                    }
                ),
            ];
            if !frame.err.is_empty() {
                frame_lines.push(format!("{indent} {location_indent}error: {}", frame.err));
            }
            frame_lines
        })
        .collect()
}
