use crate::debugger::rpc::api::Breakpoint;
use crate::debugger::BreakpointIntent;
use rustyline::history::History;
use rustyline::{Editor, ExternalPrinter as RLExternalPrinter, Helper};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::path::Path;
use style::{AddressView, FilePathView, FunctionNameView, KeywordView};

/// [`ExternalPrinter`] safe print messages to stdout while the line editor waits for input.
///
/// There is a problem with [`ExternalPrinter`] and integration tests, see [this issue](https://github.com/kkawakam/rustyline/issues/703).
/// That's why in test environment external printer disabled.
pub struct ExternalPrinter {
    printer: Option<RefCell<Box<dyn RLExternalPrinter>>>,
}

unsafe impl Send for ExternalPrinter {}

impl ExternalPrinter {
    #[cfg(not(feature = "int_test"))]
    pub fn new<H: Helper, I: History>(editor: &mut Editor<H, I>) -> rustyline::Result<Self> {
        let external_p = editor.create_external_printer()?;
        Ok(Self {
            printer: Some(RefCell::new(Box::new(external_p))),
        })
    }

    #[cfg(feature = "int_test")]
    pub fn new<H: Helper, I: History>(_editor: &mut Editor<H, I>) -> rustyline::Result<Self> {
        Ok(Self { printer: None })
    }

    pub fn print(&self, msg: impl Display) {
        let msg = msg.to_string();
        match &self.printer {
            None => {
                println!("{msg}")
            }
            Some(printer) => {
                if let Err(e) = printer.borrow_mut().print(msg.clone()) {
                    log::warn!(target: "debugger", "external printer: {e:#}");
                    println!("{msg}");
                }
            }
        }
    }

    /// Print every line of a rendered block, e.g. a stop context or a stack trace.
    pub fn print_lines<L: Display>(&self, lines: impl IntoIterator<Item = L>) {
        lines.into_iter().for_each(|line| self.print(line));
    }
}

/// Replace current directory prefix of a path with `.`.
pub fn shorten_file_path(file: &str) -> String {
    let Ok(cwd) = std::env::current_dir() else {
        return file.to_string();
    };
    match Path::new(file).strip_prefix(&cwd) {
        Ok(rest) => format!(".{}{}", std::path::MAIN_SEPARATOR, rest.display()),
        Err(_) => file.to_string(),
    }
}

/// Source place of a thread, frame or breakpoint: `file:line` with a shortened file path.
pub struct SourcePlace<'a> {
    pub file: &'a str,
    pub line: i64,
}

impl Display for SourcePlace<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            FilePathView::from(shorten_file_path(self.file)),
            self.line
        )
    }
}

fn kind(tracepoint: bool) -> &'static str {
    if tracepoint {
        "Tracepoint"
    } else {
        "Breakpoint"
    }
}

/// Breakpoint headline: `Breakpoint 1`, `Tracepoint loop`.
pub fn breakpoint_title(bp: &Breakpoint) -> String {
    let title = if bp.name.is_empty() {
        bp.id.to_string()
    } else {
        bp.name.clone()
    };
    format!("{} {}", kind(bp.tracepoint), KeywordView::from(title))
}

/// Breakpoint location: `addr in fn at file:line`. Zero address means the breakpoint
/// is not bound to the current process and is omitted.
pub fn breakpoint_location(bp: &Breakpoint) -> String {
    let mut parts = vec![];
    if bp.addr != 0 {
        parts.push(AddressView::from(format!("{:#x}", bp.addr)).to_string());
    }
    if !bp.function_name.is_empty() {
        parts.push(format!("in {}", FunctionNameView::from(&bp.function_name)));
    }
    if !bp.file.is_empty() {
        parts.push(format!(
            "at {}",
            SourcePlace {
                file: &bp.file,
                line: bp.line
            }
        ));
    }
    parts.join(" ")
}

/// One line describing an action over a live breakpoint.
pub fn breakpoint_action(bp: &Breakpoint, action: &str) -> String {
    format!("{} {action} {}", breakpoint_title(bp), breakpoint_location(bp))
}

/// Breakpoint waiting for the next process instance.
/// Returns `None` for intents bound to the current process.
pub fn pending_breakpoint(intent: &BreakpointIntent) -> Option<String> {
    let line = match intent {
        BreakpointIntent::Scheduled(request) => format!(
            "{} {}",
            kind(request.tracepoint),
            KeywordView::from(&request.spec)
        ),
        BreakpointIntent::Frozen(frozen) => format!(
            "{} {} {}",
            kind(frozen.template.tracepoint),
            KeywordView::from(&frozen.key),
            breakpoint_location(&frozen.template)
        ),
        BreakpointIntent::Live { .. } => return None,
    };
    Some(format!("{line} (will be set on restart)"))
}

pub mod style {
    use crossterm::style::{Color, Stylize};
    use std::fmt::{Display, Formatter};

    const UNKNOWN_PLACEHOLDER: &str = "???";

    struct View<T: Display> {
        inner: Option<T>,
        color: Color,
    }

    impl<T: Display> Display for View<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let text = self
                .inner
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string());

            if cfg!(feature = "int_test") {
                f.write_str(&text)
            } else {
                f.write_fmt(format_args!("{}", text.with(self.color)))
            }
        }
    }

    /// Construct structure declaration to display data of the same type (file paths, addresses, etc.).
    /// A display style will reset if program compile with `int_test` feature.
    macro_rules! view_struct {
        ($name: ident, $color: expr) => {
            pub struct $name<T: Display>(View<T>);

            impl<T: Display> From<T> for $name<T> {
                fn from(value: T) -> Self {
                    Self(View {
                        inner: Some(value),
                        color: $color,
                    })
                }
            }

            impl<T: Display> From<Option<T>> for $name<T> {
                fn from(value: Option<T>) -> Self {
                    Self(View {
                        inner: value,
                        color: $color,
                    })
                }
            }

            impl<T: Display> Display for $name<T> {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        };
    }

    view_struct!(AddressView, Color::Blue);
    view_struct!(FilePathView, Color::Green);
    view_struct!(FunctionNameView, Color::Yellow);
    view_struct!(KeywordView, Color::Magenta);
    view_struct!(ErrorView, Color::Red);
}

#[cfg(all(test, feature = "int_test"))]
mod test {
    use super::*;
    use crate::debugger::breakpoint::BreakpointRequest;
    use crate::debugger::FrozenBreakpoint;

    fn breakpoint() -> Breakpoint {
        Breakpoint {
            id: 2,
            addr: 0x4a1b2c,
            file: "/src/main.go".to_string(),
            line: 13,
            function_name: "main.loop".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_breakpoint_action() {
        let bp = breakpoint();
        assert_eq!(
            breakpoint_action(&bp, "set"),
            "Breakpoint 2 set 0x4a1b2c in main.loop at /src/main.go:13"
        );

        let bp = Breakpoint {
            name: "loop".to_string(),
            tracepoint: true,
            addr: 0,
            function_name: String::new(),
            ..breakpoint()
        };
        assert_eq!(
            breakpoint_action(&bp, "cleared"),
            "Tracepoint loop cleared at /src/main.go:13"
        );
    }

    #[test]
    fn test_pending_breakpoint() {
        let bp = breakpoint();
        let live = BreakpointIntent::Live {
            id: bp.id,
            frozen: FrozenBreakpoint::freeze(&bp),
        };
        assert_eq!(pending_breakpoint(&live), None);

        let frozen = BreakpointIntent::Frozen(FrozenBreakpoint::freeze(&bp));
        assert_eq!(
            pending_breakpoint(&frozen).as_deref(),
            Some("Breakpoint /src/main.go:13 in main.loop at /src/main.go:13 (will be set on restart)")
        );

        let scheduled = BreakpointIntent::Scheduled(BreakpointRequest {
            spec: "main.go:12".to_string(),
            tracepoint: true,
        });
        assert_eq!(
            pending_breakpoint(&scheduled).as_deref(),
            Some("Tracepoint main.go:12 (will be set on restart)")
        );
    }
}
