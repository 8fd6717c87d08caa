use super::{checkpoint, interrupt, r#break, r#continue, restart, step_into};
use super::{Command, CommandError, CommandResult};
use crate::debugger::StepOperation;
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, Parser};

pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const TRACE_COMMAND: &str = "trace";
pub const TRACE_COMMAND_SHORT: &str = "t";
pub const CLEAR_COMMAND: &str = "clear";
pub const BREAKPOINTS_COMMAND: &str = "breakpoints";
pub const BREAKPOINTS_COMMAND_SHORT: &str = "bp";
pub const CONDITION_COMMAND: &str = "condition";
pub const CONDITION_COMMAND_SHORT: &str = "cond";
pub const RESTART_COMMAND: &str = "restart";
pub const RESTART_COMMAND_SHORT: &str = "r";
pub const REBUILD_COMMAND: &str = "rebuild";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const REWIND_COMMAND: &str = "rewind";
pub const REWIND_COMMAND_SHORT: &str = "rw";
pub const CHECKPOINT_COMMAND: &str = "checkpoint";
pub const CHECKPOINT_COMMAND_SHORT: &str = "check";
pub const CHECKPOINTS_COMMAND: &str = "checkpoints";
pub const CLEAR_CHECKPOINT_COMMAND: &str = "clear-checkpoint";
pub const STEP_COMMAND: &str = "step";
pub const STEP_COMMAND_SHORT: &str = "s";
pub const STEP_LIST_KEY: &str = "-list";
pub const STEP_FIRST_KEY: &str = "-first";
pub const STEP_LAST_KEY: &str = "-last";
pub const STEP_INSTRUCTION_COMMAND: &str = "step-instruction";
pub const STEP_INSTRUCTION_COMMAND_SHORT: &str = "si";
pub const NEXT_COMMAND: &str = "next";
pub const NEXT_COMMAND_SHORT: &str = "n";
pub const STEP_OUT_COMMAND: &str = "stepout";
pub const STEP_OUT_COMMAND_SHORT: &str = "o";
pub const REVERSE_COMMAND: &str = "rev";
pub const CANCEL_NEXT_COMMAND: &str = "cancelnext";
pub const INTERRUPT_COMMAND: &str = "interrupt";
pub const PRINT_COMMAND: &str = "print";
pub const PRINT_COMMAND_SHORT: &str = "p";
pub const SET_COMMAND: &str = "set";
pub const GOROUTINE_COMMAND: &str = "goroutine";
pub const GOROUTINE_COMMAND_SHORT: &str = "gr";
pub const THREAD_COMMAND: &str = "thread";
pub const THREAD_COMMAND_SHORT: &str = "tr";
pub const FRAME_COMMAND: &str = "frame";
pub const STACK_COMMAND: &str = "stack";
pub const STACK_COMMAND_SHORT: &str = "bt";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const EXIT_COMMAND: &str = "exit";
pub const EXIT_COMMAND_QUIT: &str = "quit";
pub const EXIT_COMMAND_SHORT: &str = "q";

/// Verb table, the first name of every entry is the main one, the rest are aliases.
pub const COMMANDS: &[&[&str]] = &[
    &[HELP_COMMAND, HELP_COMMAND_SHORT],
    &[BREAK_COMMAND, BREAK_COMMAND_SHORT],
    &[TRACE_COMMAND, TRACE_COMMAND_SHORT],
    &[CLEAR_COMMAND],
    &[BREAKPOINTS_COMMAND, BREAKPOINTS_COMMAND_SHORT],
    &[CONDITION_COMMAND, CONDITION_COMMAND_SHORT],
    &[RESTART_COMMAND, RESTART_COMMAND_SHORT],
    &[REBUILD_COMMAND],
    &[CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT],
    &[REWIND_COMMAND, REWIND_COMMAND_SHORT],
    &[CHECKPOINT_COMMAND, CHECKPOINT_COMMAND_SHORT],
    &[CHECKPOINTS_COMMAND],
    &[CLEAR_CHECKPOINT_COMMAND],
    &[STEP_COMMAND, STEP_COMMAND_SHORT],
    &[STEP_INSTRUCTION_COMMAND, STEP_INSTRUCTION_COMMAND_SHORT],
    &[NEXT_COMMAND, NEXT_COMMAND_SHORT],
    &[STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT],
    &[REVERSE_COMMAND],
    &[CANCEL_NEXT_COMMAND],
    &[INTERRUPT_COMMAND],
    &[PRINT_COMMAND, PRINT_COMMAND_SHORT],
    &[SET_COMMAND],
    &[GOROUTINE_COMMAND, GOROUTINE_COMMAND_SHORT],
    &[THREAD_COMMAND, THREAD_COMMAND_SHORT],
    &[FRAME_COMMAND],
    &[STACK_COMMAND, STACK_COMMAND_SHORT],
    &[EXIT_COMMAND, EXIT_COMMAND_QUIT, EXIT_COMMAND_SHORT],
];

/// Find verb in a verb table, exit verbs are reported as [`CommandError::ExitRequested`].
pub fn find_verb(word: &str) -> CommandResult<&'static str> {
    let names = COMMANDS
        .iter()
        .find(|names| names.contains(&word))
        .ok_or_else(|| CommandError::NoSuchCommand(word.to_string()))?;
    if names[0] == EXIT_COMMAND {
        return Err(CommandError::ExitRequested);
    }
    names
        .iter()
        .copied()
        .find(|&name| name == word)
        .ok_or_else(|| CommandError::NoSuchCommand(word.to_string()))
}

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Single word of a command line.
fn word<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .padded()
}

/// One of the `names` followed by a whitespace or the end of input.
fn verb<'a>(names: &'static [&'static str]) -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    word()
        .try_map(move |w: &str, span| {
            if names.contains(&w) {
                Ok(w)
            } else {
                Err(Rich::custom(span, format!("expect one of: {}", names.join(", "))))
            }
        })
        .labelled(names[0])
}

/// Rest of the line, trimmed.
fn rest<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    any()
        .repeated()
        .to_slice()
        .map(|s: &str| s.trim().to_string())
}

pub fn number<'a>() -> impl Parser<'a, &'a str, i64, Err<'a>> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<i64>()
                .map_err(|e| Rich::custom(span, format!("invalid number {s}: {e}")))
        })
        .padded()
        .labelled("number")
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        let Some(word) = input.split_whitespace().next() else {
            return Ok(Command::SkipInput);
        };
        find_verb(word)?;

        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| {
                let reason = e
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unexpected input".to_string());
                CommandError::Parsing(reason)
            })
    }

    fn parser<'a>() -> impl Parser<'a, &'a str, Command, Err<'a>> {
        let r#break = verb(&[BREAK_COMMAND, BREAK_COMMAND_SHORT])
            .ignore_then(rest())
            .map(|spec| {
                Command::Breakpoint(r#break::Command::Add {
                    spec,
                    tracepoint: false,
                })
            });
        let trace = verb(&[TRACE_COMMAND, TRACE_COMMAND_SHORT])
            .ignore_then(rest())
            .map(|spec| {
                Command::Breakpoint(r#break::Command::Add {
                    spec,
                    tracepoint: true,
                })
            });
        let clear = verb(&[CLEAR_COMMAND])
            .ignore_then(rest())
            .map(|target| Command::Breakpoint(r#break::Command::Clear(target)));
        let breakpoints = verb(&[BREAKPOINTS_COMMAND, BREAKPOINTS_COMMAND_SHORT])
            .to(Command::Breakpoint(r#break::Command::List));
        let condition = verb(&[CONDITION_COMMAND, CONDITION_COMMAND_SHORT])
            .ignore_then(word().labelled("breakpoint id or name"))
            .then(rest())
            .map(|(target, cond)| {
                Command::Breakpoint(r#break::Command::Condition {
                    target: target.to_string(),
                    cond,
                })
            });

        let restart = verb(&[RESTART_COMMAND, RESTART_COMMAND_SHORT])
            .ignore_then(rest())
            .map(|args| Command::Restart(restart::Command::Restart(args)));
        let rebuild = verb(&[REBUILD_COMMAND]).to(Command::Restart(restart::Command::Rebuild));

        let r#continue = verb(&[CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT])
            .to(Command::Continue(r#continue::Command::Forward));
        let rewind = verb(&[REWIND_COMMAND, REWIND_COMMAND_SHORT])
            .to(Command::Continue(r#continue::Command::Rewind));

        let checkpoint = verb(&[CHECKPOINT_COMMAND, CHECKPOINT_COMMAND_SHORT])
            .ignore_then(rest())
            .map(|label| {
                let label = (!label.is_empty()).then_some(label);
                Command::Checkpoint(checkpoint::Command::Create(label))
            });
        let checkpoints =
            verb(&[CHECKPOINTS_COMMAND]).to(Command::Checkpoint(checkpoint::Command::List));
        let clear_checkpoint = verb(&[CLEAR_CHECKPOINT_COMMAND])
            .ignore_then(just('c').or_not().ignore_then(number()))
            .map(|id| Command::Checkpoint(checkpoint::Command::Clear(id)));

        let step = verb(&[STEP_COMMAND, STEP_COMMAND_SHORT])
            .ignore_then(word().or_not())
            .map(|arg| {
                let cmd = match arg {
                    None => step_into::Command::Default,
                    Some(STEP_FIRST_KEY) => step_into::Command::First,
                    Some(STEP_LAST_KEY) => step_into::Command::Last,
                    Some(STEP_LIST_KEY) => step_into::Command::List,
                    Some(name) => step_into::Command::Call(name.to_string()),
                };
                Command::StepInto(cmd)
            });
        let step_instruction = verb(&[STEP_INSTRUCTION_COMMAND, STEP_INSTRUCTION_COMMAND_SHORT])
            .to(Command::StepInstruction);
        let next = verb(&[NEXT_COMMAND, NEXT_COMMAND_SHORT]).to(Command::StepOver);
        let step_out = verb(&[STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT]).to(Command::StepOut);
        let reverse = verb(&[REVERSE_COMMAND])
            .ignore_then(choice((
                verb(&[NEXT_COMMAND, NEXT_COMMAND_SHORT]).to(StepOperation::ReverseNext),
                verb(&[STEP_COMMAND, STEP_COMMAND_SHORT]).to(StepOperation::ReverseStep),
                verb(&[STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT])
                    .to(StepOperation::ReverseStepOut),
                verb(&[STEP_INSTRUCTION_COMMAND, STEP_INSTRUCTION_COMMAND_SHORT])
                    .to(StepOperation::ReverseStepInstruction),
            )))
            .map(Command::Reverse);

        let cancel_next = verb(&[CANCEL_NEXT_COMMAND])
            .to(Command::Interrupt(interrupt::Command::CancelNext));
        let interrupt =
            verb(&[INTERRUPT_COMMAND]).to(Command::Interrupt(interrupt::Command::Halt));

        let print = verb(&[PRINT_COMMAND, PRINT_COMMAND_SHORT])
            .ignore_then(rest())
            .map(Command::Print);
        let set = verb(&[SET_COMMAND]).ignore_then(rest()).map(Command::Set);

        let goroutine = verb(&[GOROUTINE_COMMAND, GOROUTINE_COMMAND_SHORT])
            .ignore_then(number().or_not())
            .map(Command::Goroutine);
        let thread = verb(&[THREAD_COMMAND, THREAD_COMMAND_SHORT])
            .ignore_then(number().or_not())
            .map(Command::Thread);
        let frame = verb(&[FRAME_COMMAND])
            .ignore_then(number().or_not())
            .map(Command::Frame);
        let stack = verb(&[STACK_COMMAND, STACK_COMMAND_SHORT])
            .ignore_then(number().or_not())
            .map(Command::Backtrace);

        let help = verb(&[HELP_COMMAND, HELP_COMMAND_SHORT])
            .ignore_then(word().or_not())
            .map(|s| Command::Help {
                command: s.map(ToOwned::to_owned),
                reason: None,
            });

        let breakpoint_and_execution = choice((
            command(BREAK_COMMAND, r#break),
            command(TRACE_COMMAND, trace),
            command(CLEAR_COMMAND, clear),
            command(BREAKPOINTS_COMMAND, breakpoints),
            command(CONDITION_COMMAND, condition),
            command(RESTART_COMMAND, restart),
            command(REBUILD_COMMAND, rebuild),
            command(CONTINUE_COMMAND, r#continue),
            command(REWIND_COMMAND, rewind),
            command(CHECKPOINT_COMMAND, checkpoint),
            command(CHECKPOINTS_COMMAND, checkpoints),
            command(CLEAR_CHECKPOINT_COMMAND, clear_checkpoint),
        ));
        let step_and_data = choice((
            command(STEP_COMMAND, step),
            command(STEP_INSTRUCTION_COMMAND, step_instruction),
            command(NEXT_COMMAND, next),
            command(STEP_OUT_COMMAND, step_out),
            command(REVERSE_COMMAND, reverse),
            command(CANCEL_NEXT_COMMAND, cancel_next),
            command(INTERRUPT_COMMAND, interrupt),
            command(PRINT_COMMAND, print),
            command(SET_COMMAND, set),
            command(GOROUTINE_COMMAND, goroutine),
            command(THREAD_COMMAND, thread),
            command(FRAME_COMMAND, frame),
            command(STACK_COMMAND, stack),
            command(HELP_COMMAND, help),
        ));

        choice((breakpoint_and_execution, step_and_data))
    }
}

#[test]
fn test_number_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<i64, ()>,
    }
    let cases = vec![
        TestCase {
            string: "12",
            result: Ok(12),
        },
        TestCase {
            string: "  -1 ",
            result: Ok(-1),
        },
        TestCase {
            string: "0x10",
            result: Err(()),
        },
        TestCase {
            string: "99999999999999999999",
            result: Err(()),
        },
    ];

    for tc in cases {
        let num = number().then_ignore(end()).parse(tc.string).into_result();
        assert_eq!(num.map_err(|_| ()), tc.result, "{}", tc.string);
    }
}

#[test]
fn test_find_verb() {
    assert_eq!(find_verb("b").unwrap(), "b");
    assert_eq!(find_verb("clear-checkpoint").unwrap(), "clear-checkpoint");
    assert!(matches!(find_verb("q"), Err(CommandError::ExitRequested)));
    assert!(matches!(
        find_verb("layout"),
        Err(CommandError::NoSuchCommand(_))
    ));
}

#[test]
fn test_parser() {
    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: Result<Command, CommandError>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["break main.go:10", "b   main.go:10  "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Add {
                        spec: "main.go:10".to_string(),
                        tracepoint: false
                    })
                );
            },
        },
        TestCase {
            inputs: vec!["trace mybp main.main", "t mybp main.main"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Add {
                        spec: "mybp main.main".to_string(),
                        tracepoint: true
                    })
                );
            },
        },
        TestCase {
            inputs: vec!["breakpoints", "bp"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::List)
                );
            },
        },
        TestCase {
            inputs: vec!["clear 2"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Clear("2".to_string()))
                );
            },
        },
        TestCase {
            inputs: vec!["cond mybp i == 5", "condition mybp  i == 5 "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Condition {
                        target: "mybp".to_string(),
                        cond: "i == 5".to_string()
                    })
                );
            },
        },
        TestCase {
            inputs: vec!["cond"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::Parsing(_))));
            },
        },
        TestCase {
            inputs: vec!["r -- -v 'a b'"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Restart(restart::Command::Restart("-- -v 'a b'".to_string()))
                );
            },
        },
        TestCase {
            inputs: vec!["rebuild"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Restart(restart::Command::Rebuild)
                );
            },
        },
        TestCase {
            inputs: vec!["rebuild now"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::Parsing(_))));
            },
        },
        TestCase {
            inputs: vec!["c", "continue"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Continue(r#continue::Command::Forward)
                );
            },
        },
        TestCase {
            inputs: vec!["rw"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Continue(r#continue::Command::Rewind)
                );
            },
        },
        TestCase {
            inputs: vec!["check", "checkpoint  "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Checkpoint(checkpoint::Command::Create(None))
                );
            },
        },
        TestCase {
            inputs: vec!["checkpoint before loop"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Checkpoint(checkpoint::Command::Create(Some(
                        "before loop".to_string()
                    )))
                );
            },
        },
        TestCase {
            inputs: vec!["clear-checkpoint 3", "clear-checkpoint c3"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Checkpoint(checkpoint::Command::Clear(3))
                );
            },
        },
        TestCase {
            inputs: vec!["checkpoints"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Checkpoint(checkpoint::Command::List)
                );
            },
        },
        TestCase {
            inputs: vec!["s", "step"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::StepInto(step_into::Command::Default)
                );
            },
        },
        TestCase {
            inputs: vec!["s -last"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::StepInto(step_into::Command::Last)
                );
            },
        },
        TestCase {
            inputs: vec!["step -list"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::StepInto(step_into::Command::List)
                );
            },
        },
        TestCase {
            inputs: vec!["step main.work"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::StepInto(step_into::Command::Call("main.work".to_string()))
                );
            },
        },
        TestCase {
            inputs: vec!["si", "step-instruction"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::StepInstruction);
            },
        },
        TestCase {
            inputs: vec!["n", "next"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::StepOver);
            },
        },
        TestCase {
            inputs: vec!["o", "stepout"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::StepOut);
            },
        },
        TestCase {
            inputs: vec!["rev step", "rev s"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Reverse(StepOperation::ReverseStep)
                );
            },
        },
        TestCase {
            inputs: vec!["rev si"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Reverse(StepOperation::ReverseStepInstruction)
                );
            },
        },
        TestCase {
            inputs: vec!["rev", "rev continue"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::Parsing(_))));
            },
        },
        TestCase {
            inputs: vec!["cancelnext"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Interrupt(interrupt::Command::CancelNext)
                );
            },
        },
        TestCase {
            inputs: vec!["interrupt"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Interrupt(interrupt::Command::Halt)
                );
            },
        },
        TestCase {
            inputs: vec!["p a.b[1]", "print   a.b[1] "],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Print("a.b[1]".to_string()));
            },
        },
        TestCase {
            inputs: vec!["set x = y == z"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Set("x = y == z".to_string()));
            },
        },
        TestCase {
            inputs: vec!["gr 5", "goroutine 5"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Goroutine(Some(5)));
            },
        },
        TestCase {
            inputs: vec!["tr"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Thread(None));
            },
        },
        TestCase {
            inputs: vec!["frame 2"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Frame(Some(2)));
            },
        },
        TestCase {
            inputs: vec!["frame x"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::Parsing(_))));
            },
        },
        TestCase {
            inputs: vec!["bt 10", "stack 10"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Backtrace(Some(10)));
            },
        },
        TestCase {
            inputs: vec!["h break", "help break"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Help {
                        command: Some("break".to_string()),
                        reason: None
                    }
                );
            },
        },
        TestCase {
            inputs: vec!["stepover", "var locals"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::NoSuchCommand(_))));
            },
        },
        TestCase {
            inputs: vec!["quit"],
            command_matcher: |result| {
                assert!(matches!(result, Err(CommandError::ExitRequested)));
            },
        },
    ];

    for case in cases {
        for input in case.inputs {
            let result = Command::parse(input);
            (case.command_matcher)(result);
        }
    }
}
