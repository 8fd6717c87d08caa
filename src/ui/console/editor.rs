use crate::ui::command::parser::{
    CLEAR_COMMAND, COMMANDS, CONDITION_COMMAND, CONDITION_COMMAND_SHORT, EXIT_COMMAND,
    HELP_COMMAND, HELP_COMMAND_SHORT, NEXT_COMMAND, REVERSE_COMMAND, STEP_COMMAND,
    STEP_FIRST_KEY, STEP_INSTRUCTION_COMMAND, STEP_LAST_KEY, STEP_LIST_KEY,
    STEP_OUT_COMMAND,
};
use chumsky::prelude::{any, choice, just};
use chumsky::text::whitespace;
use chumsky::{extra, Parser};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::line_buffer::LineBuffer;
use rustyline::{Changeset, CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use trie_rs::{Trie, TrieBuilder};

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn display_with_short(&self) -> String {
        match self.short {
            Some(ref short) if self.long.starts_with(short.as_str()) => format!(
                "{}{}",
                short.clone().bold().underlined(),
                &self.long[short.len()..]
            ),
            Some(ref short) => format!("{}|{}", &self.long, short.clone().bold().underlined()),
            None => self.long.clone(),
        }
    }

    fn with_subcommands(mut self, subcommands: &[&str]) -> Self {
        self.subcommands = subcommands.iter().map(ToString::to_string).collect();
        self
    }
}

impl From<&[&str]> for CommandHint {
    fn from(names: &[&str]) -> Self {
        CommandHint {
            short: names.last().filter(|_| names.len() > 1).map(ToString::to_string),
            long: names.first().map(ToString::to_string).unwrap_or_default(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
    breakpoint_hints: Trie<u8>,
    breakpoints: Vec<String>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = COMMANDS
            .iter()
            .filter_map(|names| {
                let hint = commands.iter().find(|cmd| cmd.long == names[0])?;
                Some(
                    names
                        .iter()
                        .map(|name| (name.to_string(), hint.subcommands.clone()))
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .filter(|(_, subcommands)| !subcommands.is_empty())
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
            breakpoint_hints: TrieBuilder::new().build(),
            breakpoints: vec![],
        }
    }

    /// Replace known breakpoint names, used for `clear` and `condition` completion.
    pub fn replace_breakpoint_hints(&mut self, names: impl IntoIterator<Item = String>) {
        let mut builder = TrieBuilder::new();
        self.breakpoints = names.into_iter().filter(|name| !name.is_empty()).collect();
        self.breakpoints.iter().for_each(|name| {
            builder.push(name);
        });
        self.breakpoint_hints = builder.build();
    }
}

#[derive(Debug, PartialEq)]
enum CompletableCommand<'a> {
    BreakpointRef(&'a str),
    Help(&'a str),
    Unrecognized(&'a str, Option<&'a str>),
}

impl<'a> CompletableCommand<'a> {
    fn recognize(line: &'a str) -> Option<CompletableCommand<'a>> {
        let op = just::<_, _, extra::Default>;
        let word = any::<_, extra::Default>()
            .filter(|c: &char| !c.is_whitespace())
            .repeated()
            .at_least(1)
            .to_slice();

        let bp_ref = choice((
            op(CLEAR_COMMAND),
            op(CONDITION_COMMAND),
            op(CONDITION_COMMAND_SHORT),
        ))
        .then(whitespace().at_least(1))
        .ignore_then(any().filter(|c: &char| !c.is_whitespace()).repeated().to_slice())
        .map(CompletableCommand::BreakpointRef);

        let help = op(HELP_COMMAND)
            .or(op(HELP_COMMAND_SHORT))
            .then(whitespace().at_least(1))
            .ignore_then(any().repeated().to_slice())
            .map(CompletableCommand::Help);

        let other = word
            .clone()
            .then_ignore(whitespace().at_least(1))
            .then(word.or_not())
            .map(|(s1, s2): (&str, Option<&str>)| CompletableCommand::Unrecognized(s1.trim(), s2))
            .padded();

        choice((bp_ref, help, other)).parse(line).into_result().ok()
    }
}

fn pairs_from_variants(
    variants: impl Iterator<Item = impl ToString>,
    line: &str,
    tpl: &str,
) -> (usize, Vec<Pair>) {
    let pos = line.len() - tpl.len();
    let pairs = variants.map(|v| Pair {
        display: v.to_string(),
        replacement: v.to_string(),
    });
    (pos, pairs.collect())
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        match CompletableCommand::recognize(line) {
            Some(CompletableCommand::BreakpointRef(name)) => {
                if name.is_empty() {
                    return Ok(pairs_from_variants(self.breakpoints.iter(), line, name));
                }
                let variants = self.breakpoint_hints.predictive_search(name);
                let variants_iter = variants
                    .iter()
                    .filter_map(|var| std::str::from_utf8(var.as_slice()).ok());
                return Ok(pairs_from_variants(variants_iter, line, name));
            }
            Some(CompletableCommand::Help(command)) => {
                let variants = COMMANDS
                    .iter()
                    .map(|names| names[0])
                    .filter(|name| name.starts_with(command));
                return Ok(pairs_from_variants(variants, line, command));
            }
            Some(CompletableCommand::Unrecognized(cmd, mb_subcmd_part)) => {
                if let Some(subcommands) = self.subcommand_hints.get(cmd) {
                    let subcmd_part = mb_subcmd_part.unwrap_or_default();
                    let variants = subcommands
                        .iter()
                        .filter(|&subcmd| subcmd.starts_with(subcmd_part));
                    return Ok(pairs_from_variants(variants, line, subcmd_part));
                }
            }
            None => {}
        }

        let pairs = self
            .commands
            .iter()
            .filter(|&cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long.clone(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    pub completer: Arc<Mutex<CommandCompleter>>,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    pub colored_prompt: String,
}

impl RLHelper {
    /// Lock completer, a poisoned lock is still usable since completer holds only hints.
    pub fn completer(&self) -> MutexGuard<'_, CommandCompleter> {
        lock_completer(&self.completer)
    }
}

pub fn lock_completer(completer: &Mutex<CommandCompleter>) -> MutexGuard<'_, CommandCompleter> {
    completer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer().complete(line, pos, ctx)
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str, cl: &mut Changeset) {
        self.completer().update(line, start, elected, cl)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

fn command_hints() -> Vec<CommandHint> {
    COMMANDS
        .iter()
        .filter(|names| names[0] != EXIT_COMMAND)
        .map(|&names| {
            let hint = CommandHint::from(names);
            match names[0] {
                STEP_COMMAND => {
                    hint.with_subcommands(&[STEP_LIST_KEY, STEP_FIRST_KEY, STEP_LAST_KEY])
                }
                REVERSE_COMMAND => hint.with_subcommands(&[
                    NEXT_COMMAND,
                    STEP_COMMAND,
                    STEP_OUT_COMMAND,
                    STEP_INSTRUCTION_COMMAND,
                ]),
                _ => hint,
            }
        })
        .chain([CommandHint::from(&["quit", "q"][..])])
        .collect()
}

pub fn create_editor(promt: &str) -> anyhow::Result<Editor<RLHelper, DefaultHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)?
        .completion_type(CompletionType::List)
        .build();

    let h = RLHelper {
        completer: Arc::new(Mutex::new(CommandCompleter::new(command_hints()))),
        hinter: HistoryHinter {},
        colored_prompt: format!("{}", promt.with(Color::DarkGreen)),
    };

    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(h));
    Ok(editor)
}
