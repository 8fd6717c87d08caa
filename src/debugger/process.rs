use crate::debugger::rpc::api::{Breakpoint, DiscardedBreakpoint};
use crate::debugger::rpc::RpcClient;
use crate::debugger::{Debugger, Error};
use crate::muted_error;
use log::{debug, info, warn};
use std::process::Command;

/// Result of target process replacement.
#[derive(Debug, Default)]
pub struct RestartOutcome {
    /// Pid of the new process.
    pub pid: i64,
    /// Breakpoints that backend can't keep in the new process.
    pub discarded: Vec<DiscardedBreakpoint>,
    /// Breakpoints created from requests made while there was no process.
    pub scheduled: Vec<Breakpoint>,
    /// Breakpoints created again in the new process.
    pub restored: Vec<Breakpoint>,
    /// Failures of breakpoint restoration.
    pub errors: Vec<Error>,
}

/// Render discarded breakpoint as `Discarded <name> at <location>: <reason>`.
pub fn discarded_notice(discarded: &DiscardedBreakpoint) -> String {
    match &discarded.breakpoint {
        Some(bp) => format!(
            "Discarded {} at {}: {}",
            bp.display_name(false),
            bp.display_location(),
            discarded.reason
        ),
        None => format!("Discarded breakpoint: {}", discarded.reason),
    }
}

impl Debugger {
    /// Return true if target is a recording.
    pub fn is_recorded(&self) -> Result<bool, Error> {
        self.client.recorded()
    }

    /// Restart target process.
    ///
    /// # Arguments
    ///
    /// * `args`: new command line arguments, `None` means keep the previous ones.
    pub fn restart(&mut self, args: Option<Vec<String>>) -> Result<RestartOutcome, Error> {
        let reset_args = args.is_some();
        let new_args = args.unwrap_or_default();
        self.replace_process(move |client| client.restart_from("", reset_args, new_args, false))
    }

    /// Restart a recording from a checkpoint (or an event number) `position`.
    pub fn restart_from(&mut self, position: &str) -> Result<(), Error> {
        self.client.restart_from(position.trim(), false, vec![], false)?;
        self.state()?;
        Ok(())
    }

    /// Rebuild target with configured build command and restart it.
    pub fn rebuild(&mut self) -> Result<RestartOutcome, Error> {
        self.build()?;
        self.replace_process(|client| client.restart_from("", false, vec![], false))
    }

    fn build(&self) -> Result<(), Error> {
        let (program, args) = self
            .config
            .rebuild_command
            .split_first()
            .ok_or_else(|| Error::Build("empty build command".to_string()))?;
        let program_path =
            which::which(program).map_err(|e| Error::Build(format!("{program}: {e}")))?;

        info!(target: "debugger", "rebuild: {program} {}", args.join(" "));
        let output = Command::new(program_path)
            .args(args)
            .output()
            .map_err(|e| Error::Build(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Build(stderr.trim().to_string()));
        }
        Ok(())
    }

    /// Replace target process with a new one, moving breakpoints into it.
    ///
    /// Live breakpoints are frozen and removed, after restart the discarded breakpoints are
    /// reported, scheduled requests applied and frozen breakpoints restored.
    /// If restart fails, frozen breakpoints are restored in the old process.
    fn replace_process<F>(&mut self, restart: F) -> Result<RestartOutcome, Error>
    where
        F: FnOnce(&RpcClient) -> Result<Vec<DiscardedBreakpoint>, Error>,
    {
        self.prepare_process_replacement();

        let discarded = match restart(&self.client) {
            Ok(discarded) => discarded,
            Err(e) => {
                let (restored, errors) = self.restore_frozen();
                debug!(target: "debugger", "restart failed, {} breakpoints restored", restored.len());
                for err in errors {
                    warn!(target: "debugger", "{err}");
                }
                return Err(e);
            }
        };
        let pid = self.client.process_pid()?;
        debug!(target: "debugger", "process replaced, new pid: {pid}");
        self.hooks.on_process_install(pid);

        if muted_error!(self.state(), "state after restart:").is_none() {
            self.selection = Default::default();
        }

        for d in &discarded {
            self.hooks.on_notice(&discarded_notice(d));
        }

        let (scheduled, mut errors) = self.apply_scheduled();
        let (restored, restore_errors) = self.restore_frozen();
        errors.extend(restore_errors);

        Ok(RestartOutcome {
            pid,
            discarded,
            scheduled,
            restored,
            errors,
        })
    }
}

/// Split command line into fields. Single quotes group a field, inside quotes
/// a backslash escapes the next character.
pub fn split_quoted_fields(input: &str) -> Vec<String> {
    enum State {
        InSpace,
        InField,
        InQuote,
        InQuoteEscaped,
    }

    let mut state = State::InSpace;
    let mut fields = vec![];
    let mut buf = String::new();

    for ch in input.chars() {
        state = match state {
            State::InSpace if ch == '\'' => State::InQuote,
            State::InSpace if ch.is_whitespace() => State::InSpace,
            State::InSpace => {
                buf.push(ch);
                State::InField
            }
            State::InField if ch == '\'' => State::InQuote,
            State::InField if ch.is_whitespace() => {
                fields.push(std::mem::take(&mut buf));
                State::InSpace
            }
            State::InField => {
                buf.push(ch);
                State::InField
            }
            State::InQuote if ch == '\'' => State::InField,
            State::InQuote if ch == '\\' => State::InQuoteEscaped,
            State::InQuote => {
                buf.push(ch);
                State::InQuote
            }
            State::InQuoteEscaped => {
                buf.push(ch);
                State::InQuote
            }
        };
    }

    if !buf.is_empty() {
        fields.push(buf);
    }
    fields
}

/// Parse `[--] [args]` restart arguments, `None` if arguments must not be changed.
pub fn restart_args(input: &str) -> Option<Vec<String>> {
    if input.trim().is_empty() {
        return None;
    }
    let mut argv = split_quoted_fields(input.trim());
    if argv.first().map(String::as_str) == Some("--") {
        argv.remove(0);
    }
    Some(argv)
}
