pub mod breakpoint;
mod error;
pub mod process;
pub mod rpc;
pub mod step;
pub mod variable;

pub use breakpoint::{BreakpointIntent, BreakpointRegistry, ClearedBreakpoint, FrozenBreakpoint};
pub use error::Error;
pub use process::RestartOutcome;
pub use rpc::continuation::ContinueDirection;
pub use rpc::Interrupter;
pub use step::{StepIntoCall, StepOperation};

use crate::config::SessionConfig;
use crate::debugger::rpc::api::{Checkpoint, DebuggerState, EvalScope, Stackframe};
use crate::debugger::rpc::RpcClient;
use crate::weak_error;
use log::debug;
use std::net::ToSocketAddrs;

/// Receives notifications about session events.
pub trait EventHook {
    /// Called when target is stopped, once for every reported state.
    fn on_stop(&self, state: &DebuggerState) -> anyhow::Result<()>;
    /// Called for informational messages produced by long-running operations.
    fn on_notice(&self, message: &str);
    /// Called when target process exits.
    fn on_exit(&self, pid: i64, status: i64);
    /// Called when a new target process is started.
    fn on_process_install(&self, pid: i64);
}

/// Hook that ignores all events.
pub struct NopHook;

impl EventHook for NopHook {
    fn on_stop(&self, _: &DebuggerState) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_notice(&self, _: &str) {}

    fn on_exit(&self, _: i64, _: i64) {}

    fn on_process_install(&self, _: i64) {}
}

/// Currently selected goroutine, frame and thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Selected goroutine id, `-1` if there is none.
    pub goroutine_id: i64,
    pub frame: i64,
    /// Current thread id, `None` if there is no process.
    pub thread_id: Option<i64>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            goroutine_id: -1,
            frame: 0,
            thread_id: None,
        }
    }
}

impl Selection {
    /// Evaluation scope for the current selection.
    pub fn scope(&self) -> EvalScope {
        EvalScope {
            goroutine_id: self.goroutine_id,
            frame: self.frame,
            deferred_call: 0,
        }
    }

    /// Update selection from a new state snapshot, frame selection is reset.
    pub fn refresh(&mut self, state: &DebuggerState) {
        self.frame = 0;
        match state.current_thread.as_ref() {
            Some(thread) if !state.exited => {
                self.thread_id = Some(thread.id);
                self.goroutine_id = state
                    .selected_goroutine
                    .as_ref()
                    .map(|g| g.id)
                    .unwrap_or(thread.goroutine_id);
            }
            _ => {
                self.thread_id = None;
                self.goroutine_id = state.selected_goroutine.as_ref().map(|g| g.id).unwrap_or(-1);
            }
        }
    }

    pub fn has_process(&self) -> bool {
        self.thread_id.is_some()
    }
}

pub(crate) fn notify_stop(
    selection: &mut Selection,
    hooks: &dyn EventHook,
    state: &DebuggerState,
) -> Result<(), Error> {
    selection.refresh(state);
    hooks.on_stop(state).map_err(Error::Hook)
}

/// Client side of a debugging session.
pub struct Debugger {
    client: RpcClient,
    selection: Selection,
    breakpoints: BreakpointRegistry,
    config: SessionConfig,
    hooks: Box<dyn EventHook>,
}

impl Debugger {
    /// Connect to a backend at `addr` and create a session.
    pub fn connect(
        addr: impl ToSocketAddrs,
        config: SessionConfig,
        hooks: impl EventHook + 'static,
    ) -> Result<Self, Error> {
        let client = RpcClient::connect(addr)?;
        Ok(Self::new(client, config, hooks))
    }

    pub fn new(mut client: RpcClient, config: SessionConfig, hooks: impl EventHook + 'static) -> Self {
        client.set_return_values_load_config(Some(config.load_config()));
        let mut selection = Selection::default();
        if let Some(state) = weak_error!(client.state(), "initial state:") {
            selection.refresh(&state);
        }
        debug!(target: "debugger", "session created, selection: {selection:?}");

        Self {
            client,
            selection,
            breakpoints: BreakpointRegistry::default(),
            config,
            hooks: Box::new(hooks),
        }
    }

    pub fn set_hook(&mut self, hooks: impl EventHook + 'static) {
        self.hooks = Box::new(hooks);
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn interrupter(&self) -> Interrupter {
        self.client.interrupter()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of breakpoint intents.
    pub fn breakpoint_intents(&self) -> Vec<BreakpointIntent> {
        self.breakpoints.snapshot()
    }

    /// Request current state from backend and refresh selection.
    pub fn state(&mut self) -> Result<DebuggerState, Error> {
        let state = self.client.state()?;
        self.selection.refresh(&state);
        Ok(state)
    }

    fn report_stop(&mut self, state: &DebuggerState) -> Result<(), Error> {
        notify_stop(&mut self.selection, self.hooks.as_ref(), state)
    }

    fn report_exit(&mut self, pid: i64, status: i64) {
        self.selection.thread_id = None;
        self.selection.frame = 0;
        self.hooks.on_exit(pid, status);
    }

    /// Route process exit into [`EventHook::on_exit`], other results are returned as is.
    fn observe_exit(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Err(Error::ProcessExited { pid, status }) => {
                self.report_exit(pid, status);
                Ok(())
            }
            other => other,
        }
    }

    // ------------------------------------------ execution control -------------------------------

    /// Resume target in a given direction, until it stops not at a tracepoint.
    fn drain_continue(&mut self, direction: ContinueDirection) -> Result<(), Error> {
        let hooks = self.hooks.as_ref();
        let selection = &mut self.selection;
        for state in self.client.continue_stream(direction) {
            notify_stop(selection, hooks, &state?)?;
        }
        Ok(())
    }

    /// Continue target execution.
    pub fn continue_debugee(&mut self) -> Result<(), Error> {
        let result = self.drain_continue(ContinueDirection::Forward);
        self.observe_exit(result)
    }

    /// Run a recorded target backward.
    pub fn rewind(&mut self) -> Result<(), Error> {
        let result = self.drain_continue(ContinueDirection::Rewind);
        self.observe_exit(result)
    }

    /// Ask backend to abandon an in-progress step.
    pub fn cancel_next(&self) -> Result<(), Error> {
        self.client.cancel_next()
    }

    /// Stop the target.
    pub fn interrupt(&mut self) -> Result<(), Error> {
        let state = self.client.halt()?;
        self.selection.refresh(&state);
        Ok(())
    }

    /// Detach from target, killing it if `kill` is true.
    pub fn detach(&mut self, kill: bool) -> Result<(), Error> {
        self.client.detach(kill)
    }

    // ------------------------------------------ selection ---------------------------------------

    pub fn switch_goroutine(&mut self, goroutine_id: i64) -> Result<DebuggerState, Error> {
        let state = self.client.switch_goroutine(goroutine_id)?;
        self.report_stop(&state)?;
        Ok(state)
    }

    pub fn switch_thread(&mut self, thread_id: i64) -> Result<DebuggerState, Error> {
        let state = self.client.switch_thread(thread_id)?;
        self.report_stop(&state)?;
        Ok(state)
    }

    /// Select a frame of the current goroutine stack, return selected frame.
    pub fn switch_frame(&mut self, frame: i64) -> Result<Stackframe, Error> {
        if self.selection.goroutine_id < 0 {
            return Err(Error::NoSelectedGoroutine);
        }
        if frame < 0 {
            return Err(Error::InvalidArgument(format!("invalid frame {frame}")));
        }
        let stack = self
            .client
            .stacktrace(self.selection.goroutine_id, frame + 1, None)?;
        let selected = stack
            .into_iter()
            .nth(frame as usize)
            .ok_or_else(|| Error::InvalidArgument(format!("frame {frame} does not exist")))?;
        self.selection.frame = frame;
        Ok(selected)
    }

    /// Return stack of the selected goroutine.
    pub fn stacktrace(&self, depth: i64) -> Result<Vec<Stackframe>, Error> {
        if self.selection.goroutine_id < 0 {
            return Err(Error::NoSelectedGoroutine);
        }
        self.client
            .stacktrace(self.selection.goroutine_id, depth, None)
    }

    // ------------------------------------------ checkpoints -------------------------------------

    /// Create a checkpoint. Without a label, the current location is used as a label.
    pub fn checkpoint(&mut self, label: Option<&str>) -> Result<i64, Error> {
        let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => label.to_string(),
            None => {
                let state = self.state()?;
                current_location_label(&state).ok_or(Error::NoProcess)?
            }
        };
        self.client.checkpoint(&label)
    }

    pub fn checkpoints(&self) -> Result<Vec<Checkpoint>, Error> {
        self.client.list_checkpoints()
    }

    pub fn clear_checkpoint(&self, id: i64) -> Result<(), Error> {
        self.client.clear_checkpoint(id)
    }
}

/// Label of the current location: `fn() file:line (0xpc)`.
fn current_location_label(state: &DebuggerState) -> Option<String> {
    let (fn_name, file, line, pc) = match &state.selected_goroutine {
        Some(g) => {
            let loc = &g.current_loc;
            (loc.function_name(), loc.file.as_str(), loc.line, loc.pc)
        }
        None => {
            let thread = state.current_thread.as_ref()?;
            (thread.function_name(), thread.file.as_str(), thread.line, thread.pc)
        }
    };
    Some(format!(
        "{}() {}:{} ({:#x})",
        fn_name.unwrap_or("???"),
        file,
        line,
        pc
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::rpc::api::{Function, Goroutine, Location, Thread};

    #[test]
    fn test_selection_refresh() {
        let mut selection = Selection::default();
        assert_eq!(selection.scope().goroutine_id, -1);

        let state = DebuggerState {
            current_thread: Some(Thread {
                id: 3,
                goroutine_id: 7,
                ..Default::default()
            }),
            ..Default::default()
        };
        selection.frame = 2;
        selection.refresh(&state);
        assert_eq!(selection.thread_id, Some(3));
        assert_eq!(selection.goroutine_id, 7);
        assert_eq!(selection.frame, 0);

        let state = DebuggerState {
            exited: true,
            ..state
        };
        selection.refresh(&state);
        assert!(!selection.has_process());
    }

    #[test]
    fn test_location_label() {
        let state = DebuggerState {
            current_thread: Some(Thread {
                pc: 0x10,
                file: "main.go".to_string(),
                line: 3,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            current_location_label(&state).unwrap(),
            "???() main.go:3 (0x10)"
        );

        let state = DebuggerState {
            selected_goroutine: Some(Goroutine {
                id: 1,
                current_loc: Location {
                    pc: 0x4a,
                    file: "/src/a.go".to_string(),
                    line: 42,
                    function: Some(Function {
                        name: "main.work".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..state
        };
        assert_eq!(
            current_location_label(&state).unwrap(),
            "main.work() /src/a.go:42 (0x4a)"
        );

        assert!(current_location_label(&DebuggerState::default()).is_none());
    }
}
