//! JSON-RPC client of a Delve-compatible backend.
//!
//! One physical connection is shared between the session and any number of [`Interrupter`]
//! handles. A background reader thread routes responses to waiting callers by request id,
//! so an interrupt request may be sent while a resuming command is still in flight.

pub mod api;
pub mod continuation;
pub mod transport;

use crate::debugger::rpc::api::{
    AsmInstruction, AttachedToExistingProcessOut, Breakpoint, BreakpointIn, BreakpointOut,
    BreakpointRefIn, Checkpoint, CheckpointIn, CheckpointOut, ClearCheckpointIn, CommandOut,
    DebuggerCommand, DebuggerState, DetachIn, DisassembleIn, DisassembleOut, DiscardedBreakpoint,
    Empty, EvalIn, EvalOut, EvalScope, FindLocationIn, FindLocationOut, ListBreakpointsIn,
    ListBreakpointsOut, ListCheckpointsOut, LoadConfig, Location, ProcessPidOut, RecordedOut,
    RestartIn, RestartOut, SetApiVersionIn, SetIn, Stackframe, StacktraceIn, StacktraceOut,
    StateIn, StateOut, Variable,
};
use crate::debugger::rpc::continuation::{ContinueDirection, Continuation};
use crate::debugger::rpc::transport::{MessageReader, MessageWriter};
use crate::debugger::Error;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::thread::JoinHandle;

const API_VERSION: i64 = 2;

/// Names of the backend `Command` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr)]
pub enum CommandName {
    #[strum(serialize = "continue")]
    Continue,
    #[strum(serialize = "rewind")]
    Rewind,
    #[strum(serialize = "directionCongruentContinue")]
    DirectionCongruentContinue,
    #[strum(serialize = "next")]
    Next,
    #[strum(serialize = "step")]
    Step,
    #[strum(serialize = "stepInstruction")]
    StepInstruction,
    #[strum(serialize = "stepOut")]
    StepOut,
    #[strum(serialize = "reverseNext")]
    ReverseNext,
    #[strum(serialize = "reverseStep")]
    ReverseStep,
    #[strum(serialize = "reverseStepOut")]
    ReverseStepOut,
    #[strum(serialize = "reverseStepInstruction")]
    ReverseStepInstruction,
    #[strum(serialize = "switchThread")]
    SwitchThread,
    #[strum(serialize = "switchGoroutine")]
    SwitchGoroutine,
    #[strum(serialize = "halt")]
    Halt,
}

impl CommandName {
    /// Return true if the command may let the target execute.
    pub fn is_resuming(self) -> bool {
        !matches!(
            self,
            CommandName::SwitchThread | CommandName::SwitchGoroutine | CommandName::Halt
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Reply = Result<Value, Error>;

#[derive(Default)]
struct Routes {
    closed: bool,
    waiters: HashMap<u64, SyncSender<Reply>>,
}

/// Physical connection state shared between a client and its interrupters.
struct Connection {
    writer: Mutex<Box<dyn MessageWriter>>,
    routes: Mutex<Routes>,
    next_id: AtomicU64,
    running: Mutex<bool>,
}

impl Connection {
    fn call<A: Serialize, R: DeserializeOwned>(&self, method: &str, args: A) -> Result<R, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::sync_channel(1);
        {
            let mut routes = lock(&self.routes);
            if routes.closed {
                return Err(Error::ConnectionClosed);
            }
            routes.waiters.insert(id, tx);
        }

        let request = json!({
            "method": format!("RPCServer.{method}"),
            "params": [args],
            "id": id,
        });
        debug!(target: "rpc", "-> {request}");

        if let Err(e) = lock(&self.writer).write_message(&request) {
            lock(&self.routes).waiters.remove(&id);
            return Err(e);
        }

        let result = rx.recv().map_err(|_| Error::ConnectionClosed)??;
        let result = match result {
            Value::Null => Value::Object(Default::default()),
            result => result,
        };
        Ok(serde_json::from_value(result)?)
    }

    /// Route a response to the caller waiting for it.
    fn dispatch(&self, response: Value) {
        trace!(target: "rpc", "<- {response}");

        let Some(id) = response.get("id").and_then(Value::as_u64) else {
            debug!(target: "rpc", "response without id dropped: {response}");
            return;
        };
        let Some(waiter) = lock(&self.routes).waiters.remove(&id) else {
            debug!(target: "rpc", "unexpected response with id {id}");
            return;
        };

        let reply = match response.get("error") {
            Some(Value::String(text)) => Err(Error::Backend(text.clone())),
            Some(Value::Null) | None => Ok(response.get("result").cloned().unwrap_or(Value::Null)),
            Some(other) => Err(Error::Backend(other.to_string())),
        };
        _ = waiter.send(reply);
    }

    /// Mark connection as closed and wake up all waiting callers.
    fn shutdown(&self, reason: Option<Error>) {
        let waiters = {
            let mut routes = lock(&self.routes);
            routes.closed = true;
            std::mem::take(&mut routes.waiters)
        };
        if let Some(reason) = reason {
            debug!(target: "rpc", "connection lost: {reason}");
        }
        for (_, waiter) in waiters {
            _ = waiter.send(Err(Error::ConnectionClosed));
        }
    }

    fn is_running(&self) -> bool {
        *lock(&self.running)
    }
}

/// Set `running` flag for its lifetime.
struct RunningGuard<'a> {
    flag: &'a Mutex<bool>,
}

impl<'a> RunningGuard<'a> {
    fn new(flag: &'a Mutex<bool>) -> Self {
        *lock(flag) = true;
        Self { flag }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *lock(self.flag) = false;
    }
}

/// A handle for observers running concurrently with the session (console, interrupt handler).
#[derive(Clone)]
pub struct Interrupter {
    conn: Arc<Connection>,
}

impl Interrupter {
    /// Return true if target may be executing now.
    pub fn is_running(&self) -> bool {
        self.conn.is_running()
    }

    /// Ask backend to stop the target. Advisory, the in-flight operation reports the stop.
    pub fn halt(&self) -> Result<(), Error> {
        let cmd = DebuggerCommand {
            name: CommandName::Halt.to_string(),
            ..Default::default()
        };
        self.conn.call::<_, CommandOut>("Command", cmd).map(|_| ())
    }

    /// Ask backend to abandon an in-progress `next`/`step`.
    pub fn cancel_next(&self) -> Result<(), Error> {
        self.conn.call::<_, Empty>("CancelNext", Empty {}).map(|_| ())
    }
}

/// Client of a single backend connection.
pub struct RpcClient {
    conn: Arc<Connection>,
    reader: Option<JoinHandle<()>>,
    recorded: Cell<Option<bool>>,
    return_values_cfg: Option<LoadConfig>,
}

impl RpcClient {
    /// Connect to backend at `addr` and negotiate protocol version.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let (reader, writer) = transport::tcp(addr)?;
        Self::with_transport(reader, writer)
    }

    /// Create a client over an already established transport and negotiate protocol version.
    pub fn with_transport(
        reader: impl MessageReader + 'static,
        writer: impl MessageWriter + 'static,
    ) -> Result<Self, Error> {
        let conn = Arc::new(Connection {
            writer: Mutex::new(Box::new(writer)),
            routes: Mutex::new(Routes::default()),
            next_id: AtomicU64::new(0),
            running: Mutex::new(false),
        });

        let reader = {
            let conn = Arc::clone(&conn);
            let mut reader = reader;
            thread::Builder::new()
                .name("rpc-reader".to_string())
                .spawn(move || loop {
                    match reader.read_message() {
                        Ok(Some(response)) => conn.dispatch(response),
                        Ok(None) => {
                            conn.shutdown(None);
                            return;
                        }
                        Err(e) => {
                            conn.shutdown(Some(e));
                            return;
                        }
                    }
                })?
        };

        let client = Self {
            conn,
            reader: Some(reader),
            recorded: Cell::new(None),
            return_values_cfg: None,
        };

        client
            .call::<_, Empty>(
                "SetApiVersion",
                SetApiVersionIn {
                    api_version: API_VERSION,
                },
            )
            .map_err(|e| Error::Handshake(e.to_string()))?;
        debug!(target: "rpc", "api version {API_VERSION} negotiated");

        Ok(client)
    }

    /// Send a request and wait for its reply. `Command` with a resuming action and `Restart`
    /// keep `running` flag set until the reply arrives.
    pub fn call<A: Serialize, R: DeserializeOwned>(&self, method: &str, args: A) -> Result<R, Error> {
        self.conn.call(method, args)
    }

    /// Return true if target may be executing now.
    pub fn running(&self) -> bool {
        self.conn.is_running()
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            conn: Arc::clone(&self.conn),
        }
    }

    /// Set load configuration for function return values reported by step commands.
    pub fn set_return_values_load_config(&mut self, cfg: Option<LoadConfig>) {
        self.return_values_cfg = cfg;
    }

    // ------------------------------------------ execution control -------------------------------

    /// Issue a `Command` request, returning the state as reported by backend.
    pub fn command(&self, name: CommandName) -> Result<DebuggerState, Error> {
        let cmd = DebuggerCommand {
            name: name.to_string(),
            return_info_load_config: self.return_values_cfg,
            ..Default::default()
        };
        self.execute(name, cmd)
    }

    fn execute(&self, name: CommandName, cmd: DebuggerCommand) -> Result<DebuggerState, Error> {
        let _guard = name
            .is_resuming()
            .then(|| RunningGuard::new(&self.conn.running));
        let out: CommandOut = self.call("Command", cmd)?;
        Ok(out.state)
    }

    /// Issue a single step command, an exited state becomes [`Error::ProcessExited`].
    pub fn step_command(&self, name: CommandName) -> Result<DebuggerState, Error> {
        let state = self.command(name)?;
        self.exited_to_error(state)
    }

    pub(super) fn exited_to_error(&self, state: DebuggerState) -> Result<DebuggerState, Error> {
        if state.exited {
            return Err(Error::ProcessExited {
                pid: self.process_pid().unwrap_or(state.pid),
                status: state.exit_status,
            });
        }
        Ok(state)
    }

    /// Return a lazy stream of states produced by resuming the target in a given direction.
    pub fn continue_stream(&self, direction: ContinueDirection) -> Continuation<'_> {
        Continuation::new(self, direction)
    }

    pub fn switch_thread(&self, thread_id: i64) -> Result<DebuggerState, Error> {
        let cmd = DebuggerCommand {
            name: CommandName::SwitchThread.to_string(),
            thread_id,
            ..Default::default()
        };
        self.execute(CommandName::SwitchThread, cmd)
    }

    pub fn switch_goroutine(&self, goroutine_id: i64) -> Result<DebuggerState, Error> {
        let cmd = DebuggerCommand {
            name: CommandName::SwitchGoroutine.to_string(),
            goroutine_id,
            ..Default::default()
        };
        self.execute(CommandName::SwitchGoroutine, cmd)
    }

    pub fn halt(&self) -> Result<DebuggerState, Error> {
        self.command(CommandName::Halt)
    }

    pub fn cancel_next(&self) -> Result<(), Error> {
        self.interrupter().cancel_next()
    }

    /// Restart target process (or a recording, from position `pos`).
    pub fn restart_from(
        &self,
        pos: &str,
        reset_args: bool,
        new_args: Vec<String>,
        rerecord: bool,
    ) -> Result<Vec<DiscardedBreakpoint>, Error> {
        let _guard = RunningGuard::new(&self.conn.running);
        let out: RestartOut = self.call(
            "Restart",
            RestartIn {
                position: pos.to_string(),
                reset_args,
                new_args,
                rerecord,
            },
        )?;
        Ok(out.discarded_breakpoints)
    }

    pub fn state(&self) -> Result<DebuggerState, Error> {
        let out: StateOut = self.call("State", StateIn::default())?;
        Ok(out.state)
    }

    pub fn process_pid(&self) -> Result<i64, Error> {
        let out: ProcessPidOut = self.call("ProcessPid", Empty {})?;
        Ok(out.pid)
    }

    /// Return true if target is a recording. Answer is cached for the client lifetime.
    pub fn recorded(&self) -> Result<bool, Error> {
        if let Some(recorded) = self.recorded.get() {
            return Ok(recorded);
        }
        let out: RecordedOut = self.call("Recorded", Empty {})?;
        self.recorded.set(Some(out.recorded));
        Ok(out.recorded)
    }

    pub fn attached_to_existing_process(&self) -> Result<bool, Error> {
        let out: AttachedToExistingProcessOut = self.call("AttachedToExistingProcess", Empty {})?;
        Ok(out.answer)
    }

    /// Detach from target, killing it if `kill` is true, and close the connection.
    pub fn detach(&mut self, kill: bool) -> Result<(), Error> {
        let result = self.call::<_, Empty>("Detach", DetachIn { kill }).map(|_| ());
        self.close();
        result
    }

    fn close(&mut self) {
        lock(&self.conn.writer).close();
        if let Some(reader) = self.reader.take() {
            _ = reader.join();
        }
    }

    // ------------------------------------------ breakpoints -------------------------------------

    pub fn create_breakpoint(&self, bp: Breakpoint) -> Result<Breakpoint, Error> {
        let out: BreakpointOut = self.call("CreateBreakpoint", BreakpointIn { breakpoint: bp })?;
        out.breakpoint
            .ok_or_else(|| Error::Backend("no breakpoint in reply".to_string()))
    }

    pub fn get_breakpoint(&self, id: i64) -> Result<Breakpoint, Error> {
        self.breakpoint_ref("GetBreakpoint", id, "")
    }

    pub fn get_breakpoint_by_name(&self, name: &str) -> Result<Breakpoint, Error> {
        self.breakpoint_ref("GetBreakpoint", 0, name)
    }

    pub fn clear_breakpoint(&self, id: i64) -> Result<Breakpoint, Error> {
        self.breakpoint_ref("ClearBreakpoint", id, "")
    }

    pub fn clear_breakpoint_by_name(&self, name: &str) -> Result<Breakpoint, Error> {
        self.breakpoint_ref("ClearBreakpoint", 0, name)
    }

    fn breakpoint_ref(&self, method: &str, id: i64, name: &str) -> Result<Breakpoint, Error> {
        let out: BreakpointOut = self.call(
            method,
            BreakpointRefIn {
                id,
                name: name.to_string(),
            },
        )?;
        out.breakpoint
            .ok_or_else(|| Error::Backend("no breakpoint in reply".to_string()))
    }

    pub fn amend_breakpoint(&self, bp: Breakpoint) -> Result<(), Error> {
        self.call::<_, Empty>("AmendBreakpoint", BreakpointIn { breakpoint: bp })
            .map(|_| ())
    }

    pub fn list_breakpoints(&self) -> Result<Vec<Breakpoint>, Error> {
        let out: ListBreakpointsOut = self.call("ListBreakpoints", ListBreakpointsIn::default())?;
        Ok(out.breakpoints)
    }

    pub fn find_location(&self, scope: EvalScope, loc: &str) -> Result<Vec<Location>, Error> {
        let out: FindLocationOut = self.call(
            "FindLocation",
            FindLocationIn {
                scope,
                loc: loc.to_string(),
                include_non_executable_lines: false,
            },
        )?;
        Ok(out.locations)
    }

    // ------------------------------------------ data --------------------------------------------

    pub fn eval(&self, scope: EvalScope, expr: &str, cfg: LoadConfig) -> Result<Variable, Error> {
        let out: EvalOut = self.call(
            "Eval",
            EvalIn {
                scope,
                expr: expr.to_string(),
                cfg: Some(cfg),
            },
        )?;
        out.variable
            .ok_or_else(|| Error::Backend("no variable in reply".to_string()))
    }

    pub fn set_variable(&self, scope: EvalScope, symbol: &str, value: &str) -> Result<(), Error> {
        self.call::<_, Empty>(
            "Set",
            SetIn {
                scope,
                symbol: symbol.to_string(),
                value: value.to_string(),
            },
        )
        .map(|_| ())
    }

    pub fn stacktrace(
        &self,
        goroutine_id: i64,
        depth: i64,
        cfg: Option<LoadConfig>,
    ) -> Result<Vec<Stackframe>, Error> {
        let out: StacktraceOut = self.call(
            "Stacktrace",
            StacktraceIn {
                id: goroutine_id,
                depth,
                full: cfg.is_some(),
                cfg,
            },
        )?;
        Ok(out.locations)
    }

    /// Disassemble the whole function containing `pc`.
    pub fn disassemble_pc(&self, scope: EvalScope, pc: u64) -> Result<Vec<AsmInstruction>, Error> {
        let out: DisassembleOut = self.call(
            "Disassemble",
            DisassembleIn {
                scope,
                start_pc: pc,
                end_pc: 0,
                flavour: 0,
            },
        )?;
        Ok(out.disassemble)
    }

    // ------------------------------------------ checkpoints -------------------------------------

    pub fn checkpoint(&self, r#where: &str) -> Result<i64, Error> {
        let out: CheckpointOut = self.call(
            "Checkpoint",
            CheckpointIn {
                r#where: r#where.to_string(),
            },
        )?;
        Ok(out.id)
    }

    pub fn list_checkpoints(&self) -> Result<Vec<Checkpoint>, Error> {
        let out: ListCheckpointsOut = self.call("ListCheckpoints", Empty {})?;
        Ok(out.checkpoints)
    }

    pub fn clear_checkpoint(&self, id: i64) -> Result<(), Error> {
        self.call::<_, Empty>("ClearCheckpoint", ClearCheckpointIn { id })
            .map(|_| ())
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.close();
    }
}
