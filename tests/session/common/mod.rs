use gostalker::config::SessionConfig;
use gostalker::debugger::rpc::api::DebuggerState;
use gostalker::debugger::{Debugger, EventHook};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::thread::JoinHandle;

pub const MAIN_FILE: &str = "/src/main.go";
pub const GOROUTINE: i64 = 1;
pub const FRAME_OFFSET: i64 = -32;

/// Backend behavior and observed requests.
#[derive(Default)]
pub struct Script {
    pub pid: i64,
    pub attached: bool,
    /// Location expression to resolved addresses.
    pub locations: HashMap<String, Vec<u64>>,
    /// Source line of every known address.
    pub lines: BTreeMap<u64, i64>,
    /// Addresses where breakpoint creation fails.
    pub rejected: HashSet<u64>,
    pub breakpoints: BTreeMap<i64, Value>,
    pub next_bp_id: i64,
    /// State reported while target is stopped.
    pub current: Value,
    /// Replies to resuming commands, exit state is reported when the queue is empty.
    pub stops: VecDeque<Result<Value, String>>,
    /// State of a freshly restarted process.
    pub entry: Value,
    pub discarded: Vec<Value>,
    /// Error reported by `Restart`, the process is kept as is.
    pub restart_error: Option<String>,
    /// Exit status reported when the queue of stops is empty.
    pub exit_status: i64,
    pub disassembly: Vec<Value>,
    /// Every request as `(method, params)`, method without `RPCServer.` prefix.
    pub calls: Vec<(String, Value)>,
}

impl Script {
    pub fn with_process() -> Self {
        Self {
            pid: 100,
            next_bp_id: 1,
            current: stopped_at(0x1000, 12, None, false),
            entry: stopped_at(0x900, 3, None, false),
            ..Default::default()
        }
    }

    pub fn without_process() -> Self {
        Self {
            pid: 0,
            next_bp_id: 1,
            current: json!({"Pid": 0, "Running": false, "Threads": null}),
            entry: stopped_at(0x900, 3, None, false),
            ..Default::default()
        }
    }

    /// Add a location, every new address gets its own line starting from 10.
    pub fn location(mut self, spec: &str, pcs: &[u64]) -> Self {
        for pc in pcs {
            let line = 10 + self.lines.len() as i64;
            self.lines.entry(*pc).or_insert(line);
        }
        self.locations.insert(spec.to_string(), pcs.to_vec());
        self
    }

    fn line_of(&self, pc: u64) -> i64 {
        self.lines.get(&pc).copied().unwrap_or_default()
    }

    pub fn stop(mut self, state: Value) -> Self {
        self.stops.push_back(Ok(state));
        self
    }

    pub fn fail(mut self, error: &str) -> Self {
        self.stops.push_back(Err(error.to_string()));
        self
    }

    fn handle(&mut self, method: &str, params: &Value) -> Result<Value, String> {
        match method {
            "SetApiVersion" | "Set" | "ClearCheckpoint" | "CancelNext" | "Detach" => Ok(json!({})),
            "State" => Ok(json!({"State": self.current})),
            "ProcessPid" => Ok(json!({"Pid": self.pid})),
            "Recorded" => Ok(json!({"Recorded": false})),
            "AttachedToExistingProcess" => Ok(json!({"Answer": self.attached})),
            "FindLocation" => {
                let loc = params["Loc"].as_str().unwrap_or_default();
                let pcs = self
                    .locations
                    .get(loc)
                    .ok_or_else(|| format!("location \"{loc}\" not found"))?;
                let locations = pcs
                    .iter()
                    .map(|pc| json!({"pc": pc, "file": MAIN_FILE, "line": self.line_of(*pc)}))
                    .collect::<Vec<_>>();
                Ok(json!({"Locations": locations}))
            }
            "CreateBreakpoint" => {
                let mut bp = params["Breakpoint"].clone();
                let addr = match bp["addr"].as_u64().unwrap_or_default() {
                    0 => {
                        let line = bp["line"].as_i64().unwrap_or_default();
                        self.lines
                            .iter()
                            .find(|(_, l)| **l == line)
                            .map(|(pc, _)| *pc)
                            .ok_or_else(|| format!("could not find {MAIN_FILE}:{line}"))?
                    }
                    addr => addr,
                };
                if self.rejected.contains(&addr) {
                    return Err(format!("could not set breakpoint at {addr:#x}"));
                }
                if self.breakpoints.values().any(|b| b["addr"] == json!(addr)) {
                    return Err(format!("Breakpoint exists at {MAIN_FILE} at {addr:x}"));
                }
                let id = self.next_bp_id;
                self.next_bp_id += 1;
                bp["id"] = json!(id);
                bp["addr"] = json!(addr);
                bp["file"] = json!(MAIN_FILE);
                bp["line"] = json!(self.line_of(addr));
                self.breakpoints.insert(id, bp.clone());
                Ok(json!({"Breakpoint": bp}))
            }
            "GetBreakpoint" | "ClearBreakpoint" => {
                let id = self.find_breakpoint(params)?;
                let bp = if method == "ClearBreakpoint" {
                    self.breakpoints.remove(&id)
                } else {
                    self.breakpoints.get(&id).cloned()
                };
                Ok(json!({"Breakpoint": bp}))
            }
            "AmendBreakpoint" => {
                let bp = params["Breakpoint"].clone();
                let id = bp["id"].as_i64().unwrap_or_default();
                if !self.breakpoints.contains_key(&id) {
                    return Err(format!("no breakpoint with id {id}"));
                }
                self.breakpoints.insert(id, bp);
                Ok(json!({}))
            }
            "ListBreakpoints" => {
                let list = self.breakpoints.values().cloned().collect::<Vec<_>>();
                Ok(json!({"Breakpoints": list}))
            }
            "Restart" => {
                if let Some(error) = &self.restart_error {
                    return Err(error.clone());
                }
                self.pid += 1;
                self.breakpoints.clear();
                self.current = self.entry.clone();
                Ok(json!({"DiscardedBreakpoints": std::mem::take(&mut self.discarded)}))
            }
            "Command" => {
                let name = params["name"].as_str().unwrap_or_default();
                if matches!(name, "halt" | "switchThread" | "switchGoroutine") {
                    return Ok(json!({"State": self.current}));
                }
                let state = match self.stops.pop_front() {
                    Some(reply) => reply?,
                    None => json!({"Pid": self.pid, "exited": true, "exitStatus": self.exit_status}),
                };
                if state["exited"] != json!(true) {
                    self.current = state.clone();
                }
                Ok(json!({"State": state}))
            }
            "Stacktrace" => Ok(json!({"Locations": [{
                "pc": 0x1000,
                "file": MAIN_FILE,
                "line": 12,
                "function": {"name": "main.main"},
                "FrameOffset": FRAME_OFFSET,
            }]})),
            "Disassemble" => Ok(json!({"Disassemble": self.disassembly})),
            "Eval" => Ok(json!({"Variable": {
                "name": params["Expr"],
                "type": "int",
                "kind": 2,
                "value": "42",
            }})),
            other => Err(format!("unsupported method {other}")),
        }
    }

    fn find_breakpoint(&self, params: &Value) -> Result<i64, String> {
        let id = params["Id"].as_i64().unwrap_or_default();
        let name = params["Name"].as_str().unwrap_or_default();
        self.breakpoints
            .iter()
            .find(|(bp_id, bp)| {
                (id != 0 && **bp_id == id) || (!name.is_empty() && bp["name"] == json!(name))
            })
            .map(|(bp_id, _)| *bp_id)
            .ok_or_else(|| format!("no breakpoint with id {id} or name {name:?}"))
    }
}

/// In-process backend serving a single client connection.
pub struct FakeBackend {
    pub addr: SocketAddr,
    script: Arc<Mutex<Script>>,
    handle: Option<JoinHandle<()>>,
}

impl FakeBackend {
    pub fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let script = Arc::new(Mutex::new(script));

        let handle = {
            let script = Arc::clone(&script);
            thread::spawn(move || {
                let (stream, _) = listener.accept().unwrap();
                let mut writer = stream.try_clone().unwrap();
                let reader = BufReader::new(stream);

                for line in reader.lines() {
                    let Ok(line) = line else {
                        return;
                    };
                    let request: Value = serde_json::from_str(&line).unwrap();
                    let method = request["method"]
                        .as_str()
                        .unwrap()
                        .trim_start_matches("RPCServer.")
                        .to_string();
                    let params = request["params"][0].clone();

                    let reply = {
                        let mut script = script.lock().unwrap();
                        script.calls.push((method.clone(), params.clone()));
                        script.handle(&method, &params)
                    };
                    let response = match reply {
                        Ok(result) => json!({"id": request["id"], "result": result, "error": null}),
                        Err(error) => json!({"id": request["id"], "result": null, "error": error}),
                    };
                    let mut payload = serde_json::to_vec(&response).unwrap();
                    payload.push(b'\n');
                    if writer.write_all(&payload).is_err() || method == "Detach" {
                        return;
                    }
                }
            })
        };

        Self {
            addr,
            script,
            handle: Some(handle),
        }
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Requested methods in order, the handshake and state requests are skipped.
    pub fn methods(&self) -> Vec<String> {
        self.script()
            .calls
            .iter()
            .map(|(method, _)| method.clone())
            .filter(|method| method != "SetApiVersion" && method != "State")
            .collect()
    }

    /// Parameters of all requests of a method.
    pub fn requests(&self, method: &str) -> Vec<Value> {
        self.script()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.script().calls.clear();
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !thread::panicking() {
                handle.join().unwrap();
            }
        }
    }
}

/// Stopped state, `bp` is the breakpoint current thread is stopped at.
pub fn stopped_at(pc: u64, line: i64, bp: Option<Value>, next_in_progress: bool) -> Value {
    let thread = json!({
        "id": 7,
        "pc": pc,
        "file": MAIN_FILE,
        "line": line,
        "function": {"name": "main.main"},
        "goroutineID": GOROUTINE,
        "breakPoint": bp,
    });
    json!({
        "Pid": 100,
        "Running": false,
        "currentThread": thread,
        "currentGoroutine": {
            "id": GOROUTINE,
            "currentLoc": {"pc": pc, "file": MAIN_FILE, "line": line, "function": {"name": "main.main"}},
            "userCurrentLoc": {"pc": pc, "file": MAIN_FILE, "line": line},
        },
        "Threads": [thread],
        "NextInProgress": next_in_progress,
    })
}

pub fn breakpoint(id: i64, tracepoint: bool) -> Value {
    json!({"id": id, "addr": 0x1000 + id as u64, "continue": tracepoint, "totalHitCount": 1})
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Stop { line: i64, breakpoint: Option<i64> },
    Notice(String),
    Exit { pid: i64, status: i64 },
    ProcessInstall(i64),
}

/// Hook that records session events.
#[derive(Clone, Default)]
pub struct TestHooks {
    events: Arc<Mutex<Vec<Event>>>,
}

impl TestHooks {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Stop { .. }))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl EventHook for TestHooks {
    fn on_stop(&self, state: &DebuggerState) -> anyhow::Result<()> {
        let thread = state.current_thread.as_ref();
        self.push(Event::Stop {
            line: thread.map(|t| t.line).unwrap_or_default(),
            breakpoint: thread.and_then(|t| t.breakpoint.as_ref()).map(|bp| bp.id),
        });
        Ok(())
    }

    fn on_notice(&self, message: &str) {
        self.push(Event::Notice(message.to_string()));
    }

    fn on_exit(&self, pid: i64, status: i64) {
        self.push(Event::Exit { pid, status });
    }

    fn on_process_install(&self, pid: i64) {
        self.push(Event::ProcessInstall(pid));
    }
}

/// Start a fake backend and connect a session to it.
pub fn session(script: Script, config: SessionConfig) -> (FakeBackend, Debugger, TestHooks) {
    let backend = FakeBackend::start(script);
    let hooks = TestHooks::default();
    let debugger = Debugger::connect(backend.addr, config, hooks.clone()).unwrap();
    (backend, debugger, hooks)
}
