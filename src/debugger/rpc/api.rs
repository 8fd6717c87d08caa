//! Wire types of the backend protocol.
//!
//! Field names follow the JSON emitted by the backend, which mixes `camelCase` and Go-style
//! `PascalCase` names. Backend encodes empty slices and maps as `null`, see [`nullable`].

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Deserialize `null` as a type default value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub optimized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub pc: u64,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<Function>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub pcs: Vec<u64>,
}

impl Location {
    pub fn function_name(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.name.as_str())
    }
}

/// Settings for loading variable values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadConfig {
    pub follow_pointers: bool,
    pub max_variable_recurse: i64,
    pub max_string_len: i64,
    pub max_array_values: i64,
    pub max_struct_fields: i64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            follow_pointers: true,
            max_variable_recurse: 1,
            max_string_len: 64,
            max_array_values: 64,
            max_struct_fields: -1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub addr: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub addrs: Vec<u64>,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(
        default,
        rename = "functionName",
        skip_serializing_if = "String::is_empty"
    )]
    pub function_name: String,
    #[serde(default, rename = "Cond")]
    pub cond: String,
    /// Tracepoint flag, the backend name for it is `continue`.
    #[serde(default, rename = "continue")]
    pub tracepoint: bool,
    #[serde(default)]
    pub goroutine: bool,
    #[serde(default)]
    pub stacktrace: i64,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(default, rename = "LoadArgs")]
    pub load_args: Option<LoadConfig>,
    #[serde(default, rename = "LoadLocals")]
    pub load_locals: Option<LoadConfig>,
    #[serde(default, rename = "hitCount", deserialize_with = "nullable")]
    pub hit_count: HashMap<String, u64>,
    #[serde(default, rename = "totalHitCount")]
    pub total_hit_count: u64,
}

impl Breakpoint {
    /// Human-readable breakpoint name: `Breakpoint 1`, `Tracepoint foo`, etc.
    pub fn display_name(&self, upcase: bool) -> String {
        let kind = match (self.tracepoint, upcase) {
            (true, true) => "Tracepoint",
            (true, false) => "tracepoint",
            (false, true) => "Breakpoint",
            (false, false) => "breakpoint",
        };
        if self.name.is_empty() {
            format!("{kind} {}", self.id)
        } else {
            format!("{kind} {}", self.name)
        }
    }

    /// Human-readable breakpoint location, `addr in fn at file:line`.
    pub fn display_location(&self) -> String {
        let mut location = format!("{:#x}", self.addr);
        if !self.function_name.is_empty() {
            location.push_str(&format!(" in {}", self.function_name));
        }
        location.push_str(&format!(" at {}:{}", self.file, self.line));
        location
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub addr: u64,
    #[serde(default, rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "realType")]
    pub real_type: String,
    #[serde(default)]
    pub kind: u32,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub len: i64,
    #[serde(default)]
    pub cap: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub children: Vec<Variable>,
    #[serde(default)]
    pub unreadable: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stackframe {
    #[serde(flatten)]
    pub location: Location,
    #[serde(default, rename = "Locals", deserialize_with = "nullable")]
    pub locals: Vec<Variable>,
    #[serde(default, rename = "Arguments", deserialize_with = "nullable")]
    pub arguments: Vec<Variable>,
    #[serde(default, rename = "FrameOffset")]
    pub frame_offset: i64,
    #[serde(default, rename = "FramePointerOffset")]
    pub frame_pointer_offset: i64,
    #[serde(default, rename = "Err")]
    pub err: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goroutine {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "currentLoc")]
    pub current_loc: Location,
    #[serde(default, rename = "userCurrentLoc")]
    pub user_current_loc: Location,
    #[serde(default, rename = "threadID")]
    pub thread_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakpointInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub stacktrace: Vec<Stackframe>,
    #[serde(default)]
    pub goroutine: Option<Goroutine>,
    #[serde(default, deserialize_with = "nullable")]
    pub variables: Vec<Variable>,
    #[serde(default, deserialize_with = "nullable")]
    pub arguments: Vec<Variable>,
    #[serde(default, deserialize_with = "nullable")]
    pub locals: Vec<Variable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub pc: u64,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub function: Option<Function>,
    #[serde(default, rename = "goroutineID")]
    pub goroutine_id: i64,
    #[serde(default, rename = "breakPoint")]
    pub breakpoint: Option<Breakpoint>,
    #[serde(default, rename = "breakPointInfo")]
    pub breakpoint_info: Option<BreakpointInfo>,
    #[serde(default, rename = "ReturnValues", deserialize_with = "nullable")]
    pub return_values: Vec<Variable>,
}

impl Thread {
    pub fn function_name(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebuggerState {
    #[serde(default, rename = "Pid")]
    pub pid: i64,
    #[serde(default, rename = "Running")]
    pub running: bool,
    #[serde(default, rename = "Recording")]
    pub recording: bool,
    #[serde(default, rename = "currentThread")]
    pub current_thread: Option<Thread>,
    #[serde(default, rename = "currentGoroutine")]
    pub selected_goroutine: Option<Goroutine>,
    #[serde(default, rename = "Threads", deserialize_with = "nullable")]
    pub threads: Vec<Thread>,
    #[serde(default, rename = "NextInProgress")]
    pub next_in_progress: bool,
    #[serde(default)]
    pub exited: bool,
    #[serde(default, rename = "exitStatus")]
    pub exit_status: i64,
    #[serde(default, rename = "When")]
    pub when: String,
}

impl DebuggerState {
    /// Breakpoints that stops threads in this state.
    pub fn stopped_at(&self) -> impl Iterator<Item = &Breakpoint> {
        self.threads.iter().filter_map(|t| t.breakpoint.as_ref())
    }

    /// True if at least one thread stopped at a breakpoint and all of them are tracepoints.
    pub fn is_tracepoint_only(&self) -> bool {
        let mut stopped = self.stopped_at().peekable();
        stopped.peek().is_some() && stopped.all(|bp| bp.tracepoint)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalScope {
    #[serde(rename = "GoroutineID")]
    pub goroutine_id: i64,
    pub frame: i64,
    pub deferred_call: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AsmInstruction {
    pub loc: Location,
    #[serde(default)]
    pub dest_loc: Option<Location>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub breakpoint: bool,
    #[serde(default, rename = "AtPC")]
    pub at_pc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Checkpoint {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub r#where: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscardedBreakpoint {
    #[serde(default)]
    pub breakpoint: Option<Breakpoint>,
    #[serde(default)]
    pub reason: String,
}

// ------------------------------------- call arguments and replies -------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetApiVersionIn {
    #[serde(rename = "APIVersion")]
    pub api_version: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebuggerCommand {
    pub name: String,
    #[serde(default, rename = "threadID", skip_serializing_if = "is_zero")]
    pub thread_id: i64,
    #[serde(default, rename = "goroutineID", skip_serializing_if = "is_zero")]
    pub goroutine_id: i64,
    #[serde(
        default,
        rename = "ReturnInfoLoadConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub return_info_load_config: Option<LoadConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandOut {
    #[serde(default)]
    pub state: DebuggerState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartIn {
    pub position: String,
    pub reset_args: bool,
    pub new_args: Vec<String>,
    pub rerecord: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartOut {
    #[serde(default, deserialize_with = "nullable")]
    pub discarded_breakpoints: Vec<DiscardedBreakpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointIn {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointOut {
    #[serde(default)]
    pub breakpoint: Option<Breakpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointRefIn {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsIn {
    pub all: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsOut {
    #[serde(default, deserialize_with = "nullable")]
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindLocationIn {
    pub scope: EvalScope,
    pub loc: String,
    pub include_non_executable_lines: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FindLocationOut {
    #[serde(default, deserialize_with = "nullable")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalIn {
    pub scope: EvalScope,
    pub expr: String,
    pub cfg: Option<LoadConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalOut {
    #[serde(default)]
    pub variable: Option<Variable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetIn {
    pub scope: EvalScope,
    pub symbol: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceIn {
    pub id: i64,
    pub depth: i64,
    pub full: bool,
    pub cfg: Option<LoadConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceOut {
    #[serde(default, deserialize_with = "nullable")]
    pub locations: Vec<Stackframe>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckpointIn {
    pub r#where: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckpointOut {
    #[serde(rename = "ID")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListCheckpointsOut {
    #[serde(default, deserialize_with = "nullable")]
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClearCheckpointIn {
    #[serde(rename = "ID")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessPidOut {
    pub pid: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordedOut {
    pub recorded: bool,
    #[serde(default)]
    pub trace_directory: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateIn {
    pub non_blocking: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateOut {
    #[serde(default)]
    pub state: DebuggerState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisassembleIn {
    pub scope: EvalScope,
    #[serde(rename = "StartPC")]
    pub start_pc: u64,
    #[serde(rename = "EndPC")]
    pub end_pc: u64,
    pub flavour: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisassembleOut {
    #[serde(default, deserialize_with = "nullable")]
    pub disassemble: Vec<AsmInstruction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachIn {
    pub kill: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachedToExistingProcessOut {
    pub answer: bool,
}
