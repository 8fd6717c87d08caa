use crate::common::{session, stopped_at, Script, FRAME_OFFSET, GOROUTINE, MAIN_FILE};
use gostalker::config::SessionConfig;
use gostalker::debugger::Error;
use serde_json::json;
use serial_test::serial;

fn with_call_at_line() -> Script {
    let mut script = Script::with_process();
    script.disassembly = vec![
        json!({
            "Loc": {"pc": 0x1000, "file": MAIN_FILE, "line": 12},
            "Text": "MOVQ $0x1, AX",
        }),
        json!({
            "Loc": {"pc": 0x1008, "file": MAIN_FILE, "line": 12},
            "DestLoc": {"pc": 0x2000, "file": MAIN_FILE, "line": 20, "function": {"name": "main.f"}},
            "Text": "CALL main.f(SB)",
        }),
        json!({
            "Loc": {"pc": 0x1010, "file": MAIN_FILE, "line": 13},
            "DestLoc": {"pc": 0x3000, "file": MAIN_FILE, "line": 30, "function": {"name": "main.g"}},
            "Text": "CALL main.g(SB)",
        }),
    ];
    script
}

#[test]
#[serial]
fn test_step_into_calls() {
    let (_backend, mut debugger, _) = session(with_call_at_line(), SessionConfig::default());

    let calls = debugger.step_into_calls().unwrap();

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "main.f");
    assert_eq!(calls[0].pc(), 0x1008);
}

#[test]
#[serial]
fn test_step_into_call_removes_temporary_breakpoint() {
    let temporary = json!({"id": 1, "addr": 0x1008});
    let script = with_call_at_line()
        .stop(stopped_at(0x1008, 12, Some(temporary), true))
        .stop(stopped_at(0x2000, 20, None, false));
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.step_into_named("main.f").unwrap();

    let create = backend.requests("CreateBreakpoint");
    assert_eq!(create.len(), 1);
    assert_eq!(create[0]["Breakpoint"]["addr"], 0x1008);
    assert_eq!(
        create[0]["Breakpoint"]["Cond"],
        format!("(runtime.curg.goid == {GOROUTINE}) && (runtime.frameoff == {FRAME_OFFSET})")
    );
    assert_eq!(backend.requests("ClearBreakpoint")[0]["Id"], 1);
    assert!(backend.script().breakpoints.is_empty());

    let commands = backend
        .requests("Command")
        .into_iter()
        .map(|params| params["name"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(commands, vec!["next", "step"]);
    assert!(hooks.notices().is_empty());
    assert_eq!(hooks.stops(), 2);
}

#[test]
#[serial]
fn test_step_into_call_clears_breakpoint_on_failure() {
    let script = with_call_at_line().fail("next failed");
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    let result = debugger.step_into_named("main.f");

    assert!(matches!(result, Err(Error::Backend(msg)) if msg == "next failed"));
    assert_eq!(backend.requests("ClearBreakpoint").len(), 1);
    assert!(backend.script().breakpoints.is_empty());
}

#[test]
#[serial]
fn test_step_into_unknown_call() {
    let (backend, mut debugger, _) = session(with_call_at_line(), SessionConfig::default());

    let result = debugger.step_into_named("main.g");

    assert!(matches!(result, Err(Error::CallNotFound(name)) if name == "main.g"));
    assert!(backend.requests("CreateBreakpoint").is_empty());
    assert!(backend.requests("Command").is_empty());
}

#[test]
#[serial]
fn test_step_into_last_without_calls() {
    let script = Script::with_process().stop(stopped_at(0x1010, 13, None, false));
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    debugger.step_into_last().unwrap();

    assert_eq!(backend.requests("Command")[0]["name"], "step");
    assert!(backend.requests("CreateBreakpoint").is_empty());
}

#[test]
#[serial]
fn test_set_variable_and_eval() {
    let (backend, debugger, _) = session(Script::with_process(), SessionConfig::default());

    debugger.set_variable("x = 5").unwrap();
    let set = backend.requests("Set");
    assert_eq!(set[0]["Symbol"], "x");
    assert_eq!(set[0]["Value"], "5");
    assert_eq!(set[0]["Scope"]["GoroutineID"], GOROUTINE);

    let var = debugger.eval("x + 1").unwrap();
    assert_eq!(var.name, "x + 1");
    assert_eq!(var.value, "42");

    assert!(matches!(debugger.eval("  "), Err(Error::InvalidArgument(_))));
    assert!(matches!(
        debugger.set_variable("x == 5"),
        Err(Error::InvalidArgument(_))
    ));
}
