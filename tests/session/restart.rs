use crate::common::{session, Event, Script};
use gostalker::config::SessionConfig;
use gostalker::debugger::process::restart_args;
use gostalker::debugger::{BreakpointIntent, ClearedBreakpoint, Error};
use serde_json::json;
use serial_test::serial;

#[test]
#[serial]
fn test_restart_restores_breakpoints() {
    let script = Script::with_process()
        .location("main.go:12", &[0x1010])
        .location("main.go:14", &[0x1020])
        .location("main.f", &[0x2000]);
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.set_breakpoint("main.go:12", false).unwrap();
    debugger.set_breakpoint("loop main.go:14", false).unwrap();
    debugger.set_breakpoint("main.f", true).unwrap();
    debugger.amend_condition("loop", "i > 10").unwrap();
    backend.clear_calls();

    let outcome = debugger.restart(None).unwrap();

    assert_eq!(outcome.pid, 101);
    assert!(outcome.errors.is_empty());
    assert!(outcome.scheduled.is_empty());
    assert_eq!(outcome.restored.len(), 3);
    assert_eq!(
        outcome
            .restored
            .iter()
            .map(|bp| (bp.addr, bp.name.as_str(), bp.cond.as_str(), bp.tracepoint))
            .collect::<Vec<_>>(),
        vec![
            (0x1010, "", "", false),
            (0x1020, "loop", "i > 10", false),
            (0x2000, "", "", true),
        ]
    );
    // old breakpoints are removed before restart
    let methods = backend.methods();
    let restart_pos = methods.iter().position(|m| m == "Restart").unwrap();
    assert_eq!(
        methods[..restart_pos]
            .iter()
            .filter(|m| *m == "ClearBreakpoint")
            .count(),
        3
    );
    assert_eq!(backend.requests("CreateBreakpoint").len(), 3);

    let intents = debugger.breakpoint_intents();
    assert_eq!(intents.len(), 3);
    assert!(intents
        .iter()
        .all(|intent| matches!(intent, BreakpointIntent::Live { .. })));
    assert!(hooks.events().contains(&Event::ProcessInstall(101)));
    assert_eq!(backend.script().breakpoints.len(), 3);
}

#[test]
#[serial]
fn test_restart_reports_discarded_breakpoints() {
    let mut script = Script::with_process();
    script.discarded = vec![json!({
        "Breakpoint": {"id": 3, "addr": 0x3000, "file": "/src/main.go", "line": 30},
        "Reason": "location not found",
    })];
    let (_backend, mut debugger, hooks) = session(script, SessionConfig::default());

    let outcome = debugger.restart(None).unwrap();

    assert_eq!(outcome.discarded.len(), 1);
    assert_eq!(
        hooks.notices(),
        vec!["Discarded breakpoint 3 at 0x3000 at /src/main.go:30: location not found"]
    );
}

#[test]
#[serial]
fn test_restart_failed_restoration_keeps_breakpoint_frozen() {
    let script = Script::with_process()
        .location("main.go:12", &[0x1010])
        .location("main.f", &[0x2000]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    debugger.set_breakpoint("main.go:12", false).unwrap();
    debugger.set_breakpoint("main.f", false).unwrap();
    backend.script().rejected.insert(0x2000);

    let outcome = debugger.restart(None).unwrap();

    assert_eq!(outcome.restored.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
    let intents = debugger.breakpoint_intents();
    assert!(matches!(intents[0], BreakpointIntent::Live { .. }));
    let BreakpointIntent::Frozen(frozen) = &intents[1] else {
        panic!("breakpoint must stay frozen");
    };
    assert_eq!(frozen.key, "/src/main.go:11");

    // id of the previous process doesn't address a frozen breakpoint
    assert!(matches!(
        debugger.clear_breakpoint("2"),
        Err(Error::Backend(_))
    ));
    assert_eq!(debugger.breakpoint_intents().len(), 2);

    backend.clear_calls();
    let cleared = debugger.clear_breakpoint(&frozen.key).unwrap();
    assert!(matches!(
        cleared,
        ClearedBreakpoint::Pending(BreakpointIntent::Frozen(_))
    ));
    assert!(backend.methods().is_empty());

    let outcome = debugger.restart(None).unwrap();
    assert_eq!(outcome.restored.len(), 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(debugger.breakpoint_intents().len(), 1);
}

#[test]
#[serial]
fn test_failed_restart_keeps_breakpoints() {
    let script = Script::with_process()
        .location("main.go:12", &[0x1010])
        .location("main.f", &[0x2000]);
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.set_breakpoint("main.go:12", false).unwrap();
    debugger.set_breakpoint("entry main.f", true).unwrap();
    backend.script().restart_error = Some("cannot restart".to_string());

    let result = debugger.restart(None);

    assert!(matches!(result, Err(Error::Backend(msg)) if msg == "cannot restart"));
    let script = backend.script();
    assert_eq!(script.pid, 100);
    assert_eq!(
        script
            .breakpoints
            .values()
            .map(|bp| (bp["addr"].as_u64().unwrap(), bp["name"].as_str().unwrap()))
            .collect::<Vec<_>>(),
        vec![(0x1010, ""), (0x2000, "entry")]
    );
    drop(script);
    assert!(debugger
        .breakpoint_intents()
        .iter()
        .all(|intent| matches!(intent, BreakpointIntent::Live { .. })));
    assert!(hooks.events().is_empty());
}

#[test]
#[serial]
fn test_restart_arguments() {
    let (backend, mut debugger, _) = session(Script::with_process(), SessionConfig::default());

    debugger.restart(restart_args("")).unwrap();
    debugger.restart(restart_args("-- -v 'a b'")).unwrap();
    debugger.restart(restart_args("--")).unwrap();

    let restarts = backend.requests("Restart");
    assert_eq!(restarts[0]["ResetArgs"], false);
    assert_eq!(restarts[1]["ResetArgs"], true);
    assert_eq!(restarts[1]["NewArgs"], json!(["-v", "a b"]));
    assert_eq!(restarts[2]["ResetArgs"], true);
    assert_eq!(restarts[2]["NewArgs"], json!([]));
}
