use crate::common::{session, Script};
use gostalker::config::SessionConfig;
use gostalker::debugger::breakpoint::SetBreakpointOutcome;
use gostalker::debugger::{BreakpointIntent, ClearedBreakpoint, Error};
use serial_test::serial;

#[test]
#[serial]
fn test_breakpoint_create_clear_round_trip() {
    let script = Script::with_process().location("main.go:12", &[0x1010]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    let SetBreakpointOutcome::Created { created, errors } =
        debugger.set_breakpoint("main.go:12", false).unwrap()
    else {
        panic!("breakpoint must be created");
    };
    assert!(errors.is_empty());
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, 1);
    assert_eq!(created[0].addr, 0x1010);
    assert_eq!(debugger.breakpoints().unwrap().len(), 1);
    assert!(matches!(
        debugger.breakpoint_intents().as_slice(),
        [BreakpointIntent::Live { id: 1, .. }]
    ));

    let Ok(ClearedBreakpoint::Live(removed)) = debugger.clear_breakpoint("1") else {
        panic!("live breakpoint must be cleared");
    };
    assert_eq!(removed.id, 1);
    assert!(debugger.breakpoints().unwrap().is_empty());
    assert!(debugger.breakpoint_intents().is_empty());
    assert!(backend.script().breakpoints.is_empty());
}

#[test]
#[serial]
fn test_named_breakpoint() {
    let script = Script::with_process().location("main.go:12", &[0x1010]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    debugger.set_breakpoint("loop main.go:12", false).unwrap();
    let create = backend.requests("CreateBreakpoint");
    assert_eq!(create[0]["Breakpoint"]["name"], "loop");

    let cond = debugger.amend_condition("loop", "i == 3").unwrap();
    assert_eq!(cond.cond, "i == 3");
    assert_eq!(backend.requests("AmendBreakpoint")[0]["Breakpoint"]["Cond"], "i == 3");

    let Ok(ClearedBreakpoint::Live(removed)) = debugger.clear_breakpoint("loop") else {
        panic!("live breakpoint must be cleared");
    };
    assert_eq!(removed.name, "loop");
    assert!(debugger.breakpoint_intents().is_empty());
}

#[test]
#[serial]
fn test_breakpoint_name_may_be_part_of_location() {
    let script = Script::with_process().location("main main.go:12", &[0x1010]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    debugger.set_breakpoint("main main.go:12", false).unwrap();

    let locations = backend
        .requests("FindLocation")
        .into_iter()
        .map(|params| params["Loc"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(locations, vec!["main.go:12", "main main.go:12"]);
    assert_eq!(backend.requests("CreateBreakpoint")[0]["Breakpoint"]["name"], "");
}

#[test]
#[serial]
fn test_breakpoint_at_multiple_addresses() {
    let mut script = Script::with_process().location("main.f", &[0x2000, 0x3000, 0x4000]);
    script.rejected.insert(0x3000);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    let SetBreakpointOutcome::Created { created, errors } =
        debugger.set_breakpoint("main.f", true).unwrap()
    else {
        panic!("breakpoint must be created");
    };
    assert_eq!(
        created.iter().map(|bp| bp.addr).collect::<Vec<_>>(),
        vec![0x2000, 0x4000]
    );
    assert!(created.iter().all(|bp| bp.tracepoint));
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::Backend(_)));
    assert_eq!(backend.requests("CreateBreakpoint").len(), 3);
}

#[test]
#[serial]
fn test_breakpoint_errors() {
    let mut script = Script::with_process().location("main.f", &[0x2000]);
    script.rejected.insert(0x2000);
    let (_backend, mut debugger, _) = session(script, SessionConfig::default());

    assert!(matches!(
        debugger.set_breakpoint("  ", false),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        debugger.set_breakpoint("nowhere.go:1", false),
        Err(Error::Backend(_))
    ));
    assert!(matches!(
        debugger.set_breakpoint("main.f", false),
        Err(Error::Backend(_))
    ));
    assert!(matches!(
        debugger.clear_breakpoint("5"),
        Err(Error::Backend(_))
    ));
    assert!(debugger.breakpoint_intents().is_empty());
}

#[test]
#[serial]
fn test_breakpoints_scheduled_without_process() {
    let script = Script::without_process()
        .location("main.go:12", &[0x1010])
        .location("main.f", &[0x2000]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());
    assert!(!debugger.selection().has_process());

    assert!(matches!(
        debugger.set_breakpoint("main.go:12", false).unwrap(),
        SetBreakpointOutcome::Scheduled
    ));
    assert!(matches!(
        debugger.set_breakpoint("main.f", true).unwrap(),
        SetBreakpointOutcome::Scheduled
    ));
    assert!(backend.methods().is_empty());
    assert_eq!(debugger.breakpoint_intents().len(), 2);

    let outcome = debugger.restart(None).unwrap();
    assert_eq!(outcome.pid, 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(
        outcome
            .scheduled
            .iter()
            .map(|bp| (bp.addr, bp.tracepoint))
            .collect::<Vec<_>>(),
        vec![(0x1010, false), (0x2000, true)]
    );
    assert!(debugger
        .breakpoint_intents()
        .iter()
        .all(|intent| matches!(intent, BreakpointIntent::Live { .. })));
}

#[test]
#[serial]
fn test_clear_scheduled_breakpoint() {
    let script = Script::without_process().location("main.go:12", &[0x1010]);
    let (backend, mut debugger, _) = session(script, SessionConfig::default());

    debugger.set_breakpoint("loop main.go:12", false).unwrap();
    debugger.set_breakpoint("main.go:12", true).unwrap();

    let cleared = debugger.clear_breakpoint("loop").unwrap();
    assert!(matches!(
        cleared,
        ClearedBreakpoint::Pending(BreakpointIntent::Scheduled(ref request)) if request.spec == "loop main.go:12"
    ));
    assert!(backend.methods().is_empty());

    let outcome = debugger.restart(None).unwrap();
    assert_eq!(outcome.scheduled.len(), 1);
    assert!(outcome.scheduled[0].tracepoint);
}
