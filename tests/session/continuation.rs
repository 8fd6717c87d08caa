use crate::common::{breakpoint, session, stopped_at, Event, Script};
use gostalker::config::SessionConfig;
use gostalker::debugger::{ContinueDirection, Error};
use serial_test::serial;

fn command_names(backend: &crate::common::FakeBackend) -> Vec<String> {
    backend
        .requests("Command")
        .into_iter()
        .map(|params| params["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
#[serial]
fn test_continue_through_tracepoints() {
    let script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), false))
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), false))
        .stop(stopped_at(0x1002, 14, Some(breakpoint(2, false)), false));
    let (backend, debugger, _) = session(script, SessionConfig::default());

    let states = debugger
        .client()
        .continue_stream(ContinueDirection::Forward)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(states.len(), 3);
    assert!(states[0].is_tracepoint_only());
    assert!(!states[2].is_tracepoint_only());
    assert_eq!(states[2].stopped_at().map(|bp| bp.id).collect::<Vec<_>>(), vec![2]);
    assert_eq!(command_names(&backend), vec!["continue"; 3]);
}

#[test]
#[serial]
fn test_continue_stream_ends_with_exit() {
    let mut script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), false))
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), false))
        .stop(stopped_at(0x1003, 15, Some(breakpoint(3, true)), false));
    script.exit_status = 3;
    let (backend, debugger, _) = session(script, SessionConfig::default());

    let mut stream = debugger.client().continue_stream(ContinueDirection::Forward);
    for _ in 0..3 {
        let state = stream.next().unwrap().unwrap();
        assert!(state.is_tracepoint_only());
    }
    assert!(matches!(
        stream.next(),
        Some(Err(Error::ProcessExited { pid: 100, status: 3 }))
    ));
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
    assert_eq!(command_names(&backend), vec!["continue"; 4]);
}

#[test]
#[serial]
fn test_continue_until_exit() {
    let script = Script::with_process().stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), false));
    let (_backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.continue_debugee().unwrap();

    let events = hooks.events();
    assert_eq!(hooks.stops(), 1);
    assert_eq!(events.last(), Some(&Event::Exit { pid: 100, status: 0 }));
    assert_eq!(debugger.selection().thread_id, None);
}

#[test]
#[serial]
fn test_next_continues_after_tracepoints() {
    let script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), true))
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), true))
        .stop(stopped_at(0x1002, 14, Some(breakpoint(2, false)), true));
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.step_over().unwrap();

    assert_eq!(
        hooks.notices(),
        vec!["breakpoint hit during next, continuing..."; 2]
    );
    assert_eq!(hooks.stops(), 3);
    assert_eq!(command_names(&backend), vec!["next", "continue", "continue"]);
}

#[test]
#[serial]
fn test_next_completes_when_step_is_done() {
    let script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), true))
        .stop(stopped_at(0x1010, 15, None, false));
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.step_over().unwrap();

    assert_eq!(hooks.notices().len(), 1);
    assert_eq!(
        hooks.events().last(),
        Some(&Event::Stop {
            line: 15,
            breakpoint: None
        })
    );
    assert_eq!(command_names(&backend), vec!["next", "continue"]);
}

#[test]
#[serial]
fn test_next_interrupted_without_breakpoint() {
    let script = Script::with_process()
        .stop(stopped_at(0x1005, 12, None, true))
        .stop(stopped_at(0x1010, 15, None, false));
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.step_over().unwrap();

    assert!(hooks.notices().is_empty());
    assert_eq!(hooks.stops(), 1);
    assert_eq!(command_names(&backend), vec!["next"]);
    assert_eq!(backend.script().stops.len(), 1);
}

#[test]
#[serial]
fn test_next_failed_resume_is_not_reported() {
    let script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), true))
        .fail("continue failed");
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    let result = debugger.step_over();

    assert!(matches!(result, Err(Error::Backend(msg)) if msg == "continue failed"));
    assert!(hooks.notices().is_empty());
    assert_eq!(hooks.stops(), 1);
    assert_eq!(command_names(&backend), vec!["next", "continue"]);
}

#[test]
#[serial]
fn test_next_stops_at_genuine_breakpoint() {
    let script = Script::with_process()
        .stop(stopped_at(0x1002, 14, Some(breakpoint(2, false)), true));
    let (backend, mut debugger, hooks) = session(script, SessionConfig::default());

    debugger.step_over().unwrap();

    assert!(hooks.notices().is_empty());
    assert_eq!(command_names(&backend), vec!["next"]);
}

#[test]
#[serial]
fn test_stop_on_next_breakpoint() {
    let script = Script::with_process()
        .stop(stopped_at(0x1001, 13, Some(breakpoint(1, true)), true))
        .stop(stopped_at(0x1010, 15, None, false));
    let config = SessionConfig {
        stop_on_next_breakpoint: true,
        ..Default::default()
    };
    let (backend, mut debugger, hooks) = session(script, config);

    debugger.step_over().unwrap();

    assert!(hooks.notices().is_empty());
    assert_eq!(hooks.stops(), 1);
    assert_eq!(command_names(&backend), vec!["next"]);
    assert_eq!(backend.script().stops.len(), 1);
}

#[test]
#[serial]
fn test_step_out_reports_exit() {
    let (_backend, mut debugger, hooks) = session(Script::with_process(), SessionConfig::default());

    debugger.step_out().unwrap();

    assert_eq!(hooks.events(), vec![Event::Exit { pid: 100, status: 0 }]);
}
