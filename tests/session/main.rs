mod common;

mod breakpoints;
mod continuation;
mod restart;
mod steps;

use crate::common::{session, Script};
use gostalker::config::SessionConfig;
use serial_test::serial;

#[test]
#[serial]
fn test_handshake_and_initial_selection() {
    let (backend, debugger, _) = session(Script::with_process(), SessionConfig::default());

    let calls = backend.script().calls.clone();
    assert_eq!(calls[0].0, "SetApiVersion");
    assert_eq!(calls[0].1["APIVersion"], 2);
    assert_eq!(calls[1].0, "State");

    let selection = debugger.selection();
    assert!(selection.has_process());
    assert_eq!(selection.goroutine_id, 1);
    assert_eq!(selection.thread_id, Some(7));
    assert_eq!(selection.frame, 0);
}

#[test]
#[serial]
fn test_detach_kills_started_process() {
    let (backend, mut debugger, _) = session(Script::with_process(), SessionConfig::default());

    debugger.detach(true).unwrap();

    let detach = backend.requests("Detach");
    assert_eq!(detach.len(), 1);
    assert_eq!(detach[0]["Kill"], true);
}
