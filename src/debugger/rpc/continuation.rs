use crate::debugger::rpc::api::DebuggerState;
use crate::debugger::rpc::{CommandName, RpcClient};
use crate::debugger::Error;
use std::iter::FusedIterator;

/// Direction of target resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueDirection {
    Forward,
    Rewind,
    /// Continue in the direction of the last executed command (forward or backward).
    Congruent,
}

impl From<ContinueDirection> for CommandName {
    fn from(direction: ContinueDirection) -> Self {
        match direction {
            ContinueDirection::Forward => CommandName::Continue,
            ContinueDirection::Rewind => CommandName::Rewind,
            ContinueDirection::Congruent => CommandName::DirectionCongruentContinue,
        }
    }
}

/// Lazy stream of states produced by resuming the target.
///
/// While a target stops only at tracepoints, each `next` call resumes it again.
/// The stream ends after the first element that is an error, a process exit
/// (reported as [`Error::ProcessExited`]) or a state where target stopped for another reason.
pub struct Continuation<'a> {
    client: &'a RpcClient,
    direction: ContinueDirection,
    done: bool,
}

impl<'a> Continuation<'a> {
    pub(super) fn new(client: &'a RpcClient, direction: ContinueDirection) -> Self {
        Self {
            client,
            direction,
            done: false,
        }
    }
}

impl Iterator for Continuation<'_> {
    type Item = Result<DebuggerState, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let state = match self.client.command(self.direction.into()) {
            Ok(state) => state,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if state.exited {
            self.done = true;
            return Some(self.client.exited_to_error(state));
        }

        if !state.is_tracepoint_only() {
            self.done = true;
        }
        log::debug!(target: "rpc", "continuation element, last: {}", self.done);

        Some(Ok(state))
    }
}

impl FusedIterator for Continuation<'_> {}
