//! Breakpoint lifecycle.
//!
//! Backend breakpoints live as long as the target process. To survive process replacement
//! (restart, rebuild) every breakpoint created by the session is mirrored into a
//! [`BreakpointIntent`]:
//!
//! - [`BreakpointIntent::Scheduled`] - request made while there was no process, replayed
//!   once right after a new process is established
//! - [`BreakpointIntent::Live`] - breakpoint that exists in the backend
//! - [`BreakpointIntent::Frozen`] - process independent description of a breakpoint that
//!   must be created again in the next process

use crate::debugger::rpc::api::Breakpoint;
use crate::debugger::{Debugger, Error};
use crate::{muted_error, weak_error};
use log::debug;
use once_cell::sync;
use regex::Regex;

/// Breakpoint request made while there is no target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRequest {
    /// Raw `[name] <location>` argument.
    pub spec: String,
    pub tracepoint: bool,
}

impl BreakpointRequest {
    /// Breakpoint name, if the request starts with one.
    pub fn name(&self) -> Option<&str> {
        self.spec
            .split_once(' ')
            .map(|(name, _)| name)
            .filter(|name| is_valid_breakpoint_name(name))
    }
}

/// Process independent breakpoint description.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenBreakpoint {
    /// Breakpoint name if present, `file:line` or address otherwise. Never a backend id,
    /// ids of a previous process may be reused by the next one.
    pub key: String,
    /// Breakpoint used as a template for re-creation.
    pub template: Breakpoint,
}

impl FrozenBreakpoint {
    pub fn freeze(bp: &Breakpoint) -> Self {
        let key = if !bp.name.is_empty() {
            bp.name.clone()
        } else if !bp.file.is_empty() {
            format!("{}:{}", bp.file, bp.line)
        } else {
            format!("{:#x}", bp.addr)
        };

        // re-resolve by file:line when it is known, addresses are not stable between builds
        let addr = if bp.file.is_empty() { bp.addr } else { 0 };

        Self {
            key,
            template: Breakpoint {
                name: bp.name.clone(),
                addr,
                file: bp.file.clone(),
                line: bp.line,
                function_name: bp.function_name.clone(),
                cond: bp.cond.clone(),
                tracepoint: bp.tracepoint,
                goroutine: bp.goroutine,
                stacktrace: bp.stacktrace,
                variables: bp.variables.clone(),
                load_args: bp.load_args,
                load_locals: bp.load_locals,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BreakpointIntent {
    Scheduled(BreakpointRequest),
    Live { id: i64, frozen: FrozenBreakpoint },
    Frozen(FrozenBreakpoint),
}

impl BreakpointIntent {
    /// Frozen and scheduled intents are addressed by their keys only, live ones by id or name.
    fn matches(&self, id_or_name: &IdOrName) -> bool {
        match (self, id_or_name) {
            (BreakpointIntent::Live { id, .. }, IdOrName::Id(target)) => id == target,
            (BreakpointIntent::Live { frozen, .. }, IdOrName::Name(name)) => {
                &frozen.template.name == name
            }
            (BreakpointIntent::Frozen(frozen), IdOrName::Name(name)) => &frozen.key == name,
            (BreakpointIntent::Scheduled(request), IdOrName::Name(name)) => {
                request.name() == Some(name.as_str()) || &request.spec == name
            }
            (BreakpointIntent::Frozen(_) | BreakpointIntent::Scheduled(_), IdOrName::Id(_)) => {
                false
            }
        }
    }

    fn is_pending(&self) -> bool {
        !matches!(self, BreakpointIntent::Live { .. })
    }
}

/// Breakpoint removed by the `clear` command.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearedBreakpoint {
    /// Breakpoint removed from the backend.
    Live(Breakpoint),
    /// Frozen or scheduled breakpoint, removed without backend call.
    Pending(BreakpointIntent),
}

/// Breakpoint argument of `clear` and `condition` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrName {
    Id(i64),
    Name(String),
}

impl From<&str> for IdOrName {
    fn from(arg: &str) -> Self {
        let arg = arg.trim();
        match arg.parse::<i64>() {
            Ok(id) => IdOrName::Id(id),
            Err(_) => IdOrName::Name(arg.to_string()),
        }
    }
}

/// Ordered set of breakpoint intents of a session.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    intents: Vec<BreakpointIntent>,
}

impl BreakpointRegistry {
    pub fn snapshot(&self) -> Vec<BreakpointIntent> {
        self.intents.clone()
    }

    pub fn schedule(&mut self, request: BreakpointRequest) {
        self.intents.push(BreakpointIntent::Scheduled(request));
    }

    pub fn add_live(&mut self, bp: &Breakpoint) {
        self.intents.push(BreakpointIntent::Live {
            id: bp.id,
            frozen: FrozenBreakpoint::freeze(bp),
        });
    }

    /// Remove a live breakpoint by its backend id.
    pub fn remove_live(&mut self, bp_id: i64) {
        self.intents
            .retain(|intent| !matches!(intent, BreakpointIntent::Live { id, .. } if *id == bp_id));
    }

    /// Remove and return a frozen or scheduled intent addressed by `target`.
    /// Return `None` if a live breakpoint matches `target`.
    pub fn take_pending(&mut self, target: &IdOrName) -> Option<BreakpointIntent> {
        if self
            .intents
            .iter()
            .any(|intent| !intent.is_pending() && intent.matches(target))
        {
            return None;
        }
        let pos = self
            .intents
            .iter()
            .position(|intent| intent.is_pending() && intent.matches(target))?;
        Some(self.intents.remove(pos))
    }

    /// Update the frozen description of a live breakpoint.
    pub fn refresh(&mut self, bp: &Breakpoint) {
        for intent in self.intents.iter_mut() {
            if let BreakpointIntent::Live { id, frozen } = intent {
                if *id == bp.id {
                    *frozen = FrozenBreakpoint::freeze(bp);
                }
            }
        }
    }

    pub fn live_ids(&self) -> Vec<i64> {
        self.intents
            .iter()
            .filter_map(|intent| match intent {
                BreakpointIntent::Live { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Turn every live breakpoint into a frozen one.
    pub fn freeze_all(&mut self) {
        for intent in self.intents.iter_mut() {
            if let BreakpointIntent::Live { frozen, .. } = intent {
                *intent = BreakpointIntent::Frozen(frozen.clone());
            }
        }
    }

    /// Remove and return all scheduled requests in recording order.
    pub fn take_scheduled(&mut self) -> Vec<BreakpointRequest> {
        let mut scheduled = vec![];
        self.intents.retain(|intent| match intent {
            BreakpointIntent::Scheduled(request) => {
                scheduled.push(request.clone());
                false
            }
            _ => true,
        });
        scheduled
    }

    fn frozen_mut(&mut self) -> impl Iterator<Item = &mut BreakpointIntent> {
        self.intents
            .iter_mut()
            .filter(|intent| matches!(intent, BreakpointIntent::Frozen(_)))
    }
}

/// Result of breakpoint setting.
#[derive(Debug)]
pub enum SetBreakpointOutcome {
    /// There is no process, breakpoint will be set after restart.
    Scheduled,
    /// Breakpoint set at every successfully resolved address.
    Created {
        created: Vec<Breakpoint>,
        errors: Vec<Error>,
    },
}

/// Return true if `word` may be used as a breakpoint name.
pub fn is_valid_breakpoint_name(word: &str) -> bool {
    static NAME_RE: sync::Lazy<Regex> =
        sync::Lazy::new(|| Regex::new(r"^[\p{L}\p{Nd}]+$").expect("must compile"));
    NAME_RE.is_match(word) && word.parse::<i64>().is_err()
}

impl Debugger {
    /// Set a breakpoint (or a tracepoint) by `[name] <location>` argument.
    ///
    /// Without a process request is scheduled and no backend call is made.
    /// Location may be resolved into several addresses, breakpoint is created at each of them,
    /// failure of one address doesn't stop the others.
    pub fn set_breakpoint(
        &mut self,
        request: &str,
        tracepoint: bool,
    ) -> Result<SetBreakpointOutcome, Error> {
        let request = request.trim();
        if request.is_empty() {
            return Err(Error::InvalidArgument("address required".to_string()));
        }

        if !self.selection.has_process() {
            debug!(target: "debugger", "no process, schedule breakpoint: {request}");
            self.breakpoints.schedule(BreakpointRequest {
                spec: request.to_string(),
                tracepoint,
            });
            return Ok(SetBreakpointOutcome::Scheduled);
        }

        let scope = self.selection.scope();
        let (name, locations) = match request.split_once(' ') {
            Some((name, locspec)) if is_valid_breakpoint_name(name) => {
                match self.client.find_location(scope, locspec.trim()) {
                    Ok(locations) => (name.to_string(), locations),
                    Err(e) => {
                        // first word may be a part of a location
                        let locations = muted_error!(self.client.find_location(scope, request))
                            .ok_or(e)?;
                        (String::new(), locations)
                    }
                }
            }
            _ => (String::new(), self.client.find_location(scope, request)?),
        };

        if locations.is_empty() {
            return Err(Error::NoLocation);
        }

        let mut created = vec![];
        let mut errors = vec![];
        for location in locations {
            let bp = Breakpoint {
                name: name.clone(),
                addr: location.pc,
                tracepoint,
                ..Default::default()
            };
            match self.client.create_breakpoint(bp) {
                Ok(bp) => {
                    self.breakpoints.add_live(&bp);
                    created.push(bp);
                }
                Err(e) => errors.push(e),
            }
        }

        if created.is_empty() {
            if let Some(err) = Error::from_batch(std::mem::take(&mut errors)) {
                return Err(err);
            }
        }

        Ok(SetBreakpointOutcome::Created { created, errors })
    }

    /// Remove breakpoint by id or name.
    ///
    /// Frozen and scheduled breakpoints are addressed by key (name or location) and removed
    /// without a backend call.
    pub fn clear_breakpoint(&mut self, target: &str) -> Result<ClearedBreakpoint, Error> {
        let target = IdOrName::from(target);
        if matches!(&target, IdOrName::Name(name) if name.is_empty()) {
            return Err(Error::InvalidArgument("not enough arguments".to_string()));
        }

        if let Some(intent) = self.breakpoints.take_pending(&target) {
            debug!(target: "debugger", "pending breakpoint removed: {intent:?}");
            return Ok(ClearedBreakpoint::Pending(intent));
        }

        let bp = match &target {
            IdOrName::Id(id) => self.client.clear_breakpoint(*id)?,
            IdOrName::Name(name) => self.client.clear_breakpoint_by_name(name)?,
        };
        self.breakpoints.remove_live(bp.id);
        Ok(ClearedBreakpoint::Live(bp))
    }

    /// Return all breakpoints of the current process.
    pub fn breakpoints(&self) -> Result<Vec<Breakpoint>, Error> {
        self.client.list_breakpoints()
    }

    /// Change condition of a breakpoint, empty condition removes it.
    pub fn amend_condition(&mut self, target: &str, cond: &str) -> Result<Breakpoint, Error> {
        let mut bp = match IdOrName::from(target) {
            IdOrName::Id(id) => self.client.get_breakpoint(id)?,
            IdOrName::Name(name) => self.client.get_breakpoint_by_name(&name)?,
        };
        bp.cond = cond.trim().to_string();
        self.client.amend_breakpoint(bp.clone())?;
        self.breakpoints.refresh(&bp);
        Ok(bp)
    }

    /// Create all frozen breakpoints in the current process.
    ///
    /// Failed breakpoints stay frozen, errors are returned alongside created breakpoints.
    pub fn restore_frozen(&mut self) -> (Vec<Breakpoint>, Vec<Error>) {
        let client = &self.client;
        let mut restored = vec![];
        let mut errors = vec![];

        for intent in self.breakpoints.frozen_mut() {
            let BreakpointIntent::Frozen(frozen) = intent else {
                continue;
            };
            match client.create_breakpoint(frozen.template.clone()) {
                Ok(bp) => {
                    *intent = BreakpointIntent::Live {
                        id: bp.id,
                        frozen: FrozenBreakpoint::freeze(&bp),
                    };
                    restored.push(bp);
                }
                Err(e) => {
                    errors.push(Error::Backend(format!(
                        "could not restore breakpoint {}: {e}",
                        frozen.key
                    )));
                }
            }
        }

        (restored, errors)
    }

    /// Replay scheduled breakpoint requests in recording order.
    pub fn apply_scheduled(&mut self) -> (Vec<Breakpoint>, Vec<Error>) {
        let mut applied = vec![];
        let mut errors = vec![];

        for request in self.breakpoints.take_scheduled() {
            match self.set_breakpoint(&request.spec, request.tracepoint) {
                Ok(SetBreakpointOutcome::Created { created, errors: errs }) => {
                    applied.extend(created);
                    errors.extend(errs);
                }
                Ok(SetBreakpointOutcome::Scheduled) => {}
                Err(e) => errors.push(e),
            }
        }

        (applied, errors)
    }

    /// Make live breakpoints frozen before the process is replaced.
    ///
    /// Frozen descriptions are refreshed from backend first, so amendments are not lost.
    /// Live breakpoints are removed from the backend.
    pub(super) fn prepare_process_replacement(&mut self) {
        let live = self.breakpoints.live_ids();
        if live.is_empty() {
            return;
        }

        if let Some(actual) = weak_error!(self.client.list_breakpoints(), "refresh breakpoints:") {
            actual
                .iter()
                .filter(|bp| live.contains(&bp.id))
                .for_each(|bp| self.breakpoints.refresh(bp));
        }

        for id in live {
            weak_error!(self.client.clear_breakpoint(id), "clear breakpoint:");
        }

        self.breakpoints.freeze_all();
    }
}
