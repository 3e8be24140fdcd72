//! Per-diagram layout state machine.
//!
//! ```text
//!   Idle --schema changed--> Computing --run finished--> Idle
//!                               |   ^
//!              schema changed   |   | stale run finished
//!                               v   |
//!                              Stale
//! ```
//!
//! The machine never runs anything itself. It hands out [`RunTicket`]s and is
//! told how each run ended; drivers (the background [`crate::service`] or the
//! WebAssembly binding) execute the tickets. Only the most recent snapshot is
//! ever kept waiting, and a run that was superseded never publishes.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::LayoutError;
use crate::layout::LayoutResult;
use crate::schema::ParsedSchema;

pub type RunId = u64;

/// Work order for one layout run.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub id: RunId,
    pub snapshot: Arc<ParsedSchema>,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    Idle,
    Computing,
    /// Computing, with a newer snapshot waiting for the run to wind down.
    Stale,
}

#[derive(Debug)]
enum State {
    Idle,
    Computing {
        run: RunId,
        cancel: CancelToken,
        pending: Option<Arc<ParsedSchema>>,
    },
}

/// What a driver should do after reporting a finished run.
#[derive(Debug, Default)]
pub struct Completion {
    /// Newly published layout.
    pub published: Option<Arc<LayoutResult>>,
    /// Error to surface upstream; the previous layout stays current.
    pub error: Option<LayoutError>,
    /// Run to start immediately.
    pub next: Option<RunTicket>,
}

#[derive(Debug)]
pub struct Orchestrator {
    state: State,
    next_run: RunId,
    latest: Option<Arc<ParsedSchema>>,
    current: Option<Arc<LayoutResult>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            next_run: 1,
            latest: None,
            current: None,
        }
    }

    pub fn state(&self) -> LayoutState {
        match &self.state {
            State::Idle => LayoutState::Idle,
            State::Computing { pending: None, .. } => LayoutState::Computing,
            State::Computing { pending: Some(_), .. } => LayoutState::Stale,
        }
    }

    /// Last published layout, kept across failed runs.
    pub fn current(&self) -> Option<&Arc<LayoutResult>> {
        self.current.as_ref()
    }

    /// Record a new snapshot. Returns a ticket when a run should start now;
    /// otherwise the in-flight run is cancelled and the snapshot waits for it.
    pub fn on_schema_changed(&mut self, snapshot: impl Into<Arc<ParsedSchema>>) -> Option<RunTicket> {
        let snapshot = snapshot.into();
        self.latest = Some(Arc::clone(&snapshot));

        match &mut self.state {
            State::Idle => Some(self.start(snapshot)),
            State::Computing { run, cancel, pending } => {
                debug!(run = *run, coalesced = pending.is_some(); "Superseding in-flight layout run");
                cancel.cancel();
                *pending = Some(snapshot);
                None
            }
        }
    }

    /// Rerun the layout on the latest snapshot.
    pub fn relayout(&mut self) -> Option<RunTicket> {
        let snapshot = self.latest.clone()?;
        self.on_schema_changed(snapshot)
    }

    pub fn on_run_succeeded(&mut self, run: RunId, result: LayoutResult) -> Completion {
        let Some(pending) = self.finish(run) else {
            return Completion::default();
        };

        if let Some(snapshot) = pending {
            debug!(run; "Discarding superseded layout result");
            return Completion {
                next: Some(self.start(snapshot)),
                ..Completion::default()
            };
        }

        let result = Arc::new(result);
        self.current = Some(Arc::clone(&result));
        info!(run, nodes = result.positions.len(); "Layout published");
        Completion {
            published: Some(result),
            ..Completion::default()
        }
    }

    pub fn on_run_failed(&mut self, run: RunId, error: LayoutError) -> Completion {
        let Some(pending) = self.finish(run) else {
            return Completion::default();
        };

        if let Some(snapshot) = pending {
            debug!(run, error:%; "Superseded layout run ended");
            return Completion {
                next: Some(self.start(snapshot)),
                ..Completion::default()
            };
        }

        if !error.is_user_visible() {
            return Completion::default();
        }
        warn!(run, error:%, keeps_previous = self.current.is_some(); "Layout run failed");
        Completion {
            error: Some(error),
            ..Completion::default()
        }
    }

    /// Cancel the in-flight run, if any, without queueing another.
    pub fn cancel_in_flight(&mut self) {
        if let State::Computing { cancel, pending, .. } = &mut self.state {
            cancel.cancel();
            *pending = None;
        }
    }

    fn start(&mut self, snapshot: Arc<ParsedSchema>) -> RunTicket {
        let id = self.next_run;
        self.next_run += 1;
        let cancel = CancelToken::new();
        self.state = State::Computing {
            run: id,
            cancel: cancel.clone(),
            pending: None,
        };
        debug!(run = id; "Starting layout run");
        RunTicket {
            id,
            snapshot,
            cancel,
        }
    }

    /// Return to Idle if `run` is the current one, handing back the waiting
    /// snapshot. `None` means the report is stale and must be ignored.
    fn finish(&mut self, run: RunId) -> Option<Option<Arc<ParsedSchema>>> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Computing {
                run: current,
                pending,
                ..
            } if current == run => Some(pending),
            other => {
                debug!(run; "Ignoring report from unknown layout run");
                self.state = other;
                None
            }
        }
    }
}
