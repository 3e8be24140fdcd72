//! Background layout driver: one worker thread per diagram.
//!
//! Schema snapshots go in through [`LayoutService::request_layout`]; finished
//! layouts and user-visible errors come out as [`LayoutEvent`]s on the
//! receiver returned by [`LayoutService::spawn`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::LayoutError;
use crate::layout::{LayoutEngine, LayoutResult};
use crate::orchestrator::{Completion, LayoutState, Orchestrator, RunId, RunTicket};
use crate::schema::ParsedSchema;

/// Executes one layout run for the worker.
pub trait LayoutRunner: Send + 'static {
    fn run(&self, schema: &ParsedSchema, cancel: &CancelToken) -> Result<LayoutResult, LayoutError>;
}

impl LayoutRunner for LayoutEngine {
    fn run(&self, schema: &ParsedSchema, cancel: &CancelToken) -> Result<LayoutResult, LayoutError> {
        LayoutEngine::run(self, schema, cancel)
    }
}

#[derive(Debug, Clone)]
pub enum LayoutEvent {
    Published { run: RunId, result: Arc<LayoutResult> },
    Failed { run: RunId, error: LayoutError },
}

struct Inner {
    orchestrator: Orchestrator,
    queued: Option<RunTicket>,
    shutdown: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The orchestrator stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, inner: &mut Inner, ticket: Option<RunTicket>) {
        if let Some(ticket) = ticket {
            inner.queued = Some(ticket);
            self.wake.notify_one();
        }
    }
}

pub struct LayoutService {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl LayoutService {
    /// Start a worker running `runner` (usually a [`LayoutEngine`]).
    pub fn spawn<R: LayoutRunner>(runner: R) -> std::io::Result<(Self, Receiver<LayoutEvent>)> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                orchestrator: Orchestrator::new(),
                queued: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });
        let (tx, rx) = mpsc::channel();

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("erd-layout".to_string())
                .spawn(move || worker_loop(&shared, &runner, &tx))?
        };

        Ok((
            Self {
                shared,
                worker: Some(worker),
            },
            rx,
        ))
    }

    /// Submit a new schema snapshot. Supersedes any run in flight.
    pub fn request_layout(&self, schema: ParsedSchema) {
        let mut inner = self.shared.lock();
        let ticket = inner.orchestrator.on_schema_changed(schema);
        self.shared.enqueue(&mut inner, ticket);
    }

    /// Recompute the layout of the latest snapshot.
    pub fn relayout(&self) {
        let mut inner = self.shared.lock();
        let ticket = inner.orchestrator.relayout();
        self.shared.enqueue(&mut inner, ticket);
    }

    pub fn current(&self) -> Option<Arc<LayoutResult>> {
        self.shared.lock().orchestrator.current().cloned()
    }

    pub fn state(&self) -> LayoutState {
        self.shared.lock().orchestrator.state()
    }
}

impl Drop for LayoutService {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.lock();
            inner.shutdown = true;
            inner.queued = None;
            inner.orchestrator.cancel_in_flight();
            self.shared.wake.notify_one();
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("Layout worker panicked");
        }
    }
}

fn worker_loop<R: LayoutRunner>(shared: &Shared, runner: &R, events: &Sender<LayoutEvent>) {
    loop {
        let ticket = {
            let mut inner = shared.lock();
            loop {
                if inner.shutdown {
                    debug!("Layout worker stopping");
                    return;
                }
                if let Some(ticket) = inner.queued.take() {
                    break ticket;
                }
                inner = shared.wake.wait(inner).unwrap_or_else(PoisonError::into_inner);
            }
        };

        let outcome = runner.run(&ticket.snapshot, &ticket.cancel);

        let completion = {
            let mut inner = shared.lock();
            let completion = match outcome {
                Ok(result) => inner.orchestrator.on_run_succeeded(ticket.id, result),
                Err(error) => inner.orchestrator.on_run_failed(ticket.id, error),
            };
            if !inner.shutdown {
                inner.queued = completion.next.clone();
            }
            completion
        };

        deliver(events, ticket.id, completion);
    }
}

fn deliver(events: &Sender<LayoutEvent>, run: RunId, completion: Completion) {
    let event = match completion {
        Completion {
            published: Some(result),
            ..
        } => LayoutEvent::Published { run, result },
        Completion { error: Some(error), .. } => LayoutEvent::Failed { run, error },
        _ => return,
    };
    if events.send(event).is_err() {
        info!(run; "Layout event receiver dropped");
    }
}
