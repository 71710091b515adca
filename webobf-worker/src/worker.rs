//! Worker task
//!
//! The worker runs on its own tokio task and talks to the orchestrator only
//! through two unbounded channels of [`Envelope`]s. After it emits a terminal
//! event it drops its command receiver and exits, so later commands are refused.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::protocol::{Command, Envelope, Event};
use crate::runner::{BatchRunner, EventSink, WorkerState};

/// Orchestrator-side handle to a spawned worker
pub struct WorkerHandle {
    commands: mpsc::UnboundedSender<Envelope>,
    events: mpsc::UnboundedReceiver<Envelope>,
    task: JoinHandle<WorkerState>,
}

impl WorkerHandle {
    /// Send a raw command; fails once the worker has terminated
    pub fn send(&self, envelope: Envelope) -> Result<(), Envelope> {
        self.commands.send(envelope).map_err(|e| e.0)
    }

    /// Send a typed command
    pub fn send_command(&self, command: &Command) -> Result<(), Envelope> {
        self.send(Envelope::encode(command))
    }

    /// Next message from the worker, `None` once it is gone
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.events.recv().await
    }

    /// Tear the worker down and return the state it ended in
    ///
    /// A worker that already finished is joined; one still running is aborted.
    pub async fn terminate(self) -> WorkerState {
        drop(self.commands);
        if !self.task.is_finished() {
            self.task.abort();
        }
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                if e.is_panic() {
                    tracing::error!("Worker panicked: {}", e);
                }
                WorkerState::Terminated
            }
        }
    }
}

/// Spawn a worker on the current tokio runtime
pub fn spawn_worker() -> WorkerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(worker_loop(command_rx, EventSink::new(event_tx)));
    WorkerHandle {
        commands: command_tx,
        events: event_rx,
        task,
    }
}

async fn worker_loop(
    mut commands: mpsc::UnboundedReceiver<Envelope>,
    sink: EventSink,
) -> WorkerState {
    let mut state = WorkerState::Idle;

    while let Some(envelope) = commands.recv().await {
        match envelope.decode::<Command>() {
            Ok(Command::Obfuscate(args)) => {
                let run_id = Uuid::new_v4();
                let span = tracing::info_span!("run", id = %run_id);
                let mut runner = BatchRunner::new(args, sink.clone());
                let terminal = runner.run().instrument(span).await;
                sink.send(&terminal);
                state = runner.state();
                debug_assert_eq!(state, WorkerState::Terminated);
                break;
            }
            Err(e) => {
                // Not fatal to the worker: report and keep waiting
                tracing::warn!("Protocol error: {}", e);
                sink.send(&Event::Fail {
                    name: envelope.name.clone(),
                    error: e.describe(),
                });
            }
        }
    }

    commands.close();
    tracing::debug!("Worker exiting in state {:?}", state);
    state
}
