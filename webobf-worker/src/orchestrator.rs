//! Orchestrator side of the channel
//!
//! Spawns a worker, sends the single start command and forwards progress to a
//! [`ProgressReporter`] until the terminal event arrives. The worker is torn down
//! as soon as the run is decided.

use webobf_core::ObfuscateError;

use crate::protocol::{Command, Envelope, Event, StartArgs, OPERATION};
use crate::worker::{spawn_worker, WorkerHandle};

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Running,
    Done,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { name: String },
    Failure { name: String, error: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Receives what the worker reports while a run is in flight
pub trait ProgressReporter {
    fn progress(&mut self, percent: u8, text: &str);

    /// A message the orchestrator did not understand
    fn protocol_error(&mut self, error: &ObfuscateError) {
        tracing::warn!("{}", error.describe());
    }
}

/// Drives one run against one worker
#[derive(Debug)]
pub struct Orchestrator {
    state: OrchestratorState,
    outcome: Option<Outcome>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            state: OrchestratorState::Idle,
            outcome: None,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Run `args` on a fresh worker and wait for its terminal event
    pub async fn run(
        &mut self,
        args: StartArgs,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<Outcome, ObfuscateError> {
        let worker = spawn_worker();
        self.run_with(worker, args, reporter).await
    }

    /// Run `args` on an already spawned worker
    pub async fn run_with(
        &mut self,
        mut worker: WorkerHandle,
        args: StartArgs,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<Outcome, ObfuscateError> {
        if self.state != OrchestratorState::Idle {
            worker.terminate().await;
            return Err(ObfuscateError::Protocol(
                "orchestrator already started a run".to_string(),
            ));
        }
        if worker.send_command(&Command::Obfuscate(args)).is_err() {
            worker.terminate().await;
            return Err(ObfuscateError::Protocol("worker is not accepting commands".to_string()));
        }
        self.state = OrchestratorState::Running;

        while self.state == OrchestratorState::Running {
            match worker.recv().await {
                Some(envelope) => self.handle(envelope, reporter),
                None => {
                    // Worker vanished without a terminal event (e.g. it panicked)
                    self.finish(Outcome::Failure {
                        name: OPERATION.to_string(),
                        error: "worker exited without reporting a result".to_string(),
                    });
                }
            }
        }

        worker.terminate().await;
        self.outcome
            .clone()
            .ok_or_else(|| ObfuscateError::Protocol("run ended without outcome".to_string()))
    }

    /// Apply one worker message; anything after the terminal event is ignored
    pub fn handle(&mut self, envelope: Envelope, reporter: &mut dyn ProgressReporter) {
        if self.state == OrchestratorState::Done {
            tracing::debug!("Ignoring {} after run finished", envelope.name);
            return;
        }
        match envelope.decode::<Event>() {
            Ok(Event::Progress { progress, text }) => reporter.progress(progress, &text),
            Ok(Event::Success { name }) => self.finish(Outcome::Success { name }),
            Ok(Event::Fail { name, error }) => self.finish(Outcome::Failure { name, error }),
            Err(e) => reporter.protocol_error(&e),
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        match &outcome {
            Outcome::Success { name } => tracing::info!("Succeed to {}", name),
            Outcome::Failure { name, error } => tracing::error!("Failed to {}: {}", name, error),
        }
        self.outcome = Some(outcome);
        self.state = OrchestratorState::Done;
    }
}
