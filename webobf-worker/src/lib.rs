//! webobf Worker
//!
//! Runs obfuscation batches on an isolated tokio task and exposes the
//! orchestrator that drives it over a JSON message channel.

pub mod orchestrator;
pub mod protocol;
pub mod runner;
pub mod tracker;
pub mod worker;

pub use orchestrator::{Orchestrator, OrchestratorState, Outcome, ProgressReporter};
pub use protocol::{Command, Envelope, Event, Message, StartArgs, OPERATION};
pub use runner::{BatchRunner, EventSink, WorkerState};
pub use tracker::{CompletionTracker, RunCounters};
pub use worker::{spawn_worker, WorkerHandle};
