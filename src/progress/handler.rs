//! Progress handler trait and events

use crate::pipeline::StageName;
use std::time::Duration;

/// Events emitted while a company moves through the pipeline
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { company: String, trace_id: String },

    StageStarted { company: String, stage: StageName },

    /// `degraded` is set when the stage fell back (no model, no LLM, failed call)
    StageComplete {
        company: String,
        stage: StageName,
        duration: Duration,
        degraded: bool,
    },

    /// Run completed successfully
    Completed {
        company: String,
        total_time: Duration,
    },

    /// Run aborted
    Failed { company: String, error: String },
}

/// Trait for handling progress events during a pipeline run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
