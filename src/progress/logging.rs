//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { company, trace_id } => {
                info!(company = %company, trace_id = %trace_id, "Starting ESG analysis");
            }
            ProgressEvent::StageStarted { company, stage } => {
                debug!(company = %company, stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete {
                company,
                stage,
                duration,
                degraded,
            } => {
                if *degraded {
                    info!(
                        company = %company,
                        stage = %stage,
                        duration_ms = duration.as_millis() as u64,
                        "Stage complete using fallback"
                    );
                } else {
                    debug!(
                        company = %company,
                        stage = %stage,
                        duration_ms = duration.as_millis() as u64,
                        "Stage complete"
                    );
                }
            }
            ProgressEvent::Completed {
                company,
                total_time,
            } => {
                info!(
                    company = %company,
                    total_time_ms = total_time.as_millis() as u64,
                    "ESG analysis complete"
                );
            }
            ProgressEvent::Failed { company, error } => {
                warn!(company = %company, error = %error, "ESG analysis failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageName;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;
        let company = || "Acme".to_string();

        let events = vec![
            ProgressEvent::Started {
                company: company(),
                trace_id: "abc".to_string(),
            },
            ProgressEvent::StageStarted {
                company: company(),
                stage: StageName::NewsAnalysis,
            },
            ProgressEvent::StageComplete {
                company: company(),
                stage: StageName::ModelInterpretation,
                duration: Duration::from_millis(2),
                degraded: true,
            },
            ProgressEvent::StageComplete {
                company: company(),
                stage: StageName::Synthesis,
                duration: Duration::from_millis(2),
                degraded: false,
            },
            ProgressEvent::Completed {
                company: company(),
                total_time: Duration::from_millis(9),
            },
            ProgressEvent::Failed {
                company: company(),
                error: "Test error".to_string(),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
