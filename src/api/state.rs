use crate::service::AnalysisService;
use std::sync::Arc;
use std::time::Instant;

/// Shared by every handler; cloning is cheap
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<AnalysisService>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
