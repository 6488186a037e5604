//! esgpulse - ESG risk analytics with a multi-agent synthesis pipeline
//!
//! The library looks up company ESG metrics, predicts risk levels with a
//! trained classifier, and runs a fixed chain of three stages over each
//! company:
//!
//! 1. **News analysis** buckets recent articles into Environmental, Social
//!    and Governance themes and derives a sentiment from controversy hits.
//! 2. **Model interpretation** produces a risk label, confidence and
//!    feature-impact annotations, from the model or the stored label.
//! 3. **Synthesis** reconciles the two, then writes recommendations and a
//!    narrative, through an LLM when one is configured and a template
//!    otherwise.
//!
//! # Example Usage
//!
//! ```no_run
//! use esgpulse::company::CompanyData;
//! use esgpulse::news::NewsArticle;
//! use esgpulse::pipeline::{ModelHandle, PipelineOrchestrator};
//!
//! # async fn run() -> Result<(), esgpulse::PipelineError> {
//! let orchestrator = PipelineOrchestrator::new(None);
//! let report = orchestrator
//!     .run(
//!         "Acme Corp",
//!         CompanyData::new("ACME", "Acme Corp"),
//!         vec![NewsArticle::new("Acme fined", "Regulator imposes emissions penalty")],
//!         ModelHandle::baseline(Some("Medium".to_string())),
//!     )
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: stages, per-run context, orchestrator and report
//! - [`service`]: symbol lookup, news fetch and batching around the pipeline
//! - [`company`], [`model`], [`news`], [`llm`]: the collaborators
//! - [`api`] and [`cli`]: HTTP and command-line surfaces

pub mod api;
pub mod cli;
pub mod company;
pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod news;
pub mod pipeline;
pub mod progress;
pub mod service;
pub mod util;

pub use config::{ConfigError, EsgConfig};
pub use error::{AnalysisError, BackendError, PipelineError};
pub use pipeline::{FinalReport, ModelHandle, PipelineOrchestrator, StageResult};
pub use service::{AnalysisOptions, AnalysisService};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
