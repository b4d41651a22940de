//! sbom-pipeline - background SBOM generation for uploaded source archives
//!
//! This library extracts an uploaded archive, locates the project root,
//! runs the CycloneDX generator for the declared ecosystem, and uploads the
//! resulting BOM to Dependency-Track, recording the job status after every
//! stage. It follows hexagonal architecture and Domain-Driven Design
//! principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): jobs, statuses, command specs,
//!   extraction and root location, per-ecosystem generator strategies
//! - **Application Layer** (`application`): the pipeline orchestrator, job
//!   submission, project deletion and the job scheduler
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Dependency-Track client, process supervisor,
//!   status stores
//! - **Shared** (`shared`): error types, logging, path safety helpers
//!
//! # Example
//!
//! ```no_run
//! use sbom_pipeline::prelude::*;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<()> {
//! let statuses = InMemoryStatusStore::new();
//! let client = DependencyTrackClient::new(
//!     "http://127.0.0.1:8081",
//!     "api-key",
//!     Duration::from_secs(30),
//!     RetryPolicy::default(),
//! )?;
//! let tools = ToolPath::from_env(&[]);
//!
//! let pipeline = RunPipelineUseCase::new(
//!     statuses.clone(),
//!     client.clone(),
//!     ProcessSupervisor::new(tools.clone(), 2, 64 * 1024),
//!     ArchiveExtractor::default(),
//!     CommandRegistry::new(tools),
//! );
//! let scheduler = JobScheduler::new(Arc::new(pipeline), statuses);
//! let submit = SubmitJobUseCase::new(client, scheduler, PathBuf::from("data/sbom"));
//!
//! let job = submit
//!     .execute(JobRequest::from_path(PathBuf::from("shop-api.zip"), "python"))
//!     .await?;
//! let outcome = job.handle.await?;
//! println!("{} -> {}", outcome.job_id, outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::network::DependencyTrackClient;
    pub use crate::adapters::outbound::persistence::{InMemoryStatusStore, JsonFileStatusStore};
    pub use crate::adapters::outbound::process::ProcessSupervisor;
    pub use crate::application::dto::{JobOutcome, JobRequest};
    pub use crate::application::use_cases::{
        DeleteProjectUseCase, RunPipelineUseCase, SubmitJobUseCase, SubmittedJob,
    };
    pub use crate::application::JobScheduler;
    pub use crate::ports::inbound::PipelinePort;
    pub use crate::ports::outbound::{
        ProcessRunner, StatusRepository, TrackingQueries, TrackingService,
    };
    pub use crate::sbom_generation::domain::{
        CommandSpec, Ecosystem, ExternalProjectId, Job, JobId, JobStatus, ProcessResult,
        StatusRecord,
    };
    pub use crate::sbom_generation::policies::{ExtractionLimits, RetryPolicy};
    pub use crate::sbom_generation::services::{
        ArchiveExtractor, CommandRegistry, ProjectRootLocator, ToolPath,
    };
    pub use crate::shared::{PipelineError, Result};
}
