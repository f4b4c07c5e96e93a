//! Release pipeline for SAM serverless applications
//!
//! This library prepares a release of a SAM application:
//! - Assigns a signing profile to every function and layer in the template
//! - Packages and signs the artifacts with `sam package`
//! - Stamps build provenance metadata onto every uploaded artifact
//! - Publishes the packaged template as `template.zip` with release provenance
//!
//! It can be used both as a CLI tool and as a library dependency. External
//! tools are reached through [`process::CommandRunner`] and
//! [`storage::ObjectStore`], so the pipeline can run against fakes.

pub mod cli;
pub mod config;
pub mod error;
pub mod packaging;
pub mod pipeline;
pub mod process;
pub mod provenance;
pub mod publish;
pub mod signing;
pub mod storage;
pub mod template;

// Re-export commonly used types
pub use config::ReleaseConfig;
pub use error::{CliError, ReleaseError, Result};
pub use pipeline::{PipelineStage, ReleasePipeline, RunSummary};
