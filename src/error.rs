//! Error types for release pipeline operations.
//!
//! Stage-level failures (parse, package, publish) are fatal. Per-resource
//! tagging failures are collected into a [`crate::provenance::TaggingReport`]
//! and only become a [`ReleaseError::TaggingIncomplete`] under the strict
//! tagging policy.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release pipeline operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release pipeline operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The template is not a well-formed document or has the wrong shape
    #[error("Malformed template{}: {reason}", source_suffix(.path))]
    MalformedTemplate {
        /// File the template was read from, if any
        path: Option<PathBuf>,
        /// What was wrong with it
        reason: String,
    },

    /// The packaging tool exited non-zero or produced no output template
    #[error("Packaging failed: {command} - {reason}")]
    Packaging {
        /// Command line that was run
        command: String,
        /// Collaborator error text
        reason: String,
    },

    /// The packaging tool's output template could not be parsed
    #[error("Packaged template {} is malformed: {reason}", .path.display())]
    MalformedPackagedTemplate {
        /// Output template written by the packaging tool
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A single artifact could not be stamped with provenance metadata
    #[error("Tagging failed for {logical_id}: {reason}")]
    Tagging {
        /// Logical id of the resource whose artifact was not tagged
        logical_id: String,
        /// Collaborator error text
        reason: String,
    },

    /// Tagging finished with failures and the policy treats that as fatal
    #[error(
        "Provenance tagging incomplete: {} of {attempted} artifact(s) failed ({})",
        .failed.len(),
        .failed.join(", ")
    )]
    TaggingIncomplete {
        /// Number of artifacts a tag was attempted on
        attempted: usize,
        /// Logical ids of the resources that failed
        failed: Vec<String>,
    },

    /// Archiving or uploading the release bundle failed
    #[error("Publish failed during {step}: {reason}")]
    Publish {
        /// Which publish step failed ("archive" or "upload")
        step: &'static str,
        /// Collaborator error text
        reason: String,
    },

    /// `run` was called on a pipeline that already left its initial stage
    #[error("Pipeline already ran (stage: {stage})")]
    AlreadyRan {
        /// Stage the pipeline was in
        stage: String,
    },

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn source_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

/// CLI and collaborator invocation errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A required external tool could not be found
    #[error("Missing required tool: {tool} ({reason})")]
    MissingTool {
        /// Executable name
        tool: String,
        /// Why lookup failed
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Name of the pipeline stage this error belongs to, for reporting.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MalformedTemplate { .. } => "parse",
            Self::Packaging { .. } | Self::MalformedPackagedTemplate { .. } => "package",
            Self::Tagging { .. } | Self::TaggingIncomplete { .. } => "tag",
            Self::Publish { .. } => "publish",
            Self::AlreadyRan { .. } => "pipeline",
            Self::Cli(_) => "configure",
            Self::Io(_) | Self::Json(_) => "io",
        }
    }

    /// Check if this error is recoverable at the pipeline level
    ///
    /// Only a single artifact's tagging failure is; the pipeline keeps going
    /// and aggregates it into the report.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Tagging { .. })
    }
}
