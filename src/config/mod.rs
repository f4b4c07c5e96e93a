//! Release configuration.
//!
//! [`ReleaseConfig`] is built once at process entry (see
//! [`crate::cli::Args`]) and handed to the pipeline by value. Nothing below
//! the CLI layer reads the process environment.

use crate::packaging::PACKAGED_TEMPLATE_NAME;
use crate::provenance::{ProvenanceSource, TaggingPolicy};
use std::path::{Path, PathBuf};

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Signing profile applied to every function and layer
    pub signing_profile: String,
    /// Source SAM template
    pub template_file: PathBuf,
    /// Bucket receiving packaged artifacts and the release bundle
    pub artifact_bucket: String,
    /// Values for the provenance metadata sets
    pub provenance: ProvenanceSource,
    /// Directory for the packaged template and bundle archive
    pub work_dir: PathBuf,
    /// Whether untagged artifacts fail the release
    pub tagging_policy: TaggingPolicy,
}

impl ReleaseConfig {
    /// Where packaging writes the transformed template.
    pub fn packaged_template_path(&self) -> PathBuf {
        self.work_dir.join(PACKAGED_TEMPLATE_NAME)
    }

    pub fn template_file(&self) -> &Path {
        &self.template_file
    }
}
