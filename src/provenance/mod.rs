//! Build provenance for release artifacts.
//!
//! - [`metadata`] - The build and release [`ProvenanceMetadata`] sets
//! - [`tagger`] - [`ProvenanceTagger`], in-place metadata stamping of artifacts
//!
//! Tagging never stops at the first failed artifact. Every record ends up in
//! a [`TaggingReport`], and a [`TaggingPolicy`] decides afterwards whether an
//! incomplete report fails the release.

mod metadata;
mod tagger;

pub use metadata::{ProvenanceMetadata, ProvenanceSource};
pub use tagger::ProvenanceTagger;

use crate::error::{ReleaseError, Result};
use crate::storage::ObjectLocation;
use crate::template::ResourceKind;
use serde::Serialize;

/// What an incomplete [`TaggingReport`] means for the release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TaggingPolicy {
    /// Any untagged artifact fails the release, after all were attempted
    #[default]
    Strict,
    /// Untagged artifacts are logged and the release continues
    BestEffort,
}

/// Result of tagging a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TagOutcome {
    Tagged,
    Failed { reason: String },
}

/// Per-resource tagging record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub logical_id: String,
    pub kind: ResourceKind,
    /// Resolved artifact location; `None` when it could not be resolved
    pub location: Option<ObjectLocation>,
    pub outcome: TagOutcome,
}

impl TagRecord {
    pub fn is_tagged(&self) -> bool {
        matches!(self.outcome, TagOutcome::Tagged)
    }
}

/// Outcomes of one tagging pass, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaggingReport {
    records: Vec<TagRecord>,
}

impl TaggingReport {
    pub fn new(records: Vec<TagRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    /// Number of artifacts a tag was attempted on.
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_tagged()).count()
    }

    /// Logical ids of the resources that were not tagged.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| !r.is_tagged())
            .map(|r| r.logical_id.as_str())
            .collect()
    }

    /// Whether every artifact was tagged. Vacuously true for an empty report.
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(TagRecord::is_tagged)
    }

    /// Applies `policy` to this report.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::TaggingIncomplete`] when the report has failures and
    /// the policy is [`TaggingPolicy::Strict`].
    pub fn enforce(&self, policy: TaggingPolicy) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }

        match policy {
            TaggingPolicy::Strict => Err(ReleaseError::TaggingIncomplete {
                attempted: self.attempted(),
                failed: self.failed_ids().into_iter().map(String::from).collect(),
            }),
            TaggingPolicy::BestEffort => {
                for record in &self.records {
                    if let TagOutcome::Failed { reason } = &record.outcome {
                        log::warn!(
                            "{} left without provenance: {}",
                            record.logical_id,
                            ReleaseError::Tagging {
                                logical_id: record.logical_id.clone(),
                                reason: reason.clone(),
                            }
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
