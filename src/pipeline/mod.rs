//! Release pipeline orchestration.
//!
//! This module provides the [`ReleasePipeline`] orchestrator that drives one
//! release from source template to published bundle.
//!
//! # Overview
//!
//! The pipeline:
//! 1. Parses the source template and scans it for functions and layers
//! 2. Resolves the signing profile assignment
//! 3. Packages (and signs) through the packaging tool
//! 4. Re-scans the packaged template and tags every artifact with build
//!    provenance
//! 5. Zips and uploads the packaged template with release provenance
//!
//! Stages run strictly in order. Any stage failure moves the pipeline to
//! [`PipelineStage::Failed`]; per-artifact tagging failures are first
//! aggregated, then the configured [`crate::provenance::TaggingPolicy`]
//! decides.

mod stage;

pub use stage::PipelineStage;

use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result};
use crate::packaging::{PackageRequest, Packager};
use crate::process::CommandRunner;
use crate::provenance::{ProvenanceMetadata, ProvenanceTagger, TaggingReport};
use crate::publish::{ArtifactPublisher, PublishResult};
use crate::signing::{self, SigningProfileAssignment};
use crate::storage::ObjectStore;
use crate::template;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a run produced, stage by stage.
///
/// Fields are filled in as stages complete, so a failed run still shows how
/// far it got.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stage: PipelineStage,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub signing_profiles: Option<SigningProfileAssignment>,
    pub tagging: Option<TaggingReport>,
    pub published: Option<PublishResult>,
    /// Failure message, with the failed stage, when the run failed
    pub error: Option<String>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Init,
            started_at: Utc::now(),
            finished_at: None,
            signing_profiles: None,
            tagging: None,
            published: None,
            error: None,
        }
    }
}

/// Main release orchestrator.
///
/// Packaging goes through `runner`; tagging and upload go through `store`.
pub struct ReleasePipeline<R, S> {
    config: ReleaseConfig,
    runner: R,
    store: S,
    sam_bin: String,
    summary: RunSummary,
}

impl<R, S> std::fmt::Debug for ReleasePipeline<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasePipeline")
            .field("config", &self.config)
            .field("sam_bin", &self.sam_bin)
            .field("stage", &self.summary.stage)
            .finish_non_exhaustive()
    }
}

impl<R, S> ReleasePipeline<R, S>
where
    R: CommandRunner + Sync,
    S: ObjectStore + Sync,
{
    /// Creates a pipeline in [`PipelineStage::Init`].
    pub fn new(config: ReleaseConfig, runner: R, store: S) -> Self {
        Self {
            config,
            runner,
            store,
            sam_bin: "sam".to_string(),
            summary: RunSummary::new(),
        }
    }

    /// Overrides the packaging tool executable (default `sam`).
    pub fn with_sam_bin(mut self, sam_bin: impl Into<String>) -> Self {
        self.sam_bin = sam_bin.into();
        self
    }

    /// Current stage.
    pub fn stage(&self) -> PipelineStage {
        self.summary.stage
    }

    /// Progress so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Runs every stage to [`PipelineStage::Published`].
    ///
    /// A pipeline runs once; calling this again after it finished fails.
    ///
    /// # Errors
    ///
    /// The first fatal stage error. The pipeline is left in
    /// [`PipelineStage::Failed`] and [`Self::summary`] records how far it got.
    pub async fn run(&mut self) -> Result<RunSummary> {
        if self.summary.stage != PipelineStage::Init {
            return Err(ReleaseError::AlreadyRan {
                stage: self.summary.stage.to_string(),
            });
        }

        let result = self.run_stages().await;
        self.summary.finished_at = Some(Utc::now());

        match result {
            Ok(()) => Ok(self.summary.clone()),
            Err(e) => {
                log::error!("Release failed during {} stage: {e}", e.stage());
                self.summary.error = Some(format!("{} stage: {e}", e.stage()));
                self.summary.stage = PipelineStage::Failed;
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<()> {
        let config = &self.config;

        // Scan
        log::info!("Parsing resources to be signed from {}", config.template_file.display());
        let source = template::parse_file(&config.template_file).await?;
        let signable = template::scan(&source);
        log::info!(
            "Found {} signable resource(s) among {}",
            signable.len(),
            source.len()
        );
        advance(&mut self.summary, PipelineStage::Scanned);

        // Resolve
        let assignment = signing::resolve(&signable, &config.signing_profile);
        let signing_argument = assignment.to_invocation_argument();
        drop(source);
        self.summary.signing_profiles = Some(assignment);
        advance(&mut self.summary, PipelineStage::Resolved);

        // Package
        tokio::fs::create_dir_all(&config.work_dir).await?;
        let output_template = config.packaged_template_path();
        let packager = Packager::new(&self.runner, self.sam_bin.as_str());
        let packaged_path = packager
            .package(&PackageRequest {
                template: &config.template_file,
                bucket: &config.artifact_bucket,
                signing_profiles: signing_argument.as_deref(),
                output_template: &output_template,
            })
            .await?;
        let packaged = template::parse_file(&packaged_path)
            .await
            .map_err(|e| match e {
                ReleaseError::MalformedTemplate { reason, .. } => {
                    ReleaseError::MalformedPackagedTemplate {
                        path: packaged_path.clone(),
                        reason,
                    }
                }
                other => other,
            })?;
        advance(&mut self.summary, PipelineStage::Packaged);

        // Tag
        let build_metadata = ProvenanceMetadata::build(&config.provenance);
        let report = ProvenanceTagger::new(&self.store)
            .tag(&packaged, &build_metadata)
            .await;
        log::info!(
            "Tagged {} of {} artifact(s)",
            report.succeeded(),
            report.attempted()
        );
        let enforced = report.enforce(config.tagging_policy);
        self.summary.tagging = Some(report);
        enforced?;
        advance(&mut self.summary, PipelineStage::Tagged);

        // Publish
        let release_metadata = ProvenanceMetadata::release(&config.provenance);
        let published = ArtifactPublisher::new(&self.store)
            .publish(&packaged_path, &config.artifact_bucket, &release_metadata)
            .await?;
        log::info!("Published release bundle to {}", published.destination);
        self.summary.published = Some(published);
        advance(&mut self.summary, PipelineStage::Published);

        Ok(())
    }
}

fn advance(summary: &mut RunSummary, next: PipelineStage) {
    debug_assert_eq!(summary.stage.next(), Some(next), "out-of-order stage transition");
    log::debug!("Pipeline stage {} -> {}", summary.stage, next);
    summary.stage = next;
}
