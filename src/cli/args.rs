//! Command line argument parsing and validation.
//!
//! Every option can also be supplied through the environment variable named
//! in its help text, which is how CI jobs normally drive the release.

use crate::config::ReleaseConfig;
use crate::provenance::{ProvenanceSource, TaggingPolicy};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Sign, package and stamp provenance onto a SAM application release
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sam_release_pipeline",
    version,
    about = "Sign, package and stamp provenance onto a SAM application release",
    long_about = "Signs every function and layer of a SAM template with one signing profile, \
packages it with `sam package`, writes build provenance metadata onto every uploaded \
artifact and publishes the packaged template as s3://<bucket>/template.zip.

Usage:
  SIGNING_PROFILE=ReleaseSigner TEMPLATE_FILE=template.yaml ARTIFACT_BUCKET=my-artifacts ... sam_release_pipeline
  sam_release_pipeline --tagging-policy best-effort --report release.json

Exit code 0 = bundle published with provenance."
)]
pub struct Args {
    /// Signing profile applied to every function and layer
    #[arg(long, env = "SIGNING_PROFILE")]
    pub signing_profile: String,

    /// SAM template to release
    #[arg(long, env = "TEMPLATE_FILE", value_name = "PATH")]
    pub template_file: PathBuf,

    /// Bucket for packaged artifacts and the release bundle
    #[arg(long, env = "ARTIFACT_BUCKET")]
    pub artifact_bucket: String,

    /// Source repository recorded in provenance
    #[arg(long, env = "REPOSITORY")]
    pub repository: String,

    /// Commit message recorded in provenance
    #[arg(long, env = "COMMIT_MESSAGE")]
    pub commit_message: String,

    /// Commit SHA recorded in provenance
    #[arg(long, env = "GIT_SHA")]
    pub git_sha: String,

    /// Commit tag recorded in provenance
    #[arg(long, env = "GIT_TAG")]
    pub git_tag: String,

    /// Commit author recorded in provenance
    #[arg(long, env = "GITHUB_ACTOR")]
    pub github_actor: String,

    /// Release version recorded in provenance
    #[arg(long, env = "VERSION_NUMBER")]
    pub version_number: String,

    /// Merge time recorded on the release bundle
    #[arg(long, env = "MERGE_TIME")]
    pub merge_time: String,

    /// Canary skip flag recorded on the release bundle
    #[arg(long, env = "SKIP_CANARY_DEPLOYMENT")]
    pub skip_canary_deployment: String,

    /// Directory for the packaged template and bundle archive
    #[arg(long, env = "WORK_DIR", value_name = "PATH", default_value = ".")]
    pub work_dir: PathBuf,

    /// Whether artifacts left untagged fail the release
    #[arg(long, env = "TAGGING_POLICY", value_enum, default_value_t = TaggingPolicy::Strict)]
    pub tagging_policy: TaggingPolicy,

    /// Write a JSON run summary to this path
    #[arg(long, env = "PROVENANCE_REPORT", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Kill external commands running longer than this many seconds
    #[arg(long, env = "COMMAND_TIMEOUT_SECS", value_name = "SECONDS")]
    pub command_timeout_secs: Option<u64>,

    /// SAM CLI executable
    #[arg(long, env = "SAM_BIN", default_value = "sam")]
    pub sam_bin: String,

    /// AWS CLI executable
    #[arg(long, env = "AWS_BIN", default_value = "aws")]
    pub aws_bin: String,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("SIGNING_PROFILE", self.signing_profile.as_str()),
            ("ARTIFACT_BUCKET", self.artifact_bucket.as_str()),
            ("SAM_BIN", self.sam_bin.as_str()),
            ("AWS_BIN", self.aws_bin.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{name} cannot be empty"));
            }
        }

        if self.template_file.as_os_str().is_empty() {
            return Err("TEMPLATE_FILE cannot be empty".to_string());
        }

        if self.artifact_bucket.contains('/') || self.artifact_bucket.starts_with("s3:") {
            return Err(format!(
                "ARTIFACT_BUCKET must be a bare bucket name, got {}",
                self.artifact_bucket
            ));
        }

        if self.command_timeout_secs == Some(0) {
            return Err("COMMAND_TIMEOUT_SECS must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Collaborator timeout, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl From<&Args> for ReleaseConfig {
    fn from(args: &Args) -> Self {
        Self {
            signing_profile: args.signing_profile.clone(),
            template_file: args.template_file.clone(),
            artifact_bucket: args.artifact_bucket.clone(),
            provenance: ProvenanceSource {
                repository: args.repository.clone(),
                commit_sha: args.git_sha.clone(),
                commit_tag: args.git_tag.clone(),
                commit_message: args.commit_message.clone(),
                commit_author: args.github_actor.clone(),
                release: args.version_number.clone(),
                merge_time: args.merge_time.clone(),
                skip_canary: args.skip_canary_deployment.clone(),
            },
            work_dir: args.work_dir.clone(),
            tagging_policy: args.tagging_policy,
        }
    }
}
