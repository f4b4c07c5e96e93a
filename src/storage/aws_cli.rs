//! Storage operations through the AWS CLI.

use super::{ObjectLocation, ObjectStore};
use crate::error::{CliError, Result};
use crate::process::{CommandRunner, Invocation};
use crate::provenance::ProvenanceMetadata;
use std::path::Path;

/// [`ObjectStore`] that shells out to `aws s3 cp`.
#[derive(Debug, Clone)]
pub struct AwsCliStore<R> {
    runner: R,
    aws_bin: String,
}

impl<R: CommandRunner> AwsCliStore<R> {
    /// Creates a store running `aws_bin` through `runner`.
    pub fn new(runner: R, aws_bin: impl Into<String>) -> Self {
        Self {
            runner,
            aws_bin: aws_bin.into(),
        }
    }

    /// `aws s3 cp <uri> <uri> --metadata <pairs> --metadata-directive REPLACE`
    pub fn replace_metadata_invocation(
        &self,
        location: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Invocation {
        let uri = location.uri();
        Invocation::new(&self.aws_bin)
            .args(["s3", "cp"])
            .arg(uri.clone())
            .arg(uri)
            .arg("--metadata")
            .arg(metadata.render())
            .args(["--metadata-directive", "REPLACE"])
    }

    /// `aws s3 cp <file> <uri> --metadata <pairs>`
    pub fn upload_invocation(
        &self,
        source: &Path,
        destination: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Invocation {
        Invocation::new(&self.aws_bin)
            .args(["s3", "cp"])
            .arg(source.to_string_lossy())
            .arg(destination.uri())
            .arg("--metadata")
            .arg(metadata.render())
    }

    async fn execute(&self, invocation: Invocation) -> Result<()> {
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| CliError::ExecutionFailed {
                command: invocation.to_string(),
                reason: e.to_string(),
            })?;

        if output.is_success() {
            Ok(())
        } else {
            Err(CliError::ExecutionFailed {
                command: invocation.to_string(),
                reason: output.failure_reason(),
            }
            .into())
        }
    }
}

impl<R: CommandRunner + Sync> ObjectStore for AwsCliStore<R> {
    async fn replace_metadata(
        &self,
        location: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Result<()> {
        self.execute(self.replace_metadata_invocation(location, metadata))
            .await
    }

    async fn upload(
        &self,
        source: &Path,
        destination: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Result<()> {
        self.execute(self.upload_invocation(source, destination, metadata))
            .await
    }
}
