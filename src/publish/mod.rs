//! Release bundle publication.
//!
//! The packaged template is zipped into `template.zip` and uploaded to the
//! artifact bucket with release provenance attached at upload time. The object
//! does not exist remotely beforehand, so no separate metadata copy is needed.
//!
//! - [`archive`] - Single-entry zip creation
//! - [`checksum`] - SHA-256 of the bundle, logged and reported

mod archive;
mod checksum;

pub use checksum::calculate_sha256;

use crate::error::{ReleaseError, Result};
use crate::provenance::ProvenanceMetadata;
use crate::storage::{ObjectLocation, ObjectStore};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Object key (and local file name) of the release bundle.
pub const BUNDLE_NAME: &str = "template.zip";

/// A published release bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    /// Local archive that was uploaded
    pub archive: PathBuf,
    /// Remote bundle location
    pub destination: ObjectLocation,
    /// Archive size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive
    pub checksum: String,
}

/// Zips and uploads the packaged template.
#[derive(Debug)]
pub struct ArtifactPublisher<S> {
    store: S,
}

impl<S: ObjectStore> ArtifactPublisher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Publishes `template` to `s3://{bucket}/template.zip`.
    ///
    /// The archive is written next to the template.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::Publish`] naming the failed step (`archive` or
    /// `upload`). There is no partial success.
    pub async fn publish(
        &self,
        template: &Path,
        bucket: &str,
        metadata: &ProvenanceMetadata,
    ) -> Result<PublishResult> {
        let archive_path = template
            .parent()
            .map(|dir| dir.join(BUNDLE_NAME))
            .unwrap_or_else(|| PathBuf::from(BUNDLE_NAME));

        log::info!("Zipping {} into {}", template.display(), archive_path.display());
        let size = archive::create(template, &archive_path)
            .await
            .map_err(|e| publish_error("archive", e))?;
        let checksum = calculate_sha256(&archive_path)
            .await
            .map_err(|e| publish_error("archive", e))?;

        let destination = ObjectLocation::new(bucket, BUNDLE_NAME);
        log::info!("Uploading {destination} ({size} bytes, sha256 {checksum})");
        self.store
            .upload(&archive_path, &destination, metadata)
            .await
            .map_err(|e| publish_error("upload", e))?;

        Ok(PublishResult {
            archive: archive_path,
            destination,
            size,
            checksum,
        })
    }
}

fn publish_error(step: &'static str, error: impl std::fmt::Display) -> ReleaseError {
    ReleaseError::Publish {
        step,
        reason: error.to_string(),
    }
}
