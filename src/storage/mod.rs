//! Remote object storage.
//!
//! - [`location`] - [`ObjectLocation`], a resolved `s3://bucket/key` reference
//! - [`aws_cli`] - [`AwsCliStore`], storage operations through the AWS CLI

mod aws_cli;
mod location;

pub use aws_cli::AwsCliStore;
pub use location::{LocationError, ObjectLocation};

use crate::error::Result;
use crate::provenance::ProvenanceMetadata;
use std::future::Future;
use std::path::Path;

/// Storage operations the pipeline performs on artifacts.
pub trait ObjectStore {
    /// Overwrites the user metadata of an existing object in place.
    ///
    /// The object is copied onto itself with `metadata` replacing whatever
    /// was there; object data is not transferred. Applying the same metadata
    /// twice leaves the object unchanged.
    fn replace_metadata(
        &self,
        location: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Uploads a local file with `metadata` attached at creation time.
    fn upload(
        &self,
        source: &Path,
        destination: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<S: ObjectStore + Sync> ObjectStore for &S {
    fn replace_metadata(
        &self,
        location: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).replace_metadata(location, metadata)
    }

    fn upload(
        &self,
        source: &Path,
        destination: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).upload(source, destination, metadata)
    }
}
