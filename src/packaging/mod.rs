//! Packaging and signing through `sam package`.
//!
//! The packaging tool uploads local code artifacts to the artifact bucket,
//! signs them when signing profiles are given, and writes a transformed
//! template whose `CodeUri`/`ContentUri` values point at the uploaded objects.

use crate::error::{ReleaseError, Result};
use crate::process::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};

/// File name of the transformed template written by packaging.
pub const PACKAGED_TEMPLATE_NAME: &str = "cf-template.yaml";

/// What to package and where the result goes.
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    /// Source template
    pub template: &'a Path,
    /// Bucket artifacts are uploaded to
    pub bucket: &'a str,
    /// Rendered `--signing-profiles` value; `None` leaves the option off
    pub signing_profiles: Option<&'a str>,
    /// Where the transformed template is written
    pub output_template: &'a Path,
}

/// Runs the packaging tool.
#[derive(Debug, Clone)]
pub struct Packager<R> {
    runner: R,
    sam_bin: String,
}

impl<R: CommandRunner> Packager<R> {
    pub fn new(runner: R, sam_bin: impl Into<String>) -> Self {
        Self {
            runner,
            sam_bin: sam_bin.into(),
        }
    }

    /// Builds the packaging command line.
    ///
    /// The two shapes differ only in whether `--signing-profiles` is present
    /// at all; an empty value is never passed.
    pub fn invocation(&self, request: &PackageRequest<'_>) -> Invocation {
        let invocation = Invocation::new(&self.sam_bin)
            .arg("package")
            .arg("--s3-bucket")
            .arg(request.bucket)
            .arg("--template-file")
            .arg(request.template.to_string_lossy())
            .arg("--output-template-file")
            .arg(request.output_template.to_string_lossy());

        match request.signing_profiles {
            Some(profiles) => invocation.arg("--signing-profiles").arg(profiles),
            None => invocation,
        }
    }

    /// Packages `request.template` and returns the path of the transformed
    /// template.
    ///
    /// # Errors
    ///
    /// [`ReleaseError::Packaging`] when the tool cannot be started, exits
    /// non-zero, or reports success without writing the output template.
    pub async fn package(&self, request: &PackageRequest<'_>) -> Result<PathBuf> {
        let invocation = self.invocation(request);
        match request.signing_profiles {
            Some(profiles) => log::info!("Signing and packaging with profiles: {}", profiles.trim_end()),
            None => log::info!("No signable resources, packaging without signing"),
        }

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| ReleaseError::Packaging {
                command: invocation.to_string(),
                reason: e.to_string(),
            })?;

        if !output.is_success() {
            return Err(ReleaseError::Packaging {
                command: invocation.to_string(),
                reason: output.failure_reason(),
            });
        }

        let exists = tokio::fs::try_exists(request.output_template)
            .await
            .unwrap_or(false);
        if !exists {
            return Err(ReleaseError::Packaging {
                command: invocation.to_string(),
                reason: format!(
                    "packaging succeeded but {} was not written",
                    request.output_template.display()
                ),
            });
        }

        Ok(request.output_template.to_path_buf())
    }
}
