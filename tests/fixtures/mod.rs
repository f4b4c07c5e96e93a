//! Shared fakes and fixtures for pipeline tests.
//!
//! - [`FakeSam`] stands in for the packaging tool and writes a canned
//!   packaged template where `--output-template-file` points
//! - [`MemoryStore`] keeps object metadata in memory so tagging can be read
//!   back

#![allow(dead_code)]

use sam_release_pipeline::error::{CliError, Result};
use sam_release_pipeline::process::{CommandOutput, CommandRunner, Invocation};
use sam_release_pipeline::provenance::{ProvenanceMetadata, ProvenanceSource, TaggingPolicy};
use sam_release_pipeline::storage::{ObjectLocation, ObjectStore};
use sam_release_pipeline::ReleaseConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Path to a template fixture
pub fn template_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/templates")
        .join(name)
}

/// Contents of a template fixture
pub fn template_text(name: &str) -> String {
    std::fs::read_to_string(template_path(name)).unwrap()
}

/// Provenance values used across tests
pub fn provenance() -> ProvenanceSource {
    ProvenanceSource {
        repository: "acme/orders-service".into(),
        commit_sha: "9fceb02d0ae598e95dc970b74767f19372d61af8".into(),
        commit_tag: "v2.3.0".into(),
        commit_message: "Add refunds endpoint".into(),
        commit_author: "octocat".into(),
        release: "2.3.0".into(),
        merge_time: "2024-05-01T10:00:00Z".into(),
        skip_canary: "false".into(),
    }
}

/// Release configuration for `template` writing into `work_dir`
pub fn config(template: &str, work_dir: &Path, policy: TaggingPolicy) -> ReleaseConfig {
    ReleaseConfig {
        signing_profile: "Prof1".into(),
        template_file: template_path(template),
        artifact_bucket: "release-artifacts".into(),
        provenance: provenance(),
        work_dir: work_dir.to_path_buf(),
        tagging_policy: policy,
    }
}

/// Packaging tool double.
pub struct FakeSam {
    packaged_template: Option<String>,
    exit_code: i32,
    invocations: Mutex<Vec<Invocation>>,
}

impl FakeSam {
    /// Succeeds and writes `packaged_template` as the output template.
    pub fn writing(packaged_template: impl Into<String>) -> Self {
        Self {
            packaged_template: Some(packaged_template.into()),
            exit_code: 0,
            invocations: Mutex::default(),
        }
    }

    /// Exits with `exit_code` without writing anything.
    pub fn failing(exit_code: i32) -> Self {
        Self {
            packaged_template: None,
            exit_code,
            invocations: Mutex::default(),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeSam {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());

        if self.exit_code != 0 {
            return Ok(CommandOutput::failure(
                self.exit_code,
                "Error: Unable to upload artifact orders/ referenced by CodeUri",
            ));
        }

        if let (Some(output), Some(contents)) = (
            invocation.flag_value("--output-template-file"),
            &self.packaged_template,
        ) {
            std::fs::write(output, contents)?;
        }
        Ok(CommandOutput::success("Successfully packaged artifacts"))
    }
}

/// A recorded upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub source: PathBuf,
    pub destination: ObjectLocation,
    pub metadata: Vec<(String, String)>,
}

/// In-memory object store.
///
/// Metadata replacement only succeeds for objects that exist, like a real
/// bucket, and can be made to fail for chosen locations.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<ObjectLocation, Vec<(String, String)>>>,
    failing: BTreeSet<ObjectLocation>,
    metadata_writes: Mutex<Vec<ObjectLocation>>,
    uploads: Mutex<Vec<Upload>>,
    fail_uploads: bool,
}

impl MemoryStore {
    /// Store holding `locations`, with no metadata yet.
    pub fn with_objects<'a>(locations: impl IntoIterator<Item = &'a str>) -> Self {
        let objects = locations
            .into_iter()
            .map(|uri| (ObjectLocation::parse_uri(uri).unwrap(), Vec::new()))
            .collect();
        Self {
            objects: Mutex::new(objects),
            ..Default::default()
        }
    }

    /// Makes metadata writes to `uri` fail.
    pub fn failing_on(mut self, uri: &str) -> Self {
        self.failing.insert(ObjectLocation::parse_uri(uri).unwrap());
        self
    }

    /// Makes every upload fail.
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Current metadata of the object at `uri`.
    pub fn metadata_of(&self, uri: &str) -> Option<Vec<(String, String)>> {
        let location = ObjectLocation::parse_uri(uri).unwrap();
        self.objects.lock().unwrap().get(&location).cloned()
    }

    /// Every attempted metadata write, in order.
    pub fn metadata_writes(&self) -> Vec<ObjectLocation> {
        self.metadata_writes.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

fn owned(metadata: &ProvenanceMetadata) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl ObjectStore for MemoryStore {
    async fn replace_metadata(
        &self,
        location: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Result<()> {
        self.metadata_writes.lock().unwrap().push(location.clone());

        if self.failing.contains(location) {
            return Err(CliError::ExecutionFailed {
                command: format!("copy {location}"),
                reason: "An error occurred (AccessDenied) when calling the CopyObject operation"
                    .into(),
            }
            .into());
        }

        let mut objects = self.objects.lock().unwrap();
        match objects.get_mut(location) {
            Some(existing) => {
                *existing = owned(metadata);
                Ok(())
            }
            None => Err(CliError::ExecutionFailed {
                command: format!("copy {location}"),
                reason: "An error occurred (404) when calling the HeadObject operation: Not Found"
                    .into(),
            }
            .into()),
        }
    }

    async fn upload(
        &self,
        source: &Path,
        destination: &ObjectLocation,
        metadata: &ProvenanceMetadata,
    ) -> Result<()> {
        if self.fail_uploads {
            return Err(CliError::ExecutionFailed {
                command: format!("upload {}", source.display()),
                reason: "An error occurred (AccessDenied) when calling the PutObject operation"
                    .into(),
            }
            .into());
        }

        self.uploads.lock().unwrap().push(Upload {
            source: source.to_path_buf(),
            destination: destination.clone(),
            metadata: owned(metadata),
        });
        self.objects
            .lock()
            .unwrap()
            .insert(destination.clone(), owned(metadata));
        Ok(())
    }
}
