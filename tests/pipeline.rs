//! End-to-end pipeline tests against a fake packaging tool and an in-memory
//! object store.

mod fixtures;

use fixtures::{FakeSam, MemoryStore, config, provenance, template_text};
use sam_release_pipeline::pipeline::{PipelineStage, ReleasePipeline};
use sam_release_pipeline::provenance::{
    ProvenanceMetadata, ProvenanceTagger, TagOutcome, TaggingPolicy,
};
use sam_release_pipeline::storage::ObjectLocation;
use sam_release_pipeline::template;
use sam_release_pipeline::ReleaseError;
use std::fs::File;
use tempfile::TempDir;

const FUNCTION_URI: &str = "s3://release-artifacts/5b7f2e0c1d3a4b69a8e1f0c2d4e6a8b0";
const LAYER_URI: &str = "s3://release-artifacts/9c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f";

fn build_keys() -> Vec<String> {
    ProvenanceMetadata::BUILD_KEYS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn keys(metadata: &[(String, String)]) -> Vec<String> {
    metadata.iter().map(|(k, _)| k.clone()).collect()
}

// =============================================================================
// Signing decisions
// =============================================================================

#[tokio::test]
async fn single_function_is_packaged_with_its_signing_profile() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("single_function.yaml"));
    let store = MemoryStore::with_objects(["s3://bucket/fn.zip"]);

    let mut pipeline = ReleasePipeline::new(
        config("single_function.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let summary = pipeline.run().await.unwrap();

    let assignment = summary.signing_profiles.unwrap();
    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment.get("fn"), Some("Prof1"));
    assert_eq!(assignment.to_invocation_argument().as_deref(), Some("fn=Prof1 "));

    let invocations = sam.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].program(), "sam");
    assert_eq!(
        invocations[0].flag_value("--signing-profiles"),
        Some("fn=Prof1 ")
    );
    assert_eq!(
        invocations[0].flag_value("--s3-bucket"),
        Some("release-artifacts")
    );
    assert_eq!(
        invocations[0].flag_value("--output-template-file"),
        Some(work.path().join("cf-template.yaml").to_str().unwrap())
    );

    assert_eq!(pipeline.stage(), PipelineStage::Published);
}

#[tokio::test]
async fn template_without_code_skips_signing_and_tagging() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("no_code.yaml"));
    let store = MemoryStore::default();

    let mut pipeline = ReleasePipeline::new(
        config("no_code.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let summary = pipeline.run().await.unwrap();

    assert!(summary.signing_profiles.unwrap().is_empty());
    let invocation = &sam.invocations()[0];
    assert!(!invocation.has_flag("--signing-profiles"));
    assert!(
        invocation
            .get_args()
            .iter()
            .all(|arg| !arg.trim().is_empty())
    );

    let report = summary.tagging.unwrap();
    assert_eq!(report.attempted(), 0);
    assert!(report.is_complete());
    assert!(store.metadata_writes().is_empty());

    assert_eq!(store.uploads().len(), 1);
    assert_eq!(summary.stage, PipelineStage::Published);
}

// =============================================================================
// Provenance tagging
// =============================================================================

#[tokio::test]
async fn function_and_layer_get_identical_provenance() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("function_and_layer.packaged.yaml"));
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);

    let mut pipeline = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let summary = pipeline.run().await.unwrap();

    assert_eq!(
        summary
            .signing_profiles
            .unwrap()
            .to_invocation_argument()
            .as_deref(),
        Some("OrdersFunction=Prof1 DepsLayer=Prof1 ")
    );

    assert_eq!(
        store.metadata_writes(),
        [
            ObjectLocation::parse_uri(FUNCTION_URI).unwrap(),
            ObjectLocation::parse_uri(LAYER_URI).unwrap(),
        ]
    );

    let function_metadata = store.metadata_of(FUNCTION_URI).unwrap();
    let layer_metadata = store.metadata_of(LAYER_URI).unwrap();
    assert_eq!(function_metadata, layer_metadata);

    let report = summary.tagging.unwrap();
    assert_eq!(report.succeeded(), 2);
    let ids: Vec<_> = report
        .records()
        .iter()
        .map(|r| r.logical_id.as_str())
        .collect();
    assert_eq!(ids, ["OrdersFunction", "DepsLayer"]);
}

#[tokio::test]
async fn tagged_metadata_reads_back_as_the_six_build_keys() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("function_and_layer.packaged.yaml"));
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);

    ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    )
    .run()
    .await
    .unwrap();

    let source = provenance();
    let metadata = store.metadata_of(FUNCTION_URI).unwrap();
    assert_eq!(keys(&metadata), build_keys());
    assert_eq!(
        metadata,
        [
            ("repository".to_string(), source.repository),
            ("commitsha".to_string(), source.commit_sha),
            ("committag".to_string(), source.commit_tag),
            ("commitmessage".to_string(), source.commit_message),
            ("commitauthor".to_string(), source.commit_author),
            ("release".to_string(), source.release),
        ]
    );
}

#[tokio::test]
async fn tagging_twice_leaves_metadata_unchanged() {
    let packaged = template::parse(&template_text("function_and_layer.packaged.yaml")).unwrap();
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);
    let tagger = ProvenanceTagger::new(&store);
    let metadata = ProvenanceMetadata::build(&provenance());

    let first = tagger.tag(&packaged, &metadata).await;
    let after_first = store.metadata_of(FUNCTION_URI);

    let second = tagger.tag(&packaged, &metadata).await;
    let after_second = store.metadata_of(FUNCTION_URI);

    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
    assert_eq!(store.metadata_of(LAYER_URI), after_second);
}

#[tokio::test]
async fn one_failed_artifact_does_not_stop_the_others() {
    let packaged = template::parse(&template_text("function_and_layer.packaged.yaml")).unwrap();
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]).failing_on(FUNCTION_URI);

    let report = ProvenanceTagger::new(&store)
        .tag(&packaged, &ProvenanceMetadata::build(&provenance()))
        .await;

    assert_eq!(store.metadata_writes().len(), 2);
    assert_eq!(report.attempted(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed_ids(), ["OrdersFunction"]);

    match &report.records()[0].outcome {
        TagOutcome::Failed { reason } => assert!(reason.contains("AccessDenied")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.records()[1].outcome, TagOutcome::Tagged);
    assert_eq!(keys(&store.metadata_of(LAYER_URI).unwrap()), build_keys());
    assert!(store.metadata_of(FUNCTION_URI).unwrap().is_empty());
}

#[tokio::test]
async fn strict_policy_fails_the_release_after_attempting_everything() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("function_and_layer.packaged.yaml"));
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]).failing_on(FUNCTION_URI);

    let mut pipeline = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let err = pipeline.run().await.unwrap_err();

    match err {
        ReleaseError::TaggingIncomplete { attempted, failed } => {
            assert_eq!(attempted, 2);
            assert_eq!(failed, ["OrdersFunction"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.metadata_writes().len(), 2);
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert!(store.uploads().is_empty());

    let summary = pipeline.summary();
    assert_eq!(summary.tagging.as_ref().unwrap().succeeded(), 1);
    assert!(summary.error.as_deref().unwrap().starts_with("tag stage:"));
}

#[tokio::test]
async fn best_effort_policy_publishes_despite_untagged_artifacts() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("function_and_layer.packaged.yaml"));
    // The layer object is missing from the bucket, so its tag fails.
    let store = MemoryStore::with_objects([FUNCTION_URI]);

    let mut pipeline = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::BestEffort),
        &sam,
        &store,
    );
    let summary = pipeline.run().await.unwrap();

    let report = summary.tagging.unwrap();
    assert_eq!(report.failed_ids(), ["DepsLayer"]);
    assert_eq!(summary.stage, PipelineStage::Published);
    assert_eq!(store.uploads().len(), 1);
}

// =============================================================================
// Fatal stages
// =============================================================================

#[tokio::test]
async fn packaging_failure_stops_before_tagging() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::failing(1);
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);

    let mut pipeline = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let err = pipeline.run().await.unwrap_err();

    match &err {
        ReleaseError::Packaging { command, reason } => {
            assert!(command.contains("--signing-profiles"));
            assert!(reason.contains("Unable to upload artifact"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert!(pipeline.summary().signing_profiles.is_some());
    assert!(pipeline.summary().tagging.is_none());
    assert!(store.metadata_writes().is_empty());
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn malformed_source_template_never_reaches_packaging() {
    let work = TempDir::new().unwrap();
    let template = work.path().join("broken.yaml");
    std::fs::write(&template, "Resources:\n  Fn: [not, a, mapping]\n").unwrap();

    let sam = FakeSam::writing("Resources: {}\n");
    let store = MemoryStore::default();
    let mut release = config("no_code.yaml", work.path(), TaggingPolicy::Strict);
    release.template_file = template.clone();

    let mut pipeline = ReleasePipeline::new(release, &sam, &store);
    let err = pipeline.run().await.unwrap_err();

    assert!(
        matches!(err, ReleaseError::MalformedTemplate { path: Some(ref p), .. } if *p == template)
    );
    assert!(sam.invocations().is_empty());
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
}

#[tokio::test]
async fn pipeline_runs_only_once() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("no_code.yaml"));
    let store = MemoryStore::default();

    let mut pipeline = ReleasePipeline::new(
        config("no_code.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    pipeline.run().await.unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, ReleaseError::AlreadyRan { ref stage } if stage == "published"));
    assert!(!err.to_string().contains("argument"));
    assert_eq!(sam.invocations().len(), 1);
    assert_eq!(pipeline.stage(), PipelineStage::Published);
}

#[tokio::test]
async fn unreadable_packaging_output_fails_the_package_stage() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing("Outputs: {}\n");
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);

    let mut pipeline = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let err = pipeline.run().await.unwrap_err();

    match &err {
        ReleaseError::MalformedPackagedTemplate { path, reason } => {
            assert_eq!(*path, work.path().join("cf-template.yaml"));
            assert!(reason.contains("no Resources section"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.stage(), "package");
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert!(
        pipeline
            .summary()
            .error
            .as_deref()
            .unwrap()
            .starts_with("package stage:")
    );
    assert!(store.metadata_writes().is_empty());
    assert!(store.uploads().is_empty());
}

// =============================================================================
// Publishing
// =============================================================================

#[tokio::test]
async fn bundle_is_uploaded_with_release_provenance() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("function_and_layer.packaged.yaml"));
    let store = MemoryStore::with_objects([FUNCTION_URI, LAYER_URI]);

    let summary = ReleasePipeline::new(
        config("function_and_layer.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    )
    .run()
    .await
    .unwrap();

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.destination.uri(), "s3://release-artifacts/template.zip");
    assert_eq!(upload.source, work.path().join("template.zip"));

    let mut expected_keys = build_keys();
    expected_keys.extend(
        ProvenanceMetadata::RELEASE_EXTRA_KEYS
            .iter()
            .map(|k| k.to_string()),
    );
    assert_eq!(keys(&upload.metadata), expected_keys);
    assert!(
        upload
            .metadata
            .contains(&("codepipeline-artifact-revision-summary".into(), "2.3.0".into()))
    );
    assert!(upload.metadata.contains(&("skipcanary".into(), "false".into())));

    let mut archive = zip::ZipArchive::new(File::open(&upload.source).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).unwrap().name(), "cf-template.yaml");

    let published = summary.published.unwrap();
    assert_eq!(published.checksum.len(), 64);
    assert_eq!(
        published.checksum,
        sam_release_pipeline::publish::calculate_sha256(&upload.source)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn upload_failure_is_fatal() {
    let work = TempDir::new().unwrap();
    let sam = FakeSam::writing(template_text("no_code.yaml"));
    let store = MemoryStore::default().failing_uploads();

    let mut pipeline = ReleasePipeline::new(
        config("no_code.yaml", work.path(), TaggingPolicy::Strict),
        &sam,
        &store,
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, ReleaseError::Publish { step: "upload", .. }));
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert!(pipeline.summary().published.is_none());
}
