//! Provenance metadata sets.

use serde::{Serialize, Serializer};

/// Build and release facts supplied by the CI environment.
///
/// Values are attached verbatim; nothing here is computed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProvenanceSource {
    pub repository: String,
    pub commit_sha: String,
    pub commit_tag: String,
    pub commit_message: String,
    pub commit_author: String,
    /// Release version number
    pub release: String,
    pub merge_time: String,
    pub skip_canary: String,
}

/// Ordered key/value pairs attached to a storage object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceMetadata {
    entries: Vec<(&'static str, String)>,
}

impl ProvenanceMetadata {
    /// Keys of the per-artifact build provenance set, in order.
    pub const BUILD_KEYS: [&'static str; 6] = [
        "repository",
        "commitsha",
        "committag",
        "commitmessage",
        "commitauthor",
        "release",
    ];

    /// Keys the release bundle carries on top of [`Self::BUILD_KEYS`], in order.
    pub const RELEASE_EXTRA_KEYS: [&'static str; 3] = [
        "mergetime",
        "skipcanary",
        "codepipeline-artifact-revision-summary",
    ];

    /// Build provenance, applied to every function and layer artifact.
    pub fn build(source: &ProvenanceSource) -> Self {
        let values = [
            &source.repository,
            &source.commit_sha,
            &source.commit_tag,
            &source.commit_message,
            &source.commit_author,
            &source.release,
        ];

        Self {
            entries: Self::BUILD_KEYS
                .into_iter()
                .zip(values)
                .map(|(key, value)| (key, value.clone()))
                .collect(),
        }
    }

    /// Release provenance, applied once to the published bundle.
    ///
    /// The revision summary shown by the deployment pipeline is the release
    /// version.
    pub fn release(source: &ProvenanceSource) -> Self {
        let mut metadata = Self::build(source);
        let values = [&source.merge_time, &source.skip_canary, &source.release];
        metadata.entries.extend(
            Self::RELEASE_EXTRA_KEYS
                .into_iter()
                .zip(values)
                .map(|(key, value)| (key, value.clone())),
        );
        metadata
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comma-joined `key="value"` pairs, the shorthand the storage CLI's
    /// `--metadata` option takes.
    ///
    /// Values are double-quoted with `\` and `"` escaped, so commas and `=`
    /// inside a value stay part of it.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={}", quote(v)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl Serialize for ProvenanceMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
