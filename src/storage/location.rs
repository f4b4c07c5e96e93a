//! Resolved artifact locations.

use serde::Serialize;
use serde_yaml_ng::Value;
use thiserror::Error;
use url::Url;

/// Why a template value is not a usable object reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// A string that is not an `s3://bucket/key` URI (typically a local path
    /// the packaging step did not rewrite)
    #[error("{value:?} is not an s3://bucket/key reference")]
    NotRemote {
        /// Offending value
        value: String,
    },

    /// A `{ Bucket, Key }` mapping missing either field as a plain string
    #[error("location mapping needs string Bucket and Key fields")]
    IncompleteMapping,

    /// Any other YAML value, such as an unresolved intrinsic function
    #[error("unsupported location value: {0}")]
    Unsupported(String),
}

/// A remote object reference, `s3://{bucket}/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectLocation {
    bucket: String,
    key: String,
}

impl ObjectLocation {
    /// Creates a location from bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an `s3://bucket/key` URI.
    ///
    /// The key is taken verbatim; it is not percent-decoded.
    pub fn parse_uri(uri: &str) -> Result<Self, LocationError> {
        let not_remote = || LocationError::NotRemote {
            value: uri.to_string(),
        };

        let url = Url::parse(uri).map_err(|_| not_remote())?;
        if url.scheme() != "s3" {
            return Err(not_remote());
        }
        let bucket = url.host_str().filter(|b| !b.is_empty()).ok_or_else(not_remote)?;

        let key = uri
            .strip_prefix("s3://")
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, key)| key)
            .filter(|key| !key.is_empty())
            .ok_or_else(not_remote)?;

        Ok(Self::new(bucket, key))
    }

    /// Reads a `CodeUri`/`ContentUri` value from a packaged template.
    ///
    /// Accepts either a URI string or the `{ Bucket, Key }` mapping form
    /// (an optional `Version` is ignored).
    pub fn from_property(value: &Value) -> Result<Self, LocationError> {
        match value {
            Value::String(uri) => Self::parse_uri(uri),
            Value::Mapping(mapping) => {
                let bucket = mapping.get("Bucket").and_then(Value::as_str);
                let key = mapping.get("Key").and_then(Value::as_str);
                match (bucket, key) {
                    (Some(bucket), Some(key)) if !bucket.is_empty() && !key.is_empty() => {
                        Ok(Self::new(bucket, key))
                    }
                    _ => Err(LocationError::IncompleteMapping),
                }
            }
            other => Err(LocationError::Unsupported(
                serde_yaml_ng::to_string(other)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| format!("{other:?}")),
            )),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The `s3://bucket/key` form.
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
