//! SAM / CloudFormation template model.
//!
//! A [`Template`] is the ordered resource map of a template document. It is
//! produced once by [`parse`] and never mutated; packaging yields a new
//! document that is parsed into a new `Template`.
//!
//! - [`parser`] - Document text to [`Template`]
//! - [`scanner`] - Selection of signable resources

mod parser;
mod scanner;

pub use parser::{parse, parse_file};
pub use scanner::scan;

use serde::Serialize;
use serde_yaml_ng::{Mapping, Value};

/// Resource type string for SAM functions.
pub const FUNCTION_TYPE: &str = "AWS::Serverless::Function";

/// Resource type string for SAM layers.
pub const LAYER_VERSION_TYPE: &str = "AWS::Serverless::LayerVersion";

/// Kind of a template resource.
///
/// Only [`ResourceKind::Function`] and [`ResourceKind::LayerVersion`] take
/// part in signing and provenance tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `AWS::Serverless::Function`
    Function,
    /// `AWS::Serverless::LayerVersion`
    LayerVersion,
    /// Any other resource type, kept verbatim for diagnostics
    Other(String),
}

impl ResourceKind {
    /// Classifies a template `Type` string.
    pub fn from_type(type_name: &str) -> Self {
        match type_name {
            FUNCTION_TYPE => Self::Function,
            LAYER_VERSION_TYPE => Self::LayerVersion,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether resources of this kind carry a signable code artifact.
    pub fn is_signable(&self) -> bool {
        matches!(self, Self::Function | Self::LayerVersion)
    }

    /// Name of the property holding the artifact location, if this kind has one.
    pub fn location_property(&self) -> Option<&'static str> {
        match self {
            Self::Function => Some("CodeUri"),
            Self::LayerVersion => Some("ContentUri"),
            Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => f.write_str(FUNCTION_TYPE),
            Self::LayerVersion => f.write_str(LAYER_VERSION_TYPE),
            Self::Other(type_name) => f.write_str(type_name),
        }
    }
}

/// A single entry of the template's `Resources` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    logical_id: String,
    kind: ResourceKind,
    properties: Mapping,
}

impl Resource {
    /// Creates a resource from its parts.
    pub fn new(logical_id: impl Into<String>, kind: ResourceKind, properties: Mapping) -> Self {
        Self {
            logical_id: logical_id.into(),
            kind,
            properties,
        }
    }

    /// Logical id, unique within the template.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Resource kind.
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// The `Properties` mapping (empty when the resource declares none).
    pub fn properties(&self) -> &Mapping {
        &self.properties
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Value of `CodeUri` (functions) or `ContentUri` (layers).
    ///
    /// `None` for other kinds and for signable resources that do not set the
    /// property (for example image-based functions).
    pub fn artifact_location(&self) -> Option<&Value> {
        self.kind
            .location_property()
            .and_then(|name| self.property(name))
    }
}

/// Ordered resource map of a template document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    resources: Vec<Resource>,
}

impl Template {
    /// Builds a template from resources in document order.
    ///
    /// Callers are responsible for logical id uniqueness; [`parse`] guarantees it.
    pub(crate) fn from_resources(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// All resources in document order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Resource with the given logical id.
    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
