//! Template document parsing.

use super::{Resource, ResourceKind, Template};
use crate::error::{ReleaseError, Result};
use serde_yaml_ng::{Mapping, Value};
use std::path::Path;

/// Parses template text (YAML or JSON) into a [`Template`].
///
/// Short-form intrinsic functions such as `!Ref` and `!GetAtt` are accepted
/// anywhere in the document; they only matter when they appear where a
/// resolved value is later required.
///
/// # Errors
///
/// [`ReleaseError::MalformedTemplate`] when the text is not a well-formed
/// document, a logical id repeats, or the `Resources` section does not have
/// the expected shape.
pub fn parse(text: &str) -> Result<Template> {
    let document: Value = serde_yaml_ng::from_str(text).map_err(|e| malformed(e.to_string()))?;

    let root = document
        .as_mapping()
        .ok_or_else(|| malformed("template root must be a mapping"))?;

    let resources = match root.get("Resources") {
        Some(Value::Mapping(resources)) => resources,
        Some(_) => return Err(malformed("Resources must be a mapping")),
        None => return Err(malformed("template has no Resources section")),
    };

    let resources = resources
        .iter()
        .map(|(id, body)| parse_resource(id, body))
        .collect::<Result<Vec<_>>>()?;

    Ok(Template::from_resources(resources))
}

/// Reads and parses the template at `path`.
pub async fn parse_file(path: &Path) -> Result<Template> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReleaseError::MalformedTemplate {
            path: Some(path.to_path_buf()),
            reason: format!("failed to read template: {e}"),
        })?;

    parse(&text).map_err(|e| match e {
        ReleaseError::MalformedTemplate { reason, .. } => ReleaseError::MalformedTemplate {
            path: Some(path.to_path_buf()),
            reason,
        },
        other => other,
    })
}

fn parse_resource(id: &Value, body: &Value) -> Result<Resource> {
    let logical_id = id
        .as_str()
        .ok_or_else(|| malformed(format!("resource id {id:?} is not a string")))?;

    let body = body
        .as_mapping()
        .ok_or_else(|| malformed(format!("resource {logical_id} must be a mapping")))?;

    let type_name = body
        .get("Type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("resource {logical_id} has no string Type")))?;

    let properties = match body.get("Properties") {
        Some(Value::Mapping(properties)) => properties.clone(),
        Some(Value::Null) | None => Mapping::new(),
        Some(_) => {
            return Err(malformed(format!(
                "Properties of resource {logical_id} must be a mapping"
            )));
        }
    };

    Ok(Resource::new(
        logical_id,
        ResourceKind::from_type(type_name),
        properties,
    ))
}

fn malformed(reason: impl Into<String>) -> ReleaseError {
    ReleaseError::MalformedTemplate {
        path: None,
        reason: reason.into(),
    }
}
