//! Provenance tagging of packaged artifacts.

use super::{ProvenanceMetadata, TaggingReport, TagOutcome, TagRecord};
use crate::storage::{ObjectLocation, ObjectStore};
use crate::template::{Resource, Template, scan};

/// Stamps build provenance onto every function and layer artifact of a
/// packaged template.
#[derive(Debug)]
pub struct ProvenanceTagger<S> {
    store: S,
}

impl<S: ObjectStore> ProvenanceTagger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Tags every artifact referenced by `template` with `metadata`.
    ///
    /// Each resource is attempted regardless of earlier failures; the
    /// returned report holds one record per scanned resource, in scan order.
    /// Whether failures are fatal is the caller's decision (see
    /// [`super::TaggingPolicy`]).
    pub async fn tag(&self, template: &Template, metadata: &ProvenanceMetadata) -> TaggingReport {
        let resources = scan(template);
        log::info!("Writing provenance to {} artifact(s)", resources.len());

        let mut records = Vec::with_capacity(resources.len());
        for resource in resources {
            records.push(self.tag_resource(resource, metadata).await);
        }

        TaggingReport::new(records)
    }

    async fn tag_resource(&self, resource: &Resource, metadata: &ProvenanceMetadata) -> TagRecord {
        let logical_id = resource.logical_id().to_string();
        let kind = resource.kind().clone();

        let location = match resolve_location(resource) {
            Ok(location) => location,
            Err(reason) => {
                log::warn!("Cannot tag {logical_id}: {reason}");
                return TagRecord {
                    logical_id,
                    kind,
                    location: None,
                    outcome: TagOutcome::Failed { reason },
                };
            }
        };

        log::info!("Tagging {logical_id} ({kind}) at {location}");
        let outcome = match self.store.replace_metadata(&location, metadata).await {
            Ok(()) => TagOutcome::Tagged,
            Err(e) => {
                log::warn!("Tagging {logical_id} at {location} failed: {e}");
                TagOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        TagRecord {
            logical_id,
            kind,
            location: Some(location),
            outcome,
        }
    }
}

fn resolve_location(resource: &Resource) -> Result<ObjectLocation, String> {
    let property = resource
        .kind()
        .location_property()
        .ok_or_else(|| format!("{} has no artifact location", resource.kind()))?;

    let value = resource
        .property(property)
        .ok_or_else(|| format!("{property} is not set"))?;

    ObjectLocation::from_property(value).map_err(|e| format!("{property}: {e}"))
}
