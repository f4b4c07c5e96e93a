//! Signing profile assignment.
//!
//! Every function and layer in the source template is signed with the same
//! configured profile. The assignment is rendered into the value of the
//! packaging tool's `--signing-profiles` option; an empty assignment renders to
//! nothing so the option is left off entirely.

use crate::template::Resource;
use serde::{Serialize, Serializer};

/// Mapping from logical resource id to signing profile name, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningProfileAssignment {
    entries: Vec<(String, String)>,
}

impl SigningProfileAssignment {
    /// Profile assigned to `logical_id`, if any.
    pub fn get(&self, logical_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, profile)| profile.as_str())
    }

    /// `(logical_id, profile)` pairs in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, profile)| (id.as_str(), profile.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the `--signing-profiles` value, `"{id}={profile} "` per entry.
    ///
    /// Returns `None` for an empty assignment: the packaging call must then
    /// omit the option rather than pass a blank value.
    pub fn to_invocation_argument(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        Some(
            self.entries
                .iter()
                .map(|(id, profile)| format!("{id}={profile} "))
                .collect(),
        )
    }
}

impl Serialize for SigningProfileAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Assigns `profile_name` to each scanned resource.
pub fn resolve(resources: &[&Resource], profile_name: &str) -> SigningProfileAssignment {
    let entries = resources
        .iter()
        .map(|resource| (resource.logical_id().to_string(), profile_name.to_string()))
        .collect();

    SigningProfileAssignment { entries }
}
