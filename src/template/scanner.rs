//! Selection of signable resources.

use super::{Resource, Template};

/// Returns every function and layer resource in document order.
///
/// An empty result is the normal outcome for templates without code
/// artifacts, not an error.
pub fn scan(template: &Template) -> Vec<&Resource> {
    let resources: Vec<&Resource> = template
        .resources()
        .iter()
        .filter(|resource| resource.kind().is_signable())
        .collect();

    log::debug!(
        "Scanned {} resource(s), {} signable",
        template.len(),
        resources.len()
    );

    resources
}
