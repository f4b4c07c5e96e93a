//! Pipeline state machine.

use serde::Serialize;

/// Stage a release run has reached.
///
/// `Init -> Scanned -> Resolved -> Packaged -> Tagged -> Published`, with
/// `Failed` reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    /// Source template parsed and scanned
    Scanned,
    /// Signing profiles assigned
    Resolved,
    /// Packaging finished and its output parsed
    Packaged,
    /// Artifacts tagged (or failures accepted by policy)
    Tagged,
    /// Bundle uploaded
    Published,
    Failed,
}

impl PipelineStage {
    /// Successor on the success path; `None` for terminal stages.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Scanned),
            Self::Scanned => Some(Self::Resolved),
            Self::Resolved => Some(Self::Packaged),
            Self::Packaged => Some(Self::Tagged),
            Self::Tagged => Some(Self::Published),
            Self::Published | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Scanned => "scanned",
            Self::Resolved => "resolved",
            Self::Packaged => "packaged",
            Self::Tagged => "tagged",
            Self::Published => "published",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
