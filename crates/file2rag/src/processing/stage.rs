//! Pipeline state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of one pipeline run.
///
/// `Start → Loaded → Normalized → Chunked → Embedded → Stored → Done`, with
/// `Failed` reachable from any stage and `Loaded → Done` taken when there is
/// nothing to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    Loaded,
    Normalized,
    Chunked,
    Embedded,
    Stored,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Loaded => "loaded",
            Self::Normalized => "normalized",
            Self::Chunked => "chunked",
            Self::Embedded => "embedded",
            Self::Stored => "stored",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Terminal stages end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
