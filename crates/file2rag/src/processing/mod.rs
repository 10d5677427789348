//! Pipeline orchestration with stage tracking and progress observation

mod observer;
mod pipeline;
mod stage;

pub use observer::{IngestReport, PipelineObserver, RecordingObserver, TracingObserver};
pub use pipeline::{IngestOutcome, IngestPipeline, IngestPipelineBuilder};
pub use stage::PipelineStage;
