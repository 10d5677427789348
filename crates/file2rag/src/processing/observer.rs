//! Progress and timing observation for pipeline runs

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

use super::stage::PipelineStage;
use crate::error::Error;
use crate::types::SourceKind;

/// Counts and timing for one completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub source_kind: SourceKind,
    /// Raw documents produced by the loader
    pub documents: usize,
    pub chunks: usize,
    /// Vectors handed to the store, zero-vector substitutes included
    pub embeddings: usize,
    /// Chunks that received a zero vector
    pub embedding_failures: usize,
    pub elapsed: Duration,
}

/// Hook called by the pipeline as a run progresses.
///
/// Embedding failures are recovered with zero vectors and never fail the
/// run, so this hook is where they become visible.
pub trait PipelineObserver: Send + Sync {
    /// A stage was reached for `source`
    fn on_stage(&self, source: &str, stage: PipelineStage);

    /// Chunk `index` of `source` was given a zero vector
    fn on_embedding_failure(&self, source: &str, index: usize, error: &Error);

    /// A run finished with a stored batch
    fn on_complete(&self, report: &IngestReport);
}

/// Forwards observations to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_stage(&self, source: &str, stage: PipelineStage) {
        tracing::debug!(source, stage = %stage, "Pipeline stage");
    }

    fn on_embedding_failure(&self, source: &str, index: usize, error: &Error) {
        tracing::warn!(source, chunk = index, error = %error, "Chunk stored with zero vector");
    }

    fn on_complete(&self, report: &IngestReport) {
        tracing::info!(
            source = %report.source,
            kind = %report.source_kind,
            documents = report.documents,
            chunks = report.chunks,
            embeddings = report.embeddings,
            embedding_failures = report.embedding_failures,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Ingestion complete"
        );
    }
}

/// Keeps every observation in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    stages: Vec<(String, PipelineStage)>,
    failures: Vec<(String, usize)>,
    reports: Vec<IngestReport>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages reached for `source`, in order
    pub fn stages_for(&self, source: &str) -> Vec<PipelineStage> {
        self.inner
            .lock()
            .stages
            .iter()
            .filter(|(s, _)| s == source)
            .map(|(_, stage)| *stage)
            .collect()
    }

    /// `(source, chunk index)` of every zero-vector substitution
    pub fn embedding_failures(&self) -> Vec<(String, usize)> {
        self.inner.lock().failures.clone()
    }

    pub fn reports(&self) -> Vec<IngestReport> {
        self.inner.lock().reports.clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_stage(&self, source: &str, stage: PipelineStage) {
        self.inner.lock().stages.push((source.to_string(), stage));
    }

    fn on_embedding_failure(&self, source: &str, index: usize, _error: &Error) {
        self.inner.lock().failures.push((source.to_string(), index));
    }

    fn on_complete(&self, report: &IngestReport) {
        self.inner.lock().reports.push(report.clone());
    }
}
