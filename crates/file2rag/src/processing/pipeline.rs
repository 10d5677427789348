//! Pipeline orchestrator: load → normalize → chunk → embed → store

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use super::observer::{IngestReport, PipelineObserver, TracingObserver};
use super::stage::PipelineStage;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::ingestion::{ChunkStrategy, Chunker, LoaderGateway, WhitespaceNormalizer};
use crate::providers::{
    embed_best_effort, embedder_from_config, vector_store_from_config, EmbeddingProvider,
    VectorStoreProvider,
};
use crate::types::{DocumentHandle, EmbeddedChunk};

/// Result of a run that stored something
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub handle: DocumentHandle,
    pub report: IngestReport,
}

/// Runs one source end to end.
///
/// Holds no per-run state, so one pipeline can serve concurrent runs.
pub struct IngestPipeline {
    config: IngestConfig,
    loader: LoaderGateway,
    normalizer: WhitespaceNormalizer,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    observer: Arc<dyn PipelineObserver>,
}

/// Assembles an [`IngestPipeline`]; collaborators left unset are built
/// from the configuration
pub struct IngestPipelineBuilder {
    config: IngestConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStoreProvider>>,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl IngestPipelineBuilder {
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn vector_store(mut self, store: Arc<dyn VectorStoreProvider>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<IngestPipeline> {
        let config = self.config;
        config.validate_without_embeddings()?;

        // The embeddings section only matters when it is used to build the embedder
        let embedder = match self.embedder {
            Some(embedder) => embedder,
            None => {
                config.embeddings.validate()?;
                embedder_from_config(&config.embeddings)?
            }
        };
        let store = match self.store {
            Some(store) => store,
            None => vector_store_from_config(&config.vector_store)?,
        };

        if embedder.dimensions() != config.vector_store.dimensions {
            tracing::warn!(
                embedder = embedder.name(),
                embedder_dimensions = embedder.dimensions(),
                store_dimensions = config.vector_store.dimensions,
                "Embedding and vector store dimensions differ"
            );
        }

        tracing::info!(
            embedder = embedder.name(),
            store = store.name(),
            chunk_size = config.chunking.chunk_size,
            chunk_overlap = config.chunking.chunk_overlap,
            rows_per_chunk = config.chunking.rows_per_chunk,
            parallel_embeddings = config.pipeline.parallel_embeddings,
            "Pipeline configured"
        );

        Ok(IngestPipeline {
            loader: LoaderGateway::new(&config.loader)?,
            normalizer: WhitespaceNormalizer::new(),
            chunker: Chunker::new(),
            embedder,
            store,
            observer: self.observer.unwrap_or_else(|| Arc::new(TracingObserver)),
            config,
        })
    }
}

impl IngestPipeline {
    pub fn builder(config: IngestConfig) -> IngestPipelineBuilder {
        IngestPipelineBuilder {
            config,
            embedder: None,
            store: None,
            observer: None,
        }
    }

    /// Create a pipeline from explicit collaborators
    pub fn new(
        config: IngestConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        Self::builder(config)
            .embedder(embedder)
            .vector_store(store)
            .build()
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one file or URL.
    ///
    /// Returns `Ok(None)` when the source produced nothing to store; the
    /// embedder and store are not called in that case. Errors carry the
    /// stage they occurred in (see [`Error::stage`]).
    pub async fn run(&self, input: &str) -> Result<Option<IngestOutcome>> {
        let started = Instant::now();
        self.observer.on_stage(input, PipelineStage::Start);

        let result = self.run_stages(input, started).await;
        match &result {
            Ok(_) => self.observer.on_stage(input, PipelineStage::Done),
            Err(e) => {
                tracing::error!(source = input, error = %e, "Ingestion failed");
                self.observer.on_stage(input, PipelineStage::Failed);
            }
        }
        result
    }

    async fn run_stages(&self, input: &str, started: Instant) -> Result<Option<IngestOutcome>> {
        let (kind, documents) = self
            .loader
            .load(input)
            .await
            .map_err(|e| e.at_stage(PipelineStage::Loaded))?;
        self.observer.on_stage(input, PipelineStage::Loaded);
        tracing::info!(source = input, kind = %kind, documents = documents.len(), "Loaded source");

        if documents.is_empty() {
            tracing::info!(source = input, "No content found, nothing to ingest");
            return Ok(None);
        }

        let documents = self.normalizer.normalize_all(documents);
        self.observer.on_stage(input, PipelineStage::Normalized);

        let (_, strategy_kind) = self.loader.route(kind);
        let chunks = ChunkStrategy::from_config(strategy_kind, &self.config.chunking)
            .and_then(|strategy| self.chunker.chunk(&documents, &strategy))
            .map_err(|e| e.at_stage(PipelineStage::Chunked))?;
        self.observer.on_stage(input, PipelineStage::Chunked);
        tracing::info!(source = input, chunks = chunks.len(), strategy = ?strategy_kind, "Chunked documents");

        if chunks.is_empty() {
            tracing::info!(source = input, "Documents had no text, nothing to ingest");
            return Ok(None);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_best_effort(
            self.embedder.as_ref(),
            &texts,
            self.config.pipeline.parallel_embeddings,
        )
        .await;
        for failure in &embeddings.failures {
            self.observer
                .on_embedding_failure(input, failure.index, &failure.error);
        }
        let embedding_failures = embeddings.failures.len();

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings.vectors)
            .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
            .collect();
        self.observer.on_stage(input, PipelineStage::Embedded);
        tracing::info!(
            source = input,
            embeddings = embedded.len(),
            failures = embedding_failures,
            "Generated embeddings"
        );

        let handle = self.store(&embedded).await.map_err(|e| e.at_stage(PipelineStage::Stored))?;
        self.observer.on_stage(input, PipelineStage::Stored);

        let report = IngestReport {
            source: input.to_string(),
            source_kind: kind,
            documents: documents.len(),
            chunks: embedded.len(),
            embeddings: embedded.len(),
            embedding_failures,
            elapsed: started.elapsed(),
        };
        self.observer.on_complete(&report);

        Ok(Some(IngestOutcome { handle, report }))
    }

    async fn store(&self, embedded: &[EmbeddedChunk]) -> Result<DocumentHandle> {
        self.store.ensure_collection().await?;
        self.store.insert(embedded).await
    }

    /// Ingest several sources, at most `pipeline.parallel_documents` at a
    /// time. Results are in input order; one failure does not stop the rest.
    pub async fn run_many<S: AsRef<str>>(&self, inputs: &[S]) -> Vec<Result<Option<IngestOutcome>>> {
        let semaphore = Semaphore::new(self.config.pipeline.effective_parallel_documents());

        let runs = inputs.iter().map(|input| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| Error::internal(format!("semaphore closed: {}", e)))?;
                self.run(input.as_ref()).await
            }
        });
        let results = join_all(runs).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            sources = results.len(),
            failed,
            "Batch ingestion finished"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, EmbeddingConfig};
    use crate::processing::RecordingObserver;
    use crate::providers::InMemoryVectorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl VectorStoreProvider for BrokenStore {
        async fn ensure_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn insert(&self, _chunks: &[EmbeddedChunk]) -> Result<DocumentHandle> {
            Err(Error::storage("connection refused"))
        }

        async fn len(&self) -> Result<usize> {
            Ok(0)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn config() -> IngestConfig {
        let mut config = IngestConfig::default();
        config.vector_store.dimensions = 2;
        config.chunking = ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 10,
            rows_per_chunk: 2,
        };
        config
    }

    fn pipeline_with(
        store: Arc<dyn VectorStoreProvider>,
    ) -> (IngestPipeline, Arc<CountingEmbedder>, Arc<RecordingObserver>) {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let observer = Arc::new(RecordingObserver::new());
        let pipeline = IngestPipeline::new(config(), embedder.clone(), store)
            .unwrap()
            .with_observer(observer.clone());
        (pipeline, embedder, observer)
    }

    fn memory_store() -> Arc<InMemoryVectorStore> {
        Arc::new(InMemoryVectorStore::new(&config().vector_store).unwrap())
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_explicit_embedder_ignores_embedding_section() {
        let mut config = config();
        config.embeddings = EmbeddingConfig::gemini(None);
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });

        let pipeline = IngestPipeline::builder(config.clone())
            .embedder(embedder)
            .build()
            .unwrap();
        assert_eq!(pipeline.embedder.name(), "counting");
        assert_eq!(pipeline.store.name(), "in-memory");

        assert!(matches!(
            IngestPipeline::builder(config).build(),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_text_run_walks_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "story.txt", &"word ".repeat(30));
        let store = memory_store();
        let (pipeline, embedder, observer) = pipeline_with(store.clone());

        let outcome = pipeline.run(&input).await.unwrap().unwrap();

        assert_eq!(
            observer.stages_for(&input),
            vec![
                PipelineStage::Start,
                PipelineStage::Loaded,
                PipelineStage::Normalized,
                PipelineStage::Chunked,
                PipelineStage::Embedded,
                PipelineStage::Stored,
                PipelineStage::Done,
            ]
        );
        let report = &outcome.report;
        assert_eq!(report.documents, 1);
        assert!(report.chunks > 1);
        assert_eq!(report.embeddings, report.chunks);
        assert_eq!(report.embedding_failures, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), report.chunks);

        let records = store.records_for(outcome.handle);
        assert_eq!(records.len(), report.chunks);
        assert!(records.iter().all(|r| r.content_type == "text" && r.source == input));
        let indices: Vec<i64> = records.iter().map(|r| r.chunk_index).collect();
        assert_eq!(indices, (1..=report.chunks as i64).collect::<Vec<_>>());
        assert_eq!(observer.reports(), vec![outcome.report.clone()]);
    }

    #[tokio::test]
    async fn test_nothing_to_ingest_skips_embedder_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "empty.csv", "id,name\n");
        let store = memory_store();
        let (pipeline, embedder, observer) = pipeline_with(store.clone());

        assert!(pipeline.run(&input).await.unwrap().is_none());

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(
            observer.stages_for(&input),
            vec![PipelineStage::Start, PipelineStage::Loaded, PipelineStage::Done]
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "notes.txt", "some text");
        let (pipeline, _, observer) = pipeline_with(Arc::new(BrokenStore));

        let err = pipeline.run(&input).await.unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Stored));
        assert!(matches!(err.root(), Error::Storage(_)));
        assert_eq!(observer.stages_for(&input).last(), Some(&PipelineStage::Failed));
        assert!(observer.reports().is_empty());
    }

    #[tokio::test]
    async fn test_load_failures_tagged_with_stage() {
        let (pipeline, embedder, _) = pipeline_with(memory_store());

        let err = pipeline.run("missing/file.txt").await.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Loaded));
        assert!(matches!(err.root(), Error::SourceNotFound(_)));

        let err = pipeline.run("archive.tar.gz").await.unwrap_err();
        assert!(matches!(err.root(), Error::UnsupportedSourceKind(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_file_still_ingested_as_error_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "scan.pdf", "this is not a pdf");
        let store = memory_store();
        let (pipeline, _, _) = pipeline_with(store.clone());

        let outcome = pipeline.run(&input).await.unwrap().unwrap();

        let records = store.records_for(outcome.handle);
        assert!(!records.is_empty());
        assert!(records[0].content.starts_with("Failed to parse"));
        assert_eq!(records[0].content_type, "pdf");
    }

    #[tokio::test]
    async fn test_csv_uses_row_batches() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(&dir, "t.csv", "k,v\na,1\nb,2\nc,3\n");
        let store = memory_store();
        let (pipeline, _, _) = pipeline_with(store.clone());

        let outcome = pipeline.run(&input).await.unwrap().unwrap();

        assert_eq!(outcome.report.chunks, 2);
        let records = store.records_for(outcome.handle);
        assert_eq!(records[0].content, "k: a\nv: 1\n\nk: b\nv: 2");
        assert_eq!(records[1].content, "k: c\nv: 3");
    }

    #[tokio::test]
    async fn test_run_many_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write(&dir, "a.txt", "alpha"),
            dir.path().join("missing.txt").to_string_lossy().into_owned(),
            write(&dir, "c.txt", "gamma"),
        ];
        let (pipeline, _, _) = pipeline_with(memory_store());

        let results = pipeline.run_many(&inputs).await;

        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap().as_ref().unwrap();
        assert_eq!(first.report.source, inputs[0]);
        assert!(matches!(
            results[1].as_ref().unwrap_err().root(),
            Error::SourceNotFound(_)
        ));
        let third = results[2].as_ref().unwrap().as_ref().unwrap();
        assert_eq!(third.report.source, inputs[2]);
        assert_ne!(first.handle, third.handle);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_build() {
        let mut config = config();
        config.chunking.chunk_overlap = 40;
        let result = IngestPipeline::builder(config)
            .embedder(Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
            }))
            .vector_store(memory_store())
            .build();
        assert!(matches!(result, Err(Error::InvalidPolicy(_))));
    }
}
