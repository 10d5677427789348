//! Embedding provider trait and the best-effort batch helper used by the pipeline

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
/// - `GeminiEmbedder`: Google Gemini embedContent (text-embedding-004)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a document chunk
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate an embedding for a search query.
    ///
    /// Defaults to `embed`; providers with distinct query/document task
    /// types override it.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text).await
    }

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Declared embedding dimension (768 for nomic-embed-text and text-embedding-004)
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// A chunk whose embedding was replaced by a zero vector
#[derive(Debug)]
pub struct EmbeddingFailure {
    /// Position of the chunk in the input
    pub index: usize,
    pub error: Error,
}

/// Result of [`embed_best_effort`]
#[derive(Debug, Default)]
pub struct EmbeddingOutcome {
    /// One vector per input text, in input order
    pub vectors: Vec<Vec<f32>>,
    /// Inputs that received a zero vector
    pub failures: Vec<EmbeddingFailure>,
}

impl EmbeddingOutcome {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

/// Embed every text, never failing as a whole.
///
/// Up to `concurrency` requests run at once and results keep input order.
/// A text whose request fails, or whose vector does not have the provider's
/// declared dimension, gets an all-zero vector of that dimension instead.
pub async fn embed_best_effort(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    concurrency: usize,
) -> EmbeddingOutcome {
    let dimensions = provider.dimensions();

    let results: Vec<Result<Vec<f32>>> = stream::iter(texts.iter().map(|text| provider.embed(text)))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut outcome = EmbeddingOutcome {
        vectors: Vec::with_capacity(texts.len()),
        failures: Vec::new(),
    };

    for (index, result) in results.into_iter().enumerate() {
        let checked = result.and_then(|vector| {
            if vector.len() == dimensions {
                Ok(vector)
            } else {
                Err(Error::embedding(format!(
                    "expected {} dimensions, got {}",
                    dimensions,
                    vector.len()
                )))
            }
        });

        match checked {
            Ok(vector) => outcome.vectors.push(vector),
            Err(error) => {
                tracing::warn!(
                    index,
                    provider = provider.name(),
                    error = %error,
                    "Embedding failed, substituting zero vector"
                );
                outcome.vectors.push(vec![0.0; dimensions]);
                outcome.failures.push(EmbeddingFailure { index, error });
            }
        }
    }

    outcome
}

/// Longest wait between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt + 1`: 250ms doubled per attempt, capped
fn backoff_delay(attempt: u32) -> Duration {
    let millis = 2u64.saturating_pow(attempt).saturating_mul(250);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

/// Retry a request with exponential backoff
pub(crate) async fn retry_request<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::embedding("request was never attempted")))
}
