use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::llm::LlmProvider;

/// Embedding seam for the semantic index. The distance function itself is a
/// black box to the cache; all it relies on is the calibration
/// `distance = 1 - cosine_similarity`.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector dimension, fixed for the lifetime of the index.
    fn dimension(&self) -> usize;
}

/// Production embedder backed by the ollama embeddings endpoint.
pub struct OllamaEmbedder {
    llm: Arc<dyn LlmProvider>,
    model: String,
    dim: usize,
}

impl OllamaEmbedder {
    pub fn new(llm: Arc<dyn LlmProvider>, model: String, dim: usize) -> Self {
        Self { llm, model, dim }
    }
}

#[async_trait]
impl TextEmbedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.llm.embed(&self.model, text).await
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Test embedder returning caller-chosen vectors for known texts, so tests
/// can pin exact similarities against the threshold.
#[cfg(test)]
pub(crate) struct MappedEmbedder {
    pub map: std::collections::HashMap<String, Vec<f32>>,
    pub dim: usize,
}

#[cfg(test)]
#[async_trait]
impl TextEmbedder for MappedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.map.get(text) {
            Some(v) => Ok(v.clone()),
            None => Err(anyhow::anyhow!("no test vector for {:?}", text)),
        }
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
