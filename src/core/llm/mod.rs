pub mod providers;

use anyhow::Result;
use async_trait::async_trait;

/// External model collaborator. The agent only ever needs low-temperature
/// single-prompt completions and text embeddings, so the seam stays narrow.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a prompt against a model and return the raw text response.
    async fn generate(&self, model_id: &str, prompt: &str, temperature: f32) -> Result<String>;

    /// Embed a text into a vector for similarity search.
    async fn embed(&self, model_id: &str, text: &str) -> Result<Vec<f32>>;
}
