use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::llm::LlmProvider;

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Local ollama daemon client, used for NLU, code generation, and embeddings.
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, model_id: &str, prompt: &str, temperature: f32) -> Result<String> {
        let req = OllamaGenerateRequest {
            model: model_id,
            prompt,
            stream: false,
            options: OllamaOptions { temperature },
        };
        let res = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&req)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "Ollama API Error: {}",
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: OllamaGenerateResponse = res.json().await?;
        Ok(parsed.response)
    }

    async fn embed(&self, model_id: &str, text: &str) -> Result<Vec<f32>> {
        let req = OllamaEmbeddingRequest {
            model: model_id,
            prompt: text,
        };
        let res = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&req)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "Ollama API Error: {}",
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: OllamaEmbeddingResponse = res.json().await?;
        Ok(parsed.embedding)
    }
}
