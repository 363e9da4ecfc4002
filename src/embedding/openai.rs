//! OpenAI embeddings for course chunks, search queries and course names.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, SyllabusError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, Embedding, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// Embedder backed by the OpenAI embeddings endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// `text-embedding-3-small` at 1536 dimensions.
    pub fn new() -> Result<Self> {
        Self::with_config("text-embedding-3-small", 1536)
    }

    pub fn with_config(model: &str, dimensions: usize) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            dimensions,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::with_config(&settings.model, settings.dimensions as usize)
    }

    /// Collapse whitespace so titles and chunks embed the same however they were wrapped.
    fn prepare_inputs(texts: &[String]) -> Result<Vec<String>> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if normalized.is_empty() {
                    Err(SyllabusError::InvalidInput(format!("Cannot embed empty text at index {}", i)))
                } else {
                    Ok(normalized)
                }
            })
            .collect()
    }

    /// Order a response by input index and check it against the request.
    fn collect_vectors(&self, mut data: Vec<Embedding>, expected: usize) -> Result<Vec<Vec<f32>>> {
        if data.len() != expected {
            return Err(SyllabusError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }

        data.sort_by_key(|e| e.index);
        data.into_iter()
            .map(|e| {
                if e.embedding.len() == self.dimensions {
                    Ok(e.embedding)
                } else {
                    Err(SyllabusError::Embedding(format!(
                        "Model {} returned {} dimensions, configured for {}",
                        self.model,
                        e.embedding.len(),
                        self.dimensions
                    )))
                }
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SyllabusError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs = Self::prepare_inputs(texts)?;
        debug!("Embedding {} texts with {}", inputs.len(), self.model);

        let mut all_embeddings = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| SyllabusError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| SyllabusError::OpenAI(format!("Embedding API error: {}", e)))?;

            all_embeddings.extend(self.collect_vectors(response.data, chunk.len())?);
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(index: u32, dims: usize) -> Embedding {
        Embedding {
            index,
            object: "embedding".to_string(),
            embedding: vec![index as f32; dims],
        }
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            model: "text-embedding-3-large".to_string(),
            dimensions: 3072,
            ..Default::default()
        };
        let embedder = OpenAIEmbedder::from_settings(&settings).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
        assert_eq!(OpenAIEmbedder::new().unwrap().dimensions(), 1536);
    }

    #[test]
    fn test_prepare_inputs_normalizes_whitespace() {
        let inputs = OpenAIEmbedder::prepare_inputs(&[
            "  MCP:\n Build Rich-Context\tAI Apps ".to_string(),
            "lesson 2".to_string(),
        ])
        .unwrap();
        assert_eq!(inputs, vec!["MCP: Build Rich-Context AI Apps", "lesson 2"]);

        assert!(matches!(
            OpenAIEmbedder::prepare_inputs(&["ok".to_string(), " \n ".to_string()]),
            Err(SyllabusError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_collect_vectors_orders_and_validates() {
        let embedder = OpenAIEmbedder::with_config("text-embedding-3-small", 4).unwrap();

        let vectors = embedder
            .collect_vectors(vec![embedding(1, 4), embedding(0, 4)], 2)
            .unwrap();
        assert_eq!(vectors, vec![vec![0.0; 4], vec![1.0; 4]]);

        assert!(embedder.collect_vectors(vec![embedding(0, 4)], 2).is_err());
        assert!(embedder.collect_vectors(vec![embedding(0, 3)], 1).is_err());
    }
}
