//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `hrdesk-core` using fastembed's
//! BGESmallENV15 model (384 dimensions) with ONNX runtime inference.
//! Inference is blocking, so calls run on the tokio blocking pool.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use hrdesk_core::retrieval::Embedder;
use hrdesk_types::error::RetrievalError;

use super::schema::EMBEDDING_DIMENSION;

/// Model name recorded alongside stored embeddings.
pub const EMBEDDING_MODEL_NAME: &str = "bge-small-en-v1.5";

/// Local text embedder backed by fastembed's BGESmallENV15 model.
pub struct FastembedEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastembedEmbedder {
    /// Initialize the embedding model. Downloads model weights on first use.
    pub fn new() -> Result<Self, RetrievalError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl Embedder for FastembedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let model = self.model.clone();
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            model
                .lock()
                .map_err(|e| RetrievalError::Embedding(format!("embedder lock poisoned: {e}")))?
                .embed(texts, None)
                .map_err(|e| RetrievalError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| RetrievalError::Embedding(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        EMBEDDING_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}
