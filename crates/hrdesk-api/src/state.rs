//! Application state wiring the engine to concrete infrastructure.
//!
//! The orchestrator is generic over its reasoning and retrieval
//! collaborators; AppState pins the generics to the concrete infra
//! implementations and shares the corpus store with the status surfaces.

use std::path::PathBuf;
use std::sync::Arc;

use hrdesk_core::orchestrator::Orchestrator;
use hrdesk_infra::config::{load_engine_config, resolve_data_dir};
use hrdesk_infra::llm::OllamaReasoningClient;
use hrdesk_infra::vector::{FastembedEmbedder, LanceCorpusDb, LanceCorpusStore};

/// Concrete type aliases for the engine generics pinned to infra implementations.
pub type ConcreteRetrievalStore = LanceCorpusStore<FastembedEmbedder>;
pub type ConcreteOrchestrator =
    Orchestrator<OllamaReasoningClient, Arc<ConcreteRetrievalStore>>;

/// Shared application state for CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteOrchestrator>,
    pub corpus: Arc<ConcreteRetrievalStore>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: config, embedder, corpus, engine.
    ///
    /// Failures here (unreadable data directory, embedding model init,
    /// corpus store open) are fatal -- everything past startup degrades
    /// instead of failing.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_engine_config(&data_dir).await;

        let embedder = FastembedEmbedder::new()?;
        let db = LanceCorpusDb::new(data_dir.join("corpus_store")).await?;
        let corpus = Arc::new(LanceCorpusStore::new(db, embedder, config.min_score));

        let reasoning = OllamaReasoningClient::ollama(&config.base_url, &config.model);
        let engine = Arc::new(Orchestrator::new(config, reasoning, corpus.clone()));

        Ok(Self {
            engine,
            corpus,
            data_dir,
        })
    }
}
