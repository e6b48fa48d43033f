//! Vector search infrastructure over the HR corpus.
//!
//! `LanceCorpusDb` manages the LanceDB connection, `FastembedEmbedder`
//! produces query embeddings locally, and `LanceCorpusStore` combines the
//! two into the engine's `RetrievalStore`.

pub mod corpus;
pub mod embedder;
pub mod lance;
pub mod schema;

pub use corpus::{CorpusFragmentRecord, LanceCorpusStore};
pub use embedder::FastembedEmbedder;
pub use lance::LanceCorpusDb;
