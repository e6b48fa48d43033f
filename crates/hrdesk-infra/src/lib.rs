//! Concrete infrastructure for HRDesk.
//!
//! Implements the `hrdesk-core` seams against real backends: a LanceDB
//! vector store over the HR corpus, a fastembed local embedder, and the
//! Ollama reasoning client via its OpenAI-compatible endpoint. Also owns
//! the configuration loader.

pub mod config;
pub mod llm;
pub mod vector;
